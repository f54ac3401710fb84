//! Participant media-stream registry for real-time calls
//!
//! Maps the participants of a call to the media streams (and tracks)
//! currently attributed to them, and drives resource cleanup as streams
//! come and go: preview urls are revoked and hardware tracks stopped
//! exactly once, at the moment their stream leaves the registry.
//!
//! The heart of the crate is a pure reducer. Each lifecycle event is
//! applied as `(Registry, StreamEvent) -> Registry`; the input value is
//! never mutated, and no-op events hand the input back unchanged so
//! consumers can detect change with a reference comparison instead of a
//! diff. Relay-rewritten stream ids (`sfu_<participant>_<n>`) are
//! normalized back to the owning participant at every entry point.
//!
//! Platform media primitives are reached only through the capability
//! traits in [`media`]; [`media::dummy`] provides in-memory stand-ins.
//! [`dispatch::Dispatcher`] is a thin harness that serializes events
//! through the reducer on a spawned task and publishes changed registry
//! values on a watch channel for the rendering layer.
//!
//! ```
//! use callstate_rs::media::dummy::{DummyDisplay, DummyStream, DummyTrack};
//! use callstate_rs::{MediaStream, Registry, StreamEvent, StreamKind, StreamReducer};
//!
//! let reducer = StreamReducer::new(DummyDisplay::new());
//!
//! let camera = DummyStream::new("cam-1");
//! camera.add_track(DummyTrack::video("cam-1-video"));
//!
//! let state = reducer.reduce(
//!     &Registry::empty(),
//!     StreamEvent::StreamAdd {
//!         participant_id: "alice".into(),
//!         stream: camera.clone(),
//!         kind: Some(StreamKind::Camera),
//!     },
//! );
//! assert!(state.contains("alice"));
//! ```

pub mod dispatch;
pub mod error;
pub mod media;
pub mod registry;

pub use dispatch::Dispatcher;
pub use error::CapabilityError;
pub use media::{DisplayHandle, DisplayHandles, MediaStream, MediaTrack, TrackKind};
pub use registry::{
    ParticipantStreams, Registry, RegistryConfig, RegistryStats, StreamEntry, StreamEvent,
    StreamKind, StreamReducer,
};
