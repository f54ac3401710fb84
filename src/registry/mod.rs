//! Participant stream registry
//!
//! The registry maps each call participant to the streams currently
//! attributed to them and owns the derived metadata for each stream (kind
//! tag, preview url). All mutation goes through the reducer, one event at
//! a time.
//!
//! # Architecture
//!
//! ```text
//!   signaling / transport                 rendering layer
//!          │                                    ▲
//!          │ StreamEvent                        │ watch (reference-equality
//!          ▼                                    │        change detection)
//!    StreamReducer ──(Registry, event)──► Registry'
//!          │
//!          ▼ capability traits
//!    track stop / preview-url revoke
//! ```
//!
//! # Immutable-value state
//!
//! `Registry` is never mutated in place. Every transition returns a new
//! value, sharing untouched participants with its predecessor via `Arc`,
//! and no-op transitions return the input itself. Consumers compare
//! references (`Registry::same`) instead of diffing. Resource release for
//! an entry always happens before the registry value that no longer
//! references it is returned.

pub mod config;
pub mod entry;
pub mod event;
pub mod reducer;
pub mod store;

pub use config::RegistryConfig;
pub use entry::{ParticipantStreams, StreamEntry, StreamKind};
pub use event::StreamEvent;
pub use reducer::StreamReducer;
pub use store::{Registry, RegistryStats};
