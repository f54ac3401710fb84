//! Media capability seams
//!
//! The registry never talks to real hardware or browser primitives; it
//! reaches them through the traits in this module. The transport layer
//! hands streams in, the rendering layer previews them through display
//! handles, and implementations of these traits bridge to the actual
//! platform. [`dummy`] provides the in-memory stand-ins used by tests and
//! the demo.
//!
//! Streams and tracks are shared objects: the registry holds them behind
//! `Arc<dyn ...>` alongside the transport and rendering layers, and all
//! membership questions are answered by pointer identity, never by value
//! equality (two distinct handles may carry identical metadata).

pub mod dummy;

use std::sync::Arc;

use crate::error::CapabilityError;

/// Kind of hardware line inside a stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackKind {
    /// Audio source/sink
    Audio,
    /// Video source/sink
    Video,
}

/// One audio or video line inside a stream
///
/// Methods take `&self`; implementations use interior mutability so the
/// handle can be shared freely.
pub trait MediaTrack: Send + Sync {
    /// Opaque track id
    fn id(&self) -> String;

    /// Whether this is an audio or a video line
    fn kind(&self) -> TrackKind;

    /// Stop the hardware line. Idempotent at the capability layer.
    fn stop(&self);

    /// Drop any mute/unmute observers registered on the track so stale
    /// callbacks cannot fire after teardown
    fn clear_mute_observers(&self);
}

/// An opaque bundle of tracks supplied by the transport layer
pub trait MediaStream: Send + Sync {
    /// Opaque stream id; a relay may have rewritten it to embed the
    /// owning participant (`sfu_<participant>_<n>`)
    fn id(&self) -> String;

    /// Current tracks, in attach order
    fn tracks(&self) -> Vec<Arc<dyn MediaTrack>>;

    /// Attach a track to the shared stream object. Already-attached
    /// tracks are ignored.
    fn add_track(&self, track: Arc<dyn MediaTrack>);

    /// Detach a track by identity. Absent tracks are ignored.
    fn remove_track(&self, track: &Arc<dyn MediaTrack>);
}

/// Revocable reference a rendering layer can use to preview a stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayHandle(String);

impl DisplayHandle {
    /// Wrap a displayable url
    pub fn new(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    /// The underlying url
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for DisplayHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Producer of displayable-url handles for streams
pub trait DisplayHandles: Send + Sync {
    /// Derive a displayable handle for the stream
    fn acquire(&self, stream: &Arc<dyn MediaStream>) -> Result<DisplayHandle, CapabilityError>;

    /// Release a previously acquired handle. Idempotent.
    fn release(&self, handle: &DisplayHandle);
}

/// Identity comparison for shared stream handles
///
/// Compares object addresses only; vtable pointers are ignored so clones
/// coerced at different sites still compare equal.
pub fn same_stream(a: &Arc<dyn MediaStream>, b: &Arc<dyn MediaStream>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

/// Identity comparison for shared track handles
pub fn same_track(a: &Arc<dyn MediaTrack>, b: &Arc<dyn MediaTrack>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}
