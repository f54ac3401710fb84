//! Participant stream entries
//!
//! Per-participant state stored in the registry: the ordered sequence of
//! streams currently attributed to a participant, plus the metadata the
//! registry owns for each (kind tag, preview url). The stream and track
//! objects themselves are shared with the transport and rendering layers;
//! the registry only commands track stoppage and revokes the urls it
//! derived.

use std::sync::Arc;

use crate::media::{same_stream, DisplayHandle, DisplayHandles, MediaStream};

/// Source tag for a stream, when the transport layer knows it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    /// Camera capture
    Camera,
    /// Single window or tab share
    Screen,
    /// Full desktop share
    Desktop,
    /// Audio-only stream
    Audio,
}

/// One stream attributed to a participant
///
/// Created exactly when a stream is first added for the participant and
/// destroyed exactly when that stream is removed by identity.
#[derive(Clone)]
pub struct StreamEntry {
    /// Shared stream handle supplied by the transport layer
    pub stream: Arc<dyn MediaStream>,

    /// Kind tag, if the transport layer provided one
    pub kind: Option<StreamKind>,

    /// Preview url owned by the registry, revoked when the entry goes away
    pub url: Option<DisplayHandle>,
}

impl StreamEntry {
    pub(crate) fn new(
        stream: Arc<dyn MediaStream>,
        kind: Option<StreamKind>,
        url: Option<DisplayHandle>,
    ) -> Self {
        Self { stream, kind, url }
    }

    /// Whether this entry wraps the given stream handle (pointer identity)
    pub fn is_stream(&self, stream: &Arc<dyn MediaStream>) -> bool {
        same_stream(&self.stream, stream)
    }

    /// Stop every track on the stream and revoke the preview url
    ///
    /// Called exactly once per entry, at the moment the entry leaves the
    /// registry.
    pub(crate) fn release(&self, display: &dyn DisplayHandles) {
        let tracks = self.stream.tracks();
        for track in &tracks {
            track.stop();
        }
        if let Some(ref url) = self.url {
            display.release(url);
        }
        tracing::debug!(
            stream = %self.stream.id(),
            tracks = tracks.len(),
            "Stream resources released"
        );
    }

    /// Call-end teardown: release, and clear mute observers on every track
    /// so stale callbacks cannot fire afterwards
    pub(crate) fn teardown(&self, display: &dyn DisplayHandles) {
        for track in self.stream.tracks() {
            track.clear_mute_observers();
        }
        self.release(display);
    }
}

/// All streams currently attributed to one participant
///
/// `streams` keeps arrival order; entries are appended and removed, never
/// reordered in place.
#[derive(Clone)]
pub struct ParticipantStreams {
    /// Stable participant id (post-normalization)
    pub participant_id: String,

    /// Streams in arrival order
    pub streams: Vec<StreamEntry>,
}

impl ParticipantStreams {
    pub(crate) fn new(participant_id: impl Into<String>) -> Self {
        Self {
            participant_id: participant_id.into(),
            streams: Vec::new(),
        }
    }

    /// Whether any entry wraps the given stream handle
    pub fn contains_stream(&self, stream: &Arc<dyn MediaStream>) -> bool {
        self.streams.iter().any(|entry| entry.is_stream(stream))
    }

    /// Entry for the given stream handle, if present
    pub fn entry_for(&self, stream: &Arc<dyn MediaStream>) -> Option<&StreamEntry> {
        self.streams.iter().find(|entry| entry.is_stream(stream))
    }

    /// Number of streams attributed to the participant
    pub fn stream_count(&self) -> usize {
        self.streams.len()
    }
}
