//! Registry events
//!
//! The input vocabulary of the reducer. Each event carries the claimed
//! participant id as delivered by signaling; the reducer derives the true
//! owner from the stream id, since a relay may have rewritten it.

use std::sync::Arc;

use crate::media::{MediaStream, MediaTrack};

use super::entry::StreamKind;

/// A call lifecycle event applied to the registry
#[derive(Clone)]
pub enum StreamEvent {
    /// A stream became available for a participant
    StreamAdd {
        participant_id: String,
        stream: Arc<dyn MediaStream>,
        kind: Option<StreamKind>,
    },
    /// A stream went away
    StreamRemove {
        participant_id: String,
        stream: Arc<dyn MediaStream>,
    },
    /// A track was attached to one of the participant's streams
    TrackAdd {
        participant_id: String,
        stream: Arc<dyn MediaStream>,
        track: Arc<dyn MediaTrack>,
    },
    /// A track was detached from one of the participant's streams
    TrackRemove {
        participant_id: String,
        stream: Arc<dyn MediaStream>,
        track: Arc<dyn MediaTrack>,
    },
    /// The participant left the call
    ParticipantRemoved { participant_id: String },
    /// The whole call ended
    CallEnded,
    /// Media negotiation resolved with a stream; handled like `StreamAdd`
    MediaResolved {
        participant_id: String,
        stream: Arc<dyn MediaStream>,
        kind: Option<StreamKind>,
    },
    /// Media negotiation was rejected; nothing to register
    MediaRejected,
}

impl StreamEvent {
    /// Wire-style name of the event kind
    pub fn name(&self) -> &'static str {
        match self {
            StreamEvent::StreamAdd { .. } => "stream-add",
            StreamEvent::StreamRemove { .. } => "stream-remove",
            StreamEvent::TrackAdd { .. } => "stream-track-add",
            StreamEvent::TrackRemove { .. } => "stream-track-remove",
            StreamEvent::ParticipantRemoved { .. } => "participant-removed",
            StreamEvent::CallEnded => "call-ended",
            StreamEvent::MediaResolved { .. } => "media-resolved",
            StreamEvent::MediaRejected => "media-rejected",
        }
    }
}
