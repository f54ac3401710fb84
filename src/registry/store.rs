//! Registry value
//!
//! The registry is an immutable value: transitions build a new `Registry`
//! (or hand the input back for no-ops), so consumers detect change by
//! reference comparison instead of diffing. Copy-on-write happens at the
//! participant key: a transition touching one participant clones the map
//! but shares every untouched `ParticipantStreams` with the predecessor
//! value via `Arc`.

use std::collections::HashMap;
use std::sync::Arc;

use lazy_static::lazy_static;

use super::entry::ParticipantStreams;

lazy_static! {
    static ref EMPTY: Registry = Registry {
        participants: Arc::new(HashMap::new()),
    };
}

/// Immutable mapping from participant id to their streams
///
/// A participant key exists iff the participant currently owns at least
/// one stream. Cloning is an `Arc` bump.
#[derive(Clone)]
pub struct Registry {
    participants: Arc<HashMap<String, Arc<ParticipantStreams>>>,
}

impl Registry {
    /// The canonical empty registry
    ///
    /// All empty registries alias one shared allocation, so the initial
    /// value, a drained registry, and a post-reset registry all compare
    /// reference-equal.
    pub fn empty() -> Registry {
        EMPTY.clone()
    }

    /// Streams attributed to a participant
    pub fn get(&self, participant_id: &str) -> Option<&Arc<ParticipantStreams>> {
        self.participants.get(participant_id)
    }

    /// Whether the participant currently owns any stream
    pub fn contains(&self, participant_id: &str) -> bool {
        self.participants.contains_key(participant_id)
    }

    /// Iterate over all participant records (no meaningful order)
    pub fn iter(&self) -> impl Iterator<Item = &Arc<ParticipantStreams>> {
        self.participants.values()
    }

    /// Number of participants currently owning streams
    pub fn participant_count(&self) -> usize {
        self.participants.len()
    }

    /// Whether no participant owns a stream
    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    /// Reference equality
    ///
    /// `true` means the two values are the same allocation; consumers use
    /// this to skip re-rendering after no-op transitions.
    pub fn same(a: &Registry, b: &Registry) -> bool {
        Arc::ptr_eq(&a.participants, &b.participants)
    }

    /// New registry with the given participant record inserted or replaced
    pub(crate) fn with_participant(&self, streams: ParticipantStreams) -> Registry {
        let mut next = (*self.participants).clone();
        next.insert(streams.participant_id.clone(), Arc::new(streams));
        Registry {
            participants: Arc::new(next),
        }
    }

    /// New registry without the given participant key
    ///
    /// Collapses to the canonical empty instance when the last key goes.
    pub(crate) fn without_participant(&self, participant_id: &str) -> Registry {
        let mut next = (*self.participants).clone();
        next.remove(participant_id);
        if next.is_empty() {
            return Registry::empty();
        }
        Registry {
            participants: Arc::new(next),
        }
    }

    /// Point-in-time counts for logging and inspection
    pub fn stats(&self) -> RegistryStats {
        let mut streams = 0;
        let mut previews = 0;
        for owned in self.participants.values() {
            streams += owned.streams.len();
            previews += owned.streams.iter().filter(|e| e.url.is_some()).count();
        }
        RegistryStats {
            participants: self.participants.len(),
            streams,
            previews,
        }
    }
}

impl Default for Registry {
    fn default() -> Self {
        Registry::empty()
    }
}

/// Point-in-time registry counts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryStats {
    /// Participants currently owning at least one stream
    pub participants: usize,
    /// Stream entries across all participants
    pub streams: usize,
    /// Entries holding a live preview url
    pub previews: usize,
}
