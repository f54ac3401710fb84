//! Stream registry reducer
//!
//! One reducing entry point: [`StreamReducer::reduce`] takes the current
//! registry and one lifecycle event and returns the successor registry.
//! Transitions never mutate the input; no-op events hand the input back
//! unchanged. Resource release for entries leaving the registry (track
//! stops, preview-url revocation) completes before the successor value is
//! returned, so a consumer observing the new state can assume prior
//! resources are already gone.
//!
//! Unknown participant ids, unknown stream identities, and already-absent
//! tracks are defined no-ops, not errors. The single fallible capability
//! call is preview acquisition, which degrades to an entry without a url.

use std::sync::Arc;

use crate::media::{same_track, DisplayHandle, DisplayHandles, MediaStream, MediaTrack};

use super::config::RegistryConfig;
use super::entry::{ParticipantStreams, StreamEntry, StreamKind};
use super::event::StreamEvent;
use super::store::Registry;

/// Applies call lifecycle events to the registry
pub struct StreamReducer {
    display: Arc<dyn DisplayHandles>,
    config: RegistryConfig,
}

impl StreamReducer {
    /// Create a reducer with default configuration
    pub fn new(display: Arc<dyn DisplayHandles>) -> Self {
        Self::with_config(display, RegistryConfig::default())
    }

    /// Create a reducer with custom configuration
    pub fn with_config(display: Arc<dyn DisplayHandles>, config: RegistryConfig) -> Self {
        Self { display, config }
    }

    /// Get the reducer configuration
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Apply one event and return the successor registry
    ///
    /// Returns the input value itself (reference-equal) when the event is
    /// a no-op.
    pub fn reduce(&self, state: &Registry, event: StreamEvent) -> Registry {
        match event {
            StreamEvent::StreamAdd {
                participant_id,
                stream,
                kind,
            }
            | StreamEvent::MediaResolved {
                participant_id,
                stream,
                kind,
            } => self.add_stream(state, &participant_id, stream, kind),
            StreamEvent::StreamRemove {
                participant_id,
                stream,
            } => self.remove_stream(state, &participant_id, &stream),
            StreamEvent::TrackAdd {
                participant_id,
                stream,
                track,
            } => self.add_track(state, &participant_id, stream, track),
            StreamEvent::TrackRemove {
                participant_id,
                stream,
                track,
            } => self.remove_track(state, &participant_id, &stream, &track),
            StreamEvent::ParticipantRemoved { participant_id } => {
                self.remove_participant(state, &participant_id)
            }
            StreamEvent::CallEnded => self.end_call(state),
            StreamEvent::MediaRejected => state.clone(),
        }
    }

    /// True owner of a stream
    ///
    /// Relay-rewritten ids pack the owner into the middle of exactly three
    /// `_`-separated segments (`sfu_<participant>_<n>`); the middle segment
    /// then overrides the claimed participant. Anything else belongs to the
    /// claimed participant.
    fn normalized_participant(&self, stream: &Arc<dyn MediaStream>, claimed: &str) -> String {
        let id = stream.id();
        let segments: Vec<&str> = id.split('_').collect();
        if segments.len() == 3 && segments[0] == self.config.relay_prefix {
            return segments[1].to_string();
        }
        claimed.to_string()
    }

    /// Preview acquisition is the one fallible capability call; failure
    /// degrades to an entry without a url and never reaches the caller.
    fn acquire_preview(&self, stream: &Arc<dyn MediaStream>) -> Option<DisplayHandle> {
        if !self.config.acquire_previews {
            return None;
        }
        match self.display.acquire(stream) {
            Ok(url) => Some(url),
            Err(e) => {
                tracing::debug!(stream = %stream.id(), error = %e, "No preview for stream");
                None
            }
        }
    }

    fn add_stream(
        &self,
        state: &Registry,
        claimed: &str,
        stream: Arc<dyn MediaStream>,
        kind: Option<StreamKind>,
    ) -> Registry {
        let participant_id = self.normalized_participant(&stream, claimed);

        if let Some(owned) = state.get(&participant_id) {
            if owned.contains_stream(&stream) {
                tracing::debug!(
                    participant = %participant_id,
                    stream = %stream.id(),
                    "Stream already registered"
                );
                return state.clone();
            }
        }

        let url = self.acquire_preview(&stream);

        let mut next = state
            .get(&participant_id)
            .map(|owned| (**owned).clone())
            .unwrap_or_else(|| ParticipantStreams::new(participant_id.clone()));
        next.streams.push(StreamEntry::new(stream.clone(), kind, url));

        tracing::info!(
            participant = %participant_id,
            stream = %stream.id(),
            streams = next.streams.len(),
            "Stream added"
        );

        state.with_participant(next)
    }

    fn remove_stream(
        &self,
        state: &Registry,
        claimed: &str,
        stream: &Arc<dyn MediaStream>,
    ) -> Registry {
        let participant_id = self.normalized_participant(stream, claimed);

        let owned = match state.get(&participant_id) {
            Some(owned) => owned,
            None => return state.clone(),
        };

        let (removed, kept): (Vec<&StreamEntry>, Vec<&StreamEntry>) = owned
            .streams
            .iter()
            .partition(|entry| entry.is_stream(stream));

        if removed.is_empty() {
            // Unknown handle; the participant keeps its entries
            return state.clone();
        }

        for entry in &removed {
            entry.release(self.display.as_ref());
        }

        tracing::info!(
            participant = %participant_id,
            stream = %stream.id(),
            remaining = kept.len(),
            "Stream removed"
        );

        if kept.is_empty() {
            return state.without_participant(&participant_id);
        }

        state.with_participant(ParticipantStreams {
            participant_id,
            streams: kept.into_iter().cloned().collect(),
        })
    }

    fn add_track(
        &self,
        state: &Registry,
        claimed: &str,
        stream: Arc<dyn MediaStream>,
        track: Arc<dyn MediaTrack>,
    ) -> Registry {
        let participant_id = self.normalized_participant(&stream, claimed);

        if !stream.tracks().iter().any(|t| same_track(t, &track)) {
            stream.add_track(track.clone());
        }

        let known = state
            .get(&participant_id)
            .map(|owned| owned.contains_stream(&stream))
            .unwrap_or(false);
        if known {
            // The shared stream object changed in place; stream identity,
            // not track composition, drives re-render.
            tracing::debug!(
                participant = %participant_id,
                stream = %stream.id(),
                track = %track.id(),
                "Track attached to known stream"
            );
            return state.clone();
        }

        // No entry for this stream yet: register it, now carrying the track
        self.add_stream(state, &participant_id, stream, None)
    }

    fn remove_track(
        &self,
        state: &Registry,
        claimed: &str,
        stream: &Arc<dyn MediaStream>,
        track: &Arc<dyn MediaTrack>,
    ) -> Registry {
        let participant_id = self.normalized_participant(stream, claimed);

        let known = state
            .get(&participant_id)
            .map(|owned| owned.contains_stream(stream))
            .unwrap_or(false);
        if !known {
            return state.clone();
        }

        stream.remove_track(track);

        if stream.tracks().is_empty() {
            tracing::debug!(
                participant = %participant_id,
                stream = %stream.id(),
                "Last track removed, dropping stream"
            );
            return self.remove_stream(state, &participant_id, stream);
        }

        state.clone()
    }

    fn remove_participant(&self, state: &Registry, participant_id: &str) -> Registry {
        let owned = match state.get(participant_id) {
            Some(owned) => owned,
            None => return state.clone(),
        };

        for entry in &owned.streams {
            entry.release(self.display.as_ref());
        }

        tracing::info!(
            participant = %participant_id,
            streams = owned.streams.len(),
            "Participant removed"
        );

        state.without_participant(participant_id)
    }

    fn end_call(&self, state: &Registry) -> Registry {
        if state.is_empty() {
            return Registry::empty();
        }

        for owned in state.iter() {
            for entry in &owned.streams {
                entry.teardown(self.display.as_ref());
            }
        }

        tracing::info!(
            participants = state.participant_count(),
            "Call ended, registry reset"
        );

        Registry::empty()
    }
}

#[cfg(test)]
mod tests {
    use crate::media::dummy::{DummyDisplay, DummyStream, DummyTrack};

    use super::*;

    fn add(participant: &str, stream: &Arc<DummyStream>, kind: Option<StreamKind>) -> StreamEvent {
        StreamEvent::StreamAdd {
            participant_id: participant.to_string(),
            stream: stream.clone(),
            kind,
        }
    }

    fn remove(participant: &str, stream: &Arc<DummyStream>) -> StreamEvent {
        StreamEvent::StreamRemove {
            participant_id: participant.to_string(),
            stream: stream.clone(),
        }
    }

    fn camera_stream(id: &str) -> (Arc<DummyStream>, Arc<DummyTrack>, Arc<DummyTrack>) {
        let audio = DummyTrack::audio(format!("{}-audio", id));
        let video = DummyTrack::video(format!("{}-video", id));
        let stream = DummyStream::with_tracks(id, vec![audio.clone(), video.clone()]);
        (stream, audio, video)
    }

    #[test]
    fn test_add_stream_files_entry_with_preview() {
        let display = DummyDisplay::new();
        let reducer = StreamReducer::new(display.clone());
        let (stream, _, _) = camera_stream("cam-1");

        let state = reducer.reduce(
            &Registry::empty(),
            add("u1", &stream, Some(StreamKind::Camera)),
        );

        let owned = state.get("u1").expect("participant filed");
        assert_eq!(owned.stream_count(), 1);
        let entry = &owned.streams[0];
        assert_eq!(entry.kind, Some(StreamKind::Camera));
        assert_eq!(entry.url.as_ref().unwrap().as_str(), "blob:1");
    }

    #[test]
    fn test_add_same_stream_twice_is_identity_noop() {
        let display = DummyDisplay::new();
        let reducer = StreamReducer::new(display.clone());
        let (stream, _, _) = camera_stream("cam-1");

        let once = reducer.reduce(&Registry::empty(), add("u1", &stream, None));
        let twice = reducer.reduce(&once, add("u1", &stream, None));

        assert!(Registry::same(&once, &twice));
        // No second preview was acquired for the duplicate
        assert_eq!(display.acquired(), 1);
    }

    #[test]
    fn test_preview_failure_degrades_to_no_url() {
        let display = DummyDisplay::failing();
        let reducer = StreamReducer::new(display.clone());
        let (stream, _, _) = camera_stream("cam-1");

        let state = reducer.reduce(&Registry::empty(), add("u1", &stream, None));

        let entry = &state.get("u1").unwrap().streams[0];
        assert!(entry.url.is_none());
        assert_eq!(state.stats().previews, 0);
    }

    #[test]
    fn test_previews_disabled_by_config() {
        let display = DummyDisplay::new();
        let reducer = StreamReducer::with_config(
            display.clone(),
            RegistryConfig::default().acquire_previews(false),
        );
        let (stream, _, _) = camera_stream("cam-1");

        let state = reducer.reduce(&Registry::empty(), add("u1", &stream, None));

        assert!(state.get("u1").unwrap().streams[0].url.is_none());
        assert_eq!(display.acquired(), 0);
    }

    #[test]
    fn test_relay_id_overrides_claimed_participant() {
        let display = DummyDisplay::new();
        let reducer = StreamReducer::new(display);
        let stream = DummyStream::new("sfu_u42_3");

        let state = reducer.reduce(
            &Registry::empty(),
            add("other", &stream, Some(StreamKind::Screen)),
        );

        assert!(state.contains("u42"));
        assert!(!state.contains("other"));
    }

    #[test]
    fn test_plain_and_four_segment_ids_use_claimed_participant() {
        let display = DummyDisplay::new();
        let reducer = StreamReducer::new(display);

        let plain = DummyStream::new("cam");
        let four = DummyStream::new("sfu_u42_3_extra");

        let mut state = reducer.reduce(&Registry::empty(), add("u1", &plain, None));
        state = reducer.reduce(&state, add("u2", &four, None));

        assert!(state.contains("u1"));
        assert!(state.contains("u2"));
        assert!(!state.contains("u42"));
    }

    #[test]
    fn test_normalization_applies_on_remove_too() {
        let display = DummyDisplay::new();
        let reducer = StreamReducer::new(display);
        let stream = DummyStream::new("sfu_u42_3");

        // Filed under u42 on add, so a remove claiming a different
        // participant must still find it
        let state = reducer.reduce(&Registry::empty(), add("other", &stream, None));
        let drained = reducer.reduce(&state, remove("another", &stream));

        assert!(drained.is_empty());
    }

    #[test]
    fn test_custom_relay_prefix() {
        let display = DummyDisplay::new();
        let reducer = StreamReducer::with_config(
            display,
            RegistryConfig::default().relay_prefix("mix"),
        );
        let stream = DummyStream::new("mix_u7_0");

        let state = reducer.reduce(&Registry::empty(), add("other", &stream, None));

        assert!(state.contains("u7"));
    }

    #[test]
    fn test_remove_last_stream_deletes_participant_key() {
        let display = DummyDisplay::new();
        let reducer = StreamReducer::new(display.clone());
        let (stream, audio, video) = camera_stream("cam");

        let state = reducer.reduce(
            &Registry::empty(),
            add("u1", &stream, Some(StreamKind::Camera)),
        );
        let url = state.get("u1").unwrap().streams[0].url.clone().unwrap();

        let drained = reducer.reduce(&state, remove("u1", &stream));

        assert!(!drained.contains("u1"));
        assert!(drained.is_empty());
        assert_eq!(audio.stop_count(), 1);
        assert_eq!(video.stop_count(), 1);
        assert_eq!(display.release_count(&url), 1);
    }

    #[test]
    fn test_double_remove_does_not_release_twice() {
        let display = DummyDisplay::new();
        let reducer = StreamReducer::new(display.clone());
        let (stream, audio, _) = camera_stream("cam");

        let state = reducer.reduce(&Registry::empty(), add("u1", &stream, None));
        let url = state.get("u1").unwrap().streams[0].url.clone().unwrap();

        let once = reducer.reduce(&state, remove("u1", &stream));
        let twice = reducer.reduce(&once, remove("u1", &stream));

        assert!(Registry::same(&once, &twice));
        assert_eq!(audio.stop_count(), 1);
        assert_eq!(display.release_count(&url), 1);
    }

    #[test]
    fn test_remove_unknown_stream_keeps_participant() {
        let display = DummyDisplay::new();
        let reducer = StreamReducer::new(display);
        let (known, _, _) = camera_stream("cam-1");
        let (unknown, _, _) = camera_stream("cam-2");

        let state = reducer.reduce(&Registry::empty(), add("u1", &known, None));
        let next = reducer.reduce(&state, remove("u1", &unknown));

        assert!(Registry::same(&state, &next));
        assert!(next.contains("u1"));
    }

    #[test]
    fn test_remove_one_of_two_streams_keeps_the_other_in_order() {
        let display = DummyDisplay::new();
        let reducer = StreamReducer::new(display.clone());
        let (first, _, _) = camera_stream("cam");
        let second = DummyStream::with_tracks("screen", vec![DummyTrack::video("screen-video")]);

        let mut state = reducer.reduce(
            &Registry::empty(),
            add("u1", &first, Some(StreamKind::Camera)),
        );
        state = reducer.reduce(&state, add("u1", &second, Some(StreamKind::Screen)));
        assert_eq!(state.get("u1").unwrap().stream_count(), 2);

        let next = reducer.reduce(&state, remove("u1", &first));

        let owned = next.get("u1").unwrap();
        assert_eq!(owned.stream_count(), 1);
        assert_eq!(owned.streams[0].kind, Some(StreamKind::Screen));
    }

    #[test]
    fn test_track_add_to_known_stream_keeps_state_reference() {
        let display = DummyDisplay::new();
        let reducer = StreamReducer::new(display);
        let stream = DummyStream::new("cam");
        let track = DummyTrack::video("cam-video");

        let state = reducer.reduce(&Registry::empty(), add("u1", &stream, None));
        let next = reducer.reduce(
            &state,
            StreamEvent::TrackAdd {
                participant_id: "u1".to_string(),
                stream: stream.clone(),
                track: track.clone(),
            },
        );

        assert!(Registry::same(&state, &next));
        // The shared stream object did pick up the track
        assert_eq!(stream.tracks().len(), 1);
    }

    #[test]
    fn test_track_add_creates_entry_for_unknown_stream() {
        let display = DummyDisplay::new();
        let reducer = StreamReducer::new(display);
        let stream = DummyStream::new("cam");
        let track = DummyTrack::audio("cam-audio");

        let state = reducer.reduce(
            &Registry::empty(),
            StreamEvent::TrackAdd {
                participant_id: "u1".to_string(),
                stream: stream.clone(),
                track: track.clone(),
            },
        );

        let owned = state.get("u1").expect("entry created");
        assert_eq!(owned.stream_count(), 1);
        let tracks = owned.streams[0].stream.tracks();
        let added: Arc<dyn MediaTrack> = track;
        assert_eq!(tracks.len(), 1);
        assert!(same_track(&tracks[0], &added));
    }

    #[test]
    fn test_remove_last_track_drops_the_stream() {
        let display = DummyDisplay::new();
        let reducer = StreamReducer::new(display.clone());
        let track = DummyTrack::audio("mic");
        let stream = DummyStream::with_tracks("audio-1", vec![track.clone()]);

        let state = reducer.reduce(&Registry::empty(), add("u1", &stream, None));
        let url = state.get("u1").unwrap().streams[0].url.clone().unwrap();

        let next = reducer.reduce(
            &state,
            StreamEvent::TrackRemove {
                participant_id: "u1".to_string(),
                stream: stream.clone(),
                track: track.clone(),
            },
        );

        // Same outcome as an explicit stream-remove
        assert!(next.is_empty());
        assert_eq!(track.stop_count(), 1);
        assert_eq!(display.release_count(&url), 1);
    }

    #[test]
    fn test_remove_track_with_others_left_keeps_state_reference() {
        let display = DummyDisplay::new();
        let reducer = StreamReducer::new(display);
        let (stream, audio, _video) = camera_stream("cam");

        let state = reducer.reduce(&Registry::empty(), add("u1", &stream, None));
        let next = reducer.reduce(
            &state,
            StreamEvent::TrackRemove {
                participant_id: "u1".to_string(),
                stream: stream.clone(),
                track: audio.clone(),
            },
        );

        assert!(Registry::same(&state, &next));
        assert_eq!(stream.tracks().len(), 1);
        assert_eq!(audio.stop_count(), 0);
    }

    #[test]
    fn test_remove_track_for_unknown_stream_is_noop() {
        let display = DummyDisplay::new();
        let reducer = StreamReducer::new(display);
        let (stream, audio, _) = camera_stream("cam");

        let state = reducer.reduce(
            &Registry::empty(),
            StreamEvent::TrackRemove {
                participant_id: "u1".to_string(),
                stream: stream.clone(),
                track: audio.clone(),
            },
        );

        assert!(Registry::same(&state, &Registry::empty()));
        // Nothing was detached from the shared stream either
        assert_eq!(stream.tracks().len(), 2);
    }

    #[test]
    fn test_participant_removed_releases_everything() {
        let display = DummyDisplay::new();
        let reducer = StreamReducer::new(display.clone());
        let (camera, audio, video) = camera_stream("cam");
        let screen_track = DummyTrack::video("screen-video");
        let screen = DummyStream::with_tracks("screen", vec![screen_track.clone()]);

        let mut state = reducer.reduce(&Registry::empty(), add("u1", &camera, None));
        state = reducer.reduce(&state, add("u1", &screen, Some(StreamKind::Screen)));
        state = reducer.reduce(&state, add("u2", &DummyStream::new("other"), None));

        let next = reducer.reduce(
            &state,
            StreamEvent::ParticipantRemoved {
                participant_id: "u1".to_string(),
            },
        );

        assert!(!next.contains("u1"));
        assert!(next.contains("u2"));
        assert_eq!(audio.stop_count(), 1);
        assert_eq!(video.stop_count(), 1);
        assert_eq!(screen_track.stop_count(), 1);
        assert_eq!(display.released().len(), 2);
    }

    #[test]
    fn test_participant_removed_for_unknown_id_is_noop() {
        let display = DummyDisplay::new();
        let reducer = StreamReducer::new(display);
        let (stream, _, _) = camera_stream("cam");

        let state = reducer.reduce(&Registry::empty(), add("u1", &stream, None));
        let next = reducer.reduce(
            &state,
            StreamEvent::ParticipantRemoved {
                participant_id: "ghost".to_string(),
            },
        );

        assert!(Registry::same(&state, &next));
    }

    #[test]
    fn test_call_ended_resets_to_canonical_empty() {
        let display = DummyDisplay::new();
        let reducer = StreamReducer::new(display.clone());
        let (camera, audio, video) = camera_stream("cam");
        let mic = DummyTrack::audio("mic");
        let voice = DummyStream::with_tracks("sfu_u2_0", vec![mic.clone()]);

        let mut state = reducer.reduce(&Registry::empty(), add("u1", &camera, None));
        state = reducer.reduce(&state, add("u2", &voice, Some(StreamKind::Audio)));
        let urls: Vec<DisplayHandle> = state
            .iter()
            .flat_map(|owned| owned.streams.iter().filter_map(|e| e.url.clone()))
            .collect();
        assert_eq!(urls.len(), 2);

        let next = reducer.reduce(&state, StreamEvent::CallEnded);

        assert!(Registry::same(&next, &Registry::empty()));
        for track in [&audio, &video, &mic] {
            assert_eq!(track.stop_count(), 1);
            assert_eq!(track.observer_clears(), 1);
        }
        for url in &urls {
            assert_eq!(display.release_count(url), 1);
        }
    }

    #[test]
    fn test_call_ended_on_empty_registry_is_canonical_noop() {
        let display = DummyDisplay::new();
        let reducer = StreamReducer::new(display);

        let next = reducer.reduce(&Registry::empty(), StreamEvent::CallEnded);

        assert!(Registry::same(&next, &Registry::empty()));
    }

    #[test]
    fn test_media_resolved_behaves_like_stream_add() {
        let display = DummyDisplay::new();
        let reducer = StreamReducer::new(display);
        let stream = DummyStream::new("sfu_u2_7");

        let state = reducer.reduce(
            &Registry::empty(),
            StreamEvent::MediaResolved {
                participant_id: "u2".to_string(),
                stream: stream.clone(),
                kind: Some(StreamKind::Screen),
            },
        );

        let owned = state.get("u2").expect("filed under true owner");
        assert_eq!(owned.streams[0].kind, Some(StreamKind::Screen));
        assert!(owned.streams[0].url.is_some());
    }

    #[test]
    fn test_media_rejected_is_noop() {
        let display = DummyDisplay::new();
        let reducer = StreamReducer::new(display);
        let (stream, _, _) = camera_stream("cam");

        let state = reducer.reduce(&Registry::empty(), add("u1", &stream, None));
        let next = reducer.reduce(&state, StreamEvent::MediaRejected);

        assert!(Registry::same(&state, &next));
    }
}
