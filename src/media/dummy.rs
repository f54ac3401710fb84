//! In-memory media capabilities
//!
//! Stand-ins for the platform media primitives, used by the demo and the
//! unit tests. Tracks count how often they were stopped and how often
//! their observers were cleared; the display source mints deterministic
//! `blob:` urls and records every release. The registry tests assert
//! against these counters to pin down the exactly-once release rules.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use crate::error::CapabilityError;

use super::{same_track, DisplayHandle, DisplayHandles, MediaStream, MediaTrack, TrackKind};

/// Track backed by counters instead of hardware
pub struct DummyTrack {
    id: String,
    kind: TrackKind,
    stop_count: AtomicU32,
    observer_clears: AtomicU32,
}

impl DummyTrack {
    /// Create an audio track
    pub fn audio(id: impl Into<String>) -> Arc<Self> {
        Self::new(id, TrackKind::Audio)
    }

    /// Create a video track
    pub fn video(id: impl Into<String>) -> Arc<Self> {
        Self::new(id, TrackKind::Video)
    }

    fn new(id: impl Into<String>, kind: TrackKind) -> Arc<Self> {
        Arc::new(Self {
            id: id.into(),
            kind,
            stop_count: AtomicU32::new(0),
            observer_clears: AtomicU32::new(0),
        })
    }

    /// How many times `stop` was called
    pub fn stop_count(&self) -> u32 {
        self.stop_count.load(Ordering::Relaxed)
    }

    /// How many times `clear_mute_observers` was called
    pub fn observer_clears(&self) -> u32 {
        self.observer_clears.load(Ordering::Relaxed)
    }

    /// Whether the track has been stopped at least once
    pub fn is_stopped(&self) -> bool {
        self.stop_count() > 0
    }
}

impl MediaTrack for DummyTrack {
    fn id(&self) -> String {
        self.id.clone()
    }

    fn kind(&self) -> TrackKind {
        self.kind
    }

    fn stop(&self) {
        self.stop_count.fetch_add(1, Ordering::Relaxed);
    }

    fn clear_mute_observers(&self) {
        self.observer_clears.fetch_add(1, Ordering::Relaxed);
    }
}

/// Stream holding its tracks in a mutex-guarded list
pub struct DummyStream {
    id: String,
    tracks: Mutex<Vec<Arc<dyn MediaTrack>>>,
}

impl DummyStream {
    /// Create a stream with no tracks
    pub fn new(id: impl Into<String>) -> Arc<Self> {
        Self::with_tracks(id, Vec::new())
    }

    /// Create a stream carrying the given tracks
    pub fn with_tracks(id: impl Into<String>, tracks: Vec<Arc<dyn MediaTrack>>) -> Arc<Self> {
        Arc::new(Self {
            id: id.into(),
            tracks: Mutex::new(tracks),
        })
    }
}

impl MediaStream for DummyStream {
    fn id(&self) -> String {
        self.id.clone()
    }

    fn tracks(&self) -> Vec<Arc<dyn MediaTrack>> {
        self.tracks.lock().unwrap().clone()
    }

    fn add_track(&self, track: Arc<dyn MediaTrack>) {
        let mut tracks = self.tracks.lock().unwrap();
        if !tracks.iter().any(|t| same_track(t, &track)) {
            tracks.push(track);
        }
    }

    fn remove_track(&self, track: &Arc<dyn MediaTrack>) {
        self.tracks.lock().unwrap().retain(|t| !same_track(t, track));
    }
}

/// Display-handle source that mints `blob:<serial>` urls
pub struct DummyDisplay {
    serial: AtomicU32,
    fail: AtomicBool,
    released: Mutex<Vec<DisplayHandle>>,
}

impl DummyDisplay {
    /// Create a display source whose acquisitions succeed
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            serial: AtomicU32::new(0),
            fail: AtomicBool::new(false),
            released: Mutex::new(Vec::new()),
        })
    }

    /// Create a display source whose acquisitions all fail
    pub fn failing() -> Arc<Self> {
        let display = Self::new();
        display.set_fail(true);
        display
    }

    /// Make subsequent acquisitions fail (or succeed again)
    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::Relaxed);
    }

    /// How many handles were acquired so far
    pub fn acquired(&self) -> u32 {
        self.serial.load(Ordering::Relaxed)
    }

    /// Every handle released so far, in release order
    pub fn released(&self) -> Vec<DisplayHandle> {
        self.released.lock().unwrap().clone()
    }

    /// How many times the given handle was released
    pub fn release_count(&self, handle: &DisplayHandle) -> usize {
        self.released
            .lock()
            .unwrap()
            .iter()
            .filter(|h| *h == handle)
            .count()
    }
}

impl DisplayHandles for DummyDisplay {
    fn acquire(&self, stream: &Arc<dyn MediaStream>) -> Result<DisplayHandle, CapabilityError> {
        if self.fail.load(Ordering::Relaxed) {
            return Err(CapabilityError::DisplayUnavailable(stream.id()));
        }
        let serial = self.serial.fetch_add(1, Ordering::Relaxed) + 1;
        Ok(DisplayHandle::new(format!("blob:{}", serial)))
    }

    fn release(&self, handle: &DisplayHandle) {
        self.released.lock().unwrap().push(handle.clone());
    }
}
