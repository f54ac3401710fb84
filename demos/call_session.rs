//! Walk a small two-participant call through the registry
//!
//! Run with: cargo run --example call_session
//!
//! The demo wires the in-memory media capabilities through a dispatch
//! loop: one participant joins with a camera stream, a second joins
//! through a relay (its stream id carries the true owner), a track is
//! attached on the fly, and the call is torn down at the end. Set
//! RUST_LOG=debug to watch every transition.

use callstate_rs::media::dummy::{DummyDisplay, DummyStream, DummyTrack};
use callstate_rs::{
    Dispatcher, MediaStream, Registry, StreamEvent, StreamKind, StreamReducer,
};

fn print_registry(label: &str, registry: &Registry) {
    let stats = registry.stats();
    println!(
        "{}: {} participant(s), {} stream(s), {} preview(s)",
        label, stats.participants, stats.streams, stats.previews
    );
    for owned in registry.iter() {
        for entry in &owned.streams {
            println!(
                "  {} -> {} (kind: {:?}, preview: {})",
                owned.participant_id,
                entry.stream.id(),
                entry.kind,
                entry
                    .url
                    .as_ref()
                    .map(|u| u.as_str().to_string())
                    .unwrap_or_else(|| "none".to_string()),
            );
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let display = DummyDisplay::new();
    let dispatcher = Dispatcher::spawn(StreamReducer::new(display.clone()));
    let mut changes = dispatcher.watch();

    // Alice publishes a camera stream with audio and video
    let camera = DummyStream::with_tracks(
        "alice-cam",
        vec![DummyTrack::audio("alice-mic"), DummyTrack::video("alice-cam")],
    );
    dispatcher.dispatch(StreamEvent::StreamAdd {
        participant_id: "alice".to_string(),
        stream: camera.clone(),
        kind: Some(StreamKind::Camera),
    });

    // Bob's screen share arrives via the relay: the claimed participant is
    // the relay itself, the id carries the real owner
    let screen = DummyStream::with_tracks("sfu_bob_1", vec![DummyTrack::video("bob-screen")]);
    dispatcher.dispatch(StreamEvent::StreamAdd {
        participant_id: "relay".to_string(),
        stream: screen.clone(),
        kind: Some(StreamKind::Screen),
    });

    while changes.borrow().participant_count() < 2 {
        changes.changed().await.expect("dispatch loop alive");
    }
    print_registry("after joins", &dispatcher.registry());

    // A second video line lands on Alice's existing stream: the shared
    // stream object changes, the registry value does not
    let before = dispatcher.registry();
    dispatcher.dispatch(StreamEvent::TrackAdd {
        participant_id: "alice".to_string(),
        stream: camera.clone(),
        track: DummyTrack::video("alice-cam-hd"),
    });
    dispatcher.dispatch(StreamEvent::MediaRejected);

    // Bob leaves. The queue is strictly ordered, so once this lands the
    // track attach above has been applied too.
    dispatcher.dispatch(StreamEvent::ParticipantRemoved {
        participant_id: "bob".to_string(),
    });
    while changes.borrow().contains("bob") {
        changes.changed().await.expect("dispatch loop alive");
    }

    let after = dispatcher.registry();
    println!(
        "track attached in place: {} tracks on alice's stream, her record untouched: {}",
        camera.tracks().len(),
        std::sync::Arc::ptr_eq(
            before.get("alice").expect("alice present"),
            after.get("alice").expect("alice present"),
        )
    );
    print_registry("after bob left", &after);

    // Call ends: every track stopped, every preview revoked
    dispatcher.dispatch(StreamEvent::CallEnded);
    while !changes.borrow().is_empty() {
        changes.changed().await.expect("dispatch loop alive");
    }
    print_registry("after call end", &dispatcher.registry());
    println!(
        "previews acquired: {}, previews revoked: {}",
        display.acquired(),
        display.released().len()
    );
}
