use tokio::sync::mpsc;

use bounce_core::Signal;
use bounce_peer::{MediaConfig, SessionPeer, TransportConfig};

use crate::integration::{init_tracing, wait_for_connected};

/// Delivers every candidate before the description it belongs to; the
/// answerer has to buffer them and still connect.
#[tokio::test]
async fn test_early_candidates_are_applied() {
    init_tracing();

    let (offerer_tx, mut offerer_rx) = mpsc::unbounded_channel();
    let offerer = SessionPeer::new("offerer", &TransportConfig::local(), MediaConfig::default(), offerer_tx)
        .await
        .expect("Failed to create offerer");
    let (answerer_tx, mut answerer_rx) = mpsc::unbounded_channel();
    let answerer = SessionPeer::new("answerer", &TransportConfig::local(), MediaConfig::default(), answerer_tx)
        .await
        .expect("Failed to create answerer");

    offerer.add_outbound_data_channel("chat").await.unwrap();
    let offer = offerer.create_offer().await.unwrap();
    offerer.set_local_description(offer).await.unwrap();

    // Wait for at least one local candidate behind the queued offer.
    let Some(Signal::Description(offer)) = offerer_rx.recv().await else {
        panic!("offer must come first");
    };
    let first = tokio::time::timeout(std::time::Duration::from_secs(10), offerer_rx.recv())
        .await
        .expect("No candidate gathered")
        .expect("Queue closed");
    let Signal::Candidate(first) = first else {
        panic!("expected a candidate, got {first:?}");
    };

    answerer.add_ice_candidate(first).await.unwrap();
    answerer.set_remote_description(offer).await.unwrap();

    let answer = answerer.create_answer().await.unwrap();
    answerer.set_local_description(answer).await.unwrap();
    let Some(Signal::Description(answer)) = answerer_rx.recv().await else {
        panic!("answer must come first");
    };
    offerer.set_remote_description(answer).await.unwrap();

    let forward = tokio::spawn({
        let offerer = offerer.clone();
        let answerer = answerer.clone();
        async move {
            loop {
                tokio::select! {
                    Some(Signal::Candidate(c)) = offerer_rx.recv() => {
                        let _ = answerer.add_ice_candidate(c).await;
                    }
                    Some(Signal::Candidate(c)) = answerer_rx.recv() => {
                        let _ = offerer.add_ice_candidate(c).await;
                    }
                    else => break,
                }
            }
        }
    });

    wait_for_connected(answerer.subscribe_state(), 10_000)
        .await
        .expect("Answerer never connected");

    forward.abort();
    offerer.close().await.unwrap();
    answerer.close().await.unwrap();
}
