use std::sync::atomic::Ordering;
use std::time::Duration;

use tokio::sync::oneshot;

use bounce_core::{FrameShape, GeometryConfig};
use bounce_peer::{
    BallServer, ClientConfig, ServerConfig, SessionEnd, TrackingClient, TransportConfig,
};

use crate::integration::init_tracing;
use crate::utils::{CountingSink, memory_pair};

/// Full loop: ball video to the client, centroids back to the server.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_client_tracks_the_ball() {
    init_tracing();

    let server_config = ServerConfig {
        geometry: GeometryConfig {
            shape: FrameShape {
                height: 240,
                width: 320,
                channels: 3,
            },
            ..Default::default()
        },
        transport: TransportConfig::local(),
        ..Default::default()
    };
    let client_config = ClientConfig {
        transport: TransportConfig::local(),
        ..Default::default()
    };

    let (server_end, client_end) = memory_pair();
    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let (sink, recorded) = CountingSink::new();

    let server = tokio::spawn(BallServer::new(server_config).run(server_end, std::future::pending()));
    let client = tokio::spawn(
        TrackingClient::new(client_config, Box::new(sink)).run(client_end, async {
            let _ = stop_rx.await;
        }),
    );

    tokio::time::sleep(Duration::from_secs(8)).await;
    let _ = stop_tx.send(());

    let client = tokio::time::timeout(Duration::from_secs(10), client)
        .await
        .expect("Client did not shut down")
        .expect("Client task panicked")
        .expect("Client failed");
    let server = tokio::time::timeout(Duration::from_secs(10), server)
        .await
        .expect("Server did not stop after the client left")
        .expect("Server task panicked")
        .expect("Server failed");

    assert_eq!(client.end, SessionEnd::Interrupted);
    assert_eq!(server.end, SessionEnd::Bye);

    assert!(client.frames > 0, "no video reached the client");
    assert!(recorded.writes.load(Ordering::Relaxed) > 0, "nothing was recorded");
    assert!(recorded.closed.load(Ordering::Acquire), "the sink was never closed");
    assert_eq!(
        recorded.after_close.load(Ordering::Relaxed),
        0,
        "frames kept flowing into the closed sink"
    );
    assert!(client.locator.located > 0, "the ball was never located");
    assert!(client.centroids_sent > 0, "no centroid was reported");
    assert!(server.errors.reports > 0, "the server scored nothing");
    assert_eq!(server.errors.malformed, 0);
    // Latency makes the reported position lag behind, but it has to stay
    // in the neighbourhood of the ball.
    assert!(server.errors.mean < 60.0, "mean error {}", server.errors.mean);
}
