use bounce_core::Error as CoreError;
use bounce_peer::media::Blackhole;
use bounce_peer::{
    BallServer, ClientConfig, MediaConfig, PeerError, ServerConfig, SignalingTransport,
    TrackingClient, TransportConfig,
};

use crate::integration::init_tracing;
use crate::utils::memory_pair;

fn uneven_rate() -> MediaConfig {
    MediaConfig {
        fps: 7,
        ..Default::default()
    }
}

#[tokio::test]
async fn test_server_rejects_uneven_frame_rate() {
    init_tracing();

    let config = ServerConfig {
        transport: TransportConfig::local(),
        media: uneven_rate(),
        ..Default::default()
    };

    let (server_end, mut remote) = memory_pair();
    let sent = server_end.sent_log();

    let result = BallServer::new(config)
        .run(server_end, std::future::pending())
        .await;

    assert!(matches!(
        result,
        Err(PeerError::Core(CoreError::InvalidMediaConfig(_)))
    ));
    assert!(sent.lock().unwrap().is_empty(), "nothing may be signaled");
    assert!(remote.receive().await.is_err(), "transport was dropped unused");
}

#[tokio::test]
async fn test_client_rejects_zero_frame_rate() {
    init_tracing();

    let config = ClientConfig {
        transport: TransportConfig::local(),
        media: MediaConfig {
            fps: 0,
            ..Default::default()
        },
        ..Default::default()
    };

    let (client_end, _remote) = memory_pair();

    let result = TrackingClient::new(config, Box::new(Blackhole::default()))
        .run(client_end, std::future::pending())
        .await;

    assert!(matches!(
        result,
        Err(PeerError::Core(CoreError::InvalidMediaConfig(_)))
    ));
}
