use bounce_core::Error as CoreError;
use bounce_peer::{BallServer, PeerError, ServerConfig, SignalingTransport, TransportConfig};

use crate::integration::init_tracing;
use crate::utils::memory_pair;

#[tokio::test]
async fn test_invalid_geometry_is_fatal() {
    init_tracing();

    let mut config = ServerConfig {
        transport: TransportConfig::local(),
        ..Default::default()
    };
    config.geometry.radius = 0;

    let (server_end, mut remote) = memory_pair();
    let sent = server_end.sent_log();

    let result = BallServer::new(config)
        .run(server_end, std::future::pending())
        .await;

    assert!(matches!(
        result,
        Err(PeerError::Core(CoreError::InvalidGeometryConfig(_)))
    ));
    assert!(sent.lock().unwrap().is_empty(), "nothing may be signaled");
    assert!(remote.receive().await.is_err(), "transport was dropped unused");
}
