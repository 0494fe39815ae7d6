use std::time::Duration;

use bounce_core::{SdpKind, Signal};
use bounce_peer::{BallServer, ServerConfig, SessionEnd, SignalingTransport, TransportConfig};

use crate::integration::init_tracing;
use crate::utils::memory_pair;

#[tokio::test]
async fn test_server_offers_and_honours_bye() {
    init_tracing();

    let config = ServerConfig {
        transport: TransportConfig::local(),
        ..Default::default()
    };
    let (server_end, mut remote) = memory_pair();
    let server = tokio::spawn(BallServer::new(config).run(server_end, std::future::pending()));

    let first = tokio::time::timeout(Duration::from_secs(5), remote.receive())
        .await
        .expect("Timeout waiting for the offer")
        .expect("Signaling closed");
    let Signal::Description(offer) = first else {
        panic!("expected an offer first, got {first:?}");
    };
    assert_eq!(offer.kind, SdpKind::Offer);
    assert!(offer.sdp.contains("m=video"), "offer carries the ball video");
    assert!(offer.sdp.contains("m=application"), "offer carries the data channel");
    assert!(offer.sdp.to_ascii_uppercase().contains("H264"));

    remote.send(&Signal::Bye).await.expect("Failed to send bye");

    let report = tokio::time::timeout(Duration::from_secs(5), server)
        .await
        .expect("Server did not stop on bye")
        .expect("Server task panicked")
        .expect("Server failed");
    assert_eq!(report.end, SessionEnd::Bye);
    assert_eq!(report.errors.reports, 0);
}
