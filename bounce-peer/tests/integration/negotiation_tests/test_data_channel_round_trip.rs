use std::time::Duration;

use tokio::sync::mpsc;

use bounce_peer::{MediaConfig, SessionPeer, SignalingLoop, TransportConfig};

use crate::integration::{init_tracing, wait_for_connected};
use crate::utils::memory_pair;

#[tokio::test]
async fn test_data_channel_round_trip() {
    init_tracing();

    let (server_end, client_end) = memory_pair();

    let (server_tx, server_rx) = mpsc::unbounded_channel();
    let server = SessionPeer::new("server", &TransportConfig::local(), MediaConfig::default(), server_tx)
        .await
        .expect("Failed to create server peer");
    let (client_tx, client_rx) = mpsc::unbounded_channel();
    let client = SessionPeer::new("client", &TransportConfig::local(), MediaConfig::default(), client_tx)
        .await
        .expect("Failed to create client peer");

    let (received_tx, mut received_rx) = mpsc::unbounded_channel();
    server.on_inbound_data(move |text| {
        let received_tx = received_tx.clone();
        async move {
            let _ = received_tx.send(text);
        }
    });

    server
        .add_outbound_data_channel("chat")
        .await
        .expect("Failed to create data channel");
    let offer = server.create_offer().await.expect("Failed to create offer");
    server
        .set_local_description(offer)
        .await
        .expect("Failed to set local description");

    let mut server_loop = SignalingLoop::new(server_end, server.clone(), server_rx);
    let mut client_loop = SignalingLoop::new(client_end, client.clone(), client_rx);
    let server_task = tokio::spawn(async move { server_loop.run().await });
    let client_task = tokio::spawn(async move { client_loop.run().await });

    wait_for_connected(server.subscribe_state(), 10_000)
        .await
        .expect("Server never connected");
    wait_for_connected(client.subscribe_state(), 10_000)
        .await
        .expect("Client never connected");

    // The channel was opened by the server; the client learns about it
    // through the session.
    let channel = tokio::time::timeout(Duration::from_secs(10), async {
        loop {
            if let Some(channel) = client.data_channel().filter(|c| c.is_open()) {
                return channel;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .expect("Data channel never opened on the client");
    assert_eq!(channel.label(), "chat");

    channel.send_text("12 34").await.expect("Failed to send");

    let received = tokio::time::timeout(Duration::from_secs(5), received_rx.recv())
        .await
        .expect("Timeout waiting for message")
        .expect("Handler dropped");
    assert_eq!(received, "12 34");

    server_task.abort();
    client_task.abort();
    client.close().await.expect("Failed to close client");
    server.close().await.expect("Failed to close server");
}
