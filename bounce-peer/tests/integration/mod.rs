pub mod negotiation_tests;
pub mod role_tests;

use std::time::Duration;

use tokio::sync::watch;
use tracing::Level;

use bounce_peer::SessionState;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_test_writer()
        .try_init();
}

/// Waits until the session reports `Connected`, failing on a terminal state.
pub async fn wait_for_connected(
    mut state: watch::Receiver<SessionState>,
    timeout_ms: u64,
) -> anyhow::Result<()> {
    let reached = *tokio::time::timeout(
        Duration::from_millis(timeout_ms),
        state.wait_for(|s| *s == SessionState::Connected || s.is_terminal()),
    )
    .await??;

    anyhow::ensure!(
        reached == SessionState::Connected,
        "session ended in {:?}",
        reached
    );
    Ok(())
}
