use anyhow::Result;
use chatsync_core::config::ClientConfig;
use chatsync_core::user::UserId;

use super::Output;

pub async fn run(
    config: &ClientConfig,
    self_id: &str,
    online: Vec<String>,
    online_only: bool,
    output: Output,
) -> Result<()> {
    let mut session = super::start(config, self_id)?;
    session
        .store
        .set_presence(online.into_iter().map(UserId::new))
        .await?;
    session.store.set_online_only(online_only).await?;
    session.store.load_directory().await?;

    super::print_snapshot(output, &session.store.snapshot())?;
    session.report_notifications();
    session.close().await;
    Ok(())
}
