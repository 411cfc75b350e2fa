use anyhow::Result;
use chatsync_core::config::ClientConfig;

use super::Output;

pub async fn run(
    config: &ClientConfig,
    self_id: &str,
    user_id: &str,
    output: Output,
) -> Result<()> {
    let session = super::start(config, self_id)?;
    session.store.load_directory().await?;
    session
        .store
        .select_conversation(session.user(user_id))
        .await?;

    let snapshot = session.store.snapshot();
    if output.json {
        println!("{}", serde_json::to_string_pretty(&snapshot.transcript)?);
    } else {
        super::print_transcript(&snapshot);
    }
    session.close().await;
    Ok(())
}
