use anyhow::Result;
use chatsync_core::config::ClientConfig;
use chatsync_core::message::MessageDraft;

use super::Output;

pub async fn run(
    config: &ClientConfig,
    self_id: &str,
    user_id: &str,
    text: String,
    image: Option<String>,
    output: Output,
) -> Result<()> {
    let session = super::start(config, self_id)?;
    session.store.load_directory().await?;
    session
        .store
        .select_conversation(session.user(user_id))
        .await?;

    let mut draft = MessageDraft::text(text);
    if let Some(image) = image {
        draft = draft.with_image(image);
    }
    let sent_before = session.store.snapshot().transcript.len();
    session.store.send(draft).await?;

    let snapshot = session.store.snapshot();
    if snapshot.transcript.len() > sent_before {
        super::print_snapshot(output, &snapshot)?;
    }
    session.close().await;
    Ok(())
}
