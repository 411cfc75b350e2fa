//! Feeds realtime frames from stdin into the store.
//!
//! Each stdin line is one raw frame, e.g.
//! `{"event":"newMessage","data":{"_id":"m1","senderId":"z","receiverId":"me","text":"hi"}}`.
//! Every frame read before end of input is applied before the command exits.

use anyhow::Result;
use chatsync_core::config::ClientConfig;
use tokio::io::{AsyncBufReadExt, BufReader};

use super::Output;

pub async fn run(
    config: &ClientConfig,
    self_id: &str,
    select: Option<&str>,
    output: Output,
) -> Result<()> {
    let mut session = super::start(config, self_id)?;
    session.store.subscribe().await?;
    session.store.load_directory().await?;
    if let Some(user_id) = select {
        session
            .store
            .select_conversation(session.user(user_id))
            .await?;
    }

    let mut snapshots = session.store.watch();
    super::print_snapshot(output, &snapshots.borrow_and_update().clone())?;

    // On stdin EOF the feed is closed and frames already published keep
    // flowing until the store reports the subscription ended.
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut draining = false;
    loop {
        tokio::select! {
            line = lines.next_line(), if !draining => match line? {
                Some(line) if line.trim().is_empty() => continue,
                Some(line) => {
                    session.channel.publish(line);
                }
                None => {
                    tracing::debug!("[Watch] Input closed, draining realtime feed");
                    session.channel.close();
                    draining = true;
                    if !session.store.snapshot().subscribed {
                        break;
                    }
                }
            },
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = snapshots.borrow_and_update().clone();
                println!();
                super::print_snapshot(output, &snapshot)?;
                session.report_notifications();
                if draining && !snapshot.subscribed {
                    break;
                }
            }
        }
    }

    session.store.unsubscribe().await?;
    session.close().await;
    Ok(())
}
