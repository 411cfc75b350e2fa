//! End-to-end runs of the store against scripted collaborators.

mod common;

use chatsync_core::conversation::ConversationPhase;
use chatsync_core::message::MessageDraft;
use chatsync_core::user::UserId;

use common::{Harness, SELF_ID, at, msg};

fn ids(snapshot: &chatsync_application::StoreSnapshot) -> Vec<&str> {
    snapshot
        .contacts
        .iter()
        .map(|c| c.user.id.as_str())
        .collect()
}

#[tokio::test]
async fn test_directory_receive_select_and_send_sequence() {
    let h = Harness::loaded().await;
    let z = UserId::new("z");

    // Directory is ordered by descending recency
    let snapshot = h.store.snapshot();
    assert_eq!(ids(&snapshot), vec!["y", "x", "z"]);

    // Message from Z with nothing selected lands in unread and ranks Z first
    h.clock.set(200);
    let first = msg("m1", "z", SELF_ID, "are you there?", 190);
    h.deliver(&first);
    let snapshot = h.wait_for(|s| s.unread_for(&z) == 1).await;
    assert_eq!(snapshot.rank_of(&z), Some(0));
    assert!(snapshot.transcript.is_empty());

    // Opening Z clears unread, loads history and touches Z again
    let history = vec![msg("m0", SELF_ID, "z", "hello", 150), first.clone()];
    h.api.set_history("z", Ok(history.clone()));
    h.clock.set(300);
    h.store.select_conversation(h.user("z")).await.unwrap();

    let snapshot = h.store.snapshot();
    assert_eq!(snapshot.unread_for(&z), 0);
    assert_eq!(snapshot.transcript, history);
    assert_eq!(snapshot.rank_of(&z), Some(0));
    assert_eq!(snapshot.contact(&z).unwrap().user.updated_at, at(300));
    assert_eq!(snapshot.conversation_phase, ConversationPhase::HistoryLoaded);

    // A live message from the selected user goes straight to the transcript
    h.clock.set(400);
    h.deliver(&msg("m2", "z", SELF_ID, "ok", 399));
    let snapshot = h.wait_for(|s| s.transcript.len() == 3).await;
    assert_eq!(snapshot.unread_for(&z), 0);
    assert_eq!(snapshot.total_unread, 0);

    // Send appends the server-acknowledged message and touches Z at receipt
    let acknowledged = msg("m3", SELF_ID, "z", "hi", 350);
    h.api.push_send_result(Ok(acknowledged.clone()));
    h.clock.set(500);
    h.store.send(MessageDraft::text("hi")).await.unwrap();

    let snapshot = h.store.snapshot();
    assert_eq!(snapshot.transcript.last(), Some(&acknowledged));
    assert_eq!(snapshot.contact(&z).unwrap().user.updated_at, at(500));
    assert_eq!(h.api.sent(), vec![(z.clone(), MessageDraft::text("hi"))]);

    h.store.dispose().await;
}

#[tokio::test]
async fn test_incoming_for_other_user_while_conversation_open() {
    let h = Harness::loaded().await;
    h.store.select_conversation(h.user("x")).await.unwrap();

    h.clock.set(250);
    h.deliver(&msg("m1", "z", SELF_ID, "psst", 240));
    let snapshot = h.wait_for(|s| s.total_unread == 1).await;

    assert!(snapshot.transcript.is_empty());
    assert_eq!(snapshot.unread_for(&UserId::new("z")), 1);
    let row = snapshot.contact(&UserId::new("z")).unwrap();
    assert_eq!(row.unread_count, 1);
    assert!(!row.selected);
    assert!(snapshot.contact(&UserId::new("x")).unwrap().selected);

    h.store.dispose().await;
}

#[tokio::test]
async fn test_message_from_unknown_user_is_queued_without_directory_entry() {
    let h = Harness::loaded().await;
    h.deliver(&msg("m1", "stranger", SELF_ID, "hi", 1));
    let snapshot = h.wait_for(|s| s.total_unread == 1).await;

    assert_eq!(snapshot.unread_for(&UserId::new("stranger")), 1);
    assert_eq!(ids(&snapshot), vec!["y", "x", "z"]);

    h.store.dispose().await;
}

#[tokio::test]
async fn test_reselecting_open_conversation_keeps_transcript() {
    let h = Harness::loaded().await;
    h.api
        .set_history("y", Ok(vec![msg("m1", "y", SELF_ID, "one", 1)]));
    h.store.select_conversation(h.user("y")).await.unwrap();
    h.deliver(&msg("m2", "y", SELF_ID, "two", 2));
    h.wait_for(|s| s.transcript.len() == 2).await;

    h.store.select_conversation(h.user("y")).await.unwrap();
    assert_eq!(h.store.snapshot().transcript.len(), 2);

    h.store.dispose().await;
}

#[tokio::test]
async fn test_clear_selection_routes_messages_to_unread() {
    let h = Harness::loaded().await;
    h.store.select_conversation(h.user("y")).await.unwrap();
    h.store.clear_selection().await.unwrap();

    let snapshot = h.store.snapshot();
    assert!(snapshot.selected.is_none());
    assert_eq!(snapshot.conversation_phase, ConversationPhase::NoSelection);

    h.deliver(&msg("m1", "y", SELF_ID, "back?", 1));
    let snapshot = h.wait_for(|s| s.total_unread == 1).await;
    assert!(snapshot.transcript.is_empty());

    h.store.dispose().await;
}

#[tokio::test]
async fn test_presence_and_online_only_filter() {
    let h = Harness::loaded().await;
    h.store
        .set_presence([UserId::new(SELF_ID), UserId::new("z"), UserId::new("y")])
        .await
        .unwrap();

    let snapshot = h.store.snapshot();
    assert_eq!(snapshot.online_count, 2);
    assert!(snapshot.contact(&UserId::new("z")).unwrap().online);
    assert!(!snapshot.contact(&UserId::new("x")).unwrap().online);

    h.store.set_online_only(true).await.unwrap();
    assert_eq!(ids(&h.store.snapshot()), vec!["y", "z"]);

    h.store.set_online_only(false).await.unwrap();
    assert_eq!(ids(&h.store.snapshot()), vec!["y", "x", "z"]);

    h.store.dispose().await;
}
