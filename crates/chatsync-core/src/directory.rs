//! Contact directory: the recency-ordered list of chat counterparties.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::user::{User, UserId};

/// Load lifecycle of the directory.
///
/// `Empty -> Loading -> Loaded`, with `Loading` re-entered on every refresh.
/// A failed refresh lands in `Failed` and keeps whatever list was there; the
/// phase never goes back to `Empty`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DirectoryPhase {
    #[default]
    Empty,
    Loading,
    Loaded,
    Failed,
}

impl DirectoryPhase {
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }
}

/// Owns the user list and keeps it sorted by descending `updated_at`.
///
/// Sorting is stable, so users with equal recency keep their relative order
/// across the repeated re-sorts that every event triggers.
#[derive(Debug, Clone, Default)]
pub struct ContactDirectory {
    users: Vec<User>,
    phase: DirectoryPhase,
}

impl ContactDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> DirectoryPhase {
        self.phase
    }

    /// Marks a fetch as in flight. The current list stays visible.
    pub fn begin_loading(&mut self) {
        self.phase = DirectoryPhase::Loading;
    }

    /// Replaces the full set and re-sorts.
    ///
    /// Later duplicates of an id are dropped so the list stays unique.
    pub fn load(&mut self, users: impl IntoIterator<Item = User>) {
        let mut seen = HashSet::new();
        let mut loaded = Vec::new();
        for user in users {
            if seen.insert(user.id.clone()) {
                loaded.push(user);
            } else {
                tracing::warn!("[ContactDirectory] Dropping duplicate user: {}", user.id);
            }
        }
        self.users = loaded;
        self.sort();
        self.phase = DirectoryPhase::Loaded;
    }

    /// Records a failed fetch without touching the list.
    pub fn fail(&mut self) {
        self.phase = DirectoryPhase::Failed;
    }

    /// Moves `user_id`'s recency marker to `timestamp` and re-sorts.
    ///
    /// Unknown ids are ignored: a message may reference a user that has not
    /// been fetched yet. Returns whether the user was present.
    pub fn touch(&mut self, user_id: &UserId, timestamp: DateTime<Utc>) -> bool {
        let Some(user) = self.users.iter_mut().find(|u| &u.id == user_id) else {
            tracing::debug!("[ContactDirectory] touch ignored for unknown user {}", user_id);
            return false;
        };
        user.updated_at = timestamp;
        self.sort();
        true
    }

    /// Projection for display. Never mutates the stored order.
    pub fn filtered(&self, online_ids: &HashSet<UserId>, online_only: bool) -> Vec<User> {
        self.users
            .iter()
            .filter(|u| !online_only || online_ids.contains(&u.id))
            .cloned()
            .collect()
    }

    pub fn users(&self) -> &[User] {
        &self.users
    }

    pub fn get(&self, user_id: &UserId) -> Option<&User> {
        self.users.iter().find(|u| &u.id == user_id)
    }

    /// Zero-based rank of `user_id` in the stored order.
    pub fn rank_of(&self, user_id: &UserId) -> Option<usize> {
        self.users.iter().position(|u| &u.id == user_id)
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    fn sort(&mut self) {
        // Vec::sort_by is stable
        self.users.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    fn ids(users: &[User]) -> Vec<&str> {
        users.iter().map(|u| u.id.as_str()).collect()
    }

    #[test]
    fn test_load_sorts_by_descending_recency() {
        let mut dir = ContactDirectory::new();
        dir.load(vec![
            User::new("x", "X").with_updated_at(at(10)),
            User::new("y", "Y").with_updated_at(at(20)),
        ]);

        let view = dir.filtered(&HashSet::new(), false);
        assert_eq!(ids(&view), vec!["y", "x"]);
        assert_eq!(dir.phase(), DirectoryPhase::Loaded);
    }

    #[test]
    fn test_equal_recency_keeps_original_order() {
        let mut dir = ContactDirectory::new();
        dir.load(vec![
            User::new("a", "A"),
            User::new("b", "B"),
            User::new("c", "C").with_updated_at(at(5)),
            User::new("d", "D"),
        ]);
        assert_eq!(ids(dir.users()), vec!["c", "a", "b", "d"]);

        // Touching an unrelated user must not reshuffle the epoch-tied ones
        dir.touch(&UserId::new("c"), at(6));
        assert_eq!(ids(dir.users()), vec!["c", "a", "b", "d"]);
    }

    #[test]
    fn test_touch_moves_user_up() {
        let mut dir = ContactDirectory::new();
        dir.load(vec![
            User::new("a", "A").with_updated_at(at(30)),
            User::new("b", "B").with_updated_at(at(20)),
            User::new("c", "C").with_updated_at(at(10)),
        ]);

        assert!(dir.touch(&UserId::new("c"), at(25)));
        assert_eq!(dir.rank_of(&UserId::new("c")), Some(1));

        assert!(dir.touch(&UserId::new("c"), at(40)));
        assert_eq!(dir.rank_of(&UserId::new("c")), Some(0));
    }

    #[test]
    fn test_touch_unknown_user_is_noop() {
        let mut dir = ContactDirectory::new();
        dir.load(vec![User::new("a", "A")]);
        assert!(!dir.touch(&UserId::new("ghost"), at(99)));
        assert_eq!(ids(dir.users()), vec!["a"]);
    }

    #[test]
    fn test_filtered_online_only_does_not_reorder_storage() {
        let mut dir = ContactDirectory::new();
        dir.load(vec![
            User::new("a", "A").with_updated_at(at(3)),
            User::new("b", "B").with_updated_at(at(2)),
            User::new("c", "C").with_updated_at(at(1)),
        ]);
        let online: HashSet<UserId> = [UserId::new("c"), UserId::new("a")].into_iter().collect();

        assert_eq!(ids(&dir.filtered(&online, true)), vec!["a", "c"]);
        assert_eq!(ids(&dir.filtered(&online, false)), vec!["a", "b", "c"]);
        assert_eq!(ids(dir.users()), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_failure_keeps_previous_list() {
        let mut dir = ContactDirectory::new();
        dir.load(vec![User::new("a", "A")]);
        dir.begin_loading();
        assert!(dir.phase().is_loading());
        dir.fail();
        assert_eq!(dir.phase(), DirectoryPhase::Failed);
        assert_eq!(dir.len(), 1);
    }

    #[test]
    fn test_load_drops_duplicate_ids() {
        let mut dir = ContactDirectory::new();
        dir.load(vec![
            User::new("a", "First"),
            User::new("a", "Second"),
        ]);
        assert_eq!(dir.len(), 1);
        assert_eq!(dir.get(&UserId::new("a")).unwrap().full_name, "First");
    }
}
