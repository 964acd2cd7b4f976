//! Pure feed reconciliation.
//!
//! [`FeedState`] holds the locally cached booth sequence and applies change
//! notifications, bulk loads and optimistic likes to it. It does no I/O.

use serde::{Deserialize, Serialize};

use crate::record::{BoothRecord, ChangeEvent, ChangeOp};
use crate::types::{BoothId, SortKey};

use super::Notice;

/// Lifecycle phase of a feed view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedPhase {
    /// Mounted, initial bulk load not finished.
    Loading,
    /// Sequence populated; applying changes.
    Ready,
    /// Sequence discarded; waiting for a bulk reload.
    Refreshing,
    /// Torn down. Nothing is applied any more.
    Unmounted,
}

/// Locally cached view of the booth table.
#[derive(Debug, Clone)]
pub struct FeedState {
    records: Vec<BoothRecord>,
    selected: Option<BoothRecord>,
    sort: SortKey,
    phase: FeedPhase,
}

impl FeedState {
    /// Empty state in the `Loading` phase.
    pub fn new(sort: SortKey) -> Self {
        Self {
            records: Vec::new(),
            selected: None,
            sort,
            phase: FeedPhase::Loading,
        }
    }

    pub fn records(&self) -> &[BoothRecord] {
        &self.records
    }

    /// Snapshot of the selected booth, if any.
    pub fn selected(&self) -> Option<&BoothRecord> {
        self.selected.as_ref()
    }

    pub fn sort(&self) -> SortKey {
        self.sort
    }

    pub fn phase(&self) -> FeedPhase {
        self.phase
    }

    pub fn is_unmounted(&self) -> bool {
        self.phase == FeedPhase::Unmounted
    }

    /// First cached record with this id.
    pub fn find(&self, id: &BoothId) -> Option<&BoothRecord> {
        self.records.iter().find(|r| &r.id == id)
    }

    /// Select a booth from the current sequence. Unknown ids clear the selection.
    pub fn select(&mut self, id: &BoothId) -> Option<&BoothRecord> {
        if self.is_unmounted() {
            return None;
        }
        self.selected = self.find(id).cloned();
        self.selected.as_ref()
    }

    pub fn clear_selection(&mut self) {
        if !self.is_unmounted() {
            self.selected = None;
        }
    }

    /// Replace the whole sequence with a bulk load result and become `Ready`.
    ///
    /// The selection is re-resolved by id against the new sequence.
    pub fn replace_all(&mut self, records: Vec<BoothRecord>) {
        if self.is_unmounted() {
            return;
        }
        self.records = records;
        let previous = self.selected.take();
        let resolved = previous.and_then(|s| self.find(&s.id).cloned());
        self.selected = resolved;
        self.phase = FeedPhase::Ready;
    }

    /// Discard the sequence and wait for a reload under `sort`.
    pub fn begin_refresh(&mut self, sort: SortKey) {
        if self.is_unmounted() {
            return;
        }
        self.records.clear();
        self.sort = sort;
        self.phase = FeedPhase::Refreshing;
    }

    /// Apply one change notification.
    ///
    /// Inserts are prepended without checking for an existing id. Updates
    /// and deletes for unknown ids are no-ops.
    pub fn apply_change(&mut self, event: &ChangeEvent) -> Option<Notice> {
        if self.is_unmounted() {
            return None;
        }

        let record = &event.record;
        match event.op {
            ChangeOp::Insert => {
                self.records.insert(0, record.clone());
                Some(Notice::BoothAdded {
                    title: record.title.clone(),
                })
            }
            ChangeOp::Update => {
                for cached in self.records.iter_mut().filter(|r| r.id == record.id) {
                    *cached = record.clone();
                }
                if let Some(selected) = self.selected.as_mut().filter(|s| s.id == record.id) {
                    *selected = record.clone();
                }
                None
            }
            ChangeOp::Delete => {
                self.records.retain(|r| r.id != record.id);
                if self.selected.as_ref().is_some_and(|s| s.id == record.id) {
                    self.selected = None;
                }
                None
            }
        }
    }

    /// Set the cached like count of `id` (and the selected snapshot) to `likes`.
    ///
    /// Returns false if the id is not in the sequence.
    pub fn apply_optimistic_like(&mut self, id: &BoothId, likes: u64) -> bool {
        if self.is_unmounted() {
            return false;
        }

        let mut found = false;
        for cached in self.records.iter_mut().filter(|r| &r.id == id) {
            cached.likes = likes;
            found = true;
        }
        if !found {
            return false;
        }
        if let Some(selected) = self.selected.as_mut().filter(|s| &s.id == id) {
            selected.likes = likes;
        }
        true
    }

    /// Enter the terminal phase. Every later call is a no-op.
    pub fn unmount(&mut self) {
        self.phase = FeedPhase::Unmounted;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn booth(id: &str, likes: u64) -> BoothRecord {
        BoothRecord {
            id: BoothId::new(id).unwrap(),
            title: format!("Booth {}", id),
            author: "Kim".to_string(),
            description: "A booth for feed state tests".to_string(),
            image_url: format!("memory://blobs/festival-booths/{}.png", id),
            likes,
            created_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
        }
    }

    fn id(s: &str) -> BoothId {
        BoothId::new(s).unwrap()
    }

    fn ids(state: &FeedState) -> Vec<&str> {
        state.records().iter().map(|r| r.id.as_str()).collect()
    }

    fn ready(records: Vec<BoothRecord>) -> FeedState {
        let mut state = FeedState::new(SortKey::CreatedAt);
        state.replace_all(records);
        state
    }

    #[test]
    fn starts_loading_and_becomes_ready() {
        let mut state = FeedState::new(SortKey::Likes);
        assert_eq!(state.phase(), FeedPhase::Loading);
        state.replace_all(vec![booth("a", 0)]);
        assert_eq!(state.phase(), FeedPhase::Ready);
        assert_eq!(state.sort(), SortKey::Likes);
    }

    #[test]
    fn replay_matches_expected_sequence() {
        let mut state = ready(vec![booth("a", 0)]);

        let notice = state.apply_change(&ChangeEvent::insert(booth("b", 0)));
        assert_eq!(
            notice,
            Some(Notice::BoothAdded {
                title: "Booth b".to_string()
            })
        );
        state.apply_change(&ChangeEvent::update(booth("a", 7)));
        state.apply_change(&ChangeEvent::insert(booth("c", 0)));
        state.apply_change(&ChangeEvent::delete(booth("b", 0)));

        assert_eq!(ids(&state), vec!["c", "a"]);
        assert_eq!(state.find(&id("a")).unwrap().likes, 7);
    }

    #[test]
    fn duplicate_insert_yields_two_entries() {
        let mut state = ready(vec![booth("a", 0)]);
        state.apply_change(&ChangeEvent::insert(booth("a", 0)));
        assert_eq!(ids(&state), vec!["a", "a"]);
    }

    #[test]
    fn unknown_ids_are_ignored() {
        let mut state = ready(vec![booth("a", 1)]);
        assert!(state.apply_change(&ChangeEvent::update(booth("zz", 9))).is_none());
        state.apply_change(&ChangeEvent::delete(booth("zz", 9)));
        assert_eq!(ids(&state), vec!["a"]);
        assert_eq!(state.find(&id("a")).unwrap().likes, 1);
    }

    #[test]
    fn update_refreshes_selection() {
        let mut state = ready(vec![booth("a", 1), booth("b", 2)]);
        state.select(&id("a"));
        state.apply_change(&ChangeEvent::update(booth("a", 10)));
        assert_eq!(state.selected().unwrap().likes, 10);

        state.apply_change(&ChangeEvent::update(booth("b", 20)));
        assert_eq!(state.selected().unwrap().id.as_str(), "a");
    }

    #[test]
    fn delete_clears_selection() {
        let mut state = ready(vec![booth("a", 1), booth("b", 2)]);
        state.select(&id("b"));
        state.apply_change(&ChangeEvent::delete(booth("a", 1)));
        assert!(state.selected().is_some());
        state.apply_change(&ChangeEvent::delete(booth("b", 2)));
        assert!(state.selected().is_none());
    }

    #[test]
    fn select_unknown_clears() {
        let mut state = ready(vec![booth("a", 1)]);
        state.select(&id("a"));
        assert!(state.select(&id("nope")).is_none());
        assert!(state.selected().is_none());
    }

    #[test]
    fn reload_re_resolves_selection() {
        let mut state = ready(vec![booth("a", 1), booth("b", 2)]);
        state.select(&id("a"));

        state.begin_refresh(SortKey::Likes);
        assert_eq!(state.phase(), FeedPhase::Refreshing);
        assert!(state.records().is_empty());

        state.replace_all(vec![booth("b", 2), booth("a", 3)]);
        assert_eq!(state.selected().unwrap().likes, 3);

        state.replace_all(vec![booth("b", 2)]);
        assert!(state.selected().is_none());
    }

    #[test]
    fn optimistic_like_sets_record_and_selection() {
        let mut state = ready(vec![booth("a", 3)]);
        state.select(&id("a"));
        assert!(state.apply_optimistic_like(&id("a"), 4));
        assert_eq!(state.find(&id("a")).unwrap().likes, 4);
        assert_eq!(state.selected().unwrap().likes, 4);
        assert!(!state.apply_optimistic_like(&id("missing"), 1));
    }

    #[test]
    fn unmounted_state_never_changes() {
        let mut state = ready(vec![booth("a", 3)]);
        state.unmount();

        assert!(state.apply_change(&ChangeEvent::insert(booth("b", 0))).is_none());
        state.apply_change(&ChangeEvent::delete(booth("a", 3)));
        assert!(!state.apply_optimistic_like(&id("a"), 9));
        state.replace_all(Vec::new());
        state.begin_refresh(SortKey::Likes);
        assert!(state.select(&id("a")).is_none());

        assert_eq!(state.phase(), FeedPhase::Unmounted);
        assert_eq!(ids(&state), vec!["a"]);
        assert_eq!(state.records()[0].likes, 3);
        assert_eq!(state.sort(), SortKey::CreatedAt);
    }
}
