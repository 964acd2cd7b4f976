//! Feed Synchronizer: keeps a [`FeedState`] consistent with a Record Store.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, instrument, warn};

use crate::Result;
use crate::record::{BoothPatch, BoothRecord, ChangeEvent, ChangeOp};
use crate::subscription::Subscription;
use crate::traits::RecordStore;
use crate::types::{BoothId, ListOrder, SortKey};

use super::{FeedPhase, FeedState, Notice};

/// What a single reactor step did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedEvent {
    /// A change notification was applied.
    Changed { op: ChangeOp, id: BoothId },
    /// The store accepted a like. The feed itself is reconciled by the
    /// matching UPDATE notification.
    LikeConfirmed { id: BoothId, likes: u64 },
    /// The store rejected a like. The optimistic count is kept.
    LikeFailed { id: BoothId },
    /// The change stream reported an error; delivery continues.
    StreamError { message: String },
    /// The change stream ended. No further notifications will arrive.
    StreamEnded,
}

enum Completion {
    Like {
        id: BoothId,
        result: Result<BoothRecord>,
    },
}

/// Owns a feed view and reacts to store traffic.
///
/// All mutation goes through `&mut self`, so notifications, request
/// completions and user actions are applied one at a time in the order they
/// are observed.
pub struct FeedSynchronizer<S: RecordStore> {
    store: Arc<S>,
    state: FeedState,
    subscription: Subscription<S::Changes>,
    completions_tx: mpsc::UnboundedSender<Completion>,
    completions_rx: mpsc::UnboundedReceiver<Completion>,
    in_flight: usize,
    /// The stream ended while a reload was draining it.
    unreported_end: bool,
    notices: Vec<Notice>,
}

impl<S> FeedSynchronizer<S>
where
    S: RecordStore + 'static,
{
    /// Subscribe to `store`, then load the initial sequence sorted by `sort`.
    ///
    /// Subscribing first means no change committed after the query is
    /// missed. Notifications delivered before the query result is installed
    /// are discarded, since the result already reflects them. A failed load
    /// leaves an empty, `Ready` feed and a notice; a failed subscribe fails
    /// the mount.
    #[instrument(skip(store))]
    pub async fn mount(store: Arc<S>, sort: SortKey) -> Result<Self> {
        let changes = store.subscribe().await?;
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();

        let mut feed = Self {
            store,
            state: FeedState::new(sort),
            subscription: Subscription::new(changes),
            completions_tx,
            completions_rx,
            in_flight: 0,
            unreported_end: false,
            notices: Vec::new(),
        };
        feed.load().await;
        debug!(count = feed.state.records().len(), "Feed mounted");
        Ok(feed)
    }

    pub fn state(&self) -> &FeedState {
        &self.state
    }

    pub fn records(&self) -> &[BoothRecord] {
        self.state.records()
    }

    pub fn selected(&self) -> Option<&BoothRecord> {
        self.state.selected()
    }

    pub fn phase(&self) -> FeedPhase {
        self.state.phase()
    }

    pub fn sort(&self) -> SortKey {
        self.state.sort()
    }

    /// Number of like requests still awaiting a response.
    pub fn pending_requests(&self) -> usize {
        self.in_flight
    }

    /// True while [`next_event`](Self::next_event) has something to wait
    /// for: a live change stream or a like request in flight.
    pub fn is_live(&self) -> bool {
        !self.state.is_unmounted()
            && (self.subscription.is_active() || self.unreported_end || self.in_flight > 0)
    }

    /// Like a booth.
    ///
    /// Sends `likes = n + 1` (where `n` is the cached count) to the store in
    /// the background and shows `n + 1` locally straight away. Returns false
    /// if the booth is not in the feed or its count is already at the maximum.
    #[instrument(skip(self))]
    pub fn like(&mut self, id: &BoothId) -> bool {
        if self.state.is_unmounted() {
            return false;
        }
        let Some(current) = self.state.find(id).map(|r| r.likes) else {
            debug!("Like ignored for booth not in feed");
            return false;
        };
        let Some(likes) = current.checked_add(1) else {
            warn!(likes = current, "Like ignored; count cannot grow");
            return false;
        };

        let store = Arc::clone(&self.store);
        let tx = self.completions_tx.clone();
        let task_id = id.clone();
        tokio::spawn(async move {
            let result = store.update(&task_id, &BoothPatch::likes(likes)).await;
            // Closed once unmounted; late completions are dropped.
            let _ = tx.send(Completion::Like {
                id: task_id,
                result,
            });
        });
        self.in_flight += 1;

        self.state.apply_optimistic_like(id, likes);
        true
    }

    pub fn select(&mut self, id: &BoothId) -> Option<&BoothRecord> {
        self.state.select(id)
    }

    pub fn clear_selection(&mut self) {
        self.state.clear_selection();
    }

    /// Discard the feed and reload it sorted by `sort`.
    #[instrument(skip(self))]
    pub async fn set_sort(&mut self, sort: SortKey) {
        if self.state.is_unmounted() {
            return;
        }
        self.state.begin_refresh(sort);
        self.load().await;
    }

    /// Reload with the current sort key.
    pub async fn refresh(&mut self) {
        let sort = self.state.sort();
        self.set_sort(sort).await;
    }

    /// Tear down: release the subscription and ignore everything after.
    pub fn unmount(&mut self) {
        if self.state.is_unmounted() {
            return;
        }
        self.subscription.unsubscribe();
        self.completions_rx.close();
        self.in_flight = 0;
        self.unreported_end = false;
        self.state.unmount();
        debug!("Feed unmounted");
    }

    /// Drain notices raised since the last call.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    /// Wait for the next change notification or request completion and
    /// apply it.
    ///
    /// Returns `None` once unmounted, or when the change stream has ended
    /// and no request is in flight.
    pub async fn next_event(&mut self) -> Option<FeedEvent> {
        if !self.is_live() {
            return None;
        }
        if std::mem::take(&mut self.unreported_end) {
            return Some(FeedEvent::StreamEnded);
        }

        tokio::select! {
            Some(completion) = self.completions_rx.recv(), if self.in_flight > 0 => {
                self.in_flight -= 1;
                Some(self.apply_completion(completion))
            }
            item = self.subscription.next(), if self.subscription.is_active() => {
                Some(match item {
                    Some(Ok(event)) => self.apply_change(event),
                    Some(Err(err)) => {
                        warn!(error = %err, "Change stream error");
                        FeedEvent::StreamError {
                            message: err.to_string(),
                        }
                    }
                    None => FeedEvent::StreamEnded,
                })
            }
            else => None,
        }
    }

    /// Run the bulk query and install its result.
    ///
    /// Anything the subscription delivered up to this point is superseded by
    /// the result and dropped, so a record is never both listed and
    /// prepended.
    async fn load(&mut self) {
        let order = ListOrder::desc(self.state.sort());
        let result = self.store.list(order).await;
        let was_active = self.subscription.is_active();
        let superseded = self.subscription.discard_ready();
        if superseded > 0 {
            debug!(count = superseded, "Dropped notifications superseded by reload");
        }
        if was_active && !self.subscription.is_active() {
            self.unreported_end = true;
        }
        match result {
            Ok(records) => self.state.replace_all(records),
            Err(err) => {
                warn!(error = %err, "Failed to load booths");
                self.state.replace_all(Vec::new());
                self.notices.push(Notice::LoadFailed);
            }
        }
    }

    fn apply_change(&mut self, event: ChangeEvent) -> FeedEvent {
        debug!(op = %event.op, id = %event.record.id, "Applying change");
        if let Some(notice) = self.state.apply_change(&event) {
            self.notices.push(notice);
        }
        FeedEvent::Changed {
            op: event.op,
            id: event.record.id,
        }
    }

    fn apply_completion(&mut self, completion: Completion) -> FeedEvent {
        match completion {
            Completion::Like { id, result } => match result {
                Ok(record) => FeedEvent::LikeConfirmed {
                    id,
                    likes: record.likes,
                },
                Err(err) => {
                    warn!(id = %id, error = %err, "Like request failed");
                    self.notices.push(Notice::LikeFailed { id: id.clone() });
                    FeedEvent::LikeFailed { id }
                }
            },
        }
    }
}
