//! Change notifications emitted after every committed store write
//!
//! Delivery is at-least-once from the subscriber's point of view: a lagging
//! receiver sees `RecvError::Lagged` and must treat it as "something changed".

use tokio::sync::broadcast;

use crate::models::{BudgetId, EntryId};

const CHANNEL_CAPACITY: usize = 64;

/// What a committed write touched
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreChange {
    EntryInserted(EntryId),
    EntryUpdated(EntryId),
    EntryDeleted(EntryId),
    BudgetUpserted {
        id: BudgetId,
        replaced: Option<BudgetId>,
    },
    BudgetsDeleted {
        category: String,
        year: i32,
        count: usize,
    },
    Cleared,
}

/// Fan-out sender shared by the store's write path
#[derive(Debug, Clone)]
pub struct ChangeNotifier {
    sender: broadcast::Sender<StoreChange>,
}

impl ChangeNotifier {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreChange> {
        self.sender.subscribe()
    }

    /// Publish a change; having no subscribers is not an error
    pub fn publish(&self, change: StoreChange) {
        tracing::debug!(?change, "store change");
        let _ = self.sender.send(change);
    }
}

impl Default for ChangeNotifier {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_every_subscriber_sees_changes() {
        let notifier = ChangeNotifier::new();
        let mut a = notifier.subscribe();
        let mut b = notifier.subscribe();

        let id = EntryId::new();
        notifier.publish(StoreChange::EntryInserted(id));

        assert_eq!(a.recv().await.unwrap(), StoreChange::EntryInserted(id));
        assert_eq!(b.recv().await.unwrap(), StoreChange::EntryInserted(id));
    }

    #[test]
    fn test_publish_without_subscribers() {
        let notifier = ChangeNotifier::new();
        notifier.publish(StoreChange::Cleared);
    }
}
