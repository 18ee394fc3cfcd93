use std::sync::Arc;

use tokio::sync::watch;

use crate::board::snapshot::BoardSnapshot;

/// Holds the latest complete board.
///
/// Publishing swaps the whole snapshot, so readers see either the previous
/// cycle or the new one, never a mix. Subscribers are woken on every publish.
#[derive(Clone)]
pub struct BoardStore {
    tx: watch::Sender<Option<Arc<BoardSnapshot>>>,
}

impl Default for BoardStore {
    fn default() -> Self {
        Self::new()
    }
}

impl BoardStore {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx }
    }

    /// Replace the current board. Last write wins.
    pub fn publish(&self, snapshot: Arc<BoardSnapshot>) {
        self.tx.send_replace(Some(snapshot));
    }

    /// Latest board, if a cycle has completed.
    pub fn latest(&self) -> Option<Arc<BoardSnapshot>> {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Arc<BoardSnapshot>>> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::snapshot::tests::{eval, snapshot};

    #[test]
    fn empty_until_first_publish() {
        let store = BoardStore::new();
        assert!(store.latest().is_none());

        store.publish(Arc::new(snapshot(vec![eval("A", 1.0, 2.0, None)])));
        assert_eq!(store.latest().unwrap().evaluations.len(), 1);
    }

    #[tokio::test]
    async fn subscribers_see_each_publish() {
        let store = BoardStore::new();
        let mut rx = store.subscribe();

        let mut second = snapshot(vec![]);
        second.cycle = 2;

        store.publish(Arc::new(snapshot(vec![])));
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().as_ref().unwrap().cycle, 1);

        store.publish(Arc::new(second));
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().as_ref().unwrap().cycle, 2);
    }
}
