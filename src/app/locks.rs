// Collection locks - Serialize media rewrites within one collection

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::trace;

/// One async mutex per collection key.
///
/// Stitching, cutting and deleting touch a segment and its neighbours, so two
/// requests on adjacent segments of the same collection must not interleave.
/// Only covers this process.
#[derive(Default)]
pub struct CollectionLocks {
    locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl CollectionLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `collection_key`
    pub async fn acquire(&self, collection_key: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
            Arc::clone(locks.entry(collection_key.to_string()).or_default())
        };
        trace!("Waiting for collection lock {}", collection_key);
        lock.lock_owned().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_collection_is_exclusive() {
        let locks = Arc::new(CollectionLocks::new());
        let guard = locks.acquire("A").await;

        let contender = {
            let locks = Arc::clone(&locks);
            tokio::spawn(async move {
                let _guard = locks.acquire("A").await;
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!contender.is_finished());
        drop(guard);
        contender.await.unwrap();
    }

    #[tokio::test]
    async fn test_other_collections_do_not_block() {
        let locks = CollectionLocks::new();
        let _a = locks.acquire("A").await;
        let _b = tokio::time::timeout(Duration::from_millis(100), locks.acquire("B"))
            .await
            .unwrap();
    }
}
