use std::collections::{BTreeMap, HashMap};
use std::ops::Bound;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use keyset_core::TenantId;
use keyset_pagination::{Direction, KeysetQuery};

use super::{KeysetRepository, RepositoryError};

type KeyFn<V, K> = Box<dyn Fn(&V) -> K + Send + Sync>;
type Records<K, V> = HashMap<TenantId, BTreeMap<K, V>>;

/// In-memory, tenant-isolated ordered store for tests/dev.
///
/// Records are indexed by the key `key_of` extracts, so that key must be
/// unique per tenant: upserting a record with an existing key replaces it.
pub struct InMemoryKeysetStore<K, V> {
    inner: RwLock<Records<K, V>>,
    key_of: KeyFn<V, K>,
}

impl<K, V> InMemoryKeysetStore<K, V>
where
    K: Ord + Clone,
    V: Clone,
{
    pub fn new(key_of: impl Fn(&V) -> K + Send + Sync + 'static) -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
            key_of: Box::new(key_of),
        }
    }

    /// Insert or replace a record. Returns the record previously stored
    /// under the same key.
    pub fn upsert(&self, tenant_id: TenantId, value: V) -> Result<Option<V>, RepositoryError> {
        let key = (self.key_of)(&value);
        let mut map = self.write()?;
        Ok(map.entry(tenant_id).or_default().insert(key, value))
    }

    pub fn get(&self, tenant_id: TenantId, key: &K) -> Result<Option<V>, RepositoryError> {
        let map = self.read()?;
        Ok(map.get(&tenant_id).and_then(|records| records.get(key)).cloned())
    }

    pub fn remove(&self, tenant_id: TenantId, key: &K) -> Result<Option<V>, RepositoryError> {
        let mut map = self.write()?;
        Ok(map.get_mut(&tenant_id).and_then(|records| records.remove(key)))
    }

    pub fn len(&self, tenant_id: TenantId) -> Result<usize, RepositoryError> {
        let map = self.read()?;
        Ok(map.get(&tenant_id).map_or(0, BTreeMap::len))
    }

    pub fn is_empty(&self, tenant_id: TenantId) -> Result<bool, RepositoryError> {
        Ok(self.len(tenant_id)? == 0)
    }

    /// Drop every record of a tenant.
    pub fn clear_tenant(&self, tenant_id: TenantId) -> Result<(), RepositoryError> {
        self.write()?.remove(&tenant_id);
        Ok(())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Records<K, V>>, RepositoryError> {
        self.inner.read().map_err(|_| poisoned())
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Records<K, V>>, RepositoryError> {
        self.inner.write().map_err(|_| poisoned())
    }
}

fn poisoned() -> RepositoryError {
    tracing::error!("in-memory keyset store lock poisoned");
    RepositoryError::Unavailable("in-memory store lock poisoned".to_string())
}

impl<K, V> KeysetRepository<V, K> for InMemoryKeysetStore<K, V>
where
    K: Ord + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    fn fetch(&self, tenant_id: TenantId, query: &KeysetQuery<K>) -> Result<Vec<V>, RepositoryError> {
        let map = self.read()?;

        let Some(records) = map.get(&tenant_id) else {
            return Ok(Vec::new());
        };

        let (lower, upper) = match (&query.anchor, query.direction) {
            (None, _) => (Bound::Unbounded, Bound::Unbounded),
            (Some(anchor), Direction::Forward) => (Bound::Excluded(anchor), Bound::Unbounded),
            (Some(anchor), Direction::Backward) => (Bound::Unbounded, Bound::Excluded(anchor)),
        };
        let range = records.range::<K, _>((lower, upper));

        let batch = match query.direction {
            Direction::Forward => range
                .take(query.fetch_limit)
                .map(|(_, v)| v.clone())
                .collect(),
            Direction::Backward => range
                .rev()
                .take(query.fetch_limit)
                .map(|(_, v)| v.clone())
                .collect(),
        };

        Ok(batch)
    }
}

impl<K, V> core::fmt::Debug for InMemoryKeysetStore<K, V>
where
    K: core::fmt::Debug,
    V: core::fmt::Debug,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("InMemoryKeysetStore")
            .field("inner", &self.inner)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Eq)]
    struct Item {
        seq: i64,
        name: String,
    }

    fn item(seq: i64) -> Item {
        Item {
            seq,
            name: format!("item-{seq}"),
        }
    }

    fn store_with(tenant_id: TenantId, seqs: impl IntoIterator<Item = i64>) -> InMemoryKeysetStore<i64, Item> {
        let store = InMemoryKeysetStore::new(|i: &Item| i.seq);
        for seq in seqs {
            store.upsert(tenant_id, item(seq)).unwrap();
        }
        store
    }

    fn seqs(batch: &[Item]) -> Vec<i64> {
        batch.iter().map(|i| i.seq).collect()
    }

    fn query(direction: Direction, anchor: Option<i64>, fetch_limit: usize) -> KeysetQuery<i64> {
        KeysetQuery {
            direction,
            anchor,
            fetch_limit,
        }
    }

    #[test]
    fn upsert_replaces_by_key() {
        let tenant_id = TenantId::new();
        let store = store_with(tenant_id, [1, 2]);

        let previous = store
            .upsert(
                tenant_id,
                Item {
                    seq: 2,
                    name: "renamed".to_string(),
                },
            )
            .unwrap();

        assert_eq!(previous, Some(item(2)));
        assert_eq!(store.len(tenant_id).unwrap(), 2);
        assert_eq!(
            store.get(tenant_id, &2).unwrap().map(|i| i.name),
            Some("renamed".to_string())
        );
    }

    #[test]
    fn remove_and_clear() {
        let tenant_id = TenantId::new();
        let store = store_with(tenant_id, 1..=3);

        assert_eq!(store.remove(tenant_id, &2).unwrap(), Some(item(2)));
        assert_eq!(store.remove(tenant_id, &2).unwrap(), None);
        assert_eq!(store.len(tenant_id).unwrap(), 2);

        store.clear_tenant(tenant_id).unwrap();
        assert!(store.is_empty(tenant_id).unwrap());
    }

    #[test]
    fn forward_fetch_is_ascending_and_exclusive() {
        let tenant_id = TenantId::new();
        let store = store_with(tenant_id, [5, 1, 4, 2, 3]);

        let batch = store.fetch(tenant_id, &query(Direction::Forward, None, 3)).unwrap();
        assert_eq!(seqs(&batch), vec![1, 2, 3]);

        let batch = store.fetch(tenant_id, &query(Direction::Forward, Some(3), 10)).unwrap();
        assert_eq!(seqs(&batch), vec![4, 5]);
    }

    #[test]
    fn backward_fetch_is_descending_and_exclusive() {
        let tenant_id = TenantId::new();
        let store = store_with(tenant_id, 1..=5);

        let batch = store.fetch(tenant_id, &query(Direction::Backward, None, 2)).unwrap();
        assert_eq!(seqs(&batch), vec![5, 4]);

        let batch = store.fetch(tenant_id, &query(Direction::Backward, Some(3), 10)).unwrap();
        assert_eq!(seqs(&batch), vec![2, 1]);
    }

    #[test]
    fn anchor_need_not_exist() {
        let tenant_id = TenantId::new();
        let store = store_with(tenant_id, [10, 20, 30]);

        let batch = store.fetch(tenant_id, &query(Direction::Forward, Some(15), 10)).unwrap();
        assert_eq!(seqs(&batch), vec![20, 30]);
    }

    #[test]
    fn tenants_are_isolated() {
        let tenant_a = TenantId::new();
        let tenant_b = TenantId::new();
        let store = store_with(tenant_a, 1..=3);

        let batch = store.fetch(tenant_b, &query(Direction::Forward, None, 10)).unwrap();
        assert!(batch.is_empty());
        assert_eq!(store.get(tenant_b, &1).unwrap(), None);
        assert_eq!(store.len(tenant_a).unwrap(), 3);
    }

    #[test]
    fn poisoned_lock_reports_unavailable() {
        let tenant_id = TenantId::new();
        let store = store_with(tenant_id, 1..=3);

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = store.inner.write().unwrap();
            panic!("writer died holding the lock");
        }));
        assert!(result.is_err());

        let unavailable =
            |r: Result<(), RepositoryError>| matches!(r, Err(RepositoryError::Unavailable(_)));
        assert!(unavailable(store.upsert(tenant_id, item(4)).map(drop)));
        assert!(unavailable(store.get(tenant_id, &1).map(drop)));
        assert!(unavailable(store.remove(tenant_id, &1).map(drop)));
        assert!(unavailable(store.len(tenant_id).map(drop)));
        assert!(unavailable(store.clear_tenant(tenant_id)));
        assert!(unavailable(
            store.fetch(tenant_id, &query(Direction::Forward, None, 10)).map(drop)
        ));
    }
}
