//! In-memory session implementation.

use std::collections::BTreeMap;
use std::sync::RwLock;

use async_trait::async_trait;

use repokit_core::{Entity, EntityId};

use crate::error::{StoreError, StoreResult};
use crate::session::{Change, Session};

struct Inner<E> {
    /// Committed rows keyed by identifier. With time-ordered identifiers,
    /// key order approximates insertion order.
    committed: BTreeMap<EntityId, E>,
    pending: Vec<Change<E>>,
}

/// In-memory unit-of-work session.
///
/// Intended for tests/dev. Not optimized for performance. The default scan
/// order is identifier order.
pub struct InMemorySession<E> {
    inner: RwLock<Inner<E>>,
}

impl<E> InMemorySession<E> {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner {
                committed: BTreeMap::new(),
                pending: Vec::new(),
            }),
        }
    }

    /// Number of changes staged and not yet committed.
    pub fn pending_len(&self) -> usize {
        self.inner.read().map(|i| i.pending.len()).unwrap_or(0)
    }
}

impl<E> Default for InMemorySession<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> InMemorySession<E>
where
    E: Entity + Clone,
{
    fn stage(&self, change: Change<E>) {
        if let Ok(mut inner) = self.inner.write() {
            inner.pending.push(change);
        }
    }
}

#[async_trait]
impl<E> Session<E> for InMemorySession<E>
where
    E: Entity + Clone + Send + Sync + 'static,
{
    fn add(&self, entity: E) {
        self.stage(Change::Added(entity));
    }

    fn add_many(&self, entities: Vec<E>) {
        if let Ok(mut inner) = self.inner.write() {
            inner.pending.extend(entities.into_iter().map(Change::Added));
        }
    }

    fn update(&self, entity: E) {
        self.stage(Change::Modified(entity));
    }

    fn update_many(&self, entities: Vec<E>) {
        if let Ok(mut inner) = self.inner.write() {
            inner
                .pending
                .extend(entities.into_iter().map(Change::Modified));
        }
    }

    fn remove(&self, entity: &E) {
        self.stage(Change::Removed(entity.id()));
    }

    fn remove_many(&self, entities: &[E]) {
        if let Ok(mut inner) = self.inner.write() {
            inner
                .pending
                .extend(entities.iter().map(|e| Change::Removed(e.id())));
        }
    }

    fn find(&self, id: EntityId) -> StoreResult<Option<E>> {
        let inner = self
            .inner
            .read()
            .map_err(|_| StoreError::backend("lock poisoned"))?;

        // Identity-map behavior: the most recently staged insertion for this
        // identifier wins over the committed row.
        let staged = inner.pending.iter().rev().find_map(|c| match c {
            Change::Added(e) if e.id() == id => Some(e.clone()),
            _ => None,
        });
        if staged.is_some() {
            return Ok(staged);
        }

        Ok(inner.committed.get(&id).cloned())
    }

    async fn find_async(&self, id: EntityId) -> StoreResult<Option<E>> {
        self.find(id)
    }

    fn scan(&self) -> StoreResult<Vec<E>> {
        let inner = self
            .inner
            .read()
            .map_err(|_| StoreError::backend("lock poisoned"))?;
        Ok(inner.committed.values().cloned().collect())
    }

    async fn scan_async(&self) -> StoreResult<Vec<E>> {
        self.scan()
    }

    fn commit(&self) -> StoreResult<usize> {
        let mut inner = self
            .inner
            .write()
            .map_err(|_| StoreError::backend("lock poisoned"))?;

        // Validate the whole batch against a scratch copy of the key set, so
        // a failing commit leaves committed state (and the staged list) intact.
        let mut keys: std::collections::BTreeSet<EntityId> =
            inner.committed.keys().copied().collect();
        for change in &inner.pending {
            match change {
                Change::Added(e) => {
                    if !keys.insert(e.id()) {
                        return Err(StoreError::commit(format!(
                            "duplicate identifier on insert: {}",
                            e.id()
                        )));
                    }
                }
                Change::Modified(e) => {
                    if !keys.contains(&e.id()) {
                        return Err(StoreError::commit(format!(
                            "update of missing row: {}",
                            e.id()
                        )));
                    }
                }
                Change::Removed(id) => {
                    if !keys.remove(id) {
                        return Err(StoreError::commit(format!(
                            "delete of missing row: {id}"
                        )));
                    }
                }
            }
        }

        let pending = std::mem::take(&mut inner.pending);
        let applied = pending.len();
        for change in pending {
            match change {
                Change::Added(e) | Change::Modified(e) => {
                    inner.committed.insert(e.id(), e);
                }
                Change::Removed(id) => {
                    inner.committed.remove(&id);
                }
            }
        }

        Ok(applied)
    }

    async fn commit_async(&self) -> StoreResult<usize> {
        self.commit()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Row {
        id: EntityId,
        label: String,
    }

    impl Row {
        fn new(label: &str) -> Self {
            Self {
                id: EntityId::new(),
                label: label.to_string(),
            }
        }
    }

    impl Entity for Row {
        fn id(&self) -> EntityId {
            self.id
        }
    }

    #[test]
    fn staged_changes_are_invisible_to_scans_until_commit() {
        let session = InMemorySession::new();
        session.add(Row::new("a"));

        assert!(session.scan().unwrap().is_empty());
        assert_eq!(session.pending_len(), 1);

        session.commit().unwrap();
        assert_eq!(session.scan().unwrap().len(), 1);
        assert_eq!(session.pending_len(), 0);
    }

    #[test]
    fn find_sees_staged_insertions_before_commit() {
        let session = InMemorySession::new();
        let row = Row::new("a");
        let id = row.id();
        session.add(row.clone());

        assert_eq!(session.find(id).unwrap(), Some(row));
    }

    #[test]
    fn failed_commit_retains_staged_changes_and_committed_state() {
        let session = InMemorySession::new();
        let row = Row::new("a");
        session.add(row.clone());
        session.commit().unwrap();

        // Second insert of the same identifier must fail the whole batch.
        let fresh = Row::new("b");
        session.add(fresh);
        session.add(row.clone());
        let err = session.commit().unwrap_err();
        assert!(matches!(err, StoreError::Commit(_)));

        assert_eq!(session.pending_len(), 2);
        assert_eq!(session.scan().unwrap(), vec![row]);
    }

    #[test]
    fn update_of_missing_row_fails_commit() {
        let session = InMemorySession::new();
        session.update(Row::new("ghost"));
        assert!(matches!(
            session.commit(),
            Err(StoreError::Commit(_))
        ));
    }

    #[test]
    fn scan_yields_identifier_order() {
        let session = InMemorySession::new();
        let rows: Vec<Row> = (0..8).map(|i| Row::new(&format!("r{i}"))).collect();
        session.add_many(rows.clone());
        session.commit().unwrap();

        let mut expected = rows;
        expected.sort_by_key(|r| r.id());
        assert_eq!(session.scan().unwrap(), expected);
    }
}
