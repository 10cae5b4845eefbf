//! Unit-of-work session boundary.
//!
//! A session tracks staged changes for one logical transaction scope and
//! mediates reads against committed storage, without making any storage
//! assumptions. Implementations exist in-memory (tests/dev) and over
//! Postgres (`repokit-postgres`).

use std::sync::Arc;

use async_trait::async_trait;

use repokit_core::{Entity, EntityId};

use crate::error::StoreResult;

/// A staged change awaiting commit.
#[derive(Debug, Clone)]
pub enum Change<E> {
    /// Insert a new row at commit.
    Added(E),
    /// Overwrite an existing row at commit.
    Modified(E),
    /// Delete the row with this identifier at commit.
    Removed(EntityId),
}

/// Persistence session: staged mutations plus reads over committed rows.
///
/// ## Unit of work
///
/// One session corresponds to one logical transaction scope, typically one
/// request or one task. Staging calls (`add`, `update`, `remove` and their
/// batch forms) touch no storage; `commit` applies every staged change
/// atomically, in staging order, and clears the list on success. On failure
/// the staged list is retained and committed state is untouched.
///
/// ## Read semantics
///
/// - `find` returns the committed row for an identifier, or an entity
///   staged for insertion in this session (identity-map behavior). Absent
///   is `None`, never an error.
/// - `scan` returns committed rows only, in the backend's default order.
///   This layer adds no ordering; treat scans as unordered unless the
///   backend documents otherwise.
///
/// ## Concurrency
///
/// A session is not meant to be driven by concurrent logical operations:
/// the caller sequences reads and write-staging against one session. The
/// async forms suspend the calling task during I/O and propagate
/// cancellation to the pending operation where the backend supports it.
/// There is no retry or backoff in this layer.
#[async_trait]
pub trait Session<E>: Send + Sync
where
    E: Entity + Clone + Send + Sync + 'static,
{
    /// Stage an insertion.
    fn add(&self, entity: E);

    /// Stage a batch of insertions.
    fn add_many(&self, entities: Vec<E>);

    /// Stage an overwrite of an existing row.
    fn update(&self, entity: E);

    /// Stage a batch of overwrites.
    fn update_many(&self, entities: Vec<E>);

    /// Stage a deletion, keyed by the entity's identifier.
    fn remove(&self, entity: &E);

    /// Stage a batch of deletions.
    fn remove_many(&self, entities: &[E]);

    /// Point lookup by identifier.
    fn find(&self, id: EntityId) -> StoreResult<Option<E>>;

    /// Point lookup by identifier (non-blocking form).
    async fn find_async(&self, id: EntityId) -> StoreResult<Option<E>>;

    /// Full scan over committed rows.
    fn scan(&self) -> StoreResult<Vec<E>>;

    /// Full scan over committed rows (non-blocking form).
    async fn scan_async(&self) -> StoreResult<Vec<E>>;

    /// Apply all staged changes atomically. Returns the number applied.
    fn commit(&self) -> StoreResult<usize>;

    /// Apply all staged changes atomically (non-blocking form).
    async fn commit_async(&self) -> StoreResult<usize>;
}

#[async_trait]
impl<E, S> Session<E> for Arc<S>
where
    E: Entity + Clone + Send + Sync + 'static,
    S: Session<E> + ?Sized,
{
    fn add(&self, entity: E) {
        (**self).add(entity)
    }

    fn add_many(&self, entities: Vec<E>) {
        (**self).add_many(entities)
    }

    fn update(&self, entity: E) {
        (**self).update(entity)
    }

    fn update_many(&self, entities: Vec<E>) {
        (**self).update_many(entities)
    }

    fn remove(&self, entity: &E) {
        (**self).remove(entity)
    }

    fn remove_many(&self, entities: &[E]) {
        (**self).remove_many(entities)
    }

    fn find(&self, id: EntityId) -> StoreResult<Option<E>> {
        (**self).find(id)
    }

    async fn find_async(&self, id: EntityId) -> StoreResult<Option<E>> {
        (**self).find_async(id).await
    }

    fn scan(&self) -> StoreResult<Vec<E>> {
        (**self).scan()
    }

    async fn scan_async(&self) -> StoreResult<Vec<E>> {
        (**self).scan_async().await
    }

    fn commit(&self) -> StoreResult<usize> {
        (**self).commit()
    }

    async fn commit_async(&self) -> StoreResult<usize> {
        (**self).commit_async().await
    }
}
