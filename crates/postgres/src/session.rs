//! Postgres unit-of-work session.

use std::sync::RwLock;

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use repokit_core::{Entity, EntityId};
use repokit_store::{Change, Session, StoreError, StoreResult};

use crate::entity::PgEntity;
use crate::sql;

/// Postgres-backed session over a sqlx connection pool.
///
/// Staged changes are held locally and applied in one transaction per
/// `commit`; a failing statement rolls the transaction back and retains the
/// staged list. Zero rows affected on an update or delete fails the commit
/// (the row went missing under us).
///
/// The blocking forms run the async ones on the current tokio runtime
/// handle; call them from outside the runtime's worker threads (e.g. via
/// `spawn_blocking`), never from an async task.
pub struct PgSession<E> {
    pool: PgPool,
    pending: RwLock<Vec<Change<E>>>,
}

impl<E> PgSession<E> {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            pending: RwLock::new(Vec::new()),
        }
    }

    /// The underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Number of changes staged and not yet committed.
    pub fn pending_len(&self) -> usize {
        self.pending.read().map(|p| p.len()).unwrap_or(0)
    }
}

impl<E> PgSession<E>
where
    E: PgEntity,
{
    fn stage(&self, change: Change<E>) {
        if let Ok(mut pending) = self.pending.write() {
            pending.push(change);
        }
    }

    fn block_on<F, T>(&self, fut: F) -> StoreResult<T>
    where
        F: std::future::Future<Output = StoreResult<T>>,
    {
        let handle = tokio::runtime::Handle::try_current()
            .map_err(|_| StoreError::backend("blocking access requires a tokio runtime"))?;
        handle.block_on(fut)
    }
}

#[async_trait]
impl<E> Session<E> for PgSession<E>
where
    E: PgEntity,
{
    fn add(&self, entity: E) {
        self.stage(Change::Added(entity));
    }

    fn add_many(&self, entities: Vec<E>) {
        if let Ok(mut pending) = self.pending.write() {
            pending.extend(entities.into_iter().map(Change::Added));
        }
    }

    fn update(&self, entity: E) {
        self.stage(Change::Modified(entity));
    }

    fn update_many(&self, entities: Vec<E>) {
        if let Ok(mut pending) = self.pending.write() {
            pending.extend(entities.into_iter().map(Change::Modified));
        }
    }

    fn remove(&self, entity: &E) {
        self.stage(Change::Removed(entity.id()));
    }

    fn remove_many(&self, entities: &[E]) {
        if let Ok(mut pending) = self.pending.write() {
            pending.extend(entities.iter().map(|e| Change::Removed(e.id())));
        }
    }

    fn find(&self, id: EntityId) -> StoreResult<Option<E>> {
        self.block_on(self.find_async(id))
    }

    async fn find_async(&self, id: EntityId) -> StoreResult<Option<E>> {
        // Identity-map behavior: a staged insertion for this identifier wins.
        {
            let pending = self
                .pending
                .read()
                .map_err(|_| StoreError::backend("lock poisoned"))?;
            let staged = pending.iter().rev().find_map(|c| match c {
                Change::Added(e) if e.id() == id => Some(e.clone()),
                _ => None,
            });
            if staged.is_some() {
                return Ok(staged);
            }
        }

        let statement = sql::find_sql::<E>();
        sqlx::query_as::<_, E>(&statement)
            .bind(Uuid::from(id))
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StoreError::backend(e.to_string()))
    }

    fn scan(&self) -> StoreResult<Vec<E>> {
        self.block_on(self.scan_async())
    }

    async fn scan_async(&self) -> StoreResult<Vec<E>> {
        let statement = sql::select_sql::<E>();
        sqlx::query_as::<_, E>(&statement)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StoreError::backend(e.to_string()))
    }

    fn commit(&self) -> StoreResult<usize> {
        self.block_on(self.commit_async())
    }

    async fn commit_async(&self) -> StoreResult<usize> {
        let staged: Vec<Change<E>> = {
            let pending = self
                .pending
                .read()
                .map_err(|_| StoreError::backend("lock poisoned"))?;
            pending.clone()
        };
        if staged.is_empty() {
            return Ok(0);
        }

        let insert = sql::insert_sql::<E>();
        let update = sql::update_sql::<E>();
        let delete = sql::delete_sql::<E>();

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StoreError::commit(e.to_string()))?;

        for change in &staged {
            match change {
                Change::Added(e) => {
                    e.bind(sqlx::query(&insert))
                        .execute(&mut *tx)
                        .await
                        .map_err(|e| StoreError::commit(e.to_string()))?;
                }
                Change::Modified(e) => {
                    let result = e
                        .bind(sqlx::query(&update))
                        .execute(&mut *tx)
                        .await
                        .map_err(|e| StoreError::commit(e.to_string()))?;
                    if result.rows_affected() == 0 {
                        return Err(StoreError::commit(format!(
                            "update of missing row: {}",
                            e.id()
                        )));
                    }
                }
                Change::Removed(id) => {
                    let result = sqlx::query(&delete)
                        .bind(Uuid::from(*id))
                        .execute(&mut *tx)
                        .await
                        .map_err(|e| StoreError::commit(e.to_string()))?;
                    if result.rows_affected() == 0 {
                        return Err(StoreError::commit(format!("delete of missing row: {id}")));
                    }
                }
            }
        }

        tx.commit()
            .await
            .map_err(|e| StoreError::commit(e.to_string()))?;

        let applied = staged.len();
        if let Ok(mut pending) = self.pending.write() {
            pending.clear();
        }
        tracing::debug!(table = E::table(), applied, "transaction committed");
        Ok(applied)
    }
}
