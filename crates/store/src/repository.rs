//! Generic repository: a stateless façade over one session's collection.

use std::marker::PhantomData;
use std::sync::Arc;

use futures::stream::{self, BoxStream, StreamExt};

use repokit_core::{Entity, EntityId};

use crate::aggregate::Numeric;
use crate::error::{StoreError, StoreResult};
use crate::filter::Filter;
use crate::session::Session;

/// Generic repository over one entity collection.
///
/// Holds a shared session (not owned — one session per logical unit of
/// work, lifetime managed by the surrounding application) and forwards
/// every operation to it. Compose concrete repositories around this type
/// and expose only the operations they choose.
///
/// Query operations are read-only and take an optional predicate via
/// [`Filter`]. Mutations stage changes that take effect only at
/// [`save_changes`](Repository::save_changes). Every query and aggregate is
/// available in a blocking and a non-blocking form with identical
/// semantics; predicates are applied client-side, so the two forms always
/// agree regardless of backend.
pub struct Repository<E, S> {
    session: Arc<S>,
    _entity: PhantomData<fn() -> E>,
}

impl<E, S> Clone for Repository<E, S> {
    fn clone(&self) -> Self {
        Self {
            session: self.session.clone(),
            _entity: PhantomData,
        }
    }
}

impl<E, S> Repository<E, S>
where
    E: Entity + Clone + Send + Sync + 'static,
    S: Session<E>,
{
    pub fn new(session: Arc<S>) -> Self {
        Self {
            session,
            _entity: PhantomData,
        }
    }

    /// The underlying session.
    pub fn session(&self) -> &S {
        &self.session
    }

    // ---- mutation (staging only; no I/O until save_changes) ----

    pub fn add(&self, entity: E) {
        self.session.add(entity);
    }

    pub fn add_many(&self, entities: Vec<E>) {
        self.session.add_many(entities);
    }

    pub fn update(&self, entity: E) {
        self.session.update(entity);
    }

    pub fn update_many(&self, entities: Vec<E>) {
        self.session.update_many(entities);
    }

    pub fn remove(&self, entity: &E) {
        self.session.remove(entity);
    }

    pub fn remove_many(&self, entities: &[E]) {
        self.session.remove_many(entities);
    }

    // ---- commit ----

    /// Persist all staged changes in the current unit of work.
    ///
    /// Returns the number of changes applied. Failures propagate unchanged
    /// from the session; no retry, no rollback beyond the session's own.
    pub fn save_changes(&self) -> StoreResult<usize> {
        let applied = self.session.commit()?;
        tracing::debug!(applied, "unit of work committed");
        Ok(applied)
    }

    pub async fn save_changes_async(&self) -> StoreResult<usize> {
        let applied = self.session.commit_async().await?;
        tracing::debug!(applied, "unit of work committed");
        Ok(applied)
    }

    // ---- point lookup ----

    /// Retrieve a single entity by identifier. Absent is `None`.
    pub fn get(&self, id: EntityId) -> StoreResult<Option<E>> {
        self.session.find(id)
    }

    pub async fn get_async(&self, id: EntityId) -> StoreResult<Option<E>> {
        self.session.find_async(id).await
    }

    pub fn exists(&self, id: EntityId) -> StoreResult<bool> {
        Ok(self.get(id)?.is_some())
    }

    pub async fn exists_async(&self, id: EntityId) -> StoreResult<bool> {
        Ok(self.get_async(id).await?.is_some())
    }

    // ---- filtered retrieval ----

    /// Lazily-evaluated filtered retrieval.
    pub fn query<'a>(
        &self,
        filter: &'a Filter<E>,
    ) -> StoreResult<impl Iterator<Item = E> + 'a> {
        let rows = self.session.scan()?;
        Ok(rows.into_iter().filter(move |e| filter.matches(e)))
    }

    /// Filtered retrieval as an async stream.
    pub async fn stream<'a>(&self, filter: &'a Filter<E>) -> StoreResult<BoxStream<'a, E>> {
        let rows = self.session.scan_async().await?;
        Ok(stream::iter(rows)
            .filter(move |e| std::future::ready(filter.matches(e)))
            .boxed())
    }

    fn matched(&self, filter: &Filter<E>) -> StoreResult<Vec<E>> {
        let mut rows = self.session.scan()?;
        rows.retain(|e| filter.matches(e));
        Ok(rows)
    }

    async fn matched_async(&self, filter: &Filter<E>) -> StoreResult<Vec<E>> {
        let mut rows = self.session.scan_async().await?;
        rows.retain(|e| filter.matches(e));
        Ok(rows)
    }

    // ---- counting ----

    pub fn count(&self, filter: &Filter<E>) -> StoreResult<usize> {
        Ok(self.matched(filter)?.len())
    }

    pub async fn count_async(&self, filter: &Filter<E>) -> StoreResult<usize> {
        Ok(self.matched_async(filter).await?.len())
    }

    pub fn long_count(&self, filter: &Filter<E>) -> StoreResult<u64> {
        Ok(self.count(filter)? as u64)
    }

    pub async fn long_count_async(&self, filter: &Filter<E>) -> StoreResult<u64> {
        Ok(self.count_async(filter).await? as u64)
    }

    // ---- element selection ----
    //
    // "first"/"last" follow the session's default scan order; this layer
    // adds no ordering of its own.

    pub fn first(&self, filter: &Filter<E>) -> StoreResult<E> {
        self.first_or_default(filter)?.ok_or(StoreError::NoElements)
    }

    pub async fn first_async(&self, filter: &Filter<E>) -> StoreResult<E> {
        self.first_or_default_async(filter)
            .await?
            .ok_or(StoreError::NoElements)
    }

    pub fn first_or_default(&self, filter: &Filter<E>) -> StoreResult<Option<E>> {
        Ok(self.matched(filter)?.into_iter().next())
    }

    pub async fn first_or_default_async(&self, filter: &Filter<E>) -> StoreResult<Option<E>> {
        Ok(self.matched_async(filter).await?.into_iter().next())
    }

    pub fn last(&self, filter: &Filter<E>) -> StoreResult<E> {
        self.last_or_default(filter)?.ok_or(StoreError::NoElements)
    }

    pub async fn last_async(&self, filter: &Filter<E>) -> StoreResult<E> {
        self.last_or_default_async(filter)
            .await?
            .ok_or(StoreError::NoElements)
    }

    pub fn last_or_default(&self, filter: &Filter<E>) -> StoreResult<Option<E>> {
        Ok(self.matched(filter)?.pop())
    }

    pub async fn last_or_default_async(&self, filter: &Filter<E>) -> StoreResult<Option<E>> {
        Ok(self.matched_async(filter).await?.pop())
    }

    /// Exactly-one selection: fails unless the matched set has one element.
    pub fn single(&self, filter: &Filter<E>) -> StoreResult<E> {
        Self::exactly_one(self.matched(filter)?)
    }

    pub async fn single_async(&self, filter: &Filter<E>) -> StoreResult<E> {
        Self::exactly_one(self.matched_async(filter).await?)
    }

    /// `None` for zero matches, the element for one, an error for more.
    pub fn single_or_default(&self, filter: &Filter<E>) -> StoreResult<Option<E>> {
        Self::at_most_one(self.matched(filter)?)
    }

    pub async fn single_or_default_async(&self, filter: &Filter<E>) -> StoreResult<Option<E>> {
        Self::at_most_one(self.matched_async(filter).await?)
    }

    fn exactly_one(mut rows: Vec<E>) -> StoreResult<E> {
        if rows.len() == 1 {
            return Ok(rows.remove(0));
        }
        Err(StoreError::Cardinality { found: rows.len() })
    }

    fn at_most_one(mut rows: Vec<E>) -> StoreResult<Option<E>> {
        match rows.len() {
            0 => Ok(None),
            1 => Ok(rows.pop()),
            found => Err(StoreError::Cardinality { found }),
        }
    }

    // ---- ordered aggregates ----

    pub fn min<K, F>(&self, filter: &Filter<E>, key: F) -> StoreResult<Option<K>>
    where
        K: Ord,
        F: Fn(&E) -> K,
    {
        Ok(self.matched(filter)?.iter().map(key).min())
    }

    pub async fn min_async<K, F>(&self, filter: &Filter<E>, key: F) -> StoreResult<Option<K>>
    where
        K: Ord,
        F: Fn(&E) -> K,
    {
        Ok(self.matched_async(filter).await?.iter().map(key).min())
    }

    pub fn max<K, F>(&self, filter: &Filter<E>, key: F) -> StoreResult<Option<K>>
    where
        K: Ord,
        F: Fn(&E) -> K,
    {
        Ok(self.matched(filter)?.iter().map(key).max())
    }

    pub async fn max_async<K, F>(&self, filter: &Filter<E>, key: F) -> StoreResult<Option<K>>
    where
        K: Ord,
        F: Fn(&E) -> K,
    {
        Ok(self.matched_async(filter).await?.iter().map(key).max())
    }

    // ---- numeric aggregates ----

    /// Sum of a numeric projection. Empty matched set sums to zero.
    pub fn sum<N, F>(&self, filter: &Filter<E>, project: F) -> StoreResult<N>
    where
        N: Numeric,
        F: Fn(&E) -> N,
    {
        Ok(Self::fold_sum(&self.matched(filter)?, project))
    }

    pub async fn sum_async<N, F>(&self, filter: &Filter<E>, project: F) -> StoreResult<N>
    where
        N: Numeric,
        F: Fn(&E) -> N,
    {
        Ok(Self::fold_sum(&self.matched_async(filter).await?, project))
    }

    /// Average of a numeric projection. Fails on an empty matched set.
    pub fn average<N, F>(&self, filter: &Filter<E>, project: F) -> StoreResult<N::Avg>
    where
        N: Numeric,
        F: Fn(&E) -> N,
    {
        Self::fold_average(&self.matched(filter)?, project)
    }

    pub async fn average_async<N, F>(&self, filter: &Filter<E>, project: F) -> StoreResult<N::Avg>
    where
        N: Numeric,
        F: Fn(&E) -> N,
    {
        Self::fold_average(&self.matched_async(filter).await?, project)
    }

    fn fold_sum<N, F>(rows: &[E], project: F) -> N
    where
        N: Numeric,
        F: Fn(&E) -> N,
    {
        rows.iter().fold(N::zero(), |acc, e| acc.add(project(e)))
    }

    fn fold_average<N, F>(rows: &[E], project: F) -> StoreResult<N::Avg>
    where
        N: Numeric,
        F: Fn(&E) -> N,
    {
        if rows.is_empty() {
            return Err(StoreError::NoElements);
        }
        let sum = Self::fold_sum(rows, project);
        Ok(N::average(sum, rows.len() as u64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemorySession;

    #[derive(Debug, Clone, PartialEq)]
    struct Part {
        id: EntityId,
        bin: String,
        quantity: i64,
    }

    impl Part {
        fn new(bin: &str, quantity: i64) -> Self {
            Self {
                id: EntityId::new(),
                bin: bin.to_string(),
                quantity,
            }
        }
    }

    impl Entity for Part {
        fn id(&self) -> EntityId {
            self.id
        }
    }

    fn seeded_repo(parts: Vec<Part>) -> Repository<Part, InMemorySession<Part>> {
        let repo = Repository::new(Arc::new(InMemorySession::new()));
        repo.add_many(parts);
        repo.save_changes().unwrap();
        repo
    }

    #[test]
    fn single_semantics_depend_on_matched_set_size() {
        let repo = seeded_repo(vec![Part::new("a", 1), Part::new("b", 2), Part::new("b", 3)]);

        let none = Filter::matching(|p: &Part| p.bin == "z");
        let one = Filter::matching(|p: &Part| p.bin == "a");
        let many = Filter::matching(|p: &Part| p.bin == "b");

        assert!(matches!(
            repo.single(&none),
            Err(StoreError::Cardinality { found: 0 })
        ));
        assert_eq!(repo.single(&one).unwrap().bin, "a");
        assert!(matches!(
            repo.single(&many),
            Err(StoreError::Cardinality { found: 2 })
        ));

        assert!(repo.single_or_default(&none).unwrap().is_none());
        assert!(repo.single_or_default(&one).unwrap().is_some());
        assert!(matches!(
            repo.single_or_default(&many),
            Err(StoreError::Cardinality { found: 2 })
        ));
    }

    #[test]
    fn first_and_last_fail_on_empty_match_only_in_non_default_form() {
        let repo = seeded_repo(vec![]);

        assert!(matches!(repo.first(&Filter::all()), Err(StoreError::NoElements)));
        assert!(matches!(repo.last(&Filter::all()), Err(StoreError::NoElements)));
        assert!(repo.first_or_default(&Filter::all()).unwrap().is_none());
        assert!(repo.last_or_default(&Filter::all()).unwrap().is_none());
    }

    #[test]
    fn sum_of_empty_match_is_zero_and_average_fails() {
        let repo = seeded_repo(vec![Part::new("a", 5)]);
        let none = Filter::matching(|p: &Part| p.bin == "z");

        assert_eq!(repo.sum(&none, |p| p.quantity).unwrap(), 0i64);
        assert!(matches!(
            repo.average(&none, |p| p.quantity),
            Err(StoreError::NoElements)
        ));
    }

    #[test]
    fn sum_and_average_over_matching_rows() {
        let repo = seeded_repo(vec![Part::new("a", 2), Part::new("a", 4), Part::new("b", 100)]);
        let bin_a = Filter::matching(|p: &Part| p.bin == "a");

        assert_eq!(repo.sum(&bin_a, |p| p.quantity).unwrap(), 6i64);
        assert_eq!(repo.average(&bin_a, |p| p.quantity).unwrap(), 3.0);
    }

    #[test]
    fn min_and_max_are_absent_on_empty_match() {
        let repo = seeded_repo(vec![Part::new("a", 2), Part::new("a", 9)]);

        assert_eq!(repo.min(&Filter::all(), |p| p.quantity).unwrap(), Some(2));
        assert_eq!(repo.max(&Filter::all(), |p| p.quantity).unwrap(), Some(9));

        let none = Filter::matching(|p: &Part| p.bin == "z");
        assert_eq!(repo.min(&none, |p| p.quantity).unwrap(), None);
    }

    #[test]
    fn query_is_lazy_over_the_scanned_rows() {
        let repo = seeded_repo(vec![Part::new("a", 1), Part::new("b", 2)]);
        let bin_b = Filter::matching(|p: &Part| p.bin == "b");

        let mut it = repo.query(&bin_b).unwrap();
        assert_eq!(it.next().map(|p| p.bin), Some("b".to_string()));
        assert!(it.next().is_none());
    }
}
