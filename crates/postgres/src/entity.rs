//! Row-mapping contract for Postgres-persisted entities.

use sqlx::postgres::{PgArguments, PgRow};
use sqlx::query::Query;
use sqlx::Postgres;

use repokit_core::Entity;

/// Table metadata and value binding for an entity persisted in Postgres.
///
/// Decoding uses the entity's `FromRow`; encoding goes through [`bind`],
/// which must bind one value per column, in [`columns`] order.
///
/// # Contract
///
/// - `columns()[0]` is the identifier column, stored as `uuid`.
/// - `bind` binds owned values (clone cheap fields; the query outlives the
///   borrow of `self`).
///
/// [`bind`]: PgEntity::bind
/// [`columns`]: PgEntity::columns
pub trait PgEntity:
    Entity + Clone + Send + Sync + Unpin + for<'r> sqlx::FromRow<'r, PgRow> + 'static
{
    /// Table name.
    fn table() -> &'static str;

    /// Column names; the identifier column comes first.
    fn columns() -> &'static [&'static str];

    /// Bind this entity's values in `columns()` order.
    fn bind<'q>(
        &self,
        query: Query<'q, Postgres, PgArguments>,
    ) -> Query<'q, Postgres, PgArguments>;
}
