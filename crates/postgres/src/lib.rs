//! `repokit-postgres` — Postgres-backed session implementation.
//!
//! Maps entities to rows through the [`PgEntity`] metadata trait and applies
//! staged changes in one sqlx transaction per commit.

pub mod entity;
pub mod session;
pub(crate) mod sql;

pub use entity::PgEntity;
pub use session::PgSession;
