//! `repokit-store` — unit-of-work session boundary and the generic
//! repository façade over it.
//!
//! The [`Session`] trait tracks staged changes for one logical transaction
//! scope; [`Repository`] forwards CRUD, query, and aggregation calls to a
//! shared session. [`InMemorySession`] backs tests and dev setups; a
//! Postgres session lives in `repokit-postgres`.

pub mod aggregate;
pub mod error;
pub mod filter;
pub mod memory;
pub mod repository;
pub mod session;

pub use aggregate::Numeric;
pub use error::{StoreError, StoreResult};
pub use filter::Filter;
pub use memory::InMemorySession;
pub use repository::Repository;
pub use session::{Change, Session};
