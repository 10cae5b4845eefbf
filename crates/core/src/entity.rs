//! Entity trait: identity + continuity across state changes.

use crate::id::EntityId;

/// Entity marker + minimal interface.
///
/// Implementors assign their identifier exactly once, at construction
/// (`EntityId::new()`), and never change it afterwards.
pub trait Entity {
    /// Returns the entity identifier.
    fn id(&self) -> EntityId;
}
