//! Optional predicate over entity attributes.

/// Predicate for filtered retrieval: either match-all or a closure.
///
/// Query operations take a `&Filter<E>`; `Filter::all()` yields the full
/// collection, `Filter::matching(..)` the satisfying subset.
pub struct Filter<E> {
    predicate: Option<Box<dyn Fn(&E) -> bool + Send + Sync>>,
}

impl<E> Filter<E> {
    /// Match every entity.
    pub fn all() -> Self {
        Self { predicate: None }
    }

    /// Match entities satisfying the closure.
    pub fn matching(predicate: impl Fn(&E) -> bool + Send + Sync + 'static) -> Self {
        Self {
            predicate: Some(Box::new(predicate)),
        }
    }

    pub fn matches(&self, entity: &E) -> bool {
        match &self.predicate {
            None => true,
            Some(p) => p(entity),
        }
    }
}

impl<E> Default for Filter<E> {
    fn default() -> Self {
        Self::all()
    }
}

impl<E> core::fmt::Debug for Filter<E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self.predicate {
            None => f.write_str("Filter::All"),
            Some(_) => f.write_str("Filter::Matching"),
        }
    }
}
