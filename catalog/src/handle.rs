use std::sync::Arc;

use parking_lot::RwLock;

use crate::catalog::Catalog;

/// Shared handle over the current catalog version.
///
/// A reload builds a complete new [`Catalog`] first and then swaps the shared
/// reference in one step, so concurrent readers either see the old version or
/// the new one — never a partially built matrix. Readers hold an `Arc` clone
/// and are unaffected by later swaps.
#[derive(Debug)]
pub struct CatalogHandle {
    inner: RwLock<Arc<Catalog>>,
}

impl CatalogHandle {
    /// Publishes the initial catalog version.
    #[must_use]
    pub fn new(catalog: Catalog) -> Self {
        Self {
            inner: RwLock::new(Arc::new(catalog)),
        }
    }

    /// Returns the current catalog version.
    #[must_use]
    pub fn current(&self) -> Arc<Catalog> {
        Arc::clone(&self.inner.read())
    }

    /// Swaps in a fully built new version, returning the previous one.
    pub fn swap(&self, catalog: Catalog) -> Arc<Catalog> {
        let mut slot = self.inner.write();
        std::mem::replace(&mut *slot, Arc::new(catalog))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{CandidateRecord, CatalogSource, CriterionSpec};
    use indexmap::IndexMap;
    use pawmatch_logic::{FALSE, TRUE};

    fn catalog_with(value: pawmatch_logic::Truth) -> Catalog {
        let source = CatalogSource {
            criteria: vec![CriterionSpec::primitive("calm", "Calm")],
            candidates: vec![CandidateRecord {
                id: "poodle".into(),
                features: [("calm".to_owned(), value)].into_iter().collect::<IndexMap<_, _>>(),
            }],
            feature_ids: vec!["calm".into()],
        };
        Catalog::build(&source).unwrap()
    }

    #[test]
    fn swap_replaces_whole_reference() {
        let handle = CatalogHandle::new(catalog_with(TRUE));
        let before = handle.current();
        assert_eq!(before.value("poodle", "calm"), TRUE);

        let previous = handle.swap(catalog_with(FALSE));
        assert_eq!(previous.value("poodle", "calm"), TRUE);
        assert_eq!(handle.current().value("poodle", "calm"), FALSE);
        // The old Arc stays valid for readers that captured it.
        assert_eq!(before.value("poodle", "calm"), TRUE);
    }
}
