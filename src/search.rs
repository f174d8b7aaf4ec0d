//! Name search over the catalog.

use std::sync::Arc;

use crate::catalog::{Area, Catalog};

/// Returns the areas whose name contains `query`, ignoring case, in catalog order.
///
/// An empty query matches every area. Whether suggestions are shown at all is decided by
/// [`SearchState::suggestions_visible`].
pub fn filter(catalog: &Catalog, query: &str) -> Vec<Arc<Area>> {
    let needle = query.to_lowercase();
    catalog
        .iter()
        .filter(|area| area.name.to_lowercase().contains(&needle))
        .cloned()
        .collect()
}

/// The text currently typed into the search box.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SearchState {
    query: String,
}

impl SearchState {
    /// The current query.
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Mutable access for text inputs that edit the query in place.
    pub fn query_mut(&mut self) -> &mut String {
        &mut self.query
    }

    /// Replaces the query.
    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
    }

    /// Clears the query, which hides the suggestions.
    pub fn clear(&mut self) {
        self.query.clear();
    }

    /// All matches for the current query, including the whole catalog for an empty query.
    pub fn matches(&self, catalog: &Catalog) -> Vec<Arc<Area>> {
        filter(catalog, &self.query)
    }

    /// Whether a suggestion list should be shown for `matches`.
    pub fn suggestions_visible(&self, matches: &[Arc<Area>]) -> bool {
        !self.query.is_empty() && !matches.is_empty()
    }

    /// The suggestions to display: the matches when visible, otherwise nothing.
    pub fn suggestions(&self, catalog: &Catalog) -> Vec<Arc<Area>> {
        let matches = self.matches(catalog);
        if self.suggestions_visible(&matches) {
            matches
        } else {
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{AreaId, square};

    fn catalog() -> Catalog {
        Catalog::new(vec![
            square("Stanley Park", 1, 49.30, -123.14),
            square("Hastings Park", 2, 49.28, -123.04),
            square("Sunset Beach", 3, 49.28, -123.14),
            square("Stanley Glen", 4, 49.25, -123.00),
        ])
        .unwrap()
    }

    fn ids(areas: &[Arc<Area>]) -> Vec<u32> {
        areas.iter().map(|a| a.id.0).collect()
    }

    #[test]
    fn filter_is_case_insensitive_substring() {
        let catalog = catalog();
        assert_eq!(ids(&filter(&catalog, "stan")), [1, 4]);
        assert_eq!(ids(&filter(&catalog, "PARK")), [1, 2]);
        assert_eq!(ids(&filter(&catalog, "et b")), [3]);
        assert!(filter(&catalog, "xyz").is_empty());
    }

    #[test]
    fn filter_preserves_catalog_order() {
        let catalog = catalog();
        // Every area contains an "a"; result must be the catalog itself.
        assert_eq!(ids(&filter(&catalog, "a")), [1, 2, 3, 4]);
    }

    #[test]
    fn filter_result_is_subsequence_of_matching_names() {
        let catalog = catalog();
        for query in ["", "s", "St", "park", "Glen", "zzz", "n p"] {
            let result = filter(&catalog, query);
            let expected: Vec<u32> = catalog
                .iter()
                .filter(|a| a.name.to_lowercase().contains(&query.to_lowercase()))
                .map(|a| a.id.0)
                .collect();
            assert_eq!(ids(&result), expected, "query {query:?}");
        }
    }

    #[test]
    fn empty_query_matches_all_but_shows_nothing() {
        let catalog = catalog();
        let search = SearchState::default();

        let matches = search.matches(&catalog);
        assert_eq!(matches.len(), catalog.len());
        assert!(!search.suggestions_visible(&matches));
        assert!(search.suggestions(&catalog).is_empty());
    }

    #[test]
    fn no_matches_shows_nothing() {
        let catalog = catalog();
        let mut search = SearchState::default();
        search.set_query("nothing like this");
        assert!(search.suggestions(&catalog).is_empty());
    }

    #[test]
    fn stan_suggests_stanley_park() {
        let catalog = Catalog::new(vec![
            square("Stanley Park", 1, 49.30, -123.14),
            square("Hastings Park", 2, 49.28, -123.04),
        ])
        .unwrap();
        let mut search = SearchState::default();
        search.set_query("stan");

        let suggestions = search.suggestions(&catalog);
        assert_eq!(suggestions.len(), 1);
        assert_eq!(suggestions[0].id, AreaId(1));

        search.clear();
        assert!(search.suggestions(&catalog).is_empty());
    }
}
