//! The park finder's view state.
//!
//! [`ParkMapState`] owns the catalog, the search query, the viewport and the selection. Every
//! user event maps to one synchronous method; renderers read a [`MapSnapshot`] afterwards.

use std::sync::Arc;

use log::{debug, warn};

use crate::catalog::{Area, AreaId, Catalog};
use crate::config::MapConfig;
use crate::location::{LocateTicket, LocationError};
use crate::notification::Notification;
use crate::projection::Coordinate;
use crate::search::SearchState;
use crate::selection::SelectionState;
use crate::viewport::{Region, RenderSurface, Viewport};

/// An immutable picture of the state after a transition, for rendering.
#[derive(Clone, Debug, PartialEq)]
pub struct MapSnapshot {
    /// The current region.
    pub region: Region,
    /// Whether park names are drawn next to the markers.
    pub names_visible: bool,
    /// The selection and presence.
    pub selection: SelectionState,
    /// The search box content.
    pub query: String,
    /// Suggestions to list under the search box; empty when the list is hidden.
    pub suggestions: Vec<Arc<Area>>,
    /// Where the device was last located.
    pub current_location: Option<Coordinate>,
    /// Label of the check-in button, `None` when it is hidden.
    pub toggle_label: Option<String>,
}

/// All mutable state behind the park map.
pub struct ParkMapState {
    catalog: Arc<Catalog>,
    search: SearchState,
    viewport: Viewport,
    selection: SelectionState,
    current_location: Option<Coordinate>,
    focus_span: f64,
    last_ticket: u64,
}

impl ParkMapState {
    /// Creates the state for `catalog` with the viewport defaults from `config`.
    pub fn new(catalog: Arc<Catalog>, config: &dyn MapConfig) -> Self {
        Self {
            catalog,
            search: SearchState::default(),
            viewport: Viewport::new(
                config.default_region(),
                config.names_visible_threshold(),
                config.focus_animation(),
            ),
            selection: SelectionState::default(),
            current_location: None,
            focus_span: config.focus_span(),
            last_ticket: 0,
        }
    }

    /// The catalog shown on the map.
    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    /// The search state.
    pub fn search(&self) -> &SearchState {
        &self.search
    }

    /// The viewport controller.
    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// The selection and presence.
    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    /// Where the device was last located.
    pub fn current_location(&self) -> Option<Coordinate> {
        self.current_location
    }

    /// Replaces the search query. Only the suggestions change.
    pub fn set_query(&mut self, query: impl Into<String>) {
        self.search.set_query(query);
    }

    /// Mutable access to the query for text widgets.
    pub fn query_mut(&mut self) -> &mut String {
        self.search.query_mut()
    }

    /// The suggestions for the current query, empty when the list should be hidden.
    pub fn suggestions(&self) -> Vec<Arc<Area>> {
        self.search.suggestions(&self.catalog)
    }

    /// Selects `area`, clearing presence, and focuses the viewport on it.
    pub fn select_area(&mut self, area: Arc<Area>) {
        let centroid = area.centroid;
        self.selection.select(area);
        self.viewport.focus_on(centroid, self.focus_span);
    }

    /// Handles a tap on a park marker. Returns `false` for an id that is not in the catalog.
    pub fn tap_marker(&mut self, id: AreaId) -> bool {
        match self.catalog.get(id).cloned() {
            Some(area) => {
                self.select_area(area);
                true
            }
            None => {
                warn!("Tapped unknown area {id}");
                false
            }
        }
    }

    /// Handles a pick from the suggestion list: selects the area and clears the query.
    /// Returns `false` for an id that is not in the catalog.
    pub fn pick_suggestion(&mut self, id: AreaId) -> bool {
        let picked = self.tap_marker(id);
        if picked {
            self.search.clear();
        }
        picked
    }

    /// Checks in at the selected area. A no-op without selection or when already checked in.
    pub fn check_in(&mut self) -> Option<Notification> {
        self.selection.check_in()
    }

    /// Checks out of the selected area. A no-op unless checked in.
    pub fn check_out(&mut self) -> Option<Notification> {
        self.selection.check_out()
    }

    /// The check-in button.
    pub fn toggle_presence(&mut self) -> Option<Notification> {
        self.selection.toggle_presence()
    }

    /// Drops the selection.
    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    /// Swaps in a new catalog. The old selection may refer to an area that no longer exists, so
    /// it is cleared together with the query.
    pub fn reset_catalog(&mut self, catalog: Arc<Catalog>) {
        debug!("Catalog reset, {} areas", catalog.len());
        self.catalog = catalog;
        self.selection.clear();
        self.search.clear();
    }

    /// Accepts the region reported by the renderer once a pan, zoom or animation settles.
    pub fn on_region_change_complete(&mut self, region: Region) {
        self.viewport.set_region(region);
    }

    /// Hands a pending focus animation to `surface`.
    pub fn dispatch_animation(&mut self, surface: &mut dyn RenderSurface) -> bool {
        self.viewport.dispatch(surface)
    }

    /// Registers a new location lookup. Only the outcome of the newest ticket is applied, so a
    /// second tap on the locate button supersedes the first.
    pub fn begin_locate(&mut self) -> LocateTicket {
        self.last_ticket += 1;
        LocateTicket(self.last_ticket)
    }

    /// Applies the outcome of the lookup identified by `ticket`.
    ///
    /// On success the device marker moves and the viewport recenters; the selection is left
    /// alone. Failures change nothing and are returned as a notification. Outcomes of
    /// superseded tickets are dropped.
    pub fn finish_locate(
        &mut self,
        ticket: LocateTicket,
        result: Result<Coordinate, LocationError>,
    ) -> Option<Notification> {
        if ticket.0 != self.last_ticket {
            warn!(
                "Dropping location result of superseded request {} (latest is {})",
                ticket.0, self.last_ticket
            );
            return None;
        }

        match result {
            Ok(position) => {
                self.current_location = Some(position);
                self.viewport.focus_on(position, self.focus_span);
                None
            }
            Err(LocationError::PermissionDenied) => Some(Notification::PermissionDenied),
            Err(LocationError::PositionUnavailable(message)) => {
                Some(Notification::LocationUnavailable { message })
            }
        }
    }

    /// Takes a snapshot for rendering.
    pub fn snapshot(&self) -> MapSnapshot {
        MapSnapshot {
            region: self.viewport.region(),
            names_visible: self.viewport.names_visible(),
            selection: self.selection.clone(),
            query: self.search.query().to_string(),
            suggestions: self.suggestions(),
            current_location: self.current_location,
            toggle_label: self.selection.toggle_label(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::square;
    use crate::config::DynMapConfig;
    use crate::location::{FixedLocationService, locate};
    use std::time::Duration;

    #[derive(Default)]
    struct RecordingSurface {
        commands: Vec<(Region, Duration)>,
    }

    impl RenderSurface for RecordingSurface {
        fn animate_to_region(&mut self, region: Region, duration: Duration) {
            self.commands.push((region, duration));
        }
    }

    fn config() -> DynMapConfig {
        DynMapConfig::new(|tile| format!("{}/{}/{}", tile.z, tile.x, tile.y))
    }

    fn state() -> ParkMapState {
        let catalog = Catalog::new(vec![
            square("Stanley Park", 1, 49.30, -123.14),
            square("Hastings Park", 2, 49.28, -123.04),
        ])
        .unwrap();
        ParkMapState::new(Arc::new(catalog), &config())
    }

    #[test]
    fn starts_on_fallback_without_selection() {
        let state = state();
        let snapshot = state.snapshot();
        assert_eq!(snapshot.region, Region::fallback());
        assert!(!snapshot.names_visible);
        assert_eq!(snapshot.selection, SelectionState::NoSelection);
        assert!(snapshot.suggestions.is_empty());
        assert!(snapshot.toggle_label.is_none());
        assert!(snapshot.current_location.is_none());
    }

    #[test]
    fn picking_stan_focuses_stanley_park() {
        let mut state = state();
        state.set_query("stan");

        let suggestions = state.suggestions();
        assert_eq!(suggestions.len(), 1);
        assert_eq!(suggestions[0].id, AreaId(1));

        assert!(state.pick_suggestion(suggestions[0].id));

        let snapshot = state.snapshot();
        let expected = Region::new(Coordinate::new(49.30, -123.14), 0.005, 0.005).unwrap();
        assert_eq!(snapshot.region, expected);
        assert!(snapshot.names_visible);
        assert_eq!(
            snapshot.selection,
            SelectionState::Selected {
                area: suggestions[0].clone(),
                checked_in: false,
            }
        );
        // The pick clears the query, which hides the list.
        assert_eq!(snapshot.query, "");
        assert!(snapshot.suggestions.is_empty());

        let mut surface = RecordingSurface::default();
        assert!(state.dispatch_animation(&mut surface));
        assert_eq!(surface.commands, vec![(expected, Duration::from_millis(500))]);
    }

    #[test]
    fn typing_does_not_touch_map_or_selection() {
        let mut state = state();
        state.tap_marker(AreaId(2));
        let before = state.snapshot();

        state.set_query("park");
        let after = state.snapshot();
        assert_eq!(after.region, before.region);
        assert_eq!(after.selection, before.selection);
        assert_eq!(after.suggestions.len(), 2);
    }

    #[test]
    fn marker_tap_keeps_query() {
        let mut state = state();
        state.set_query("has");
        assert!(state.tap_marker(AreaId(1)));
        assert_eq!(state.search().query(), "has");
    }

    #[test]
    fn unknown_marker_changes_nothing() {
        let mut state = state();
        assert!(!state.tap_marker(AreaId(99)));
        assert!(!state.pick_suggestion(AreaId(99)));
        assert_eq!(state.selection(), &SelectionState::NoSelection);
        assert!(state.viewport().pending_animation().is_none());
    }

    #[test]
    fn every_selection_clears_presence() {
        let mut state = state();
        for id in [1, 1, 2, 1] {
            state.check_in();
            state.tap_marker(AreaId(id));
            assert!(!state.selection().is_checked_in());
        }
    }

    #[test]
    fn check_out_without_selection_emits_nothing() {
        let mut state = state();
        let before = state.snapshot();
        assert!(state.check_out().is_none());
        assert_eq!(state.snapshot(), before);
    }

    #[test]
    fn presence_round_trip() {
        let mut state = state();
        state.tap_marker(AreaId(1));
        let before = state.snapshot();

        assert!(state.toggle_presence().is_some());
        assert_eq!(
            state.snapshot().toggle_label.as_deref(),
            Some("Check Out from Stanley Park")
        );
        assert!(state.toggle_presence().is_some());
        assert_eq!(state.snapshot(), before);
    }

    #[test]
    fn user_pan_updates_names_visibility() {
        let mut state = state();
        let zoomed_in = Region::new(Coordinate::new(49.29, -123.13), 0.02, 0.03).unwrap();
        state.on_region_change_complete(zoomed_in);
        assert!(state.snapshot().names_visible);

        let edge = Region::new(Coordinate::new(49.29, -123.13), 0.05, 0.05).unwrap();
        state.on_region_change_complete(edge);
        assert!(!state.snapshot().names_visible);
    }

    #[test]
    fn reset_catalog_clears_selection_and_query() {
        let mut state = state();
        state.tap_marker(AreaId(1));
        state.check_in();
        state.set_query("park");

        let catalog = Catalog::new(vec![square("Trout Lake", 5, 49.25, -123.06)]).unwrap();
        state.reset_catalog(Arc::new(catalog));

        assert_eq!(state.selection(), &SelectionState::NoSelection);
        assert!(!state.selection().is_checked_in());
        assert_eq!(state.search().query(), "");
        assert_eq!(state.catalog().len(), 1);
    }

    #[tokio::test]
    async fn permission_denied_leaves_state_untouched() {
        let mut state = state();
        state.tap_marker(AreaId(1));
        state.check_in();
        let mut surface = RecordingSurface::default();
        state.dispatch_animation(&mut surface);
        let before = state.snapshot();

        let ticket = state.begin_locate();
        let result = locate(&FixedLocationService::denied()).await;
        let notification = state.finish_locate(ticket, result);

        assert_eq!(notification, Some(Notification::PermissionDenied));
        assert_eq!(state.snapshot(), before);
        assert!(state.viewport().pending_animation().is_none());
    }

    #[tokio::test]
    async fn position_unavailable_reports_message() {
        let mut state = state();
        let before = state.snapshot();

        let ticket = state.begin_locate();
        let result = locate(&FixedLocationService::unavailable()).await;

        assert_eq!(
            state.finish_locate(ticket, result),
            Some(Notification::LocationUnavailable {
                message: "No position fix available".to_string()
            })
        );
        assert_eq!(state.snapshot(), before);
    }

    #[tokio::test]
    async fn successful_locate_recenters_but_keeps_selection() {
        let mut state = state();
        state.tap_marker(AreaId(1));
        state.check_in();
        let selection = state.selection().clone();

        let here = Coordinate::new(49.26, -123.10);
        let ticket = state.begin_locate();
        let result = locate(&FixedLocationService::new(here)).await;
        assert!(state.finish_locate(ticket, result).is_none());

        let snapshot = state.snapshot();
        assert_eq!(snapshot.current_location, Some(here));
        assert_eq!(snapshot.region.center(), here);
        assert_eq!(snapshot.region.lat_span(), 0.005);
        assert_eq!(snapshot.selection, selection);
        assert!(snapshot.selection.is_checked_in());
    }

    #[test]
    fn only_latest_locate_is_applied() {
        let mut state = state();
        let first = state.begin_locate();
        let second = state.begin_locate();

        let newer = Coordinate::new(49.27, -123.11);
        let older = Coordinate::new(49.20, -123.00);

        // The newer request finishes first; the older one must not override it.
        assert!(state.finish_locate(second, Ok(newer)).is_none());
        assert!(
            state
                .finish_locate(first, Err(LocationError::PermissionDenied))
                .is_none()
        );
        assert!(state.finish_locate(first, Ok(older)).is_none());

        assert_eq!(state.current_location(), Some(newer));
        assert_eq!(state.viewport().region().center(), newer);
    }
}
