//! The park map widget.
//!
//! [`ParkMap`] is the rendering surface for [`ParkMapState`]: it draws the map, turns drags,
//! scrolls and clicks into state transitions, animates focus changes and shows the search box,
//! the check-in button, the locate button and alerts on top.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use park_map_view::{Catalog, Coordinate, ParkMap, config::OpenStreetMapConfig};
//! use park_map_view::location::FixedLocationService;
//!
//! let catalog = Catalog::load("dog-off-leash-parks.json")?;
//! let map = ParkMap::new(catalog, OpenStreetMapConfig::default()).with_location_service(
//!     Arc::new(FixedLocationService::new(Coordinate::new(49.2634, -123.1380))),
//! );
//! # Ok::<(), eyre::Report>(())
//! ```

mod areas;
mod tiles;

use std::sync::Arc;
use std::time::Duration;

use egui::{Align2, Color32, Rect, Response, Sense, Ui, Widget, vec2};
use log::debug;
use poll_promise::Promise;

use crate::catalog::{AreaId, Catalog};
use crate::config::MapConfig;
use crate::location::{LocateTicket, LocationError, LocationService, spawn_locate};
use crate::notification::Notification;
use crate::projection::{Coordinate, MapProjection};
use crate::state::ParkMapState;
use crate::viewport::{Region, RenderSurface};

use self::tiles::TileCache;

/// An animated transition between two regions.
#[derive(Clone, Copy, Debug)]
struct Transition {
    from: Region,
    to: Region,
    start: f64,
    duration: f64,
}

/// Receives animation commands from the viewport and works out what to draw on each frame.
#[derive(Debug)]
pub(crate) struct Animator {
    requested: Option<(Region, Duration)>,
    active: Option<Transition>,
    shown: Region,
}

impl RenderSurface for Animator {
    fn animate_to_region(&mut self, region: Region, duration: Duration) {
        self.requested = Some((region, duration));
    }
}

impl Animator {
    pub(crate) fn new(shown: Region) -> Self {
        Self {
            requested: None,
            active: None,
            shown,
        }
    }

    /// The region currently on screen.
    pub(crate) fn shown(&self) -> Region {
        self.shown
    }

    /// Whether a transition is running.
    pub(crate) fn is_animating(&self) -> bool {
        self.active.is_some() || self.requested.is_some()
    }

    /// Moves to time `now` (in seconds). Returns `true` on the frame a transition settles.
    pub(crate) fn advance(&mut self, now: f64) -> bool {
        if let Some((to, duration)) = self.requested.take() {
            self.active = Some(Transition {
                from: self.shown,
                to,
                start: now,
                duration: duration.as_secs_f64(),
            });
        }

        let Some(transition) = self.active else {
            return false;
        };

        let t = if transition.duration > 0.0 {
            (now - transition.start) / transition.duration
        } else {
            1.0
        };

        if t >= 1.0 {
            self.shown = transition.to;
            self.active = None;
            true
        } else {
            self.shown = transition.from.lerp(&transition.to, ease_out(t));
            false
        }
    }

    /// Replaces what is shown, cancelling any running transition. Used when the user grabs the
    /// map.
    pub(crate) fn jump_to(&mut self, region: Region) {
        self.requested = None;
        self.active = None;
        self.shown = region;
    }
}

fn ease_out(t: f64) -> f64 {
    1.0 - (1.0 - t).powi(3)
}

/// The park map widget.
pub struct ParkMap {
    state: ParkMapState,
    config: Box<dyn MapConfig>,
    tiles: TileCache,
    animator: Animator,
    location: Option<Arc<dyn LocationService>>,
    pending_locates: Vec<(LocateTicket, Promise<Result<Coordinate, LocationError>>)>,
    alert: Option<Notification>,
}

impl ParkMap {
    /// Creates a new `ParkMap` widget for `catalog`.
    ///
    /// # Arguments
    ///
    /// * `catalog` - The parks to show.
    /// * `config` - A type that implements `MapConfig`, which provides the tile server and
    ///   viewport defaults.
    pub fn new<C: MapConfig + 'static>(catalog: Catalog, config: C) -> Self {
        let state = ParkMapState::new(Arc::new(catalog), &config);
        let animator = Animator::new(state.viewport().region());
        Self {
            state,
            config: Box::new(config),
            tiles: TileCache::default(),
            animator,
            location: None,
            pending_locates: Vec::new(),
            alert: None,
        }
    }

    /// Enables the locate button, backed by `service`.
    pub fn with_location_service(mut self, service: Arc<dyn LocationService>) -> Self {
        self.location = Some(service);
        self
    }

    /// The state behind the map.
    pub fn state(&self) -> &ParkMapState {
        &self.state
    }

    /// Mutable access to the state, for driving the map from outside (for example a side
    /// panel listing parks).
    pub fn state_mut(&mut self) -> &mut ParkMapState {
        &mut self.state
    }

    /// The alert currently shown, if any.
    pub fn alert(&self) -> Option<&Notification> {
        self.alert.as_ref()
    }

    /// Starts a device location lookup. Does nothing without a location service.
    pub fn request_location(&mut self) {
        let Some(service) = self.location.clone() else {
            return;
        };
        let ticket = self.state.begin_locate();
        debug!("Starting location request {:?}", ticket);
        self.pending_locates.push((ticket, spawn_locate(service)));
    }

    fn show_alert(&mut self, notification: Option<Notification>) {
        if notification.is_some() {
            self.alert = notification;
        }
    }

    /// Applies finished location lookups.
    fn poll_locates(&mut self, ctx: &egui::Context) {
        let mut finished = Vec::new();
        self.pending_locates
            .retain_mut(|(ticket, promise)| match promise.ready() {
                Some(result) => {
                    finished.push((*ticket, result.clone()));
                    false
                }
                None => true,
            });

        for (ticket, result) in finished {
            let notification = self.state.finish_locate(ticket, result);
            self.show_alert(notification);
        }

        if !self.pending_locates.is_empty() {
            ctx.request_repaint();
        }
    }

    /// Handles panning, zooming and marker clicks. Returns the projection to draw with.
    fn handle_input(&mut self, ui: &Ui, rect: Rect, response: &Response) -> MapProjection {
        let mut projection = MapProjection::fit(&self.animator.shown(), rect);

        if response.dragged() {
            let delta = response.drag_delta();
            if delta != egui::Vec2::ZERO {
                projection = projection.panned(delta);
                if let Some(region) = projection.visible_region() {
                    self.animator.jump_to(region);
                }
            }
        }
        if response.drag_stopped() {
            if let Some(region) = projection.visible_region() {
                self.state.on_region_change_complete(region);
            }
        }

        if response.double_clicked() {
            if let Some(pointer) = response.interact_pointer_pos() {
                projection = projection.zoomed(1.0, pointer);
                self.settle(&projection);
            }
        } else if response.clicked() {
            if let Some(pointer) = response.interact_pointer_pos() {
                if let Some(id) = areas::marker_at(self.state.catalog(), &projection, pointer) {
                    self.state.tap_marker(id);
                }
            }
        }

        if response.hovered() {
            if let Some(pointer) = response.hover_pos() {
                let scroll = ui.input(|i| i.raw_scroll_delta.y);
                if scroll != 0.0 {
                    projection = projection.zoomed(scroll.signum() as f64, pointer);
                    self.settle(&projection);
                }
            }
        }

        projection
    }

    /// Reports the region of `projection` as the new resting region. A widget without area
    /// keeps the previous one.
    fn settle(&mut self, projection: &MapProjection) {
        let Some(region) = projection.visible_region() else {
            return;
        };
        self.animator.jump_to(region);
        self.state.on_region_change_complete(region);
    }

    fn draw_map(&mut self, ui: &mut Ui, rect: Rect, projection: &MapProjection) {
        let painter = ui.painter_at(rect);
        painter.rect_filled(rect, 0.0, Color32::from_rgb(220, 220, 220)); // Background

        self.tiles
            .draw(ui, &painter, projection, self.config.as_ref());

        let catalog = self.state.catalog().clone();
        for area in catalog.iter() {
            areas::draw_boundary(&painter, projection, area);
        }

        if let Some(position) = self.state.current_location() {
            areas::draw_device(&painter, projection, position);
        }

        let selected = self.state.selection().selected().map(|area| area.id);
        let show_names = self.state.viewport().names_visible();
        for area in catalog.iter() {
            areas::draw_marker(
                &painter,
                projection,
                area,
                selected == Some(area.id),
                show_names,
            );
        }
    }

    fn draw_search(&mut self, ui: &Ui, rect: Rect) {
        let width = (rect.width() - 20.0).max(100.0);
        let mut picked: Option<AreaId> = None;

        egui::Area::new(ui.id().with("search"))
            .fixed_pos(rect.left_top() + vec2(10.0, 10.0))
            .show(ui.ctx(), |ui| {
                egui::Frame::popup(ui.style()).show(ui, |ui| {
                    ui.set_width(width);
                    ui.add(
                        egui::TextEdit::singleline(self.state.query_mut())
                            .hint_text("Search Dog Parks...")
                            .desired_width(f32::INFINITY),
                    );

                    let suggestions = self.state.suggestions();
                    if !suggestions.is_empty() {
                        ui.separator();
                        egui::ScrollArea::vertical()
                            .max_height(150.0)
                            .show(ui, |ui| {
                                for area in &suggestions {
                                    let button =
                                        egui::Button::new(area.name.as_str()).frame(false);
                                    if ui.add(button).clicked() {
                                        picked = Some(area.id);
                                    }
                                }
                            });
                    }
                });
            });

        if let Some(id) = picked {
            self.state.pick_suggestion(id);
        }
    }

    fn draw_controls(&mut self, ui: &Ui, rect: Rect) {
        if let Some(label) = self.state.selection().toggle_label() {
            let mut toggled = false;
            egui::Area::new(ui.id().with("check_in"))
                .fixed_pos(rect.center_bottom())
                .anchor(Align2::CENTER_BOTTOM, vec2(0.0, -70.0))
                .show(ui.ctx(), |ui| {
                    let button = egui::Button::new(label).fill(Color32::from_rgb(255, 140, 0));
                    toggled = ui.add(button).clicked();
                });
            if toggled {
                let notification = self.state.toggle_presence();
                self.show_alert(notification);
            }
        }

        if self.location.is_some() {
            let mut locate = false;
            egui::Area::new(ui.id().with("locate"))
                .fixed_pos(rect.right_bottom())
                .anchor(Align2::RIGHT_BOTTOM, vec2(-20.0, -20.0))
                .show(ui.ctx(), |ui| {
                    locate = ui
                        .button("⌖")
                        .on_hover_text("Show my location")
                        .clicked();
                });
            if locate {
                self.request_location();
            }
        }
    }

    fn draw_alert(&mut self, ui: &Ui) {
        let Some(notification) = &self.alert else {
            return;
        };

        let mut dismissed = false;
        egui::Window::new(notification.title())
            .id(ui.id().with("alert"))
            .collapsible(false)
            .resizable(false)
            .anchor(Align2::CENTER_CENTER, vec2(0.0, 0.0))
            .show(ui.ctx(), |ui| {
                ui.label(notification.body());
                dismissed = ui.button("OK").clicked();
            });

        if dismissed {
            self.alert = None;
        }
    }

    /// Draws the attribution text.
    fn draw_attribution(&self, ui: &Ui, rect: Rect) {
        if let Some(attribution) = self.config.attribution() {
            let bg_color = if ui.visuals().dark_mode {
                Color32::from_black_alpha(150)
            } else {
                Color32::from_white_alpha(150)
            };

            let frame = egui::Frame::NONE
                .inner_margin(egui::Margin::same(5))
                .fill(bg_color)
                .corner_radius(3.0);

            egui::Area::new(ui.id().with("attribution"))
                .fixed_pos(rect.left_bottom())
                .anchor(Align2::LEFT_BOTTOM, vec2(5.0, -5.0))
                .show(ui.ctx(), |ui| {
                    frame.show(ui, |ui| {
                        ui.style_mut().override_text_style = Some(egui::TextStyle::Small);
                        ui.style_mut().wrap_mode = Some(egui::TextWrapMode::Extend);

                        if let Some(url) = self.config.attribution_url() {
                            ui.hyperlink_to(attribution, url);
                        } else {
                            ui.label(attribution);
                        }
                    });
                });
        }
    }
}

impl Widget for &mut ParkMap {
    fn ui(self, ui: &mut Ui) -> Response {
        let (rect, response) =
            ui.allocate_exact_size(ui.available_size(), Sense::drag().union(Sense::click()));

        self.poll_locates(ui.ctx());

        // Pick up focus requests made since the last frame, then step the animation.
        self.state.dispatch_animation(&mut self.animator);
        let now = ui.input(|i| i.time);
        if self.animator.advance(now) {
            let settled = MapProjection::fit(&self.animator.shown(), rect);
            self.settle(&settled);
        }
        if self.animator.is_animating() {
            ui.ctx().request_repaint();
        }

        let projection = self.handle_input(ui, rect, &response);
        self.draw_map(ui, rect, &projection);

        self.draw_attribution(ui, rect);
        self.draw_search(ui, rect);
        self.draw_controls(ui, rect);
        self.draw_alert(ui);

        response
    }
}
