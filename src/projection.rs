//! Geographical coordinates and the Web Mercator projection used by the map view.

use egui::{Pos2, Rect};
use serde::{Deserialize, Serialize};

use crate::TILE_SIZE;
use crate::viewport::Region;

/// A geographical position in degrees.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    /// Latitude.
    pub lat: f64,

    /// Longitude.
    pub lon: f64,
}

impl Coordinate {
    /// Creates a new coordinate.
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

impl From<(f64, f64)> for Coordinate {
    /// Converts a `(lat, lon)` tuple.
    fn from((lat, lon): (f64, f64)) -> Self {
        Self { lat, lon }
    }
}

/// Converts longitude to the x-coordinate of a tile at a given (possibly fractional) zoom level.
pub(crate) fn lon_to_x(lon: f64, zoom: f64) -> f64 {
    (lon + 180.0) / 360.0 * 2.0_f64.powf(zoom)
}

/// Converts latitude to the y-coordinate of a tile at a given zoom level.
pub(crate) fn lat_to_y(lat: f64, zoom: f64) -> f64 {
    (1.0 - lat.to_radians().tan().asinh() / std::f64::consts::PI) / 2.0 * 2.0_f64.powf(zoom)
}

/// Converts the x-coordinate of a tile to longitude at a given zoom level.
pub(crate) fn x_to_lon(x: f64, zoom: f64) -> f64 {
    x / 2.0_f64.powf(zoom) * 360.0 - 180.0
}

/// Converts the y-coordinate of a tile to latitude at a given zoom level.
pub(crate) fn y_to_lat(y: f64, zoom: f64) -> f64 {
    let n = std::f64::consts::PI - 2.0 * std::f64::consts::PI * y / 2.0_f64.powf(zoom);
    n.sinh().atan().to_degrees()
}

/// Latitude difference between the top and bottom edge of a widget `height` points tall,
/// centered on `center_lat`, at `zoom`.
fn lat_span_at(center_lat: f64, height: f64, zoom: f64) -> f64 {
    let center_y = lat_to_y(center_lat, 0.0);
    let half = height / 2.0 / (TILE_SIZE as f64 * 2.0_f64.powf(zoom));
    y_to_lat(center_y - half, 0.0) - y_to_lat(center_y + half, 0.0)
}

/// The zoom at which a widget `height` points tall shows `lat_span` degrees around
/// `center_lat`. The span shrinks monotonically with zoom, so bisection converges.
fn lat_zoom_for_span(center_lat: f64, lat_span: f64, height: f64) -> f64 {
    let mut lo = crate::MIN_ZOOM as f64 - 4.0;
    let mut hi = crate::MAX_ZOOM as f64 + 4.0;
    if lat_span_at(center_lat, height, lo) <= lat_span {
        return lo;
    }
    if lat_span_at(center_lat, height, hi) >= lat_span {
        return hi;
    }
    for _ in 0..64 {
        let mid = (lo + hi) / 2.0;
        if lat_span_at(center_lat, height, mid) > lat_span {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    lo
}

/// A helper for converting between geographical and screen coordinates.
///
/// The zoom level is fractional: it is chosen so that the whole [`Region`] fits
/// inside the widget.
pub struct MapProjection {
    zoom: f64,
    center: Coordinate,
    widget_rect: Rect,
}

impl MapProjection {
    /// Creates a projection that fits `region` into `widget_rect`.
    ///
    /// The region's center lands on the widget center, and its spans are measured between the
    /// widget edges, the same way [`MapProjection::visible_region`] reports them.
    pub fn fit(region: &Region, widget_rect: Rect) -> Self {
        let center = region.center();
        let width = widget_rect.width().max(1.0) as f64;
        let height = widget_rect.height().max(1.0) as f64;

        let lon_zoom = (360.0 * width / (TILE_SIZE as f64 * region.lon_span())).log2();
        let lat_zoom = lat_zoom_for_span(center.lat, region.lat_span(), height);

        let zoom = lon_zoom
            .min(lat_zoom)
            .clamp(crate::MIN_ZOOM as f64, crate::MAX_ZOOM as f64 + 2.0);

        Self {
            zoom,
            center,
            widget_rect,
        }
    }

    /// The fractional zoom level.
    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    /// The geographical position at the center of the widget.
    pub fn center(&self) -> Coordinate {
        self.center
    }

    /// The rectangle of the widget on screen.
    pub fn widget_rect(&self) -> Rect {
        self.widget_rect
    }

    /// Projects a geographical coordinate to a screen coordinate.
    pub fn project(&self, pos: Coordinate) -> Pos2 {
        let center_x = lon_to_x(self.center.lon, self.zoom);
        let center_y = lat_to_y(self.center.lat, self.zoom);

        let dx = (lon_to_x(pos.lon, self.zoom) - center_x) * TILE_SIZE as f64;
        let dy = (lat_to_y(pos.lat, self.zoom) - center_y) * TILE_SIZE as f64;

        self.widget_rect.center() + egui::vec2(dx as f32, dy as f32)
    }

    /// Un-projects a screen coordinate to a geographical coordinate.
    pub fn unproject(&self, screen_pos: Pos2) -> Coordinate {
        let rel = screen_pos - self.widget_rect.center();

        let x = lon_to_x(self.center.lon, self.zoom) + rel.x as f64 / TILE_SIZE as f64;
        let y = lat_to_y(self.center.lat, self.zoom) + rel.y as f64 / TILE_SIZE as f64;

        Coordinate::new(y_to_lat(y, self.zoom), x_to_lon(x, self.zoom))
    }

    /// The region that is actually visible in the widget, or `None` when the widget has no
    /// area.
    pub fn visible_region(&self) -> Option<Region> {
        let top = self.unproject(self.widget_rect.center_top());
        let bottom = self.unproject(self.widget_rect.center_bottom());
        let left = self.unproject(self.widget_rect.left_center());
        let right = self.unproject(self.widget_rect.right_center());

        let center = self.unproject(self.widget_rect.center());
        Region::new(center, top.lat - bottom.lat, right.lon - left.lon).ok()
    }

    /// Returns a projection moved by a screen-space drag of `delta` pixels.
    pub fn panned(&self, delta: egui::Vec2) -> Self {
        let center = self.unproject(self.widget_rect.center() - delta);
        Self {
            zoom: self.zoom,
            center: Coordinate::new(
                center.lat.clamp(-crate::MAX_LATITUDE, crate::MAX_LATITUDE),
                center.lon.clamp(-180.0, 180.0),
            ),
            widget_rect: self.widget_rect,
        }
    }

    /// Returns a projection zoomed by `steps` levels, keeping the geographical position under
    /// `anchor` at the same place on screen.
    pub fn zoomed(&self, steps: f64, anchor: Pos2) -> Self {
        let target = self.unproject(anchor);
        let zoom = (self.zoom + steps).clamp(crate::MIN_ZOOM as f64, crate::MAX_ZOOM as f64 + 2.0);

        let rel = anchor - self.widget_rect.center();
        let center_x = lon_to_x(target.lon, zoom) - rel.x as f64 / TILE_SIZE as f64;
        let center_y = lat_to_y(target.lat, zoom) - rel.y as f64 / TILE_SIZE as f64;

        Self {
            zoom,
            center: Coordinate::new(y_to_lat(center_y, zoom), x_to_lon(center_x, zoom)),
            widget_rect: self.widget_rect,
        }
    }
}
