//! Configuration for different map providers, and the viewport defaults that go with them.

use std::time::Duration;

use crate::TileId;
use crate::viewport::{FOCUS_ANIMATION, FOCUS_SPAN, NAMES_VISIBLE_THRESHOLD, Region};

/// Configuration for a map provider.
///
/// Only the tile URL is mandatory; the viewport behaviour has defaults matching the park
/// finder.
pub trait MapConfig {
    /// Returns the URL for a given tile.
    fn tile_url(&self, tile: &TileId) -> String;

    /// Returns the attribution text to be displayed on the map. If returns `None`, no attribution is shown.
    fn attribution(&self) -> Option<&String>;

    /// Returns the attribution URL to be linked from the attribution text.
    fn attribution_url(&self) -> Option<&String>;

    /// The region shown before the user interacts with the map.
    fn default_region(&self) -> Region {
        Region::fallback()
    }

    /// Span of the region used when focusing on a park or on the device position.
    fn focus_span(&self) -> f64 {
        FOCUS_SPAN
    }

    /// Duration of the focus transition.
    fn focus_animation(&self) -> Duration {
        FOCUS_ANIMATION
    }

    /// Park names are drawn while the latitude span is below this value.
    fn names_visible_threshold(&self) -> f64 {
        NAMES_VISIBLE_THRESHOLD
    }
}

/// Configuration for the OpenStreetMap tile server.
///
/// # Example
///
/// ```
/// use park_map_view::config::OpenStreetMapConfig;
/// let config = OpenStreetMapConfig::default();
/// ```
#[cfg(feature = "openstreetmap")]
pub struct OpenStreetMapConfig {
    base_url: String,
    attribution: String,
    attribution_url: String,
}

#[cfg(feature = "openstreetmap")]
impl Default for OpenStreetMapConfig {
    fn default() -> Self {
        Self {
            base_url: "https://tile.openstreetmap.org".to_string(),
            attribution: "© OpenStreetMap contributors".to_string(),
            attribution_url: "https://www.openstreetmap.org".to_string(),
        }
    }
}

#[cfg(feature = "openstreetmap")]
impl MapConfig for OpenStreetMapConfig {
    fn tile_url(&self, tile: &TileId) -> String {
        format!("{}/{}/{}/{}.png", self.base_url, tile.z, tile.x, tile.y)
    }

    fn attribution(&self) -> Option<&String> {
        Some(&self.attribution)
    }

    fn attribution_url(&self) -> Option<&String> {
        Some(&self.attribution_url)
    }
}

/// A dynamic map configuration with a tile URL function and viewport settings chosen at
/// runtime.
///
/// # Example
///
/// ```
/// use park_map_view::config::DynMapConfig;
/// let config = DynMapConfig::new(|tile| format!("https://my-tile-server/{}/{}/{}.png", tile.z, tile.x, tile.y))
///     .with_focus_span(0.01);
/// ```
pub struct DynMapConfig {
    tile_url: Box<dyn Fn(&TileId) -> String>,
    default_region: Region,
    focus_span: f64,
    focus_animation: Duration,
    names_visible_threshold: f64,
}

impl DynMapConfig {
    /// Creates a new `DynMapConfig` with a custom tile URL function and default viewport
    /// settings.
    pub fn new(tile_url: impl Fn(&TileId) -> String + 'static) -> Self {
        Self {
            tile_url: Box::new(tile_url),
            default_region: Region::fallback(),
            focus_span: FOCUS_SPAN,
            focus_animation: FOCUS_ANIMATION,
            names_visible_threshold: NAMES_VISIBLE_THRESHOLD,
        }
    }

    /// Sets the region shown at startup.
    pub fn with_default_region(mut self, region: Region) -> Self {
        self.default_region = region;
        self
    }

    /// Sets the span used when focusing.
    pub fn with_focus_span(mut self, span: f64) -> Self {
        self.focus_span = span;
        self
    }

    /// Sets the duration of the focus transition.
    pub fn with_focus_animation(mut self, duration: Duration) -> Self {
        self.focus_animation = duration;
        self
    }

    /// Sets the latitude span below which names are shown.
    pub fn with_names_visible_threshold(mut self, threshold: f64) -> Self {
        self.names_visible_threshold = threshold;
        self
    }
}

impl MapConfig for DynMapConfig {
    fn tile_url(&self, tile: &TileId) -> String {
        (self.tile_url)(tile)
    }

    fn attribution(&self) -> Option<&String> {
        None
    }

    fn attribution_url(&self) -> Option<&String> {
        None
    }

    fn default_region(&self) -> Region {
        self.default_region
    }

    fn focus_span(&self) -> f64 {
        self.focus_span
    }

    fn focus_animation(&self) -> Duration {
        self.focus_animation
    }

    fn names_visible_threshold(&self) -> f64 {
        self.names_visible_threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg(feature = "openstreetmap")]
    fn openstreetmap_uses_park_defaults() {
        let config = OpenStreetMapConfig::default();
        assert_eq!(config.default_region(), Region::fallback());
        assert_eq!(config.focus_span(), 0.005);
        assert_eq!(config.focus_animation(), Duration::from_millis(500));
        assert_eq!(config.names_visible_threshold(), 0.05);
        assert_eq!(
            config.attribution().map(String::as_str),
            Some("© OpenStreetMap contributors")
        );
    }

    #[test]
    #[cfg(feature = "openstreetmap")]
    fn openstreetmap_tile_url() {
        let config = OpenStreetMapConfig::default();
        let url = config.tile_url(&TileId { z: 13, x: 1297, y: 2802 });
        assert_eq!(url, "https://tile.openstreetmap.org/13/1297/2802.png");
    }

    #[test]
    fn dyn_config_overrides() {
        let config = DynMapConfig::new(|tile| format!("tiles/{}-{}-{}", tile.z, tile.x, tile.y))
            .with_focus_span(0.01)
            .with_focus_animation(Duration::from_millis(250))
            .with_names_visible_threshold(0.02);

        assert_eq!(config.tile_url(&TileId { z: 1, x: 0, y: 1 }), "tiles/1-0-1");
        assert_eq!(config.focus_span(), 0.01);
        assert_eq!(config.focus_animation(), Duration::from_millis(250));
        assert_eq!(config.names_visible_threshold(), 0.02);
        assert!(config.attribution().is_none());
    }
}
