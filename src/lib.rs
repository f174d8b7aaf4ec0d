#![warn(missing_docs)]

//! An off-leash park finder map for `egui`.
//!
//! The crate is split in two halves:
//!
//! * a UI-independent core: the park [`catalog`], name [`search`], the [`viewport`]
//!   controller, the [`selection`] and presence state machine and the device [`location`]
//!   probe, tied together by [`ParkMapState`];
//! * the [`ParkMap`] widget, which draws tiles, park polygons and markers, and feeds user
//!   input back into the core.
//!
//! # Example
//!
//! ```no_run
//! use eframe::egui;
//! use park_map_view::{Catalog, ParkMap, config::OpenStreetMapConfig};
//!
//! struct MyApp {
//!     map: ParkMap,
//! }
//!
//! impl MyApp {
//!     fn new() -> eyre::Result<Self> {
//!         let catalog = Catalog::load("dog-off-leash-parks.json")?;
//!         Ok(Self {
//!             map: ParkMap::new(catalog, OpenStreetMapConfig::default()),
//!         })
//!     }
//! }
//!
//! impl eframe::App for MyApp {
//!     fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
//!         egui::CentralPanel::default()
//!             .frame(egui::Frame::NONE)
//!             .show(ctx, |ui| {
//!                 ui.add(&mut self.map);
//!             });
//!     }
//! }
//! ```

/// The static park catalog.
pub mod catalog;

/// Configuration traits and types for the map widget.
pub mod config;

/// Device location lookup.
pub mod location;

/// User-facing alerts.
pub mod notification;

/// Coordinates and map projection.
pub mod projection;

/// Name search.
pub mod search;

/// Selection and presence.
pub mod selection;

/// The view state tying the core together.
pub mod state;

/// The `egui` widget.
pub mod view;

/// The viewport controller.
pub mod viewport;

use thiserror::Error;

pub use catalog::{Area, AreaId, Catalog, CatalogError};
pub use location::{LocationError, LocationService, Permission, locate};
pub use notification::Notification;
pub use projection::Coordinate;
pub use state::{MapSnapshot, ParkMapState};
pub use view::ParkMap;
pub use viewport::{Region, RenderSurface, Viewport};

// The size of a map tile in pixels.
pub(crate) const TILE_SIZE: u32 = 256;
/// The minimum zoom level.
pub const MIN_ZOOM: u8 = 0;
/// The maximum zoom level tiles are requested for.
pub const MAX_ZOOM: u8 = 19;
// Latitude limit of the Web Mercator projection.
pub(crate) const MAX_LATITUDE: f64 = 85.0511287798;

/// Errors that can occur while fetching map tiles.
#[derive(Error, Debug)]
pub enum MapError {
    /// An error occurred while making a web request.
    #[error("Connection error")]
    ConnectionError(#[from] reqwest::Error),

    /// The shared HTTP client could not be built.
    #[error("HTTP client unavailable: {0}")]
    ClientUnavailable(String),

    /// A map tile failed to download.
    #[error("A map tile failed to download. HTTP Status: `{0}`")]
    TileDownloadError(String),

    /// The downloaded tile bytes could not be converted to an image.
    #[error("Unable to convert downloaded map tile bytes as image")]
    TileBytesConversionError(#[from] image::ImageError),
}

/// A unique identifier for a map tile.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq)]
pub struct TileId {
    /// The zoom level.
    pub z: u8,

    /// The x-coordinate of the tile.
    pub x: u32,

    /// The y-coordinate of the tile.
    pub y: u32,
}
