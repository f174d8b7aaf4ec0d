//! Raster tile background.

use std::collections::HashMap;
use std::sync::Arc;

use egui::{Color32, Painter, Rect, Sense, Ui, Vec2, pos2};
use eyre::{Context, Result};
use log::{debug, error};
use once_cell::sync::Lazy;
use poll_promise::Promise;

use crate::config::MapConfig;
use crate::projection::{MapProjection, lat_to_y, lon_to_x};
use crate::{MAX_ZOOM, MIN_ZOOM, MapError, TILE_SIZE, TileId};

// Reuse the reqwest client for all tile downloads by making it a static variable.
static CLIENT: Lazy<reqwest::Result<reqwest::blocking::Client>> = Lazy::new(|| {
    reqwest::blocking::Client::builder()
        .user_agent(format!(
            "{}/{}",
            env!("CARGO_PKG_NAME"),
            env!("CARGO_PKG_VERSION")
        ))
        .build()
});

/// The state of a tile in the cache.
enum Tile {
    /// The tile is being downloaded.
    Loading(Promise<Result<egui::ColorImage, Arc<eyre::Report>>>),

    /// The tile is in memory.
    Loaded(egui::TextureHandle),

    /// The tile failed to download.
    Failed(Arc<eyre::Report>),
}

/// Downloads tiles on demand and keeps them for the lifetime of the widget.
#[derive(Default)]
pub(crate) struct TileCache {
    tiles: HashMap<TileId, Tile>,
}

/// The integer zoom level tiles are fetched at for a fractional projection zoom.
pub(crate) fn tile_zoom(zoom: f64) -> u8 {
    zoom.floor().clamp(MIN_ZOOM as f64, MAX_ZOOM as f64) as u8
}

/// The tiles covering the widget, with the screen rectangle each one occupies.
pub(crate) fn visible_tiles(projection: &MapProjection) -> Vec<(TileId, Rect)> {
    let z = tile_zoom(projection.zoom());
    // Tiles of level `z` are stretched to the fractional zoom.
    let tile_px = TILE_SIZE as f64 * 2.0_f64.powf(projection.zoom() - z as f64);

    let rect = projection.widget_rect();
    let center = projection.center();
    let center_x = lon_to_x(center.lon, z as f64);
    let center_y = lat_to_y(center.lat, z as f64);

    let half_w = rect.width() as f64 / 2.0 / tile_px;
    let half_h = rect.height() as f64 / 2.0 / tile_px;
    let world = 1_i64 << z;

    let x_min = ((center_x - half_w).floor() as i64).max(0);
    let y_min = ((center_y - half_h).floor() as i64).max(0);
    let x_max = ((center_x + half_w).ceil() as i64).min(world - 1);
    let y_max = ((center_y + half_h).ceil() as i64).min(world - 1);

    let mut tiles = Vec::new();
    for x in x_min..=x_max {
        for y in y_min..=y_max {
            let min = rect.center()
                + Vec2::new(
                    ((x as f64 - center_x) * tile_px) as f32,
                    ((y as f64 - center_y) * tile_px) as f32,
                );
            let tile_id = TileId {
                z,
                x: x as u32,
                y: y as u32,
            };
            tiles.push((
                tile_id,
                Rect::from_min_size(min, Vec2::splat(tile_px as f32)),
            ));
        }
    }
    tiles
}

fn download_tile(url: &str) -> Result<egui::ColorImage, MapError> {
    let client = CLIENT
        .as_ref()
        .map_err(|e| MapError::ClientUnavailable(e.to_string()))?;

    debug!("Downloading tile from {}", url);
    let response = client.get(url).send()?;
    if !response.status().is_success() {
        return Err(MapError::TileDownloadError(response.status().to_string()));
    }

    let bytes = response.bytes()?.to_vec();
    let image = image::load_from_memory(&bytes)?.to_rgba8();

    let size = [image.width() as _, image.height() as _];
    let pixels = image.into_raw();
    Ok(egui::ColorImage::from_rgba_unmultiplied(size, &pixels))
}

impl TileCache {
    /// Starts downloads for tiles that are not cached and promotes finished downloads to
    /// textures.
    fn refresh(&mut self, ctx: &egui::Context, config: &dyn MapConfig, tile_id: TileId) {
        let tile = self.tiles.entry(tile_id).or_insert_with(|| {
            let url = config.tile_url(&tile_id);
            Tile::Loading(Promise::spawn_thread("download_tile", move || {
                download_tile(&url)
                    .wrap_err_with(|| format!("Failed to download tile from {}", &url))
                    .map_err(Arc::new)
            }))
        });

        if let Tile::Loading(promise) = tile {
            if let Some(result) = promise.ready() {
                *tile = match result {
                    Ok(color_image) => Tile::Loaded(ctx.load_texture(
                        format!("tile_{}_{}_{}", tile_id.z, tile_id.x, tile_id.y),
                        color_image.clone(),
                        Default::default(),
                    )),
                    Err(e) => {
                        error!("{:?}", e);
                        Tile::Failed(e.clone())
                    }
                };
            }
        }
    }

    /// Draws every visible tile, loading them as needed.
    pub(crate) fn draw(
        &mut self,
        ui: &mut Ui,
        painter: &Painter,
        projection: &MapProjection,
        config: &dyn MapConfig,
    ) {
        for (tile_id, tile_rect) in visible_tiles(projection) {
            self.refresh(ui.ctx(), config, tile_id);

            match self.tiles.get(&tile_id) {
                Some(Tile::Loaded(texture)) => {
                    painter.image(
                        texture.id(),
                        tile_rect,
                        Rect::from_min_max(pos2(0.0, 0.0), pos2(1.0, 1.0)),
                        Color32::WHITE,
                    );
                }
                Some(Tile::Failed(e)) => {
                    placeholder(painter, tile_rect, "!", Color32::RED);
                    let response = ui.interact(tile_rect, ui.id().with(tile_id), Sense::hover());
                    response.on_hover_text(format!("{}", e));
                }
                Some(Tile::Loading(_)) | None => {
                    placeholder(painter, tile_rect, "?", Color32::ORANGE);
                    // The tile is still loading, so we need to tell egui to repaint.
                    ui.ctx().request_repaint();
                }
            }
        }
    }
}

fn placeholder(painter: &Painter, tile_rect: Rect, mark: &str, color: Color32) {
    painter.rect_filled(tile_rect, 0.0, Color32::from_gray(220));
    painter.rect_stroke(
        tile_rect,
        0.0,
        egui::Stroke::new(1.0, Color32::GRAY),
        egui::StrokeKind::Inside,
    );
    painter.text(
        tile_rect.center(),
        egui::Align2::CENTER_CENTER,
        mark,
        egui::FontId::proportional(40.0),
        color,
    );
}
