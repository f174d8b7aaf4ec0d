#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")] // hide console window on Windows in release
#![allow(rustdoc::missing_crate_level_docs)] // it's an example

//! Usage: `cargo run --example park_finder [catalog.json]`
//!
//! Without an argument a small built-in set of parks is shown. The locate button reports a
//! fixed position, since desktops rarely have positioning hardware.

use std::sync::Arc;

use eframe::egui;
use eyre::{Result, eyre};
use park_map_view::{
    Catalog, Coordinate, ParkMap, config::OpenStreetMapConfig,
    location::FixedLocationService,
};

fn main() -> Result<()> {
    env_logger::init();

    let catalog = match std::env::args().nth(1) {
        Some(path) => Catalog::load(path)?,
        None => Catalog::from_json(include_str!("parks.json"))?,
    };

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([800.0, 600.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Off-leash park finder",
        options,
        Box::new(|_cc| Ok(Box::new(MyApp::new(catalog)))),
    )
    .map_err(|e| eyre!("{e}"))
}

struct MyApp {
    map: ParkMap,
}

impl MyApp {
    fn new(catalog: Catalog) -> Self {
        // Kitsilano, Vancouver.
        let here = Coordinate::new(49.2684, -123.1680);
        let map = ParkMap::new(catalog, OpenStreetMapConfig::default())
            .with_location_service(Arc::new(FixedLocationService::new(here)));
        Self { map }
    }
}

impl eframe::App for MyApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        egui::SidePanel::left("parks")
            .resizable(false)
            .default_width(220.0)
            .show(ctx, |ui| {
                ui.heading("Parks");
                let areas = self.map.state().catalog().clone();
                let selected = self
                    .map
                    .state()
                    .selection()
                    .selected()
                    .map(|area| area.id);
                for area in areas.iter() {
                    if ui
                        .selectable_label(selected == Some(area.id), area.name.as_str())
                        .clicked()
                    {
                        self.map.state_mut().tap_marker(area.id);
                    }
                }

                ui.separator();
                let snapshot = self.map.state().snapshot();
                ui.label(format!(
                    "Span: {:.4}° x {:.4}°",
                    snapshot.region.lat_span(),
                    snapshot.region.lon_span()
                ));
                if snapshot.selection.is_checked_in() {
                    ui.label("Checked in");
                }
            });

        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| {
                ui.add(&mut self.map);
            });
    }
}
