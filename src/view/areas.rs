//! Park polygons, markers and labels.

use egui::{Color32, FontId, Mesh, Painter, Pos2, Rect, Shape, Stroke, vec2};
use log::warn;

use crate::catalog::{Area, AreaId, Catalog};
use crate::projection::{Coordinate, MapProjection};

/// Radius of a park marker in screen points.
pub(crate) const MARKER_RADIUS: f32 = 10.0;

const BOUNDARY_STROKE: Color32 = Color32::from_rgb(255, 0, 0);
const BOUNDARY_FILL: Color32 = Color32::from_rgba_premultiplied(76, 0, 0, 76);
const MARKER_FILL: Color32 = Color32::from_rgb(255, 140, 0);
const SELECTED_FILL: Color32 = Color32::from_rgb(74, 144, 226);
const DEVICE_FILL: Color32 = Color32::from_rgb(0, 0, 255);

/// Draws the boundary polygon of `area`, outlined and filled.
pub(crate) fn draw_boundary(painter: &Painter, projection: &MapProjection, area: &Area) {
    let points: Vec<Pos2> = area
        .boundary
        .iter()
        .map(|p| projection.project(*p))
        .collect();

    // Triangulate for the fill.
    let flat: Vec<f64> = points
        .iter()
        .flat_map(|p| [p.x as f64, p.y as f64])
        .collect();
    match earcutr::earcut(&flat, &[], 2) {
        Ok(indices) => {
            let mut mesh = Mesh::default();
            mesh.vertices = points
                .iter()
                .map(|p| egui::epaint::Vertex {
                    pos: *p,
                    uv: Default::default(),
                    color: BOUNDARY_FILL,
                })
                .collect();
            mesh.indices = indices.into_iter().map(|i| i as u32).collect();
            painter.add(Shape::Mesh(mesh.into()));
        }
        Err(e) => warn!("Unable to triangulate area {} ({}): {:?}", area.id, area.name, e),
    }

    painter.add(Shape::closed_line(points, Stroke::new(2.0, BOUNDARY_STROKE)));
}

/// Draws the marker of `area`, and its name when `show_name` is set.
pub(crate) fn draw_marker(
    painter: &Painter,
    projection: &MapProjection,
    area: &Area,
    selected: bool,
    show_name: bool,
) {
    let center = projection.project(area.centroid);
    let fill = if selected { SELECTED_FILL } else { MARKER_FILL };
    painter.circle(center, MARKER_RADIUS, fill, Stroke::new(2.0, Color32::WHITE));

    if show_name {
        let galley = painter.layout_no_wrap(
            area.name.clone(),
            FontId::proportional(14.0),
            Color32::BLACK,
        );
        let pos = center + vec2(-galley.size().x / 2.0, MARKER_RADIUS + 2.0);
        let background = Rect::from_min_size(pos, galley.size()).expand2(vec2(4.0, 2.0));
        painter.rect_filled(background, 4.0, Color32::WHITE);
        painter.galley(pos, galley, Color32::BLACK);
    }
}

/// Draws the device position.
pub(crate) fn draw_device(painter: &Painter, projection: &MapProjection, position: Coordinate) {
    painter.circle(
        projection.project(position),
        MARKER_RADIUS,
        DEVICE_FILL,
        Stroke::new(2.0, Color32::WHITE),
    );
}

/// The marker under `screen_pos`, if any. When markers overlap, the one drawn last wins.
pub(crate) fn marker_at(
    catalog: &Catalog,
    projection: &MapProjection,
    screen_pos: Pos2,
) -> Option<AreaId> {
    let tolerance_sq = (MARKER_RADIUS * 1.5).powi(2);
    catalog
        .iter()
        .rev()
        .find(|area| projection.project(area.centroid).distance_sq(screen_pos) < tolerance_sq)
        .map(|area| area.id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::square;
    use crate::viewport::Region;
    use egui::pos2;

    fn setup() -> (Catalog, MapProjection) {
        let catalog = Catalog::new(vec![
            square("Stanley Park", 1, 49.300, -123.140),
            square("Overlapping", 2, 49.300, -123.140),
            square("Far Away", 3, 49.310, -123.100),
        ])
        .unwrap();
        let region = Region::new(Coordinate::new(49.30, -123.14), 0.005, 0.005).unwrap();
        let rect = Rect::from_min_max(pos2(0.0, 0.0), pos2(400.0, 400.0));
        (catalog, MapProjection::fit(&region, rect))
    }

    #[test]
    fn hit_on_marker_center() {
        let (catalog, projection) = setup();
        assert_eq!(
            marker_at(&catalog, &projection, pos2(200.0, 200.0)),
            Some(AreaId(2))
        );
    }

    #[test]
    fn hit_within_tolerance() {
        let (catalog, projection) = setup();
        assert_eq!(
            marker_at(&catalog, &projection, pos2(210.0, 205.0)),
            Some(AreaId(2))
        );
    }

    #[test]
    fn miss_away_from_markers() {
        let (catalog, projection) = setup();
        assert_eq!(marker_at(&catalog, &projection, pos2(20.0, 20.0)), None);
    }
}
