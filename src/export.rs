use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use image::{ImageBuffer, Rgb, RgbImage};

use crate::error::{CityGenError, Result};
use crate::geometry::{Point2, Rect};
use crate::pipeline::CityLayout;
use crate::zones::ZoneTier;

const ROAD_COLOR: [u8; 3] = [70, 70, 76];
const DIAGONAL_COLOR: [u8; 3] = [95, 90, 80];
const OUTLINE_COLOR: [u8; 3] = [30, 30, 34];

/// Largest image side the plan renderer will produce
pub const MAX_PLAN_PIXELS: u32 = 8192;

/// Write the full layout as pretty-printed JSON.
pub fn write_layout_json<P: AsRef<Path>>(layout: &CityLayout, path: P) -> Result<()> {
    let writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(writer, layout)?;
    Ok(())
}

/// Ground tint behind the buildings of each tier
fn ground_color(tier: ZoneTier) -> [u8; 3] {
    match tier {
        ZoneTier::Business => [196, 188, 176],
        ZoneTier::Commercial => [206, 200, 170],
        ZoneTier::Residential => [178, 204, 160],
    }
}

/// Maps world coordinates onto image pixels, y pointing down
struct PlanProjection {
    origin: Point2,
    top: f64,
    scale: f64,
    width: u32,
    height: u32,
}

impl PlanProjection {
    fn new(bounds: Rect, px_per_unit: f64) -> Self {
        let width = (bounds.width() * px_per_unit).ceil().max(1.0) as u32;
        let height = (bounds.height() * px_per_unit).ceil().max(1.0) as u32;
        Self {
            origin: bounds.min,
            top: bounds.max.y,
            scale: px_per_unit,
            width,
            height,
        }
    }

    /// Pixel column/row range covered by a world rectangle
    fn pixel_span(&self, rect: &Rect) -> (u32, u32, u32, u32) {
        let x0 = ((rect.min.x - self.origin.x) * self.scale).floor().max(0.0) as u32;
        let x1 = (((rect.max.x - self.origin.x) * self.scale).ceil() as u32).min(self.width);
        let y0 = ((self.top - rect.max.y) * self.scale).floor().max(0.0) as u32;
        let y1 = (((self.top - rect.min.y) * self.scale).ceil() as u32).min(self.height);
        (x0, x1, y0, y1)
    }

    /// World position of a pixel center
    fn world(&self, px: u32, py: u32) -> Point2 {
        Point2::new(
            self.origin.x + (px as f64 + 0.5) / self.scale,
            self.top - (py as f64 + 0.5) / self.scale,
        )
    }
}

fn fill_rect(img: &mut RgbImage, proj: &PlanProjection, rect: &Rect, color: [u8; 3]) {
    let (x0, x1, y0, y1) = proj.pixel_span(rect);
    for y in y0..y1 {
        for x in x0..x1 {
            img.put_pixel(x, y, Rgb(color));
        }
    }
}

fn outline_rect(img: &mut RgbImage, proj: &PlanProjection, rect: &Rect, color: [u8; 3]) {
    let (x0, x1, y0, y1) = proj.pixel_span(rect);
    if x1 <= x0 || y1 <= y0 {
        return;
    }
    for x in x0..x1 {
        img.put_pixel(x, y0, Rgb(color));
        img.put_pixel(x, y1 - 1, Rgb(color));
    }
    for y in y0..y1 {
        img.put_pixel(x0, y, Rgb(color));
        img.put_pixel(x1 - 1, y, Rgb(color));
    }
}

/// Rasterize a top-down plan of the district.
///
/// Zones are tinted by tier, roads drawn over them, then building footprints in
/// their palette color with a dark outline.
pub fn render_plan_image(layout: &CityLayout, px_per_unit: f64) -> Result<RgbImage> {
    if !px_per_unit.is_finite() || px_per_unit <= 0.0 {
        return Err(CityGenError::config(format!(
            "pixels per unit must be positive, got {px_per_unit}"
        )));
    }
    let bounds = layout.roads.bounds();
    let proj = PlanProjection::new(bounds, px_per_unit);
    if proj.width > MAX_PLAN_PIXELS || proj.height > MAX_PLAN_PIXELS {
        return Err(CityGenError::config(format!(
            "plan would be {}x{} pixels, limit is {MAX_PLAN_PIXELS}",
            proj.width, proj.height
        )));
    }

    let mut img: RgbImage = ImageBuffer::from_pixel(proj.width, proj.height, Rgb(ROAD_COLOR));

    for zone in layout.zones.iter() {
        fill_rect(&mut img, &proj, &zone.bounds(), ground_color(zone.tier));
    }

    for segment in layout.roads.horizontal.iter().chain(layout.roads.vertical.iter()) {
        fill_rect(&mut img, &proj, &segment.footprint(&bounds), ROAD_COLOR);
    }

    for road in &layout.roads.diagonals {
        for y in 0..proj.height {
            for x in 0..proj.width {
                if road.covers(proj.world(x, y)) {
                    img.put_pixel(x, y, Rgb(DIAGONAL_COLOR));
                }
            }
        }
    }

    for (zone, building) in layout.all_buildings() {
        let rect = building.placement.world_rect();
        fill_rect(&mut img, &proj, &rect, building.color(zone.tier));
        outline_rect(&mut img, &proj, &rect, OUTLINE_COLOR);
    }

    Ok(img)
}

/// Render the plan and save it as a PNG
pub fn export_plan_png<P: AsRef<Path>>(
    layout: &CityLayout,
    px_per_unit: f64,
    path: P,
) -> Result<()> {
    let img = render_plan_image(layout, px_per_unit)?;
    img.save(path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CapacityLimits, GridSpec, RoadPerturbationMode};
    use crate::pipeline::generate_city;

    fn layout(mode: RoadPerturbationMode) -> CityLayout {
        let spec = GridSpec::builder().size(3, 2).road_mode(mode).seed(3).build();
        generate_city(&spec, &CapacityLimits::default()).unwrap()
    }

    #[test]
    fn test_plan_size_follows_bounds() {
        let layout = layout(RoadPerturbationMode::None);
        let img = render_plan_image(&layout, 2.0).unwrap();
        assert_eq!(img.width(), 120);
        assert_eq!(img.height(), 80);
    }

    #[test]
    fn test_plan_shows_roads_and_buildings() {
        let layout = layout(RoadPerturbationMode::None);
        let img = render_plan_image(&layout, 2.0).unwrap();
        // Outer boundary road runs along the left edge
        assert_eq!(img.get_pixel(0, 40).0, ROAD_COLOR);

        let (zone, building) = layout.all_buildings().next().unwrap();
        let proj = PlanProjection::new(layout.roads.bounds(), 2.0);
        let c = building.placement.center;
        let px = ((c.x - proj.origin.x) * 2.0) as u32;
        let py = ((proj.top - c.y) * 2.0) as u32;
        assert_eq!(img.get_pixel(px, py).0, building.color(zone.tier));
    }

    #[test]
    fn test_diagonals_are_drawn() {
        let layout = layout(RoadPerturbationMode::DiagonalOverlay);
        assert!(!layout.roads.diagonals.is_empty());
        let img = render_plan_image(&layout, 1.0).unwrap();
        assert!(img.pixels().any(|p| p.0 == DIAGONAL_COLOR));
    }

    #[test]
    fn test_rejects_bad_scale() {
        let layout = layout(RoadPerturbationMode::None);
        assert!(render_plan_image(&layout, 0.0).is_err());
        assert!(render_plan_image(&layout, 1000.0).is_err());
    }

    #[test]
    fn test_json_round_trip_file() {
        let layout = layout(RoadPerturbationMode::OrthogonalOrganic);
        let path = std::env::temp_dir().join(format!("city_layout_{}.json", std::process::id()));
        write_layout_json(&layout, &path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let back: CityLayout = serde_json::from_str(&text).unwrap();
        let _ = std::fs::remove_file(&path);
        assert_eq!(back.report, layout.report);
        let tiers = |l: &CityLayout| {
            l.zones
                .iter()
                .map(|z| (z.grid_position, z.tier))
                .collect::<Vec<_>>()
        };
        assert_eq!(tiers(&back), tiers(&layout));
    }
}
