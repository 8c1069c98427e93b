//! ASCII rendering and export for district layouts
//!
//! Renders a top-down character plan and writes a text report with the plan,
//! a legend and statistics.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use chrono::Local;

use crate::geometry::Point2;
use crate::pipeline::{describe, CityLayout};
use crate::variety::Archetype;
use crate::zones::ZoneTier;

/// Terminal cells are roughly twice as tall as they are wide
const CELL_ASPECT: f64 = 2.0;

const ROAD_CHAR: char = '#';
const DIAGONAL_CHAR: char = '*';

/// Ground character for open space in a zone
pub fn ground_char(tier: ZoneTier) -> char {
    match tier {
        ZoneTier::Business => ':',
        ZoneTier::Commercial => '.',
        ZoneTier::Residential => ' ',
    }
}

/// Character shown for a building: its archetype glyph, upper-cased in the business core
pub fn building_char(archetype: Archetype, tier: ZoneTier) -> char {
    let glyph = archetype.glyph();
    if tier == ZoneTier::Business {
        glyph.to_ascii_uppercase()
    } else {
        glyph
    }
}

/// What occupies a world position
fn sample(layout: &CityLayout, p: Point2) -> char {
    for (zone, building) in layout.all_buildings() {
        if building.placement.world_rect().contains_point(p) {
            return building_char(building.archetype, zone.tier);
        }
    }
    if layout.roads.diagonals.iter().any(|road| road.covers(p)) {
        return DIAGONAL_CHAR;
    }
    let bounds = layout.roads.bounds();
    let on_road = layout
        .roads
        .horizontal
        .iter()
        .chain(layout.roads.vertical.iter())
        .any(|segment| segment.footprint(&bounds).contains_point(p));
    if on_road {
        return ROAD_CHAR;
    }
    layout
        .zones
        .iter()
        .find(|zone| zone.bounds().contains_point(p))
        .map(|zone| ground_char(zone.tier))
        .unwrap_or(ROAD_CHAR)
}

/// Render the district plan `cols` characters wide, north at the top
pub fn render_plan(layout: &CityLayout, cols: usize) -> String {
    let bounds = layout.roads.bounds();
    let cols = cols.max(1);
    let cell_w = bounds.width() / cols as f64;
    let cell_h = cell_w * CELL_ASPECT;
    let rows = ((bounds.height() / cell_h).round() as usize).max(1);
    let cell_h = bounds.height() / rows as f64;

    let mut result = String::with_capacity((cols + 1) * rows);
    for row in 0..rows {
        let y = bounds.max.y - (row as f64 + 0.5) * cell_h;
        for col in 0..cols {
            let x = bounds.min.x + (col as f64 + 0.5) * cell_w;
            result.push(sample(layout, Point2::new(x, y)));
        }
        result.push('\n');
    }
    result
}

/// Legend for the plan characters
pub fn plan_legend() -> String {
    let mut legend = String::new();
    legend.push_str("=== LEGEND ===\n");
    legend.push_str(&format!("  {} Road    {} Diagonal avenue\n", ROAD_CHAR, DIAGONAL_CHAR));
    legend.push_str(&format!(
        "  '{}' Business ground  '{}' Commercial ground  '{}' Residential ground\n",
        ground_char(ZoneTier::Business),
        ground_char(ZoneTier::Commercial),
        ground_char(ZoneTier::Residential)
    ));
    legend.push_str("BUILDINGS (upper case in the business core):\n");
    for archetype in Archetype::all() {
        legend.push_str(&format!("  {} {}\n", archetype.glyph(), archetype.display_name()));
    }
    legend
}

/// Building counts per archetype
pub fn archetype_stats(layout: &CityLayout) -> BTreeMap<&'static str, usize> {
    let mut stats = BTreeMap::new();
    for (_, building) in layout.all_buildings() {
        *stats.entry(building.archetype.display_name()).or_insert(0) += 1;
    }
    stats
}

/// Write a text report: header, plan, legend, statistics and optionally one row per building
pub fn export_report_file<P: AsRef<Path>>(
    layout: &CityLayout,
    path: P,
    cols: usize,
    verbose: bool,
) -> io::Result<()> {
    let mut file = BufWriter::new(File::create(path)?);
    let spec = &layout.spec;
    let bounds = layout.roads.bounds();

    // Header
    writeln!(file, "=== CITY DISTRICT FILE ===")?;
    writeln!(file, "Seed: {}", spec.seed)?;
    writeln!(file, "Size: {}x{} blocks", spec.width, spec.length)?;
    writeln!(
        file,
        "Block: {:.1} m, road {:.1} m ({:.0} x {:.0} m)",
        spec.block_size,
        spec.road_width,
        bounds.width(),
        bounds.height()
    )?;
    writeln!(file, "Variety: {}", spec.variety_level.name())?;
    writeln!(file, "Generated: {}", Local::now().format("%Y-%m-%d %H:%M:%S"))?;
    writeln!(file)?;

    writeln!(file, "=== MAP ===")?;
    write!(file, "{}", render_plan(layout, cols))?;
    writeln!(file)?;

    write!(file, "{}", plan_legend())?;
    writeln!(file)?;

    // Statistics
    writeln!(file, "=== STATISTICS ===")?;
    let tiers = layout.report.tier_counts;
    writeln!(file, "Zones: {}", layout.report.zone_count)?;
    writeln!(file, "  Business:    {:>4}", tiers.business)?;
    writeln!(file, "  Commercial:  {:>4}", tiers.commercial)?;
    writeln!(file, "  Residential: {:>4}", tiers.residential)?;
    writeln!(file, "Buildings: {}", layout.building_count())?;

    let total = layout.building_count().max(1);
    let mut sorted: Vec<_> = archetype_stats(layout).into_iter().collect();
    sorted.sort_by(|a, b| b.1.cmp(&a.1)); // Sort by count descending
    for (name, count) in sorted {
        let pct = 100.0 * count as f64 / total as f64;
        writeln!(file, "  {:12} {:>4} ({:>5.1}%)", name, count, pct)?;
    }

    let floors: Vec<u32> = layout.all_buildings().map(|(_, b)| b.placement.floor_count).collect();
    if let (Some(min), Some(max)) = (floors.iter().min(), floors.iter().max()) {
        let mean = floors.iter().map(|f| *f as f64).sum::<f64>() / floors.len() as f64;
        writeln!(file, "Floors: min {}  max {}  mean {:.1}", min, max, mean)?;
    }
    writeln!(file)?;

    if !layout.report.diagnostics.is_empty() {
        writeln!(file, "=== NOTES ===")?;
        for diagnostic in &layout.report.diagnostics {
            writeln!(file, "- {}", describe(diagnostic))?;
        }
        writeln!(file)?;
    }

    if verbose {
        writeln!(file, "=== BUILDINGS ===")?;
        writeln!(file, "[zone_i,zone_j,index,x,y,width,depth,floors,height,archetype,color]")?;
        for (zone, b) in layout.all_buildings() {
            let p = &b.placement;
            let (i, j) = zone.grid_position;
            writeln!(
                file,
                "{},{},{},{:.2},{:.2},{:.2},{:.2},{},{:.1},{},{}",
                i,
                j,
                p.index,
                p.center.x,
                p.center.y,
                p.footprint.width,
                p.footprint.height,
                p.floor_count,
                p.height,
                b.archetype.display_name(),
                b.color_index
            )?;
        }
    }

    file.flush()
}
