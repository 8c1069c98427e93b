//! Profiling tool to see where generation time goes

use std::time::Duration;

use city_generator::pipeline::generate_city_timed;
use city_generator::{CapacityLimits, GridSpec, VarietyLevel};

fn pct(part: Duration, total: Duration) -> f64 {
    100.0 * part.as_secs_f64() / total.as_secs_f64().max(f64::EPSILON)
}

fn main() {
    let seed = 1337u64;
    let limits = CapacityLimits::unbounded();

    println!("=== Performance Profiling ===");
    println!();

    for size in [5usize, 10, 20, 40] {
        let spec = GridSpec::builder()
            .size(size, size)
            .curve_intensity(0.6)
            .buildings_per_block(4)
            .variety_level(VarietyLevel::Extreme)
            .seed(seed)
            .build();

        let (layout, timings) = match generate_city_timed(&spec, &limits) {
            Ok(result) => result,
            Err(e) => {
                eprintln!("{}x{}: generation failed: {}", size, size, e);
                continue;
            }
        };
        let total = timings.total();

        println!(
            "Grid {}x{} ({} zones, {} buildings)",
            size,
            size,
            layout.report.zone_count,
            layout.building_count()
        );
        println!("  Roads:     {:>8.2}% ({:?})", pct(timings.roads, total), timings.roads);
        println!("  Zones:     {:>8.2}% ({:?})", pct(timings.zones, total), timings.zones);
        println!("  Buildings: {:>8.2}% ({:?})", pct(timings.buildings, total), timings.buildings);
        println!("  ─────────────────────────────────");
        println!("  TOTAL:     {:>8}  {:?}", "100%", total);
        println!();
    }
}
