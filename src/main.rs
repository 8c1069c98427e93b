use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use city_generator::config::{CityConfig, RoadPerturbationMode, VarietyLevel};
use city_generator::{ascii, export, pipeline, CityGenError};

#[derive(Parser, Debug)]
#[command(name = "city_generator")]
#[command(about = "Generate procedural city districts: roads, zones and buildings")]
struct Args {
    /// Load parameters from a JSON config file; flags override its values
    #[arg(short, long)]
    config: Option<String>,

    /// Blocks along x
    #[arg(short = 'W', long)]
    width: Option<usize>,

    /// Blocks along y
    #[arg(short = 'L', long)]
    length: Option<usize>,

    /// Road-center to road-center spacing in meters
    #[arg(long)]
    block_size: Option<f64>,

    /// Nominal road width in meters
    #[arg(long)]
    road_width: Option<f64>,

    /// Organic road curvature (0-1)
    #[arg(long)]
    curve: Option<f64>,

    /// Fraction of requested lots actually built (0-1]
    #[arg(short, long)]
    density: Option<f64>,

    /// Building archetype variety
    #[arg(long, value_enum)]
    variety: Option<VarietyLevel>,

    /// Buildings requested per block
    #[arg(short = 'b', long)]
    buildings_per_block: Option<usize>,

    /// Spread of floor counts within a tier (0-1)
    #[arg(long)]
    height_variation: Option<f64>,

    /// Road perturbation mode
    #[arg(long, value_enum)]
    mode: Option<RoadPerturbationMode>,

    /// Random seed (uses random seed if not specified and none is configured)
    #[arg(short, long)]
    seed: Option<u64>,

    /// Hard ceiling on the number of blocks
    #[arg(long)]
    max_blocks: Option<usize>,

    /// Export the full layout as JSON
    #[arg(long)]
    export_json: Option<String>,

    /// Export a top-down plan as PNG
    #[arg(long)]
    export_png: Option<String>,

    /// Pixels per meter for the PNG plan
    #[arg(long, default_value = "4")]
    png_scale: f64,

    /// Export a text report with an ASCII plan and statistics
    #[arg(long)]
    export_ascii: Option<String>,

    /// Width of the ASCII plan in characters
    #[arg(long, default_value = "120")]
    ascii_cols: usize,

    /// Save the effective configuration to a JSON file
    #[arg(long)]
    save_config: Option<String>,

    /// Print the ASCII plan to stdout
    #[arg(long)]
    print: bool,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
}

fn build_config(args: &Args) -> Result<CityConfig, CityGenError> {
    let mut config = match &args.config {
        Some(path) => {
            info!(path = %path, "loading config");
            CityConfig::from_json_file(path)?
        }
        None => CityConfig::default(),
    };

    let grid = &mut config.grid;
    if let Some(width) = args.width {
        grid.width = width;
    }
    if let Some(length) = args.length {
        grid.length = length;
    }
    if let Some(block_size) = args.block_size {
        grid.block_size = block_size;
    }
    if let Some(road_width) = args.road_width {
        grid.road_width = road_width;
    }
    if let Some(curve) = args.curve {
        grid.curve_intensity = curve;
    }
    if let Some(density) = args.density {
        grid.density = density;
    }
    if let Some(variety) = args.variety {
        grid.variety_level = variety;
    }
    if let Some(count) = args.buildings_per_block {
        grid.buildings_per_block = count;
    }
    if let Some(variation) = args.height_variation {
        grid.height_variation = variation;
    }
    if let Some(mode) = args.mode {
        grid.road_mode = mode;
    }
    match args.seed {
        Some(seed) => grid.seed = seed,
        None if args.config.is_none() => grid.seed = rand::random(),
        None => {}
    }
    if let Some(max_blocks) = args.max_blocks {
        config.limits.max_blocks = max_blocks;
    }
    Ok(config)
}

fn run(args: &Args) -> Result<(), CityGenError> {
    let config = build_config(args)?;
    let grid = &config.grid;

    println!("Generating district with seed: {}", grid.seed);
    println!("Grid size: {}x{} blocks of {:.1} m", grid.width, grid.length, grid.block_size);

    if let Some(path) = &args.save_config {
        config.to_json_file(path)?;
        println!("Saved config to {}", path);
    }

    let layout = pipeline::generate_city(grid, &config.limits)?;
    print!("{}", layout.summary());

    if args.print {
        println!();
        print!("{}", ascii::render_plan(&layout, args.ascii_cols));
    }

    if let Some(path) = &args.export_json {
        println!("Exporting layout to {}...", path);
        export::write_layout_json(&layout, path)?;
    }
    if let Some(path) = &args.export_png {
        println!("Exporting plan to {}...", path);
        export::export_plan_png(&layout, args.png_scale, path)?;
    }
    if let Some(path) = &args.export_ascii {
        println!("Exporting report to {}...", path);
        ascii::export_report_file(&layout, path, args.ascii_cols, args.verbose > 0)?;
    }

    println!("Done!");
    Ok(())
}

fn main() {
    let args = Args::parse();
    init_logging(args.verbose);

    if let Err(e) = run(&args) {
        if e.is_structural() {
            error!(error = %e, "generation aborted on a broken invariant");
        }
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
