#![deny(warnings)]

use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{Parser, Subcommand};

use tarn::colour::ColourScheme;
use tarn::errors::TarnError;
use tarn::fetch;
use tarn::mosaic::{assemble, Area, Mosaic, MosaicOutcome};
use tarn::national_grid;
use tarn::render::render;
use tarn::stats;
use tarn::store::{DataStore, DATA_DIR_ENV, DEFAULT_DATA_ROOT};
use tarn::water::suspect_water;

/// Renders Ordnance Survey Terrain 50 altitude data as topographic
/// images, marking suspected water bodies.
#[derive(Parser)]
#[command(name = "tarn", version)]
struct Cli {
    /// Root folder holding the Terrain 50 data (defaults to
    /// TERRAIN50_DATA_DIR or ./OSData/Altitudes)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render an area of the national grid to a PNG image
    Render {
        /// Basis square: 100km like NY, or 10km like NY12
        square: String,
        /// Area size in basis squares, east x north
        #[arg(long, default_value = "")]
        dimensions: String,
        /// Colour scheme name
        #[arg(long, default_value = "standard")]
        scheme: String,
        /// Folder the PNG is written into
        #[arg(long, default_value = "pngs")]
        out: PathBuf,
        /// Skip water detection and colour by altitude alone
        #[arg(long)]
        no_water: bool,
    },
    /// Print an altitude distribution report for an area
    Stats {
        /// Basis square: 100km like NY, or 10km like NY12
        square: String,
        /// Area size in basis squares, east x north
        #[arg(long, default_value = "")]
        dimensions: String,
    },
    /// Download and unpack the Terrain 50 dataset if not present
    Fetch,
    /// Show the layout of the 100km national grid squares
    Grid,
}

fn data_root(cli_dir: &Option<PathBuf>) -> PathBuf {
    if let Some(dir) = cli_dir {
        return dir.clone();
    }
    match std::env::var(DATA_DIR_ENV) {
        Ok(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => PathBuf::from(DEFAULT_DATA_ROOT),
    }
}

fn load_mosaic(
    root: &Path,
    square: &str,
    dimensions: &str,
) -> Result<Option<(Area, Mosaic)>, TarnError> {
    let area = Area::from_parameters(square, dimensions)?;
    let store = DataStore::new(root);

    let start = Instant::now();
    let outcome = assemble(&store, &area)?;
    match outcome {
        MosaicOutcome::AllSea => {
            println!("No GB land covered by {}", area.title());
            Ok(None)
        }
        MosaicOutcome::Ok(mosaic) => {
            println!(
                "Read {} squares in {:.3}s",
                mosaic.statuses.len(),
                start.elapsed().as_secs_f64()
            );
            Ok(Some((area, mosaic)))
        }
    }
}

fn run(cli: &Cli) -> Result<(), TarnError> {
    let root = data_root(&cli.data_dir);

    match &cli.command {
        Command::Render {
            square,
            dimensions,
            scheme,
            out,
            no_water,
        } => {
            let scheme =
                ColourScheme::named(scheme).ok_or_else(|| {
                    TarnError::new(&format!(
                        "Unknown colour scheme: {}",
                        scheme
                    ))
                })?;

            let (area, mosaic) =
                match load_mosaic(&root, square, dimensions)? {
                    Some(loaded) => loaded,
                    None => return Ok(()),
                };

            let water = if *no_water {
                None
            } else {
                let start = Instant::now();
                let mask = suspect_water(&mosaic.grid);
                println!(
                    "Flagged {} cells as suspected water in {:.3}s",
                    mask.water_cell_count(),
                    start.elapsed().as_secs_f64()
                );
                Some(mask)
            };

            let start = Instant::now();
            let bitmap = render(
                &mosaic.grid,
                water.as_ref(),
                scheme,
                mosaic.max_altitude,
            );

            std::fs::create_dir_all(out).map_err(|e| {
                TarnError::new(&format!(
                    "Failed to create output folder {}: {}",
                    out.display(),
                    e
                ))
            })?;

            let file_stem = if scheme.name == "standard" {
                area.title().replace(' ', "_")
            } else {
                format!("{}_{}", area.title().replace(' ', "_"), scheme.name)
            };
            let png_path = out.join(format!("{}.png", file_stem));
            let png_name = png_path.to_string_lossy().to_string();
            bitmap.write_to_png(&png_name).map_err(|e| {
                TarnError::new(&format!(
                    "Failed to write {}: {}",
                    png_name, e
                ))
            })?;

            println!(
                "Generated {} in {:.3}s",
                png_name,
                start.elapsed().as_secs_f64()
            );
            Ok(())
        }
        Command::Stats { square, dimensions } => {
            let (area, mosaic) =
                match load_mosaic(&root, square, dimensions)? {
                    Some(loaded) => loaded,
                    None => return Ok(()),
                };

            match stats::analyse(&mosaic.grid) {
                Some(report) => {
                    println!("{}", area.title());
                    print!("{}", report);
                }
                None => println!("No altitude data in {}", area.title()),
            }
            Ok(())
        }
        Command::Fetch => {
            let data_dir = fetch::ensure_dataset(&root)?;
            println!("Dataset ready under {}", data_dir.display());
            Ok(())
        }
        Command::Grid => {
            print!("{}", national_grid::grid_layout());
            Ok(())
        }
    }
}

fn main() {
    // Pick up TERRAIN50_DATA_DIR from a .env file when there is one.
    dotenv::dotenv().ok();

    let cli = Cli::parse();
    if let Err(e) = run(&cli) {
        eprintln!("*** {}", e);
        std::process::exit(1);
    }
}
