use rayon::prelude::*;

use crate::altitude_grid::{AltitudeGrid, AscHeader};
use crate::consts::{DATA_SQUARE_KM, GRID_SQUARE_KM, MAX_AREA_KM};
use crate::errors::TarnError;
use crate::national_grid::{grid_square, SquareRef};
use crate::store::{SquareReading, SquareSource};

/// A rectangular area of 10km squares to be processed together.
#[derive(Clone, Debug, PartialEq)]
pub struct Area {
    pub south_west: SquareRef,
    pub squares_east: u32,
    pub squares_north: u32,
    title: String,
}

impl Area {
    /// Resolves a basis square name (100km like `NY`, or 10km like `NY12`)
    /// and a `WxH` dimension string counting basis-sized squares east and
    /// north. An empty dimension string means 1x1.
    pub fn from_parameters(
        basis: &str,
        dimensions: &str,
    ) -> Result<Area, TarnError> {
        let (south_west, square_km) = match grid_square(basis) {
            Some(square) => {
                let corner: SquareRef =
                    format!("{}00", square).parse().map_err(|e: String| {
                        TarnError::new(&e)
                    })?;
                (corner, GRID_SQUARE_KM)
            }
            None => {
                let corner: SquareRef = basis.parse().map_err(
                    |_: String| {
                        TarnError::new(&format!(
                            "Invalid square name: {}",
                            basis
                        ))
                    },
                )?;
                (corner, DATA_SQUARE_KM)
            }
        };

        let dims = if dimensions.is_empty() { "1x1" } else { dimensions };
        let (east, north) = parse_dimensions(dims, square_km)?;

        // Dimensions are in basis-sized squares; the mosaic works in the
        // 10km squares the dataset is shipped in.
        let multiplier = square_km / DATA_SQUARE_KM;
        let title = if dimensions.is_empty() {
            basis.to_uppercase()
        } else {
            format!("{} {}", basis.to_uppercase(), dimensions)
        };

        Ok(Area {
            south_west,
            squares_east: east * multiplier,
            squares_north: north * multiplier,
            title,
        })
    }

    /// Human-readable name of the area, used for titles and file names.
    pub fn title(&self) -> &str {
        &self.title
    }
}

fn parse_dimensions(
    dimensions: &str,
    square_km: u32,
) -> Result<(u32, u32), TarnError> {
    let invalid = || {
        TarnError::new(&format!("Invalid dimensions: {}", dimensions))
    };

    let mut parts = dimensions.splitn(2, ['x', 'X']);
    let east: u32 = parts
        .next()
        .and_then(|p| p.parse().ok())
        .ok_or_else(invalid)?;
    let north: u32 = parts
        .next()
        .and_then(|p| p.parse().ok())
        .ok_or_else(invalid)?;

    if east == 0 || north == 0 {
        return Err(invalid());
    }
    let km = |squares: u32| squares as u64 * square_km as u64;
    if km(east) > MAX_AREA_KM as u64 || km(north) > MAX_AREA_KM as u64 {
        return Err(TarnError::new(&format!(
            "Area too large: {} of {}km squares",
            dimensions, square_km
        )));
    }

    Ok((east, north))
}

/// Outcome of reading one 10km square of an area.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SquareStatus {
    /// The square lies beyond the national grid.
    OffGrid,
    /// No data file: the square is entirely at sea.
    Sea,
    Ok,
    /// The data file was unreadable or disagreed with its neighbours.
    Error,
}

/// An assembled area: one combined altitude grid plus per-square statuses
/// (row-major, row 0 = the southern row of squares).
pub struct Mosaic {
    pub grid: AltitudeGrid,
    pub statuses: Vec<SquareStatus>,
    pub squares_east: u32,
    pub squares_north: u32,
    pub min_altitude: f32,
    pub max_altitude: f32,
}

impl Mosaic {
    pub fn status_at(&self, east: u32, north: u32) -> SquareStatus {
        self.statuses[(north * self.squares_east + east) as usize]
    }
}

pub enum MosaicOutcome {
    Ok(Mosaic),
    /// Every square in the area is at sea; there is nothing to draw.
    AllSea,
}

enum Reading {
    OffGrid,
    Sea,
    Grid(AscHeader, AltitudeGrid),
    Error,
}

/// Reads every 10km square of the area from the source (in parallel) and
/// assembles one combined grid. Individual unreadable squares are
/// reported and recorded as errors without failing the whole area; the
/// result is an error only when nothing loads and something failed.
pub fn assemble<S: SquareSource>(
    source: &S,
    area: &Area,
) -> Result<MosaicOutcome, TarnError> {
    let squares: Vec<Option<SquareRef>> = (0..area.squares_north)
        .flat_map(|north| {
            (0..area.squares_east).map(move |east| (east, north))
        })
        .map(|(east, north)| area.south_west.step(east, north))
        .collect();

    let readings: Vec<Reading> = squares
        .par_iter()
        .map(|square| match square {
            None => Reading::OffGrid,
            Some(square) => match source.read_square(square) {
                Ok(SquareReading::Sea) => Reading::Sea,
                Ok(SquareReading::Grid(header, grid)) => {
                    Reading::Grid(header, grid)
                }
                Err(e) => {
                    eprintln!("*** {}: {}", square, e);
                    Reading::Error
                }
            },
        })
        .collect();

    // The first loaded square fixes the per-square characteristics every
    // other square must agree with.
    let first_header = readings.iter().find_map(|r| match r {
        Reading::Grid(header, _) => Some(header.clone()),
        _ => None,
    });

    let header = match first_header {
        Some(header) => header,
        None => {
            let any_errors = readings
                .iter()
                .any(|r| matches!(r, Reading::Error));
            if any_errors {
                return Err(TarnError::new(
                    "No usable altitude data found for the area",
                ));
            }
            return Ok(MosaicOutcome::AllSea);
        }
    };

    let mut grid = AltitudeGrid::new(
        header.ncols * area.squares_east,
        header.nrows * area.squares_north,
        header.cellsize,
    );
    let mut statuses = Vec::with_capacity(readings.len());
    let mut min_altitude = f32::MAX;
    let mut max_altitude = f32::MIN;

    for (index, reading) in readings.into_iter().enumerate() {
        let east = index as u32 % area.squares_east;
        let north = index as u32 / area.squares_east;

        let status = match reading {
            Reading::OffGrid => SquareStatus::OffGrid,
            Reading::Sea => SquareStatus::Sea,
            Reading::Error => SquareStatus::Error,
            Reading::Grid(square_header, square_grid) => {
                if square_header.ncols != header.ncols
                    || square_header.nrows != header.nrows
                    || square_header.cellsize != header.cellsize
                {
                    eprintln!(
                        "*** Data squares have different characteristics: \
                         {}x{} cell {} v {}x{} cell {}",
                        square_header.ncols,
                        square_header.nrows,
                        square_header.cellsize,
                        header.ncols,
                        header.nrows,
                        header.cellsize
                    );
                    SquareStatus::Error
                } else {
                    if let Some((min, max)) = square_grid.altitude_range() {
                        min_altitude = min_altitude.min(min);
                        max_altitude = max_altitude.max(max);
                    }
                    grid.blit(
                        east * header.ncols,
                        north * header.nrows,
                        &square_grid,
                    );
                    SquareStatus::Ok
                }
            }
        };
        statuses.push(status);
    }

    Ok(MosaicOutcome::Ok(Mosaic {
        grid,
        statuses,
        squares_east: area.squares_east,
        squares_north: area.squares_north,
        min_altitude,
        max_altitude,
    }))
}
