use std::collections::VecDeque;

use crate::altitude_grid::AltitudeGrid;
use crate::consts::{NO_ALTITUDE, SAME_ALTITUDE_TOLERANCE};

// Terrain 50 does not mark water. Lakes and the sea show up as regions of
// cells with exactly equal altitude, so flat neighbourhoods seed suspected
// water bodies which are then grown outwards. Flat inland terrain produces
// known false positives; that is accepted.

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WaterValue {
    Land = 0,
    Seed = 1,
    Extended = 2,
}

/// Per-cell water suspicion, same shape and orientation as the altitude
/// grid it was derived from.
#[derive(Debug)]
pub struct WaterMask {
    pub width: u32,
    pub height: u32,
    data: Box<[u8]>,
}

impl WaterMask {
    fn new(width: u32, height: u32) -> WaterMask {
        WaterMask {
            width,
            height,
            data: vec![WaterValue::Land as u8;
                width as usize * height as usize]
                .into_boxed_slice(),
        }
    }

    pub fn value_at(&self, x: u32, y: u32) -> WaterValue {
        if x >= self.width || y >= self.height {
            panic!("Cell coordinates out of bounds");
        }

        match self.data[y as usize * self.width as usize + x as usize] {
            0 => WaterValue::Land,
            1 => WaterValue::Seed,
            _ => WaterValue::Extended,
        }
    }

    pub fn is_water(&self, x: u32, y: u32) -> bool {
        self.value_at(x, y) != WaterValue::Land
    }

    fn set(&mut self, x: u32, y: u32, value: WaterValue) {
        self.data[y as usize * self.width as usize + x as usize] =
            value as u8;
    }

    /// Number of cells flagged as suspected water.
    pub fn water_cell_count(&self) -> usize {
        self.data.iter().filter(|&&v| v != WaterValue::Land as u8).count()
    }
}

fn same_altitude(a: f32, b: f32) -> bool {
    (a - b).abs() < SAME_ALTITUDE_TOLERANCE
}

/// A cell seeds a water body when at least 6 of its 8 neighbours sit at
/// the same altitude; neighbours beyond the grid edge count against, so
/// edge cells never seed (they can still be reached by extension).
fn flat_neighbourhood(
    grid: &AltitudeGrid,
    x: u32,
    y: u32,
    altitude: f32,
) -> bool {
    let mut same_count = 0;
    let mut not_same_count = 0;

    for dy in -1i64..=1 {
        for dx in -1i64..=1 {
            if dx == 0 && dy == 0 {
                continue;
            }
            if not_same_count > 2 {
                return false;
            }

            let nx = x as i64 + dx;
            let ny = y as i64 + dy;
            if nx < 0
                || ny < 0
                || nx >= grid.width as i64
                || ny >= grid.height as i64
            {
                not_same_count += 1;
                continue;
            }

            if same_altitude(altitude, grid.altitude_at(nx as u32, ny as u32))
            {
                same_count += 1;
            } else {
                not_same_count += 1;
            }
        }
    }

    same_count >= 6
}

/// Builds the water-suspicion mask for a grid: a seed pass over every
/// cell, then a flood fill extending marked cells to 8-connected
/// neighbours at the same altitude.
pub fn suspect_water(grid: &AltitudeGrid) -> WaterMask {
    let mut mask = WaterMask::new(grid.width, grid.height);
    let mut worklist: VecDeque<(u32, u32)> = VecDeque::new();

    for y in 0..grid.height {
        for x in 0..grid.width {
            let altitude = grid.altitude_at(x, y);
            // Cells without data belong to all-sea squares.
            if altitude == NO_ALTITUDE {
                mask.set(x, y, WaterValue::Seed);
            } else if flat_neighbourhood(grid, x, y, altitude) {
                mask.set(x, y, WaterValue::Seed);
                worklist.push_back((x, y));
            }
        }
    }

    // Grow each marked cell into unmarked neighbours of the same
    // altitude. No-data seeds are not on the worklist: there is no
    // altitude to match against.
    while let Some((x, y)) = worklist.pop_front() {
        let altitude = grid.altitude_at(x, y);

        for dy in -1i64..=1 {
            for dx in -1i64..=1 {
                if dx == 0 && dy == 0 {
                    continue;
                }
                let nx = x as i64 + dx;
                let ny = y as i64 + dy;
                if nx < 0
                    || ny < 0
                    || nx >= grid.width as i64
                    || ny >= grid.height as i64
                {
                    continue;
                }

                let (nx, ny) = (nx as u32, ny as u32);
                if mask.is_water(nx, ny) {
                    continue;
                }
                let neighbour = grid.altitude_at(nx, ny);
                if neighbour != NO_ALTITUDE
                    && same_altitude(altitude, neighbour)
                {
                    mask.set(nx, ny, WaterValue::Extended);
                    worklist.push_back((nx, ny));
                }
            }
        }
    }

    mask
}
