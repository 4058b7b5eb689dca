/// Spacing of Terrain 50 altitude samples, in metres.
pub const CELL_SIZE_METERS: u32 = 50;

/// Side length of one data square (the unit the dataset is shipped in).
pub const DATA_SQUARE_KM: u32 = 10;

/// Side length of a two-letter National Grid square.
pub const GRID_SQUARE_KM: u32 = 100;

/// Altitude value used for cells with no data (off-grid or all-sea squares).
pub const NO_ALTITUDE: f32 = -1000.0;

/// Two altitudes closer than this are treated as equal by the water
/// heuristic. Terrain 50 values are quantised to 0.1 m, so anything well
/// below that works.
pub const SAME_ALTITUDE_TOLERANCE: f32 = 0.01;

/// Largest area (either axis, in km) the mosaic assembler will attempt.
pub const MAX_AREA_KM: u32 = 2000;
