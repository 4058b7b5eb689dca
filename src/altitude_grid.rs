use crate::consts::NO_ALTITUDE;
use crate::errors::TarnError;

/// Header of an OS ASC altitude file. All five fields are integer-valued
/// in the dataset (corners are full metres, cellsize is 50).
#[derive(Clone, Debug, PartialEq)]
pub struct AscHeader {
    pub ncols: u32,
    pub nrows: u32,
    pub xllcorner: i64,
    pub yllcorner: i64,
    pub cellsize: u32,
}

/// A rectangular raster of altitude samples in metres.
///
/// Row 0 is the southernmost row, so cell (0, 0) is the south-west corner;
/// the ASC file stores rows north first and parsing flips them.
#[derive(Debug)]
pub struct AltitudeGrid {
    pub width: u32,
    pub height: u32,
    pub cellsize: u32,
    data: Box<[f32]>,
}

impl AltitudeGrid {
    /// Creates a grid with every cell set to `NO_ALTITUDE`.
    pub fn new(width: u32, height: u32, cellsize: u32) -> AltitudeGrid {
        AltitudeGrid {
            width,
            height,
            cellsize,
            data: vec![NO_ALTITUDE; width as usize * height as usize]
                .into_boxed_slice(),
        }
    }

    pub fn altitude_at(&self, x: u32, y: u32) -> f32 {
        if x >= self.width || y >= self.height {
            panic!("Cell coordinates out of bounds");
        }

        let index = y as usize * self.width as usize + x as usize;
        self.data[index]
    }

    pub fn set_altitude(&mut self, x: u32, y: u32, value: f32) {
        if x >= self.width || y >= self.height {
            panic!("Cell coordinates out of bounds");
        }

        let index = y as usize * self.width as usize + x as usize;
        self.data[index] = value;
    }

    /// Copies another grid into this one with its south-west corner at
    /// (x0, y0). Panics if the block does not fit.
    pub fn blit(&mut self, x0: u32, y0: u32, source: &AltitudeGrid) {
        if x0 + source.width > self.width || y0 + source.height > self.height {
            panic!("Blit region out of bounds");
        }

        for row in 0..source.height {
            let src_start = row as usize * source.width as usize;
            let src_end = src_start + source.width as usize;
            let dest_start = (y0 + row) as usize * self.width as usize
                + x0 as usize;
            let dest_end = dest_start + source.width as usize;
            self.data[dest_start..dest_end]
                .copy_from_slice(&source.data[src_start..src_end]);
        }
    }

    /// Minimum and maximum altitude over the grid, skipping no-data cells.
    /// None when the grid holds no data at all.
    pub fn altitude_range(&self) -> Option<(f32, f32)> {
        let mut range: Option<(f32, f32)> = None;
        for &altitude in self.data.iter() {
            if altitude == NO_ALTITUDE {
                continue;
            }
            range = match range {
                None => Some((altitude, altitude)),
                Some((min, max)) => {
                    Some((min.min(altitude), max.max(altitude)))
                }
            };
        }
        range
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }
}

const HEADER_FIELDS: [&str; 5] =
    ["ncols", "nrows", "xllcorner", "yllcorner", "cellsize"];

/// Parses the contents of an OS ASC altitude file: five `name value`
/// header lines, then `nrows` lines of `ncols` space-separated altitudes,
/// northernmost line first. `square_name` is only used in error messages.
pub fn parse_asc(
    square_name: &str,
    contents: &str,
) -> Result<(AscHeader, AltitudeGrid), TarnError> {
    let lines: Vec<&str> = contents.lines().collect();

    if lines.len() < HEADER_FIELDS.len() {
        return Err(TarnError::new(&format!(
            "Too few lines in data file for square {}",
            square_name
        )));
    }

    let mut values = [0i64; HEADER_FIELDS.len()];
    for (line_no, field) in HEADER_FIELDS.iter().enumerate() {
        let split: Vec<&str> = lines[line_no].split_whitespace().collect();
        if split.len() != 2 || !split[0].eq_ignore_ascii_case(field) {
            return Err(TarnError::new(&format!(
                "Unexpected header line {} for square {}: {}",
                line_no + 1,
                square_name,
                lines[line_no]
            )));
        }
        values[line_no] = split[1].parse::<i64>().map_err(|_| {
            TarnError::new(&format!(
                "Non-integer header value for square {}, field {}: {}",
                square_name, field, split[1]
            ))
        })?;
    }

    for (field, value) in
        [("ncols", values[0]), ("nrows", values[1]), ("cellsize", values[4])]
    {
        if !(1..=100_000).contains(&value) {
            return Err(TarnError::new(&format!(
                "Implausible {} for square {}: {}",
                field, square_name, value
            )));
        }
    }

    let header = AscHeader {
        ncols: values[0] as u32,
        nrows: values[1] as u32,
        xllcorner: values[2],
        yllcorner: values[3],
        cellsize: values[4] as u32,
    };

    let data_lines = &lines[HEADER_FIELDS.len()..];
    if data_lines.len() != header.nrows as usize {
        return Err(TarnError::new(&format!(
            "Expected {} data lines for square {}, found {}",
            header.nrows,
            square_name,
            data_lines.len()
        )));
    }

    let mut grid =
        AltitudeGrid::new(header.ncols, header.nrows, header.cellsize);

    for (line_no, line) in data_lines.iter().enumerate() {
        // The first data line is the most northerly; flip so row 0 is south.
        let row = header.nrows - 1 - line_no as u32;

        let values: Vec<&str> = line.split_whitespace().collect();
        if values.len() != header.ncols as usize {
            return Err(TarnError::new(&format!(
                "Expected {} values on data line {} for square {}, found {}",
                header.ncols,
                line_no + 1,
                square_name,
                values.len()
            )));
        }

        for (col, value) in values.iter().enumerate() {
            let altitude = value.parse::<f32>().map_err(|_| {
                TarnError::new(&format!(
                    "Bad altitude value on data line {} for square {}: {}",
                    line_no + 1,
                    square_name,
                    value
                ))
            })?;
            grid.set_altitude(col as u32, row, altitude);
        }
    }

    Ok((header, grid))
}

#[cfg(test)]
mod tests {
    use super::{parse_asc, AltitudeGrid};
    use crate::consts::NO_ALTITUDE;
    use crate::testing::assert_eq_approx;

    const SAMPLE: &str = "\
ncols 3
nrows 2
xllcorner 320000
yllcorner 520000
cellsize 50
10.5 11.0 12.5
20.0 21.5 22.0
";

    #[test]
    fn parse_sample_file() {
        let (header, grid) = parse_asc("NY12", SAMPLE).unwrap();
        assert_eq!(header.ncols, 3);
        assert_eq!(header.nrows, 2);
        assert_eq!(header.xllcorner, 320000);
        assert_eq!(header.yllcorner, 520000);
        assert_eq!(header.cellsize, 50);

        // The last line of the file is the southern row.
        assert_eq_approx(grid.altitude_at(0, 0), 20.0, 0.001);
        assert_eq_approx(grid.altitude_at(2, 0), 22.0, 0.001);
        assert_eq_approx(grid.altitude_at(0, 1), 10.5, 0.001);
        assert_eq_approx(grid.altitude_at(2, 1), 12.5, 0.001);
    }

    #[test]
    fn parse_rejects_malformed_files() {
        assert!(parse_asc("NY12", "ncols 3\nnrows 2\n").is_err());
        assert!(parse_asc("NY12", &SAMPLE.replace("cellsize 50", "cellsize fifty")).is_err());
        assert!(parse_asc("NY12", &SAMPLE.replace("ncols", "columns")).is_err());
        assert!(parse_asc("NY12", &SAMPLE.replace("ncols 3", "ncols -3")).is_err());
        // A missing data line.
        assert!(parse_asc("NY12", SAMPLE.trim_end_matches("20.0 21.5 22.0\n")).is_err());
        // A short data line.
        assert!(parse_asc("NY12", &SAMPLE.replace("10.5 11.0 12.5", "10.5 11.0")).is_err());
        // A non-numeric altitude.
        assert!(parse_asc("NY12", &SAMPLE.replace("21.5", "x")).is_err());
    }

    /// A new grid is all no-data until something is written into it.
    #[test]
    fn new_grid_holds_no_data() {
        let grid = AltitudeGrid::new(4, 3, 50);
        assert_eq!(grid.altitude_at(0, 0), NO_ALTITUDE);
        assert_eq!(grid.altitude_at(3, 2), NO_ALTITUDE);
        assert!(grid.altitude_range().is_none());
    }

    #[test]
    fn set_and_get_altitude() {
        let mut grid = AltitudeGrid::new(4, 3, 50);
        grid.set_altitude(1, 2, 123.5);
        assert_eq!(grid.altitude_at(1, 2), 123.5);
        grid.set_altitude(1, 2, -3.0);
        assert_eq!(grid.altitude_at(1, 2), -3.0);
    }

    #[test]
    fn blit_places_a_block() {
        let mut big = AltitudeGrid::new(4, 4, 50);
        let mut small = AltitudeGrid::new(2, 2, 50);
        small.set_altitude(0, 0, 1.0);
        small.set_altitude(1, 1, 2.0);

        big.blit(2, 1, &small);
        assert_eq!(big.altitude_at(2, 1), 1.0);
        assert_eq!(big.altitude_at(3, 2), 2.0);
        assert_eq!(big.altitude_at(0, 0), NO_ALTITUDE);
    }

    #[test]
    #[should_panic]
    fn blit_out_of_bounds_panics() {
        let mut big = AltitudeGrid::new(4, 4, 50);
        let small = AltitudeGrid::new(2, 2, 50);
        big.blit(3, 3, &small);
    }

    #[test]
    fn altitude_range_skips_no_data() {
        let mut grid = AltitudeGrid::new(2, 2, 50);
        grid.set_altitude(0, 0, 5.0);
        grid.set_altitude(1, 1, -2.5);
        assert_eq!(grid.altitude_range(), Some((-2.5, 5.0)));
    }
}
