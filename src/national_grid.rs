use std::fmt;
use std::str::FromStr;

// The GB national grid in 500km super squares, north at the top:
//
//    HJ         (J is all sea)
//    NO         (O is virtually all at sea)
//    ST
//
// Each super square splits into 25 100x100km squares lettered A-Z
// (skipping I), again north at the top.
const SUPER_ROWS: [&str; 3] = ["HJ", "NO", "ST"];
const INNER_ROWS: [&str; 5] = ["ABCDE", "FGHJK", "LMNOP", "QRSTU", "VWXYZ"];

/// Number of 100km squares across the grid, west to east.
pub const GRID_COLUMNS: u8 = 10;
/// Number of 100km squares up the grid, south to north.
pub const GRID_ROWS: u8 = 15;

/// Squares that contain GB land, per 500km letter: a `-` list excludes the
/// named letters, a `+` list includes only them.
const LAND_SQUARES: [(char, &str); 6] = [
    ('S', "-ABFGLQ"),
    ('T', "-BCDEHJKNOPSTUWXYZ"),
    ('N', "-QV"),
    ('H', "-ABCDEFGHJKLMNQRSV"),
    ('O', "+V"),
    ('J', "+"),
];

/// One 100x100km square of the national grid. Indices count from the grid
/// origin at the south-west corner (the SV square).
#[derive(Clone, Debug, PartialEq)]
pub struct GridSquare {
    pub letters: [char; 2],
    pub easting_index: u8,
    pub northing_index: u8,
    pub has_land: bool,
}

impl GridSquare {
    pub fn name(&self) -> String {
        self.letters.iter().collect()
    }
}

impl fmt::Display for GridSquare {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.letters[0], self.letters[1])
    }
}

fn super_square_position(letter: char) -> Option<(u8, u8)> {
    for (row, letters) in SUPER_ROWS.iter().enumerate() {
        if let Some(col) = letters.find(letter) {
            // Rows are listed north first; basis indices count from the south.
            let northing_basis = (SUPER_ROWS.len() - 1 - row) as u8;
            return Some((col as u8, northing_basis));
        }
    }
    None
}

fn inner_square_position(letter: char) -> Option<(u8, u8)> {
    for (row, letters) in INNER_ROWS.iter().enumerate() {
        if let Some(col) = letters.find(letter) {
            let northing = (INNER_ROWS.len() - 1 - row) as u8;
            return Some((col as u8, northing));
        }
    }
    None
}

fn square_has_land(letters: [char; 2]) -> bool {
    for (super_letter, list) in LAND_SQUARES {
        if super_letter == letters[0] {
            let listed = list[1..].contains(letters[1]);
            return if list.starts_with('-') { !listed } else { listed };
        }
    }
    false
}

/// Looks up a 100km grid square by its two-letter name (case-insensitive).
/// Returns None for names that are not part of the GB grid.
pub fn grid_square(name: &str) -> Option<GridSquare> {
    let mut chars = name.chars();
    let (first, second) = match (chars.next(), chars.next(), chars.next()) {
        (Some(a), Some(b), None) => {
            (a.to_ascii_uppercase(), b.to_ascii_uppercase())
        }
        _ => return None,
    };

    let (super_col, super_row) = super_square_position(first)?;
    let (inner_col, inner_row) = inner_square_position(second)?;

    let letters = [first, second];
    Some(GridSquare {
        letters,
        easting_index: super_col * 5 + inner_col,
        northing_index: super_row * 5 + inner_row,
        has_land: square_has_land(letters),
    })
}

/// Looks up a 100km grid square by its grid indices. Returns None beyond
/// the edges of the grid.
pub fn grid_square_at(
    easting_index: u8,
    northing_index: u8,
) -> Option<GridSquare> {
    if easting_index >= GRID_COLUMNS || northing_index >= GRID_ROWS {
        return None;
    }

    let super_row = SUPER_ROWS[SUPER_ROWS.len() - 1 - (northing_index / 5) as usize];
    let first = super_row
        .chars()
        .nth((easting_index / 5) as usize)
        .unwrap();

    let inner_row =
        INNER_ROWS[INNER_ROWS.len() - 1 - (northing_index % 5) as usize];
    let second = inner_row.chars().nth((easting_index % 5) as usize).unwrap();

    let letters = [first, second];
    Some(GridSquare {
        letters,
        easting_index,
        northing_index,
        has_land: square_has_land(letters),
    })
}

/// Identifies one 10x10km data square: a 100km grid square plus an easting
/// and northing digit, e.g. NY12.
#[derive(Clone, Debug, PartialEq)]
pub struct SquareRef {
    pub letters: [char; 2],
    pub east: u8,
    pub north: u8,
}

impl SquareRef {
    pub fn new(square: &GridSquare, east: u8, north: u8) -> SquareRef {
        SquareRef {
            letters: square.letters,
            east,
            north,
        }
    }

    pub fn grid_square(&self) -> GridSquare {
        // The letters were validated on construction.
        grid_square(&self.letters.iter().collect::<String>()).unwrap()
    }

    /// The square reached by moving the given number of 10km squares east
    /// and north, carrying into neighbouring 100km squares. None once the
    /// move leaves the national grid.
    pub fn step(&self, east_inc: u32, north_inc: u32) -> Option<SquareRef> {
        let square = self.grid_square();

        let east_total = self.east as u32 + east_inc;
        let north_total = self.north as u32 + north_inc;

        let easting_index = square.easting_index as u32 + east_total / 10;
        let northing_index = square.northing_index as u32 + north_total / 10;
        if easting_index >= GRID_COLUMNS as u32
            || northing_index >= GRID_ROWS as u32
        {
            return None;
        }

        let reached =
            grid_square_at(easting_index as u8, northing_index as u8)?;
        Some(SquareRef::new(
            &reached,
            (east_total % 10) as u8,
            (north_total % 10) as u8,
        ))
    }
}

impl FromStr for SquareRef {
    type Err = String;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        let chars: Vec<char> = name.chars().collect();
        if chars.len() != 4 {
            return Err(format!("Invalid square reference length: {}", name));
        }

        let square = grid_square(&chars[0..2].iter().collect::<String>())
            .ok_or_else(|| format!("Unknown grid square in: {}", name))?;

        let east = chars[2]
            .to_digit(10)
            .ok_or_else(|| format!("Invalid easting digit in: {}", name))?;
        let north = chars[3]
            .to_digit(10)
            .ok_or_else(|| format!("Invalid northing digit in: {}", name))?;

        Ok(SquareRef::new(&square, east as u8, north as u8))
    }
}

impl fmt::Display for SquareRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{}{}",
            self.letters[0], self.letters[1], self.east, self.north
        )
    }
}

/// Formats the full 100km square layout, north at the top, with sea-only
/// squares blanked out. Used by the CLI grid command.
pub fn grid_layout() -> String {
    let mut out = String::new();
    for northing in (0..GRID_ROWS).rev() {
        for easting in 0..GRID_COLUMNS {
            let square = grid_square_at(easting, northing).unwrap();
            if square.has_land {
                out.push_str(&format!(
                    "{}=({:02},{:02}) ",
                    square,
                    square.northing_index,
                    square.easting_index
                ));
            } else {
                out.push_str("           ");
            }
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::{grid_square, grid_square_at, SquareRef};
    use proptest::prelude::*;
    use rstest::rstest;

    #[test]
    fn lookup_by_name() {
        let sv = grid_square("SV").unwrap();
        assert_eq!(sv.easting_index, 0);
        assert_eq!(sv.northing_index, 0);
        assert!(sv.has_land);

        let ny = grid_square("ny").unwrap();
        assert_eq!(ny.easting_index, 3);
        assert_eq!(ny.northing_index, 5);
        assert!(ny.has_land);

        assert!(grid_square("AA").is_none());
        assert!(grid_square("NI").is_none());
        assert!(grid_square("N").is_none());
        assert!(grid_square("NYX").is_none());
    }

    /// Name and index lookups agree over the whole grid.
    #[test]
    fn lookup_by_indices_round_trips() {
        for northing in 0..super::GRID_ROWS {
            for easting in 0..super::GRID_COLUMNS {
                let square = grid_square_at(easting, northing).unwrap();
                let again = grid_square(&square.name()).unwrap();
                assert_eq!(square, again);
            }
        }
        assert!(grid_square_at(10, 0).is_none());
        assert!(grid_square_at(0, 15).is_none());
    }

    #[rstest]
    #[case("SV", true)]
    #[case("SA", false)]
    #[case("OV", true)]
    #[case("OA", false)]
    #[case("JM", false)]
    #[case("HP", true)]
    #[case("HA", false)]
    #[case("TQ", true)]
    #[case("TB", false)]
    #[case("NQ", false)]
    fn land_flags(#[case] name: &str, #[case] expected: bool) {
        assert_eq!(grid_square(name).unwrap().has_land, expected, "{}", name);
    }

    #[test]
    fn parsing_and_formatting_square_refs() {
        let square: SquareRef = "NY12".parse().unwrap();
        assert_eq!(square.east, 1);
        assert_eq!(square.north, 2);
        assert_eq!(square.to_string(), "NY12");

        let square: SquareRef = "ny12".parse().unwrap();
        assert_eq!(square.to_string(), "NY12");

        assert!("NY1".parse::<SquareRef>().is_err());
        assert!("NY123".parse::<SquareRef>().is_err());
        assert!("N912".parse::<SquareRef>().is_err());
        assert!("NYxy".parse::<SquareRef>().is_err());
    }

    /// Stepping within one 100km square just moves the digits.
    #[test]
    fn step_within_square() {
        let square: SquareRef = "NY12".parse().unwrap();
        assert_eq!(square.step(3, 4).unwrap().to_string(), "NY46");
        assert_eq!(square.step(0, 0).unwrap().to_string(), "NY12");
    }

    /// Stepping over a 100km boundary carries into the neighbouring square.
    #[rstest]
    #[case("NY92", 1, 0, "NZ02")]
    #[case("NY19", 0, 1, "NT10")]
    #[case("NY99", 1, 1, "NU00")]
    #[case("SV00", 35, 27, "SO57")]
    fn step_across_square_boundary(
        #[case] from: &str,
        #[case] east: u32,
        #[case] north: u32,
        #[case] expected: &str,
    ) {
        let square: SquareRef = from.parse().unwrap();
        assert_eq!(square.step(east, north).unwrap().to_string(), expected);
    }

    /// Stepping past the edge of the grid gives nothing.
    #[test]
    fn step_off_the_grid() {
        let square: SquareRef = "JE99".parse().unwrap();
        assert!(square.step(1, 0).is_none());
        assert!(square.step(0, 1).is_none());
        assert!("SV00".parse::<SquareRef>().unwrap().step(100, 0).is_none());
    }

    proptest! {
        /// Any valid square reference survives a format/parse round trip.
        #[test]
        fn square_ref_round_trip(
            easting in 0u8..super::GRID_COLUMNS,
            northing in 0u8..super::GRID_ROWS,
            east in 0u8..10,
            north in 0u8..10,
        ) {
            let square = grid_square_at(easting, northing).unwrap();
            let square_ref = SquareRef::new(&square, east, north);
            let parsed: SquareRef =
                square_ref.to_string().parse().unwrap();
            prop_assert_eq!(parsed, square_ref);
        }
    }
}
