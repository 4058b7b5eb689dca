pub type Rgb = [u8; 3];

const BLACK: Rgb = [0x00, 0x00, 0x00];

/// The blue used for suspected water cells.
const WATER_COLOUR: Rgb = [0xCC, 0xE5, 0xFF];

// Ramp stops pair an altitude (m) with the colour shown at exactly that
// altitude; cells between stops are interpolated. The top stop sits just
// above Ben Nevis (1345m).
const STANDARD_STOPS: [(f32, Rgb); 8] = [
    (-10.0, [0xFF, 0xFF, 0xEE]),
    (0.0, [0xCC, 0xFF, 0xCC]),
    (180.0, [0xFF, 0xE9, 0xB3]),
    (300.0, [0xFF, 0xCC, 0x99]),
    (430.0, [0xFF, 0xBF, 0x80]),
    (610.0, [0xFF, 0xB3, 0x66]),
    (900.0, [0xFF, 0x99, 0x33]),
    (1350.0, [0xB3, 0x59, 0x00]),
];

// The earlier all-sandy ramp, kept selectable.
const CLASSIC_STOPS: [(f32, Rgb); 9] = [
    (-10.0, [0xFF, 0xFF, 0xEE]),
    (0.0, [0xFF, 0xFF, 0x99]),
    (60.0, [0xFF, 0xE9, 0xB3]),
    (180.0, [0xFF, 0xD9, 0xB3]),
    (300.0, [0xFF, 0xCC, 0x99]),
    (430.0, [0xFF, 0xBF, 0x80]),
    (610.0, [0xFF, 0xB3, 0x66]),
    (900.0, [0xFF, 0x99, 0x33]),
    (1350.0, [0xB3, 0x59, 0x00]),
];

/// A named altitude-to-colour mapping.
pub struct ColourScheme {
    pub name: &'static str,
    stops: &'static [(f32, Rgb)],
    water_colour: Rgb,
}

static SCHEMES: [ColourScheme; 2] = [
    ColourScheme {
        name: "standard",
        stops: &STANDARD_STOPS,
        water_colour: WATER_COLOUR,
    },
    ColourScheme {
        name: "classic",
        stops: &CLASSIC_STOPS,
        water_colour: WATER_COLOUR,
    },
];

impl ColourScheme {
    pub fn named(name: &str) -> Option<&'static ColourScheme> {
        SCHEMES.iter().find(|s| s.name == name)
    }

    pub fn standard() -> &'static ColourScheme {
        &SCHEMES[0]
    }

    pub fn water_colour(&self) -> Rgb {
        self.water_colour
    }

    fn ramp_max(&self) -> f32 {
        self.stops[self.stops.len() - 1].0
    }

    /// Colour for a dry-land cell. Positive altitudes are rescaled so the
    /// area's highest point lands just below the top of the ramp, keeping
    /// the full ramp in play for low-lying areas. Altitudes below -10m or
    /// off either end of the ramp show as black.
    pub fn land_colour(&self, altitude: f32, max_altitude: f32) -> Rgb {
        if altitude < -10.0 {
            return BLACK;
        }

        let effective = if altitude > 0.0 {
            altitude * (self.ramp_max() - 0.1) / max_altitude
        } else {
            altitude
        };

        let above = match self
            .stops
            .iter()
            .position(|&(stop_altitude, _)| effective < stop_altitude)
        {
            // Off the top of the ramp, or below its first stop.
            None | Some(0) => return BLACK,
            Some(index) => index,
        };

        let (lower_altitude, lower) = self.stops[above - 1];
        let (upper_altitude, upper) = self.stops[above];
        let factor =
            (effective - lower_altitude) / (upper_altitude - lower_altitude);

        let mut rgb = BLACK;
        for channel in 0..3 {
            let low = lower[channel] as f32;
            let high = upper[channel] as f32;
            rgb[channel] = (low + (high - low) * factor).round() as u8;
        }
        rgb
    }
}
