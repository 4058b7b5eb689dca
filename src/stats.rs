use std::collections::BTreeMap;
use std::fmt;

use crate::altitude_grid::AltitudeGrid;
use crate::consts::NO_ALTITUDE;

// Terrain 50 altitudes are quantised to 0.1m, so counting distinct values
// works on decimetre keys rather than raw floats.
fn decimetre_key(altitude: f32) -> i32 {
    (altitude * 10.0).round() as i32
}

fn key_to_altitude(key: i32) -> f32 {
    key as f32 / 10.0
}

/// One value the report calls out: below 1m, or unusually frequent.
#[derive(Clone, Debug, PartialEq)]
pub struct NotableValue {
    pub altitude: f32,
    pub count: usize,
    pub percent: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct HistogramBand {
    pub lower: f32,
    pub upper: f32,
    pub count: usize,
}

/// Distribution of the altitude values in a grid, ignoring no-data cells.
#[derive(Clone, Debug)]
pub struct AltitudeStats {
    pub cell_count: usize,
    pub distinct_values: usize,
    pub min_altitude: f32,
    pub max_altitude: f32,
    pub mean_altitude: f64,
    pub most_common: NotableValue,
    pub notable: Vec<NotableValue>,
    pub histogram: Vec<HistogramBand>,
}

/// Analyses a grid's altitude distribution. None when the grid holds no
/// data at all.
pub fn analyse(grid: &AltitudeGrid) -> Option<AltitudeStats> {
    let mut counts: BTreeMap<i32, usize> = BTreeMap::new();
    let mut sum = 0.0f64;
    let mut cell_count = 0usize;

    for &altitude in grid.data() {
        if altitude == NO_ALTITUDE {
            continue;
        }
        *counts.entry(decimetre_key(altitude)).or_insert(0) += 1;
        sum += altitude as f64;
        cell_count += 1;
    }

    if cell_count == 0 {
        return None;
    }

    let min_altitude = key_to_altitude(*counts.keys().next().unwrap());
    let max_altitude = key_to_altitude(*counts.keys().last().unwrap());

    // First value with the highest count wins ties, scanning upwards.
    let (&mode_key, &mode_count) = counts
        .iter()
        .fold(None, |best: Option<(&i32, &usize)>, entry| match best {
            Some((_, best_count)) if *entry.1 <= *best_count => best,
            _ => Some(entry),
        })
        .unwrap();

    let percent_of = |count: usize| count as f64 * 100.0 / cell_count as f64;

    let notable: Vec<NotableValue> = counts
        .iter()
        .filter(|&(&key, &count)| {
            key_to_altitude(key) < 1.0 || percent_of(count) >= 1.0
        })
        .map(|(&key, &count)| NotableValue {
            altitude: key_to_altitude(key),
            count,
            percent: percent_of(count),
        })
        .collect();

    let histogram = build_histogram(&counts, min_altitude, max_altitude);

    Some(AltitudeStats {
        cell_count,
        distinct_values: counts.len(),
        min_altitude,
        max_altitude,
        mean_altitude: sum / cell_count as f64,
        most_common: NotableValue {
            altitude: key_to_altitude(mode_key),
            count: mode_count,
            percent: percent_of(mode_count),
        },
        notable,
        histogram,
    })
}

/// Bands of 100m once the area tops 200m, 20m otherwise, with all the
/// negative altitudes collected into one bin at the front.
fn build_histogram(
    counts: &BTreeMap<i32, usize>,
    min_altitude: f32,
    max_altitude: f32,
) -> Vec<HistogramBand> {
    let band_size = if max_altitude > 200.0 { 100.0 } else { 20.0 };

    let mut edges: Vec<f32> = Vec::new();
    if min_altitude < 0.0 {
        edges.push(min_altitude);
    }
    let mut edge = 0.0f32;
    while edge - max_altitude <= band_size {
        edges.push(edge);
        edge += band_size;
    }
    edges.push(edge);

    let mut bands: Vec<HistogramBand> = edges
        .windows(2)
        .map(|pair| HistogramBand {
            lower: pair[0],
            upper: pair[1],
            count: 0,
        })
        .collect();

    for (&key, &count) in counts {
        let altitude = key_to_altitude(key);
        if let Some(band) = bands
            .iter_mut()
            .find(|b| altitude >= b.lower && altitude < b.upper)
        {
            band.count += count;
        }
    }

    bands
}

impl fmt::Display for AltitudeStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Analysis of altitudes:")?;
        writeln!(f, "- cells with data: {}", self.cell_count)?;
        writeln!(f, "- unique altitude values: {}", self.distinct_values)?;
        writeln!(
            f,
            "- altitude values range: {:.1} - {:.1} m",
            self.min_altitude, self.max_altitude
        )?;
        writeln!(
            f,
            "- altitude range: {:.1} m",
            self.max_altitude - self.min_altitude
        )?;
        writeln!(f, "- average altitude: {:.1} m", self.mean_altitude)?;
        writeln!(
            f,
            "- most common altitude value: {:.1} m : {} cases, {:.3} %",
            self.most_common.altitude,
            self.most_common.count,
            self.most_common.percent
        )?;

        writeln!(f, "- cases below 1m or over 1% of the total:")?;
        if self.notable.is_empty() {
            writeln!(f, "  [None]")?;
        }
        for value in &self.notable {
            writeln!(
                f,
                "  {:7.1}m  {:7}  = {:5.1} %",
                value.altitude, value.count, value.percent
            )?;
        }

        writeln!(f, "- histogram:")?;
        for band in &self.histogram {
            writeln!(
                f,
                "  {:7.1} .. {:7.1} m  {:7}",
                band.lower, band.upper, band.count
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::analyse;
    use crate::altitude_grid::AltitudeGrid;
    use crate::consts::NO_ALTITUDE;
    use crate::testing::assert_eq_approx;

    fn grid_of(values: &[f32]) -> AltitudeGrid {
        let mut grid = AltitudeGrid::new(values.len() as u32, 1, 50);
        for (x, &v) in values.iter().enumerate() {
            grid.set_altitude(x as u32, 0, v);
        }
        grid
    }

    #[test]
    fn empty_grid_has_no_stats() {
        let grid = AltitudeGrid::new(3, 3, 50);
        assert!(analyse(&grid).is_none());
    }

    #[test]
    fn basic_measures() {
        let grid = grid_of(&[10.0, 10.0, 10.0, 20.0, 30.0, NO_ALTITUDE]);
        let stats = analyse(&grid).unwrap();

        assert_eq!(stats.cell_count, 5);
        assert_eq!(stats.distinct_values, 3);
        assert_eq_approx(stats.min_altitude, 10.0, 0.001);
        assert_eq_approx(stats.max_altitude, 30.0, 0.001);
        assert_eq_approx(stats.mean_altitude as f32, 16.0, 0.001);
        assert_eq_approx(stats.most_common.altitude, 10.0, 0.001);
        assert_eq!(stats.most_common.count, 3);
        assert_eq_approx(stats.most_common.percent as f32, 60.0, 0.001);
    }

    /// Ties on the count go to the lowest altitude, as the original did.
    #[test]
    fn mode_tie_takes_the_lower_value() {
        let grid = grid_of(&[5.0, 5.0, 9.0, 9.0, 12.0]);
        let stats = analyse(&grid).unwrap();
        assert_eq_approx(stats.most_common.altitude, 5.0, 0.001);
    }

    /// Values under a metre are always listed, frequent values too.
    #[test]
    fn notable_values() {
        let mut values = vec![0.2, -1.5];
        values.extend(std::iter::repeat(55.5).take(98));
        let grid = grid_of(&values);
        let stats = analyse(&grid).unwrap();

        let altitudes: Vec<f32> =
            stats.notable.iter().map(|v| v.altitude).collect();
        assert_eq!(altitudes, vec![-1.5, 0.2, 55.5]);
    }

    /// Low-relief areas get 20m bands, mountainous ones 100m.
    #[test]
    fn histogram_band_sizes() {
        let low = analyse(&grid_of(&[5.0, 15.0, 150.0])).unwrap();
        assert_eq_approx(low.histogram[0].upper - low.histogram[0].lower, 20.0, 0.001);

        let high = analyse(&grid_of(&[5.0, 15.0, 500.0])).unwrap();
        assert_eq_approx(high.histogram[0].upper - high.histogram[0].lower, 100.0, 0.001);
    }

    /// Negative altitudes all land in one leading band.
    #[test]
    fn histogram_collects_negatives() {
        let stats = analyse(&grid_of(&[-8.0, -2.0, 5.0, 25.0])).unwrap();

        let negatives = &stats.histogram[0];
        assert_eq_approx(negatives.lower, -8.0, 0.001);
        assert_eq_approx(negatives.upper, 0.0, 0.001);
        assert_eq!(negatives.count, 2);

        let first_positive = &stats.histogram[1];
        assert_eq_approx(first_positive.lower, 0.0, 0.001);
        assert_eq!(first_positive.count, 1);
    }

    /// Every cell lands in exactly one band.
    #[test]
    fn histogram_covers_everything() {
        let stats =
            analyse(&grid_of(&[-3.0, 0.0, 19.9, 20.0, 45.0, 199.9])).unwrap();
        let total: usize = stats.histogram.iter().map(|b| b.count).sum();
        assert_eq!(total, 6);
    }
}
