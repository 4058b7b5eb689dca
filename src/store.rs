use std::path::{Path, PathBuf};

use crate::altitude_grid::{parse_asc, AltitudeGrid, AscHeader};
use crate::errors::TarnError;
use crate::national_grid::SquareRef;
use crate::zip::ZipArchive;

/// Data root used when neither the CLI flag nor the environment names one.
pub const DEFAULT_DATA_ROOT: &str = "./OSData/Altitudes";

/// Environment variable naming the data root (read by the binary, with
/// dotenv loaded first).
pub const DATA_DIR_ENV: &str = "TERRAIN50_DATA_DIR";

/// Name of the unpacked dataset folder inside the data root.
pub const DATASET_DIR: &str = "terr50_gagg_gb";

/// Result of reading one 10km square. The dataset simply omits squares
/// without land, so a missing file means the square is entirely at sea.
pub enum SquareReading {
    Sea,
    Grid(AscHeader, AltitudeGrid),
}

/// Anything that can produce altitude data for a 10km square. The mosaic
/// assembler works against this so it can be driven from an in-memory
/// source in tests.
pub trait SquareSource: Sync {
    fn read_square(
        &self,
        square: &SquareRef,
    ) -> Result<SquareReading, TarnError>;
}

/// Reads squares from an unpacked Terrain 50 distribution: the data root
/// contains `terr50_gagg_gb/data/<gs>/<sq>_OST50GRID_<date>.zip`, each
/// archive holding a single `<SQ>.asc` file.
pub struct DataStore {
    root: PathBuf,
}

impl DataStore {
    pub fn new(root: &Path) -> DataStore {
        DataStore {
            root: root.to_path_buf(),
        }
    }

    pub fn data_dir(&self) -> PathBuf {
        self.root.join(DATASET_DIR).join("data")
    }
}

impl SquareSource for DataStore {
    fn read_square(
        &self,
        square: &SquareRef,
    ) -> Result<SquareReading, TarnError> {
        let data_dir = self.data_dir();
        if !data_dir.is_dir() {
            return Err(TarnError::new(&format!(
                "No data folder found at {} (run the fetch command first?)",
                data_dir.display()
            )));
        }

        // Folder names are the lowercase 100km square; a valid square with
        // no folder is one with no land anywhere in the 100km square.
        let square_upper = square.to_string();
        let square_lower = square_upper.to_lowercase();
        let grid_dir = data_dir.join(square_lower[0..2].to_string());
        if !grid_dir.is_dir() {
            return Ok(SquareReading::Sea);
        }

        // The zip is named <sq>_OST50GRID_<date>.zip; the date part varies
        // by release, so match on prefix and extension.
        let mut matches: Vec<PathBuf> = Vec::new();
        let dir_entries = std::fs::read_dir(&grid_dir).map_err(|e| {
            TarnError::new(&format!(
                "Failed to list {}: {}",
                grid_dir.display(),
                e
            ))
        })?;
        for entry in dir_entries {
            let entry = entry.map_err(|e| {
                TarnError::new(&format!(
                    "Failed to list {}: {}",
                    grid_dir.display(),
                    e
                ))
            })?;
            let name = entry.file_name().to_string_lossy().to_string();
            if name.starts_with(&square_lower) && name.ends_with(".zip") {
                matches.push(entry.path());
            }
        }

        if matches.is_empty() {
            return Ok(SquareReading::Sea);
        }
        if matches.len() > 1 {
            return Err(TarnError::new(&format!(
                "Multiple zipped data files found for square {}",
                square_upper
            )));
        }

        let mut archive = ZipArchive::open_file(&matches[0])?;
        let asc_name = format!("{}.asc", square_upper);
        let bytes = archive.read_entry(&asc_name).map_err(|e| {
            TarnError::new(&format!(
                "Expected data file {} in {}: {}",
                asc_name,
                matches[0].display(),
                e
            ))
        })?;
        let contents = String::from_utf8(bytes).map_err(|_| {
            TarnError::new(&format!(
                "Data file {} is not valid text",
                asc_name
            ))
        })?;

        let (header, grid) = parse_asc(&square_upper, &contents)?;
        Ok(SquareReading::Grid(header, grid))
    }
}

#[cfg(test)]
mod tests {
    use super::{DataStore, SquareReading, SquareSource, DATASET_DIR};
    use crate::national_grid::SquareRef;

    fn temp_root(name: &str) -> std::path::PathBuf {
        let root = std::env::temp_dir().join(name);
        let _ = std::fs::remove_dir_all(&root);
        root
    }

    #[test]
    fn missing_data_folder_is_an_error() {
        let root = temp_root("tarn-store-missing-root");
        let store = DataStore::new(&root);
        let square: SquareRef = "NY12".parse().unwrap();
        assert!(store.read_square(&square).is_err());
    }

    /// A 100km square with no data folder is entirely at sea.
    #[test]
    fn square_without_folder_is_sea() {
        let root = temp_root("tarn-store-sea-square");
        std::fs::create_dir_all(root.join(DATASET_DIR).join("data/sv"))
            .unwrap();
        let store = DataStore::new(&root);

        let square: SquareRef = "NY12".parse().unwrap();
        assert!(matches!(
            store.read_square(&square).unwrap(),
            SquareReading::Sea
        ));
        let _ = std::fs::remove_dir_all(&root);
    }

    /// A folder with no matching zip likewise means a sea square.
    #[test]
    fn square_without_zip_is_sea() {
        let root = temp_root("tarn-store-sea-zip");
        let ny = root.join(DATASET_DIR).join("data/ny");
        std::fs::create_dir_all(&ny).unwrap();
        std::fs::write(ny.join("ny34_OST50GRID_20230601.zip"), b"").unwrap();
        let store = DataStore::new(&root);

        let square: SquareRef = "NY12".parse().unwrap();
        assert!(matches!(
            store.read_square(&square).unwrap(),
            SquareReading::Sea
        ));
        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn duplicate_zips_are_an_error() {
        let root = temp_root("tarn-store-duplicates");
        let ny = root.join(DATASET_DIR).join("data/ny");
        std::fs::create_dir_all(&ny).unwrap();
        std::fs::write(ny.join("ny12_OST50GRID_20230601.zip"), b"").unwrap();
        std::fs::write(ny.join("ny12_OST50GRID_20240601.zip"), b"").unwrap();
        let store = DataStore::new(&root);

        let square: SquareRef = "NY12".parse().unwrap();
        assert!(store.read_square(&square).is_err());
        let _ = std::fs::remove_dir_all(&root);
    }
}
