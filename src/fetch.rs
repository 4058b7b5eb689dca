use std::fs::File;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::errors::TarnError;
use crate::store::DATASET_DIR;
use crate::zip::ZipArchive;

/// OS Downloads API query for the full-GB Terrain 50 product in ASCII
/// Grid form. The response is a JSON array of download descriptors.
const DOWNLOADS_API_URL: &str = "https://api.os.uk/downloads/v1/products/\
                                 Terrain50/downloads?area=GB&format=ASCII+Grid";

/// Format label of the ASCII Grid download within the API response.
const ASCII_GRID_FORMAT: &str = "ASCII Grid and GML (Grid)";

const ARCHIVE_FILE_NAME: &str = "terr50_gagg_gb.zip";

/// Ensure that the file is in the cache directory. If it is not, download
/// it from the given URL and save it to the specified path.
pub fn ensure_file_in_cache(
    url: &str,
    cached_file_name: &Path,
) -> Result<PathBuf, TarnError> {
    if cached_file_name.exists() {
        return Ok(cached_file_name.to_path_buf());
    }

    let response = reqwest::blocking::get(url).map_err(|e| {
        TarnError::new(&format!("Failed to download the file: {}", e))
    })?;

    // if the cache directory does not exist, create it
    if let Some(parent) = cached_file_name.parent() {
        if !parent.exists() {
            std::fs::create_dir_all(parent).map_err(|e| {
                TarnError::new(&format!(
                    "Failed to create cache directory: {}",
                    e
                ))
            })?;
        }
    }

    let mut file = File::create(cached_file_name).map_err(|e| {
        TarnError::new(&format!("Failed to create the file in the cache: {}", e))
    })?;

    let bytes = response.bytes().map_err(|e| {
        TarnError::new(&format!("Failed to read response bytes: {}", e))
    })?;

    let mut cursor = Cursor::new(bytes);
    std::io::copy(&mut cursor, &mut file).map_err(|e| {
        TarnError::new(&format!("Failed to write the file in the cache: {}", e))
    })?;

    Ok(cached_file_name.to_path_buf())
}

/// Picks the ASCII Grid download URL out of the downloads-API response.
fn download_url_from_index(index: &str) -> Result<String, TarnError> {
    let json: Value = serde_json::from_str(index).map_err(|e| {
        TarnError::new(&format!(
            "Failed to parse the downloads API response: {}",
            e
        ))
    })?;

    let downloads = json.as_array().ok_or_else(|| {
        TarnError::new("Downloads API response is not a JSON array")
    })?;

    downloads
        .iter()
        .filter(|entry| {
            entry.get("format").and_then(Value::as_str)
                == Some(ASCII_GRID_FORMAT)
        })
        .find_map(|entry| entry.get("url").and_then(Value::as_str))
        .map(|url| url.to_string())
        .ok_or_else(|| {
            TarnError::new(&format!(
                "No {} download listed by the downloads API",
                ASCII_GRID_FORMAT
            ))
        })
}

fn archive_download_url() -> Result<String, TarnError> {
    let response =
        reqwest::blocking::get(DOWNLOADS_API_URL).map_err(|e| {
            TarnError::new(&format!(
                "Failed to query the OS downloads API: {}",
                e
            ))
        })?;
    let body = response.text().map_err(|e| {
        TarnError::new(&format!(
            "Failed to read the downloads API response: {}",
            e
        ))
    })?;
    download_url_from_index(&body)
}

/// Makes sure the unpacked dataset is present under the data root,
/// downloading and unpacking the distribution archive when it is not.
/// Returns the path of the `data` folder.
pub fn ensure_dataset(data_root: &Path) -> Result<PathBuf, TarnError> {
    let data_dir = data_root.join(DATASET_DIR).join("data");
    if data_dir.is_dir() {
        return Ok(data_dir);
    }

    let url = archive_download_url()?;
    let archive_path =
        ensure_file_in_cache(&url, &data_root.join(ARCHIVE_FILE_NAME))?;

    let mut archive = ZipArchive::open_file(&archive_path)?;
    archive.extract_all(&data_root.join(DATASET_DIR))?;

    if !data_dir.is_dir() {
        return Err(TarnError::new(&format!(
            "Unpacked archive did not produce {}",
            data_dir.display()
        )));
    }
    Ok(data_dir)
}

#[cfg(test)]
mod tests {
    use super::{download_url_from_index, ensure_file_in_cache};

    #[test]
    fn picks_the_ascii_grid_download() {
        let index = r#"[
            {"format": "GeoPackage", "area": "GB",
             "url": "https://example.test/gpkg"},
            {"format": "ASCII Grid and GML (Grid)", "area": "GB",
             "url": "https://example.test/asc"}
        ]"#;
        assert_eq!(
            download_url_from_index(index).unwrap(),
            "https://example.test/asc"
        );
    }

    #[test]
    fn rejects_an_index_without_the_format() {
        assert!(download_url_from_index("[]").is_err());
        assert!(download_url_from_index("not json").is_err());
        assert!(download_url_from_index(r#"{"format": "x"}"#).is_err());
    }

    /// A file already in the cache is returned without touching the URL.
    #[test]
    fn cached_file_short_circuits_the_download() {
        let path = std::env::temp_dir().join("tarn-fetch-cached-file");
        std::fs::write(&path, b"cached").unwrap();

        let result =
            ensure_file_in_cache("http://invalid.invalid/nothing", &path);
        assert_eq!(result.unwrap(), path);
        let _ = std::fs::remove_file(&path);
    }
}
