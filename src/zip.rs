use byteorder::{LittleEndian, ReadBytesExt};
use flate2::read::DeflateDecoder;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Component, Path};

use crate::errors::TarnError;

// The Terrain 50 distribution is plain zip archives (an outer archive of
// the whole dataset, and one small archive per 10km square). Only the two
// compression methods that actually occur are supported: stored and
// deflate.

const END_OF_CENTRAL_DIR_SIG: u32 = 0x06054b50;
const CENTRAL_DIR_ENTRY_SIG: u32 = 0x02014b50;
const LOCAL_HEADER_SIG: u32 = 0x04034b50;

const METHOD_STORED: u16 = 0;
const METHOD_DEFLATED: u16 = 8;

// EOCD record is 22 bytes plus a comment of up to 65535 bytes.
const END_OF_CENTRAL_DIR_MAX_SCAN: u64 = 22 + 65535;

#[derive(Clone, Debug)]
pub struct ZipEntry {
    pub name: String,
    method: u16,
    compressed_size: u32,
    pub uncompressed_size: u32,
    local_header_offset: u32,
}

/// Read-only view of a zip archive.
pub struct ZipArchive<R: Read + Seek> {
    reader: R,
    entries: Vec<ZipEntry>,
}

impl ZipArchive<File> {
    pub fn open_file(path: &Path) -> Result<ZipArchive<File>, TarnError> {
        let file = File::open(path).map_err(|e| {
            TarnError::new(&format!(
                "Failed to open zip file {}: {}",
                path.display(),
                e
            ))
        })?;
        ZipArchive::open(file)
    }
}

impl<R: Read + Seek> ZipArchive<R> {
    /// Reads the central directory and returns the opened archive.
    pub fn open(mut reader: R) -> Result<ZipArchive<R>, TarnError> {
        let (entry_count, directory_offset) =
            find_end_of_central_dir(&mut reader)?;

        reader
            .seek(SeekFrom::Start(directory_offset as u64))
            .map_err(|e| {
                TarnError::new(&format!(
                    "Failed to seek to the central directory: {}",
                    e
                ))
            })?;

        let mut entries = Vec::with_capacity(entry_count as usize);
        for _ in 0..entry_count {
            entries.push(read_central_dir_entry(&mut reader)?);
        }

        Ok(ZipArchive { reader, entries })
    }

    pub fn entries(&self) -> &[ZipEntry] {
        &self.entries
    }

    /// Reads and decompresses the named entry.
    pub fn read_entry(&mut self, name: &str) -> Result<Vec<u8>, TarnError> {
        let entry = self
            .entries
            .iter()
            .find(|e| e.name == name)
            .cloned()
            .ok_or_else(|| {
                TarnError::new(&format!("No entry {} in zip archive", name))
            })?;

        self.read_entry_data(&entry)
    }

    fn read_entry_data(
        &mut self,
        entry: &ZipEntry,
    ) -> Result<Vec<u8>, TarnError> {
        let map_io = |what: &str, e: std::io::Error| {
            TarnError::new(&format!(
                "Failed to {} for zip entry {}: {}",
                what, entry.name, e
            ))
        };

        self.reader
            .seek(SeekFrom::Start(entry.local_header_offset as u64))
            .map_err(|e| map_io("seek to the local header", e))?;

        let signature = self
            .reader
            .read_u32::<LittleEndian>()
            .map_err(|e| map_io("read the local header", e))?;
        if signature != LOCAL_HEADER_SIG {
            return Err(TarnError::new(&format!(
                "Bad local header signature for zip entry {}",
                entry.name
            )));
        }

        // Skip to the name/extra length fields, then past the name and the
        // extra data. Sizes come from the central directory, which is
        // filled in even when the local header defers to a data descriptor.
        let mut fixed = [0u8; 26];
        self.reader
            .read_exact(&mut fixed)
            .map_err(|e| map_io("read the local header", e))?;
        let name_length = u16::from_le_bytes([fixed[22], fixed[23]]);
        let extra_length = u16::from_le_bytes([fixed[24], fixed[25]]);
        self.reader
            .seek(SeekFrom::Current(
                name_length as i64 + extra_length as i64,
            ))
            .map_err(|e| map_io("seek to the entry data", e))?;

        let limited =
            (&mut self.reader).take(entry.compressed_size as u64);

        let mut data = Vec::with_capacity(entry.uncompressed_size as usize);
        match entry.method {
            METHOD_STORED => {
                let mut limited = limited;
                limited
                    .read_to_end(&mut data)
                    .map_err(|e| map_io("read stored data", e))?;
            }
            METHOD_DEFLATED => {
                let mut decoder = DeflateDecoder::new(limited);
                decoder
                    .read_to_end(&mut data)
                    .map_err(|e| map_io("decompress data", e))?;
            }
            method => {
                return Err(TarnError::new(&format!(
                    "Unsupported compression method {} for zip entry {}",
                    method, entry.name
                )));
            }
        }

        if data.len() != entry.uncompressed_size as usize {
            return Err(TarnError::new(&format!(
                "Zip entry {} decompressed to {} bytes, expected {}",
                entry.name,
                data.len(),
                entry.uncompressed_size
            )));
        }

        Ok(data)
    }

    /// Unpacks every entry below the destination directory, recreating the
    /// archive's directory structure.
    pub fn extract_all(&mut self, dest: &Path) -> Result<(), TarnError> {
        let entries = self.entries.clone();
        for entry in &entries {
            let relative = safe_entry_path(&entry.name)?;
            let target = dest.join(relative);

            if entry.name.ends_with('/') {
                std::fs::create_dir_all(&target).map_err(|e| {
                    TarnError::new(&format!(
                        "Failed to create directory {}: {}",
                        target.display(),
                        e
                    ))
                })?;
                continue;
            }

            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    TarnError::new(&format!(
                        "Failed to create directory {}: {}",
                        parent.display(),
                        e
                    ))
                })?;
            }

            let data = self.read_entry_data(entry)?;
            let mut file = File::create(&target).map_err(|e| {
                TarnError::new(&format!(
                    "Failed to create {}: {}",
                    target.display(),
                    e
                ))
            })?;
            file.write_all(&data).map_err(|e| {
                TarnError::new(&format!(
                    "Failed to write {}: {}",
                    target.display(),
                    e
                ))
            })?;
        }
        Ok(())
    }
}

/// Rejects entry names that would escape the extraction directory.
fn safe_entry_path(name: &str) -> Result<&Path, TarnError> {
    let path = Path::new(name);
    let escapes = path.components().any(|c| {
        matches!(
            c,
            Component::ParentDir | Component::RootDir | Component::Prefix(_)
        )
    });
    if escapes {
        return Err(TarnError::new(&format!(
            "Refusing to extract zip entry with unsafe name: {}",
            name
        )));
    }
    Ok(path)
}

fn find_end_of_central_dir<R: Read + Seek>(
    reader: &mut R,
) -> Result<(u16, u32), TarnError> {
    let file_size = reader.seek(SeekFrom::End(0)).map_err(|e| {
        TarnError::new(&format!("Failed to find the zip file size: {}", e))
    })?;

    let scan_size = file_size.min(END_OF_CENTRAL_DIR_MAX_SCAN);
    reader
        .seek(SeekFrom::Start(file_size - scan_size))
        .map_err(|e| {
            TarnError::new(&format!("Failed to seek in zip file: {}", e))
        })?;

    let mut tail = vec![0u8; scan_size as usize];
    reader.read_exact(&mut tail).map_err(|e| {
        TarnError::new(&format!("Failed to read the zip file tail: {}", e))
    })?;

    // Scan backwards for the end-of-central-directory signature; the
    // record may be followed by an archive comment.
    let signature = END_OF_CENTRAL_DIR_SIG.to_le_bytes();
    let mut position = None;
    if tail.len() >= 22 {
        for start in (0..=tail.len() - 22).rev() {
            if tail[start..start + 4] == signature {
                position = Some(start);
                break;
            }
        }
    }
    let start = position.ok_or_else(|| {
        TarnError::new("No end-of-central-directory record: not a zip file?")
    })?;

    let record = &tail[start..];
    let entry_count = u16::from_le_bytes([record[10], record[11]]);
    let directory_offset =
        u32::from_le_bytes([record[16], record[17], record[18], record[19]]);

    Ok((entry_count, directory_offset))
}

fn read_central_dir_entry<R: Read>(
    reader: &mut R,
) -> Result<ZipEntry, TarnError> {
    let map_io = |e: std::io::Error| {
        TarnError::new(&format!(
            "Failed to read a central directory entry: {}",
            e
        ))
    };

    let signature = reader.read_u32::<LittleEndian>().map_err(map_io)?;
    if signature != CENTRAL_DIR_ENTRY_SIG {
        return Err(TarnError::new(
            "Bad central directory entry signature in zip file",
        ));
    }

    // version made by, version needed, flags, method
    reader.read_u16::<LittleEndian>().map_err(map_io)?;
    reader.read_u16::<LittleEndian>().map_err(map_io)?;
    reader.read_u16::<LittleEndian>().map_err(map_io)?;
    let method = reader.read_u16::<LittleEndian>().map_err(map_io)?;

    // modification time and date, crc32
    reader.read_u16::<LittleEndian>().map_err(map_io)?;
    reader.read_u16::<LittleEndian>().map_err(map_io)?;
    reader.read_u32::<LittleEndian>().map_err(map_io)?;

    let compressed_size = reader.read_u32::<LittleEndian>().map_err(map_io)?;
    let uncompressed_size =
        reader.read_u32::<LittleEndian>().map_err(map_io)?;

    let name_length = reader.read_u16::<LittleEndian>().map_err(map_io)?;
    let extra_length = reader.read_u16::<LittleEndian>().map_err(map_io)?;
    let comment_length = reader.read_u16::<LittleEndian>().map_err(map_io)?;

    // disk number, internal attributes, external attributes
    reader.read_u16::<LittleEndian>().map_err(map_io)?;
    reader.read_u16::<LittleEndian>().map_err(map_io)?;
    reader.read_u32::<LittleEndian>().map_err(map_io)?;

    let local_header_offset =
        reader.read_u32::<LittleEndian>().map_err(map_io)?;

    let mut name_bytes = vec![0u8; name_length as usize];
    reader.read_exact(&mut name_bytes).map_err(map_io)?;
    let name = String::from_utf8(name_bytes).map_err(|_| {
        TarnError::new("Zip entry name is not valid UTF-8")
    })?;

    let mut skip = vec![0u8; extra_length as usize + comment_length as usize];
    reader.read_exact(&mut skip).map_err(map_io)?;

    Ok(ZipEntry {
        name,
        method,
        compressed_size,
        uncompressed_size,
        local_header_offset,
    })
}
