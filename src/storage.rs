use std::{
    fs::File,
    io::{BufReader, BufWriter, Read, Write},
    path::Path,
};

use crate::api::Table;
use crate::error::{Result, StoreError};

/// Extension carried by every table snapshot file.
pub const HFILE_EXT: &str = "hfile";

const MAGIC: [u8; 4] = *b"HFIL";
const FORMAT_VERSION: u32 = 1;

/// A whole-table snapshot.
/// Layout (lengths big-endian u32):
///
/// 1) [4 bytes: magic "HFIL"]
/// 2) [u32: format version]
/// 3) [u32: length of encoded table]
/// 4) [bytes: bincode(Table)]
///
/// The encoded graph carries the ordered family list (default family first),
/// per-column cell sequences, per-cell value histories with timestamps, and
/// the `enabled`/`indexed` flags. Index trees are never encoded; the reader
/// rebuilds them.
pub struct HFile;

impl HFile {
    /// Write `table` to `path`, replacing any previous snapshot.
    pub fn write(path: impl AsRef<Path>, table: &Table) -> Result<()> {
        let f = File::create(&path)?;
        let mut w = BufWriter::new(f);

        w.write_all(&MAGIC)?;
        w.write_all(&FORMAT_VERSION.to_be_bytes())?;

        let body = bincode::serialize(table)?;
        w.write_all(&(body.len() as u32).to_be_bytes())?;
        w.write_all(&body)?;
        w.flush()?;
        Ok(())
    }
}

/// Reader for a single snapshot file; a table decodes independently of any
/// other table.
pub struct HFileReader;

impl HFileReader {
    pub fn read(path: impl AsRef<Path>) -> Result<Table> {
        let path = path.as_ref();
        let f = File::open(path)?;
        let mut r = BufReader::new(f);

        let mut magic = [0u8; 4];
        r.read_exact(&mut magic)?;
        if magic != MAGIC {
            return Err(Self::bad(path, "not an hfile snapshot"));
        }

        let mut buf4 = [0u8; 4];
        r.read_exact(&mut buf4)?;
        let version = u32::from_be_bytes(buf4);
        if version != FORMAT_VERSION {
            return Err(Self::bad(
                path,
                &format!("unsupported format version {}", version),
            ));
        }

        r.read_exact(&mut buf4)?;
        let len = u32::from_be_bytes(buf4) as usize;
        let mut body = vec![0u8; len];
        r.read_exact(&mut body)?;

        let mut table: Table = bincode::deserialize(&body)?;
        table.restore_indexes();
        Ok(table)
    }

    fn bad(path: &Path, reason: &str) -> StoreError {
        StoreError::BadSnapshot {
            path: path.display().to_string(),
            reason: reason.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::Payload;
    use std::fs;
    use tempfile::tempdir;

    fn sample_table() -> Table {
        let mut table = Table::new(["info", "meta"]);
        table.insert_or_update_row("r1", "info", "name", "Ana");
        table.insert_or_update_row("r1", "info", "age", "30");
        table.insert_or_update_row("r1", "info", "age", "31");
        table.insert_or_update_row("r2", "meta", "flag", "true");
        table
    }

    #[test]
    fn test_snapshot_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("users.hfile");

        let mut table = sample_table();
        table.set_enabled(false);
        HFile::write(&path, &table).unwrap();

        let loaded = HFileReader::read(&path).unwrap();
        assert!(!loaded.is_enabled());
        assert!(!loaded.is_indexed());
        assert_eq!(loaded.row_count(), 2);
        assert_eq!(loaded.family_names(), vec!["info", "meta"]);

        let cell = loaded
            .family("info")
            .unwrap()
            .column("age")
            .unwrap()
            .search("r1")
            .unwrap();
        assert_eq!(cell.version_count(), 2);
        assert_eq!(cell.current(), Some(&Payload::Int(31)));

        // Timestamps survive byte-for-byte
        let written = table
            .family("info")
            .unwrap()
            .column("age")
            .unwrap()
            .search("r1")
            .unwrap()
            .current_version()
            .unwrap()
            .0;
        assert_eq!(cell.current_version().unwrap().0, written);

        drop(dir); // Cleanup
    }

    #[test]
    fn test_snapshot_restores_indexes() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("users.hfile");

        let mut table = sample_table();
        table.enable_index();
        HFile::write(&path, &table).unwrap();

        let loaded = HFileReader::read(&path).unwrap();
        assert!(loaded.is_indexed());
        let column = loaded.family("info").unwrap().column("name").unwrap();
        assert!(column.is_indexed());
        assert!(column.index().is_some());
        assert_eq!(column.search("r1").map(|c| c.row_key()), Some("r1"));

        drop(dir); // Cleanup
    }

    #[test]
    fn test_reject_foreign_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("junk.hfile");
        fs::write(&path, b"definitely not a snapshot").unwrap();

        let result = HFileReader::read(&path);
        assert!(matches!(result, Err(StoreError::BadSnapshot { .. })));

        drop(dir); // Cleanup
    }

    #[test]
    fn test_reject_unknown_version() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("future.hfile");
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&MAGIC);
        bytes.extend_from_slice(&99u32.to_be_bytes());
        bytes.extend_from_slice(&0u32.to_be_bytes());
        fs::write(&path, &bytes).unwrap();

        let result = HFileReader::read(&path);
        assert!(matches!(result, Err(StoreError::BadSnapshot { .. })));

        drop(dir); // Cleanup
    }
}
