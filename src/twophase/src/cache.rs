//! On-disk cache of the pruning tables.
//!
//! Layout: the magic bytes, a little endian `u32` format version, the depth
//! cap, then for each pruning table a little endian `u64` length followed by
//! that many depth bytes.

use crate::{
    config::TableConfig,
    move_tables::MoveTables,
    pruning::{PruningTable, Tables},
    start, success,
};
use log::{debug, info, warn};
use std::{
    fs, io,
    path::{Path, PathBuf},
    time::Instant,
};
use thiserror::Error;

const MAGIC: &[u8; 8] = b"TWOPHASE";
const VERSION: u32 = 1;

#[derive(Error, Debug)]
pub enum TableCacheError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("Not a table cache file")]
    BadMagic,
    #[error("Table cache has format version {found}, expected {VERSION}")]
    Version { found: u32 },
    #[error("Table cache was built with depth cap {found}, expected {expected}")]
    DepthCap { found: u8, expected: u8 },
    #[error("Table {table} has {found} entries, expected {expected}")]
    LengthMismatch {
        table: usize,
        found: u64,
        expected: u64,
    },
    #[error("Table {table} holds depths no search could have produced")]
    Corrupt { table: usize },
    #[error("Table cache ends early")]
    Truncated,
    #[error("Table cache has {0} trailing bytes")]
    TrailingBytes(usize),
}

/// The cache file for tables built with `depth_cap`.
#[must_use]
pub fn cache_file(dir: &Path, depth_cap: u8) -> PathBuf {
    dir.join(format!("pruning-v{VERSION}-cap{depth_cap}.bin"))
}

/// Serialize the pruning tables of `tables`.
#[must_use]
pub fn encode(tables: &Tables) -> Vec<u8> {
    let pruning = tables.pruning_tables();
    let mut out = Vec::with_capacity(16 + pruning.iter().map(|t| t.len() + 8).sum::<usize>());
    out.extend_from_slice(MAGIC);
    out.extend_from_slice(&VERSION.to_le_bytes());
    out.push(tables.depth_cap);
    for table in pruning {
        out.extend_from_slice(&(table.len() as u64).to_le_bytes());
        out.extend_from_slice(table.as_bytes());
    }
    out
}

struct Reader<'a> {
    bytes: &'a [u8],
}

impl<'a> Reader<'a> {
    fn take(&mut self, len: usize) -> Result<&'a [u8], TableCacheError> {
        if self.bytes.len() < len {
            return Err(TableCacheError::Truncated);
        }
        let (head, tail) = self.bytes.split_at(len);
        self.bytes = tail;
        Ok(head)
    }

    fn take_array<const N: usize>(&mut self) -> Result<[u8; N], TableCacheError> {
        let mut out = [0; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }
}

/// Deserialize pruning tables written by [`encode`], checking them against
/// the expected shapes and depth cap, and checking that every entry is a
/// plausible distance.
///
/// # Errors
///
/// If the bytes are not a cache file for this version and depth cap.
pub fn decode(bytes: &[u8], depth_cap: u8) -> Result<[PruningTable; 4], TableCacheError> {
    let mut reader = Reader { bytes };

    if &reader.take_array::<8>()? != MAGIC {
        return Err(TableCacheError::BadMagic);
    }
    let version = u32::from_le_bytes(reader.take_array()?);
    if version != VERSION {
        return Err(TableCacheError::Version { found: version });
    }
    let [found_cap] = reader.take_array()?;
    if found_cap != depth_cap {
        return Err(TableCacheError::DepthCap {
            found: found_cap,
            expected: depth_cap,
        });
    }

    let mut tables = Vec::with_capacity(4);
    for (table, (a_count, b_count)) in Tables::PRUNING_SHAPES.into_iter().enumerate() {
        let found = u64::from_le_bytes(reader.take_array()?);
        let expected = (a_count * b_count) as u64;
        if found != expected {
            return Err(TableCacheError::LengthMismatch {
                table,
                found,
                expected,
            });
        }
        let depths = reader.take(a_count * b_count)?;
        // Only the solved pair is at distance 0
        let plausible = depths.split_first().is_some_and(|(&solved, rest)| {
            solved == 0 && rest.iter().all(|&d| d != 0 && d <= depth_cap)
        });
        if !plausible {
            return Err(TableCacheError::Corrupt { table });
        }
        tables.push(PruningTable::from_raw(depths.into(), b_count));
    }

    if !reader.bytes.is_empty() {
        return Err(TableCacheError::TrailingBytes(reader.bytes.len()));
    }

    tables.try_into().map_err(|_| TableCacheError::Truncated)
}

impl Tables {
    /// Load the pruning tables from the cache directory, or generate and
    /// store them there. Cache problems are logged and never fatal.
    #[must_use]
    pub fn load_or_generate(config: &TableConfig) -> Self {
        let Some(dir) = config.cache_dir().filter(|_| config.use_cache) else {
            return Self::generate(config);
        };
        let depth_cap = config.effective_depth_cap();
        let path = cache_file(&dir, depth_cap);

        match Self::load(&path, depth_cap) {
            Ok(tables) => return tables,
            Err(TableCacheError::Io(e)) if e.kind() == io::ErrorKind::NotFound => {
                debug!("No table cache at {}", path.display());
            }
            Err(e) => {
                warn!(
                    "Ignoring unusable table cache at {}: {e}; regenerating",
                    path.display()
                );
            }
        }

        let tables = Self::generate(config);
        match tables.store(&path) {
            Ok(()) => info!("Stored pruning tables in {}", path.display()),
            Err(e) => warn!("Failed to store pruning tables in {}: {e}", path.display()),
        }
        tables
    }

    /// # Errors
    ///
    /// If the file cannot be read or does not hold tables for `depth_cap`.
    pub fn load(path: &Path, depth_cap: u8) -> Result<Self, TableCacheError> {
        info!(start!("Loading pruning tables from {}"), path.display());
        let start = Instant::now();

        let bytes = fs::read(path)?;
        let pruning = decode(&bytes, depth_cap)?;
        let tables = Self::from_parts(MoveTables::generate(), pruning, depth_cap);

        info!(
            success!("Loaded pruning tables in {:.3}s"),
            start.elapsed().as_secs_f64()
        );
        Ok(tables)
    }

    /// # Errors
    ///
    /// If the directory cannot be created or the file cannot be written.
    pub fn store(&self, path: &Path) -> Result<(), TableCacheError> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        // Write then rename so a concurrent reader never sees half a file
        let partial = path.with_extension("partial");
        fs::write(&partial, encode(self))?;
        fs::rename(&partial, path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::LazyLock;

    static TABLES: LazyLock<Tables> =
        LazyLock::new(|| Tables::generate(&TableConfig::default().with_cache(false)));

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("twophase-{name}-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn encode_then_decode() {
        let bytes = encode(&TABLES);
        let decoded = decode(&bytes, TABLES.depth_cap).unwrap();
        assert_eq!(decoded, TABLES.pruning_tables().map(Clone::clone));
    }

    #[test]
    fn rejects_damaged_files() {
        let bytes = encode(&TABLES);

        let mut bad_magic = bytes.clone();
        bad_magic[0] = b'X';
        assert!(matches!(
            decode(&bad_magic, TABLES.depth_cap),
            Err(TableCacheError::BadMagic)
        ));

        let mut bad_version = bytes.clone();
        bad_version[8] = 99;
        assert!(matches!(
            decode(&bad_version, TABLES.depth_cap),
            Err(TableCacheError::Version { found: 99 })
        ));

        assert!(matches!(
            decode(&bytes, TABLES.depth_cap - 1),
            Err(TableCacheError::DepthCap { .. })
        ));

        assert!(matches!(
            decode(&bytes[..bytes.len() - 1], TABLES.depth_cap),
            Err(TableCacheError::Truncated)
        ));

        let mut trailing = bytes.clone();
        trailing.push(0);
        assert!(matches!(
            decode(&trailing, TABLES.depth_cap),
            Err(TableCacheError::TrailingBytes(1))
        ));

        let mut bad_length = bytes;
        bad_length[13] ^= 1;
        assert!(matches!(
            decode(&bad_length, TABLES.depth_cap),
            Err(TableCacheError::LengthMismatch { table: 0, .. })
        ));
    }

    /// Offsets of each table's depth bytes in an encoded cache.
    fn table_ranges() -> Vec<std::ops::Range<usize>> {
        let mut offset = MAGIC.len() + 4 + 1;
        Tables::PRUNING_SHAPES
            .into_iter()
            .map(|(a, b)| {
                let start = offset + 8;
                offset = start + a * b;
                start..offset
            })
            .collect()
    }

    #[test]
    fn rejects_damaged_contents() {
        let ranges = table_ranges();
        let bytes = encode(&TABLES);
        assert_eq!(ranges.last().unwrap().end, bytes.len());

        let mut zeroed = bytes.clone();
        zeroed[ranges[2].clone()].fill(0);
        assert!(matches!(
            decode(&zeroed, TABLES.depth_cap),
            Err(TableCacheError::Corrupt { table: 2 })
        ));

        let mut unsolved = bytes.clone();
        unsolved[ranges[0].start] = 3;
        assert!(matches!(
            decode(&unsolved, TABLES.depth_cap),
            Err(TableCacheError::Corrupt { table: 0 })
        ));

        let mut too_deep = bytes;
        too_deep[ranges[3].end - 1] = TABLES.depth_cap + 1;
        assert!(matches!(
            decode(&too_deep, TABLES.depth_cap),
            Err(TableCacheError::Corrupt { table: 3 })
        ));
    }

    #[test]
    fn store_then_load() {
        let dir = scratch_dir("store");
        let path = cache_file(&dir, TABLES.depth_cap);
        TABLES.store(&path).unwrap();

        let loaded = Tables::load(&path, TABLES.depth_cap).unwrap();
        assert_eq!(loaded.pruning_tables(), TABLES.pruning_tables());

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn corrupt_cache_is_regenerated() {
        let dir = scratch_dir("corrupt");
        let config = TableConfig::default().with_cache_dir(dir.clone());
        let path = cache_file(&dir, config.depth_cap);
        fs::create_dir_all(&dir).unwrap();
        fs::write(&path, b"garbage").unwrap();

        let tables = Tables::load_or_generate(&config);
        assert_eq!(tables.pruning_tables(), TABLES.pruning_tables());
        assert!(Tables::load(&path, config.depth_cap).is_ok());

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn cache_with_zeroed_depths_is_regenerated() {
        let dir = scratch_dir("zeroed");
        let config = TableConfig::default().with_cache_dir(dir.clone());
        let path = cache_file(&dir, config.depth_cap);

        let mut bytes = encode(&TABLES);
        for range in table_ranges() {
            bytes[range].fill(0);
        }
        fs::create_dir_all(&dir).unwrap();
        fs::write(&path, bytes).unwrap();

        let tables = Tables::load_or_generate(&config);
        assert_eq!(tables.pruning_tables(), TABLES.pruning_tables());
        assert_eq!(fs::read(&path).unwrap(), encode(&TABLES));

        fs::remove_dir_all(&dir).unwrap();
    }
}
