use log::warn;
use serde::{Deserialize, Serialize};
use std::{
    fs, io,
    path::{Path, PathBuf},
    thread::available_parallelism,
    time::Duration,
};
use thiserror::Error;

/// Solver configuration, usually read from a TOML file. Every field has a
/// default, so an empty file is a valid configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SolverConfig {
    pub search: SearchConfig,
    pub tables: TableConfig,
}

/// Limits and goals of a single solve.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SearchConfig {
    /// Stop as soon as a solution this short is found.
    pub target_length: usize,
    /// Never return a solution longer than this.
    pub max_length: usize,
    /// Upper bound on the phase 2 depth tried after a nonempty phase 1.
    pub max_phase2_depth: usize,
    /// How many phase 1 solutions to try before settling for the best
    /// solution found.
    pub max_phase1_solutions: usize,
    pub timeout_ms: u64,
    pub node_limit: u64,
}

/// How pruning tables are built and where they are kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TableConfig {
    /// Table entries saturate at this distance.
    pub depth_cap: u8,
    /// Worker threads for table generation. Defaults to the available
    /// parallelism.
    pub threads: Option<usize>,
    /// Defaults to a directory inside the user cache directory.
    pub cache_dir: Option<PathBuf>,
    pub use_cache: bool,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read configuration file {path}: {source}")]
    Io { path: PathBuf, source: io::Error },
    #[error("Failed to parse configuration file {path}: {source}")]
    Toml {
        path: PathBuf,
        source: toml::de::Error,
    },
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            target_length: 24,
            max_length: 30,
            max_phase2_depth: 12,
            max_phase1_solutions: 10_000,
            timeout_ms: 10_000,
            node_limit: 2_000_000_000,
        }
    }
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            depth_cap: 20,
            threads: None,
            cache_dir: None,
            use_cache: true,
        }
    }
}

impl SolverConfig {
    /// Read a configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// If the file cannot be read or is not a valid configuration.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_owned(),
            source,
        })?;
        Self::from_toml(&contents).map_err(|source| ConfigError::Toml {
            path: path.to_owned(),
            source,
        })
    }

    /// # Errors
    ///
    /// If `contents` is not a valid configuration.
    pub fn from_toml(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }
}

impl SearchConfig {
    #[must_use]
    pub fn with_target_length(mut self, target_length: usize) -> Self {
        self.target_length = target_length;
        self
    }

    #[must_use]
    pub fn with_max_length(mut self, max_length: usize) -> Self {
        self.max_length = max_length;
        self
    }

    #[must_use]
    pub fn with_max_phase2_depth(mut self, max_phase2_depth: usize) -> Self {
        self.max_phase2_depth = max_phase2_depth;
        self
    }

    #[must_use]
    pub fn with_max_phase1_solutions(mut self, max_phase1_solutions: usize) -> Self {
        self.max_phase1_solutions = max_phase1_solutions;
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    #[must_use]
    pub fn with_node_limit(mut self, node_limit: u64) -> Self {
        self.node_limit = node_limit;
        self
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl TableConfig {
    #[must_use]
    pub fn with_depth_cap(mut self, depth_cap: u8) -> Self {
        self.depth_cap = depth_cap;
        self
    }

    #[must_use]
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = Some(threads);
        self
    }

    #[must_use]
    pub fn with_cache_dir(mut self, cache_dir: PathBuf) -> Self {
        self.cache_dir = Some(cache_dir);
        self
    }

    #[must_use]
    pub fn with_cache(mut self, use_cache: bool) -> Self {
        self.use_cache = use_cache;
        self
    }

    /// The depth cap tables are built with. A cap of 0 is raised to 1, since
    /// an all zero table would read every state as solved.
    #[must_use]
    pub fn effective_depth_cap(&self) -> u8 {
        if self.depth_cap == 0 {
            warn!("A depth cap of 0 is not usable; using 1");
        }
        self.depth_cap.max(1)
    }

    /// The configured thread count, or the available parallelism.
    #[must_use]
    pub fn thread_count(&self) -> usize {
        if let Some(threads) = self.threads {
            return threads.max(1);
        }
        match available_parallelism() {
            Ok(v) => v.get(),
            Err(e) => {
                warn!("Failed to get available parallelism; defaulting to 1: {e}");
                1
            }
        }
    }

    /// The directory the table cache lives in, if there is one.
    #[must_use]
    pub fn cache_dir(&self) -> Option<PathBuf> {
        self.cache_dir
            .clone()
            .or_else(|| dirs::cache_dir().map(|dir| dir.join("twophase-tables")))
    }
}
