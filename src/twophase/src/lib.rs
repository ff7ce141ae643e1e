#![allow(clippy::similar_names, clippy::too_many_lines)]

//! Kociemba's two-phase algorithm: phase 1 brings a cube into the subgroup
//! `<U, D, R2, F2, L2, B2>`, phase 2 solves it inside that subgroup, and both
//! run IDA* over coordinate move tables guided by pruning tables.

pub mod cache;
pub mod canonical_fsm;
pub mod config;
pub mod coord;
pub mod move_tables;
pub mod pruning;
pub mod solver;

pub use config::{ConfigError, SearchConfig, SolverConfig, TableConfig};
pub use pruning::Tables;
pub use solver::{Solution, SolveError, Solver};

use cube_core::{facelet::ColorScheme, validate::validate_facelets};
use std::sync::{Arc, LazyLock};

#[macro_export]
macro_rules! start {
    ($msg:expr) => {
        concat!("⏳ ", $msg)
    };
}

#[macro_export]
macro_rules! working {
    ($msg:expr) => {
        concat!("🛠  ", $msg)
    };
}

#[macro_export]
macro_rules! success {
    ($msg:expr) => {
        concat!("✅ ", $msg)
    };
}

const FACT_UNTIL_12: [usize; 13] = {
    let mut arr = [0; 13];
    arr[0] = 1;
    let mut i = 1;
    while i < arr.len() {
        arr[i] = arr[i - 1] * i;
        i += 1;
    }
    arr
};

static TABLES: LazyLock<Arc<Tables>> =
    LazyLock::new(|| Arc::new(Tables::load_or_generate(&TableConfig::default())));

/// The process-wide tables, loaded from the cache or generated on first use.
#[must_use]
pub fn tables() -> Arc<Tables> {
    Arc::clone(&TABLES)
}

/// Solve a color grid in the default color scheme with the default search
/// configuration.
///
/// # Errors
///
/// See [`SolveError`].
pub fn solve(facelets: &str) -> Result<Solution, SolveError> {
    Solver::new(tables()).solve_facelets(facelets, &ColorScheme::default())
}

/// Check a color grid in the default color scheme without solving it.
///
/// # Errors
///
/// With the malformed or unsolvable part of the input.
pub fn validate(facelets: &str) -> Result<(), SolveError> {
    validate_facelets(facelets, &ColorScheme::default())?;
    Ok(())
}
