use clap::{ArgAction, Parser, Subcommand};
use color_eyre::eyre::{Context, eyre};
use cube_core::{
    CubieCube, MoveSequence,
    facelet::{ColorScheme, FaceletCube},
    scramble::random_state,
    validate::validate_facelets,
};
use env_logger::TimestampPrecision;
use log::{LevelFilter, debug};
use owo_colors::OwoColorize;
use std::{path::PathBuf, sync::Arc};
use twophase::{Solver, SolverConfig, Tables};

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// The solver configuration file to use, in TOML format.
    #[arg(long, short = 'c', global = true, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Log more; repeat for more detail.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Neither read nor write the pruning table cache.
    #[arg(long, global = true)]
    no_cache: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve a cube given as six groups of nine colors in U L F R B D order,
    /// or the state a move sequence leads to.
    Solve {
        /// Color letters W O G R B Y, whitespace between faces is optional.
        #[arg(required_unless_present = "scramble", num_args = 1..)]
        facelets: Vec<String>,

        /// Solve the cube reached from solved by these moves instead.
        #[arg(long, conflicts_with = "facelets")]
        scramble: Option<String>,

        /// Stop as soon as a solution this short is found.
        #[arg(long)]
        target_length: Option<usize>,

        /// Give up after this many milliseconds.
        #[arg(long)]
        timeout_ms: Option<u64>,
    },
    /// Check a cube for input and solvability errors without solving it.
    Validate {
        #[arg(required = true, num_args = 1..)]
        facelets: Vec<String>,
    },
    /// Print a random scramble and the cube it produces.
    Scramble {
        #[arg(long, short, default_value_t = 25)]
        length: usize,

        /// Seed the generator for a repeatable scramble.
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Generate the pruning tables and store them in the cache.
    Tables,
}

fn load_config(cli: &Cli) -> color_eyre::Result<SolverConfig> {
    let mut config = match &cli.config {
        Some(path) => SolverConfig::load(path)?,
        None => SolverConfig::default(),
    };
    if cli.no_cache {
        config.tables.use_cache = false;
    }
    debug!("Using configuration {config:?}");
    Ok(config)
}

fn print_cube(cube: &CubieCube) {
    let facelets = FaceletCube::from_cubie(cube);
    println!("{} {}", "Colors:".bold(), facelets.to_colors(&ColorScheme::default()));
    println!("{} {}", "Faces: ".bold(), facelets.to_face_letters());
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(match cli.verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        })
        .format_timestamp(Some(TimestampPrecision::Millis))
        .init();

    match &cli.command {
        Commands::Solve {
            facelets,
            scramble,
            target_length,
            timeout_ms,
        } => {
            let config = load_config(&cli)?;
            let mut search = config.search;
            if let Some(target_length) = *target_length {
                search.target_length = target_length;
            }
            if let Some(timeout_ms) = *timeout_ms {
                search.timeout_ms = timeout_ms;
            }

            let solver =
                Solver::new(Arc::new(Tables::load_or_generate(&config.tables))).with_config(search);

            let solution = if let Some(scramble) = scramble {
                let moves = scramble
                    .parse::<MoveSequence>()
                    .wrap_err("Invalid scramble")?;
                solver.solve_cubie(&CubieCube::from_moves(moves.iter()))?
            } else {
                solver.solve_facelets(&facelets.join(" "), &ColorScheme::default())?
            };

            if solution.is_empty() {
                println!("{}", "Already solved".green());
            } else {
                println!("{}", solution.moves.to_string().green().bold());
            }
            println!(
                "{}",
                format!(
                    "{} moves ({} in phase 1), {} nodes in {:.3}s",
                    solution.len(),
                    solution.phase1_length,
                    solution.nodes_visited,
                    solution.elapsed.as_secs_f64()
                )
                .dimmed()
            );
        }
        Commands::Validate { facelets } => {
            validate_facelets(&facelets.join(" "), &ColorScheme::default())
                .map_err(|e| eyre!("{}", e.red()))?;
            println!("{}", "Valid and solvable".green());
        }
        Commands::Scramble { length, seed } => {
            let mut rng = seed.map_or_else(fastrand::Rng::new, fastrand::Rng::with_seed);
            let (moves, cube) = random_state(*length, &mut rng);
            println!("{} {moves}", "Scramble:".bold());
            print_cube(&cube);
        }
        Commands::Tables => {
            let config = load_config(&cli)?;
            let tables = Tables::load_or_generate(&config.tables);
            match config.tables.cache_dir().filter(|_| config.tables.use_cache) {
                Some(dir) => println!("Tables are cached in {}", dir.display()),
                None => println!("{}", "Tables were generated without a cache".yellow()),
            }
            println!(
                "Depth cap {}, phase 1 tables {} and {} entries, phase 2 tables {} and {} entries",
                tables.depth_cap,
                tables.twist_slice.len(),
                tables.flip_slice.len(),
                tables.corner_slice.len(),
                tables.edge_slice.len()
            );
        }
    }

    Ok(())
}
