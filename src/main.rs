//! Coinwalk command line.
//!
//! ## Usage
//!
//! - `coinwalk estimate board.txt -k 5` - Monte Carlo estimate for K = 5
//! - `coinwalk estimate board.txt -k 3 --exhaustive` - Average over every subset
//! - `coinwalk tour board.txt` - Tour all coins on the board
//!
//! Boards use one line per row: `.` open, `*` coin, `#` wall.
//! Set `RUST_LOG=debug` for per-batch progress.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};

use coinwalk::board::{Board, Cell};
use coinwalk::constants::{DEFAULT_BATCH_SIZE, DEFAULT_LOOKAHEAD_DEPTH, DEFAULT_SLACK, DEFAULT_TRIALS};
use coinwalk::distance::DistanceMatrix;
use coinwalk::estimator::{Estimator, EstimatorConfig, StartPolicy, TrialResult};
use coinwalk::grid::GridGraph;
use coinwalk::tour::{Lookahead, TourConfig, build_tour, promising_start};

/// Coinwalk: expected steps to collect random coins on a grid
#[derive(Parser)]
#[command(name = "coinwalk")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Estimate the expected steps to collect K random coins
    Estimate {
        /// Board file
        board: PathBuf,
        /// Coins per sampled subset
        #[arg(short)]
        k: usize,
        /// Maximum number of trials
        #[arg(long, default_value_t = DEFAULT_TRIALS)]
        trials: usize,
        /// Master random seed
        #[arg(long)]
        seed: Option<u64>,
        /// Start coin choice per trial
        #[arg(long, value_enum, default_value_t = StartArg::Best)]
        start: StartArg,
        /// Stop once the confidence interval is narrower than this
        #[arg(long)]
        target_width: Option<f64>,
        /// Trials between stopping checks
        #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
        batch: usize,
        /// Average over every K-subset instead of sampling
        #[arg(long)]
        exhaustive: bool,
        /// Run on a single thread
        #[arg(long)]
        sequential: bool,
        #[command(flatten)]
        tour: TourArgs,
    },
    /// Tour every coin on the board
    Tour {
        /// Board file
        board: PathBuf,
        /// Start coin as ROW,COL (default: heuristic choice)
        #[arg(long, value_parser = parse_cell)]
        start: Option<Cell>,
        #[command(flatten)]
        tour: TourArgs,
    },
}

#[derive(Args)]
struct TourArgs {
    /// Lookahead hops past each candidate (0 = plain nearest neighbour, at most 4)
    #[arg(long, default_value_t = DEFAULT_LOOKAHEAD_DEPTH)]
    depth: usize,
    /// Score candidates by a greedy completion instead of a fixed depth
    #[arg(long, conflicts_with = "depth")]
    rollout: bool,
    /// Extra moves within which farther candidates still compete
    #[arg(long, default_value_t = DEFAULT_SLACK)]
    slack: u32,
}

impl TourArgs {
    fn config(&self) -> TourConfig {
        let lookahead = if self.rollout {
            Lookahead::Rollout
        } else {
            Lookahead::Hops(self.depth)
        };
        TourConfig::default()
            .with_slack(self.slack)
            .with_lookahead(lookahead)
    }
}

#[derive(Copy, Clone, ValueEnum)]
enum StartArg {
    Random,
    Best,
    Mean,
    Heuristic,
}

impl From<StartArg> for StartPolicy {
    fn from(arg: StartArg) -> Self {
        match arg {
            StartArg::Random => StartPolicy::Random,
            StartArg::Best => StartPolicy::Best,
            StartArg::Mean => StartPolicy::Mean,
            StartArg::Heuristic => StartPolicy::Heuristic,
        }
    }
}

fn parse_cell(s: &str) -> std::result::Result<Cell, String> {
    let (r, c) = s
        .split_once(',')
        .ok_or_else(|| format!("expected ROW,COL, got {s:?}"))?;
    let row = r.trim().parse().map_err(|e| format!("bad row {r:?}: {e}"))?;
    let col = c.trim().parse().map_err(|e| format!("bad column {c:?}: {e}"))?;
    Ok(Cell::new(row, col))
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Estimate {
            board,
            k,
            trials,
            seed,
            start,
            target_width,
            batch,
            exhaustive,
            sequential,
            tour,
        } => {
            let board = load_board(&board)?;
            let mut config = EstimatorConfig::new(k)
                .with_trials(trials)
                .with_start(start.into())
                .with_tour(tour.config())
                .with_batch_size(batch)
                .with_parallel(!sequential);
            if let Some(seed) = seed {
                config = config.with_seed(seed);
            }
            if let Some(width) = target_width {
                config = config.with_target_ci_width(width);
            }

            let estimator = Estimator::new(&board, config)?;
            let result = if exhaustive {
                estimator.enumerate()?
            } else {
                estimator.run()?
            };
            println!("{result}");
            if let Some(best) = &result.best {
                print_trial("best", best);
            }
            if let Some(worst) = &result.worst {
                print_trial("worst", worst);
            }
        }
        Commands::Tour { board, start, tour } => {
            let board = load_board(&board)?;
            if board.coins().is_empty() {
                bail!("board has no coins");
            }
            let graph = GridGraph::new(&board)?;
            let matrix = DistanceMatrix::build(&graph, board.coins())?;
            let start = match start {
                Some(cell) => match matrix.coins().iter().position(|&c| c == cell) {
                    Some(i) => i,
                    None => bail!("no coin at {cell}"),
                },
                None => promising_start(&matrix),
            };
            let config = tour.config();
            config.validate()?;
            let tour = build_tour(&matrix, start, &config);
            println!("{} steps", tour.cost);
            println!("{}", format_cells(&tour.cells(&matrix)));
        }
    }
    Ok(())
}

fn load_board(path: &Path) -> Result<Board> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading board {}", path.display()))?;
    Board::parse(&text).with_context(|| format!("parsing board {}", path.display()))
}

fn print_trial(label: &str, trial: &TrialResult) {
    println!("{label}: {} steps from {}", trial.cost, trial.start);
    println!("  {}", format_cells(&trial.tour));
}

fn format_cells(cells: &[Cell]) -> String {
    cells
        .iter()
        .map(|c| c.to_string())
        .collect::<Vec<_>>()
        .join(" -> ")
}
