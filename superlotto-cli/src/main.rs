mod display;
mod import;

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use superlotto_db::db::{
    count_draws, db_path, fetch_draws_between, fetch_draws_page, fetch_last_draws, insert_draw,
    migrate, open_db,
};
use superlotto_db::models::{validate_draw, Draw, Zone};
use superlotto_db::rusqlite::Connection;
use superlotto_engine::ensemble;
use superlotto_engine::frequency;
use superlotto_engine::markov::MarkovModel;
use superlotto_engine::patterns::{self, PatternType};
use superlotto_engine::predict::{self, Algorithm, PredictionParams};
use superlotto_engine::suggestions;
use superlotto_engine::EngineConfig;

use crate::display::{
    display_consensus, display_draws, display_frequency, display_grids, display_import_summary,
    display_markov, display_outcome, display_pattern, display_prediction,
};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum AlgorithmArg {
    WeightedFrequency,
    PatternBased,
    HotNumbers,
    ColdNumbers,
    MarkovChain,
    PositionAnalysis,
}

impl From<AlgorithmArg> for Algorithm {
    fn from(arg: AlgorithmArg) -> Self {
        match arg {
            AlgorithmArg::WeightedFrequency => Algorithm::WeightedFrequency,
            AlgorithmArg::PatternBased => Algorithm::PatternBased,
            AlgorithmArg::HotNumbers => Algorithm::HotNumbers,
            AlgorithmArg::ColdNumbers => Algorithm::ColdNumbers,
            AlgorithmArg::MarkovChain => Algorithm::MarkovChain,
            AlgorithmArg::PositionAnalysis => Algorithm::PositionAnalysis,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum PatternArg {
    Consecutive,
    OddEven,
    SumRanges,
    Gaps,
    Positions,
    All,
}

#[derive(Parser)]
#[command(name = "superlotto", about = "Super Lotto draw analysis and prediction")]
struct Cli {
    /// Engine configuration file (TOML); defaults are used when absent
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Import draws from a CSV file
    Import {
        /// Path to the CSV file (issue,date,f1..f5,b1,b2[,jackpot[,winners]])
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Print the database path
    DbPath,

    /// List recent draws, or draws in a date range
    List {
        /// Number of most recent draws to show
        #[arg(short, long, default_value = "10")]
        last: u32,

        /// Zero-based page of `--last` draws, most recent first
        #[arg(short, long)]
        page: Option<u32>,

        /// Start date (YYYY-MM-DD); requires --to
        #[arg(long)]
        from: Option<NaiveDate>,

        /// End date (YYYY-MM-DD); requires --from
        #[arg(long)]
        to: Option<NaiveDate>,
    },

    /// Add a draw manually
    Add,

    /// Frequency statistics with hot/cold scores
    Stats {
        /// Analysis window in days
        #[arg(short, long, default_value = "365")]
        window: i64,

        /// Recency half-life in days
        #[arg(long, default_value = "30")]
        half_life: f64,
    },

    /// Structural pattern detection
    Patterns {
        /// Which pattern to analyze
        #[arg(short, long, default_value = "all")]
        pattern: PatternArg,

        /// Analysis window in days
        #[arg(short, long, default_value = "365")]
        window: i64,
    },

    /// Markov next-number forecast from the latest draw
    Markov {
        /// Chain order (1-3)
        #[arg(short, long, default_value = "1")]
        order: usize,

        /// Analysis window in days
        #[arg(short, long, default_value = "365")]
        window: i64,

        /// Per-draw decay factor in (0, 1]
        #[arg(short, long)]
        decay: Option<f64>,
    },

    /// Generate a prediction with one strategy
    Predict {
        /// Prediction strategy
        #[arg(short, long, default_value = "weighted-frequency")]
        algorithm: AlgorithmArg,

        /// Analysis window in days
        #[arg(short, long, default_value = "365")]
        window: i64,

        /// Recency half-life in days
        #[arg(long, default_value = "30")]
        half_life: f64,

        /// Markov chain order (1-3)
        #[arg(short, long, default_value = "1")]
        order: usize,

        /// Cap on the number of most recent draws scanned
        #[arg(long)]
        max_draws: Option<usize>,
    },

    /// Combine all strategies into a weighted consensus
    Ensemble {
        /// Analysis window in days
        #[arg(short, long, default_value = "365")]
        window: i64,

        /// Recency half-life in days
        #[arg(long, default_value = "30")]
        half_life: f64,

        /// Markov chain order (1-3)
        #[arg(short, long, default_value = "1")]
        order: usize,

        /// Per-member weights (defaults to equal weights)
        #[arg(long, value_delimiter = ',')]
        weights: Option<Vec<f64>>,

        /// Number of alternative grids sampled from the vote distribution
        #[arg(long, default_value = "3")]
        alternatives: usize,

        /// RNG seed for the alternatives (defaults to today's date)
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Check a strategy against a known draw
    Validate {
        /// Issue number of the draw to predict retroactively
        issue: String,

        /// Prediction strategy
        #[arg(short, long, default_value = "weighted-frequency")]
        algorithm: AlgorithmArg,

        /// Analysis window in days
        #[arg(short, long, default_value = "365")]
        window: i64,
    },

    /// Suggest playable grids sampled from hot-score probabilities
    Grids {
        /// Number of grids
        #[arg(short, long, default_value = "5")]
        count: usize,

        /// RNG seed (defaults to today's date)
        #[arg(long)]
        seed: Option<u64>,

        /// Analysis window in days
        #[arg(short, long, default_value = "365")]
        window: i64,

        /// Recency half-life in days
        #[arg(long, default_value = "30")]
        half_life: f64,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = match &cli.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };

    let path = db_path();
    tracing::debug!(db = %path.display(), "opening store");
    let conn = open_db(&path)?;
    migrate(&conn)?;

    match cli.command {
        Command::Import { file } => cmd_import(&conn, &file),
        Command::DbPath => {
            println!("{}", path.display());
            Ok(())
        }
        Command::List {
            last,
            page,
            from,
            to,
        } => cmd_list(&conn, last, page, from, to),
        Command::Add => cmd_add(&conn),
        Command::Stats { window, half_life } => cmd_stats(&conn, window, half_life),
        Command::Patterns { pattern, window } => cmd_patterns(&conn, &cfg, pattern, window),
        Command::Markov {
            order,
            window,
            decay,
        } => cmd_markov(&conn, &cfg, order, window, decay),
        Command::Predict {
            algorithm,
            window,
            half_life,
            order,
            max_draws,
        } => cmd_predict(&conn, &cfg, algorithm, window, half_life, order, max_draws),
        Command::Ensemble {
            window,
            half_life,
            order,
            weights,
            alternatives,
            seed,
        } => cmd_ensemble(&conn, &cfg, window, half_life, order, weights, alternatives, seed),
        Command::Validate {
            issue,
            algorithm,
            window,
        } => cmd_validate(&conn, &cfg, &issue, algorithm, window),
        Command::Grids {
            count,
            seed,
            window,
            half_life,
        } => cmd_grids(&conn, count, seed, window, half_life),
    }
}

/// Full history in chronological order, or None with a hint when the
/// database is empty.
fn load_history(conn: &Connection) -> Result<Option<Vec<Draw>>> {
    let n = count_draws(conn)?;
    if n == 0 {
        println!("Empty database. Run first: superlotto import --file <csv>");
        return Ok(None);
    }
    let mut draws = fetch_last_draws(conn, n)?;
    draws.reverse();
    Ok(Some(draws))
}

fn cmd_import(conn: &Connection, file: &PathBuf) -> Result<()> {
    let result = import::import_csv(conn, file)?;
    display_import_summary(&result);
    Ok(())
}

fn cmd_list(
    conn: &Connection,
    last: u32,
    page: Option<u32>,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> Result<()> {
    if count_draws(conn)? == 0 {
        println!("Empty database. Run first: superlotto import --file <csv>");
        return Ok(());
    }
    let draws = match (from, to) {
        (Some(from), Some(to)) => {
            if from > to {
                bail!("--from must not be after --to");
            }
            fetch_draws_between(conn, from, to)?
        }
        (None, None) => match page {
            Some(page) => fetch_draws_page(conn, last, page * last)?,
            None => fetch_last_draws(conn, last)?,
        },
        _ => bail!("--from and --to must be given together"),
    };
    display_draws(&draws);
    Ok(())
}

fn cmd_stats(conn: &Connection, window: i64, half_life: f64) -> Result<()> {
    let Some(draws) = load_history(conn)? else {
        return Ok(());
    };
    let front = frequency::analyze(&draws, Zone::Front, window, half_life)?;
    let back = frequency::analyze(&draws, Zone::Back, window, half_life)?;
    display_frequency(&front, &back, window);
    Ok(())
}

fn cmd_patterns(
    conn: &Connection,
    cfg: &EngineConfig,
    pattern: PatternArg,
    window: i64,
) -> Result<()> {
    let Some(draws) = load_history(conn)? else {
        return Ok(());
    };
    let selected: &[PatternType] = match pattern {
        PatternArg::Consecutive => &[PatternType::Consecutive],
        PatternArg::OddEven => &[PatternType::OddEven],
        PatternArg::SumRanges => &[PatternType::SumRanges],
        PatternArg::Gaps => &[PatternType::GapPatterns],
        PatternArg::Positions => &[PatternType::PositionPatterns],
        PatternArg::All => &[
            PatternType::Consecutive,
            PatternType::OddEven,
            PatternType::SumRanges,
            PatternType::GapPatterns,
            PatternType::PositionPatterns,
        ],
    };
    for &pattern in selected {
        let analysis = patterns::analyze(pattern, &draws, window, cfg)?;
        display_pattern(&analysis);
    }
    Ok(())
}

fn cmd_markov(
    conn: &Connection,
    cfg: &EngineConfig,
    order: usize,
    window: i64,
    decay: Option<f64>,
) -> Result<()> {
    let Some(draws) = load_history(conn)? else {
        return Ok(());
    };
    let decay = decay.unwrap_or(cfg.default_markov_decay);
    let model = MarkovModel::build(&draws, order, window, decay)?;

    let latest = draws.last().context("history checked non-empty")?;
    let sorted = latest.sorted_front();
    let query = &sorted[sorted.len() - order.min(sorted.len())..];
    let forecast = model.predict_next(query);
    display_markov(&model, &forecast, query);
    Ok(())
}

fn cmd_predict(
    conn: &Connection,
    cfg: &EngineConfig,
    algorithm: AlgorithmArg,
    window: i64,
    half_life: f64,
    order: usize,
    max_draws: Option<usize>,
) -> Result<()> {
    let Some(draws) = load_history(conn)? else {
        return Ok(());
    };
    let params = PredictionParams {
        window_days: window,
        decay_half_life_days: half_life,
        markov_order: order,
        markov_decay: cfg.default_markov_decay,
        max_draws,
    };
    let prediction = predict::generate(algorithm.into(), &draws, &params, cfg)?;
    display_prediction(&prediction);
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn cmd_ensemble(
    conn: &Connection,
    cfg: &EngineConfig,
    window: i64,
    half_life: f64,
    order: usize,
    weights: Option<Vec<f64>>,
    alternatives: usize,
    seed: Option<u64>,
) -> Result<()> {
    let Some(draws) = load_history(conn)? else {
        return Ok(());
    };
    let weights = weights.unwrap_or_else(|| vec![1.0; Algorithm::ALL.len()]);
    let params = PredictionParams {
        window_days: window,
        decay_half_life_days: half_life,
        markov_order: order,
        markov_decay: cfg.default_markov_decay,
        max_draws: None,
    };
    let consensus = ensemble::generate(&Algorithm::ALL, &weights, &draws, &params, cfg)?;
    display_consensus(&consensus);

    if alternatives > 0 {
        let front_probs = vote_probabilities(&consensus.front_votes, Zone::Front);
        let back_probs = vote_probabilities(&consensus.back_votes, Zone::Back);
        let seed = seed.unwrap_or_else(suggestions::date_seed);
        let grids =
            suggestions::generate_grids(&front_probs, &back_probs, alternatives, seed, 20, 2)?;
        println!("\nAlternative combinations from the vote distribution:");
        display_grids(&grids);
    }
    Ok(())
}

/// Vote totals as a normalized sampling distribution over the zone.
fn vote_probabilities(votes: &[ensemble::NumberVote], zone: Zone) -> Vec<f64> {
    let mut probs = vec![0.0f64; zone.size()];
    for vote in votes {
        probs[(vote.number - 1) as usize] = vote.vote;
    }
    let total: f64 = probs.iter().sum();
    if total <= 0.0 {
        return vec![1.0 / zone.size() as f64; zone.size()];
    }
    for p in &mut probs {
        *p /= total;
    }
    probs
}

fn cmd_validate(
    conn: &Connection,
    cfg: &EngineConfig,
    issue: &str,
    algorithm: AlgorithmArg,
    window: i64,
) -> Result<()> {
    let Some(draws) = load_history(conn)? else {
        return Ok(());
    };
    let target = draws
        .iter()
        .find(|d| d.draw_number == issue)
        .with_context(|| format!("draw {} not found", issue))?
        .clone();

    // Only draws strictly before the target are fair game for the model.
    let history: Vec<Draw> = draws
        .into_iter()
        .filter(|d| d.date < target.date)
        .collect();
    if history.is_empty() {
        bail!("no draws before {} to predict from", issue);
    }

    let params = PredictionParams {
        window_days: window,
        decay_half_life_days: cfg.default_half_life_days,
        markov_order: 1,
        markov_decay: cfg.default_markov_decay,
        max_draws: None,
    };
    let prediction = predict::generate(algorithm.into(), &history, &params, cfg)?;
    let outcome = predict::validate_prediction(&prediction, &target);
    display_outcome(&prediction, &target, &outcome);
    Ok(())
}

fn cmd_grids(
    conn: &Connection,
    count: usize,
    seed: Option<u64>,
    window: i64,
    half_life: f64,
) -> Result<()> {
    let Some(draws) = load_history(conn)? else {
        return Ok(());
    };
    let front_probs = hot_probabilities(&draws, Zone::Front, window, half_life)?;
    let back_probs = hot_probabilities(&draws, Zone::Back, window, half_life)?;

    let seed = seed.unwrap_or_else(suggestions::date_seed);
    let optimal = suggestions::optimal_grid(&front_probs, &back_probs)?;
    let grids = suggestions::generate_grids(&front_probs, &back_probs, count, seed, 20, 2)?;

    println!("Optimal grid (top numbers by probability):");
    display_grids(&[optimal]);
    display_grids(&grids);
    Ok(())
}

/// Normalized hot scores as a sampling distribution; uniform when the
/// window holds no draws.
fn hot_probabilities(draws: &[Draw], zone: Zone, window: i64, half_life: f64) -> Result<Vec<f64>> {
    let records = frequency::analyze(draws, zone, window, half_life)?;
    let total: f64 = records.iter().map(|r| r.hot_score).sum();
    if total <= 0.0 {
        return Ok(vec![1.0 / zone.size() as f64; zone.size()]);
    }
    Ok(records.iter().map(|r| r.hot_score / total).collect())
}

fn cmd_add(conn: &Connection) -> Result<()> {
    println!("Add a draw manually\n");

    let draw_number = prompt("Issue number (e.g. 24086): ")?;
    let raw_date = prompt("Date (YYYY-MM-DD): ")?;
    let date: NaiveDate = raw_date
        .parse()
        .with_context(|| format!("invalid date '{}'", raw_date))?;

    let front = prompt_front()?;
    let back = prompt_back()?;
    validate_draw(&front, &back)?;

    let draw = Draw {
        id: 0,
        draw_number,
        date,
        front,
        back,
        jackpot_amount: None,
        winners_count: None,
    };

    println!("\nDraw to insert:");
    display_draws(&[draw.clone()]);

    let confirm = prompt("\nConfirm insertion? (y/n): ")?;
    if confirm.trim().to_lowercase() == "y" {
        if insert_draw(conn, &draw)? {
            println!("Draw inserted.");
        } else {
            println!("This draw already exists (duplicate ignored).");
        }
    } else {
        println!("Insertion cancelled.");
    }

    Ok(())
}

fn prompt(msg: &str) -> Result<String> {
    print!("{}", msg);
    io::stdout().flush()?;
    let mut input = String::new();
    io::stdin().read_line(&mut input).context("read error")?;
    Ok(input.trim().to_string())
}

fn prompt_front() -> Result<[u8; 5]> {
    loop {
        let input = prompt("5 front numbers (space separated, 1-35): ")?;
        let nums: Result<Vec<u8>, _> = input.split_whitespace().map(|s| s.parse::<u8>()).collect();
        match nums {
            Ok(v) if v.len() == 5 => {
                let arr = [v[0], v[1], v[2], v[3], v[4]];
                if validate_draw(&arr, &[1, 2]).is_ok() {
                    return Ok(arr);
                }
                println!("Invalid numbers (1-35, no duplicates). Try again.");
            }
            _ => println!("Enter exactly 5 numbers. Try again."),
        }
    }
}

fn prompt_back() -> Result<[u8; 2]> {
    loop {
        let input = prompt("2 back numbers (space separated, 1-12): ")?;
        let nums: Result<Vec<u8>, _> = input.split_whitespace().map(|s| s.parse::<u8>()).collect();
        match nums {
            Ok(v) if v.len() == 2 => {
                let arr = [v[0], v[1]];
                if validate_draw(&[1, 2, 3, 4, 5], &arr).is_ok() {
                    return Ok(arr);
                }
                println!("Invalid numbers (1-12, no duplicates). Try again.");
            }
            _ => println!("Enter exactly 2 numbers. Try again."),
        }
    }
}
