//! Mermin device CLI
//!
//! Usage:
//!   mermin                                  # Interactive mode
//!   mermin --d1 0 --d2 2 -n 20              # Batch of runs with fixed settings
//!   mermin --stats -n 10000                 # Runs per setting pair + correlation table
//!   mermin --serve                          # HTTP API server
//!   mermin --d1 1 --d2 1 --save runs.json   # Save the session history

use clap::Parser;
use colored::Colorize;
use log::{error, info};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use mermin::core::api::RunView;
use mermin::core::{parse_command, run_server, Command, CorrelationStats, Device, RunHistoryLog, LHV_MIN_AGREEMENT};
use mermin::types::{Color, DetectorSetting, ExportFormat, RunRecord};
use mermin::{Result, DEFAULT_TRIALS, STATISTICAL_TOLERANCE, VERSION};
use rand::rngs::StdRng;

#[derive(Parser, Debug)]
#[command(
    name = "mermin",
    version = VERSION,
    about = "Mermin's device - two detectors, three switch settings, one entangled pair",
    long_about = "Mermin's device demonstrates correlations no local instruction set can explain.\n\n\
                  Each detector has a switch with positions 0, 1 and 2 and a lamp that\n\
                  flashes red or green. With equal settings the lamps always match. Switch\n\
                  positions rotate by 0, π/3 and 2π/3, so over uniformly random settings\n\
                  the lamps match 13/18 of the time; --stats compares that with the 5/9\n\
                  floor of local-hidden-variable models.\n\n\
                  Modes:\n  \
                  (default)      Interactive mode\n  \
                  --d1 --d2      Fixed-setting runs (-n for how many)\n  \
                  --stats        Correlation table over all setting pairs\n  \
                  --serve        HTTP API server mode"
)]
struct Args {
    /// Detector 1 setting (0, 1 or 2)
    #[arg(long, requires = "d2", allow_hyphen_values = true)]
    d1: Option<i64>,

    /// Detector 2 setting (0, 1 or 2)
    #[arg(long, requires = "d1", allow_hyphen_values = true)]
    d2: Option<i64>,

    /// Number of runs (fixed settings) or runs per setting pair (stats)
    #[arg(short = 'n', long)]
    runs: Option<usize>,

    /// Interactive mode - read settings from stdin
    #[arg(short, long)]
    interactive: bool,

    /// Run every setting pair and print the correlation table
    #[arg(long)]
    stats: bool,

    /// Run as HTTP API server
    #[arg(short, long, conflicts_with = "save")]
    serve: bool,

    /// Server address (default: 127.0.0.1:3000)
    #[arg(long, default_value = "127.0.0.1:3000")]
    addr: String,

    /// Seed the random source for a reproducible session
    #[arg(long)]
    seed: Option<u64>,

    /// Save the history here when the session ends
    #[arg(long)]
    save: Option<PathBuf>,

    /// Export format: text or json (default: from the save path's extension)
    #[arg(long)]
    format: Option<String>,

    /// Output as JSON
    #[arg(long)]
    json: bool,

    /// Disable colors in output
    #[arg(long)]
    no_color: bool,

    /// Debug logging on stderr
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    setup_logging(args.verbose);

    if args.no_color {
        colored::control::set_override(false);
    }

    if let Err(e) = run_app(&args).await {
        error!("{}", e);
        eprintln!("{} {}", "error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn setup_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp_millis()
        .init();
}

async fn run_app(args: &Args) -> Result<()> {
    let device = match args.seed {
        Some(seed) => {
            info!("Using seeded random source ({})", seed);
            Device::seeded(seed)
        }
        None => Device::from_os_rng()?,
    };

    if args.serve {
        return run_server(&args.addr, device).await;
    }

    let history = if args.stats {
        run_stats(device, args)?
    } else if args.interactive {
        run_interactive(device, args)?
    } else if let (Some(d1), Some(d2)) = (args.d1, args.d2) {
        run_batch(device, d1, d2, args)?
    } else {
        // Default to interactive if no mode specified
        run_interactive(device, args)?
    };

    if let Some(path) = &args.save {
        save_history(&history, path, args.format.as_deref())?;
    }
    Ok(())
}

/// Fixed settings, `--runs` times
fn run_batch(mut device: Device<StdRng>, d1: i64, d2: i64, args: &Args) -> Result<RunHistoryLog> {
    let s1 = DetectorSetting::new(d1)?;
    let s2 = DetectorSetting::new(d2)?;

    for _ in 0..args.runs.unwrap_or(1) {
        let record = device.run(s1, s2)?;
        print_record(device.history().len() - 1, &record, args.json)?;
    }
    Ok(device.into_history())
}

/// Every setting pair, `--runs` times each
fn run_stats(mut device: Device<StdRng>, args: &Args) -> Result<RunHistoryLog> {
    let trials = args.runs.unwrap_or(DEFAULT_TRIALS);
    info!("Running {} trials per setting pair", trials);

    for s1 in DetectorSetting::all() {
        for s2 in DetectorSetting::all() {
            for _ in 0..trials {
                device.run(s1, s2)?;
            }
        }
    }

    let stats = device.stats();
    if args.json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        print_stats(&stats);
    }
    Ok(device.into_history())
}

/// Interactive mode
fn run_interactive(mut device: Device<StdRng>, args: &Args) -> Result<RunHistoryLog> {
    print_header();
    println!("Enter two settings (e.g. '0 2') to run. Type 'help' for commands, 'quit' to exit.");
    println!();

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("[{} runs] > ", device.history().len());
        stdout.flush()?;

        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => break,
            Ok(_) => {}
            Err(_) => break,
        }

        if line.trim().is_empty() {
            continue;
        }

        match parse_command(&line) {
            Some(Command::Run(a, b)) => {
                let settings = a.parse::<DetectorSetting>()
                    .and_then(|s1| b.parse::<DetectorSetting>().map(|s2| (s1, s2)));
                let result = settings.and_then(|(s1, s2)| device.run(s1, s2));
                match result {
                    Ok(record) => print_record(device.history().len() - 1, &record, args.json)?,
                    Err(e) => println!("{}", format!("  {}", e).yellow()),
                }
            }
            Some(Command::History) => {
                if device.history().is_empty() {
                    println!("  (no runs yet)");
                }
                for (i, record) in device.history().iter().enumerate() {
                    print_record(i, record, args.json)?;
                }
            }
            Some(Command::Stats) => print_stats(&device.stats()),
            Some(Command::Save(path)) => {
                let path = path.unwrap_or_else(default_save_path);
                if let Err(e) = save_history(device.history(), &path, args.format.as_deref()) {
                    println!("{}", format!("  Save failed: {}", e).red());
                }
            }
            Some(Command::Help) => print_help(),
            Some(Command::Quit) => {
                println!("\nSession ended. Runs: {}", device.history().len());
                break;
            }
            None => println!("{}", "  Unrecognized input - type 'help'".yellow()),
        }
    }

    Ok(device.into_history())
}

/// Write the history and report its fingerprint
fn save_history(history: &RunHistoryLog, path: &Path, format_tag: Option<&str>) -> Result<()> {
    let format = match format_tag {
        Some(tag) => tag.parse()?,
        None => ExportFormat::from_extension(path),
    };
    history.save(path, format)?;
    println!("Saved {} runs to {} ({})", history.len(), path.display(), format);
    println!("  sha256: {}", history.fingerprint()?);
    Ok(())
}

fn default_save_path() -> PathBuf {
    PathBuf::from(format!("history_{}.txt", chrono::Utc::now().format("%Y%m%d_%H%M%S")))
}

fn paint(color: Color) -> String {
    let label = format!("{:<5}", color.name());
    match color {
        Color::Red => label.red().bold().to_string(),
        Color::Green => label.green().bold().to_string(),
    }
}

fn print_record(index: usize, record: &RunRecord, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string(&RunView::new(index, record))?);
        return Ok(());
    }

    let (c1, c2) = record.colors();
    let verdict = if record.agrees() { "same".normal() } else { "different".dimmed() };
    println!(
        "  #{:<4} d1={} d2={}  {} {}  {}",
        index,
        record.setting1(),
        record.setting2(),
        paint(c1),
        paint(c2),
        verdict
    );
    Ok(())
}

fn print_stats(stats: &CorrelationStats) {
    let ratio = |v: Option<f64>| v.map(|v| format!("{:.4}", v)).unwrap_or_else(|| "-".to_string());

    println!("  d1 d2 |    runs | same (obs) | same (exp) |  error | P(A=1)");
    println!("  ------+---------+------------+------------+--------+-------");
    for tally in stats.iter() {
        println!(
            "   {}  {} | {:>7} | {:>10} | {:>10.4} | {:>6} | {:>6}",
            tally.setting1,
            tally.setting2,
            tally.runs,
            ratio(tally.observed_agreement()),
            tally.expected_agreement(),
            ratio(tally.error()),
            ratio(tally.first_marginal())
        );
    }
    println!();

    match (stats.overall_agreement(), stats.expected_overall_agreement()) {
        (Some(overall), Some(expected)) => {
            let verdict = if stats.violates_lhv_bound() {
                "below the local-hidden-variable floor".yellow()
            } else {
                "at or above the local-hidden-variable floor".green()
            };
            println!(
                "  Overall same-color rate: {:.4} (predicted {:.4}, LHV floor {:.4}) - {}",
                overall, expected, LHV_MIN_AGREEMENT, verdict
            );
            let within = if stats.within_tolerance(STATISTICAL_TOLERANCE) { "yes" } else { "no" };
            println!("  All pairs within {:.2} of prediction: {}", STATISTICAL_TOLERANCE, within);
        }
        _ => println!("  (no runs yet)"),
    }
}

fn print_header() {
    println!("{}", "========================================".bold());
    println!("{}", format!("  Mermin's device v{}", VERSION).bold());
    println!("{}", "========================================".bold());
    println!();
}

fn print_help() {
    println!("  <d1> <d2>     run with detector settings (0, 1 or 2), e.g. '0 2'");
    println!("  history       list all runs");
    println!("  stats         correlation table for this session");
    println!("  save [PATH]   save history (.json for JSON, text otherwise)");
    println!("  quit          end the session");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_batch_args() {
        let args = Args::try_parse_from(["mermin", "--d1", "0", "--d2", "2", "-n", "5"]).unwrap();
        assert_eq!(args.d1, Some(0));
        assert_eq!(args.d2, Some(2));
        assert_eq!(args.runs, Some(5));
        assert!(!args.serve);
    }

    #[test]
    fn test_serve_with_addr() {
        let args = Args::try_parse_from(["mermin", "--serve", "--addr", "0.0.0.0:8080"]).unwrap();
        assert!(args.serve);
        assert_eq!(args.addr, "0.0.0.0:8080");
    }

    #[test]
    fn test_serve_rejects_save() {
        let err = Args::try_parse_from(["mermin", "--serve", "--save", "runs.json"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn test_d1_requires_d2() {
        assert!(Args::try_parse_from(["mermin", "--d1", "1"]).is_err());
    }
}
