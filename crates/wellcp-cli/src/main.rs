// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use clap::error::ErrorKind;
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::process;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;
use wellcp_cli::{
    CliError, LogProgressSink, ensure_exists, load_matrix, load_vector, score_output_path,
    to_blacklist, to_event_times, write_json_output, write_npy,
};
use wellcp_core::{Direction, EventKind, ExecutionContext};
use wellcp_eval::{
    Comparison, DEFAULT_BINS, DEFAULT_COEF_START, DEFAULT_COEF_STEP, DEFAULT_COEF_STOP,
    DEFAULT_GROUP_SIZE, SweepConfig, coef_range, compare_with_manual, sweep_thresholds,
};
use wellcp_events::{Threshold, extract_event_times, extract_first_crossings, population_threshold};
use wellcp_online::{BatchConfig, DetectorConfig, WellSummary, score_wells};
use wellcp_preprocess::{GaussianSmoothConfig, PreprocessConfig, TimeRamp, normalize};

#[derive(Debug, Parser)]
#[command(
    name = "wellcp",
    version,
    about = "Detect pupariation, eclosion, and death times in per-well activity signals"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Score every well with ChangeFinder and write the scores as NPY.
    Score(ScoreArgs),
    /// Threshold a signal population and extract one event time per well.
    Events(EventsArgs),
    /// Histogram event times over a range of threshold coefficients.
    Sweep(SweepArgs),
}

#[derive(Debug, Args)]
struct SignalArgs {
    /// `frames x wells` signal array (.npy or .csv).
    signal_path: PathBuf,
    /// One of: pupariation, eclosion, death.
    #[arg(value_parser = parse_event)]
    event: EventKind,
}

#[derive(Debug, Args)]
struct ScoreArgs {
    #[command(flatten)]
    signal: SignalArgs,
    /// ChangeFinder forgetting factor, 0 < r < 1 [default: 0.003].
    #[arg(short = 'r', value_parser = parse_unit_interval)]
    r: Option<f64>,
    /// Base random seed; drawn and reported when absent.
    #[arg(long)]
    seed: Option<u64>,
    /// Worker threads.
    #[arg(long)]
    jobs: Option<usize>,
    /// Wall-clock budget per well in milliseconds.
    #[arg(long)]
    well_timeout_ms: Option<u64>,
    /// Skip wells whose start and end look like a survivor.
    #[arg(long)]
    survive: bool,
    /// JSON file with a partial detector configuration.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Output NPY path [default: cf_r{r}_signals.npy next to the input].
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct EventsArgs {
    #[command(flatten)]
    signal: SignalArgs,
    /// Threshold coefficient applied to the population standard deviation.
    #[arg(long, allow_hyphen_values = true)]
    coef: f64,
    /// Gaussian smoothing window size; smoothing is off when absent.
    #[arg(long)]
    smooth_size: Option<usize>,
    #[arg(long, default_value_t = 5.0)]
    smooth_sigma: f64,
    /// Weight frames by a time ramp chosen from the event kind.
    #[arg(long)]
    weight: bool,
    /// Manual event times, one per well (.csv or .npy).
    #[arg(long)]
    manual: Option<PathBuf>,
    /// Blacklist, one 0/1 flag per well (.csv or .npy).
    #[arg(long, requires = "manual")]
    blacklist: Option<PathBuf>,
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct SweepArgs {
    #[command(flatten)]
    signal: SignalArgs,
    #[arg(long, default_value_t = DEFAULT_COEF_START, allow_hyphen_values = true)]
    coef_start: f64,
    #[arg(long, default_value_t = DEFAULT_COEF_STOP, allow_hyphen_values = true)]
    coef_stop: f64,
    #[arg(long, default_value_t = DEFAULT_COEF_STEP, allow_hyphen_values = true)]
    coef_step: f64,
    /// Wells per group (plate).
    #[arg(long, default_value_t = DEFAULT_GROUP_SIZE)]
    group_size: usize,
    #[arg(long, default_value_t = DEFAULT_BINS)]
    bins: usize,
    #[arg(long)]
    output: Option<PathBuf>,
}

fn parse_event(raw: &str) -> Result<EventKind, String> {
    EventKind::parse(raw).map_err(|err| err.to_string())
}

fn parse_unit_interval(raw: &str) -> Result<f64, String> {
    let value = raw
        .parse::<f64>()
        .map_err(|_| format!("'{raw}' is not a number"))?;
    if value > 0.0 && value < 1.0 {
        Ok(value)
    } else {
        Err(format!("r must lie strictly between 0.0 and 1.0; got {value}"))
    }
}

#[derive(Serialize)]
struct ScoreOutput {
    output: PathBuf,
    event: EventKind,
    n_frames: usize,
    n_wells: usize,
    r: f64,
    seed: u64,
    wells: Vec<WellSummary>,
}

#[derive(Serialize)]
struct EventsOutput {
    event: EventKind,
    direction: Direction,
    coef: f64,
    threshold: Threshold,
    n_frames: usize,
    n_wells: usize,
    event_times: Vec<usize>,
    first_crossings: Vec<Option<usize>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    comparison: Option<Comparison>,
}

#[derive(Serialize)]
struct ErrorEnvelope {
    error: ErrorPayload,
}

#[derive(Serialize)]
struct ErrorPayload {
    code: String,
    message: String,
}

fn main() {
    init_tracing();
    if let Err(err) = run() {
        emit_structured_error(&err);
        process::exit(1);
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn run() -> Result<(), CliError> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            print!("{err}");
            return Ok(());
        }
        Err(err) => return Err(CliError::invalid_input(err.to_string().trim_end().to_string())),
    };

    match cli.command {
        Command::Score(args) => handle_score(&args),
        Command::Events(args) => handle_events(&args),
        Command::Sweep(args) => handle_sweep(&args),
    }
}

fn load_detector_config(path: Option<&Path>) -> Result<DetectorConfig, CliError> {
    let Some(path) = path else {
        return Ok(DetectorConfig::default());
    };
    let raw = fs::read_to_string(path)
        .map_err(|source| CliError::io(format!("failed to read '{}'", path.display()), source))?;
    serde_json::from_str(raw.as_str())
        .map_err(|source| CliError::json(format!("invalid detector config in '{}'", path.display()), source))
}

fn detector_config_from_args(args: &ScoreArgs) -> Result<DetectorConfig, CliError> {
    let mut config = load_detector_config(args.config.as_deref())?;
    if let Some(r) = args.r {
        config.r = r;
    }
    if args.survive {
        config.survival_check = true;
    }
    config.validate()?;
    Ok(config)
}

fn handle_score(args: &ScoreArgs) -> Result<(), CliError> {
    let input = args.signal.signal_path.as_path();
    ensure_exists(input)?;
    let kind = args.signal.event;
    let config = detector_config_from_args(args)?;
    let batch = BatchConfig {
        seed: args.seed,
        jobs: args.jobs,
        well_timeout: args.well_timeout_ms.map(Duration::from_millis),
    };
    batch.validate()?;

    let signals = normalize(&load_matrix(input)?, 1.0)?;
    let (n_frames, n_wells) = signals.shape();

    let progress = LogProgressSink::new("score");
    let ctx = ExecutionContext::new().with_progress_sink(&progress);
    let scored = score_wells(&signals, kind, &config, &batch, &ctx)?;
    if scored.scores.shape() != signals.shape() {
        return Err(CliError::invalid_input(format!(
            "score shape {:?} does not match signal shape {:?}",
            scored.scores.shape(),
            signals.shape()
        )));
    }

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| score_output_path(input, config.r));
    write_npy(&output, &scored.scores)?;
    info!(path = %output.display(), "scores written");

    write_json_output(
        &ScoreOutput {
            output,
            event: kind,
            n_frames,
            n_wells,
            r: config.r,
            seed: scored.seed,
            wells: scored.wells,
        },
        None,
    )
}

fn handle_events(args: &EventsArgs) -> Result<(), CliError> {
    let input = args.signal.signal_path.as_path();
    ensure_exists(input)?;
    let kind = args.signal.event;
    let direction = kind.direction();

    let preprocess = PreprocessConfig {
        smooth: args.smooth_size.map(|size| GaussianSmoothConfig {
            size,
            sigma: args.smooth_sigma,
        }),
        weight: args.weight.then_some(TimeRamp::for_event(kind)),
    };
    if let Some(smooth) = &preprocess.smooth {
        smooth.validate()?;
    }

    let signals = preprocess.apply(&load_matrix(input)?)?;
    let (n_frames, n_wells) = signals.shape();
    let threshold = population_threshold(&signals, args.coef)?;
    let event_times = extract_event_times(&signals, &threshold, direction)?;
    let first_crossings = extract_first_crossings(&signals, &threshold, direction)?;
    info!(kind = %kind, coef = args.coef, threshold = ?threshold, "event times extracted");

    let comparison = match &args.manual {
        Some(manual_path) => {
            ensure_exists(manual_path)?;
            let manual = to_event_times(&load_vector(manual_path)?, "manual evaluation")?;
            let blacklist = match &args.blacklist {
                Some(path) => {
                    ensure_exists(path)?;
                    Some(to_blacklist(&load_vector(path)?)?)
                }
                None => None,
            };
            Some(compare_with_manual(
                &event_times,
                &manual,
                blacklist.as_deref(),
                n_frames,
            )?)
        }
        None => None,
    };

    write_json_output(
        &EventsOutput {
            event: kind,
            direction,
            coef: args.coef,
            threshold,
            n_frames,
            n_wells,
            event_times,
            first_crossings,
            comparison,
        },
        args.output.as_deref(),
    )
}

fn handle_sweep(args: &SweepArgs) -> Result<(), CliError> {
    let input = args.signal.signal_path.as_path();
    ensure_exists(input)?;
    let config = SweepConfig {
        coefs: coef_range(args.coef_start, args.coef_stop, args.coef_step)?,
        group_size: args.group_size,
        n_bins: args.bins,
    };
    config.validate()?;

    let signals = load_matrix(input)?;
    let progress = LogProgressSink::new("sweep");
    let ctx = ExecutionContext::new().with_progress_sink(&progress);
    let sweep = sweep_thresholds(&signals, args.signal.event.direction(), &config, &ctx)?;
    write_json_output(&sweep, args.output.as_deref())
}

fn emit_structured_error(err: &CliError) {
    let envelope = ErrorEnvelope {
        error: ErrorPayload {
            code: err.code().to_string(),
            message: err.to_string(),
        },
    };

    match serde_json::to_string_pretty(&envelope) {
        Ok(json) => eprintln!("{json}"),
        Err(_) => eprintln!(
            "{{\"error\":{{\"code\":\"{}\",\"message\":\"{}\"}}}}",
            err.code(),
            err
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::{Cli, Command, parse_unit_interval};
    use clap::Parser;
    use wellcp_core::EventKind;
    use wellcp_online::DetectorConfig;

    #[test]
    fn partial_detector_config_derives_tail_from_smooth() {
        let config: DetectorConfig =
            serde_json::from_str(r#"{"smooth": 40}"#).expect("partial config should parse");
        assert_eq!(config.smooth, 40);
        assert_eq!(config.tail_width(), 20);
        assert_eq!(config.head_width, 1000);

        let pinned: DetectorConfig = serde_json::from_str(r#"{"smooth": 40, "tail_width": 7}"#)
            .expect("pinned config should parse");
        assert_eq!(pinned.tail_width(), 7);
    }

    #[test]
    fn score_accepts_positionals_and_short_r() {
        let cli = Cli::try_parse_from(["wellcp", "score", "signals.npy", "death", "-r", "0.01"])
            .expect("arguments should parse");
        let Command::Score(args) = cli.command else {
            panic!("expected score command");
        };
        assert_eq!(args.signal.event, EventKind::Death);
        assert_eq!(args.r, Some(0.01));
        assert!(!args.survive);
    }

    #[test]
    fn unknown_event_is_rejected_before_any_work() {
        let err = Cli::try_parse_from(["wellcp", "score", "signals.npy", "hatching"])
            .expect_err("unknown event");
        assert!(err.to_string().contains("expected one of: pupariation, eclosion, death"));
    }

    #[test]
    fn r_must_lie_in_the_open_unit_interval() {
        assert!(parse_unit_interval("0.5").is_ok());
        for raw in ["0", "1", "-0.1", "1.5", "nan", "abc"] {
            assert!(parse_unit_interval(raw).is_err(), "r={raw} should be rejected");
        }
    }

    #[test]
    fn events_accepts_negative_coefficients() {
        let cli = Cli::try_parse_from([
            "wellcp", "events", "signals.npy", "eclosion", "--coef", "-1.5", "--weight",
        ])
        .expect("arguments should parse");
        let Command::Events(args) = cli.command else {
            panic!("expected events command");
        };
        assert_eq!(args.coef, -1.5);
        assert!(args.weight);
        assert_eq!(args.smooth_sigma, 5.0);
    }

    #[test]
    fn blacklist_requires_manual_times() {
        let err = Cli::try_parse_from([
            "wellcp", "events", "signals.npy", "death", "--coef", "1", "--blacklist", "b.csv",
        ])
        .expect_err("blacklist without manual");
        assert!(err.to_string().contains("--manual"));
    }

    #[test]
    fn sweep_defaults_follow_plate_layout() {
        let cli = Cli::try_parse_from(["wellcp", "sweep", "signals.npy", "pupariation"])
            .expect("arguments should parse");
        let Command::Sweep(args) = cli.command else {
            panic!("expected sweep command");
        };
        assert_eq!(args.group_size, 96);
        assert_eq!(args.coef_start, -2.0);
        assert_eq!(args.coef_stop, 20.0);
    }
}
