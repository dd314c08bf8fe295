//! Costlens CLI

mod config;

use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use costlens_core::{
    dashboard, evaluate_threshold, format_analysis, format_currency, format_threshold_alert,
    should_notify, AnalysisResult, BillingQuery, BillingSource, DateRange, Dimension,
    FileBillingSource, LogNotifier, NormalizedBatch, Notification, Notifier, RecordNormalizer,
    StoredAnalysis,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

use crate::config::Settings;

/// Initialize logging with the specified verbosity level
fn init_logging(verbose: u8, quiet: bool, json: bool) -> Result<()> {
    let level = if quiet {
        Level::ERROR
    } else {
        match verbose {
            0 => Level::WARN,
            1 => Level::INFO,
            2 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };

    let filter = EnvFilter::from_default_env()
        .add_directive(format!("costlens={}", level).parse()?)
        .add_directive(format!("costlens_core={}", level).parse()?)
        .add_directive(format!("costlens_web={}", level).parse()?);

    // Logs go to stderr so command output stays parseable
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(verbose >= 2) // Show module path at debug+
        .with_file(verbose >= 3) // Show file:line at trace
        .with_line_number(verbose >= 3);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }

    Ok(())
}

#[derive(Parser)]
#[command(name = "costlens")]
#[command(about = "Cost breakdowns, trend signals and optimization recommendations")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Settings file (TOML)
    #[arg(long, env = "COSTLENS_CONFIG", global = true)]
    config: Option<String>,

    /// Increase verbosity (-v: info, -vv: debug, -vvv: trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Output logs as JSON (for machine parsing)
    #[arg(long, global = true)]
    log_json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare yesterday's total against the daily threshold
    Check {
        /// Saved billing export (JSON)
        #[arg(long, env = "COSTLENS_INPUT")]
        input: PathBuf,

        /// Daily cost ceiling
        #[arg(long, env = "COST_THRESHOLD")]
        threshold: Option<f64>,

        /// Reference date (defaults to today, UTC)
        #[arg(long)]
        as_of: Option<NaiveDate>,
    },

    /// Run the weekly analysis and print the report
    Analyze {
        /// Saved billing export (JSON)
        #[arg(long, env = "COSTLENS_INPUT")]
        input: PathBuf,

        /// Number of days to analyze
        #[arg(long)]
        days: Option<u32>,

        /// Reference date (defaults to today, UTC)
        #[arg(long)]
        as_of: Option<NaiveDate>,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,

        /// Publish the report as a notification
        #[arg(long)]
        notify: bool,
    },

    /// Show positive costs ranked by service or region
    Breakdown {
        /// Saved billing export (JSON)
        #[arg(long, env = "COSTLENS_INPUT")]
        input: PathBuf,

        /// Dimension to break down by
        #[arg(long, value_enum, default_value_t = BreakdownBy::Service)]
        by: BreakdownBy,

        /// Maximum number of entries
        #[arg(long)]
        top: Option<usize>,

        /// Number of days to cover
        #[arg(long)]
        days: Option<u32>,

        /// Reference date (defaults to today, UTC)
        #[arg(long)]
        as_of: Option<NaiveDate>,
    },

    /// Start the dashboard API server
    Serve {
        /// Saved billing export (JSON)
        #[arg(long, env = "COSTLENS_INPUT")]
        input: PathBuf,

        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum BreakdownBy {
    Service,
    Region,
}

impl BreakdownBy {
    fn dimension(self) -> Dimension {
        match self {
            BreakdownBy::Service => Dimension::Service,
            BreakdownBy::Region => Dimension::Region,
        }
    }
}

/// Status printed by `check`
#[derive(Debug, Serialize)]
struct CheckStatus {
    message: String,
    daily_cost: f64,
    threshold: f64,
    threshold_exceeded: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging with CLI options
    init_logging(cli.verbose, cli.quiet, cli.log_json)?;

    let settings = Settings::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Check {
            input,
            threshold,
            as_of,
        } => {
            let threshold = settings.threshold(threshold)?;
            run_check(&settings, &input, threshold, today(as_of)).await?;
        }

        Commands::Analyze {
            input,
            days,
            as_of,
            format,
            notify,
        } => {
            let days = settings.window_days(days)?;
            run_analyze(&settings, &input, days, today(as_of), format, notify).await?;
        }

        Commands::Breakdown {
            input,
            by,
            top,
            days,
            as_of,
        } => {
            let range = DateRange::last_days(today(as_of), settings.window_days(days)?);
            let dimension = by.dimension();
            let batch = load_batch(&input, settings.metric(), range, &[dimension.clone()]).await?;
            let breakdown = dashboard::breakdown(&batch, &dimension, settings.top_n(top));

            println!("{:<40} {:>12} {:>8}", dimension.name().to_uppercase(), "COST", "SHARE");
            println!("{}", "-".repeat(62));
            for entry in &breakdown.entries {
                println!(
                    "{:<40} {:>12} {:>7.1}%",
                    entry.name,
                    format_currency(entry.cost),
                    entry.percentage
                );
            }
            println!("{}", "-".repeat(62));
            println!("{:<40} {:>12}", "Total", format_currency(breakdown.total_cost));
        }

        Commands::Serve { input, port } => {
            use costlens_web::{api::AppState, create_router};

            let port = settings.port(port);
            println!("Starting web server on http://localhost:{}", port);

            let source = Arc::new(FileBillingSource::new(&input));
            let state = AppState::new(source)?
                .with_normalizer(RecordNormalizer::new(settings.metric()))
                .with_window_days(settings.window_days(None)?)
                .with_top_n(settings.top_n(None));
            let app = create_router(Arc::new(state));

            let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;
            axum::serve(listener, app).await?;
        }
    }

    Ok(())
}

fn today(as_of: Option<NaiveDate>) -> NaiveDate {
    as_of.unwrap_or_else(|| Utc::now().date_naive())
}

/// Analysis timestamp: midnight of a pinned date, otherwise now
fn analyzed_at(today: NaiveDate) -> DateTime<Utc> {
    let now = Utc::now();
    if today == now.date_naive() {
        now
    } else {
        today.and_time(chrono::NaiveTime::MIN).and_utc()
    }
}

async fn load_batch(
    input: &Path,
    metric: &str,
    range: DateRange,
    group_by: &[Dimension],
) -> Result<NormalizedBatch> {
    let source = FileBillingSource::new(input);
    let mut query = BillingQuery::daily(range, metric);
    for dimension in group_by {
        query = query.group_by(dimension.clone());
    }

    let response = source.fetch(&query).await?;
    let batch = RecordNormalizer::new(metric).normalize(&response)?.within(&range);
    info!(
        range = %range,
        records = batch.records.len(),
        "Loaded billing batch"
    );
    Ok(batch)
}

async fn run_check(settings: &Settings, input: &Path, threshold: f64, today: NaiveDate) -> Result<()> {
    let range = DateRange::last_days(today, 1);
    let batch = load_batch(input, settings.metric(), range, &[Dimension::Service]).await?;
    let analysis = AnalysisResult::from_batch(&batch, analyzed_at(today));
    let evaluation = evaluate_threshold(analysis.grand_total, threshold);

    let message = if should_notify(&evaluation) {
        let report = format_threshold_alert(&evaluation, &analysis);
        let notification = Notification::from(&report);
        LogNotifier::with_topic("cost-alerts")
            .publish(&notification)
            .await?;
        print!("{}", notification.message);
        "Alert sent"
    } else {
        info!(
            total = evaluation.total,
            threshold = evaluation.threshold,
            "Daily cost within threshold"
        );
        "Cost within threshold"
    };

    let status = CheckStatus {
        message: message.to_string(),
        daily_cost: evaluation.total,
        threshold: evaluation.threshold,
        threshold_exceeded: evaluation.exceeded,
    };
    println!("{}", serde_json::to_string(&status)?);
    Ok(())
}

async fn run_analyze(
    settings: &Settings,
    input: &Path,
    days: u32,
    today: NaiveDate,
    format: OutputFormat,
    notify: bool,
) -> Result<()> {
    let range = DateRange::last_days(today, days);
    let batch = load_batch(
        input,
        settings.metric(),
        range,
        &[Dimension::Service, Dimension::Region],
    )
    .await?;

    let analysis = AnalysisResult::with_top_n(&batch, analyzed_at(today), settings.top_n(None));
    let report = format_analysis(&analysis, &analysis.recommendations);

    if notify {
        LogNotifier::with_topic("cost-reports")
            .publish(&Notification::from(&report))
            .await?;
    }

    match format {
        OutputFormat::Text => print!("{}", report.render()),
        OutputFormat::Json => println!("{}", StoredAnalysis::try_from(&analysis)?.to_json()?),
    }

    info!(
        id = %analysis.id(),
        recommendations = analysis.recommendations.len(),
        "Weekly analysis complete"
    );
    Ok(())
}
