use std::{fs, path::Path};

use clap::{Parser, Subcommand};
use scamshield::{
    config::load_config,
    core::{
        engine::AnalysisEngine,
        error::ShieldError,
        store::AnalysisStore,
        types::{AnalysisKind, AnalyzeResponse},
    },
};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(
    name = "scamshield",
    about = "Scam/phishing triage for SMS, email and URLs"
)]
struct Cli {
    /// Path to config file (TOML). Default: config/scamshield.toml
    #[arg(long)]
    config: Option<String>,
    /// SQLite path for analysis records
    #[arg(long)]
    db_path: Option<String>,
    /// Disable the fingerprint cache
    #[arg(long)]
    no_cache: bool,
    /// Optional log file path
    #[arg(long, default_value = "data/scamshield.log")]
    log_file: String,
    /// Increase verbosity (info, debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Analyze one SMS message
    Sms {
        #[arg(long)]
        text: String,
        #[arg(long)]
        sender: Option<String>,
    },
    /// Analyze one email (hash covers headers + body; scoring runs on the body)
    Email {
        #[arg(long)]
        body: String,
        #[arg(long)]
        subject: Option<String>,
        #[arg(long)]
        sender: Option<String>,
        #[arg(long)]
        headers_raw: Option<String>,
    },
    /// Analyze one URL
    Url {
        #[arg(long)]
        url: String,
    },
    /// Print analysis store statistics
    Stats,
}

#[tokio::main]
async fn main() -> Result<(), ShieldError> {
    let cli = Cli::parse();

    init_tracing(&cli)?;

    let mut cfg = load_config(cli.config.as_deref())?;
    if let Some(db_path) = &cli.db_path {
        cfg.db_path = db_path.clone();
    }
    if cli.no_cache {
        cfg.cache_ttl_seconds = 0;
    }

    if let Command::Stats = cli.command {
        let store = AnalysisStore::new(Path::new(&cfg.db_path))
            .map_err(|e| ShieldError::Db(e.to_string()))?;
        let stats = store.stats().map_err(|e| ShieldError::Db(e.to_string()))?;
        let json = serde_json::to_string_pretty(&stats).map_err(|_| ShieldError::Unknown)?;
        println!("{json}");
        return Ok(());
    }

    let (kind, raw, user_visible) = match &cli.command {
        Command::Sms { text, sender } => {
            if let Some(sender) = sender {
                tracing::info!("analyzing SMS from {sender}");
            }
            let text = text.trim().to_string();
            (AnalysisKind::Sms, text.clone(), text)
        }
        Command::Email {
            body,
            subject,
            sender,
            headers_raw,
        } => {
            let raw = format!(
                "Subject: {}\nFrom: {}\n{}\n{}",
                subject.as_deref().unwrap_or(""),
                sender.as_deref().unwrap_or(""),
                headers_raw.as_deref().unwrap_or(""),
                body
            )
            .trim()
            .to_string();
            (AnalysisKind::Email, raw, body.clone())
        }
        Command::Url { url } => {
            let url = url.trim().to_string();
            (AnalysisKind::Url, url.clone(), url)
        }
        Command::Stats => unreachable!(),
    };

    let db_path = cfg.db_path.clone();
    let engine = AnalysisEngine::new(cfg)?;
    let outcome = engine.analyze(kind, &raw, &user_visible).await?;

    let mut store =
        AnalysisStore::new(Path::new(&db_path)).map_err(|e| ShieldError::Db(e.to_string()))?;
    store
        .insert_outcome(&outcome)
        .map_err(|e| ShieldError::Db(e.to_string()))?;

    let response = AnalyzeResponse::from_outcome(&outcome);
    let json = serde_json::to_string_pretty(&response).map_err(|_| ShieldError::Unknown)?;
    println!("{json}");
    Ok(())
}

fn init_tracing(cli: &Cli) -> Result<(), ShieldError> {
    let level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let log_path = Path::new(&cli.log_file);
    if let Some(parent) = log_path.parent() {
        fs::create_dir_all(parent).map_err(|e| ShieldError::Config(e.to_string()))?;
    }
    if log_path.exists() {
        if let Ok(meta) = fs::metadata(log_path) {
            if meta.len() > 1_000_000 {
                let rotated = log_path.with_extension("log.1");
                let _ = fs::rename(log_path, rotated);
            }
        }
    }
    let file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
        .map_err(|e| ShieldError::Config(e.to_string()))?;

    let file_layer = fmt::layer()
        .with_writer(file)
        .with_ansi(false)
        .with_target(false);

    // Console output goes to stderr so stdout stays pure JSON.
    let console_layer = fmt::layer().with_writer(std::io::stderr).with_target(false);

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(console_layer)
        .try_init()
        .map_err(|e| ShieldError::Config(e.to_string()))
}
