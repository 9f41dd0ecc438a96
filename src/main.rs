use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use std::fs;
use std::io::{self, IsTerminal, Read};
use std::path::PathBuf;
use tracing::{debug, info, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

mod api_client;
mod classifier;
mod cli_output;
mod config;
mod models;
mod workflow;

use api_client::ReviewClient;
use classifier::precheck::{signature_for, LANGUAGES};
use cli_output::{OutputMode, OutputWriter};
use config::ReviewConfig;
use workflow::{Phase, Workflow};

#[derive(Parser)]
#[command(name = "codereview")]
#[command(about = "AI code review with severity-tagged findings and automatic fixes", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Send code to the review service and show the findings
    Analyze {
        /// Source file to review (reads stdin when omitted)
        file: Option<PathBuf>,

        /// Declared language (python, java, javascript, ...)
        #[arg(short, long)]
        language: Option<String>,

        /// Review server root, e.g. http://localhost:8080
        #[arg(long)]
        api_url: Option<String>,

        /// Do not request a fix when errors are found
        #[arg(long)]
        no_fix: bool,

        /// Emit the full submission record as JSON
        #[arg(long)]
        json: bool,
    },

    /// Classify a saved analysis offline, without calling the service
    Classify {
        /// Source file the analysis refers to
        #[arg(long)]
        code: PathBuf,

        /// File containing the analysis text
        #[arg(long)]
        analysis: PathBuf,

        /// Declared language
        #[arg(short, long)]
        language: Option<String>,

        /// Emit issues as JSON
        #[arg(long)]
        json: bool,
    },

    /// List selectable languages and their signature patterns
    Languages,

    /// Show or change the stored configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration
    Show,

    /// Persist new settings
    Set {
        /// Review server root
        #[arg(long)]
        api_url: Option<String>,

        /// Request timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,

        /// Default language
        #[arg(short, long)]
        language: Option<String>,
    },
}

const REVIEWING_MESSAGE: &str = "Our AI is reviewing your code for improvements...";
const FIXING_MESSAGE: &str = "Our AI is generating corrected code...";

fn read_code(file: Option<&PathBuf>) -> Result<String> {
    match file {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("Could not read {}", path.display())),
        None => {
            if io::stdin().is_terminal() {
                return Err(anyhow!("Provide a FILE or pipe code on stdin"));
            }
            let mut code = String::new();
            io::stdin().read_to_string(&mut code)?;
            Ok(code)
        }
    }
}

async fn run_analyze(
    file: Option<PathBuf>,
    language: Option<String>,
    api_url: Option<String>,
    no_fix: bool,
    json: bool,
) -> Result<()> {
    let config = ReviewConfig::load()?.with_env(api_url);
    config.validate()?;

    let language = language.unwrap_or_else(|| config.language.clone());
    let code = read_code(file.as_ref())?;
    let out = OutputWriter::new(OutputMode::auto(json));

    let client = ReviewClient::new(&config.api_url, config.timeout())?;
    debug!("Using endpoint base {}", client.base_url());
    let spinner = out.spinner(REVIEWING_MESSAGE);

    let mut workflow = Workflow::new(client).with_auto_fix(!no_fix);
    if let Some(pb) = spinner.clone() {
        workflow = workflow.on_transition(move |submission| {
            if submission.phase == Phase::Fixing {
                pb.set_message(FIXING_MESSAGE);
            }
        });
    }

    info!("Reviewing {} code...", language);
    let submission = workflow.submit(code, language).await;
    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }

    let submission = submission?;
    out.submission(&submission, &config.api_url);

    if submission.phase == Phase::AnalysisFailed {
        std::process::exit(1);
    }
    Ok(())
}

fn run_classify(
    code: PathBuf,
    analysis: PathBuf,
    language: Option<String>,
    json: bool,
) -> Result<()> {
    let config = ReviewConfig::load()?;
    let language = language.unwrap_or(config.language);
    let code = read_code(Some(&code))?;
    let analysis = fs::read_to_string(&analysis)
        .with_context(|| format!("Could not read {}", analysis.display()))?;

    let issues = classifier::classify(&code, &language, &analysis);

    let out = OutputWriter::new(OutputMode::auto(json));
    if out.mode() == OutputMode::Json {
        out.emit_json(&issues);
    } else {
        out.issues(&issues);
    }
    Ok(())
}

fn run_config(action: ConfigAction) -> Result<()> {
    let out = OutputWriter::new(OutputMode::auto(false));

    match action {
        ConfigAction::Show => {
            let config = ReviewConfig::load()?.with_env(None);
            out.section("Review Configuration");
            out.table(&[
                ("API URL", config.api_url.clone()),
                ("Endpoints", api_client::endpoint_base(&config.api_url)),
                ("Timeout", format!("{}s", config.timeout_secs)),
                ("Language", config.language.clone()),
                (
                    "Config file",
                    ReviewConfig::config_file_path()?.display().to_string(),
                ),
            ]);
            Ok(())
        }
        ConfigAction::Set {
            api_url,
            timeout,
            language,
        } => {
            let mut config = ReviewConfig::load()?;
            if let Some(url) = api_url {
                config.api_url = url.trim().trim_end_matches('/').to_string();
            }
            if let Some(secs) = timeout {
                config.timeout_secs = secs;
            }
            if let Some(lang) = language {
                config.language = lang.to_lowercase();
            }
            config.validate()?;

            let path = config.save()?;
            out.success(&format!("Saved configuration to {}", path.display()));
            Ok(())
        }
    }
}

fn run_languages() {
    let out = OutputWriter::new(OutputMode::auto(false));
    out.section("Supported Languages");

    let rows: Vec<(&str, String)> = LANGUAGES
        .iter()
        .map(|(name, label)| {
            let signature = signature_for(name)
                .map(|p| p.as_str().to_string())
                .unwrap_or_default();
            (*label, format!("{} → {}", name, signature))
        })
        .collect();
    out.table(&rows);
    out.info("Other languages are accepted without a signature check.");
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging (stderr, so JSON on stdout stays clean)
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_str().to_lowercase()));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Analyze {
            file,
            language,
            api_url,
            no_fix,
            json,
        } => run_analyze(file, language, api_url, no_fix, json).await,

        Commands::Classify {
            code,
            analysis,
            language,
            json,
        } => run_classify(code, analysis, language, json),

        Commands::Languages => {
            run_languages();
            Ok(())
        }

        Commands::Config { action } => run_config(action),
    }
}
