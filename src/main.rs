use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

use resource_align::classifier::HttpClassifier;
use resource_align::config::{self, Config};
use resource_align::repository::load_repository;
use resource_align::server::{start_server, AppState};
use resource_align::{rank_resources, AlignRequest, AlignSettings};

const EXIT_SUCCESS: i32 = 0;
const EXIT_NETWORK: i32 = 2;
const EXIT_REPOSITORY: i32 = 3;
const EXIT_CONFIG: i32 = 4;

#[derive(Subcommand, Debug)]
enum Commands {
    /// Serve the ranking API (default if no subcommand)
    Serve {
        /// Socket address to listen on (overrides server.bind)
        #[arg(long)]
        bind: Option<String>,
    },
    /// Rank resources once and print the result
    Rank {
        /// Learning area(s), comma separated
        #[arg(long)]
        area: Option<String>,
        /// Year level(s), comma separated
        #[arg(long)]
        year: Option<String>,
        /// Only rank against these statement ids, comma separated
        #[arg(long)]
        item: Option<String>,
        /// Show at most this many resources
        #[arg(long)]
        limit: Option<usize>,
        /// Print JSON records instead of a table
        #[arg(long, conflicts_with = "tsv")]
        json: bool,
        /// Print tab-separated values instead of a table
        #[arg(long)]
        tsv: bool,
    },
}

#[derive(Parser, Debug)]
#[command(name = "resource-align")]
#[command(about = "Rank teaching resources against curriculum statements", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to config file (defaults to ~/.config/resource-align/config.yaml)
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Repository directory (overrides `repository`)
    #[arg(long, global = true)]
    repository: Option<PathBuf>,

    /// Classifier endpoint (overrides classifier.url)
    #[arg(long, global = true)]
    classifier_url: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("resource_align={}", default_level))
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Load, override and validate the config; exits with EXIT_CONFIG on failure.
fn effective_config(cli: &Cli) -> Config {
    let mut config = match config::load_config(cli.config.as_ref().map(PathBuf::from)) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {:#}", e);
            std::process::exit(EXIT_CONFIG);
        }
    };

    if let Some(repository) = &cli.repository {
        config.repository = repository.clone();
    }
    if let Some(url) = &cli.classifier_url {
        config.classifier.url = url.clone();
    }
    if let Some(Commands::Serve {
        bind: Some(bind), ..
    }) = &cli.command
    {
        config.server.bind = bind.clone();
    }

    if let Err(errors) = config::validate_config(&config) {
        eprintln!("Config errors:");
        for error in errors {
            eprintln!("  - {}", error);
        }
        std::process::exit(EXIT_CONFIG);
    }

    config
}

#[tokio::main]
async fn main() {
    // Install rustls crypto provider (required for rustls 0.23+)
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = effective_config(&cli);
    let start_time = Instant::now();

    let settings = match AlignSettings::from_config(&config.ranking) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Config error: {:#}", e);
            std::process::exit(EXIT_CONFIG);
        }
    };

    let classifier_timeout = match humantime::parse_duration(&config.classifier.timeout) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("Config error: classifier.timeout: {}", e);
            std::process::exit(EXIT_CONFIG);
        }
    };
    let classifier = match HttpClassifier::new(
        &config.classifier.url,
        classifier_timeout,
        config.classifier.retries,
    ) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to create classifier client: {}", e);
            std::process::exit(EXIT_CONFIG);
        }
    };

    let snapshot = match load_repository(&config.repository) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Repository error: {:#}", e);
            std::process::exit(EXIT_REPOSITORY);
        }
    };

    if cli.verbose {
        eprintln!(
            "Loaded {} resources from {} in {:?}",
            snapshot.len(),
            config.repository.display(),
            start_time.elapsed()
        );
    }

    let command = cli.command.unwrap_or(Commands::Serve { bind: None });
    match command {
        Commands::Serve { .. } => {
            let state = AppState {
                snapshot: Arc::new(snapshot),
                classifier: Arc::new(classifier),
                settings: Arc::new(settings),
            };
            if let Err(e) = start_server(&config.server.bind, state).await {
                eprintln!("Server error: {:#}", e);
                std::process::exit(EXIT_NETWORK);
            }
        }
        Commands::Rank {
            area,
            year,
            item,
            limit,
            json,
            tsv,
        } => {
            let request = match AlignRequest::from_params(
                area.as_deref(),
                year.as_deref(),
                item.as_deref(),
                limit,
                &settings,
            ) {
                Ok(r) => r,
                Err(e) => {
                    eprintln!("{}", e);
                    std::process::exit(EXIT_CONFIG);
                }
            };

            let ranked = match rank_resources(&snapshot, &classifier, &request, &settings).await {
                Ok(r) => r,
                Err(e) => {
                    eprintln!("Ranking failed: {}", e);
                    std::process::exit(EXIT_NETWORK);
                }
            };

            if json {
                match serde_json::to_string_pretty(&ranked) {
                    Ok(out) => println!("{}", out),
                    Err(e) => {
                        eprintln!("Failed to encode ranking: {}", e);
                        std::process::exit(EXIT_NETWORK);
                    }
                }
            } else if tsv {
                let out = resource_align::output::format_tsv(&ranked);
                if !out.is_empty() {
                    println!("{}", out);
                }
            } else {
                let use_colors = resource_align::output::should_use_colors();
                if cli.verbose {
                    for record in &ranked {
                        println!(
                            "{}",
                            resource_align::output::format_record_detail(record, use_colors)
                        );
                        println!();
                    }
                }
                println!(
                    "{}",
                    resource_align::output::format_ranking_table(&ranked, use_colors)
                );
            }

            if cli.verbose {
                eprintln!();
                eprintln!(
                    "Total: {} resources in {:?}",
                    ranked.len(),
                    start_time.elapsed()
                );
            }
        }
    }

    std::process::exit(EXIT_SUCCESS);
}
