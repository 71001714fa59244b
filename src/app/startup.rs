//! Application startup
//!
//! Parses arguments, applies the configuration file, installs logging, then
//! runs discovery, cloning, scanning and aggregation on a tokio runtime.
//! Any fatal error is logged and the process exits with status 2.

use crate::app::cli::args::Args;
use crate::core::error_handling::log_error_with_context;
use crate::core::logging::{init_logging, LogSettings};
use crate::core::version;
use crate::discovery::github::GitHubClient;
use crate::discovery::source::RepositorySource;
use crate::pipeline::orchestrator::Pipeline;
use crate::pipeline::preflight::{bootstrap, preflight};
use crate::pipeline::runner::SystemRunner;
use crate::report::aggregate::ResultAggregator;
use clap::Parser;
use std::io::IsTerminal;
use std::sync::Arc;

/// Exit status for every fatal error
pub const FATAL_EXIT_CODE: i32 = 2;

/// Initialize application startup
pub fn startup() {
    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Error: could not start the async runtime: {}", e);
            std::process::exit(FATAL_EXIT_CODE);
        }
    };

    let status = runtime.block_on(run(Args::parse()));
    runtime.shutdown_background();
    std::process::exit(status);
}

/// Run with parsed arguments and return the process exit status
pub async fn run(mut args: Args) -> i32 {
    match Args::load_config_file(args.config_file.clone()).await {
        Ok(Some((path, table))) => {
            if let Err(e) = Args::apply_toml_values(&mut args, &table) {
                eprintln!(
                    "Error in configuration file validation {}: {}",
                    path.display(),
                    e
                );
                return FATAL_EXIT_CODE;
            }
        }
        Ok(None) => {}
        Err(e) => {
            eprintln!("Error: {}", e);
            return FATAL_EXIT_CODE;
        }
    }

    let use_color = if args.no_color {
        false
    } else {
        args.color || std::io::stdout().is_terminal()
    };
    colored::control::set_override(use_color);

    let settings = LogSettings {
        level: Some(args.effective_log_level()),
        format: args.log_format.clone(),
        file: args.log_file_path(),
        color: use_color,
    };
    if let Err(e) = init_logging(&settings) {
        eprintln!("Error: could not initialise logging: {}", e);
        return FATAL_EXIT_CODE;
    }

    log::info!(
        "secretsweep {} (built {}, {})",
        version::version(),
        version::build_time(),
        version::git_hash()
    );

    if let Err(e) = args.validate() {
        log_error_with_context(&e, "Argument validation");
        return FATAL_EXIT_CODE;
    }
    let Some(config) = args.run_config() else {
        log::error!("FATAL: no scope to scan");
        return FATAL_EXIT_CODE;
    };
    log::debug!(
        "Run configuration: scope={}, threads={}, tools={:?}, output={}",
        config.scope,
        config.threads,
        config.tools.tools(),
        config.output_file.display()
    );

    let client = match GitHubClient::new(&config.token, config.enterprise_url.as_deref()) {
        Ok(client) => client,
        Err(e) => {
            log_error_with_context(&e, "Creating the GitHub client");
            return FATAL_EXIT_CODE;
        }
    };
    log::debug!("Using API at {}", client.api_base());
    let source: Arc<dyn RepositorySource> = Arc::new(client);

    if let Err(e) = preflight(&config, source.as_ref()).await {
        log_error_with_context(&e, "Preflight checks");
        return FATAL_EXIT_CODE;
    }
    if let Err(e) = bootstrap(&config.layout) {
        log_error_with_context(&e, "Preparing work directories");
        return FATAL_EXIT_CODE;
    }

    let pipeline = Pipeline::new(&config, source, Arc::new(SystemRunner));
    let report = match pipeline.run().await {
        Ok(report) => report,
        Err(e) => {
            log_error_with_context(&e, "Running the pipeline");
            return FATAL_EXIT_CODE;
        }
    };

    let failed = report.scans().filter(|scan| !scan.is_completed()).count();
    if failed > 0 {
        log::warn!("{} tool runs failed; their results are left out", failed);
    }

    let aggregator = ResultAggregator::from_config(&config);
    if let Err(e) = aggregator.write(&report.scanned_targets(), &config.output_file) {
        log_error_with_context(&e, "Writing results");
        return FATAL_EXIT_CODE;
    }

    log::info!("Results written to {}", config.output_file.display());
    0
}
