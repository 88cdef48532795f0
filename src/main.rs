//! hotswapd entry point.
//!
//! Bootstraps the lifecycle manager: logging, environment configuration,
//! required directories, artifact watchers, and signal handling for a
//! clean quit.
//!
//! ## CLI Subcommands
//!
//! - `hotswapd` or `hotswapd serve` - watch artifact directories (default)
//! - `hotswapd version` - print version

use std::process::ExitCode;
use std::sync::Arc;

use hotswap_core::engine::MmapEngineFactory;
use hotswap_core::logging::{init_logging, LogConfig, LogFormat};
use hotswap_core::{config, Runtime};

#[tokio::main]
async fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();
    let command = args.get(1).map(|s| s.as_str()).unwrap_or("serve");

    match command {
        "serve" | "" => serve().await,
        "version" | "--version" | "-V" => {
            println!("hotswapd {}", env!("CARGO_PKG_VERSION"));
            ExitCode::SUCCESS
        }
        "help" | "--help" | "-h" => {
            print_usage();
            ExitCode::SUCCESS
        }
        other => {
            eprintln!("Unknown command: {other}");
            print_usage();
            ExitCode::FAILURE
        }
    }
}

async fn serve() -> ExitCode {
    let log_config = LogConfig {
        format: match std::env::var("HOTSWAP_LOG_FORMAT").as_deref() {
            Ok("pretty") => LogFormat::Pretty,
            _ => LogFormat::Json,
        },
        level: std::env::var("HOTSWAP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        output_path: None,
    };
    if let Err(e) = init_logging(&log_config) {
        eprintln!("Logging setup failed: {e}");
        return ExitCode::FAILURE;
    }

    let runtime = match Runtime::new(config::load(), Arc::new(MmapEngineFactory)) {
        Ok(runtime) => runtime,
        Err(e) => {
            // Required directories could not be created; nothing to watch.
            eprintln!("Startup failed: {e}");
            return ExitCode::FAILURE;
        }
    };

    let handles = runtime.start_watchers();
    tracing::info!(
        models = %runtime.config().model_dir.display(),
        configs = %runtime.config().config_dir.display(),
        "hotswapd running"
    );

    if tokio::signal::ctrl_c().await.is_err() {
        eprintln!("Signal handler unavailable");
        return ExitCode::FAILURE;
    }

    runtime.begin_quit();
    for handle in handles {
        let _ = handle.await;
    }
    tracing::info!("hotswapd stopped");
    ExitCode::SUCCESS
}

fn print_usage() {
    println!("Usage: hotswapd [serve|version|help]");
    println!();
    println!("  serve    Watch artifact directories and serve swap requests (default)");
    println!("  version  Print version");
    println!("  help     Show this help");
}
