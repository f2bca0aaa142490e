mod bootstrap;

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use consolidate_core::continents::ContinentMap;
use consolidate_core::report::RunSummary;
use consolidate_core::settings::{RunPaths, Settings};
use consolidate_data::pipeline::{process_data, PipelineOptions};

const GENERIC_FAILURE: &str = "An error occurred during processing. Please check the log file.";

fn main() -> ExitCode {
    // Logging flags are never persisted. Set logging up before the
    // last-used merge so its warnings are recorded.
    let cli = Settings::parse();
    let log_path = match bootstrap::ensure_directories()
        .and_then(|()| bootstrap::setup_logging(cli.effective_log_level(), cli.log_file.as_ref()))
    {
        Ok(path) => path,
        Err(e) => {
            eprintln!("Could not set up logging: {:#}", e);
            return ExitCode::FAILURE;
        }
    };

    let settings = Settings::load_with_last_used();
    let paths = match settings.paths() {
        Ok(paths) => paths,
        Err(e) => {
            tracing::error!("{}", e);
            eprintln!("{}", e);
            return ExitCode::from(2);
        }
    };

    tracing::info!("txn-consolidate v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        "Root: {}, rates: {}, output: {}",
        paths.root.display(),
        paths.rates.display(),
        paths.output.display()
    );

    match run(&settings, &paths) {
        Ok(Some(summary)) => match render(&summary, settings.json) {
            Ok(text) => {
                println!("{}", text);
                ExitCode::SUCCESS
            }
            Err(e) => {
                tracing::error!("Could not render summary: {:#}", e);
                eprintln!("{}", GENERIC_FAILURE);
                ExitCode::FAILURE
            }
        },
        Ok(None) => {
            eprintln!("{}", GENERIC_FAILURE);
            eprintln!("Log: {}", log_path.display());
            ExitCode::FAILURE
        }
        Err(e) => {
            tracing::error!("Error processing data: {:#}", e);
            eprintln!("{}", GENERIC_FAILURE);
            eprintln!("Log: {}", log_path.display());
            ExitCode::FAILURE
        }
    }
}

fn run(settings: &Settings, paths: &RunPaths) -> Result<Option<RunSummary>> {
    let continents = match &settings.continents {
        Some(path) => ContinentMap::builtin_with_overrides(path)?,
        None => ContinentMap::builtin(),
    };
    let options = PipelineOptions {
        continents,
        strict: settings.strict,
        lenient_rates: settings.lenient_rates,
    };
    Ok(process_data(
        &paths.root,
        &paths.rates,
        &paths.output,
        &options,
    )?)
}

/// The summary as shown to the user: five plain lines, or pretty JSON.
fn render(summary: &RunSummary, json: bool) -> Result<String> {
    if json {
        Ok(serde_json::to_string_pretty(summary)?)
    } else {
        Ok(summary.to_string())
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
