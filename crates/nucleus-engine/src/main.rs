//! Engine binary for the Nucleus simulation kernel.
//!
//! Loads configuration, assembles the demonstration components and runs
//! them to completion, printing the run summary as JSON on stdout.
//!
//! # Startup Sequence
//!
//! 1. Load kernel configuration from the path given as the first argument,
//!    else `nucleus-config.yaml` in the working directory, else defaults
//! 2. Initialize structured logging (tracing), `RUST_LOG` overriding the
//!    configured level
//! 3. Load the `demo` section of the same file
//! 4. Build the simulation (dependency resolution + initializers)
//! 5. Run until the plan queue drains, `max_time` passes or a halt
//! 6. Print the summary

mod demo;
mod error;

use std::path::{Path, PathBuf};

use nucleus_core::{KernelConfig, Simulation};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::demo::DemoConfig;
use crate::error::EngineError;

/// Default configuration file, relative to the working directory.
const DEFAULT_CONFIG: &str = "nucleus-config.yaml";

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration loading, assembly or the run fails.
fn main() -> Result<(), EngineError> {
    let explicit = std::env::args().nth(1).map(PathBuf::from);
    let config_path = explicit.clone().unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG));
    let config = load_config(&config_path, explicit.is_some())?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_e| EnvFilter::new(&config.logging.level)),
        )
        .with_target(true)
        .init();

    info!(
        path = %config_path.display(),
        seed = config.simulation.seed,
        start_time = config.simulation.start_time,
        max_time = ?config.simulation.max_time,
        "Configuration loaded"
    );

    let demo = load_demo_config(&config_path)?;
    demo.validate()?;
    info!(shops = demo.shops, horizon = demo.horizon, "Demo configuration loaded");

    let mut builder = Simulation::builder().config(config);
    for component in demo::components(demo) {
        builder = builder.component(component);
    }
    let mut simulation = builder.build()?;

    let summary = simulation.run()?;
    info!(
        end_reason = ?summary.end_reason,
        end_time = summary.end_time,
        plans_executed = summary.plans_executed,
        "nucleus-engine shutdown complete"
    );

    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

/// Load kernel configuration from `path`.
///
/// The default path may be absent, in which case defaults are used; an
/// explicitly requested file must exist.
fn load_config(path: &Path, required: bool) -> Result<KernelConfig, EngineError> {
    if required || path.exists() {
        Ok(KernelConfig::from_file(path)?)
    } else {
        Ok(KernelConfig::default())
    }
}

/// Load the `demo` section of the configuration file.
///
/// A missing file or section yields the defaults.
fn load_demo_config(path: &Path) -> Result<DemoConfig, EngineError> {
    if !path.exists() {
        return Ok(DemoConfig::default());
    }
    let contents = std::fs::read_to_string(path).map_err(|e| EngineError::Demo {
        message: format!("failed to read config file: {e}"),
    })?;
    let raw: serde_yml::Value = serde_yml::from_str(&contents).map_err(|e| EngineError::Demo {
        message: format!("failed to parse config YAML: {e}"),
    })?;

    raw.get("demo").map_or_else(
        || Ok(DemoConfig::default()),
        |section| {
            serde_yml::from_value(section.clone()).map_err(|e| EngineError::Demo {
                message: format!("failed to parse demo config: {e}"),
            })
        },
    )
}
