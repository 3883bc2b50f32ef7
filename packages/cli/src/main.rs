#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Command-line entry point for hospital assignment and district reports.
//!
//! `care_map run` loads the three inputs, runs one view, and writes its
//! JSON report (plus an optional district `GeoJSON` for choropleths).
//! `care_map views` lists the available views, `care_map profile`
//! compares where one community would be sent under each benefit scheme,
//! and `care_map facility` lists the communities one hospital serves.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use care_map_pipeline::{
    Dataset, Inputs, PipelineError, build_report, evaluate, prepare, profile_community,
    profile_facility, regions_geojson,
};
use care_map_views::ViewRegistry;
use care_map_views::registry::DEFAULT_VIEW;
use clap::{Args, Parser, Subcommand};
use serde::Serialize;

#[derive(Parser)]
#[command(name = "care_map", about = "Nearest-hospital assignment and district reports")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct InputArgs {
    /// Hospital CSV
    #[arg(long)]
    hospitals: PathBuf,
    /// Community CSV
    #[arg(long)]
    communities: PathBuf,
    /// District boundary `GeoJSON`
    #[arg(long)]
    districts: PathBuf,
}

impl InputArgs {
    fn into_inputs(self) -> Inputs {
        Inputs {
            hospitals: self.hospitals,
            communities: self.communities,
            districts: self.districts,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Run a view and write its report
    Run {
        #[command(flatten)]
        inputs: InputArgs,
        /// View id (see `care_map views`)
        #[arg(long, default_value = DEFAULT_VIEW)]
        view: String,
        /// Extra `[[views]]` TOML file; overrides built-ins by id
        #[arg(long)]
        views_file: Option<PathBuf>,
        /// Report path (stdout when omitted)
        #[arg(long)]
        output: Option<PathBuf>,
        /// Also write districts with aggregated properties as `GeoJSON`
        #[arg(long)]
        regions_geojson: Option<PathBuf>,
    },
    /// List available views
    Views {
        /// Extra `[[views]]` TOML file; overrides built-ins by id
        #[arg(long)]
        views_file: Option<PathBuf>,
    },
    /// Compare the nearest hospital for one community across schemes
    Profile {
        #[command(flatten)]
        inputs: InputArgs,
        /// Community name (case-insensitive)
        #[arg(long)]
        community: String,
        /// Extra `[[views]]` TOML file; overrides built-ins by id
        #[arg(long)]
        views_file: Option<PathBuf>,
        /// Profile path (stdout when omitted)
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// List the communities one hospital serves under a view
    Facility {
        #[command(flatten)]
        inputs: InputArgs,
        /// Hospital name (case-insensitive)
        #[arg(long)]
        hospital: String,
        /// View id (see `care_map views`)
        #[arg(long, default_value = DEFAULT_VIEW)]
        view: String,
        /// Extra `[[views]]` TOML file; overrides built-ins by id
        #[arg(long)]
        views_file: Option<PathBuf>,
        /// Profile path (stdout when omitted)
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    init_logger();
    let cli = Cli::parse();

    match execute(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Logs at `info` unless `RUST_LOG` says otherwise.
fn init_logger() {
    let mut builder = pretty_env_logger::formatted_builder();
    builder.filter_level(log::LevelFilter::Info);
    builder.parse_env("RUST_LOG");
    builder.try_init().ok();
}

fn execute(command: Commands) -> Result<(), PipelineError> {
    match command {
        Commands::Run {
            inputs,
            view,
            views_file,
            output,
            regions_geojson: geojson_path,
        } => {
            let registry = load_registry(views_file.as_deref())?;
            let view = registry.get(&view)?;
            let loaded = Dataset::load(&inputs.into_inputs())?;
            let dataset = prepare(&loaded, view)?;

            let evaluation = evaluate(&dataset, view)?;
            let report = build_report(&dataset, view, &evaluation)?;
            let report = serde_json::to_string_pretty(&report)?;
            let districts = match &geojson_path {
                Some(path) => Some((
                    path.as_path(),
                    serde_json::to_string_pretty(&regions_geojson(
                        &dataset,
                        &evaluation.aggregation,
                    ))?,
                )),
                None => None,
            };

            write_outputs(&report, output.as_deref(), districts)?;
        }
        Commands::Views { views_file } => {
            let registry = load_registry(views_file.as_deref())?;
            for view in registry.views() {
                println!("{:<32} {}", view.id, view.name);
                if let Some(description) = &view.description {
                    println!("{:<32} {description}", "");
                }
            }
        }
        Commands::Profile {
            inputs,
            community,
            views_file,
            output,
        } => {
            let registry = load_registry(views_file.as_deref())?;
            let dataset = Dataset::load(&inputs.into_inputs())?;
            let profile = profile_community(&dataset, &registry, &community)?;
            write_json(&profile, output.as_deref())?;
        }
        Commands::Facility {
            inputs,
            hospital,
            view,
            views_file,
            output,
        } => {
            let registry = load_registry(views_file.as_deref())?;
            let view = registry.get(&view)?;
            let dataset = Dataset::load(&inputs.into_inputs())?;
            let profile = profile_facility(&dataset, view, &hospital)?;
            write_json(&profile, output.as_deref())?;
        }
    }

    Ok(())
}

fn load_registry(views_file: Option<&Path>) -> Result<ViewRegistry, PipelineError> {
    let mut registry = ViewRegistry::builtin();
    if let Some(path) = views_file {
        registry.extend_from_file(path)?;
    }
    Ok(registry)
}

fn write_json<T: Serialize>(value: &T, output: Option<&Path>) -> Result<(), PipelineError> {
    emit(&serde_json::to_string_pretty(value)?, output)
}

fn emit(json: &str, output: Option<&Path>) -> Result<(), PipelineError> {
    match output {
        Some(path) => {
            std::fs::write(path, json)?;
            log::info!("Wrote {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

/// Writes the district `GeoJSON` first; the report is written only once
/// that has succeeded.
fn write_outputs(
    report: &str,
    output: Option<&Path>,
    districts: Option<(&Path, String)>,
) -> Result<(), PipelineError> {
    if let Some((path, json)) = districts {
        std::fs::write(path, json)?;
        log::info!("Wrote district features to {}", path.display());
    }
    emit(report, output)
}
