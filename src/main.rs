mod kml {
    pub mod document;
    pub mod field;
    pub mod placemark;
    pub mod record;
    pub mod text;
}
mod service {
    pub mod convert_service;
    pub mod var_service;
}
mod util {
    pub mod env_service;
    pub mod log_service;
}
mod prelude;

use clap::Parser;
use kml::field::{FieldMap, DENUE_FIELD_MAP};
use prelude::*;
use service::{
    convert_service::{run_conversion, ConvertConfig},
    var_service::{get_field_map_path, get_kml_title, get_render_concurrency},
};
use std::{num::NonZeroUsize, path::PathBuf, process::ExitCode};
use util::{env_service::load_env_file, log_service::setup_logging};

/// Converts an INEGI DENUE CSV export into a KML document with one placemark per business.
#[derive(Debug, Parser)]
#[command(version)]
struct Args {
    /// CSV file to read
    input: PathBuf,
    /// KML file to write
    output: PathBuf,
    /// Document title [env: KML_TITLE] [default: INEGI]
    title: Option<String>,
    /// CSV with `column,field` rows replacing the DENUE header mapping [env: KML_FIELD_MAP]
    #[arg(long)]
    field_map: Option<PathBuf>,
    /// Maximum placemarks rendered concurrently [env: KML_RENDER_CONCURRENCY] [default: 10]
    #[arg(long)]
    concurrency: Option<NonZeroUsize>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let env_file = load_env_file().await;
    if let Err(e) = setup_logging().await {
        eprintln!("Failed to set up logging: {}", e);
        return ExitCode::FAILURE;
    }

    match env_file {
        Ok(Some(path)) => tracing::debug!("Loaded environment from {}", path.display()),
        Ok(None) => {}
        Err(e) => {
            tracing::error!("{:#}", e);
            return ExitCode::FAILURE;
        }
    }

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<()> {
    let title = get_kml_title(args.title).await?;
    let concurrency = get_render_concurrency(args.concurrency).await?;
    let field_map = match get_field_map_path(args.field_map).await? {
        Some(path) => FieldMap::from_path(&path)?,
        None => DENUE_FIELD_MAP.clone(),
    };

    tracing::info!(
        "Converting {} to {} (title: {}, concurrency: {})",
        args.input.display(),
        args.output.display(),
        title,
        concurrency
    );
    run_conversion(
        &args.input,
        &args.output,
        &ConvertConfig {
            title,
            concurrency,
            field_map,
        },
    )
    .await?;

    Ok(())
}
