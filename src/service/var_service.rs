use crate::prelude::*;
use anyhow::anyhow;
use std::{env::var, num::NonZeroUsize, path::PathBuf};

const DEFAULT_TITLE: &str = "INEGI";
const DEFAULT_RENDER_CONCURRENCY: usize = 10;

pub async fn get_kml_title(cli: Option<String>) -> Result<String> {
    Ok(select_title(cli, var("KML_TITLE").ok()))
}

pub async fn get_render_concurrency(cli: Option<NonZeroUsize>) -> Result<NonZeroUsize> {
    match cli {
        Some(concurrency) => Ok(concurrency),
        None => parse_render_concurrency(var("KML_RENDER_CONCURRENCY").ok()),
    }
}

pub async fn get_field_map_path(cli: Option<PathBuf>) -> Result<Option<PathBuf>> {
    Ok(select_field_map_path(cli, var("KML_FIELD_MAP").ok()))
}

fn select_title(cli: Option<String>, env: Option<String>) -> String {
    if let Some(title) = cli {
        return title;
    }

    match env {
        Some(title) => match title.is_empty() {
            true => {
                tracing::info!("KML_TITLE is empty, using {}", DEFAULT_TITLE);
                DEFAULT_TITLE.to_string()
            }
            false => title,
        },
        None => DEFAULT_TITLE.to_string(),
    }
}

fn select_field_map_path(cli: Option<PathBuf>, env: Option<String>) -> Option<PathBuf> {
    if cli.is_some() {
        return cli;
    }

    match env {
        Some(path) => match path.is_empty() {
            true => {
                tracing::info!("KML_FIELD_MAP is empty, using the DENUE column headers");
                None
            }
            false => Some(PathBuf::from(path)),
        },
        None => None,
    }
}

fn parse_render_concurrency(value: Option<String>) -> Result<NonZeroUsize> {
    let default = NonZeroUsize::new(DEFAULT_RENDER_CONCURRENCY)
        .ok_or_else(|| anyhow!("Default render concurrency must be positive"))?;
    match value {
        Some(value) => match value.is_empty() {
            true => Ok(default),
            false => match value.trim().parse::<NonZeroUsize>() {
                Ok(concurrency) => Ok(concurrency),
                Err(e) => {
                    let err = format!(
                        "Failed to parse KML_RENDER_CONCURRENCY '{}' to a positive integer: {}",
                        value, e
                    );
                    tracing::error!(err);
                    Err(anyhow!(err))
                }
            },
        },
        None => Ok(default),
    }
}
