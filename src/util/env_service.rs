use crate::prelude::*;
use anyhow::anyhow;
use std::{io::ErrorKind, path::PathBuf};

/// Loads a `.env` file from the working directory or its parents, if there is one.
/// Variables already set in the environment are left alone.
pub async fn load_env_file() -> Result<Option<PathBuf>> {
    match dotenv::dotenv() {
        Ok(path) => Ok(Some(path)),
        Err(dotenv::Error::Io(e)) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(anyhow!("Failed to load .env file: {}", e)),
    }
}
