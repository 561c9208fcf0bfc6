//! Patch loading for CLI commands.
//!
//! A patch argument is either a path to a JSON document or `-` for stdin.
//! Documents may omit any field; missing fields take their defaults and the
//! result is validated before it reaches the engine.

use std::fs;
use std::io::Read;

use anyhow::{Context, Result};
use overtone_patch::Patch;
use tracing::debug;

/// Argument value that reads the patch from stdin.
pub const STDIN_PATH: &str = "-";

/// Loads and validates a patch from a file path or stdin.
pub fn load_patch(path: &str) -> Result<Patch> {
    let text = if path == STDIN_PATH {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read patch from stdin")?;
        text
    } else {
        fs::read_to_string(path).with_context(|| format!("Failed to read patch file: {}", path))?
    };
    let patch = parse_patch(&text, path)?;
    debug!(path, seed = patch.seed, frequency = patch.frequency, "loaded patch");
    Ok(patch)
}

/// Parses and validates patch JSON. `origin` names the source in errors.
pub fn parse_patch(text: &str, origin: &str) -> Result<Patch> {
    Patch::from_json(text).with_context(|| format!("Invalid patch in {}", origin))
}

/// Loads an optional second-channel patch.
pub fn load_optional_patch(path: Option<&str>) -> Result<Option<Patch>> {
    path.map(load_patch).transpose()
}
