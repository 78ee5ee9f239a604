// Loads CortexConfig from an optional TOML file, layered over defaults.
//
// An explicit path always wins; otherwise `~/.cortex/config.toml` is used
// if present, and compiled-in defaults otherwise. Unlike `finch`'s loader
// (which resolves a single API key from `~/.claude/settings.json` or an
// env var, with no file-or-defaults layering), this core has a structured
// multi-component config, so the layering shape is this crate's own.

use super::settings::CortexConfig;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

pub fn load_config(override_path: Option<&Path>) -> Result<CortexConfig> {
    let path = match override_path {
        Some(p) => Some(p.to_path_buf()),
        None => default_config_path(),
    };

    match path {
        Some(p) if p.exists() => {
            let text = std::fs::read_to_string(&p)
                .with_context(|| format!("failed to read config at {}", p.display()))?;
            toml::from_str(&text)
                .with_context(|| format!("failed to parse config at {}", p.display()))
        }
        _ => Ok(CortexConfig::default()),
    }
}

fn default_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".cortex").join("config.toml"))
}
