use anyhow::{anyhow, Context, Result};
use chemotaxis_core::config::PRESET_NAMES;
use chemotaxis_core::SimConfig;
use std::fs;
use std::path::Path;

/// Resolves the effective config: a JSON file wins over a preset, and the
/// classic defaults apply when neither is given.
pub fn load_config(path: Option<&Path>, preset: Option<&str>) -> Result<SimConfig> {
    let config = if let Some(path) = path {
        let data = fs::read(path)
            .with_context(|| format!("failed reading config {}", path.display()))?;
        serde_json::from_slice::<SimConfig>(&data)
            .with_context(|| format!("failed parsing config {}", path.display()))?
    } else if let Some(name) = preset {
        SimConfig::preset(name).ok_or_else(|| {
            anyhow!(
                "unknown preset '{name}' (try: {})",
                PRESET_NAMES.join(", ")
            )
        })?
    } else {
        SimConfig::default()
    };

    config
        .validate()
        .map_err(|err| anyhow!("invalid simulation config: {err}"))?;
    Ok(config)
}
