use anyhow::{Context, Result};
use directories::ProjectDirs;
use facegallery_vision::hash::DEFAULT_SAMPLE_STRIDE;
use facegallery_vision::synthetic::MAX_SYNTHETIC_FACES;
use facegallery_vision::SimilarityMapping;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub static CONFIG_PATH: Lazy<PathBuf> = Lazy::new(|| {
    if let Some(path) = option_env!("FACEGALLERY_CONFIG_PATH") {
        return PathBuf::from(path);
    }
    ProjectDirs::from("", "", "facegallery")
        .map(|dirs| dirs.config_dir().join("config.toml"))
        .unwrap_or_else(|| PathBuf::from("facegallery.toml"))
});

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Best face similarity must exceed this for a photo to match.
    pub threshold: f32,
    pub mapping: SimilarityMapping,
    /// Fingerprint samples one pixel out of every `sample_stride`.
    pub sample_stride: usize,
    pub max_faces: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            threshold: 0.65,
            mapping: SimilarityMapping::Shifted,
            sample_stride: DEFAULT_SAMPLE_STRIDE,
            max_faces: MAX_SYNTHETIC_FACES,
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.threshold) {
            anyhow::bail!("threshold must be within [0, 1], got {}", self.threshold);
        }
        if self.sample_stride == 0 {
            anyhow::bail!("sample_stride must be > 0");
        }
        if !(1..=MAX_SYNTHETIC_FACES).contains(&self.max_faces) {
            anyhow::bail!(
                "max_faces must be within 1..={}, got {}",
                MAX_SYNTHETIC_FACES,
                self.max_faces
            );
        }
        Ok(())
    }
}

pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let path = path.unwrap_or(&CONFIG_PATH);
    if !path.exists() {
        return Ok(Config::default());
    }
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading config at {}", path.display()))?;
    let cfg: Config =
        toml::from_str(&raw).with_context(|| format!("parsing config {}", path.display()))?;
    cfg.validate()
        .with_context(|| format!("invalid config {}", path.display()))?;
    Ok(cfg)
}

pub fn save_config(cfg: &Config, path: Option<&Path>) -> Result<()> {
    let path = path.unwrap_or(&CONFIG_PATH);
    let data = toml::to_string_pretty(cfg)?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, data)?;
    Ok(())
}
