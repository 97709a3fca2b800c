use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

/// Which adapter to ask wgpu for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PowerPreference {
    LowPower,
    #[default]
    HighPerformance,
}

impl From<PowerPreference> for wgpu::PowerPreference {
    fn from(p: PowerPreference) -> Self {
        match p {
            PowerPreference::LowPower => wgpu::PowerPreference::LowPower,
            PowerPreference::HighPerformance => wgpu::PowerPreference::HighPerformance,
        }
    }
}

/// Device settings, usually read from a small YAML file:
///
/// ```yaml
/// power_preference: low_power
/// workgroup_size: 128
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct DeviceConfig {
    pub power_preference: PowerPreference,
    /// Threads per workgroup for 1-D kernels
    pub workgroup_size: u32,
    /// Prefix for wgpu debug labels
    pub label: String,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            power_preference: PowerPreference::default(),
            workgroup_size: 64,
            label: "cliprt".to_string(),
        }
    }
}

impl DeviceConfig {
    pub fn from_yaml_str(src: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(src).context("invalid device config")?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let src = std::fs::read_to_string(path)
            .with_context(|| format!("reading device config {}", path.display()))?;
        Self::from_yaml_str(&src)
    }

    pub fn validate(&self) -> Result<()> {
        let wg = self.workgroup_size;
        if wg == 0 || wg > 256 || !wg.is_power_of_two() {
            bail!("workgroup_size must be a power of two in 1..=256, got {wg}");
        }
        Ok(())
    }
}
