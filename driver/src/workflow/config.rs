use anyhow::Context;
use serde::{Deserialize, Serialize};
use skyplotcore::prelude::PlotConfig;
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use crate::workflow::fetch::DEFAULT_SOURCE_URL;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    pub plot: PlotConfig,
    /// Endpoint returning the current state snapshot.
    pub source_url: String,
    pub bind_address: SocketAddr,
    /// File that offline runs append their summary line to.
    pub report_path: PathBuf,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            plot: PlotConfig::default(),
            source_url: DEFAULT_SOURCE_URL.to_string(),
            bind_address: SocketAddr::from(([127, 0, 0, 1], 9000)),
            report_path: PathBuf::from("tools/data/offline_render.log"),
        }
    }
}

impl WorkflowConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading workflow config {}", path_ref.display()))?;
        let config: WorkflowConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing workflow config {}", path_ref.display()))?;
        config
            .plot
            .validate()
            .with_context(|| format!("validating workflow config {}", path_ref.display()))?;
        Ok(config)
    }

    pub fn from_args(plot_width: u32, plot_height: u32, vertical_rate_scale: f64) -> Self {
        Self {
            plot: PlotConfig {
                plot_width,
                plot_height,
                vertical_rate_scale,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    pub fn to_plot_config(&self) -> PlotConfig {
        self.plot.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn config_from_args_produces_plot_config() {
        let cfg = WorkflowConfig::from_args(800, 400, 12.5);
        let plot = cfg.to_plot_config();
        assert_eq!(plot.plot_width, 800);
        assert_eq!(plot.plot_height, 400);
        assert_eq!(plot.vertical_rate_scale, 12.5);
        assert_eq!(plot.marker_size, 5);
        assert_eq!(cfg.source_url, DEFAULT_SOURCE_URL);
    }

    #[test]
    fn config_load_reads_yaml() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(
            b"plot:\n  plot_width: 1200\n  emphasis_threshold: 5.0\nbind_address: 127.0.0.1:9100\n",
        )
        .unwrap();
        let path = temp.into_temp_path();
        let cfg = WorkflowConfig::load(&path).unwrap();
        assert_eq!(cfg.plot.plot_width, 1200);
        assert_eq!(cfg.plot.plot_height, 500);
        assert_eq!(cfg.plot.emphasis_threshold, 5.0);
        assert_eq!(cfg.bind_address.port(), 9100);
    }

    #[test]
    fn config_load_rejects_invalid_plot() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(b"plot:\n  vertical_rate_scale: 0.0\n").unwrap();
        let path = temp.into_temp_path();
        assert!(WorkflowConfig::load(&path).is_err());
    }
}
