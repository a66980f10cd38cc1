use crate::angular::{ArcOptions, SweepOptions};
use crate::fit::{Concavity, SolverOptions};
use crate::histogram::HistogramOptions;
use crate::lateral::LateralOptions;
use crate::roughness::RoughnessOptions;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
pub struct MorphToolConfig {
    pub input: InputConfig,
    #[serde(default)]
    pub profile: ProfileAnalyses,
    #[serde(default)]
    pub surface: SurfaceAnalyses,
    #[serde(default)]
    pub output: Option<OutputConfig>,
}

/// Exactly one of the two inputs is analysed.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputConfig {
    Profile(PathBuf),
    Surface(PathBuf),
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ProfileAnalyses {
    /// Fit and remove a line before the other analyses.
    pub level: bool,
    pub steps: bool,
    pub histogram: Option<HistogramOptions>,
    pub roughness: Option<RoughnessOptions>,
    pub lateral: Option<LateralOptions>,
}

impl Default for ProfileAnalyses {
    fn default() -> Self {
        Self {
            level: true,
            steps: true,
            histogram: Some(HistogramOptions::default()),
            roughness: None,
            lateral: None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SurfaceAnalyses {
    pub histogram: Option<HistogramOptions>,
    pub cylinder: Option<CylinderConfig>,
    pub sphere: bool,
    pub slope: Option<ArcOptions>,
    pub radius: Option<ArcOptions>,
    /// Shared by `slope` and `radius`.
    pub sweep: SweepOptions,
}

#[derive(Debug, Deserialize)]
pub struct CylinderConfig {
    pub nominal_radius: f64,
    #[serde(default)]
    pub concavity: Concavity,
    #[serde(default)]
    pub solver: SolverOptions,
}

#[derive(Debug, Deserialize)]
pub struct OutputConfig {
    pub report_json: PathBuf,
}

pub fn load_config(path: &Path) -> Result<MorphToolConfig, String> {
    let data = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config {}: {e}", path.display()))?;
    parse_config(&data).map_err(|e| format!("Failed to parse config {}: {e}", path.display()))
}

pub fn parse_config(json: &str) -> Result<MorphToolConfig, serde_json::Error> {
    serde_json::from_str(json)
}
