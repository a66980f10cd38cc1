//! Morphological analysis of surface and profile metrology data.
//!
//! The crate consumes leveled height data, either a 1-D [`Profile`] or a
//! 2-D [`Surface`], and returns explicit result records:
//!
//! - [`steps::detect_steps`]: step heights between flat regions.
//! - [`histogram::hist_height`]: bimodal height separation and bearing curve.
//! - [`roughness::roughness_params`]: ISO Gaussian filtering and R-parameters.
//! - [`fit`]: line, cylinder and sphere least-squares fits.
//! - [`angular::sweep_angles`]: per-angle analyses of radial cuts, with
//!   [`angular::sphere_slope`] and [`angular::sphere_radius`] built on it.
//! - [`lateral::estimate_pitch`]: grating pitch and edge sharpness.
//!
//! `NaN` marks invalid samples everywhere and is excluded from reductions.

pub mod angular;
pub mod config;
pub mod data;
pub mod error;
pub mod fit;
pub mod histogram;
pub mod io;
pub mod lateral;
pub mod roughness;
pub mod stats;
pub mod steps;

// --- High-level re-exports -------------------------------------------------

pub use crate::data::{Grid, Profile, Roi, Surface};
pub use crate::error::{MorphError, Result};

pub use crate::angular::{sphere_radius, sphere_slope, sweep_angles, tolerant_mean};
pub use crate::histogram::hist_height;
pub use crate::lateral::estimate_pitch;
pub use crate::roughness::roughness_params;
pub use crate::steps::detect_steps;

// --- Prelude ---------------------------------------------------------------

/// Small prelude for quick experiments.
///
/// ```
/// use surface_morph::prelude::*;
///
/// let z: Vec<f64> = (0..8).map(|i| 0.5 * i as f64 + 1.0).collect();
/// let profile = Profile::from_spacing(0.1, z).unwrap();
/// let leveled = profile.level_line().unwrap();
/// assert!(leveled.z().iter().all(|v| v.abs() < 1e-9));
/// ```
pub mod prelude {
    pub use crate::angular::{
        AngleAnalysis, ProfileExtractor, RadialExtractor, StartPolicy, SweepOptions,
    };
    pub use crate::fit::{fit_cylinder, fit_line_ls, fit_sphere, remove_line, Concavity};
    pub use crate::{
        detect_steps, hist_height, roughness_params, sweep_angles, MorphError, Profile, Surface,
    };
}
