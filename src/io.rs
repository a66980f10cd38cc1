//! JSON I/O for normalized profiles, surfaces and reports.
//!
//! - `load_profile_json`: `{ "x": [...], "z": [...] }`, `null` heights are sentinels.
//! - `load_surface_json`: `{ "x": grid, "y": grid, "z": grid }` with
//!   `grid = { "w", "h", "data" }`, or `{ "w", "h", "dx", "dy", "z": [...] }`.
//! - `write_json_file`: pretty-print a serializable value to disk.
//!
//! Instrument formats are converted to these shapes upstream.

use crate::data::{Profile, Surface};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Deserialize)]
struct ProfileFile {
    x: Option<Vec<f64>>,
    dx: Option<f64>,
    z: Vec<Option<f64>>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SurfaceFile {
    Lattice {
        w: usize,
        h: usize,
        dx: f64,
        dy: f64,
        z: Vec<Option<f64>>,
    },
    Grids(Surface),
}

fn read(path: &Path) -> Result<String, String> {
    fs::read_to_string(path).map_err(|e| format!("Failed to read {}: {e}", path.display()))
}

fn sentinel(z: Vec<Option<f64>>) -> Vec<f64> {
    z.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect()
}

/// Loads a profile; either `x` or a uniform `dx` must be present.
pub fn load_profile_json(path: &Path) -> Result<Profile, String> {
    let file: ProfileFile = serde_json::from_str(&read(path)?)
        .map_err(|e| format!("Failed to parse profile {}: {e}", path.display()))?;
    let z = sentinel(file.z);
    let profile = match (file.x, file.dx) {
        (Some(x), _) => Profile::new(x, z),
        (None, Some(dx)) => Profile::from_spacing(dx, z),
        (None, None) => {
            return Err(format!(
                "Profile {} needs either `x` or `dx`",
                path.display()
            ))
        }
    };
    profile.map_err(|e| format!("Invalid profile {}: {e}", path.display()))
}

pub fn load_surface_json(path: &Path) -> Result<Surface, String> {
    let file: SurfaceFile = serde_json::from_str(&read(path)?)
        .map_err(|e| format!("Failed to parse surface {}: {e}", path.display()))?;
    match file {
        SurfaceFile::Lattice { w, h, dx, dy, z } => Surface::from_spacing(w, h, dx, dy, sentinel(z))
            .map_err(|e| format!("Invalid surface {}: {e}", path.display())),
        SurfaceFile::Grids(surface) => Ok(surface),
    }
}

/// Serialize a value as pretty JSON to `path`, creating parent directories.
pub fn write_json_file<T: Serialize>(path: &Path, value: &T) -> Result<(), String> {
    ensure_parent_dir(path)?;
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| format!("Failed to serialize JSON for {}: {e}", path.display()))?;
    fs::write(path, json).map_err(|e| format!("Failed to write JSON {}: {e}", path.display()))
}

fn ensure_parent_dir(path: &Path) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create {}: {e}", parent.display()))?;
        }
    }
    Ok(())
}
