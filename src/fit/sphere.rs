//! Algebraic sphere fit.
//!
//! Solves `x² + y² + z² = 2a·x + 2b·y + 2c·z + d` in the least-squares sense;
//! the centre is `(a, b, c)` and the radius `sqrt(d + a² + b² + c²)`.
//! Used to locate the apex of spherical caps for radial extraction.

use crate::data::Surface;
use crate::error::{MorphError, Result};
use log::debug;
use nalgebra::{Matrix4, Vector3, Vector4};
use serde::Serialize;

#[derive(Clone, Copy, Debug, Serialize)]
pub struct SphereFit {
    pub center: Vector3<f64>,
    pub radius: f64,
    /// RMS of the radial distance error of the valid samples.
    pub rms: f64,
}

pub fn fit_sphere(surface: &Surface) -> Result<SphereFit> {
    // Centre the samples first; keeps the normal equations well conditioned
    // for shallow caps.
    let mut origin = Vector3::<f64>::zeros();
    let mut n = 0usize;
    for (x, y, z) in surface.valid_points() {
        origin += Vector3::new(x, y, z);
        n += 1;
    }
    if n == 0 {
        return Err(MorphError::AllSentinel);
    }
    origin /= n as f64;

    let mut ata = Matrix4::<f64>::zeros();
    let mut atb = Vector4::<f64>::zeros();
    for (x, y, z) in surface.valid_points() {
        let p = Vector3::new(x, y, z) - origin;
        let row = Vector4::new(2.0 * p.x, 2.0 * p.y, 2.0 * p.z, 1.0);
        ata += row * row.transpose();
        atb += row * p.norm_squared();
    }
    if n < 4 {
        return Err(MorphError::TooShort {
            found: n,
            minimum: 4,
        });
    }
    let sol = ata
        .cholesky()
        .map(|c| c.solve(&atb))
        .ok_or(MorphError::SingularSystem("sphere fit"))?;
    let local = Vector3::new(sol[0], sol[1], sol[2]);
    let r2 = sol[3] + local.norm_squared();
    let center = local + origin;
    if !(r2 > 0.0) {
        return Err(MorphError::SingularSystem("sphere fit"));
    }
    let radius = r2.sqrt();

    let mut ss = 0.0;
    for (x, y, z) in surface.valid_points() {
        let d = (Vector3::new(x, y, z) - center).norm() - radius;
        ss += d * d;
    }
    let rms = (ss / n as f64).sqrt();
    debug!(
        "sphere fit: centre=({:.4}, {:.4}, {:.4}) r={:.4} rms={:.3e}",
        center.x, center.y, center.z, radius, rms
    );
    Ok(SphereFit {
        center,
        radius,
        rms,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recovers_spherical_cap() {
        let (w, h) = (31, 31);
        let (cx, cy, cz, r) = (1.5, 1.2, -9.0, 10.0);
        let z = (0..w * h)
            .map(|i| {
                let x = (i % w) as f64 * 0.1;
                let y = (i / w) as f64 * 0.1;
                cz + (r * r - (x - cx).powi(2) - (y - cy).powi(2)).sqrt()
            })
            .collect();
        let s = Surface::from_spacing(w, h, 0.1, 0.1, z).unwrap();
        let fit = fit_sphere(&s).unwrap();
        assert!((fit.center.x - cx).abs() < 1e-5, "{:?}", fit.center);
        assert!((fit.center.y - cy).abs() < 1e-5, "{:?}", fit.center);
        assert!((fit.center.z - cz).abs() < 1e-4, "{:?}", fit.center);
        assert!((fit.radius - r).abs() < 1e-4, "r={}", fit.radius);
        assert!(fit.rms < 1e-5);
    }

    #[test]
    fn flat_surface_is_singular() {
        let s = Surface::from_spacing(5, 5, 1.0, 1.0, vec![0.0; 25]).unwrap();
        assert!(fit_sphere(&s).is_err());
    }
}
