use surface_morph::{Profile, Surface};

/// Piecewise-constant profile: each level held for `width` samples.
pub fn flats(levels: &[f64], width: usize, dx: f64) -> Profile {
    let z = levels
        .iter()
        .flat_map(|&l| std::iter::repeat(l).take(width))
        .collect();
    Profile::from_spacing(dx, z).expect("valid synthetic profile")
}

/// Spherical cap of `radius` centred on an `n × n` lattice, apex at `z = 0`.
/// Samples farther than `aperture` from the centre are sentinels.
pub fn sphere_cap(n: usize, spacing: f64, radius: f64, aperture: f64) -> Surface {
    let c = (n - 1) as f64 * 0.5 * spacing;
    let z = (0..n * n)
        .map(|i| {
            let x = (i % n) as f64 * spacing - c;
            let y = (i / n) as f64 * spacing - c;
            let r2 = x * x + y * y;
            if r2 <= aperture * aperture {
                (radius * radius - r2).sqrt() - radius
            } else {
                f64::NAN
            }
        })
        .collect();
    Surface::from_spacing(n, n, spacing, spacing, z).expect("valid synthetic surface")
}
