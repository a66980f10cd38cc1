use serde::Serialize;
use std::env;
use std::path::Path;
use surface_morph::angular::{self, RadialExtractor, RadiusMap, SlopeMap, SweepProgress};
use surface_morph::config::morph::{self, InputConfig, ProfileAnalyses, SurfaceAnalyses};
use surface_morph::fit::{self, CylinderFit, LineFit, SphereFit};
use surface_morph::histogram::HistHeight;
use surface_morph::io::{load_profile_json, load_surface_json, write_json_file};
use surface_morph::lateral::LateralReport;
use surface_morph::roughness::RoughnessReport;
use surface_morph::steps::{self, StepReport};
use surface_morph::{Profile, Surface};

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let config_path = env::args().nth(1).ok_or_else(usage)?;
    let config = morph::load_config(Path::new(&config_path))?;

    let report = match &config.input {
        InputConfig::Profile(path) => {
            let profile = load_profile_json(path)?;
            println!("Loaded profile {} ({} samples)", path.display(), profile.len());
            MorphReport::Profile(analyse_profile(profile, &config.profile)?)
        }
        InputConfig::Surface(path) => {
            let surface = load_surface_json(path)?;
            println!(
                "Loaded surface {} ({}x{})",
                path.display(),
                surface.width(),
                surface.height()
            );
            MorphReport::Surface(analyse_surface(&surface, &config.surface)?)
        }
    };

    if let Some(output) = &config.output {
        write_json_file(&output.report_json, &report)?;
        println!("Saved report to {}", output.report_json.display());
    }
    Ok(())
}

fn usage() -> String {
    "Usage: morph_demo <config.json>".to_string()
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
enum MorphReport {
    Profile(ProfileReport),
    Surface(SurfaceReport),
}

#[derive(Default, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProfileReport {
    line: Option<LineFit>,
    steps: Option<StepReport>,
    histogram: Option<HistHeight>,
    roughness: Option<RoughnessReport>,
    lateral: Option<LateralReport>,
}

#[derive(Default, Serialize)]
#[serde(rename_all = "camelCase")]
struct SurfaceReport {
    histogram: Option<HistHeight>,
    cylinder: Option<CylinderFit>,
    sphere: Option<SphereFit>,
    slope: Option<SlopeMap>,
    radius: Option<RadiusMap>,
}

fn analyse_profile(profile: Profile, cfg: &ProfileAnalyses) -> Result<ProfileReport, String> {
    let mut report = ProfileReport::default();
    let profile = if cfg.level {
        let leveled = profile.level_line().map_err(|e| format!("Line fit failed: {e}"))?;
        report.line = leveled.line().copied();
        leveled
    } else {
        profile
    };

    if cfg.steps {
        let steps = steps::detect_steps(&profile).map_err(|e| format!("Step detection failed: {e}"))?;
        let heights: Vec<String> = steps.steps.iter().map(|s| format!("{s:.4}")).collect();
        println!(
            "Steps: [{}] ({})",
            heights.join(", "),
            if steps.well_defined {
                "well defined"
            } else {
                "poorly defined"
            }
        );
        report.steps = Some(steps);
    }
    if let Some(opts) = &cfg.histogram {
        let hist = profile
            .hist_height(opts.bins)
            .map_err(|e| format!("Histogram failed: {e}"))?;
        println!("Histogram height: {:.4} (bimodal: {})", hist.height, hist.is_bimodal());
        report.histogram = Some(hist);
    }
    if let Some(opts) = &cfg.roughness {
        let rough = profile
            .roughness(opts)
            .map_err(|e| format!("Roughness failed: {e}"))?;
        let p = &rough.params;
        println!(
            "Roughness: Ra={:.4} Rq={:.4} Rp={:.4} Rv={:.4} Rz={:.4} Rsk={:.3} Rku={:.3}",
            p.ra, p.rq, p.rp, p.rv, p.rz, p.rsk, p.rku
        );
        report.roughness = Some(rough);
    }
    if let Some(opts) = &cfg.lateral {
        let lateral = profile
            .lateral(opts)
            .map_err(|e| format!("Pitch fit failed: {e}"))?;
        println!(
            "Pitch: {:.4} ({} edges fitted, {} rejected)",
            lateral.pitch,
            lateral.edges.len(),
            lateral.rejected_edges
        );
        report.lateral = Some(lateral);
    }
    Ok(report)
}

fn analyse_surface(surface: &Surface, cfg: &SurfaceAnalyses) -> Result<SurfaceReport, String> {
    let mut report = SurfaceReport::default();
    if let Some(opts) = &cfg.histogram {
        let hist = surface
            .hist_height(opts.bins)
            .map_err(|e| format!("Histogram failed: {e}"))?;
        println!("Histogram height: {:.4} (bimodal: {})", hist.height, hist.is_bimodal());
        report.histogram = Some(hist);
    }
    if let Some(cyl) = &cfg.cylinder {
        let fit = fit::fit_cylinder_with(surface, cyl.nominal_radius, cyl.concavity, &cyl.solver)
            .map_err(|e| format!("Cylinder fit failed: {e}"))?;
        println!(
            "Cylinder: r={:.4} yc={:.4} zc={:.4} rms={:.3e}",
            fit.radius, fit.y_center, fit.z_center, fit.height_rms
        );
        report.cylinder = Some(fit);
    }
    if cfg.sphere {
        let fit = fit::fit_sphere(surface).map_err(|e| format!("Sphere fit failed: {e}"))?;
        println!("Sphere: r={:.4} rms={:.3e}", fit.radius, fit.rms);
        report.sphere = Some(fit);
    }

    let progress: &(dyn Fn(SweepProgress) + Sync) = &|p: SweepProgress| {
        if p.completed == p.total || p.completed % 6 == 0 {
            println!("  sweep {}/{}", p.completed, p.total);
        }
    };
    if let Some(arc) = &cfg.slope {
        let map = angular::sphere_slope(surface, &RadialExtractor, arc, &cfg.sweep, Some(progress))
            .map_err(|e| format!("Slope sweep failed: {e}"))?;
        let max_edge = map.edge_deg.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        println!(
            "Slope: {} angles, max edge slope {:.2} deg",
            map.angles_deg.len(),
            max_edge
        );
        report.slope = Some(map);
    }
    if let Some(arc) = &cfg.radius {
        let map = angular::sphere_radius(surface, &RadialExtractor, arc, &cfg.sweep, Some(progress))
            .map_err(|e| format!("Radius sweep failed: {e}"))?;
        match map.radius.mean.first() {
            Some(r) => println!(
                "Radius: {} depth levels, shallowest mean radius {:.4}",
                map.radius.len(),
                r
            ),
            None => println!("Radius: no sample deeper than {}", arc.skip),
        }
        report.radius = Some(map);
    }
    Ok(report)
}
