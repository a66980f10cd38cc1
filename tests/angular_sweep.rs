mod common;

use common::synthetic::sphere_cap;
use common::{approx_eq, init_logger};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use surface_morph::angular::{
    sphere_radius, sphere_slope, sweep_angles, ArcOptions, ArcRadiusAnalysis, ProfileExtractor,
    RadialExtractor, StartPolicy, SweepOptions, SweepProgress,
};
use surface_morph::Surface;

const RADIUS: f64 = 5.0;
const APERTURE: f64 = 0.92;

fn cap() -> Surface {
    sphere_cap(41, 0.05, RADIUS, APERTURE)
}

fn options(parallel: bool) -> SweepOptions {
    SweepOptions {
        step_deg: 30.0,
        start: StartPolicy::Local,
        parallel,
        ..SweepOptions::default()
    }
}

#[test]
fn parallel_and_sequential_sweeps_agree() {
    init_logger();
    let surface = cap();
    let arc = ArcOptions {
        nominal_radius: RADIUS,
        skip: 0.02,
    };
    let seq = sphere_radius(&surface, &RadialExtractor, &arc, &options(false), None).unwrap();
    let par = sphere_radius(&surface, &RadialExtractor, &arc, &options(true), None).unwrap();
    assert_eq!(seq.angles_deg, par.angles_deg);
    assert_eq!(seq.per_angle, par.per_angle);
    assert_eq!(seq.radius, par.radius);
    assert_eq!(seq.depth, par.depth);
}

#[test]
fn progress_callback_does_not_change_results() {
    init_logger();
    let surface = cap();
    let calls = AtomicUsize::new(0);
    let seen = Mutex::new(Vec::new());
    let progress: &(dyn Fn(SweepProgress) + Sync) = &|p: SweepProgress| {
        calls.fetch_add(1, Ordering::SeqCst);
        seen.lock().unwrap().push(p.completed);
        assert_eq!(p.total, 12);
    };
    let analysis = ArcRadiusAnalysis { skip: 0.02 };
    let with = sweep_angles(&surface, &RadialExtractor, &analysis, &options(true), Some(progress))
        .unwrap();
    let without = sweep_angles(&surface, &RadialExtractor, &analysis, &options(true), None).unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 12);
    let mut seen = seen.into_inner().unwrap();
    seen.sort_unstable();
    assert_eq!(seen, (1..=12).collect::<Vec<_>>());
    assert_eq!(with.results, without.results);
}

#[test]
fn radius_map_recovers_the_cap_radius() {
    init_logger();
    let surface = cap();
    let arc = ArcOptions {
        nominal_radius: RADIUS,
        skip: 0.02,
    };
    let map = sphere_radius(&surface, &RadialExtractor, &arc, &options(true), None).unwrap();
    assert_eq!(map.angles_deg.len(), 12);
    assert!(!map.radius.is_empty());
    assert_eq!(map.radius.count[0], 12);
    for (i, r) in map.radius.mean.iter().enumerate() {
        assert!(approx_eq(*r, RADIUS, 0.02 * RADIUS), "index {i}: r={r}");
    }
    // Counts never grow with depth.
    assert!(map.radius.count.windows(2).all(|w| w[0] >= w[1]));
}

#[test]
fn slope_map_reaches_the_aperture() {
    init_logger();
    let surface = cap();
    let arc = ArcOptions {
        nominal_radius: RADIUS,
        skip: 0.05,
    };
    let map = sphere_slope(&surface, &RadialExtractor, &arc, &options(false), None).unwrap();
    let lo = (0.7 / RADIUS).asin().to_degrees();
    let hi = (APERTURE / RADIUS).asin().to_degrees();
    for (angle, (edge, deepest)) in map
        .angles_deg
        .iter()
        .zip(map.edge_deg.iter().zip(&map.deepest_deg))
    {
        assert!(*edge >= lo && *edge <= hi + 1e-9, "angle {angle}: edge {edge}");
        assert!(*deepest <= *edge + 1e-9, "angle {angle}: deepest {deepest}");
    }
}

#[test]
fn start_policies_agree_on_a_centred_cap() {
    let surface = cap();
    let ex = RadialExtractor;
    let centre = ex.start_node(&surface, StartPolicy::Center).unwrap();
    assert_eq!(centre, (20, 20));
    assert_eq!(ex.start_node(&surface, StartPolicy::Local).unwrap(), centre);
    assert_eq!(ex.start_node(&surface, StartPolicy::Max).unwrap(), centre);
    assert_eq!(ex.start_node(&surface, StartPolicy::Fit).unwrap(), centre);

    let profile = ex.extract(&surface, StartPolicy::Fit).unwrap();
    assert_eq!(profile.len(), 21);
    assert_eq!(profile.z()[0], 0.0);
    assert_eq!(profile.first_sentinel(), Some(19));
}
