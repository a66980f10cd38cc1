//! 1-D peak picking with height and distance constraints.
//!
//! Local maxima are strict on the left and may be flat on top: a plateau
//! counts as one peak located at its (lower) midpoint. Distance suppression
//! keeps the tallest peaks first and discards every other peak closer than
//! `ceil(distance)` samples.

/// All local maxima of `x`, plateaus reduced to their midpoint.
pub fn local_maxima(x: &[f64]) -> Vec<usize> {
    let n = x.len();
    let mut peaks = Vec::new();
    if n < 3 {
        return peaks;
    }
    let mut i = 1usize;
    let i_max = n - 1;
    while i < i_max {
        if x[i - 1] < x[i] {
            let mut ahead = i + 1;
            while ahead < i_max && x[ahead] == x[i] {
                ahead += 1;
            }
            if x[ahead] < x[i] {
                let right = ahead - 1;
                peaks.push((i + right) / 2);
                i = ahead;
            }
        }
        i += 1;
    }
    peaks
}

/// Peaks of `x` at least `height` tall and at least `distance` samples apart.
pub fn find_peaks(x: &[f64], height: f64, distance: f64) -> Vec<usize> {
    let candidates: Vec<usize> = local_maxima(x)
        .into_iter()
        .filter(|&p| x[p] >= height)
        .collect();
    select_by_distance(&candidates, x, distance)
}

fn select_by_distance(peaks: &[usize], x: &[f64], distance: f64) -> Vec<usize> {
    let n = peaks.len();
    let min_gap = distance.ceil().max(1.0) as usize;
    if n < 2 || min_gap <= 1 {
        return peaks.to_vec();
    }
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| {
        x[peaks[a]]
            .partial_cmp(&x[peaks[b]])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut keep = vec![true; n];
    for &j in order.iter().rev() {
        if !keep[j] {
            continue;
        }
        let mut k = j;
        while k > 0 && peaks[j] - peaks[k - 1] < min_gap {
            keep[k - 1] = false;
            k -= 1;
        }
        let mut k = j + 1;
        while k < n && peaks[k] - peaks[j] < min_gap {
            keep[k] = false;
            k += 1;
        }
    }
    peaks
        .iter()
        .zip(keep)
        .filter_map(|(&p, k)| k.then_some(p))
        .collect()
}
