//! Discrete derivative and sign-change helpers.

/// First derivative by central differences in the interior and one-sided
/// differences at both ends, in units of height per sample.
pub fn gradient(z: &[f64]) -> Vec<f64> {
    let n = z.len();
    match n {
        0 => Vec::new(),
        1 => vec![0.0],
        _ => {
            let mut out = Vec::with_capacity(n);
            out.push(z[1] - z[0]);
            for i in 1..n - 1 {
                out.push((z[i + 1] - z[i - 1]) * 0.5);
            }
            out.push(z[n - 1] - z[n - 2]);
            out
        }
    }
}

#[inline]
fn sign(v: f64) -> i8 {
    if v > 0.0 {
        1
    } else if v < 0.0 {
        -1
    } else {
        0
    }
}

/// Indices `i` where the sign of `z[i+1] - reference` differs from the sign
/// of `z[i] - reference`. Zero counts as its own sign.
pub fn sign_changes(z: &[f64], reference: f64) -> Vec<usize> {
    z.windows(2)
        .enumerate()
        .filter(|(_, w)| sign(w[0] - reference) != sign(w[1] - reference))
        .map(|(i, _)| i)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gradient_matches_central_differences() {
        let g = gradient(&[0.0, 1.0, 4.0, 9.0]);
        assert_eq!(g, vec![1.0, 2.0, 4.0, 5.0]);
    }

    #[test]
    fn sign_changes_count_zero_as_a_sign() {
        let idx = sign_changes(&[-1.0, 1.0, 1.0, 0.0, -2.0], 0.0);
        assert_eq!(idx, vec![0, 2, 3]);
    }
}
