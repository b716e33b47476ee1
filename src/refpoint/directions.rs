//! Das–Dennis reference directions.
//!
//! A simplex-lattice of uniformly spread directions in normalized
//! objective space, generated once per run and used to steer survival
//! diversity.
//!
//! # References
//!
//! - Das & Dennis (1998), "Normal-Boundary Intersection"
//! - Deb & Jain (2014), "An Evolutionary Many-Objective Optimization
//!   Algorithm Using Reference-Point-Based Nondominated Sorting" (NSGA-III)

use crate::moo::fitness::NUM_OBJECTIVES;

/// Generates the simplex lattice with the given number of divisions per
/// objective. The lattice size is `C(divisions + m - 1, m - 1)` for `m`
/// objectives (35 points for 4 objectives and 4 divisions).
///
/// # Panics
///
/// Panics if `divisions` is zero.
pub fn das_dennis(divisions: usize) -> Vec<[f64; NUM_OBJECTIVES]> {
    assert!(divisions > 0, "divisions must be at least 1");

    let mut directions = Vec::new();
    let mut point = [0usize; NUM_OBJECTIVES];
    fill(&mut directions, &mut point, 0, divisions, divisions);
    directions
}

fn fill(
    out: &mut Vec<[f64; NUM_OBJECTIVES]>,
    point: &mut [usize; NUM_OBJECTIVES],
    axis: usize,
    remaining: usize,
    divisions: usize,
) {
    if axis == NUM_OBJECTIVES - 1 {
        point[axis] = remaining;
        let mut direction = [0.0; NUM_OBJECTIVES];
        for (d, &p) in direction.iter_mut().zip(point.iter()) {
            *d = p as f64 / divisions as f64;
        }
        out.push(direction);
        return;
    }
    for step in 0..=remaining {
        point[axis] = step;
        fill(out, point, axis + 1, remaining - step, divisions);
    }
}

/// Perpendicular distance from a (normalized) objective point to the ray
/// through the origin along `direction`.
pub fn perpendicular_distance(point: &[f64; NUM_OBJECTIVES], direction: &[f64; NUM_OBJECTIVES]) -> f64 {
    let norm_sq: f64 = direction.iter().map(|d| d * d).sum();
    if norm_sq <= f64::EPSILON {
        return point.iter().map(|p| p * p).sum::<f64>().sqrt();
    }
    let dot: f64 = point.iter().zip(direction.iter()).map(|(p, d)| p * d).sum();
    let projection = dot / norm_sq;
    point
        .iter()
        .zip(direction.iter())
        .map(|(p, d)| p - projection * d)
        .map(|v| v * v)
        .sum::<f64>()
        .sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lattice_size_matches_binomial() {
        // C(divisions + 3, 3) for four objectives.
        assert_eq!(das_dennis(1).len(), 4);
        assert_eq!(das_dennis(2).len(), 10);
        assert_eq!(das_dennis(4).len(), 35);
    }

    #[test]
    fn test_lattice_points_on_simplex() {
        for direction in das_dennis(3) {
            let sum: f64 = direction.iter().sum();
            assert!((sum - 1.0).abs() < 1e-12);
            assert!(direction.iter().all(|&d| (0.0..=1.0).contains(&d)));
        }
    }

    #[test]
    fn test_corners_present() {
        let lattice = das_dennis(2);
        for corner in 0..NUM_OBJECTIVES {
            let mut expected = [0.0; NUM_OBJECTIVES];
            expected[corner] = 1.0;
            assert!(
                lattice.iter().any(|d| d
                    .iter()
                    .zip(expected.iter())
                    .all(|(a, b)| (a - b).abs() < 1e-12)),
                "corner {corner} missing from lattice"
            );
        }
    }

    #[test]
    fn test_perpendicular_distance_on_ray_is_zero() {
        let direction = [0.5, 0.5, 0.0, 0.0];
        let on_ray = [1.0, 1.0, 0.0, 0.0];
        assert!(perpendicular_distance(&on_ray, &direction) < 1e-12);
    }

    #[test]
    fn test_perpendicular_distance_off_ray_positive() {
        let direction = [1.0, 0.0, 0.0, 0.0];
        let off_ray = [0.0, 1.0, 0.0, 0.0];
        assert!((perpendicular_distance(&off_ray, &direction) - 1.0).abs() < 1e-12);
    }
}
