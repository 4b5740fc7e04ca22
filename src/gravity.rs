use nalgebra::Vector2;

use crate::body::Body;

/// Gravitational constant in the natural units of the generated data.
///
/// The datasets operate at unit scales (masses of order 1–10, separations of
/// order 1), so the constant is 1 rather than the SI value.
pub const G: f64 = 1.0;

/// Acceleration exerted on a body at `position1` by a mass at `position2`.
///
/// `softening` is added to the squared distance to avoid the singularity of
/// close encounters; pass 0 for the bare law.
pub fn acceleration(
    position1: Vector2<f64>,
    mass2: f64,
    position2: Vector2<f64>,
    softening: f64,
) -> Vector2<f64> {
    let r = position2 - position1;
    let r_square = r.norm_squared();
    r * G * mass2 / (r_square + softening).sqrt().powi(3)
}

/// Pairwise accelerations by direct summation, one per body, aligned by
/// index.
pub fn accelerations(bodies: &[Body], softening: f64) -> Vec<Vector2<f64>> {
    bodies
        .iter()
        .enumerate()
        .map(|(i, body)| {
            bodies
                .iter()
                .enumerate()
                .filter(|&(j, _)| j != i)
                .map(|(_, other)| acceleration(body.position, other.mass, other.position, softening))
                .sum()
        })
        .collect()
}
