use nalgebra::Vector2;

/// Number of scalar fields per body in the flat layout:
/// `[mass, px, py, vx, vy]`.
pub const FIELDS: usize = 5;

/// A point mass in two dimensions.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Body {
    pub mass: f64,
    pub position: Vector2<f64>,
    pub velocity: Vector2<f64>,
}

impl Body {
    pub fn new(mass: f64, position: Vector2<f64>, velocity: Vector2<f64>) -> Self {
        Self {
            mass,
            position,
            velocity,
        }
    }

    /// The body's five fields in flat layout.
    pub fn to_flat(self) -> [f64; FIELDS] {
        [
            self.mass,
            self.position.x,
            self.position.y,
            self.velocity.x,
            self.velocity.y,
        ]
    }

    /// Read a body back from one flat row.
    pub fn from_flat(row: &[f64; FIELDS]) -> Self {
        Self {
            mass: row[0],
            position: Vector2::new(row[1], row[2]),
            velocity: Vector2::new(row[3], row[4]),
        }
    }
}

/// The full physical configuration of all bodies at one instant.
///
/// Also used to carry a state's time derivative, which shares the layout:
/// the mass slot is then zero, the position slots hold velocities and the
/// velocity slots hold accelerations.
#[derive(Clone, Debug, PartialEq)]
pub struct SystemState {
    pub bodies: Vec<Body>,
}

impl SystemState {
    pub fn new(bodies: Vec<Body>) -> Self {
        Self { bodies }
    }

    /// Serialize into the flat vector the ODE solver operates on,
    /// `bodies × 5` scalars in body order.
    pub fn flatten(&self) -> Vec<f64> {
        self.bodies
            .iter()
            .flat_map(|body| body.to_flat())
            .collect()
    }

    /// Deserialize from a flat vector. The length must be a multiple of
    /// [`FIELDS`]; this is the inverse of [`SystemState::flatten`].
    pub fn from_flat(flat: &[f64]) -> Self {
        assert!(
            flat.len() % FIELDS == 0,
            "flat state of length {} is not a multiple of {FIELDS}",
            flat.len()
        );

        let bodies = flat
            .chunks_exact(FIELDS)
            .map(|row| Body::from_flat(row.try_into().unwrap()))
            .collect();
        Self { bodies }
    }
}
