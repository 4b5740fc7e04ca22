use nalgebra::Vector2;

/// Bounding box and resolution of a sampled vector field.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FieldConfig {
    pub xmin: f64,
    pub xmax: f64,
    pub ymin: f64,
    pub ymax: f64,
    /// Grid points per axis; the sample covers `gridsize²` points.
    pub gridsize: usize,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            xmin: -2.,
            xmax: 2.,
            ymin: -2.,
            ymax: 2.,
            gridsize: 20,
        }
    }
}

/// A vector field evaluated on a regular grid: points in `x`, field values
/// in `dx`, aligned by index.
#[derive(Clone, Debug, PartialEq)]
pub struct FieldSample {
    pub x: Vec<Vector2<f64>>,
    pub dx: Vec<Vector2<f64>>,
    pub meta: FieldConfig,
}

/// Sample the rigid rotation field `(a, b) -> (-b, a)` over the configured
/// grid.
///
/// Deterministic and independent of the body simulation; rows are emitted in
/// meshgrid order (outer loop over the y axis, inner over the x axis).
pub fn sample_field(config: &FieldConfig) -> FieldSample {
    let n = config.gridsize;
    let mut x = Vec::with_capacity(n * n);
    let mut dx = Vec::with_capacity(n * n);

    for a in linspace(config.ymin, config.ymax, n) {
        for b in linspace(config.xmin, config.xmax, n) {
            x.push(Vector2::new(a, b));
            dx.push(Vector2::new(-b, a));
        }
    }

    FieldSample {
        x,
        dx,
        meta: *config,
    }
}

/// `n` evenly spaced values from `start` to `end` inclusive.
fn linspace(start: f64, end: f64, n: usize) -> impl Iterator<Item = f64> {
    let step = if n > 1 {
        (end - start) / (n - 1) as f64
    } else {
        0.
    };
    (0..n).map(move |i| start + step * i as f64)
}
