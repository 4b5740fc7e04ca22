use std::path::Path;

use plotters::prelude::*;

use crate::body::SystemState;
use crate::error::DatasetError;

/// One distinct color per body, cycled for larger systems.
const COLORS: [RGBColor; 3] = [RED, GREEN, BLUE];

/// Render a multi-body trajectory to a PNG image.
///
/// One polyline per body with a filled marker on its final position, axis
/// labels and a legend.
pub fn plot_trajectory(
    trajectory: &[SystemState],
    path: impl AsRef<Path>,
) -> Result<(), DatasetError> {
    render(trajectory, path.as_ref()).map_err(|e| DatasetError::Plot(e.to_string()))
}

fn render(trajectory: &[SystemState], path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let num_bodies = trajectory.first().map_or(0, |state| state.bodies.len());
    let positions: Vec<Vec<(f64, f64)>> = (0..num_bodies)
        .map(|i| {
            trajectory
                .iter()
                .map(|state| (state.bodies[i].position.x, state.bodies[i].position.y))
                .collect()
        })
        .collect();

    let (x_range, y_range) = axis_ranges(&positions);

    let root = BitMapBackend::new(path, (500, 500)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Trajectories", ("sans-serif", 20))
        .margin(10)
        .x_label_area_size(30)
        .y_label_area_size(40)
        .build_cartesian_2d(x_range, y_range)?;
    chart.configure_mesh().x_desc("x").y_desc("y").draw()?;

    for (i, points) in positions.iter().enumerate() {
        let color = COLORS[i % COLORS.len()];

        chart
            .draw_series(LineSeries::new(points.iter().copied(), &color))?
            .label(format!("body {i} orbital"))
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 15, y)], color));

        if let Some(&last) = points.last() {
            chart.draw_series(std::iter::once(Circle::new(last, 4, color.filled())))?;
        }
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;
    root.present()?;

    Ok(())
}

fn axis_ranges(positions: &[Vec<(f64, f64)>]) -> (std::ops::Range<f64>, std::ops::Range<f64>) {
    let mut x_min = f64::INFINITY;
    let mut x_max = f64::NEG_INFINITY;
    let mut y_min = f64::INFINITY;
    let mut y_max = f64::NEG_INFINITY;

    for &(x, y) in positions.iter().flatten() {
        x_min = x_min.min(x);
        x_max = x_max.max(x);
        y_min = y_min.min(y);
        y_max = y_max.max(y);
    }
    if !x_min.is_finite() {
        return (-1.0..1.0, -1.0..1.0);
    }

    // Equal padding on both axes keeps the aspect close to square.
    let pad = 0.1 * (x_max - x_min).max(y_max - y_min).max(1e-3);
    (x_min - pad..x_max + pad, y_min - pad..y_max + pad)
}
