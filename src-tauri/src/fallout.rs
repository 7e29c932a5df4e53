// Fallout Overlay Sampling
// Down-samples a dense contamination grid to a bounded set of map points

use serde::{Deserialize, Serialize};

use crate::api_client::FalloutGridResult;

/// Contamination (kBq/m²) at or below which a cell is not rendered.
pub const VISIBILITY_THRESHOLD: f64 = 0.1;
/// Rendering budget: roughly this many sampled cells per grid axis.
pub const TARGET_SAMPLES_PER_AXIS: usize = 50;
/// Point radius bounds (px) for the log-scaled contamination encoding.
pub const MIN_POINT_RADIUS: f64 = 2.0;
pub const MAX_POINT_RADIUS: f64 = 10.0;
/// Opacity ceiling for the strongest contamination.
pub const MAX_POINT_OPACITY: f64 = 0.7;

/// One rendered overlay feature. The full vector returned by
/// [`sample_fallout_grid`] replaces the previous overlay wholesale; the
/// frontend re-adds its ground-zero marker on top.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FalloutPoint {
    pub longitude: f64,
    pub latitude: f64,
    pub radius: f64,
    pub opacity: f64,
}

/// Sample an N x N contamination grid at a fixed stride, keeping only
/// cells above the visibility threshold.
///
/// The stride is `max(1, N / 50)`, so the emitted feature count is
/// O((N/step)²) regardless of grid resolution. This is a deliberate
/// performance trade-off: for large N the overlay is a systematic
/// undersample and must not be read as dose-accurate at fine resolution.
///
/// A grid violating the square/equal-dimension invariant fails closed:
/// the overlay comes back empty instead of panicking mid-render.
pub fn sample_fallout_grid(grid: &FalloutGridResult) -> Vec<FalloutPoint> {
    let n = match grid.grid_size() {
        Ok(n) => n,
        Err(e) => {
            log::warn!("fallout grid rejected, rendering nothing: {e}");
            return Vec::new();
        }
    };

    // Never 0, even for grids smaller than the sample budget.
    let step = (n / TARGET_SAMPLES_PER_AXIS).max(1);

    let mut points = Vec::new();
    for i in (0..n).step_by(step) {
        for j in (0..n).step_by(step) {
            let value = grid.contamination[i][j];
            if value > VISIBILITY_THRESHOLD {
                points.push(FalloutPoint {
                    longitude: grid.longitude[i][j],
                    latitude: grid.latitude[i][j],
                    radius: (value + 1.0).log10().clamp(MIN_POINT_RADIUS, MAX_POINT_RADIUS),
                    opacity: (value / 100.0).min(MAX_POINT_OPACITY),
                });
            }
        }
    }
    points
}
