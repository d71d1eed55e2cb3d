// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Rasterization windows and the Gaussian kernel.
//!
//! Windows are half-open pixel rectangles already clipped to the output grid.
//! Bounds are computed in `f64` so that floor/ceil/round land on the same
//! integers for every caller.

#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]

use crate::variant::WindowPolicy;

/// Half-open pixel rectangle `[x0, x1) x [y0, y1)` inside the output grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Window {
    /// First column.
    pub x0: usize,
    /// One past the last column.
    pub x1: usize,
    /// First row.
    pub y0: usize,
    /// One past the last row.
    pub y1: usize,
}

impl Window {
    /// Build a window from unclipped integer bounds.
    ///
    /// Bounds are clipped to `[0, width) x [0, height)`; a range that clips to
    /// nothing yields an empty window rather than an inverted one.
    #[must_use]
    pub fn clipped(x0: i64, x1: i64, y0: i64, y1: i64, width: usize, height: usize) -> Self {
        let (x0, x1) = clip_range(x0, x1, width);
        let (y0, y1) = clip_range(y0, y1, height);
        Self { x0, x1, y0, y1 }
    }

    /// Window over which a keypoint's Gaussian is rasterized.
    ///
    /// # Arguments
    ///
    /// * `x`, `y` - Keypoint location in grid coordinates.
    /// * `sigma` - Gaussian standard deviation.
    /// * `policy` - Window sizing rule.
    /// * `width`, `height` - Output grid size.
    #[must_use]
    pub fn around_keypoint(
        x: f32,
        y: f32,
        sigma: f32,
        policy: WindowPolicy,
        width: usize,
        height: usize,
    ) -> Self {
        let (x, y, sigma) = (f64::from(x), f64::from(y), f64::from(sigma));
        match policy {
            WindowPolicy::ThreeSigma => {
                let reach = 3.0 * sigma;
                Self::clipped(
                    (x - reach - 1.0).floor() as i64,
                    (x + reach + 2.0).ceil() as i64,
                    (y - reach - 1.0).floor() as i64,
                    (y + reach + 2.0).ceil() as i64,
                    width,
                    height,
                )
            }
            WindowPolicy::Threshold {
                threshold,
                round_radius,
            } => {
                let radius = threshold_radius(sigma, f64::from(threshold), round_radius);
                Self::clipped(
                    (x - radius - 1.0).round_ties_even() as i64,
                    (x + radius + 2.0).round_ties_even() as i64,
                    (y - radius - 1.0).round_ties_even() as i64,
                    (y + radius + 2.0).round_ties_even() as i64,
                    width,
                    height,
                )
            }
        }
    }

    /// Square window of half-size `radius` around an integer center.
    ///
    /// The window is `[cx - radius, cx + radius)` on each axis, so it is
    /// `2 * radius` pixels wide before clipping. Radii beyond `i64::MAX`
    /// saturate, so any oversized radius covers the whole grid.
    #[must_use]
    pub fn around_center(cx: i64, cy: i64, radius: usize, width: usize, height: usize) -> Self {
        let radius = i64::try_from(radius).unwrap_or(i64::MAX);
        Self::clipped(
            cx.saturating_sub(radius),
            cx.saturating_add(radius),
            cy.saturating_sub(radius),
            cy.saturating_add(radius),
            width,
            height,
        )
    }

    /// Number of columns.
    #[must_use]
    pub const fn width(&self) -> usize {
        self.x1 - self.x0
    }

    /// Number of rows.
    #[must_use]
    pub const fn height(&self) -> usize {
        self.y1 - self.y0
    }

    /// Returns `true` if the window covers no pixel.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }
}

fn clip_range(lo: i64, hi: i64, size: usize) -> (usize, usize) {
    let lo = lo.max(0);
    let hi = hi.min(i64::try_from(size).unwrap_or(i64::MAX));
    if hi <= lo {
        (0, 0)
    } else {
        (lo as usize, hi as usize)
    }
}

/// Distance at which a Gaussian of standard deviation `sigma` falls to `threshold`.
///
/// `sqrt(2 · ln(1/threshold) · σ²)`, rounded half to even when `round` is set.
#[must_use]
pub fn threshold_radius(sigma: f64, threshold: f64, round: bool) -> f64 {
    let radius = (2.0 * threshold.recip().ln() * sigma * sigma).sqrt();
    if round { radius.round_ties_even() } else { radius }
}

/// Unnormalized 2-D Gaussian centered at `(x0, y0)`, evaluated at pixel `(px, py)`.
#[must_use]
pub fn gaussian(sigma: f32, px: usize, py: usize, x0: f32, y0: f32) -> f32 {
    let dx = px as f64 - f64::from(x0);
    let dy = py as f64 - f64::from(y0);
    let two_sigma_sq = 2.0 * f64::from(sigma).powi(2);
    (-(dx * dx + dy * dy) / two_sigma_sq).exp() as f32
}
