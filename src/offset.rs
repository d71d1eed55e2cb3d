// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Joint-to-center offset targets.
//!
//! For every person with a visible center, [`OffsetGenerator`] writes, at each
//! pixel of a square window around that center, the displacement from the
//! pixel to each visible joint, plus a `1/sqrt(area)` loss weight. Where windows
//! of different persons overlap, the person with the smaller area keeps the
//! pixel.

#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_possible_wrap
)]

use ndarray::{Array2, Array3, ArrayView3, Axis};

use crate::config::{ClaimTracking, OffsetConfig};
use crate::error::{Result, TargetError};
use crate::keypoints::{BASE_FIELDS, KeypointSet};
use crate::window::Window;
use crate::{verbose, warn};

/// Offset targets for one image.
#[derive(Debug, Clone, PartialEq)]
pub struct OffsetTargets {
    /// Displacements with shape `(2 * (J - 1), H, W)`; channels `2 * idx` and
    /// `2 * idx + 1` hold `px - x` and `py - y` for joint `idx`.
    pub offset: Array3<f32>,
    /// Loss weights, same shape: `1/sqrt(area)` of the winning person, 0 where
    /// no person claimed the pixel.
    pub weight: Array3<f32>,
}

impl OffsetTargets {
    /// Number of offset channels.
    #[must_use]
    pub fn num_channels(&self) -> usize {
        self.offset.len_of(Axis(0))
    }

    /// Split into `(offset, weight)`.
    #[must_use]
    pub fn into_parts(self) -> (Array3<f32>, Array3<f32>) {
        (self.offset, self.weight)
    }
}

/// Area of the claim currently holding each pixel.
enum ClaimMap {
    /// One area per pixel shared by all joints; claims are detected from
    /// non-zero offsets.
    Shared(Array2<f32>),
    /// One area per joint and pixel, `+inf` where unclaimed.
    PerJoint(Array3<f32>),
}

impl ClaimMap {
    fn new(tracking: ClaimTracking, joints: usize, height: usize, width: usize) -> Self {
        match tracking {
            ClaimTracking::OffsetValue => Self::Shared(Array2::zeros((height, width))),
            ClaimTracking::Explicit => {
                Self::PerJoint(Array3::from_elem((joints, height, width), f32::INFINITY))
            }
        }
    }

    /// Whether a person of `area` may take pixel `(py, px)` for joint `idx`.
    ///
    /// An existing claim with a strictly smaller area is never overwritten.
    fn admits(&self, offset: &Array3<f32>, idx: usize, py: usize, px: usize, area: f32) -> bool {
        match self {
            Self::Shared(areas) => {
                let claimed =
                    offset[[2 * idx, py, px]] != 0.0 || offset[[2 * idx + 1, py, px]] != 0.0;
                !(claimed && areas[[py, px]] < area)
            }
            Self::PerJoint(areas) => areas[[idx, py, px]] >= area,
        }
    }

    fn record(&mut self, idx: usize, py: usize, px: usize, area: f32) {
        match self {
            Self::Shared(areas) => areas[[py, px]] = area,
            Self::PerJoint(areas) => areas[[idx, py, px]] = area,
        }
    }
}

/// Generator for joint-to-center offset fields.
///
/// # Example
///
/// ```rust
/// use keypoint_targets::{OffsetConfig, OffsetGenerator};
/// use ndarray::Array3;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let generator = OffsetGenerator::new(
///     OffsetConfig::new().with_output_size(4, 4).with_num_joints(2).with_radius(2),
/// )?;
///
/// // One joint and the center, both at (2, 2)
/// let joints = Array3::from_shape_vec((1, 2, 3), vec![2.0, 2.0, 1.0, 2.0, 2.0, 1.0])?;
/// let targets = generator.generate(joints.view(), &[4.0])?;
///
/// assert_eq!(targets.offset[[0, 3, 1]], -1.0);
/// assert_eq!(targets.offset[[1, 3, 1]], 1.0);
/// assert_eq!(targets.weight[[0, 3, 1]], 0.5);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct OffsetGenerator {
    config: OffsetConfig,
}

impl OffsetGenerator {
    /// Create a generator from a configuration.
    ///
    /// # Errors
    ///
    /// Returns [`TargetError::ConfigError`] if the configuration is invalid.
    pub fn new(config: OffsetConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Create a generator with the default claim tracking.
    ///
    /// # Arguments
    ///
    /// * `output_h`, `output_w` - Output grid size.
    /// * `num_joints` - Joints per person; the last one is the center.
    /// * `radius` - Half-size of the window around each center.
    ///
    /// # Errors
    ///
    /// Returns [`TargetError::ConfigError`] if the configuration is invalid.
    pub fn with_size(
        output_h: usize,
        output_w: usize,
        num_joints: usize,
        radius: usize,
    ) -> Result<Self> {
        Self::new(
            OffsetConfig::new()
                .with_output_size(output_h, output_w)
                .with_num_joints(num_joints)
                .with_radius(radius),
        )
    }

    /// The generator's configuration.
    #[must_use]
    pub const fn config(&self) -> &OffsetConfig {
        &self.config
    }

    /// Compute offset targets for one image.
    ///
    /// # Arguments
    ///
    /// * `joints` - Keypoints with shape `(persons, J, fields)` in output-grid
    ///   coordinates; the last joint of each person is its center.
    /// * `areas` - One positive reference area per person, aligned with `joints`.
    ///
    /// # Errors
    ///
    /// Returns [`TargetError::JointCountMismatch`] if the joint axis does not
    /// match the configured joint count, [`TargetError::FieldCountMismatch`] if
    /// records have fewer than 3 fields, or [`TargetError::AreaCountMismatch`]
    /// if `areas` is not one entry per person.
    pub fn generate(&self, joints: ArrayView3<'_, f32>, areas: &[f32]) -> Result<OffsetTargets> {
        let OffsetConfig {
            output_h: height,
            output_w: width,
            num_joints,
            radius,
            claims,
        } = self.config;
        let keypoints = KeypointSet::new(joints, num_joints, BASE_FIELDS)?;
        if areas.len() != keypoints.len() {
            return Err(TargetError::AreaCountMismatch {
                expected: keypoints.len(),
                actual: areas.len(),
            });
        }

        let body_joints = num_joints - 1;
        let shape = (2 * body_joints, height, width);
        let mut offset = Array3::<f32>::zeros(shape);
        let mut weight = Array3::<f32>::zeros(shape);
        let mut claim_map = ClaimMap::new(claims, body_joints, height, width);

        let mut skipped = 0usize;
        for (person, &area) in areas.iter().enumerate() {
            let center = keypoints.joint(person, body_joints);
            if !(center.x.is_finite() && center.y.is_finite()) {
                skipped += 1;
                continue;
            }
            // Centers snap to the grid by truncation toward zero
            let ct_x = center.x.trunc() as i64;
            let ct_y = center.y.trunc() as i64;
            let ct_v = center.visibility.trunc();
            if !(ct_v >= 1.0)
                || ct_x < 0
                || ct_y < 0
                || ct_x >= width as i64
                || ct_y >= height as i64
            {
                skipped += 1;
                continue;
            }
            if !(area.is_finite() && area > 0.0) {
                warn!("person {person}: area must be positive, got {area}; skipping");
                skipped += 1;
                continue;
            }

            let inv_sqrt_area = (1.0 / f64::from(area).sqrt()) as f32;
            let window = Window::around_center(ct_x, ct_y, radius, width, height);

            for idx in 0..body_joints {
                let joint = keypoints.joint(person, idx);
                if !joint.is_visible() || !joint.in_grid(width, height) {
                    continue;
                }

                for py in window.y0..window.y1 {
                    for px in window.x0..window.x1 {
                        if !claim_map.admits(&offset, idx, py, px, area) {
                            continue;
                        }
                        offset[[2 * idx, py, px]] = px as f32 - joint.x;
                        offset[[2 * idx + 1, py, px]] = py as f32 - joint.y;
                        weight[[2 * idx, py, px]] = inv_sqrt_area;
                        weight[[2 * idx + 1, py, px]] = inv_sqrt_area;
                        claim_map.record(idx, py, px, area);
                    }
                }
            }
        }

        verbose!("offsets: {} persons, {skipped} skipped", keypoints.len());

        Ok(OffsetTargets { offset, weight })
    }
}
