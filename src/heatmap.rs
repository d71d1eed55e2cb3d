// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Joint heatmap targets.
//!
//! [`HeatmapGenerator`] stamps a Gaussian per visible joint instance into that
//! joint's channel, combining overlapping instances by elementwise maximum, and
//! builds a mask that marks every pixel covered by some joint window. Pixels no
//! window reaches receive the caller's background weight.
//!
//! The fixed-sigma and scale-aware behaviors are two configurations of the same
//! generator, see [`HeatmapVariant`].

use ndarray::{Array3, ArrayView3, ArrayViewMut2, Axis, s};

use crate::config::HeatmapConfig;
use crate::error::Result;
use crate::keypoints::{BASE_FIELDS, KeypointSet, SIGMA_FIELDS};
use crate::variant::HeatmapVariant;
use crate::verbose;
use crate::window::{Window, gaussian};

/// Mask value of pixels no joint window has touched yet.
const MASK_SENTINEL: f32 = 2.0;

/// Background weight used when the caller has no preference.
pub const DEFAULT_BACKGROUND_WEIGHT: f32 = 1.0;

/// Heatmap targets for one image.
#[derive(Debug, Clone, PartialEq)]
pub struct HeatmapTargets {
    /// Per-joint confidence maps with shape `(J, H, W)`, values in `[0, 1]`.
    pub heatmaps: Array3<f32>,
    /// Loss weights with shape `(1, H, W)`: 1.0 inside any joint window, the
    /// background weight elsewhere.
    pub mask: Array3<f32>,
}

impl HeatmapTargets {
    /// Number of joint channels.
    #[must_use]
    pub fn num_joints(&self) -> usize {
        self.heatmaps.len_of(Axis(0))
    }

    /// Split into `(heatmaps, mask)`.
    #[must_use]
    pub fn into_parts(self) -> (Array3<f32>, Array3<f32>) {
        (self.heatmaps, self.mask)
    }
}

/// One Gaussian to rasterize.
#[derive(Debug, Clone, Copy)]
struct Stamp {
    x: f32,
    y: f32,
    sigma: f32,
    window: Window,
}

/// Generator for joint heatmaps and their background mask.
///
/// # Example
///
/// ```rust
/// use keypoint_targets::HeatmapGenerator;
/// use ndarray::Array3;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let generator = HeatmapGenerator::fixed_sigma(4, 1)?;
///
/// // One person, one joint at (1.5, 1.5), visible
/// let joints = Array3::from_shape_vec((1, 1, 3), vec![1.5, 1.5, 1.0])?;
/// let targets = generator.generate(joints.view(), 1.0, 1.0, 0.1)?;
///
/// assert!((targets.heatmaps[[0, 1, 1]] - (-0.25f32).exp()).abs() < 1e-6);
/// assert!(targets.mask.iter().all(|&m| m == 1.0));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HeatmapGenerator {
    config: HeatmapConfig,
}

impl HeatmapGenerator {
    /// Create a generator from a configuration.
    ///
    /// # Errors
    ///
    /// Returns [`crate::TargetError::ConfigError`] if the configuration is invalid.
    pub fn new(config: HeatmapConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Generator using one shared body-joint sigma and 3-sigma windows.
    ///
    /// # Errors
    ///
    /// Returns [`crate::TargetError::ConfigError`] for a zero resolution or joint count.
    pub fn fixed_sigma(output_res: usize, num_joints: usize) -> Result<Self> {
        Self::new(HeatmapConfig::fixed_sigma(output_res, num_joints))
    }

    /// Generator reading each body joint's sigma from its record, with
    /// threshold-derived windows.
    ///
    /// # Errors
    ///
    /// Returns [`crate::TargetError::ConfigError`] for a zero resolution or joint count.
    pub fn scale_aware(output_res: usize, num_joints: usize) -> Result<Self> {
        Self::new(HeatmapConfig::scale_aware(output_res, num_joints))
    }

    /// The generator's configuration.
    #[must_use]
    pub const fn config(&self) -> &HeatmapConfig {
        &self.config
    }

    /// Rasterize heatmap targets for one image.
    ///
    /// # Arguments
    ///
    /// * `joints` - Keypoints with shape `(persons, J, fields)` in output-grid
    ///   coordinates. The scale-aware variant needs a 4th `sigma` field.
    /// * `joint_sigma` - Sigma of body joints. Unused by the scale-aware variant.
    /// * `center_sigma` - Sigma of center joints (index >= `body_joints`).
    /// * `background_weight` - Mask value of pixels outside every joint window,
    ///   usually [`DEFAULT_BACKGROUND_WEIGHT`].
    ///
    /// # Errors
    ///
    /// Returns [`crate::TargetError::JointCountMismatch`] if the joint axis does
    /// not match the configured joint count, or
    /// [`crate::TargetError::FieldCountMismatch`] if records lack a field the
    /// variant reads.
    pub fn generate(
        &self,
        joints: ArrayView3<'_, f32>,
        joint_sigma: f32,
        center_sigma: f32,
        background_weight: f32,
    ) -> Result<HeatmapTargets> {
        let HeatmapConfig {
            output_res,
            num_joints,
            ..
        } = self.config;
        let required_fields = if self.config.variant.uses_instance_sigma() {
            SIGMA_FIELDS
        } else {
            BASE_FIELDS
        };
        let keypoints = KeypointSet::new(joints, num_joints, required_fields)?;
        if keypoints.is_empty() {
            return Ok(HeatmapTargets {
                heatmaps: Array3::zeros((num_joints, output_res, output_res)),
                mask: Array3::from_elem((1, output_res, output_res), background_weight),
            });
        }

        let stamps = self.collect_stamps(&keypoints, joint_sigma, center_sigma);

        let mut mask = Array3::from_elem((1, output_res, output_res), MASK_SENTINEL);
        for stamp in stamps.iter().flatten() {
            let w = stamp.window;
            mask.slice_mut(s![0, w.y0..w.y1, w.x0..w.x1]).fill(1.0);
        }
        mask.mapv_inplace(|m| if m == MASK_SENTINEL { background_weight } else { m });

        let mut heatmaps = Array3::zeros((num_joints, output_res, output_res));
        self.rasterize(&mut heatmaps, &stamps);

        verbose!(
            "{} heatmaps: {} persons, {} instances rasterized",
            self.config.variant,
            keypoints.len(),
            stamps.iter().map(Vec::len).sum::<usize>()
        );

        Ok(HeatmapTargets { heatmaps, mask })
    }

    /// Gather the Gaussians to draw, grouped by joint channel in person order.
    fn collect_stamps(
        &self,
        keypoints: &KeypointSet<'_>,
        joint_sigma: f32,
        center_sigma: f32,
    ) -> Vec<Vec<Stamp>> {
        let res = self.config.output_res;
        let mut stamps = vec![Vec::new(); keypoints.num_joints()];

        for person in 0..keypoints.len() {
            for (idx, joint) in keypoints.person(person) {
                if !joint.is_visible() || !joint.in_grid(res, res) {
                    continue;
                }
                let sigma = if idx >= self.config.body_joints {
                    center_sigma
                } else {
                    match self.config.variant {
                        HeatmapVariant::FixedSigma => joint_sigma,
                        // `generate` required SIGMA_FIELDS for this variant
                        HeatmapVariant::ScaleAware => keypoints.instance_sigma(person, idx),
                    }
                };
                if !(sigma.is_finite() && sigma > 0.0) {
                    verbose!("person {person} joint {idx}: skipping degenerate sigma {sigma}");
                    continue;
                }

                let window =
                    Window::around_keypoint(joint.x, joint.y, sigma, self.config.window, res, res);
                stamps[idx].push(Stamp {
                    x: joint.x,
                    y: joint.y,
                    sigma,
                    window,
                });
            }
        }
        stamps
    }

    fn rasterize(&self, heatmaps: &mut Array3<f32>, stamps: &[Vec<Stamp>]) {
        #[cfg(feature = "parallel")]
        if self.config.parallel {
            use rayon::prelude::*;

            heatmaps
                .axis_iter_mut(Axis(0))
                .into_par_iter()
                .zip(stamps.par_iter())
                .for_each(|(channel, channel_stamps)| draw_channel(channel, channel_stamps));
            return;
        }

        for (channel, channel_stamps) in heatmaps.axis_iter_mut(Axis(0)).zip(stamps) {
            draw_channel(channel, channel_stamps);
        }
    }
}

/// Max-combine every stamp of one joint into its channel.
fn draw_channel(mut channel: ArrayViewMut2<'_, f32>, stamps: &[Stamp]) {
    for stamp in stamps {
        let w = stamp.window;
        let mut region = channel.slice_mut(s![w.y0..w.y1, w.x0..w.x1]);
        for ((row, col), value) in region.indexed_iter_mut() {
            let g = gaussian(stamp.sigma, w.x0 + col, w.y0 + row, stamp.x, stamp.y);
            *value = value.max(g);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TargetError;
    use crate::variant::WindowPolicy;

    /// `(persons, joints, fields)` array with every joint invisible.
    fn blank(persons: usize, joints: usize, fields: usize) -> Array3<f32> {
        Array3::zeros((persons, joints, fields))
    }

    fn place(data: &mut Array3<f32>, person: usize, joint: usize, record: &[f32]) {
        for (field, &value) in record.iter().enumerate() {
            data[[person, joint, field]] = value;
        }
    }

    #[test]
    fn test_single_joint_example() {
        let generator = HeatmapGenerator::fixed_sigma(4, 18).unwrap();
        let mut joints = blank(1, 18, 3);
        place(&mut joints, 0, 0, &[1.5, 1.5, 1.0]);

        let targets = generator.generate(joints.view(), 1.0, 1.0, 0.5).unwrap();

        assert_eq!(targets.heatmaps.dim(), (18, 4, 4));
        assert_eq!(targets.mask.dim(), (1, 4, 4));
        assert!((targets.heatmaps[[0, 1, 1]] - 0.778_800_8).abs() < 1e-6);
        assert!(targets.mask.iter().all(|&m| (m - 1.0).abs() < f32::EPSILON));
        // Other channels untouched
        assert!(targets.heatmaps.slice(s![1.., .., ..]).iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_background_weight_outside_windows() {
        let generator = HeatmapGenerator::fixed_sigma(32, 18).unwrap();
        let mut joints = blank(1, 18, 3);
        place(&mut joints, 0, 3, &[4.0, 4.0, 1.0]);

        let targets = generator.generate(joints.view(), 1.0, 1.0, 0.1).unwrap();

        // 3-sigma window is [0, 9) on both axes
        assert!((targets.mask[[0, 8, 8]] - 1.0).abs() < f32::EPSILON);
        assert!((targets.mask[[0, 9, 9]] - 0.1).abs() < f32::EPSILON);
        assert!((targets.mask[[0, 31, 0]] - 0.1).abs() < f32::EPSILON);
        assert!(targets.mask.iter().all(|&m| m != MASK_SENTINEL));
    }

    #[test]
    fn test_center_joint_uses_center_sigma() {
        let generator = HeatmapGenerator::fixed_sigma(32, 18).unwrap();
        let mut joints = blank(1, 18, 3);
        place(&mut joints, 0, 0, &[10.0, 10.0, 1.0]);
        place(&mut joints, 0, 17, &[10.0, 10.0, 1.0]);

        let targets = generator.generate(joints.view(), 1.0, 4.0, 1.0).unwrap();

        let body = targets.heatmaps[[0, 10, 12]];
        let center = targets.heatmaps[[17, 10, 12]];
        assert!((body - gaussian(1.0, 12, 10, 10.0, 10.0)).abs() < 1e-7);
        assert!((center - gaussian(4.0, 12, 10, 10.0, 10.0)).abs() < 1e-7);
        assert!(center > body);
    }

    #[test]
    fn test_scale_aware_reads_instance_sigma() {
        let generator = HeatmapGenerator::scale_aware(32, 18).unwrap();
        let mut joints = blank(1, 18, 4);
        place(&mut joints, 0, 2, &[16.0, 16.0, 1.0, 3.0]);
        place(&mut joints, 0, 17, &[16.0, 16.0, 1.0, 0.5]);

        let targets = generator.generate(joints.view(), 1.0, 2.0, 1.0).unwrap();

        assert!((targets.heatmaps[[2, 16, 19]] - gaussian(3.0, 19, 16, 16.0, 16.0)).abs() < 1e-7);
        // Center joint ignores its own sigma field
        assert!(
            (targets.heatmaps[[17, 16, 19]] - gaussian(2.0, 19, 16, 16.0, 16.0)).abs() < 1e-7
        );
    }

    #[test]
    fn test_scale_aware_ignores_shared_joint_sigma() {
        let generator = HeatmapGenerator::scale_aware(16, 18).unwrap();
        let mut joints = blank(1, 18, 4);
        place(&mut joints, 0, 0, &[8.0, 8.0, 1.0, 1.5]);

        // A degenerate shared sigma would skip the joint if it were read
        let targets = generator.generate(joints.view(), 0.0, 1.0, 1.0).unwrap();

        assert!((targets.heatmaps[[0, 8, 8]] - 1.0).abs() < f32::EPSILON);
        assert!((targets.heatmaps[[0, 8, 10]] - gaussian(1.5, 10, 8, 8.0, 8.0)).abs() < 1e-7);
    }

    #[test]
    fn test_scale_aware_threshold_window_extent() {
        let generator = HeatmapGenerator::scale_aware(64, 18).unwrap();
        let mut joints = blank(1, 18, 4);
        place(&mut joints, 0, 0, &[32.0, 32.0, 1.0, 1.0]);

        let targets = generator.generate(joints.view(), 1.0, 1.0, 0.0).unwrap();

        // radius 3: window [28, 37) on both axes
        assert!((targets.mask[[0, 32, 28]] - 1.0).abs() < f32::EPSILON);
        assert!((targets.mask[[0, 32, 36]] - 1.0).abs() < f32::EPSILON);
        assert!(targets.mask[[0, 32, 27]].abs() < f32::EPSILON);
        assert!(targets.mask[[0, 32, 37]].abs() < f32::EPSILON);
        assert!(targets.heatmaps[[0, 32, 37]].abs() < f32::EPSILON);
    }

    #[test]
    fn test_scale_aware_needs_sigma_field() {
        let generator = HeatmapGenerator::scale_aware(16, 18).unwrap();
        let joints = blank(1, 18, 3);
        assert_eq!(
            generator.generate(joints.view(), 1.0, 1.0, 1.0).unwrap_err(),
            TargetError::FieldCountMismatch {
                required: 4,
                actual: 3
            }
        );
    }

    #[test]
    fn test_joint_count_mismatch() {
        let generator = HeatmapGenerator::fixed_sigma(16, 18).unwrap();
        let joints = blank(2, 17, 3);
        assert_eq!(
            generator.generate(joints.view(), 1.0, 1.0, 1.0).unwrap_err(),
            TargetError::JointCountMismatch {
                expected: 18,
                actual: 17
            }
        );
    }

    #[test]
    fn test_degenerate_sigma_skipped() {
        let generator = HeatmapGenerator::fixed_sigma(8, 18).unwrap();
        let mut joints = blank(1, 18, 3);
        place(&mut joints, 0, 0, &[4.0, 4.0, 1.0]);

        let targets = generator.generate(joints.view(), 0.0, 1.0, 0.3).unwrap();

        assert!(targets.heatmaps.iter().all(|&v| v == 0.0));
        assert!(targets.mask.iter().all(|&m| (m - 0.3).abs() < f32::EPSILON));
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let config = HeatmapConfig::fixed_sigma(48, 18).with_window(WindowPolicy::Threshold {
            threshold: 0.05,
            round_radius: false,
        });
        let parallel = HeatmapGenerator::new(config.clone().with_parallel(true)).unwrap();
        let sequential = HeatmapGenerator::new(config.with_parallel(false)).unwrap();

        let mut joints = blank(3, 18, 3);
        for person in 0..3 {
            for joint in 0..18 {
                let offset = (person * 18 + joint) as f32;
                place(
                    &mut joints,
                    person,
                    joint,
                    &[(offset * 2.7) % 48.0, (offset * 1.3) % 48.0, 1.0],
                );
            }
        }

        let a = parallel.generate(joints.view(), 2.0, 1.0, 0.2).unwrap();
        let b = sequential.generate(joints.view(), 2.0, 1.0, 0.2).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_targets_into_parts() {
        let generator = HeatmapGenerator::fixed_sigma(8, 5).unwrap();
        let targets = generator.generate(blank(0, 5, 3).view(), 1.0, 1.0, 0.7).unwrap();
        assert_eq!(targets.num_joints(), 5);
        let (heatmaps, mask) = targets.into_parts();
        assert!(heatmaps.iter().all(|&v| v == 0.0));
        assert!(mask.iter().all(|&m| (m - 0.7).abs() < f32::EPSILON));
    }
}
