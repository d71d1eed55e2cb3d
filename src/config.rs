// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Generator configuration.
//!
//! This module defines [`HeatmapConfig`] and [`OffsetConfig`], the immutable
//! settings a generator is constructed with: output resolution, joint layout and
//! the tuning constants of each rasterization rule. Both use a builder pattern.
//! Per-call values such as sigmas and the background weight are not part of the
//! configuration.

use crate::error::{Result, TargetError};
use crate::variant::{HeatmapVariant, WindowPolicy};

/// Number of COCO body joints; joint indices at or past this are person centers.
pub const COCO_BODY_JOINTS: usize = 17;

/// Default joint count: 17 COCO body joints plus one person-center joint.
pub const DEFAULT_NUM_JOINTS: usize = COCO_BODY_JOINTS + 1;

/// Default square output resolution.
pub const DEFAULT_OUTPUT_RES: usize = 128;

/// Default half-size of the offset window around a person center, in pixels.
pub const DEFAULT_OFFSET_RADIUS: usize = 4;

/// Configuration for heatmap generation.
///
/// # Example
///
/// ```rust
/// use keypoint_targets::{HeatmapConfig, WindowPolicy};
///
/// let config = HeatmapConfig::scale_aware(128, 18)
///     .with_window(WindowPolicy::Threshold { threshold: 0.05, round_radius: false })
///     .with_parallel(false);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HeatmapConfig {
    /// Side length of the square output grid (H = W).
    pub output_res: usize,
    /// Number of joints per person, center joint(s) included.
    pub num_joints: usize,
    /// Joint indices below this are body joints; the rest use the center sigma.
    pub body_joints: usize,
    /// Where body joint sigmas come from.
    pub variant: HeatmapVariant,
    /// How far around each keypoint the Gaussian is rasterized.
    pub window: WindowPolicy,
    /// Rasterize joint channels concurrently.
    /// Only takes effect when the `parallel` feature is enabled.
    pub parallel: bool,
}

impl Default for HeatmapConfig {
    fn default() -> Self {
        Self {
            output_res: DEFAULT_OUTPUT_RES,
            num_joints: DEFAULT_NUM_JOINTS,
            body_joints: COCO_BODY_JOINTS,
            variant: HeatmapVariant::FixedSigma,
            window: WindowPolicy::ThreeSigma,
            parallel: true,
        }
    }
}

impl HeatmapConfig {
    /// Create a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Configuration for a shared-sigma generator with 3-sigma windows.
    ///
    /// # Arguments
    ///
    /// * `output_res` - Side length of the square output grid.
    /// * `num_joints` - Joints per person, center included.
    #[must_use]
    pub fn fixed_sigma(output_res: usize, num_joints: usize) -> Self {
        Self::default()
            .with_output_res(output_res)
            .with_num_joints(num_joints)
    }

    /// Configuration for a per-instance-sigma generator with threshold windows.
    ///
    /// # Arguments
    ///
    /// * `output_res` - Side length of the square output grid.
    /// * `num_joints` - Joints per person, center included.
    #[must_use]
    pub fn scale_aware(output_res: usize, num_joints: usize) -> Self {
        Self::default()
            .with_output_res(output_res)
            .with_num_joints(num_joints)
            .with_variant(HeatmapVariant::ScaleAware)
            .with_window(HeatmapVariant::ScaleAware.default_window())
    }

    /// Set the output resolution.
    #[must_use]
    pub const fn with_output_res(mut self, output_res: usize) -> Self {
        self.output_res = output_res;
        self
    }

    /// Set the number of joints per person.
    #[must_use]
    pub const fn with_num_joints(mut self, num_joints: usize) -> Self {
        self.num_joints = num_joints;
        self
    }

    /// Set the number of body joints.
    ///
    /// Joints with an index at or above this value are treated as person
    /// centers and always use the center sigma.
    #[must_use]
    pub const fn with_body_joints(mut self, body_joints: usize) -> Self {
        self.body_joints = body_joints;
        self
    }

    /// Set the sigma source. The window policy is left unchanged.
    #[must_use]
    pub const fn with_variant(mut self, variant: HeatmapVariant) -> Self {
        self.variant = variant;
        self
    }

    /// Set the window policy.
    #[must_use]
    pub const fn with_window(mut self, window: WindowPolicy) -> Self {
        self.window = window;
        self
    }

    /// Enable or disable concurrent channel rasterization.
    ///
    /// Output is bit-identical either way.
    #[must_use]
    pub const fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Check the configuration for values no generator can work with.
    ///
    /// # Errors
    ///
    /// Returns [`TargetError::ConfigError`] for a zero resolution or joint
    /// count, or a window threshold outside `(0, 1)`.
    pub fn validate(&self) -> Result<()> {
        if self.output_res == 0 {
            return Err(TargetError::ConfigError(
                "output resolution must be positive".to_string(),
            ));
        }
        if self.num_joints == 0 {
            return Err(TargetError::ConfigError(
                "joint count must be positive".to_string(),
            ));
        }
        if let WindowPolicy::Threshold { threshold, .. } = self.window {
            if !(threshold > 0.0 && threshold < 1.0) {
                return Err(TargetError::ConfigError(format!(
                    "window threshold must lie in (0, 1), got {threshold}"
                )));
            }
        }
        Ok(())
    }
}

/// How the offset generator decides that a pixel has already been claimed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum ClaimTracking {
    /// A pixel is claimed for a joint when either of its offset channels is
    /// non-zero; one area map is shared by all joints.
    ///
    /// A genuine zero offset reads as unclaimed.
    #[default]
    OffsetValue,
    /// Claims are recorded per joint channel in an area grid that starts at a
    /// reserved "no claim" value, so zero offsets still count as claims.
    Explicit,
}

/// Configuration for offset generation.
///
/// # Example
///
/// ```rust
/// use keypoint_targets::{ClaimTracking, OffsetConfig};
///
/// let config = OffsetConfig::new()
///     .with_output_size(128, 96)
///     .with_radius(4)
///     .with_claims(ClaimTracking::Explicit);
/// assert_eq!(config.output_w, 96);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OffsetConfig {
    /// Output grid height.
    pub output_h: usize,
    /// Output grid width.
    pub output_w: usize,
    /// Number of joints per person; the last one is the person center.
    pub num_joints: usize,
    /// Half-size of the square window around the center, in pixels.
    pub radius: usize,
    /// Claim detection used by the overlap tie-break.
    pub claims: ClaimTracking,
}

impl Default for OffsetConfig {
    fn default() -> Self {
        Self {
            output_h: DEFAULT_OUTPUT_RES,
            output_w: DEFAULT_OUTPUT_RES,
            num_joints: DEFAULT_NUM_JOINTS,
            radius: DEFAULT_OFFSET_RADIUS,
            claims: ClaimTracking::OffsetValue,
        }
    }
}

impl OffsetConfig {
    /// Create a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the output grid size.
    ///
    /// # Arguments
    ///
    /// * `height` - Output grid height.
    /// * `width` - Output grid width.
    #[must_use]
    pub const fn with_output_size(mut self, height: usize, width: usize) -> Self {
        self.output_h = height;
        self.output_w = width;
        self
    }

    /// Set the number of joints per person, center included.
    #[must_use]
    pub const fn with_num_joints(mut self, num_joints: usize) -> Self {
        self.num_joints = num_joints;
        self
    }

    /// Set the window half-size around each person center.
    #[must_use]
    pub const fn with_radius(mut self, radius: usize) -> Self {
        self.radius = radius;
        self
    }

    /// Set the claim detection mode.
    #[must_use]
    pub const fn with_claims(mut self, claims: ClaimTracking) -> Self {
        self.claims = claims;
        self
    }

    /// Number of offset channels: two per non-center joint.
    #[must_use]
    pub const fn num_channels(&self) -> usize {
        2 * self.num_joints.saturating_sub(1)
    }

    /// Check the configuration for values no generator can work with.
    ///
    /// # Errors
    ///
    /// Returns [`TargetError::ConfigError`] for an empty grid or fewer than two
    /// joints (one body joint plus the center).
    pub fn validate(&self) -> Result<()> {
        if self.output_h == 0 || self.output_w == 0 {
            return Err(TargetError::ConfigError(format!(
                "output size must be positive, got {}x{}",
                self.output_h, self.output_w
            )));
        }
        if self.num_joints < 2 {
            return Err(TargetError::ConfigError(format!(
                "offsets need at least one body joint and a center joint, got {} joints",
                self.num_joints
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heatmap_config_default() {
        let config = HeatmapConfig::default();
        assert_eq!(config.output_res, 128);
        assert_eq!(config.num_joints, 18);
        assert_eq!(config.body_joints, 17);
        assert_eq!(config.variant, HeatmapVariant::FixedSigma);
        assert_eq!(config.window, WindowPolicy::ThreeSigma);
        assert!(config.parallel);
    }

    #[test]
    fn test_heatmap_config_named_variants() {
        let fixed = HeatmapConfig::fixed_sigma(64, 18);
        assert_eq!(fixed.output_res, 64);
        assert_eq!(fixed.window, WindowPolicy::ThreeSigma);

        let scale = HeatmapConfig::scale_aware(64, 18);
        assert_eq!(scale.variant, HeatmapVariant::ScaleAware);
        match scale.window {
            WindowPolicy::Threshold {
                threshold,
                round_radius,
            } => {
                assert!((threshold - 0.01).abs() < f32::EPSILON);
                assert!(round_radius);
            }
            WindowPolicy::ThreeSigma => panic!("scale-aware default should use threshold windows"),
        }
    }

    #[test]
    fn test_heatmap_config_validate() {
        assert!(HeatmapConfig::default().validate().is_ok());
        assert!(HeatmapConfig::default().with_output_res(0).validate().is_err());
        assert!(HeatmapConfig::default().with_num_joints(0).validate().is_err());

        let bad = HeatmapConfig::default().with_window(WindowPolicy::Threshold {
            threshold: 1.0,
            round_radius: true,
        });
        assert!(matches!(bad.validate(), Err(TargetError::ConfigError(_))));
    }

    #[test]
    fn test_offset_config_builder() {
        let config = OffsetConfig::new()
            .with_output_size(32, 48)
            .with_num_joints(5)
            .with_radius(2)
            .with_claims(ClaimTracking::Explicit);

        assert_eq!(config.output_h, 32);
        assert_eq!(config.output_w, 48);
        assert_eq!(config.num_channels(), 8);
        assert_eq!(config.radius, 2);
        assert_eq!(config.claims, ClaimTracking::Explicit);
    }

    #[test]
    fn test_offset_config_validate() {
        assert!(OffsetConfig::default().validate().is_ok());
        assert!(OffsetConfig::default().with_num_joints(1).validate().is_err());
        assert!(OffsetConfig::default().with_output_size(0, 4).validate().is_err());
    }
}
