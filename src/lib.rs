// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

#![allow(clippy::multiple_crate_versions)]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! # Keypoint Training Targets
//!
//! Dense supervision targets for bottom-up multi-person pose estimation.
//!
//! Given one image's keypoint annotations, already projected into the output
//! grid, this crate produces:
//!
//! - **Joint heatmaps** - one Gaussian per visible joint instance, merged across
//!   persons by elementwise maximum, plus a mask that weights pixels outside
//!   every joint's influence window with a background weight
//! - **Offset fields** - per-pixel displacements from a window around each
//!   person's center to each of that person's joints, with `1/sqrt(area)`
//!   weights and a smaller-area-wins rule where persons overlap
//!
//! Annotation loading, augmentation, losses and serialization belong to the
//! surrounding training pipeline.
//!
//! ## Quick Start
//!
//! ```rust
//! use keypoint_targets::{HeatmapGenerator, OffsetGenerator};
//! use ndarray::Array3;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // 2 persons, 17 body joints + 1 center, fields (x, y, visibility)
//! let mut joints = Array3::<f32>::zeros((2, 18, 3));
//! for (person, (cx, cy)) in [(20.0, 30.0), (40.0, 25.0)].into_iter().enumerate() {
//!     joints[[person, 0, 0]] = cx;
//!     joints[[person, 0, 1]] = cy - 6.0;
//!     joints[[person, 0, 2]] = 1.0;
//!     joints[[person, 17, 0]] = cx;
//!     joints[[person, 17, 1]] = cy;
//!     joints[[person, 17, 2]] = 1.0;
//! }
//!
//! let heatmaps = HeatmapGenerator::fixed_sigma(64, 18)?;
//! let targets = heatmaps.generate(joints.view(), 2.0, 4.0, 0.1)?;
//! assert_eq!(targets.heatmaps.dim(), (18, 64, 64));
//!
//! let offsets = OffsetGenerator::with_size(64, 64, 18, 4)?;
//! let targets = offsets.generate(joints.view(), &[900.0, 400.0])?;
//! assert_eq!(targets.offset.dim(), (34, 64, 64));
//! # Ok(())
//! # }
//! ```
//!
//! ## Heatmap Variants
//!
//! | Variant | Body joint sigma | Default window |
//! |---------|------------------|----------------|
//! | [`HeatmapVariant::FixedSigma`] | `joint_sigma` argument | `3σ` |
//! | [`HeatmapVariant::ScaleAware`] | 4th field of each joint record | Gaussian falls to `0.01` |
//!
//! Center joints (index >= 17 by default) always use the `center_sigma`
//! argument. Window policies can be mixed freely with either variant:
//!
//! ```rust
//! use keypoint_targets::{HeatmapConfig, HeatmapGenerator, WindowPolicy};
//!
//! let config = HeatmapConfig::scale_aware(128, 18).with_window(WindowPolicy::ThreeSigma);
//! let generator = HeatmapGenerator::new(config).unwrap();
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`heatmap`] | [`HeatmapGenerator`] and [`HeatmapTargets`] |
//! | [`offset`] | [`OffsetGenerator`] and [`OffsetTargets`] |
//! | [`config`] | [`HeatmapConfig`], [`OffsetConfig`], [`ClaimTracking`] |
//! | [`variant`] | [`HeatmapVariant`] and [`WindowPolicy`] |
//! | [`keypoints`] | Shape-checked keypoint view ([`KeypointSet`], [`Joint`]) |
//! | [`window`] | Clipped rasterization windows and the Gaussian kernel |
//! | [`error`] | Error types ([`TargetError`], [`Result`]) |
//! | [`logging`] | Verbosity flag and the `warn!` / `verbose!` macros |
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `parallel` | Rasterize heatmap channels with rayon (default) |
//! | `serde` | `Serialize` / `Deserialize` for configuration types |

// Modules
pub mod config;
pub mod error;
pub mod heatmap;
pub mod keypoints;
pub mod logging;
pub mod offset;
pub mod variant;
pub mod window;

// Re-export main types for convenience
pub use config::{ClaimTracking, HeatmapConfig, OffsetConfig};
pub use error::{Result, TargetError};
pub use heatmap::{DEFAULT_BACKGROUND_WEIGHT, HeatmapGenerator, HeatmapTargets};
pub use keypoints::{Joint, KeypointSet};
pub use offset::{OffsetGenerator, OffsetTargets};
pub use variant::{HeatmapVariant, WindowPolicy};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name.
pub const NAME: &str = env!("CARGO_PKG_NAME");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(VERSION.contains('.'));
    }

    #[test]
    fn test_name() {
        assert_eq!(NAME, "keypoint-targets");
    }

    #[test]
    fn test_generators_are_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<HeatmapGenerator>();
        assert_send_sync::<OffsetGenerator>();
    }
}
