// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Keypoint annotations as handed over by the data pipeline.
//!
//! Annotations arrive as a `(persons, joints, fields)` array in output-grid
//! coordinates. [`KeypointSet`] checks the shape once so the generators can
//! read [`Joint`] records without further validation.

use ndarray::ArrayView3;

use crate::error::{Result, TargetError};

/// Fields every joint record carries: x, y, visibility.
pub const BASE_FIELDS: usize = 3;

/// Fields of a joint record carrying a per-instance sigma.
pub const SIGMA_FIELDS: usize = 4;

/// A single annotated joint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Joint {
    /// Grid column.
    pub x: f32,
    /// Grid row.
    pub y: f32,
    /// Annotation flag; positive means labelled.
    pub visibility: f32,
}

impl Joint {
    /// Returns whether the joint is annotated.
    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.visibility > 0.0
    }

    /// Returns whether the joint lies inside a `width x height` grid.
    ///
    /// The upper bounds are exclusive, so `x == width` is outside.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn in_grid(&self, width: usize, height: usize) -> bool {
        self.x >= 0.0 && self.y >= 0.0 && self.x < width as f32 && self.y < height as f32
    }
}

/// Shape-checked view over a keypoint array.
#[derive(Debug, Clone, Copy)]
pub struct KeypointSet<'a> {
    data: ArrayView3<'a, f32>,
}

impl<'a> KeypointSet<'a> {
    /// Wrap a keypoint array after checking its shape.
    ///
    /// # Arguments
    ///
    /// * `data` - Keypoints with shape `(persons, joints, fields)`.
    /// * `num_joints` - Required joint count per person.
    /// * `required_fields` - Minimum fields per joint record.
    ///
    /// # Errors
    ///
    /// Returns [`TargetError::JointCountMismatch`] if the joint axis is not
    /// `num_joints` long, or [`TargetError::FieldCountMismatch`] if records
    /// carry fewer than `required_fields` values.
    pub fn new(
        data: ArrayView3<'a, f32>,
        num_joints: usize,
        required_fields: usize,
    ) -> Result<Self> {
        let (_, joints, fields) = data.dim();
        if joints != num_joints {
            return Err(TargetError::JointCountMismatch {
                expected: num_joints,
                actual: joints,
            });
        }
        let required = required_fields.max(BASE_FIELDS);
        if fields < required {
            return Err(TargetError::FieldCountMismatch {
                required,
                actual: fields,
            });
        }
        Ok(Self { data })
    }

    /// Number of persons.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.dim().0
    }

    /// Returns `true` if there are no persons.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Joints per person.
    #[must_use]
    pub fn num_joints(&self) -> usize {
        self.data.dim().1
    }

    /// Read one joint record.
    ///
    /// # Panics
    ///
    /// Panics if `person` or `joint` is out of bounds.
    #[must_use]
    pub fn joint(&self, person: usize, joint: usize) -> Joint {
        let record = self.data.slice(ndarray::s![person, joint, ..]);
        Joint {
            x: record[0],
            y: record[1],
            visibility: record[2],
        }
    }

    /// Read the per-instance sigma, the 4th field of a joint record.
    ///
    /// # Panics
    ///
    /// Panics if `person` or `joint` is out of bounds, or if the set was not
    /// built with [`SIGMA_FIELDS`] required.
    #[must_use]
    pub fn instance_sigma(&self, person: usize, joint: usize) -> f32 {
        self.data[[person, joint, SIGMA_FIELDS - 1]]
    }

    /// Iterate over one person's joints in index order.
    pub fn person(&self, person: usize) -> impl Iterator<Item = (usize, Joint)> + '_ {
        (0..self.num_joints()).map(move |idx| (idx, self.joint(person, idx)))
    }
}
