//! Heuristic eye-contact score from two eye landmarks.
//!
//! The score compares the pixel distance between the eye centers against an
//! "ideal" horizontal and vertical spacing. It is a rough proxy for a face
//! looking at the camera, not a gaze model: the ideal spacing depends on the
//! camera, its resolution and the user's distance from it.

use thiserror::Error;

use crate::detection::domain::face_landmarks::LandmarkSet;
use crate::shared::constants::{
    DEFAULT_IDEAL_DX, DEFAULT_IDEAL_DY, LEFT_EYE_LANDMARK, RIGHT_EYE_LANDMARK,
};

#[derive(Error, Debug, PartialEq)]
pub enum ScorerConfigError {
    #[error("ideal {axis} spacing must be a positive number of pixels, got {value}")]
    NonPositiveIdeal { axis: &'static str, value: f64 },
}

/// Calibration for [`EyeContactScorer`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EyeContactParams {
    pub ideal_dx: f64,
    pub ideal_dy: f64,
    pub left_eye: usize,
    pub right_eye: usize,
}

impl Default for EyeContactParams {
    fn default() -> Self {
        Self {
            ideal_dx: DEFAULT_IDEAL_DX,
            ideal_dy: DEFAULT_IDEAL_DY,
            left_eye: LEFT_EYE_LANDMARK,
            right_eye: RIGHT_EYE_LANDMARK,
        }
    }
}

#[derive(Clone, Debug)]
pub struct EyeContactScorer {
    params: EyeContactParams,
}

impl EyeContactScorer {
    pub fn new(params: EyeContactParams) -> Result<Self, ScorerConfigError> {
        for (axis, value) in [("dx", params.ideal_dx), ("dy", params.ideal_dy)] {
            // Also rejects NaN.
            if !(value > 0.0 && value.is_finite()) {
                return Err(ScorerConfigError::NonPositiveIdeal { axis, value });
            }
        }
        Ok(Self { params })
    }

    /// Score in `[0, 100]` rounded to two decimals, or `None` when either
    /// eye landmark is missing.
    pub fn try_score(
        &self,
        landmarks: &LandmarkSet,
        image_width: u32,
        image_height: u32,
    ) -> Option<f64> {
        let left = landmarks.point(self.params.left_eye)?;
        let right = landmarks.point(self.params.right_eye)?;
        Some(self.score_points(left, right, image_width, image_height))
    }

    /// Like [`try_score`](Self::try_score), defaulting to 0.0 when the
    /// landmarks are absent or incomplete.
    pub fn score(
        &self,
        landmarks: Option<&LandmarkSet>,
        image_width: u32,
        image_height: u32,
    ) -> f64 {
        landmarks
            .and_then(|lm| self.try_score(lm, image_width, image_height))
            .unwrap_or(0.0)
    }

    /// Scores two normalized points directly.
    pub fn score_points(
        &self,
        left: (f64, f64),
        right: (f64, f64),
        image_width: u32,
        image_height: u32,
    ) -> f64 {
        let dx = (left.0 - right.0).abs() * image_width as f64;
        let dy = (left.1 - right.1).abs() * image_height as f64;

        let dx_score = deviation_score(dx, self.params.ideal_dx);
        let dy_score = deviation_score(dy, self.params.ideal_dy);

        round2((dx_score + dy_score) / 2.0 * 100.0)
    }
}

/// 1.0 at the ideal, falling linearly to 0.0 at zero or twice the ideal.
fn deviation_score(actual: f64, ideal: f64) -> f64 {
    (1.0 - (actual - ideal).abs() / ideal).max(0.0)
}

/// Rounds to two decimal places, ties to even.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}
