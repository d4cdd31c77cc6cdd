//! Geometry reducer: eye landmarks → one openness ratio per eye → raw metric
//!
//! Two estimators per eye, the smaller one wins:
//! - aspect ratio: (d(1,5) + d(2,4)) / (2 · d(0,3)) over the 6-point contour
//! - vertical ratio: mean of the two shortest lid pairs / corner distance
//!
//! Either estimator collapsing is enough to pull the eye toward "closed".
//! The frame's raw metric is the mean of both eyes.

use serde::{Deserialize, Serialize};
use crate::GEOMETRY_EPSILON;
use crate::types::{EyePair, EyeSample, FrameDims, LandmarkPair, LandmarkPoint};

/// Per-frame openness reading
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OpennessReading {
    /// Left eye openness
    pub left: f64,
    /// Right eye openness
    pub right: f64,
    /// Combined raw metric (mean of both eyes)
    pub raw: f64,
}

/// Reduces eye landmarks to openness ratios
#[derive(Debug, Clone, Copy)]
pub struct OpennessReducer {
    epsilon: f64,
}

impl Default for OpennessReducer {
    fn default() -> Self {
        Self::new(GEOMETRY_EPSILON)
    }
}

impl OpennessReducer {
    /// Create reducer with the given degenerate-distance guard
    pub fn new(epsilon: f64) -> Self {
        Self { epsilon }
    }

    /// Measure both eyes and combine them into the raw metric
    pub fn measure(&self, eyes: &EyePair, dims: FrameDims) -> OpennessReading {
        let left = self.eye_openness(&eyes.left, dims);
        let right = self.eye_openness(&eyes.right, dims);
        OpennessReading {
            left,
            right,
            raw: combine(left, right),
        }
    }

    /// Openness of one eye: min(aspect ratio, vertical ratio)
    pub fn eye_openness(&self, eye: &EyeSample, dims: FrameDims) -> f64 {
        let (w, h) = (f64::from(dims.width), f64::from(dims.height));
        let contour = eye.contour.map(|p| p.scaled(w, h));
        let vertical = eye.vertical_pairs.map(|pair| scale_pair(&pair, w, h));
        let horizontal = scale_pair(&eye.horizontal, w, h);

        self.aspect_ratio(&contour).min(self.vertical_ratio(&vertical, &horizontal))
    }

    /// Eye aspect ratio over an already scaled 6-point contour
    pub fn aspect_ratio(&self, contour: &[LandmarkPoint; 6]) -> f64 {
        let horizontal = contour[0].distance(&contour[3]);
        if !(horizontal >= self.epsilon) {
            return 0.0;
        }
        let vertical = contour[1].distance(&contour[5]) + contour[2].distance(&contour[4]);
        finite_non_negative(vertical / (2.0 * horizontal))
    }

    /// Mean of the two shortest lid distances over the corner distance
    pub fn vertical_ratio(&self, vertical_pairs: &[LandmarkPair], horizontal: &LandmarkPair) -> f64 {
        let horizontal = horizontal.a.distance(&horizontal.b);
        if !(horizontal >= self.epsilon) {
            return 0.0;
        }

        let mut distances: Vec<f64> = vertical_pairs.iter().map(|p| p.a.distance(&p.b)).collect();
        distances.sort_by(|a, b| a.total_cmp(b));

        let vertical = match distances.as_slice() {
            [] => 0.0,
            [only] => *only,
            [first, second, ..] => (first + second) / 2.0,
        };
        finite_non_negative(vertical / horizontal)
    }
}

/// Bi-ocular combiner: arithmetic mean of both eyes
pub fn combine(left: f64, right: f64) -> f64 {
    (left + right) / 2.0
}

fn scale_pair(pair: &LandmarkPair, w: f64, h: f64) -> LandmarkPair {
    LandmarkPair::new(pair.a.scaled(w, h), pair.b.scaled(w, h))
}

/// NaN/Inf and negatives collapse to 0
fn finite_non_negative(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

// =============================================================================
// TESTS
// =============================================================================
