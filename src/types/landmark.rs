//! Landmark model: tracked face-mesh points and the per-eye samples cut from them
//!
//! Points arrive normalized to [0,1]; distances are only meaningful after
//! scaling by the frame size (z uses the width, like the tracker does).

use serde::{Deserialize, Serialize};

/// One normalized landmark
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LandmarkPoint {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub z: f64,
}

impl LandmarkPoint {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Scale to absolute units: x by width, y by height, z by width
    pub fn scaled(&self, width: f64, height: f64) -> Self {
        Self {
            x: self.x * width,
            y: self.y * height,
            z: self.z * width,
        }
    }

    /// Euclidean 3D distance
    pub fn distance(&self, other: &LandmarkPoint) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }
}

/// Two landmarks measured against each other
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LandmarkPair {
    pub a: LandmarkPoint,
    pub b: LandmarkPoint,
}

impl LandmarkPair {
    pub fn new(a: LandmarkPoint, b: LandmarkPoint) -> Self {
        Self { a, b }
    }
}

/// Everything needed to measure one eye
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EyeSample {
    /// Eyelid contour: corner, upper, upper, corner, lower, lower
    pub contour: [LandmarkPoint; 6],
    /// Top/bottom lid pairs at three positions along the eye
    pub vertical_pairs: [LandmarkPair; 3],
    /// Outer/inner corner
    pub horizontal: LandmarkPair,
}

impl EyeSample {
    /// Cut one eye out of a full mesh; None if any index is missing
    pub fn from_mesh(mesh: &[LandmarkPoint], indices: &EyeIndices) -> Option<Self> {
        let point = |i: usize| mesh.get(i).copied();
        let pair = |(a, b): (usize, usize)| Some(LandmarkPair::new(point(a)?, point(b)?));

        let mut contour = [LandmarkPoint::default(); 6];
        for (slot, &i) in contour.iter_mut().zip(indices.contour.iter()) {
            *slot = point(i)?;
        }

        let mut vertical_pairs = [LandmarkPair::default(); 3];
        for (slot, &p) in vertical_pairs.iter_mut().zip(indices.vertical_pairs.iter()) {
            *slot = pair(p)?;
        }

        Some(Self {
            contour,
            vertical_pairs,
            horizontal: pair(indices.horizontal)?,
        })
    }
}

/// Both eyes of one frame; a frame yields one of these or nothing
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EyePair {
    pub left: EyeSample,
    pub right: EyeSample,
}

/// Mesh indices describing one eye
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EyeIndices {
    pub contour: [usize; 6],
    pub vertical_pairs: [(usize, usize); 3],
    pub horizontal: (usize, usize),
}

/// Which mesh points make up each eye
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EyeIndexScheme {
    pub left: EyeIndices,
    pub right: EyeIndices,
}

impl EyeIndexScheme {
    /// 468/478-point face mesh layout
    pub const FACE_MESH: EyeIndexScheme = EyeIndexScheme {
        left: EyeIndices {
            contour: [33, 160, 158, 133, 153, 144],
            vertical_pairs: [(159, 145), (158, 144), (160, 153)],
            horizontal: (33, 133),
        },
        right: EyeIndices {
            contour: [362, 385, 387, 263, 373, 380],
            vertical_pairs: [(386, 374), (385, 380), (387, 381)],
            horizontal: (362, 263),
        },
    };

    /// Extract both eyes, or nothing if either is incomplete
    pub fn eye_pair(&self, mesh: &[LandmarkPoint]) -> Option<EyePair> {
        Some(EyePair {
            left: EyeSample::from_mesh(mesh, &self.left)?,
            right: EyeSample::from_mesh(mesh, &self.right)?,
        })
    }
}

impl Default for EyeIndexScheme {
    fn default() -> Self {
        Self::FACE_MESH
    }
}

/// One tracked frame as produced by the landmark tracker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LandmarkFrame {
    /// Frame width in pixels
    pub width: u32,
    /// Frame height in pixels
    pub height: u32,
    /// Face-mesh points, absent when no face was found
    #[serde(default)]
    pub landmarks: Option<Vec<LandmarkPoint>>,
}

impl LandmarkFrame {
    /// Frame with a face
    pub fn with_face(width: u32, height: u32, landmarks: Vec<LandmarkPoint>) -> Self {
        Self { width, height, landmarks: Some(landmarks) }
    }

    /// Frame without a face
    pub fn empty(width: u32, height: u32) -> Self {
        Self { width, height, landmarks: None }
    }

    /// Pixel dimensions
    pub fn dims(&self) -> FrameDims {
        FrameDims::new(self.width, self.height)
    }

    /// Zero or one eye pair, using the given index scheme
    pub fn eye_pair(&self, scheme: &EyeIndexScheme) -> Option<EyePair> {
        self.landmarks.as_deref().and_then(|mesh| scheme.eye_pair(mesh))
    }
}

/// Pixel size of a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameDims {
    pub width: u32,
    pub height: u32,
}

impl FrameDims {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

// =============================================================================
// TESTS
// =============================================================================
