//! Normalized facial keypoints produced by a mesh model.

/// Ordered landmark points for one face, each `(x, y)` normalized to the
/// image dimensions.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LandmarkSet {
    points: Vec<(f64, f64)>,
}

impl LandmarkSet {
    pub fn new(points: Vec<(f64, f64)>) -> Self {
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Point at `index`, or `None` when out of range or non-finite.
    pub fn point(&self, index: usize) -> Option<(f64, f64)> {
        self.points
            .get(index)
            .copied()
            .filter(|(x, y)| x.is_finite() && y.is_finite())
    }
}
