use kurbo::PathEl;

use crate::foundation::core::{BezPath, GridPoint, Point};
use crate::model::stroke::MIN_STROKE_POINTS;

/// Path and clicks of one finished free-hand gesture.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CapturedPath {
    pub path: Vec<GridPoint>,
    pub clicks: Vec<GridPoint>,
}

/// Accumulates pointer input for the gesture in progress.
///
/// Surface positions are `(x, y)`; everything downstream works in `(row, col)`.
#[derive(Clone, Debug, Default)]
pub struct PathCapture {
    path: Vec<GridPoint>,
    clicks: Vec<GridPoint>,
}

impl PathCapture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_point(&mut self, pos: Point) {
        self.path.push(GridPoint::from_xy(pos.x, pos.y));
    }

    pub fn push_click(&mut self, pos: Point) {
        self.clicks.push(GridPoint::from_xy(pos.x, pos.y));
    }

    pub fn len(&self) -> usize {
        self.path.len()
    }

    pub fn is_empty(&self) -> bool {
        self.path.is_empty()
    }

    /// End the gesture. Yields nothing for captures too short to be a stroke.
    ///
    /// The capture is reset either way, so clicks never leak into the next gesture.
    pub fn finish(&mut self) -> Option<CapturedPath> {
        let path = std::mem::take(&mut self.path);
        let mut clicks = std::mem::take(&mut self.clicks);
        if path.len() < MIN_STROKE_POINTS {
            return None;
        }
        if clicks.is_empty() {
            clicks.push(path[0]);
        }
        Some(CapturedPath { path, clicks })
    }

    /// Collect the on-curve points of a vector path drawn by the surface.
    ///
    /// Move/line targets and the end point of every curve segment are kept; control points are
    /// dropped.
    pub fn from_bez_path(bez: &BezPath) -> Self {
        let path = bez
            .elements()
            .iter()
            .filter_map(|el| match *el {
                PathEl::MoveTo(p) | PathEl::LineTo(p) => Some(p),
                PathEl::QuadTo(_, p) | PathEl::CurveTo(_, _, p) => Some(p),
                PathEl::ClosePath => None,
            })
            .map(|p| GridPoint::from_xy(p.x, p.y))
            .collect();
        Self {
            path,
            clicks: Vec::new(),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/capture/path.rs"]
mod tests;
