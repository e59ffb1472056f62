use crate::error::{SimResult, SimulationError};
use crate::math::{
    equidistant_points_along_curve, Circle2d, ParametricCurve2d, Point2d, QuadraticBezier2d,
    Vector2d,
};
use cgmath::prelude::*;

/// The default spacing of the fitted track segments, in m.
const TRACK_SEGMENT_LEN: f64 = 0.5; // m

/// A closed 1-D track, parameterised by a fraction in `[0, 1)`.
///
/// Immutable once constructed. The track's total length is established from
/// the supplied curve's geometry and never changes.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Track {
    scale: f64,
    length: f64,
    segments: Vec<QuadraticBezier2d>,
}

/// The result of sampling a [Track].
pub struct TrackSample {
    /// The world-space position on the track centre line.
    pub pos: Point2d,
    /// The tangent unit vector of the track, in the direction of increasing fraction.
    pub tan: Vector2d,
}

impl Track {
    /// Creates a new [Track] from the given closed parametric curve,
    /// with the default step size.
    ///
    /// The curve's end point must coincide with its start point.
    pub fn from_curve(curve: &impl ParametricCurve2d) -> SimResult<Self> {
        Self::with_step(curve, TRACK_SEGMENT_LEN)
    }

    /// Creates a circular track with the given centre and radius.
    pub fn circle(centre: Point2d, radius: f64) -> SimResult<Self> {
        if !(radius.is_finite() && radius > 0.0) {
            return Err(SimulationError::InvalidGeometry(
                "circle radius must be positive and finite",
            ));
        }
        Self::from_curve(&Circle2d::new(centre, radius))
    }

    /// Creates a new [Track] from the given closed parametric curve,
    /// with the given step size.
    pub fn with_step(curve: &impl ParametricCurve2d, step: f64) -> SimResult<Self> {
        if !(step.is_finite() && step > 0.0) {
            return Err(SimulationError::InvalidGeometry(
                "step must be positive and finite",
            ));
        }

        let (mut points, length) = equidistant_points_along_curve(curve, step);
        if !(length.is_finite() && length > 0.0) {
            return Err(SimulationError::InvalidGeometry(
                "curve has zero or undefined length",
            ));
        }
        if points.len() < 3 {
            return Err(SimulationError::InvalidGeometry(
                "curve is shorter than one step",
            ));
        }

        // The curve must close onto itself; snap the final point exactly
        let first = points[0];
        let last = points[points.len() - 1];
        if (last - first).magnitude() > step {
            return Err(SimulationError::InvalidGeometry("curve is not closed"));
        }
        let n = points.len();
        points[n - 1] = first;

        // Ensure number of points are odd so they can be evenly divided among segments
        if points.len() % 2 == 0 {
            let p1 = points[n - 2].to_vec();
            let p2 = points[n - 1].to_vec();
            points.insert(n - 1, Point2d::from_vec(Vector2d::lerp(p1, p2, 0.5)));
        }

        let segments = points
            .windows(3)
            .step_by(2)
            .map(|points| {
                let [p1, p2, p3]: [_; 3] = points.try_into().unwrap();
                let mid = Vector2d::lerp(p1.to_vec(), p3.to_vec(), 0.5);
                let control = Point2d::from_vec(Vector2d::lerp(p2.to_vec(), mid, -1.0));
                QuadraticBezier2d::new(&[p1, control, p3])
            })
            .collect::<Vec<_>>();

        Ok(Self {
            scale: 0.5 / step,
            length,
            segments,
        })
    }

    /// The total length of the track in m.
    pub fn length(&self) -> f64 {
        self.length
    }

    /// Converts a fractional arc-length difference to metres.
    ///
    /// No side effects; `fraction_delta` is expected in `[0, 1]`.
    pub fn metric_distance(&self, fraction_delta: f64) -> f64 {
        fraction_delta * self.length
    }

    /// Samples the track at the given fraction of its length,
    /// returning the world-space position and tangent unit vector.
    ///
    /// The fraction is wrapped onto `[0, 1)` first, so any finite value
    /// is a valid input.
    pub fn sample(&self, fraction: f64) -> TrackSample {
        let pos = crate::math::wrap_unit(fraction) * self.length;
        let (segment, t) = self.sample_internal(pos);
        let c = segment.sample(t);
        let tan = segment.sample_dt(t).normalize();
        TrackSample { pos: c, tan }
    }

    /// Locates the segment containing the given longitudinal position in m.
    fn sample_internal(&self, pos: f64) -> (&QuadraticBezier2d, f64) {
        let pos = pos * self.scale;
        let idx = usize::min(pos as u32 as usize, self.segments.len() - 1);
        let t = pos - (idx as f64);
        (&self.segments[idx], t)
    }
}
