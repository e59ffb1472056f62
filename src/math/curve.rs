use super::{Point2d, Vector2d};
use crate::util::Interval;
use cgmath::prelude::*;

/// A parametric curve in 2D space.
pub trait ParametricCurve2d {
    /// Samples the parametric curve.
    fn sample(&self, t: f64) -> Point2d;

    /// Returns the minimum and maximum t-values that define the bounds of the curve.
    fn bounds(&self) -> Interval<f64>;

    /// Samples the derivative of the parametric curve.
    ///
    /// The default implementation approximates the derivative by sampling
    /// two very nearby points along the curve.
    fn sample_dt(&self, t: f64) -> Vector2d {
        let delta = self.bounds().length() * 0.0001;
        let p1 = self.sample(t);
        let p2 = self.sample(t + delta);
        (p2 - p1) / delta
    }
}

impl<T: ParametricCurve2d + ?Sized> ParametricCurve2d for &T {
    fn sample(&self, t: f64) -> Point2d {
        (&**self).sample(t)
    }

    fn bounds(&self) -> Interval<f64> {
        (&**self).bounds()
    }

    fn sample_dt(&self, t: f64) -> Vector2d {
        (&**self).sample_dt(t)
    }
}

/// A full circle, traversed anticlockwise starting from the rightmost point.
#[derive(Copy, Clone, Debug)]
pub struct Circle2d {
    pub centre: Point2d,
    pub radius: f64,
}

impl Circle2d {
    pub const fn new(centre: Point2d, radius: f64) -> Self {
        Self { centre, radius }
    }
}

impl ParametricCurve2d for Circle2d {
    fn sample(&self, t: f64) -> Point2d {
        self.centre + self.radius * Vector2d::new(t.cos(), t.sin())
    }

    fn bounds(&self) -> Interval<f64> {
        Interval::new(0.0, std::f64::consts::TAU)
    }

    fn sample_dt(&self, t: f64) -> Vector2d {
        self.radius * Vector2d::new(-t.sin(), t.cos())
    }
}

/// Number of parameter subdivisions used to measure a curve's arc length.
const LENGTH_SUBDIVISIONS: usize = 4096;

/// Computes a polyline of points spaced `dist` apart along the curve,
/// together with the curve's total arc length.
///
/// The curve is first sampled densely at uniform parameter steps to build a
/// cumulative arc-length table, then resampled at equal arc spacing. The last
/// returned point is the exact end of the curve, so for a closed curve the
/// polyline ends where it began. Works even when the curve's end point
/// coincides with its start, where chord-based marching breaks down.
pub fn equidistant_points_along_curve(
    curve: &impl ParametricCurve2d,
    dist: f64,
) -> (Vec<Point2d>, f64) {
    let bounds = curve.bounds();
    let samples = (0..=LENGTH_SUBDIVISIONS)
        .map(|i| curve.sample(bounds.lerp(i as f64 / LENGTH_SUBDIVISIONS as f64)))
        .collect::<Vec<_>>();

    // Cumulative chord length at each dense sample
    let mut length = 0.0;
    let mut cum = Vec::with_capacity(samples.len());
    cum.push(0.0);
    for pair in samples.windows(2) {
        length += (pair[1] - pair[0]).magnitude();
        cum.push(length);
    }

    if !(length.is_finite() && length > 0.0) {
        return (vec![samples[0]], 0.0);
    }

    // Walk the table, emitting a point every `dist` metres
    let mut points = vec![samples[0]];
    let mut target = dist;
    let mut idx = 0;
    while target < length {
        while idx + 2 < cum.len() && cum[idx + 1] < target {
            idx += 1;
        }
        let span = cum[idx + 1] - cum[idx];
        let f = if span > 0.0 {
            (target - cum[idx]) / span
        } else {
            0.0
        };
        let p = Vector2d::lerp(samples[idx].to_vec(), samples[idx + 1].to_vec(), f);
        points.push(Point2d::from_vec(p));
        target += dist;
    }
    points.push(samples[samples.len() - 1]);

    (points, length)
}

#[cfg(test)]
mod test {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn circle_arc_length() {
        let circle = Circle2d::new(Point2d::new(2.0, -1.0), 50.0);
        let (points, length) = equidistant_points_along_curve(&circle, 0.5);
        assert_approx_eq!(length, std::f64::consts::TAU * 50.0, 0.01);
        assert!(points.len() > 100);
        // Closed curve: polyline ends where it began
        assert_approx_eq!((points[0] - points[points.len() - 1]).magnitude(), 0.0, 1e-9);
    }

    #[test]
    fn points_are_evenly_spaced() {
        let circle = Circle2d::new(Point2d::new(0.0, 0.0), 30.0);
        let (points, _) = equidistant_points_along_curve(&circle, 1.0);
        for pair in points.windows(2).take(points.len() - 2) {
            assert_approx_eq!((pair[1] - pair[0]).magnitude(), 1.0, 0.01);
        }
    }
}
