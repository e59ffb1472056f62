/// Wraps a value onto the unit interval `[0, 1)`.
///
/// Defined for all finite inputs, including negatives:
/// `wrap_unit(-0.25) == 0.75`. Equivalent to `((x mod 1) + 1) mod 1`.
pub fn wrap_unit(x: f64) -> f64 {
    let w = x.rem_euclid(1.0);
    // rem_euclid can round up to exactly 1.0 for tiny negative inputs
    if w >= 1.0 {
        0.0
    } else {
        w
    }
}

/// The shortest-arc distance between two fractions on a closed unit loop.
///
/// Returns the smaller of the direct and wraparound separations, so two
/// fractions straddling the 0/1 seam measure as close, not far.
/// The result is in `[0, 0.5]`.
pub fn shortest_arc(f1: f64, f2: f64) -> f64 {
    let a = (f1 - f2).abs();
    f64::min(a, 1.0 - a)
}

#[cfg(test)]
mod test {
    use super::{shortest_arc, wrap_unit};
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn wrap_stays_in_unit_interval() {
        for x in [-3.75, -1.0, -0.25, 0.0, 0.4, 1.0, 2.5, 1e9, -1e-18] {
            let w = wrap_unit(x);
            assert!((0.0..1.0).contains(&w), "wrap_unit({}) = {}", x, w);
        }
    }

    #[test]
    fn wrap_is_idempotent() {
        for x in [-3.75, -0.25, 0.0, 0.4, 2.5] {
            assert_eq!(wrap_unit(wrap_unit(x)), wrap_unit(x));
        }
    }

    #[test]
    fn wrap_handles_negatives() {
        assert_approx_eq!(wrap_unit(-0.25), 0.75);
        assert_approx_eq!(wrap_unit(-1.5), 0.5);
    }

    #[test]
    fn shortest_arc_is_symmetric() {
        for (f1, f2) in [(0.0, 0.3), (0.1, 0.9), (0.45, 0.55), (0.02, 0.98)] {
            assert_eq!(shortest_arc(f1, f2), shortest_arc(f2, f1));
        }
    }

    #[test]
    fn shortest_arc_of_equal_fractions_is_zero() {
        for f in [0.0, 0.25, 0.999] {
            assert_eq!(shortest_arc(f, f), 0.0);
        }
    }

    #[test]
    fn shortest_arc_crosses_the_seam() {
        // 0.02 and 0.98 are close across the seam, not 0.96 apart
        assert_approx_eq!(shortest_arc(0.02, 0.98), 0.04);
        assert_approx_eq!(shortest_arc(0.9, 0.1), 0.2);
    }
}
