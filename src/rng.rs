/// Deterministic seed arithmetic. No stateful RNG anywhere: every random
/// quantity is a pure function of the seeds that reach it.

/// Two-seed pseudo-random value in (-1, 1), symmetric in its arguments.
/// Symmetry matters: the displacement of an edge midpoint must depend only on
/// the unordered pair of endpoint seeds, whichever order recursion visits them.
#[inline]
pub fn prf(p: f64, q: f64) -> f64 {
    let r = (p + 3.14159265) * (q + 3.14159265);
    2.0 * (r - r.trunc()) - 1.0
}

/// Bootstrap the four tetrahedron corner seeds from the master seed.
pub fn root_seeds(seed: f64) -> [f64; 4] {
    let r1 = prf(seed, seed);
    let r2 = prf(r1, r1);
    let r3 = prf(r1, r2);
    let r4 = prf(r2, r3);
    [r1, r2, r3, r4]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prf_is_symmetric() {
        let samples = [
            (0.0, 0.0),
            (0.123, 0.987),
            (-0.5, 0.25),
            (0.999999, -0.999999),
            (3.7, -2.1),
        ];
        for (p, q) in samples {
            assert!((prf(p, q) - prf(q, p)).abs() < 1e-12, "prf({p},{q})");
        }
    }

    #[test]
    fn prf_stays_in_open_unit_interval() {
        let mut v = 0.123;
        for i in 0..1000 {
            let w = prf(v, 0.001 * i as f64);
            assert!((-1.0..1.0).contains(&w), "prf escaped range: {w}");
            v = w;
        }
    }

    #[test]
    fn root_seeds_are_reproducible() {
        let a = root_seeds(0.123);
        let b = root_seeds(0.123);
        assert_eq!(a, b);
        // chained, not four independent draws
        assert_eq!(a[1], prf(a[0], a[0]));
        assert_eq!(a[2], prf(a[0], a[1]));
        assert_eq!(a[3], prf(a[1], a[2]));
    }
}
