use crate::config::{Params, Shading};
use crate::geom::{triple, Vec3, PI};
use crate::rng::{prf, root_seeds};

/// Levels left when the descent context is memorized. Queries that land inside
/// the memorized tetrahedron skip the whole upper tree.
const CACHE_LEVEL: i32 = 11;

/// One tetrahedron corner: position, altitude, corner seed.
#[derive(Clone, Copy, Debug)]
struct Corner {
    p: Vec3,
    alt: f64,
    seed: f64,
}

/// Result of one altitude query. `shade` is only meaningful when the oracle
/// was built with a shading mode.
#[derive(Clone, Copy, Debug)]
pub struct Sample {
    pub alt: f64,
    pub shade: u8,
}

/// Fractal altitude over the unit sphere: recursive midpoint subdivision of a
/// fixed tetrahedron enclosing the globe. A pure function of the query
/// direction for fixed parameters; the instance only carries the shallow-depth
/// cache, so renderers hand each worker its own oracle.
#[derive(Clone, Debug)]
pub struct Oracle {
    root: [Corner; 4],
    cache: Option<[Corner; 4]>,
    alt_weight: f64,
    dist_weight: f64,
    dist_pow: f64,
    shading: Shading,
    sin_a: f64,
    cos_a: f64,
    sun: Vec3,
}

impl Oracle {
    pub fn new(params: &Params) -> Self {
        let s = 3.0f64.sqrt();
        let seeds = root_seeds(params.seed);
        let positions = [
            Vec3::new(-s - 0.20, -s - 0.22, -s - 0.23),
            Vec3::new(-s - 0.19, s + 0.18, s + 0.17),
            Vec3::new(s + 0.21, -s - 0.24, s + 0.15),
            Vec3::new(s + 0.24, s + 0.22, -s - 0.25),
        ];
        let root = std::array::from_fn(|i| Corner {
            p: positions[i],
            alt: params.init_alt,
            seed: seeds[i],
        });
        let a = PI * params.shade_angle / 180.0;
        let a2 = PI * params.shade_angle2 / 180.0;
        Self {
            root,
            cache: None,
            alt_weight: params.alt_weight,
            dist_weight: params.dist_weight,
            dist_pow: params.dist_pow,
            shading: params.shading,
            sin_a: a.sin(),
            cos_a: a.cos(),
            sun: Vec3::new(
                (a - 0.5 * PI).cos() * a2.cos(),
                -a2.sin(),
                -(a - 0.5 * PI).sin() * a2.cos(),
            ),
        }
    }

    /// Altitude (and shade) at unit direction `p`, subdividing `depth` times.
    pub fn sample(&mut self, p: Vec3, depth: i32) -> Sample {
        match self.cache {
            Some(t) if contains(&t, p) => self.descend(t, CACHE_LEVEL, p),
            _ => self.descend(self.root, depth, p),
        }
    }

    fn descend(&mut self, mut t: [Corner; 4], mut level: i32, p: Vec3) -> Sample {
        while level > 0 {
            // reorder so (t[0], t[1]) is the longest edge; restart the
            // comparison chain after every swap so ties resolve identically
            loop {
                let lab = t[0].p.dist2(t[1].p);
                if lab < t[0].p.dist2(t[2].p) {
                    t = [t[0], t[2], t[1], t[3]];
                } else if lab < t[0].p.dist2(t[3].p) {
                    t = [t[0], t[3], t[1], t[2]];
                } else if lab < t[1].p.dist2(t[2].p) {
                    t = [t[1], t[2], t[0], t[3]];
                } else if lab < t[1].p.dist2(t[3].p) {
                    t = [t[1], t[3], t[0], t[2]];
                } else if lab < t[2].p.dist2(t[3].p) {
                    t = [t[2], t[3], t[0], t[1]];
                } else {
                    break;
                }
            }
            if level == CACHE_LEVEL {
                self.cache = Some(t);
            }

            let [a, b, c, d] = t;
            let es = prf(a.seed, b.seed);
            let es1 = prf(es, es);
            let es2 = 0.5 + 0.1 * prf(es1, es1);
            let es3 = 1.0 - es2;

            // weight the cut towards whichever endpoint sorts first on x, so
            // the midpoint depends only on the unordered endpoint pair
            let e_p = if a.p.x < b.p.x {
                Vec3::new(
                    es2 * a.p.x + es3 * b.p.x,
                    es2 * a.p.y + es3 * b.p.y,
                    es2 * a.p.z + es3 * b.p.z,
                )
            } else if a.p.x > b.p.x {
                Vec3::new(
                    es3 * a.p.x + es2 * b.p.x,
                    es3 * a.p.y + es2 * b.p.y,
                    es3 * a.p.z + es2 * b.p.z,
                )
            } else {
                Vec3::new(
                    0.5 * a.p.x + 0.5 * b.p.x,
                    0.5 * a.p.y + 0.5 * b.p.y,
                    0.5 * a.p.z + 0.5 * b.p.z,
                )
            };

            let mut lab = a.p.dist2(b.p);
            if lab > 1.0 {
                // tame the distance term on the huge top-level edges
                lab = lab.powf(0.5);
            }
            let e_alt = 0.5 * (a.alt + b.alt)
                + es * self.alt_weight * (a.alt - b.alt).abs()
                + es1 * self.dist_weight * lab.powf(self.dist_pow);
            let e = Corner {
                p: e_p,
                alt: e_alt,
                seed: es,
            };

            let ea = a.p - e_p;
            let ep = p - e_p;
            let ec = c.p - e_p;
            let ed = d.p - e_p;
            t = if triple(ea, ec, ed) * triple(ep, ec, ed) > 0.0 {
                [c, d, a, e]
            } else {
                [c, d, b, e]
            };
            level -= 1;
        }
        self.leaf(&t, p)
    }

    fn leaf(&self, t: &[Corner; 4], p: Vec3) -> Sample {
        let [a, b, c, d] = *t;
        let alt = (a.alt + b.alt + c.alt + d.alt) / 4.0;
        let shade = match self.shading {
            Shading::None => 0,
            Shading::BumpAll | Shading::BumpLand => {
                let g = gradient(t);
                let mut l1 = g.length();
                if l1 == 0.0 {
                    l1 = 1.0;
                }
                let mut tmp = (1.0 - p.y * p.y).sqrt();
                if tmp < 0.0001 {
                    tmp = 0.0001;
                }
                let gy = -p.x * p.y / tmp * g.x + tmp * g.y - p.z * p.y / tmp * g.z;
                let gz = -p.z / tmp * g.x + p.x / tmp * g.z;
                let mut shade = ((-self.sin_a * gy - self.cos_a * gz) / l1 * 48.0 + 128.0) as i32;
                shade = shade.clamp(10, 255);
                if self.shading == Shading::BumpLand && a.alt + b.alt + c.alt + d.alt < 0.0 {
                    shade = 150;
                }
                shade as u8
            }
            Shading::Daylight => {
                let p1 = if a.alt + b.alt + c.alt + d.alt < 0.0 {
                    p
                } else {
                    // push land points along the gradient before lighting them
                    let edges = a.p.dist2(b.p)
                        + a.p.dist2(c.p)
                        + a.p.dist2(d.p)
                        + b.p.dist2(c.p)
                        + b.p.dist2(d.p)
                        + c.p.dist2(d.p);
                    let l1 = 50.0 / edges.sqrt();
                    let g = gradient(t);
                    Vec3::new(l1 * g.x + p.x, l1 * g.y + p.y, l1 * g.z + p.z)
                };
                let mut l1 = p1.length();
                if l1 == 0.0 {
                    l1 = 1.0;
                }
                let shade = (p1.dot(self.sun) / l1 * 170.0 + 10.0) as i32;
                shade.clamp(10, 255) as u8
            }
        };
        Sample { alt, shade }
    }
}

/// Coarse gradient proxy at a leaf: altitude-weighted offsets from the
/// centroid.
fn gradient(t: &[Corner; 4]) -> Vec3 {
    let [a, b, c, d] = *t;
    let cx = 0.25 * (a.p.x + b.p.x + c.p.x + d.p.x);
    let cy = 0.25 * (a.p.y + b.p.y + c.p.y + d.p.y);
    let cz = 0.25 * (a.p.z + b.p.z + c.p.z + d.p.z);
    Vec3::new(
        a.alt * (cx - a.p.x) + b.alt * (cx - b.p.x) + c.alt * (cx - c.p.x) + d.alt * (cx - d.p.x),
        a.alt * (cy - a.p.y) + b.alt * (cy - b.p.y) + c.alt * (cy - c.p.y) + d.alt * (cy - d.p.y),
        a.alt * (cz - a.p.z) + b.alt * (cz - b.p.z) + c.alt * (cz - c.p.z) + d.alt * (cz - d.p.z),
    )
}

/// Four same-side tests: is `p` inside the tetrahedron?
fn contains(t: &[Corner; 4], p: Vec3) -> bool {
    let [a, b, c, d] = *t;
    let ab = b.p - a.p;
    let ac = c.p - a.p;
    let ad = d.p - a.p;
    let ap = p - a.p;
    if triple(ad, ab, ac) * triple(ap, ab, ac) > 0.0
        && triple(ac, ab, ad) * triple(ap, ab, ad) > 0.0
        && triple(ab, ad, ac) * triple(ap, ad, ac) > 0.0
    {
        let ba = Vec3::new(-ab.x, -ab.y, -ab.z);
        let bc = c.p - b.p;
        let bd = d.p - b.p;
        let bp = p - b.p;
        triple(ba, bc, bd) * triple(bp, bc, bd) > 0.0
    } else {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Params;

    fn unit(x: f64, y: f64, z: f64) -> Vec3 {
        let v = Vec3::new(x, y, z);
        v * (1.0 / v.length())
    }

    #[test]
    fn altitude_is_bit_stable() {
        let params = Params::default();
        let mut oracle = Oracle::new(&params);
        let p = unit(0.3, -0.5, 0.81);
        let first = oracle.sample(p, 30).alt;
        let second = oracle.sample(p, 30).alt;
        assert_eq!(first.to_bits(), second.to_bits());
    }

    #[test]
    fn warm_cache_agrees_with_cold_descent() {
        let params = Params::default();
        let p1 = unit(0.11, 0.22, 0.97);
        let p2 = unit(0.11001, 0.22, 0.97); // close enough to share the cache

        let mut warmed = Oracle::new(&params);
        warmed.sample(p1, 30);
        let via_cache = warmed.sample(p2, 30).alt;

        let mut cold = Oracle::new(&params);
        let direct = cold.sample(p2, 30).alt;
        assert_eq!(via_cache.to_bits(), direct.to_bits());
    }

    #[test]
    fn cache_needs_depth_to_reach_store_level() {
        let params = Params::default();
        let mut oracle = Oracle::new(&params);
        oracle.sample(unit(0.5, 0.5, 0.7), CACHE_LEVEL - 3);
        assert!(oracle.cache.is_none());
        oracle.sample(unit(0.5, 0.5, 0.7), CACHE_LEVEL + 5);
        assert!(oracle.cache.is_some());
    }

    #[test]
    fn altitudes_stay_moderate() {
        let params = Params::default();
        let mut oracle = Oracle::new(&params);
        for i in 0..50 {
            for j in 0..25 {
                let th = i as f64 * 0.12566;
                let ph = (j as f64 - 12.0) * 0.12;
                let p = Vec3::new(th.cos() * ph.cos(), ph.sin(), th.sin() * ph.cos());
                let alt = oracle.sample(p, 24).alt;
                assert!(alt.abs() < 1.0, "altitude {alt} out of range at {p:?}");
            }
        }
    }

    #[test]
    fn sphere_points_sit_inside_root_tetrahedron() {
        let params = Params::default();
        let oracle = Oracle::new(&params);
        for i in 0..60 {
            let th = i as f64 * 0.10472;
            let p = Vec3::new(th.cos() * 0.8, (th * 3.0).sin() * 0.6, th.sin() * 0.8);
            assert!(contains(&oracle.root, unit(p.x, p.y, p.z)));
        }
    }

    #[test]
    fn different_seeds_give_different_planets() {
        let a = Oracle::new(&Params::default()).sample(unit(0.2, 0.3, 0.93), 26).alt;
        let mut params = Params::default();
        params.seed = 0.777;
        let b = Oracle::new(&params).sample(unit(0.2, 0.3, 0.93), 26).alt;
        assert_ne!(a.to_bits(), b.to_bits());
    }

    #[test]
    fn bump_shading_yields_shade_bytes_in_contract_range() {
        let mut params = Params::default();
        params.shading = Shading::BumpAll;
        let mut oracle = Oracle::new(&params);
        for i in 0..40 {
            let th = i as f64 * 0.157;
            let s = oracle.sample(unit(th.cos(), 0.3, th.sin()), 24);
            assert!((10..=255).contains(&(s.shade as i32)));
        }
    }
}
