use crate::config::Params;
use crate::geom::{Rotation, Vec3, DEG2RAD, PI};

/// Map projection selection, one letter each on the command line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Projection {
    Mercator,
    Peters,
    Square,
    Mollweide,
    Sinusoidal,
    Stereographic,
    Orthographic,
    Gnomonic,
    Icosahedral,
    Azimuthal,
    Conical,
    Heightfield,
    FindMatch,
}

impl Projection {
    pub fn from_letter(c: char) -> Option<Self> {
        Some(match c {
            'm' => Self::Mercator,
            'p' => Self::Peters,
            'q' => Self::Square,
            'M' => Self::Mollweide,
            'S' => Self::Sinusoidal,
            's' => Self::Stereographic,
            'o' => Self::Orthographic,
            'g' => Self::Gnomonic,
            'i' => Self::Icosahedral,
            'a' => Self::Azimuthal,
            'c' => Self::Conical,
            'h' => Self::Heightfield,
            'f' => Self::FindMatch,
            _ => return None,
        })
    }

    pub fn letter(self) -> char {
        match self {
            Self::Mercator => 'm',
            Self::Peters => 'p',
            Self::Square => 'q',
            Self::Mollweide => 'M',
            Self::Sinusoidal => 'S',
            Self::Stereographic => 's',
            Self::Orthographic => 'o',
            Self::Gnomonic => 'g',
            Self::Icosahedral => 'i',
            Self::Azimuthal => 'a',
            Self::Conical => 'c',
            Self::Heightfield => 'h',
            Self::FindMatch => 'f',
        }
    }
}

/// What one raster row looks like.
#[derive(Clone, Copy, Debug)]
pub enum RowShape {
    /// Whole row is background.
    Outside,
    /// Row is left untouched (degenerate band).
    Blank,
    /// Cylindrical band row: constant latitude, row-specific depth.
    Band { y: f64, cos2: f64, depth: i32 },
    /// Per-pixel projection at the base depth.
    Flat { depth: i32 },
}

#[derive(Clone, Copy, Debug)]
struct Cone {
    k1: f64,
    c: f64,
    y2: f64,
    north: bool,
}

/// A projection with everything derivable from the parameters precomputed:
/// centre rotation, row offset, cone constants, base subdivision depth.
#[derive(Clone, Debug)]
pub struct View {
    pub projection: Projection,
    pub width: usize,
    pub height: usize,
    pub scale: f64,
    pub longi: f64,
    pub lat: f64,
    pub base_depth: i32,
    rot: Rotation,
    k: i32,
    cone: Option<Cone>,
}

/// Base-2 logarithm by the quotient the reference uses; the truncated result
/// feeds the subdivision depth.
pub(crate) fn log_2(x: f64) -> f64 {
    x.ln() / 2.0f64.ln()
}

impl View {
    pub fn new(params: &Params) -> Self {
        let (width, height, scale) = (params.width, params.height, params.scale);
        let (longi, lat) = (params.longi, params.lat);

        let mut projection = params.projection;
        if projection == Projection::Conical {
            // the cone constant diverges at the equator and the stereographic
            // limit takes over at the poles
            if lat == 0.0 {
                projection = Projection::Mercator;
            } else if lat.abs() >= PI - 0.000001 {
                projection = Projection::Stereographic;
            }
        }

        let k = match projection {
            Projection::Mercator => {
                let y = lat.sin();
                let y = 0.5 * ((1.0 + y) / (1.0 - y)).ln();
                (0.5 * y * width as f64 * scale / PI) as i32
            }
            Projection::Peters => {
                let y = 2.0 * lat.sin();
                (0.5 * y * width as f64 * scale / PI) as i32
            }
            Projection::Square => (0.5 * lat * width as f64 * scale / PI) as i32,
            Projection::Sinusoidal => (lat * width as f64 * scale / PI) as i32,
            _ => 0,
        };

        let cone = (projection == Projection::Conical).then(|| {
            let k1 = 1.0 / lat.sin();
            let c = k1 * k1;
            let y2 = (c * (1.0 - (lat / k1).sin()) / (1.0 + (lat / k1).sin())).sqrt();
            Cone {
                k1,
                c,
                y2,
                north: lat > 0.0,
            }
        });

        Self {
            projection,
            width,
            height,
            scale,
            longi,
            lat,
            base_depth: 3 * (log_2(scale * height as f64) as i32) + 6,
            rot: Rotation::new(longi, lat),
            k,
            cone,
        }
    }

    fn band_depth(&self, cos2: f64) -> i32 {
        let scale1 = self.scale * self.width as f64 / self.height as f64 / cos2 / PI;
        3 * (log_2(scale1 * self.height as f64) as i32) + 3
    }

    /// Classify raster row `j`.
    pub fn row(&self, j: usize) -> RowShape {
        let (w, h, scale) = (self.width as f64, self.height as f64, self.scale);
        let jk = (j as i32 - self.k) as f64;
        match self.projection {
            Projection::Mercator => {
                let y = PI * (2.0 * jk - h) / w / scale;
                let y = (2.0 * y).exp();
                let y = (y - 1.0) / (y + 1.0);
                let cos2 = (1.0 - y * y).sqrt();
                RowShape::Band {
                    y,
                    cos2,
                    depth: self.band_depth(cos2),
                }
            }
            Projection::Peters => {
                let y = 0.5 * PI * (2.0 * jk - h) / w / scale;
                if y.abs() > 1.0 {
                    return RowShape::Outside;
                }
                let cos2 = (1.0 - y * y).sqrt();
                if cos2 > 0.0 {
                    RowShape::Band {
                        y,
                        cos2,
                        depth: self.band_depth(cos2),
                    }
                } else {
                    RowShape::Blank
                }
            }
            Projection::Square | Projection::Sinusoidal => {
                let t = (2.0 * jk - h) / w / scale * PI;
                if t.abs() >= 0.5 * PI {
                    return RowShape::Outside;
                }
                let cos2 = t.cos();
                if cos2 > 0.0 {
                    RowShape::Band {
                        y: t.sin(),
                        cos2,
                        depth: self.band_depth(cos2),
                    }
                } else {
                    RowShape::Blank
                }
            }
            Projection::Mollweide => {
                let y1 = 2.0 * (2.0 * j as f64 - h) / w / scale;
                if y1.abs() >= 1.0 {
                    return RowShape::Outside;
                }
                let zz = (1.0 - y1 * y1).sqrt();
                let y = 2.0 / PI * (y1 * zz + y1.asin());
                let cos2 = (1.0 - y * y).sqrt();
                if cos2 > 0.0 {
                    RowShape::Band {
                        y,
                        cos2,
                        depth: self.band_depth(cos2),
                    }
                } else {
                    RowShape::Blank
                }
            }
            _ => RowShape::Flat {
                depth: self.base_depth,
            },
        }
    }

    /// Direction on the unit sphere for pixel `(i, j)`, or `None` when the
    /// pixel falls off the map.
    pub fn dir(&self, shape: &RowShape, i: usize, j: usize) -> Option<Vec3> {
        let (w, h, scale) = (self.width as f64, self.height as f64, self.scale);
        match self.projection {
            Projection::Mercator | Projection::Peters | Projection::Square => {
                let RowShape::Band { y, cos2, .. } = *shape else {
                    return None;
                };
                let theta1 = self.longi - 0.5 * PI + PI * (2.0 * i as f64 - w) / w / scale;
                Some(Vec3::new(theta1.cos() * cos2, y, -theta1.sin() * cos2))
            }
            Projection::Sinusoidal => {
                let RowShape::Band { y, cos2, .. } = *shape else {
                    return None;
                };
                // twelve longitudinal gores
                let l = i * 12 / self.width;
                let l1 = l as f64 * w / 12.0;
                let i1 = i as f64 - l1;
                let theta2 = self.longi - 0.5 * PI + PI * (2.0 * l1 - w) / w / scale;
                let theta1 = (PI * (2.0 * i1 - (self.width / 12) as f64) / w / scale) / cos2;
                if theta1.abs() > PI / 12.0 {
                    return None;
                }
                let th = theta1 + theta2;
                Some(Vec3::new(th.cos() * cos2, y, -th.sin() * cos2))
            }
            Projection::Mollweide => {
                let RowShape::Band { y, cos2, .. } = *shape else {
                    return None;
                };
                let y1 = 2.0 * (2.0 * j as f64 - h) / w / scale;
                let zz = (1.0 - y1 * y1).sqrt();
                let mut theta1 = PI / zz * (2.0 * i as f64 - w) / w / scale;
                if theta1.abs() > PI {
                    return None;
                }
                theta1 += -0.5 * PI;
                let v = Vec3::new(theta1.cos() * cos2, y, -theta1.sin() * cos2);
                Some(self.rot.apply(v))
            }
            Projection::Stereographic => {
                let x = (2.0 * i as f64 - w) / h / scale;
                let y = (2.0 * j as f64 - h) / h / scale;
                let z = x * x + y * y;
                let zz = 0.25 * (4.0 + z);
                let v = Vec3::new(x / zz, y / zz, (1.0 - 0.25 * z) / zz);
                Some(self.rot.apply(v))
            }
            Projection::Orthographic | Projection::Heightfield => {
                let x = (2.0 * i as f64 - w) / h / scale;
                let y = (2.0 * j as f64 - h) / h / scale;
                if x * x + y * y > 1.0 {
                    return None;
                }
                let z = (1.0 - x * x - y * y).sqrt();
                Some(self.rot.apply(Vec3::new(x, y, z)))
            }
            Projection::Gnomonic => {
                let x = (2.0 * i as f64 - w) / h / scale;
                let y = (2.0 * j as f64 - h) / h / scale;
                let zz = (1.0 / (1.0 + x * x + y * y)).sqrt();
                let x = x * zz;
                let y = y * zz;
                let z = (1.0 - x * x - y * y).sqrt();
                Some(self.rot.apply(Vec3::new(x, y, z)))
            }
            Projection::Azimuthal => {
                let x = (2.0 * i as f64 - w) / h / scale;
                let y = (2.0 * j as f64 - h) / h / scale;
                let zz = x * x + y * y;
                let z = 1.0 - 0.5 * zz;
                if z < -1.0 {
                    return None;
                }
                let r = (1.0 - 0.25 * zz).sqrt();
                Some(self.rot.apply(Vec3::new(x * r, y * r, z)))
            }
            Projection::Conical => self.conical_dir(i, j),
            Projection::Icosahedral => self.icosa_dir(i, j),
            Projection::FindMatch => None,
        }
    }

    fn conical_dir(&self, i: usize, j: usize) -> Option<Vec3> {
        let cone = self.cone.as_ref()?;
        let (w, h, scale) = (self.width as f64, self.height as f64, self.scale);
        let x = (2.0 * i as f64 - w) / h / scale;
        let ypix = (2.0 * j as f64 - h) / h / scale;
        let (y, theta1) = if cone.north {
            let y = ypix + cone.y2;
            let zz = x * x + y * y;
            let t = if zz == 0.0 { 0.0 } else { cone.k1 * x.atan2(y) };
            (y, t)
        } else {
            let y = ypix - cone.y2;
            let zz = x * x + y * y;
            let t = if zz == 0.0 { 0.0 } else { -cone.k1 * x.atan2(-y) };
            (y, t)
        };
        if !(-PI..=PI).contains(&theta1) {
            return None;
        }
        let zz = x * x + y * y;
        let theta1 = theta1 + self.longi - 0.5 * PI;
        let theta2 = cone.k1 * ((zz - cone.c) / (zz + cone.c)).asin();
        if theta2 > 0.5 * PI || theta2 < -0.5 * PI {
            return None;
        }
        let cos2 = theta2.cos();
        Some(Vec3::new(
            theta1.cos() * cos2,
            theta2.sin(),
            -theta1.sin() * cos2,
        ))
    }

    fn icosa_dir(&self, i: usize, j: usize) -> Option<Vec3> {
        const S: f64 = 55.6;
        let (w, h, scale) = (self.width as f64, self.height as f64, self.scale);
        let x0 = 198.0 * (2.0 * i as f64 - w) / w / scale - 36.0;
        let y0 = 198.0 * (2.0 * j as f64 - h) / w / scale - self.lat / DEG2RAD;

        let (lat1, longi1) = icosa_face(x0, y0)?;
        let x = (x0 - longi1) / S;
        let y = (y0 + lat1) / S;

        let face_rot = Rotation::new(longi1 * DEG2RAD - self.longi, lat1 * DEG2RAD);
        let zz = (1.0 / (1.0 + x * x + y * y)).sqrt();
        let x = x * zz;
        let y = y * zz;
        let z = (1.0 - x * x - y * y).sqrt();
        Some(face_rot.apply(Vec3::new(x, y, z)))
    }

    /// Pixel coordinates of a direction, for the invertible azimuthal views
    /// (orthographic family and gnomonic). `None` when the direction is on
    /// the hidden hemisphere or the projection has no simple inverse here.
    pub fn pixel_of(&self, v: Vec3) -> Option<(f64, f64)> {
        let (w, h, scale) = (self.width as f64, self.height as f64, self.scale);
        let u = self.rot.invert(v);
        match self.projection {
            Projection::Orthographic | Projection::Heightfield => {
                if u.z < 0.0 {
                    return None;
                }
                Some(((u.x * h * scale + w) / 2.0, (u.y * h * scale + h) / 2.0))
            }
            Projection::Gnomonic => {
                if u.z <= 0.0 {
                    return None;
                }
                let x = u.x / u.z;
                let y = u.y / u.z;
                Some(((x * h * scale + w) / 2.0, (y * h * scale + h) / 2.0))
            }
            _ => None,
        }
    }
}

/// Icosahedron net lookup: which unfolded triangle holds `(x0, y0)`, as the
/// (latitude, longitude) of that face's centre in degrees.
fn icosa_face(x0: f64, y0: f64) -> Option<(f64, f64)> {
    const L1: f64 = 10.812317;
    const L2: f64 = -52.622632;
    let sq3 = 3.0f64.sqrt();
    let d = y0 / sq3;

    // apex-up cells: x0 - d < hi and x0 + d >= lo
    let up = |hi: f64, lo: f64| x0 - d < hi && x0 + d >= lo;
    // apex-down cells: x0 + d < hi and x0 - d >= lo
    let down = |hi: f64, lo: f64| x0 + d < hi && x0 - d >= lo;

    if (-18.0..=18.0).contains(&d) {
        let ups = [
            (144.0, 108.0, 126.0),
            (72.0, 36.0, 54.0),
            (0.0, -36.0, -18.0),
            (-72.0, -108.0, -90.0),
            (-144.0, -180.0, -162.0),
        ];
        for (hi, lo, lon) in ups {
            if up(hi, lo) {
                return Some((-L1, lon));
            }
        }
        let downs = [
            (108.0, 72.0, 90.0),
            (36.0, 0.0, 18.0),
            (-36.0, -72.0, -54.0),
            (-108.0, -144.0, -126.0),
            (-180.0, -216.0, -198.0),
        ];
        for (hi, lo, lon) in downs {
            if down(hi, lo) {
                return Some((L1, lon));
            }
        }
        None
    } else if d > 18.0 {
        let downs = [
            (180.0, 72.0, 126.0),
            (108.0, 0.0, 54.0),
            (36.0, -72.0, -18.0),
            (-36.0, -144.0, -90.0),
            (-108.0, -216.0, -162.0),
        ];
        for (hi, lo, lon) in downs {
            if down(hi, lo) {
                return Some((L2, lon));
            }
        }
        None
    } else {
        let ups = [
            (144.0, 36.0, 90.0),
            (72.0, -36.0, 18.0),
            (0.0, -108.0, -54.0),
            (-72.0, -180.0, -126.0),
            (-144.0, -252.0, -198.0),
        ];
        for (hi, lo, lon) in ups {
            if up(hi, lo) {
                return Some((-L2, lon));
            }
        }
        None
    }
}
