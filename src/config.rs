use crate::projection::Projection;

/// Per-pixel shade model.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Shading {
    None,
    /// Bumpmap lighting everywhere.
    BumpAll,
    /// Bumpmap lighting on land, flat sea.
    BumpLand,
    /// Sun-direction lighting.
    Daylight,
}

impl Shading {
    #[inline]
    pub fn enabled(self) -> bool {
        self != Shading::None
    }
}

/// Coast/contour post-pass selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outline {
    None,
    /// Trace coastlines/contours on the colour map.
    Trace,
    /// Collapse to black outline on white.
    BwOnly,
}

/// One run's worth of parameters. Built once from the command line and then
/// threaded by reference; nothing here is mutated while rendering.
#[derive(Clone, Debug)]
pub struct Params {
    pub seed: f64,
    pub width: usize,
    pub height: usize,
    /// Magnification.
    pub scale: f64,
    /// Centre longitude, radians.
    pub longi: f64,
    /// Centre latitude, radians.
    pub lat: f64,
    pub projection: Projection,

    /// Initial altitude at the enclosing tetrahedron corners.
    pub init_alt: f64,
    /// Weight of the altitude difference term in midpoint displacement.
    pub alt_weight: f64,
    /// Weight of the edge-length term in midpoint displacement.
    pub dist_weight: f64,
    /// Power applied to the edge length in the displacement term.
    pub dist_pow: f64,

    /// Latitude-driven colour shift (icecaps creep down from the poles).
    pub latic: bool,
    pub shading: Shading,
    /// Light angle for bumpmap shading; sun longitude for daylight, degrees.
    pub shade_angle: f64,
    /// Sun latitude for daylight shading, degrees.
    pub shade_angle2: f64,

    /// Degrees between longitude grid lines; 0 disables.
    pub vgrid: f64,
    /// Degrees between latitude grid lines; 0 disables.
    pub hgrid: f64,
    pub outline: Outline,
    /// Colour steps between land contour lines; 0 disables contours.
    pub contour_step: i32,

    /// Progress ticks and stage timings on stderr.
    pub debug: bool,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            seed: 0.123,
            width: 800,
            height: 600,
            scale: 1.0,
            longi: 0.0,
            lat: 0.0,
            projection: Projection::Mercator,
            init_alt: -0.02,
            alt_weight: 0.45,
            dist_weight: 0.035,
            dist_pow: 0.47,
            latic: false,
            shading: Shading::None,
            shade_angle: 150.0,
            shade_angle2: 20.0,
            vgrid: 0.0,
            hgrid: 0.0,
            outline: Outline::None,
            contour_step: 0,
            debug: false,
        }
    }
}
