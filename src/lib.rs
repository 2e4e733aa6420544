pub mod color;
pub mod config;
pub mod error;
pub mod geom;
pub mod grid;
pub mod output;
pub mod overlay;
pub mod projection;
pub mod render;
pub mod rng;
pub mod search;
pub mod tetra;

use std::time::Instant;

use color::Palette;
use config::Params;
use render::RasterMap;

pub use error::Error;

pub struct Timing {
    pub name: &'static str,
    pub ms: f64,
}

/// Render a colour-mapped planet: raster pass, then the overlay passes
/// (outline/contours, grid lines, shade smoothing) in the reference order.
pub fn generate(params: &Params, palette: &Palette) -> (RasterMap, Vec<Timing>) {
    let mut timings = Vec::new();

    let t = Instant::now();
    let mut map = render::render(params, palette);
    timings.push(Timing {
        name: "raster",
        ms: t.elapsed().as_secs_f64() * 1000.0,
    });

    let t = Instant::now();
    overlay::apply(&mut map, params, palette);
    timings.push(Timing {
        name: "overlay",
        ms: t.elapsed().as_secs_f64() * 1000.0,
    });

    (map, timings)
}
