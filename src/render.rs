use rayon::prelude::*;

use crate::color::{self, Palette, BACK, LOWEST};
use crate::config::Params;
use crate::grid::Grid;
use crate::projection::{RowShape, View};
use crate::tetra::Oracle;

/// Everything the raster pass produces. The direction plane is only kept when
/// a grid overlay will need it, the shade plane only when shading is on.
pub struct RasterMap {
    pub colour: Grid<u16>,
    pub shade: Option<Grid<u8>>,
    pub dirs: Option<Grid<[f64; 3]>>,
    /// Integer water percentage over the classified pixels, when any exist.
    pub water_percent: Option<i64>,
}

struct RowOut {
    colour: Vec<u16>,
    shade: Option<Vec<u8>>,
    dirs: Option<Vec<[f64; 3]>>,
}

fn progress_tick(params: &Params, view: &View, j: usize) {
    let tick = (params.height / 25).max(1);
    if params.debug && j % tick == 0 {
        eprint!("{}", view.projection.letter());
    }
}

/// One raster row. Each row gets its own oracle so the shallow-depth cache
/// never crosses rows and the output does not depend on scheduling.
fn render_row(view: &View, params: &Params, palette: &Palette, j: usize) -> RowOut {
    progress_tick(params, view, j);
    let w = view.width;
    let mut colour = vec![color::BLACK; w];
    let mut shade = params.shading.enabled().then(|| vec![0u8; w]);
    let mut dirs =
        (params.vgrid != 0.0 || params.hgrid != 0.0).then(|| vec![[0.0f64; 3]; w]);

    let shape = view.row(j);
    match shape {
        RowShape::Blank => {}
        RowShape::Outside => {
            colour.fill(BACK);
            if let Some(shade) = shade.as_mut() {
                shade.fill(255);
            }
        }
        RowShape::Band { depth, .. } | RowShape::Flat { depth } => {
            let mut oracle = Oracle::new(params);
            for i in 0..w {
                match view.dir(&shape, i, j) {
                    None => {
                        colour[i] = BACK;
                        if let Some(shade) = shade.as_mut() {
                            shade[i] = 255;
                        }
                    }
                    Some(d) => {
                        let s = oracle.sample(d, depth);
                        colour[i] = color::classify(s.alt, d.y, params.latic, palette);
                        if let Some(shade) = shade.as_mut() {
                            shade[i] = s.shade;
                        }
                        if let Some(dirs) = dirs.as_mut() {
                            dirs[i] = [d.x, d.y, d.z];
                        }
                    }
                }
            }
        }
    }
    RowOut {
        colour,
        shade,
        dirs,
    }
}

/// Colour-mapped raster pass: project every pixel, query the oracle, classify.
pub fn render(params: &Params, palette: &Palette) -> RasterMap {
    let view = View::new(params);
    let (w, h) = (params.width, params.height);
    if params.debug {
        eprintln!("+----+----+----+----+----+");
    }

    let rows: Vec<RowOut> = (0..h)
        .into_par_iter()
        .map(|j| render_row(&view, params, palette, j))
        .collect();

    let mut colour = Grid::new(w, h);
    let mut shade = params.shading.enabled().then(|| Grid::new(w, h));
    let mut dirs =
        (params.vgrid != 0.0 || params.hgrid != 0.0).then(|| Grid::<[f64; 3]>::new(w, h));
    for (j, row) in rows.into_iter().enumerate() {
        colour.set_row(j, &row.colour);
        if let (Some(grid), Some(vals)) = (shade.as_mut(), row.shade.as_ref()) {
            grid.set_row(j, vals);
        }
        if let (Some(grid), Some(vals)) = (dirs.as_mut(), row.dirs.as_ref()) {
            grid.set_row(j, vals);
        }
    }

    let land_from = palette.land();
    let mut water = 0i64;
    let mut land = 0i64;
    for &c in &colour.data {
        if c >= LOWEST {
            if c < land_from {
                water += 1;
            } else {
                land += 1;
            }
        }
    }
    let water_percent = (water + land > 0).then(|| 100 * water / (water + land));

    RasterMap {
        colour,
        shade,
        dirs,
        water_percent,
    }
}

/// Heightfield pass: orthographic mapping, raw scaled altitudes, no palette.
pub fn render_heightfield(params: &Params) -> Grid<i32> {
    let view = View::new(params);
    let (w, h) = (params.width, params.height);
    if params.debug {
        eprintln!("+----+----+----+----+----+");
    }

    let rows: Vec<Vec<i32>> = (0..h)
        .into_par_iter()
        .map(|j| {
            progress_tick(params, &view, j);
            let mut oracle = Oracle::new(params);
            let shape = view.row(j);
            (0..w)
                .map(|i| match view.dir(&shape, i, j) {
                    None => 0,
                    Some(d) => (10_000_000.0 * oracle.sample(d, shape_depth(&shape)).alt) as i32,
                })
                .collect()
        })
        .collect();

    let mut heights = Grid::new(w, h);
    for (j, row) in rows.iter().enumerate() {
        heights.set_row(j, row);
    }
    heights
}

fn shape_depth(shape: &RowShape) -> i32 {
    match *shape {
        RowShape::Band { depth, .. } | RowShape::Flat { depth } => depth,
        _ => 0,
    }
}
