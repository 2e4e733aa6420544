use crate::color::{Palette, BLACK, GRID, LOWEST, OUTLINE1, OUTLINE2, WHITE};
use crate::config::{Outline, Params};
use crate::geom::PI;
use crate::grid::Grid;
use crate::render::RasterMap;

/// All post-raster passes, in the reference order: outline, longitude lines,
/// latitude lines, shade smoothing.
pub fn apply(map: &mut RasterMap, params: &Params, palette: &Palette) {
    if params.outline != Outline::None {
        make_outline(
            &mut map.colour,
            palette,
            params.outline == Outline::BwOnly,
            params.contour_step,
        );
    }
    if params.vgrid != 0.0 {
        longitude_lines(map, params.vgrid);
    }
    if params.hgrid != 0.0 {
        latitude_lines(map, params.hgrid);
    }
    if let Some(shade) = map.shade.as_mut() {
        smooth_shades(shade);
    }
}

/// Coastlines and optional contour lines. Points are collected first, the
/// optional black/white collapse runs second, painting runs last, so the
/// neighbour scans always see pre-collapse colours.
pub fn make_outline(colour: &mut Grid<u16>, palette: &Palette, do_bw: bool, contour_step: i32) {
    let (w, h) = (colour.w, colour.h);
    let sea = palette.sea();
    let land = palette.land();
    let mut points: Vec<(usize, usize)> = Vec::new();

    for i in 1..w.saturating_sub(1) {
        for j in 1..h.saturating_sub(1) {
            let c = colour.get(i, j);
            if (LOWEST..=sea).contains(&c) {
                let coast = [
                    colour.get(i - 1, j),
                    colour.get(i + 1, j),
                    colour.get(i, j - 1),
                    colour.get(i, j + 1),
                    colour.get(i - 1, j - 1),
                    colour.get(i - 1, j + 1),
                    colour.get(i + 1, j - 1),
                    colour.get(i + 1, j + 1),
                ]
                .iter()
                .any(|&n| n >= land);
                if coast {
                    points.push((i, j));
                }
            }
        }
    }

    if contour_step > 0 {
        for i in 1..w.saturating_sub(1) {
            for j in 1..h.saturating_sub(1) {
                let t = (colour.get(i, j) as i32 - land as i32) / contour_step;
                if t >= 0 {
                    let higher = [
                        colour.get(i - 1, j),
                        colour.get(i + 1, j),
                        colour.get(i, j - 1),
                        colour.get(i, j + 1),
                    ]
                    .iter()
                    .any(|&n| (n as i32 - land as i32) / contour_step > t);
                    if higher {
                        points.push((i, j));
                    }
                }
            }
        }
    }

    if do_bw {
        for c in colour.data.iter_mut() {
            *c = if *c >= LOWEST { WHITE } else { BLACK };
        }
    }

    for (i, j) in points {
        let t = if do_bw {
            BLACK
        } else {
            let c = colour.get(i, j) as i32;
            if contour_step == 0
                || c < land as i32
                || ((c - land as i32) / contour_step) % 2 == 1
            {
                OUTLINE1
            } else {
                OUTLINE2
            }
        };
        colour.set(i, j, t);
    }
}

/// Paint a pixel as a grid line: colour GRID, full shade.
fn grid_pixel(map: &mut RasterMap, i: usize, j: usize) {
    map.colour.set(i, j, GRID);
    if let Some(shade) = map.shade.as_mut() {
        shade.set(i, j, 255);
    }
}

/// A longitude line runs wherever the binned longitude changes between a
/// pixel and its right or lower neighbour; the poles always count.
pub fn longitude_lines(map: &mut RasterMap, vgrid: f64) {
    let Some(dirs) = map.dirs.clone() else {
        return;
    };
    let bin = |d: [f64; 3]| ((d[0].atan2(d[2]) * 180.0 / PI + 360.0) / vgrid).floor();
    for i in 0..dirs.w.saturating_sub(1) {
        for j in 0..dirs.h.saturating_sub(1) {
            let d = dirs.get(i, j);
            let on_line = if d[1].abs() == 1.0 {
                true
            } else {
                let t = bin(d);
                t != bin(dirs.get(i + 1, j)) || t != bin(dirs.get(i, j + 1))
            };
            if on_line {
                grid_pixel(map, i, j);
            }
        }
    }
}

/// Latitude lines, analogous with the binned arcsine of y.
pub fn latitude_lines(map: &mut RasterMap, hgrid: f64) {
    let Some(dirs) = map.dirs.clone() else {
        return;
    };
    let bin = |d: [f64; 3]| ((d[1].asin() * 180.0 / PI + 360.0) / hgrid).floor();
    for i in 0..dirs.w.saturating_sub(1) {
        for j in 0..dirs.h.saturating_sub(1) {
            let t = bin(dirs.get(i, j));
            if t != bin(dirs.get(i + 1, j)) || t != bin(dirs.get(i, j + 1)) {
                grid_pixel(map, i, j);
            }
        }
    }
}

/// Blur each shade towards its right/lower neighbours with weights 4:2:2:1.
/// The reference loop never reads a cell it has already written, so reading
/// from a pristine copy reproduces it exactly.
pub fn smooth_shades(shade: &mut Grid<u8>) {
    let src = shade.clone();
    let (w, h) = (shade.w, shade.h);
    for i in 0..w.saturating_sub(2) {
        for j in 0..h.saturating_sub(2) {
            let v = (4 * src.get(i, j) as u32
                + 2 * src.get(i, j + 1) as u32
                + 2 * src.get(i + 1, j) as u32
                + src.get(i + 1, j + 1) as u32
                + 4)
                / 9;
            shade.set(i, j, v as u8);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Palette;

    fn palette() -> Palette {
        let mut recs = Vec::new();
        for i in 0..20i64 {
            recs.extend_from_slice(&[i, 0, 0, 0]);
        }
        Palette::from_records(&recs)
    }

    /// 9x9 sea with a 3x3 island in the middle.
    fn island(pal: &Palette) -> Grid<u16> {
        let mut g = Grid::new(9, 9);
        g.data.fill(pal.sea() - 1);
        for j in 3..6 {
            for i in 3..6 {
                g.set(i, j, pal.land() + 2);
            }
        }
        g
    }

    #[test]
    fn bw_outline_pixels_touch_both_classes() {
        let pal = palette();
        let mut g = island(&pal);
        let before = g.clone();
        make_outline(&mut g, &pal, true, 0);
        for j in 1..8 {
            for i in 1..8 {
                if g.get(i, j) == BLACK && before.get(i, j) >= LOWEST {
                    // an outline pixel: sea before, some land 8-neighbour before
                    assert!(before.get(i, j) <= pal.sea());
                    let saw_land = (-1i32..=1)
                        .flat_map(|dj| (-1i32..=1).map(move |di| (di, dj)))
                        .filter(|&(di, dj)| di != 0 || dj != 0)
                        .any(|(di, dj)| {
                            before.get((i as i32 + di) as usize, (j as i32 + dj) as usize)
                                >= pal.land()
                        });
                    assert!(saw_land, "outline pixel ({i},{j}) has no land neighbour");
                }
            }
        }
        // the island interior is white, the open sea black
        assert_eq!(g.get(4, 4), WHITE);
        assert_eq!(g.get(0, 0), BLACK);
    }

    #[test]
    fn island_coast_is_fully_traced() {
        let pal = palette();
        let mut g = island(&pal);
        make_outline(&mut g, &pal, false, 0);
        // the sea ring directly around the island is outline colour
        for i in 2..7 {
            assert_eq!(g.get(i, 2), OUTLINE1);
            assert_eq!(g.get(i, 6), OUTLINE1);
            assert_eq!(g.get(2, i), OUTLINE1);
            assert_eq!(g.get(6, i), OUTLINE1);
        }
        // land untouched
        assert_eq!(g.get(4, 4), pal.land() + 2);
    }

    #[test]
    fn contours_alternate_between_outline_colours() {
        let pal = palette();
        // terraced altitude steps climbing to the east, two colours per step
        let mut g = Grid::new(8, 5);
        for j in 0..5 {
            for i in 0..8 {
                g.set(i, j, pal.land() + i as u16);
            }
        }
        make_outline(&mut g, &pal, false, 2);
        // interior columns with a higher east neighbour bucket become contours
        let c1 = g.get(1, 2);
        let c3 = g.get(3, 2);
        let c5 = g.get(5, 2);
        assert_eq!(c1, OUTLINE2); // bucket 0
        assert_eq!(c3, OUTLINE1); // bucket 1
        assert_eq!(c5, OUTLINE2); // bucket 2
    }

    #[test]
    fn smoothing_matches_reference_weights() {
        let mut g = Grid::new(4, 4);
        g.data.fill(100u8);
        g.set(1, 1, 190);
        let expect_self = (4u32 * 190 + 2 * 100 + 2 * 100 + 100 + 4) / 9;
        let expect_left = (4u32 * 100 + 2 * 100 + 2 * 190 + 100 + 4) / 9;
        smooth_shades(&mut g);
        assert_eq!(g.get(1, 1) as u32, expect_self);
        assert_eq!(g.get(0, 1) as u32, expect_left);
        // the last two rows/columns are untouched
        assert_eq!(g.get(3, 3), 100);
    }
}
