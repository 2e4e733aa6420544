use std::path::Path;

use planetgen::color::{Palette, BACK, BLACK, GRID, WHITE};
use planetgen::config::{Outline, Params, Shading};
use planetgen::output;
use planetgen::projection::Projection;
use planetgen::render;

fn default_palette() -> Palette {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("Olsson.col");
    Palette::load(&path).expect("repo palette should load")
}

fn params(projection: Projection, w: usize, h: usize, seed: f64) -> Params {
    let mut p = Params::default();
    p.projection = projection;
    p.width = w;
    p.height = h;
    p.seed = seed;
    p
}

#[test]
fn repo_palette_is_well_formed() {
    let pal = default_palette();
    assert_eq!(pal.len(), 20);
    assert_eq!(pal.rgb[WHITE as usize], [255, 255, 255]);
    assert_eq!(pal.sea(), 12);
    assert_eq!(pal.land(), 13);
}

#[test]
fn mercator_ppm_is_byte_identical_across_runs() {
    let pal = default_palette();
    let p = params(Projection::Mercator, 100, 100, 0.123);

    let (map_a, _) = planetgen::generate(&p, &pal);
    let mut ppm_a = Vec::new();
    output::write_ppm(&mut ppm_a, &map_a, &pal).unwrap();

    let (map_b, _) = planetgen::generate(&p, &pal);
    let mut ppm_b = Vec::new();
    output::write_ppm(&mut ppm_b, &map_b, &pal).unwrap();

    assert_eq!(ppm_a, ppm_b);
    assert_eq!(map_a.water_percent, map_b.water_percent);
}

#[test]
fn orthographic_bmp_decodes_with_background_corners() {
    let pal = default_palette();
    let mut p = params(Projection::Orthographic, 80, 60, 0.1);
    p.shading = Shading::BumpAll;
    let (map, _) = planetgen::generate(&p, &pal);

    let mut bmp = Vec::new();
    output::write_bmp(&mut bmp, &map, &pal).unwrap();
    let img = image::load_from_memory(&bmp).expect("emitted BMP should decode");
    let rgb = img.to_rgb8();
    assert_eq!(rgb.width(), 80);
    assert_eq!(rgb.height(), 60);

    // corners are off the disc: background colour, which the palette keeps black
    assert_eq!(map.colour.get(0, 0), BACK);
    assert_eq!(rgb.get_pixel(0, 0).0, [0, 0, 0]);
    // the centre is on the globe and classified
    assert!(map.colour.get(40, 30) >= planetgen::color::LOWEST);
}

#[test]
fn square_projection_carries_grid_lines() {
    let pal = default_palette();
    let mut p = params(Projection::Square, 120, 60, 0.5);
    p.vgrid = 30.0;
    p.hgrid = 30.0;
    let (map, _) = planetgen::generate(&p, &pal);
    let grid_pixels = map.colour.data.iter().filter(|&&c| c == GRID).count();
    assert!(grid_pixels > 0, "expected 30 degree grid lines");
}

#[test]
fn bw_outline_map_collapses_to_two_colours() {
    let pal = default_palette();
    let mut p = params(Projection::Orthographic, 100, 80, 0.5);
    p.outline = Outline::BwOnly;
    let (map, _) = planetgen::generate(&p, &pal);
    assert!(map.colour.data.iter().all(|&c| c == BLACK || c == WHITE));

    let mut ppm = Vec::new();
    output::write_ppm_bw(&mut ppm, &map.colour).unwrap();
    assert!(ppm.starts_with(b"P6\n#fractal planet image\n100 80 1\n"));
}

#[test]
fn heightfield_dump_zeroes_off_disc_cells() {
    let p = params(Projection::Heightfield, 64, 64, 0.1);
    let heights = render::render_heightfield(&p);
    assert_eq!(heights.get(0, 0), 0);
    assert_eq!(heights.get(63, 63), 0);
    // somewhere on the disc there is relief
    assert!(heights.data.iter().any(|&v| v != 0));

    let mut text = Vec::new();
    output::write_heights(&mut text, &heights).unwrap();
    let text = String::from_utf8(text).unwrap();
    assert_eq!(text.lines().count(), 64);
    let first: i32 = text.split_whitespace().next().unwrap().parse().unwrap();
    assert_eq!(first, 0);
}

#[test]
fn xpm_output_announces_the_palette_geometry() {
    let pal = default_palette();
    let p = params(Projection::Peters, 40, 30, 0.3);
    let (map, _) = planetgen::generate(&p, &pal);
    let mut xpm = Vec::new();
    output::write_xpm(&mut xpm, &map, &pal).unwrap();
    let text = String::from_utf8(xpm).unwrap();
    assert!(text.starts_with("/* XPM */\n"));
    assert!(text.contains("\"40 30 20 1\","));
}

#[test]
fn daylight_shading_smooths_into_the_ppm() {
    let pal = default_palette();
    let mut p = params(Projection::Orthographic, 60, 48, 0.2);
    p.shading = Shading::Daylight;
    let (map, _) = planetgen::generate(&p, &pal);
    let shade = map.shade.as_ref().expect("shading requested");
    // background keeps the full shade byte, globe pixels vary
    assert_eq!(shade.get(0, 0), 255);
    let distinct: std::collections::BTreeSet<u8> = shade.data.iter().copied().collect();
    assert!(distinct.len() > 1, "daylight shading should vary");
}
