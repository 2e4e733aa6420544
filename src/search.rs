use std::io::{self, BufRead, Write};

use crate::config::Params;
use crate::geom::{Vec3, DEG2RAD, PI};
use crate::grid::Grid;
use crate::projection::log_2;
use crate::tetra::Oracle;

/// The target map samples a 7.5 degree grid: 24 columns and 11 rows of input,
/// interpolated up to this raster.
pub const MAP_W: usize = 47;
pub const MAP_H: usize = 21;

const SEED_STEP: f64 = 0.0000001;
const INITIAL_BEST: i32 = 500_000;

/// Land/water preference map read from stdin, plus cosine row weights.
pub struct Target {
    pub cells: Grid<i32>,
    pub row_weight: [i32; MAP_H],
}

fn symbol_value(c: char) -> Option<i32> {
    Some(match c {
        '.' => -8,
        ',' => -4,
        ':' => -2,
        ';' => -1,
        '-' => 0,
        '*' => 1,
        'o' => 2,
        'O' => 4,
        '@' => 16,
        _ => return None,
    })
}

/// Read the ASCII target map: 11 lines of 24 symbols. Bad symbols and ragged
/// lines get a diagnostic and a zero cell; the search still runs.
pub fn read_target<R: BufRead>(input: &mut R, diag: &mut impl Write) -> io::Result<Target> {
    let mut cells = Grid::new(MAP_W, MAP_H);
    let mut row_weight = [0i32; MAP_H];
    for (j, weight) in row_weight.iter_mut().enumerate() {
        let y = 0.5 * 7.5 * (2.0 * j as f64 - MAP_H as f64 + 1.0);
        *weight = (100.0 * (DEG2RAD * y).cos() + 0.5) as i32;
    }

    let mut line = String::new();
    for j in (0..MAP_H).step_by(2) {
        line.clear();
        input.read_line(&mut line)?;
        let mut chars = line.chars();
        for col in 0..(MAP_W + 1) / 2 {
            let i = 2 * col;
            let c = chars.next().unwrap_or(' ');
            let v = match symbol_value(c) {
                Some(v) => v,
                None => {
                    writeln!(diag, "Wrong map symbol: {c}")?;
                    0
                }
            };
            cells.set(i, j, v);
            if i > 0 {
                let mid = (cells.get(i, j) + cells.get(i - 2, j)) / 2;
                cells.set(i - 1, j, mid);
            }
        }
        match chars.next() {
            Some('\n') | None => {}
            Some(c) => writeln!(diag, "Wrong map format: {c}")?,
        }
    }
    for j in (1..MAP_H).step_by(2) {
        for i in 0..MAP_W {
            let mid = (cells.get(i, j - 1) + cells.get(i, j + 1)) / 2;
            cells.set(i, j, mid);
        }
    }
    Ok(Target { cells, row_weight })
}

/// Sample the planet for one seed onto the 47x21 comparison raster, values
/// 0..=255 with 128 at the initial sea level. Each cell averages four
/// quarter-offset probes.
fn sample_grid(params: &Params) -> Grid<i32> {
    let mut grid = Grid::new(MAP_W, MAP_H);
    let mut oracle = Oracle::new(params);
    for j in 0..MAP_H {
        let y = 0.5 * 7.5 * (2.0 * j as f64 - MAP_H as f64 + 1.0);
        let y = (DEG2RAD * y).sin();
        // the 47/21 quotient is an integer here, as in the original
        let scale1 = (MAP_W / MAP_H) as f64 / (1.0 - y * y).sqrt() / PI;
        let cos2 = (1.0 - y * y).sqrt();
        let yb = 0.5 * 7.5 * (2.0 * j as f64 - MAP_H as f64 + 1.5);
        let yb = (DEG2RAD * yb).sin();
        let cos2b = (1.0 - yb * yb).sqrt();
        let depth = 3 * (log_2(scale1 * MAP_H as f64) as i32) + 6;
        for i in 0..MAP_W {
            let theta1 = -0.5 * PI + PI * (2.0 * i as f64 - MAP_W as f64) / MAP_W as f64;
            let theta2 = -0.5 * PI + PI * (2.0 * i as f64 + 0.5 - MAP_W as f64) / MAP_W as f64;
            let probe = |o: &mut Oracle, th: f64, yy: f64, cc: f64| {
                (128.0 + 1000.0 * o.sample(Vec3::new(th.cos() * cc, yy, -th.sin() * cc), depth).alt)
                    as i32
            };
            let c0 = probe(&mut oracle, theta1, y, cos2);
            let c1 = probe(&mut oracle, theta2, y, cos2);
            let c2 = probe(&mut oracle, theta1, yb, cos2b);
            let c3 = probe(&mut oracle, theta2, yb, cos2b);
            let c = ((c0 + c1 + c2 + c3) as f64 / 4.0) as i32;
            grid.set(i, j, c.clamp(0, 255));
        }
    }
    grid
}

/// Score one seed against the target at every longitude offset and sea-level
/// shift; report every improvement over `best`.
pub fn search_step(
    params: &Params,
    target: &Target,
    best: &mut i32,
    out: &mut impl Write,
) -> io::Result<()> {
    let grid = sample_grid(params);
    for k in 0..MAP_W {
        for l in (-20i32..=20).step_by(2) {
            let mut errcount = 0i32;
            for j in 0..MAP_H {
                let mut row_err = 0i32;
                for i in 0..MAP_W {
                    let want = target.cells.get(i, j);
                    let got = grid.get((i + k) % MAP_W, j);
                    if want < 0 && got > 128 - l {
                        row_err -= want;
                    }
                    if want > 0 && got <= 128 - l {
                        row_err += want;
                    }
                }
                errcount += target.row_weight[j] * row_err;
            }
            if errcount < *best {
                writeln!(
                    out,
                    "Errors: {}, parameters: -s {:.12} -l {:.1} -i {:.3}",
                    errcount,
                    params.seed,
                    (360.0 * k as f64) / (MAP_W as f64 + 1.0),
                    params.init_alt + l as f64 / 1000.0
                )?;
                *best = errcount;
                for j in 0..MAP_H {
                    let mut row = String::with_capacity(MAP_W + 1);
                    for i in 0..MAP_W {
                        row.push(if grid.get((i + k) % MAP_W, j) <= 128 - l {
                            '.'
                        } else {
                            'O'
                        });
                    }
                    writeln!(out, "{row}")?;
                }
                out.flush()?;
            }
        }
    }
    Ok(())
}

/// Endless scan upward from the configured seed. Runs until interrupted.
pub fn run(params: &Params, target: &Target, out: &mut impl Write) -> io::Result<()> {
    let mut best = INITIAL_BEST;
    let mut current = params.clone();
    loop {
        search_step(&current, target, &mut best, out)?;
        current.seed += SEED_STEP;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::BufReader;

    fn target_text(first: char) -> String {
        let mut s = String::new();
        for j in 0..11 {
            let c = if j == 0 { first } else { '-' };
            for _ in 0..24 {
                s.push(c);
            }
            s.push('\n');
        }
        s
    }

    #[test]
    fn reader_maps_symbols_and_interpolates() {
        let text = target_text('.');
        let mut diag = Vec::new();
        let t = read_target(&mut BufReader::new(text.as_bytes()), &mut diag).unwrap();
        assert!(diag.is_empty());
        // top row is strong water preference, interpolated across columns
        assert_eq!(t.cells.get(0, 0), -8);
        assert_eq!(t.cells.get(1, 0), -8);
        assert_eq!(t.cells.get(46, 0), -8);
        // odd rows average their neighbours
        assert_eq!(t.cells.get(0, 1), -4);
        assert_eq!(t.cells.get(0, 2), 0);
        // equator row weight is the full 100, poles are lighter
        assert_eq!(t.row_weight[10], 100);
        assert!(t.row_weight[0] < t.row_weight[10]);
    }

    #[test]
    fn reader_reports_bad_symbols_but_continues() {
        let text = target_text('Z');
        let mut diag = Vec::new();
        let t = read_target(&mut BufReader::new(text.as_bytes()), &mut diag).unwrap();
        let msg = String::from_utf8(diag).unwrap();
        assert!(msg.contains("Wrong map symbol: Z"));
        assert_eq!(t.cells.get(0, 0), 0);
    }

    #[test]
    fn indifferent_target_scores_zero_and_reports() {
        let text = target_text('-');
        let mut diag = Vec::new();
        let t = read_target(&mut BufReader::new(text.as_bytes()), &mut diag).unwrap();
        let mut best = INITIAL_BEST;
        let mut out = Vec::new();
        let params = Params::default();
        search_step(&params, &t, &mut best, &mut out).unwrap();
        assert_eq!(best, 0);
        let printed = String::from_utf8(out).unwrap();
        assert!(printed.starts_with("Errors: 0, parameters: -s 0.123"));
        // the report includes a 47-wide preview map
        assert!(printed.lines().any(|l| l.len() == MAP_W));
    }
}
