use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgMatches, CommandFactory, FromArgMatches, Parser};
use tracing::{debug, Level};

use planetgen::color::Palette;
use planetgen::config::{Outline, Params, Shading};
use planetgen::geom::DEG2RAD;
use planetgen::output::{self, FileType};
use planetgen::projection::Projection;
use planetgen::{render, search};

/// Fractal planet map generator: deterministic terrain from a single seed,
/// rendered through a choice of map projections.
#[derive(Parser)]
#[command(name = "planetgen", disable_help_flag = true, disable_version_flag = true)]
struct Cli {
    /// Print help
    #[arg(long, action = clap::ArgAction::Help, value_parser = clap::value_parser!(bool))]
    help: Option<bool>,

    /// Planet seed between 0.0 and 1.0
    #[arg(short = 's', default_value_t = 0.123, allow_hyphen_values = true)]
    seed: f64,

    /// Width in pixels
    #[arg(short = 'w', default_value_t = 800)]
    width: usize,

    /// Height in pixels
    #[arg(short = 'h', default_value_t = 600)]
    height: usize,

    /// Magnification
    #[arg(short = 'm', default_value_t = 1.0, allow_hyphen_values = true)]
    magnification: f64,

    /// Output file; an extension is added when the name has none
    /// (default: standard output)
    #[arg(short = 'o', value_name = "FILE")]
    output: Option<PathBuf>,

    /// Longitude of centre in degrees
    #[arg(short = 'l', default_value_t = 0.0, allow_hyphen_values = true)]
    longitude: f64,

    /// Latitude of centre in degrees
    #[arg(short = 'L', default_value_t = 0.0, allow_hyphen_values = true)]
    latitude: f64,

    /// Degrees between longitude grid lines (0 for no grid)
    #[arg(short = 'g', default_value_t = 0.0)]
    vgrid: f64,

    /// Degrees between latitude grid lines (0 for no grid)
    #[arg(short = 'G', default_value_t = 0.0)]
    hgrid: f64,

    /// Initial altitude (slightly below sea level by default)
    #[arg(short = 'i', default_value_t = -0.02, allow_hyphen_values = true)]
    initial_altitude: f64,

    /// Colour depends on latitude as well as altitude
    #[arg(short = 'c')]
    latic: bool,

    /// Colour definition file
    #[arg(short = 'C', default_value = "Olsson.col", value_name = "FILE")]
    colours: PathBuf,

    /// Black and white outline map, with an optional contour step
    #[arg(
        short = 'O',
        num_args = 0..=1,
        default_missing_value = "-2147483648",
        value_name = "STEP",
        action = clap::ArgAction::Append
    )]
    outline_bw: Vec<i32>,

    /// Trace land edges in black on the colour map, optional contour step
    #[arg(
        short = 'E',
        num_args = 0..=1,
        default_missing_value = "-2147483648",
        value_name = "STEP",
        action = clap::ArgAction::Append
    )]
    outline: Vec<i32>,

    /// Bumpmap shading
    #[arg(short = 'B')]
    bump: bool,

    /// Bumpmap shading on land only
    #[arg(short = 'b')]
    bump_land: bool,

    /// Daylight shading
    #[arg(short = 'd')]
    daylight: bool,

    /// Angle of "light" in bumpmap shading, or sun longitude in daylight
    /// shading
    #[arg(short = 'a', default_value_t = 150.0, allow_hyphen_values = true)]
    shade_angle: f64,

    /// Latitude of sun in daylight shading
    #[arg(short = 'A', default_value_t = 20.0, allow_hyphen_values = true)]
    shade_angle2: f64,

    /// Use the PPM file format (default is BMP)
    #[arg(short = 'P')]
    ppm: bool,

    /// Use the XPM file format (default is BMP)
    #[arg(short = 'x')]
    xpm: bool,

    /// Distance contribution to variation
    #[arg(short = 'V', default_value_t = 0.035, value_name = "WEIGHT")]
    distance_weight: f64,

    /// Altitude contribution to variation
    #[arg(short = 'v', default_value_t = 0.45, value_name = "WEIGHT")]
    altitude_weight: f64,

    /// Projection: m = Mercator (default), p = Peters, q = Square,
    /// s = Stereographic, o = Orthographic, g = Gnomonic, a = Azimuthal,
    /// c = Conical, M = Mollweide, S = Sinusoidal, i = Icosahedral,
    /// h = Heightfield, f = Find match
    #[arg(short = 'p', default_value = "m", value_parser = parse_projection)]
    projection: Projection,

    /// Progress and timing output on stderr
    #[arg(short = 'X')]
    debug: bool,
}

fn parse_projection(s: &str) -> Result<Projection, String> {
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => {
            Projection::from_letter(c).ok_or_else(|| format!("unknown projection: {s}"))
        }
        _ => Err(format!("unknown projection: {s}")),
    }
}

/// Bare `-O`/`-E` occurrences carry this marker instead of a step; it is the
/// spelled-out `default_missing_value` on those args.
const STEP_UNSET: i32 = i32::MIN;

/// The contour step is one shared setting, as in the reference: every `-O` or
/// `-E` occurrence that carries an explicit step overwrites it, bare
/// occurrences leave it alone, and argv order decides who wrote last.
fn contour_step(matches: &ArgMatches) -> i32 {
    let mut step = 0;
    let mut last = 0;
    for id in ["outline_bw", "outline"] {
        let indices = matches.indices_of(id).into_iter().flatten();
        let values = matches.get_many::<i32>(id).into_iter().flatten();
        for (idx, &v) in indices.zip(values) {
            if v != STEP_UNSET && idx >= last {
                step = v;
                last = idx;
            }
        }
    }
    step
}

fn build_params(cli: &Cli, contour_step: i32) -> Params {
    let mut longi = cli.longitude;
    if longi > 180.0 {
        longi -= 360.0;
    }
    let shading = if cli.daylight {
        Shading::Daylight
    } else if cli.bump_land {
        Shading::BumpLand
    } else if cli.bump {
        Shading::BumpAll
    } else {
        Shading::None
    };
    // -O forces the black and white collapse whatever order -E appears in
    let outline = if !cli.outline_bw.is_empty() {
        Outline::BwOnly
    } else if !cli.outline.is_empty() {
        Outline::Trace
    } else {
        Outline::None
    };
    Params {
        seed: cli.seed,
        width: cli.width,
        height: cli.height,
        scale: cli.magnification,
        longi: longi * DEG2RAD,
        lat: cli.latitude * DEG2RAD,
        projection: cli.projection,
        init_alt: cli.initial_altitude,
        alt_weight: cli.altitude_weight,
        dist_weight: cli.distance_weight,
        latic: cli.latic,
        shading,
        shade_angle: cli.shade_angle,
        shade_angle2: cli.shade_angle2,
        vgrid: cli.vgrid,
        hgrid: cli.hgrid,
        outline,
        contour_step,
        debug: cli.debug,
        ..Params::default()
    }
}

fn open_output(path: &PathBuf, file_type: FileType) -> Result<Box<dyn Write>> {
    // like the original, any dot anywhere in the name counts as an extension
    let mut name = path.as_os_str().to_string_lossy().into_owned();
    if !name.contains('.') {
        name.push_str(file_type.extension());
    }
    debug!("writing {name}");
    let file =
        File::create(&name).with_context(|| format!("could not open output file {name}"))?;
    Ok(Box::new(BufWriter::new(file)))
}

fn main() -> Result<()> {
    let matches = Cli::command().get_matches();
    let cli = Cli::from_arg_matches(&matches).unwrap_or_else(|e| e.exit());

    let level = if cli.debug {
        Level::DEBUG
    } else {
        Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .init();

    let file_type = if cli.xpm {
        FileType::Xpm
    } else if cli.ppm {
        FileType::Ppm
    } else {
        FileType::Bmp
    };
    let params = build_params(&cli, contour_step(&matches));
    let palette = Palette::load(&cli.colours)?;
    debug!(
        colours = palette.len(),
        projection = ?params.projection,
        "palette loaded"
    );

    if params.projection == Projection::FindMatch {
        let stdin = io::stdin();
        let target = search::read_target(&mut stdin.lock(), &mut io::stdout())?;
        search::run(&params, &target, &mut io::stdout().lock())?;
        return Ok(());
    }

    let mut out: Box<dyn Write> = match &cli.output {
        Some(path) => open_output(path, file_type)?,
        None => Box::new(io::stdout().lock()),
    };

    if params.projection == Projection::Heightfield {
        let heights = render::render_heightfield(&params);
        if params.debug {
            eprintln!();
        }
        output::write_heights(&mut out, &heights)?;
        out.flush()?;
        return Ok(());
    }

    let (map, timings) = planetgen::generate(&params, &palette);
    if params.debug {
        eprintln!();
    }
    if let Some(pct) = map.water_percent {
        eprintln!("water percentage: {pct}");
    }

    let bw = params.outline == Outline::BwOnly;
    match (file_type, bw) {
        (FileType::Ppm, false) => output::write_ppm(&mut out, &map, &palette)?,
        (FileType::Ppm, true) => output::write_ppm_bw(&mut out, &map.colour)?,
        (FileType::Xpm, false) => output::write_xpm(&mut out, &map, &palette)?,
        (FileType::Xpm, true) => output::write_xpm_bw(&mut out, &map.colour)?,
        (FileType::Bmp, false) => output::write_bmp(&mut out, &map, &palette)?,
        (FileType::Bmp, true) => output::write_bmp_bw(&mut out, &map.colour)?,
    }
    out.flush()?;

    if params.debug {
        eprintln!("\nTimings:");
        for t in &timings {
            eprintln!("  {:16} {:8.1} ms", t.name, t.ms);
        }
    }
    Ok(())
}
