// What you get:
// • `render`  writes the configured displacement map to a PNG.
// • `profile` prints the refraction profile samples as JSON.
// • `preview` opens a window with the live map:
//     S cycles the shape, B cycles the bevel, M toggles magnify, ESC quits.
// Set RUST_LOG=debug to see geometry and timing.

use clap::{Args, Parser, Subcommand};
use liquid_glass_map::draw::{Drawer, Frame, draw_text_5x7};
use liquid_glass_map::{BevelPreset, Error, MapConfig, Mode, RefractionProfile, ShapeKind};
use log::info;
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "liquid-glass-map")]
#[command(about = "Generate liquid-glass displacement maps")]
struct Cli {
    /// JSON config file; flags below override its fields.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(flatten)]
    overrides: Overrides,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Write the map as an RGBA PNG.
    Render {
        #[arg(long, short, default_value = "displacement.png")]
        out: PathBuf,
    },
    /// Print the refraction profile as a JSON array.
    Profile,
    /// Show the map in a window.
    Preview,
}

#[derive(Args)]
struct Overrides {
    /// Canvas width in logical pixels.
    #[arg(long, global = true)]
    width: Option<f64>,
    /// Canvas height in logical pixels.
    #[arg(long, global = true)]
    height: Option<f64>,
    /// Device pixel ratio (default 1).
    #[arg(long, global = true)]
    dpr: Option<f64>,
    #[arg(long, global = true, value_parser = parse_shape)]
    shape: Option<ShapeKind>,
    #[arg(long, global = true)]
    corner_radius: Option<f64>,
    #[arg(long, global = true)]
    exponent: Option<f64>,
    #[arg(long, global = true, value_parser = parse_bevel)]
    bevel: Option<BevelPreset>,
    #[arg(long, global = true)]
    bezel_width: Option<f64>,
    #[arg(long, global = true)]
    thickness: Option<f64>,
    #[arg(long, global = true)]
    refractive_index: Option<f64>,
    #[arg(long, global = true)]
    samples: Option<usize>,
    #[arg(long, global = true)]
    max_displacement: Option<f64>,
    /// Use the radial magnifier instead of refraction.
    #[arg(long, global = true, conflicts_with = "radius")]
    magnify: bool,
    /// Use rounded-corner refraction with this explicit radius.
    #[arg(long, global = true)]
    radius: Option<f64>,
}

fn parse_shape(s: &str) -> Result<ShapeKind, String> {
    ShapeKind::ALL
        .into_iter()
        .find(|k| k.name() == s)
        .ok_or_else(|| format!("unknown shape `{s}` (circle, squircle, rectangle, pill)"))
}

fn parse_bevel(s: &str) -> Result<BevelPreset, String> {
    BevelPreset::ALL.into_iter().find(|b| b.name() == s).ok_or_else(|| {
        let names: Vec<_> = BevelPreset::ALL.iter().map(|b| b.name()).collect();
        format!("unknown bevel `{s}` ({})", names.join(", "))
    })
}

impl Overrides {
    fn apply(&self, c: &mut MapConfig) {
        if let Some(v) = self.width {
            c.canvas.width = v;
        }
        if let Some(v) = self.height {
            c.canvas.height = v;
        }
        if self.dpr.is_some() {
            c.canvas.device_pixel_ratio = self.dpr;
        }
        if let Some(v) = self.shape {
            c.shape.kind = v;
        }
        if let Some(v) = self.corner_radius {
            c.shape.corner_radius = v;
        }
        if let Some(v) = self.exponent {
            c.shape.squircle_exponent = v;
        }
        if let Some(v) = self.bevel {
            c.glass.bevel = v;
        }
        if let Some(v) = self.bezel_width {
            c.glass.bezel_width = v;
        }
        if let Some(v) = self.thickness {
            c.glass.thickness = v;
        }
        if let Some(v) = self.refractive_index {
            c.glass.refractive_index = v;
        }
        if let Some(v) = self.samples {
            c.glass.samples = v;
        }
        if self.max_displacement.is_some() {
            c.max_displacement = self.max_displacement;
        }
        if self.magnify {
            c.mode = Mode::Magnify;
        } else if let Some(radius) = self.radius {
            c.mode = Mode::LegacyCircle { radius };
        }
    }
}

fn main() -> Result<(), Error> {
    env_logger::init();
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => MapConfig::load(path)?,
        None => MapConfig::default(),
    };
    cli.overrides.apply(&mut config);
    config.validate()?;

    match cli.command {
        Command::Render { out } => {
            let map = config.render()?;
            map.save_png(&out)?;
            info!("wrote {}x{} {} map to {}", map.width(), map.height(), config.mode.name(), out.display());
        }
        Command::Profile => {
            let profile = config.profile()?;
            println!("{}", serde_json::to_string(profile.samples())?);
        }
        Command::Preview => preview(config)?,
    }
    Ok(())
}

/// Interactive window. The profile is only resampled when the bevel changes;
/// the map is only regenerated when something changed.
fn preview(mut config: MapConfig) -> Result<(), Error> {
    let mut profile = config.profile()?;
    let mut frame = redraw(&config, &profile)?;
    let mut drawer = Drawer::new("Liquid Glass Map", frame.width, frame.height)?;
    // Remember the refraction variant so M can toggle back to it.
    let mut refraction_mode = match config.mode {
        Mode::Magnify => Mode::Refraction,
        m => m,
    };

    while drawer.is_open() && !drawer.esc_pressed() {
        let mut dirty = false;

        if drawer.s_pressed_once() {
            config.shape.kind = config.shape.kind.next();
            dirty = true;
        }
        if drawer.b_pressed_once() {
            let i = BevelPreset::ALL.iter().position(|b| *b == config.glass.bevel).unwrap_or(0);
            config.glass.bevel = BevelPreset::ALL[(i + 1) % BevelPreset::ALL.len()];
            profile = config.profile()?;
            dirty = true;
        }
        if drawer.m_pressed_once() {
            config.mode = match config.mode {
                Mode::Magnify => refraction_mode,
                m => {
                    refraction_mode = m;
                    Mode::Magnify
                }
            };
            dirty = true;
        }

        if dirty {
            frame = redraw(&config, &profile)?;
        }
        drawer.present(&frame)?;
    }
    Ok(())
}

fn redraw(config: &MapConfig, profile: &RefractionProfile) -> Result<Frame, Error> {
    let started = Instant::now();
    let map = config.render_with(profile)?;
    let ms = started.elapsed().as_secs_f32() * 1000.0;

    let mut frame = Frame::from_map(&map);
    let hud = match config.mode {
        Mode::Magnify => format!("MAGNIFY | {ms:.1} MS"),
        m => format!(
            "{} | {} | {} | {ms:.1} MS",
            m.name(),
            config.shape.kind.name(),
            config.glass.bevel.name()
        ),
    };
    draw_text_5x7(&mut frame, 8, 8, &hud, 0x00_FF_FF_FF);
    info!("{hud}");
    Ok(frame)
}
