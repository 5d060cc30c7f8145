use std::collections::BTreeMap;
use std::{fs, path::Path};

use clap::Parser;
use dotimation::clock::FixedStep;
use dotimation::glyph::ScaledFont;
use dotimation::responsive::Viewport;
use dotimation::stage::{BoxPx, CharSlot};
use dotimation::{play, MotionConfig, RecordingStage, Script, StageLayout};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
struct Args {
    /// Font used for glyph measurements
    #[arg(long)]
    #[clap(required(true))]
    font: String,

    /// The text the intro "typed" before the motion starts
    #[arg(long)]
    #[clap(default_value = "danicallero")]
    text: String,

    /// Title font size, px
    #[arg(long)]
    #[clap(default_value_t = 64.0)]
    font_px: f64,

    /// Viewport width, px
    #[arg(long)]
    #[clap(default_value_t = 1280.0)]
    width: f64,

    /// Treat the viewport as portrait
    #[arg(long)]
    portrait: bool,

    /// Virtual clock rate
    #[arg(long)]
    #[clap(default_value_t = 60.0)]
    fps: f64,

    /// JSON file of motion config overrides; omitted fields keep defaults
    #[arg(long)]
    config: Option<String>,

    /// Whether to also write an SVG of the cursor path
    #[arg(long)]
    debug: bool,

    #[arg(long)]
    #[clap(default_value = "frames.json")]
    out_file: String,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();
    let args = Args::parse();

    let font_bytes = fs::read(&args.font).expect("Unable to read font file");
    let font = ScaledFont::new(&font_bytes, args.font_px).expect("Unable to parse font");

    let config = match &args.config {
        Some(path) => {
            let raw = fs::read_to_string(path).expect("Unable to read config file");
            serde_json::from_str(&raw).expect("Unable to parse config")
        }
        None => MotionConfig::default(),
    };

    let viewport = Viewport {
        width_px: args.width,
        portrait: args.portrait,
    };
    let layout = layout_stage(&font, &args.text, viewport);
    let script = Script {
        char_index: args.text.chars().count().saturating_sub(1),
        target_char: args.text.chars().last().expect("--text must not be empty"),
    };

    let mut stage = RecordingStage::new(layout);
    let mut clock = FixedStep::fps(args.fps);
    let frames = play(&config, script, &mut stage, &mut clock);
    tracing::info!(frames, "intro played");

    if args.debug {
        let svg_out = Path::new(&args.out_file).with_extension("svg");
        fs::write(&svg_out, path_svg(&stage)).expect("Unable to write debug svg");
        eprintln!("Wrote debug svg {}", svg_out.display());
    }

    fs::write(
        &args.out_file,
        serde_json::to_string_pretty(stage.events()).unwrap(),
    )
    .unwrap();
    eprintln!("Wrote {}", args.out_file);
}

/// Lay the typed text out the way the page would have: one line, caret
/// boundaries at the cumulative advances, the marker where the '.' will sit.
fn layout_stage(font: &ScaledFont, text: &str, viewport: Viewport) -> StageLayout {
    let em = font.font_px();
    let line_top = em;
    let ascent = font.line_ascent();
    let line_height = ascent + font.line_descent();
    let baseline = line_top + ascent;

    let mut x = em;
    let mut char_slots = Vec::new();
    let mut ink = BTreeMap::new();
    for ch in text.chars() {
        let advance = font
            .advance(ch)
            .unwrap_or_else(|e| panic!("Unable to measure '{ch}': {e}"));
        char_slots.push(CharSlot {
            start_x: x,
            end_x: x + advance,
            bounds: BoxPx {
                left: x,
                top: line_top,
                width: advance,
                height: line_height,
            },
        });
        if let std::collections::btree_map::Entry::Vacant(entry) = ink.entry(ch) {
            if let Ok(metrics) = font.ink(ch) {
                entry.insert(metrics);
            }
        }
        x += advance;
    }

    let dot = font.dot_diameter().expect("Unable to measure '.'");
    StageLayout {
        font_px: em,
        viewport: Some(viewport),
        // the typing collaborator leaves the caret just past the text
        caret: Some([x + 2.0, line_top]),
        char_slots,
        ink,
        marker: Some(BoxPx {
            left: x,
            top: baseline - dot,
            width: dot,
            height: dot,
        }),
        dot_diameter: dot,
    }
}

/// The cursor's path over the run as an SVG: a polyline through the frame
/// centers plus a dot per frame, handy for eyeballing a tuning change.
fn path_svg(stage: &RecordingStage) -> String {
    let centers: Vec<(f64, f64)> = stage
        .cursor_frames()
        .map(|f| (f.left + f.width / 2.0, f.top + f.height / 2.0))
        .collect();

    let (min, max) = centers.iter().fold(
        ((f64::MAX, f64::MAX), (f64::MIN, f64::MIN)),
        |(min, max), (x, y)| {
            (
                (min.0.min(*x), min.1.min(*y)),
                (max.0.max(*x), max.1.max(*y)),
            )
        },
    );
    let margin = 0.1 * (max.0 - min.0).max(max.1 - min.1).max(1.0);

    let mut svg = format!(
        "<svg viewBox=\"{:.2} {:.2} {:.2} {:.2}\" version=\"1.1\" xmlns=\"http://www.w3.org/2000/svg\" >\n",
        min.0 - margin,
        min.1 - margin,
        max.0 - min.0 + 2.0 * margin,
        max.1 - min.1 + 2.0 * margin,
    );
    svg.push_str("<path fill=\"none\" stroke=\"#0B57D0\" stroke-width=\"0.5\" d=\"\n");
    for (i, (x, y)) in centers.iter().enumerate() {
        let op = if i == 0 { 'M' } else { 'L' };
        svg.push_str(&format!("  {op}{x:.2},{y:.2}\n"));
    }
    svg.push_str("\" />\n");
    for (x, y) in &centers {
        svg.push_str(&format!(
            "  <circle cx=\"{x:.2}\" cy=\"{y:.2}\" r=\"0.75\" fill=\"#EF5350\" />\n"
        ));
    }
    svg.push_str("</svg>\n");
    svg
}
