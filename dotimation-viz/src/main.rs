//! Writes an svg to help visualize flights

use clap::Parser;
use dotimation::config::MotionConfig;
use dotimation::flight::{Flight, ARC_DURATION_WINDOW};
use dotimation::responsive::{Scales, Viewport};
use kurbo::Point;
use std::fs;

#[derive(Parser)]
struct Args {
    /// Launch vertical velocity, px/ms (negative up)
    #[arg(long)]
    #[clap(default_value_t = -0.35)]
    v0: f64,

    /// Base downward acceleration, px/ms²
    #[arg(long)]
    #[clap(default_value_t = 0.003)]
    gravity: f64,
}

const COLORS: &[&str] = &["#EF5350", "#EC407A", "#AB47BC", "#E53935", "#D81B60"];

pub fn main() {
    let args = Args::parse();
    let config = MotionConfig::default();
    let frame_ms = 1000.0 / 60.0;

    let start = Point::new(0.0, 100.0);
    let target = Point::new(300.0, 40.0);

    // the same launch at the responsive extremes plus the bezier shape,
    // to eyeball how much a tuning change bends the arc
    let mut flights = Vec::new();
    for width_px in [360.0, 900.0, 1440.0] {
        let scales = Scales::resolve(
            &config,
            Some(Viewport {
                width_px,
                portrait: false,
            }),
        );
        let gravity = args.gravity * scales.arc_gravity;
        flights.push((
            format!("ballistic w={width_px}"),
            Flight::ballistic(start, target, args.v0, gravity, 900.0, ARC_DURATION_WINDOW),
        ));
    }
    flights.push((
        "bezier".to_string(),
        Flight::bezier(start, target, &config.trajectory.arc, 64.0, 900.0),
    ));

    let mut position_seqs = Vec::new();
    for (_, flight) in flights.iter() {
        let mut positions = Vec::new();
        let mut t = 0.0;
        while t < flight.duration() {
            positions.push(flight.position(t));
            t += frame_ms;
        }
        positions.push(flight.target());
        position_seqs.push(positions);
    }

    let (min, max) = position_seqs
        .iter()
        .flatten()
        .fold(
            (
                Point::new(f64::MAX, f64::MAX),
                Point::new(f64::MIN, f64::MIN),
            ),
            |(min, max), p| {
                (
                    Point::new(min.x.min(p.x), min.y.min(p.y)),
                    Point::new(max.x.max(p.x), max.y.max(p.y)),
                )
            },
        );

    let mut svg = String::new();
    let x_span = max.x - min.x;
    let y_span = max.y - min.y;
    let x_margin = 0.1 * x_span;
    let y_margin = 0.1 * y_span;

    svg.push_str(&format!(
        "<svg viewBox=\"{:.2} {:.2} {:.2} {:.2}\" version=\"1.1\" xmlns=\"http://www.w3.org/2000/svg\" >\n",
        min.x - x_margin,
        min.y - y_margin,
        x_span + 2.0 * x_margin,
        y_span + 2.0 * y_margin
    ));

    for (i, positions) in position_seqs.iter().enumerate() {
        let name = &flights[i].0;
        let color = COLORS[i % COLORS.len()];
        svg.push_str(&format!("\n  <!-- {name} -->\n"));
        for position in positions {
            svg.push_str(&format!(
                "  <circle cx=\"{:.2}\" cy=\"{:.2}\" r=\"0.75\" fill=\"{color}\" />\n",
                position.x, position.y,
            ));
        }
        svg.push_str(&format!(
            "  <text x=\"{:.2}\" y=\"{:.2}\" font-size=\"6\" fill=\"{color}\">{name}</text>\n",
            min.x + x_span / 3.0,
            min.y + 8.0 * i as f64
        ));
    }
    svg.push_str("</svg>\n");

    let filename = "/tmp/flights.svg";
    fs::write(filename, svg).expect("write");
    println!("Wrote {filename}");
}
