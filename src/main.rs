//! ALICE-Quality simulator
//!
//! Replays an FPS trace through the adaptive quality loop and reports the
//! tier transitions, final score and optimization tips.
//!
//! Usage:
//!   alice-quality --fps 25 --cycles 120
//!   alice-quality --fps 70,70,20,20 --cycles 400 --tier auto
//!   alice-quality --fps 40 --config ./quality.json --triangles 1200000

use alice_quality::{QualityApp, QualityPreference, QualitySettings, RendererStats, ViewerConfig};
use anyhow::{bail, Context, Result};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

fn print_usage() {
    println!("ALICE-Quality simulator");
    println!("=======================");
    println!();
    println!("Usage:");
    println!("  alice-quality [--fps <list>] [--cycles <u32>] [--tier <auto|low|medium|high|ultra>]");
    println!("                [--target <u32>] [--triangles <u64>] [--draw-calls <u64>] [--config <file>]");
    println!();
    println!("Options:");
    println!("  --fps <list>         Comma-separated FPS samples, repeated to fill the run (default: 60)");
    println!("  --cycles <u32>       Number of evaluation cycles (default: 120)");
    println!("  --tier <name>        Starting preference, overrides the settings file");
    println!("  --target <u32>       Target FPS, overrides the settings file");
    println!("  --triangles <u64>    Triangle count reported by the simulated renderer");
    println!("  --draw-calls <u64>   Draw calls reported by the simulated renderer");
    println!("  --config <file>      Settings file (default: user config dir)");
}

#[derive(Debug)]
struct Args {
    fps: Vec<u32>,
    cycles: u32,
    tier: Option<QualityPreference>,
    target_fps: Option<u32>,
    triangles: Option<u64>,
    draw_calls: Option<u64>,
    config: Option<PathBuf>,
}

impl Default for Args {
    fn default() -> Self {
        Self {
            fps: vec![60],
            cycles: 120,
            tier: None,
            target_fps: None,
            triangles: None,
            draw_calls: None,
            config: None,
        }
    }
}

/// Returns `None` when usage was requested
fn parse_args(args: &[String]) -> Result<Option<Args>> {
    let mut parsed = Args::default();

    let mut i = 0;
    while i < args.len() {
        let flag = args[i].as_str();
        if flag == "-h" || flag == "--help" {
            return Ok(None);
        }
        let Some(value) = args.get(i + 1) else {
            bail!("Missing value for {}", flag);
        };
        match flag {
            "--fps" => {
                parsed.fps = value
                    .split(',')
                    .map(|s| s.trim().parse::<u32>())
                    .collect::<Result<Vec<u32>, _>>()
                    .with_context(|| format!("Invalid FPS list: {}", value))?;
            }
            "--cycles" => parsed.cycles = value.parse().context("Invalid --cycles")?,
            "--tier" => parsed.tier = Some(value.parse()?),
            "--target" => parsed.target_fps = Some(value.parse().context("Invalid --target")?),
            "--triangles" => parsed.triangles = Some(value.parse().context("Invalid --triangles")?),
            "--draw-calls" => parsed.draw_calls = Some(value.parse().context("Invalid --draw-calls")?),
            "--config" => parsed.config = Some(PathBuf::from(value)),
            other => bail!("Unknown option: {}", other),
        }
        i += 2;
    }

    Ok(Some(parsed))
}

fn load_settings(args: &Args) -> Result<QualitySettings> {
    let mut settings = match args.config.clone().or_else(QualitySettings::default_path) {
        Some(path) => QualitySettings::load_or_default(&path)?,
        None => QualitySettings::default(),
    };
    if let Some(tier) = args.tier {
        settings.quality = tier;
    }
    if let Some(target) = args.target_fps {
        settings.target_fps = target;
    }
    settings.validate()?;
    Ok(settings)
}

fn run(args: Args) -> Result<()> {
    let settings = load_settings(&args)?;
    let mut app = QualityApp::with_config(ViewerConfig {
        quality: settings,
        ..Default::default()
    })?;

    app.renderer_stats().publish(RendererStats {
        triangles: args.triangles,
        draw_calls: args.draw_calls,
        ..Default::default()
    });

    let cycle = Arc::new(Mutex::new(0u32));
    {
        let cycle = cycle.clone();
        app.controller_mut().on_quality_change(move |tier| {
            let at = cycle.lock().map(|c| *c).unwrap_or_default();
            tracing::info!(cycle = at, %tier, "Tier changed");
        });
    }

    for (i, fps) in args.fps.iter().cycle().take(args.cycles as usize).enumerate() {
        if let Ok(mut c) = cycle.lock() {
            *c = i as u32 + 1;
        }
        app.ingest_fps_sample(*fps);
    }

    let controller = app.controller();
    let metrics = controller.metrics();
    println!("Final tier:   {}", metrics.quality_tier);
    println!("Adaptive:     {}", controller.is_adaptive());
    println!(
        "Average FPS:  {:.1}",
        controller.average_fps().unwrap_or(metrics.fps as f64)
    );
    println!(
        "Score:        {} ({})",
        controller.performance_score(),
        controller.performance_grade()
    );
    println!("Pixel ratio:  {}", app.render_settings().pixel_ratio);
    println!("Shadow map:   {}", app.render_settings().profile.shadow_map_size);

    let tips = controller.optimization_tips();
    if !tips.is_empty() {
        println!();
        println!("Tips:");
        for tip in tips {
            println!("  - {}", tip);
        }
    }

    app.shutdown();
    Ok(())
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    tracing::info!("ALICE-Quality v{}", alice_quality::VERSION);

    let args: Vec<String> = std::env::args().skip(1).collect();
    match parse_args(&args)? {
        Some(args) => run(args),
        None => {
            print_usage();
            Ok(())
        }
    }
}
