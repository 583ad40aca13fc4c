mod filters;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use kontur_canny::{sobel_preview, CannyPipeline};
use kontur_core::{CannyConfig, HysteresisMode, KonturError, PixelBuffer};
use kontur_gpu::{EffectKind, GpuContext, ShaderRenderer};

#[derive(Parser)]
#[command(
    name = "kontur",
    version,
    about = "Kontur — Canny edge detection with GPU preview effects",
    long_about = "Kontur finds edges in images with a five-stage CPU Canny pipeline\nand applies grayscale/edge/invert preview effects on the GPU when an\nadapter is available, falling back to CPU filters when it is not."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full Canny edge detection pipeline on an image
    Detect {
        /// Path to the input image
        #[arg()]
        input: PathBuf,

        /// Output file path (default: output/<name>_edges.png)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// JSON settings file used as the base configuration
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Low hysteresis threshold, 0-255 (default 50)
        #[arg(long)]
        low: Option<u8>,

        /// High hysteresis threshold, 0-255 (default 100)
        #[arg(long)]
        high: Option<u8>,

        /// Box blur radius in pixels, 0 disables the blur stage (default 2)
        #[arg(long)]
        blur_radius: Option<u32>,

        /// Hysteresis mode: single-pass or flood-fill (default single-pass)
        #[arg(long)]
        hysteresis: Option<String>,

        /// Write a JSON stats report to this path
        #[arg(long)]
        stats: Option<PathBuf>,
    },

    /// Produce a fast Sobel-only magnitude preview (no thresholds)
    Preview {
        /// Path to the input image
        #[arg()]
        input: PathBuf,

        /// Output file path (default: output/<name>_sobel.png)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Apply a single effect: GPU when available, CPU fallback otherwise
    Filter {
        /// Path to the input image
        #[arg()]
        input: PathBuf,

        /// Effect to apply: original, grayscale, edge, invert
        #[arg(short, long, default_value = "grayscale")]
        effect: String,

        /// Output file path (default: output/<name>_<effect>.png)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Skip the GPU and use the CPU filters directly
        #[arg(long)]
        cpu: bool,
    },

    /// Display version and pipeline info
    Info,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    match cli.command {
        Commands::Detect {
            input,
            output,
            config,
            low,
            high,
            blur_radius,
            hysteresis,
            stats,
        } => {
            let config =
                detect_config(config.as_deref(), low, high, blur_radius, hysteresis.as_deref())?;
            cmd_detect(input, output, config, stats)
        }
        Commands::Preview { input, output } => cmd_preview(input, output),
        Commands::Filter {
            input,
            effect,
            output,
            cpu,
        } => cmd_filter(input, &effect, output, cpu),
        Commands::Info => cmd_info(),
    }
}

#[derive(serde::Serialize)]
struct DetectStats {
    input: PathBuf,
    output: PathBuf,
    width: u32,
    height: u32,
    low_threshold: u8,
    high_threshold: u8,
    blur_radius: u32,
    hysteresis: String,
    edge_pixels: usize,
    edge_ratio_percent: f64,
    detect_ms: f64,
    total_ms: f64,
}

/// Resolve detect settings: config file (or defaults) overlaid with flags.
fn detect_config(
    file: Option<&Path>,
    low: Option<u8>,
    high: Option<u8>,
    blur_radius: Option<u32>,
    hysteresis: Option<&str>,
) -> Result<CannyConfig> {
    let mut config = match file {
        Some(path) => CannyConfig::load_from_file(path)
            .with_context(|| format!("failed to load config: {}", path.display()))?,
        None => CannyConfig::default(),
    };
    if let Some(low) = low {
        config.low_threshold = low;
    }
    if let Some(high) = high {
        config.high_threshold = high;
    }
    if let Some(radius) = blur_radius {
        config.blur_radius = radius;
    }
    if let Some(mode) = hysteresis {
        config.hysteresis = mode.parse::<HysteresisMode>()?;
    }
    Ok(config)
}

fn cmd_detect(
    input: PathBuf,
    output: Option<PathBuf>,
    config: CannyConfig,
    stats: Option<PathBuf>,
) -> Result<()> {
    let start = Instant::now();

    println!("🕸️  Kontur Edge Detector v{}", env!("CARGO_PKG_VERSION"));
    println!("   Source: {}", input.display());

    let load_start = Instant::now();
    let frame = load_image(&input)?;
    let load_time = load_start.elapsed();
    println!(
        "   ✓ Loaded {}x{} in {:.1}ms",
        frame.width,
        frame.height,
        load_time.as_secs_f64() * 1000.0
    );

    let pipeline = CannyPipeline::new(config)?;

    let detect_start = Instant::now();
    let edges = pipeline.run(&frame)?;
    let detect_time = detect_start.elapsed();
    println!(
        "   ✓ Detected edges in {:.1}ms (thresholds {}-{}, {} hysteresis)",
        detect_time.as_secs_f64() * 1000.0,
        config.low_threshold,
        config.high_threshold,
        config.hysteresis
    );

    let edge_pixels = edges.data.chunks_exact(4).filter(|px| px[0] == 255).count();
    let edge_ratio = edge_pixels as f64 / frame.pixel_count().max(1) as f64 * 100.0;
    println!(
        "   ✓ Edge pixels: {} of {} ({:.2}%)",
        edge_pixels,
        frame.pixel_count(),
        edge_ratio
    );

    let output_path = output.unwrap_or_else(|| default_output(&input, "edges"));
    let save_start = Instant::now();
    save_png(&edges, &output_path)?;
    let save_time = save_start.elapsed();
    println!(
        "   ✓ Saved in {:.1}ms",
        save_time.as_secs_f64() * 1000.0
    );

    let total = start.elapsed();
    println!();
    println!(
        "   ⚡ Total: {:.2}s (load: {:.0}ms → detect: {:.0}ms → save: {:.0}ms)",
        total.as_secs_f64(),
        load_time.as_secs_f64() * 1000.0,
        detect_time.as_secs_f64() * 1000.0,
        save_time.as_secs_f64() * 1000.0,
    );
    println!("   📦 Output: {}", output_path.display());

    if let Some(stats_path) = stats {
        let report = DetectStats {
            input,
            output: output_path,
            width: frame.width,
            height: frame.height,
            low_threshold: config.low_threshold,
            high_threshold: config.high_threshold,
            blur_radius: config.blur_radius,
            hysteresis: config.hysteresis.to_string(),
            edge_pixels,
            edge_ratio_percent: edge_ratio,
            detect_ms: detect_time.as_secs_f64() * 1000.0,
            total_ms: total.as_secs_f64() * 1000.0,
        };
        let json = serde_json::to_string_pretty(&report)?;
        if let Some(parent) = stats_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(&stats_path, json)
            .with_context(|| format!("failed to write stats report: {}", stats_path.display()))?;
        println!("   🧾 Stats: {}", stats_path.display());
    }

    Ok(())
}

fn cmd_preview(input: PathBuf, output: Option<PathBuf>) -> Result<()> {
    let start = Instant::now();

    println!("🕸️  Kontur Sobel Preview");
    println!("   Source: {}", input.display());

    let frame = load_image(&input)?;
    println!("   ✓ Loaded {}x{}", frame.width, frame.height);

    let preview_start = Instant::now();
    let preview = sobel_preview(&frame);
    println!(
        "   ✓ Sobel magnitude computed in {:.1}ms",
        preview_start.elapsed().as_secs_f64() * 1000.0
    );

    let output_path = output.unwrap_or_else(|| default_output(&input, "sobel"));
    save_png(&preview, &output_path)?;

    println!();
    println!("   ⚡ Total: {:.2}s", start.elapsed().as_secs_f64());
    println!("   📦 Output: {}", output_path.display());
    Ok(())
}

fn cmd_filter(input: PathBuf, effect: &str, output: Option<PathBuf>, cpu: bool) -> Result<()> {
    let start = Instant::now();
    let effect: EffectKind = effect.parse()?;

    println!("🎛️  Kontur Filter ({})", effect);
    println!("   Source: {}", input.display());

    let frame = load_image(&input)?;
    println!("   ✓ Loaded {}x{}", frame.width, frame.height);

    // The renderer treats `original` as clear-only; for file output the
    // passthrough is the image itself.
    let filtered = if effect == EffectKind::Original {
        frame.clone()
    } else if cpu {
        println!("   ✓ CPU filters (requested with --cpu)");
        filters::apply_cpu(&frame, effect)
    } else {
        match render_on_gpu(&frame, effect) {
            Ok(out) => out,
            Err(e @ (KonturError::DeviceUnavailable(_) | KonturError::ShaderCompile { .. })) => {
                tracing::warn!("GPU filter path unavailable: {}", e);
                println!("   ⚠️  GPU path failed ({}), falling back to CPU", e);
                filters::apply_cpu(&frame, effect)
            }
            Err(e) => return Err(e.into()),
        }
    };

    let output_path = output.unwrap_or_else(|| default_output(&input, effect.label()));
    save_png(&filtered, &output_path)?;

    println!();
    println!("   ⚡ Total: {:.2}s", start.elapsed().as_secs_f64());
    println!("   📦 Output: {}", output_path.display());
    Ok(())
}

fn render_on_gpu(frame: &PixelBuffer, effect: EffectKind) -> Result<PixelBuffer, KonturError> {
    let gpu_start = Instant::now();
    let gpu = Arc::new(GpuContext::init()?);
    let mut renderer = ShaderRenderer::new(gpu, frame.width, frame.height)?;
    let compiled = renderer.compile_effects()?;
    println!(
        "   ✓ GPU ready in {:.1}ms ({} effect programs)",
        gpu_start.elapsed().as_secs_f64() * 1000.0,
        compiled.len()
    );

    if !compiled.contains(&effect) {
        return Err(KonturError::shader_compile(
            effect.label(),
            "program missing from compiled set",
        ));
    }

    renderer.load_texture(frame)?;
    renderer.render(effect)?;
    let out = renderer.read_back()?;
    renderer.dispose();
    Ok(out)
}

fn cmd_info() -> Result<()> {
    println!("🕸️  Kontur Edge Detector");
    println!("   Version:   {}", env!("CARGO_PKG_VERSION"));
    println!("   Pipeline:  box blur → luma → Sobel → non-maximum suppression → hysteresis");
    println!("   Preview:   Sobel-only, magnitude normalized to full range");
    match GpuContext::init() {
        Ok(ctx) => {
            let info = ctx.adapter.get_info();
            println!("   GPU:       {} ({:?}) ✓", info.name, info.backend);
        }
        Err(_) => println!("   GPU:       not available (CPU filters only) ✗"),
    }
    println!();
    println!("   Repository: https://github.com/kontur-dev/kontur");
    Ok(())
}

fn load_image(path: &Path) -> Result<PixelBuffer> {
    let img = image::open(path).map_err(|e| {
        KonturError::asset(
            format!("failed to load image '{}': {}", path.display(), e),
            path,
        )
    })?;
    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();
    Ok(PixelBuffer::from_raw(width, height, rgba.into_raw())?)
}

fn save_png(frame: &PixelBuffer, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create output dir: {}", parent.display()))?;
        }
    }
    let img = image::RgbaImage::from_raw(frame.width, frame.height, frame.data.clone())
        .ok_or_else(|| anyhow::anyhow!("frame dimensions do not match pixel data"))?;
    img.save(path)
        .with_context(|| format!("failed to write image: {}", path.display()))?;
    Ok(())
}

fn default_output(input: &Path, suffix: &str) -> PathBuf {
    let stem = input.file_stem().unwrap_or_default().to_string_lossy();
    PathBuf::from(format!("output/{}_{}.png", stem, suffix))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_detect_args_parse() {
        let cli = Cli::parse_from([
            "kontur",
            "detect",
            "photo.png",
            "--low",
            "20",
            "--high",
            "60",
            "--hysteresis",
            "flood-fill",
        ]);
        match cli.command {
            Commands::Detect {
                input,
                low,
                high,
                blur_radius,
                hysteresis,
                ..
            } => {
                assert_eq!(input, PathBuf::from("photo.png"));
                assert_eq!((low, high), (Some(20), Some(60)));
                assert_eq!(blur_radius, None);
                assert_eq!(hysteresis.as_deref(), Some("flood-fill"));
            }
            _ => panic!("expected detect subcommand"),
        }
    }

    #[test]
    fn test_detect_config_defaults_and_overrides() {
        let config = detect_config(None, None, None, None, None).unwrap();
        assert_eq!(config, CannyConfig::default());

        let config = detect_config(None, Some(20), None, Some(0), Some("flood-fill")).unwrap();
        assert_eq!(config.low_threshold, 20);
        assert_eq!(config.high_threshold, 100);
        assert_eq!(config.blur_radius, 0);
        assert_eq!(config.hysteresis, HysteresisMode::FloodFill);

        assert!(detect_config(None, None, None, None, Some("both")).is_err());
    }

    #[test]
    fn test_detect_config_file_overlaid_with_flags() {
        let dir = std::env::temp_dir();
        let path = dir.join(format!("kontur_cli_config_{}.json", std::process::id()));
        std::fs::write(&path, r#"{ "low_threshold": 10, "high_threshold": 40 }"#).unwrap();

        let config = detect_config(Some(&path), None, Some(80), None, None).unwrap();
        assert_eq!(config.low_threshold, 10);
        assert_eq!(config.high_threshold, 80);

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_default_output_naming() {
        let out = default_output(Path::new("shots/cat.jpeg"), "edges");
        assert_eq!(out, PathBuf::from("output/cat_edges.png"));
    }
}
