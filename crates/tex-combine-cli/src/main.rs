use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::Context;
use clap::{ArgAction, Parser, Subcommand};
use globset::{Glob, GlobSet, GlobSetBuilder};
use image::{DynamicImage, ImageFormat, ImageReader};
use serde::{Deserialize, Serialize};
use tex_combine_core::pipeline::{PreparedSprite, atlas_frames, find_aliases};
use tex_combine_core::{
    AtlasFrame, BleedAlgorithm, BleedStats, CombineConfig, InputSprite, LayoutStats,
    LayoutStrategy, MaxRectsHeuristic, combine_sprites, pack_layout,
};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

#[derive(Parser, Debug)]
#[command(
    name = "tex-combine",
    about = "Combine sprites into one atlas with alpha-bleed repair",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Show progress bars (disable with --no-progress or --quiet)
    #[arg(long, default_value_t = true, action=ArgAction::Set, global=true, help_heading = "Logging/UX")]
    progress: bool,
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action=ArgAction::Count, global=true, help_heading = "Logging/UX")]
    verbose: u8,
    /// Quiet mode (overrides verbose)
    #[arg(
        short,
        long,
        default_value_t = false,
        global = true,
        help_heading = "Logging/UX"
    )]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Lay out, draw and bleed sprites; writes the atlas, its colour map and JSON metadata
    Combine(CombineArgs),
    /// Layout only: compute placements and write JSON (no PNGs)
    Layout(CombineArgs),
}

#[derive(Parser, Debug, Clone)]
struct CombineArgs {
    // Input/Output
    /// Input file or directory
    #[arg(help_heading = "Input/Output")]
    input: PathBuf,
    /// Output directory
    #[arg(short, long, default_value = "out", help_heading = "Input/Output")]
    out_dir: PathBuf,
    /// Atlas base name (files will be name.png / name_color_map.png / name.json)
    #[arg(short, long, default_value = "atlas", help_heading = "Input/Output")]
    name: String,
    /// YAML config file path (overrides the options below)
    #[arg(long, help_heading = "Input/Output")]
    config: Option<PathBuf>,
    /// Include patterns (glob). If set, only files matching any pattern are considered
    #[arg(long, help_heading = "Input/Output")]
    include: Vec<String>,
    /// Exclude patterns (glob). Files matching any pattern will be ignored
    #[arg(long, help_heading = "Input/Output")]
    exclude: Vec<String>,

    // Layout
    /// Canvas width
    #[arg(long, default_value_t = 1024, help_heading = "Layout")]
    width: u32,
    /// Canvas height
    #[arg(long, default_value_t = 1024, help_heading = "Layout")]
    height: u32,
    /// Pixels kept free around every sprite (also the bleed region padding)
    #[arg(long, default_value_t = 4, help_heading = "Layout")]
    margin: u32,
    /// Layout strategy: maxrects | simple-row
    #[arg(long, default_value = "maxrects", help_heading = "Layout")]
    layout: String,
    /// Pin one MaxRects heuristic: bssf|blsf|baf|bl (default: try all, keep the best)
    #[arg(long, help_heading = "Layout")]
    heuristic: Option<String>,

    // Image Processing
    /// Alpha bleed: none | nearest | weighted | gaussian
    #[arg(long, default_value = "gaussian", help_heading = "Image Processing")]
    algorithm: String,
    /// Trim transparent borders before layout
    #[arg(long, default_value_t = false, help_heading = "Image Processing")]
    trim: bool,
    /// Spread work over threads (requires core feature `parallel`)
    #[arg(long, default_value_t = true, action=ArgAction::Set, help_heading = "Image Processing")]
    parallel: bool,

    // Export
    /// Print the merged configuration (after CLI/YAML) and exit
    #[arg(long, default_value_t = false, help_heading = "Export")]
    print_config: bool,
    /// Output format for --print-config: json|yaml
    #[arg(long, default_value = "json", value_parser = ["json", "yaml"], help_heading = "Export")]
    print_config_format: String,
    /// Dry run: compute everything but do not write files
    #[arg(long, default_value_t = false, help_heading = "Export")]
    dry_run: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing_with_level(cli.quiet, cli.verbose);
    let progress = cli.progress && !cli.quiet;
    match &cli.command {
        Commands::Combine(args) => run_combine(args, progress),
        Commands::Layout(args) => run_layout(args, progress),
    }
}

fn run_combine(args: &CombineArgs, show_progress: bool) -> anyhow::Result<()> {
    let cfg = build_config(args)?;
    if args.print_config {
        return print_config(&cfg, &args.print_config_format);
    }

    let paths = gather_paths(&args.input, &args.include, &args.exclude)?;
    let inputs = load_images_with_progress(&args.input, &paths, show_progress)?;
    info!(count = inputs.len(), "loaded input images");

    let t0 = Instant::now();
    let out = combine_sprites(inputs, &cfg)?;
    info!(
        elapsed_ms = t0.elapsed().as_millis() as u64,
        "{}",
        out.layout_stats.summary()
    );
    info!(
        resolved = out.bleed_stats.resolved,
        unresolved = out.bleed_stats.unresolved,
        passes = out.bleed_stats.max_passes,
        "alpha bleed"
    );
    for key in &out.dropped {
        warn!(key = %key, "sprite did not fit the canvas");
    }

    if args.dry_run {
        info!("dry run: no files written");
        return Ok(());
    }
    fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("create out_dir {}", args.out_dir.display()))?;

    let png_name = format!("{}.png", args.name);
    let color_map_name = format!("{}_color_map.png", args.name);
    let png_path = args.out_dir.join(&png_name);
    out.atlas
        .save(&png_path)
        .with_context(|| format!("write {}", png_path.display()))?;
    let color_map_path = args.out_dir.join(&color_map_name);
    out.color_map
        .save(&color_map_path)
        .with_context(|| format!("write {}", color_map_path.display()))?;

    let meta = AtlasMeta {
        image: png_name,
        color_map: Some(color_map_name),
        size: (cfg.canvas_width, cfg.canvas_height),
        margin: cfg.margin,
        heuristic: out.heuristic.map(|h| h.to_string()),
        frames: out.frames,
        dropped: out.dropped,
        layout: out.layout_stats,
        bleed: Some(out.bleed_stats),
    };
    let json_path = write_meta(&args.out_dir, &args.name, &meta)?;
    info!(?png_path, ?color_map_path, ?json_path, "atlas written");
    Ok(())
}

fn run_layout(args: &CombineArgs, show_progress: bool) -> anyhow::Result<()> {
    let cfg = build_config(args)?;
    if args.print_config {
        return print_config(&cfg, &args.print_config_format);
    }

    let paths = gather_paths(&args.input, &args.include, &args.exclude)?;
    let inputs = load_images_with_progress(&args.input, &paths, show_progress)?;
    info!(count = inputs.len(), "loaded input images");

    let order: Vec<String> = inputs.iter().map(|inp| inp.key.clone()).collect();
    let prepared: HashMap<String, PreparedSprite> = inputs
        .iter()
        .map(|inp| (inp.key.clone(), PreparedSprite::new(&inp.image, cfg.trim)))
        .collect();
    let aliases = find_aliases(&order, &prepared);
    let sizes: Vec<(String, u32, u32)> = order
        .iter()
        .filter(|k| !aliases.contains_key(*k))
        .filter_map(|k| prepared.get(k).map(|p| (k.clone(), p.source.w, p.source.h)))
        .collect();
    let layout = pack_layout(sizes, &cfg)?;
    info!(aliases = aliases.len(), "{}", layout.stats.summary());
    let (frames, dropped) = atlas_frames(&layout, &order, &prepared, &aliases);

    if args.dry_run {
        info!("dry run: no files written");
        return Ok(());
    }
    fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("create out_dir {}", args.out_dir.display()))?;
    let meta = AtlasMeta {
        image: format!("{}.png", args.name),
        color_map: None,
        size: layout.canvas,
        margin: layout.margin,
        heuristic: layout.heuristic.map(|h| h.to_string()),
        frames,
        dropped,
        layout: layout.stats,
        bleed: None,
    };
    let json_path = write_meta(&args.out_dir, &args.name, &meta)?;
    info!(?json_path, "layout written (layout-only)");
    Ok(())
}

/// JSON written next to the atlas.
#[derive(Serialize)]
struct AtlasMeta {
    image: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    color_map: Option<String>,
    size: (u32, u32),
    margin: u32,
    heuristic: Option<String>,
    frames: Vec<AtlasFrame>,
    dropped: Vec<String>,
    layout: LayoutStats,
    #[serde(skip_serializing_if = "Option::is_none")]
    bleed: Option<BleedStats>,
}

fn write_meta(out_dir: &Path, name: &str, meta: &AtlasMeta) -> anyhow::Result<PathBuf> {
    let json_path = out_dir.join(format!("{}.json", name));
    let json = serde_json::to_string_pretty(meta)?;
    fs::write(&json_path, json).with_context(|| format!("write {}", json_path.display()))?;
    Ok(json_path)
}

fn print_config(cfg: &CombineConfig, format: &str) -> anyhow::Result<()> {
    match format {
        "yaml" => println!("{}", serde_yaml::to_string(cfg)?),
        _ => println!("{}", serde_json::to_string_pretty(cfg)?),
    }
    Ok(())
}

/// CLI flags first, then the YAML file (if any) on top, then validation.
fn build_config(args: &CombineArgs) -> anyhow::Result<CombineConfig> {
    let mr_heuristic = args
        .heuristic
        .as_deref()
        .map(str::parse::<MaxRectsHeuristic>)
        .transpose()?;
    let mut cfg = CombineConfig::builder()
        .with_canvas(args.width, args.height)
        .margin(args.margin)
        .layout_strategy(args.layout.parse::<LayoutStrategy>()?)
        .mr_heuristic(mr_heuristic)
        .bleed_algorithm(args.algorithm.parse::<BleedAlgorithm>()?)
        .trim(args.trim)
        .parallel(args.parallel)
        .build();

    if let Some(path) = &args.config {
        let file =
            fs::read_to_string(path).with_context(|| format!("read config {}", path.display()))?;
        let y: YamlConfig = serde_yaml::from_str(&file)
            .with_context(|| format!("parse config {}", path.display()))?;
        cfg = y.apply(cfg)?;
    }
    cfg.validate()?;
    Ok(cfg)
}

/// Every field optional; present fields override the CLI values.
#[derive(Debug, Default, Deserialize)]
struct YamlConfig {
    canvas_width: Option<u32>,
    canvas_height: Option<u32>,
    margin: Option<u32>,
    bleed_algorithm: Option<String>,
    layout_strategy: Option<String>,
    mr_heuristic: Option<String>,
    trim: Option<bool>,
    parallel: Option<bool>,
}

impl YamlConfig {
    fn apply(self, mut cfg: CombineConfig) -> anyhow::Result<CombineConfig> {
        if let Some(v) = self.canvas_width {
            cfg.canvas_width = v;
        }
        if let Some(v) = self.canvas_height {
            cfg.canvas_height = v;
        }
        if let Some(v) = self.margin {
            cfg.margin = v;
        }
        if let Some(v) = self.bleed_algorithm {
            cfg.bleed_algorithm = v.parse()?;
        }
        if let Some(v) = self.layout_strategy {
            cfg.layout_strategy = v.parse()?;
        }
        if let Some(v) = self.mr_heuristic {
            cfg.mr_heuristic = match v.as_str() {
                "auto" | "all" => None,
                other => Some(other.parse()?),
            };
        }
        if let Some(v) = self.trim {
            cfg.trim = v;
        }
        if let Some(v) = self.parallel {
            cfg.parallel = v;
        }
        Ok(cfg)
    }
}

fn gather_paths(
    path: &Path,
    include: &[String],
    exclude: &[String],
) -> anyhow::Result<Vec<PathBuf>> {
    let inc_set = build_globset(include)?;
    let exc_set = build_globset(exclude)?;
    let mut list: Vec<PathBuf> = Vec::new();
    if path.is_file() {
        if !should_skip(path, inc_set.as_ref(), exc_set.as_ref()) && is_image(path) {
            list.push(path.to_path_buf());
        }
    } else {
        for entry in WalkDir::new(path)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let p = entry.path();
            if p.is_file() && !should_skip(p, inc_set.as_ref(), exc_set.as_ref()) && is_image(p) {
                list.push(p.to_path_buf());
            }
        }
    }
    Ok(list)
}

fn build_globset(patterns: &[String]) -> anyhow::Result<Option<GlobSet>> {
    if patterns.is_empty() {
        return Ok(None);
    }
    let mut b = GlobSetBuilder::new();
    for pat in patterns {
        b.add(Glob::new(pat).with_context(|| format!("bad glob {pat}"))?);
    }
    Ok(Some(b.build()?))
}

fn should_skip(p: &Path, include: Option<&GlobSet>, exclude: Option<&GlobSet>) -> bool {
    let s = p.to_string_lossy().replace('\\', "/");
    if exclude.is_some_and(|ex| ex.is_match(&s)) {
        return true;
    }
    include.is_some_and(|inc| !inc.is_match(&s))
}

/// Files whose extension maps to a format this build of `image` can decode.
fn is_image(p: &Path) -> bool {
    ImageFormat::from_path(p).is_ok_and(|f| f.reading_enabled())
}

/// Sprite key: path relative to `root` without extension, `/`-separated.
/// A single input file is keyed by its stem.
fn sprite_key(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    let rel = if rel.as_os_str().is_empty() {
        Path::new(path.file_name().unwrap_or_default())
    } else {
        rel
    };
    rel.with_extension("").to_string_lossy().replace('\\', "/")
}

fn load_images_with_progress(
    root: &Path,
    paths: &[PathBuf],
    progress: bool,
) -> anyhow::Result<Vec<InputSprite>> {
    use indicatif::{ProgressBar, ProgressStyle};
    let bar = if progress {
        let b = ProgressBar::new(paths.len() as u64);
        b.set_style(ProgressStyle::with_template(
            "{spinner:.green} loading {pos}/{len} [{elapsed_precise}] {wide_msg}",
        )?);
        Some(b)
    } else {
        None
    };
    let mut list = Vec::with_capacity(paths.len());
    for p in paths {
        let msg = p.file_name().and_then(|s| s.to_str()).unwrap_or("");
        if let Some(b) = &bar {
            b.set_message(msg.to_string());
        }
        match load_image(p) {
            Ok(image) => list.push(InputSprite {
                key: sprite_key(root, p),
                image,
            }),
            Err(e) => {
                error!(?p, error = %e, "skip image");
            }
        }
        if let Some(b) = &bar {
            b.inc(1);
        }
    }
    if let Some(b) = &bar {
        b.finish_and_clear();
    }
    Ok(list)
}

fn load_image(p: &Path) -> anyhow::Result<DynamicImage> {
    let img = ImageReader::open(p)?.with_guessed_format()?.decode()?;
    Ok(img)
}

/// `RUST_LOG` wins unless `-v` or `--quiet` was given.
fn init_tracing_with_level(quiet: bool, verbose: u8) {
    let level = match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "info",
        (false, 1) => "debug",
        _ => "trace",
    };
    let filter = match EnvFilter::try_from_default_env() {
        Ok(env) if !quiet && verbose == 0 => env,
        _ => EnvFilter::new(level),
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_relative_stems() {
        let root = Path::new("assets/sprites");
        assert_eq!(sprite_key(root, Path::new("assets/sprites/hero.png")), "hero");
        assert_eq!(
            sprite_key(root, Path::new("assets/sprites/ui/button.v2.png")),
            "ui/button.v2"
        );
        let single = Path::new("assets/sprites/hero.png");
        assert_eq!(sprite_key(single, single), "hero");
    }

    #[test]
    fn yaml_overrides_cli_values() {
        let base = CombineConfig::default();
        let y: YamlConfig =
            serde_yaml::from_str("margin: 1\nbleed_algorithm: nearest\nmr_heuristic: bl\n")
                .expect("yaml");
        let cfg = y.apply(base).expect("apply");
        assert_eq!(cfg.margin, 1);
        assert_eq!(cfg.bleed_algorithm, BleedAlgorithm::Nearest);
        assert_eq!(cfg.mr_heuristic, Some(MaxRectsHeuristic::BottomLeft));
        assert_eq!(cfg.canvas_width, 1024);
    }

    #[test]
    fn unknown_selectors_fail_fast() {
        let y: YamlConfig = serde_yaml::from_str("bleed_algorithm: blur\n").expect("yaml");
        assert!(y.apply(CombineConfig::default()).is_err());
    }

    #[test]
    fn only_image_extensions_are_collected() {
        assert!(is_image(Path::new("a/b.PNG")));
        assert!(is_image(Path::new("a/b.jpeg")));
        assert!(!is_image(Path::new("a/b.txt")));
        assert!(!is_image(Path::new("a/b")));
        assert!(!is_image(Path::new("a/b.psd")));
    }
}
