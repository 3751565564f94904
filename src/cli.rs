use crate::config::{Config, load_config_with_theme};
use crate::layout::{LayoutEngine, LayoutResult};
use crate::layout_dump::{layout_dump_json, write_layout_dump};
use crate::render::{render_svg, write_output_svg};
use crate::tree::load_tree;
use anyhow::Result;
use clap::{Parser, ValueEnum};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "mmlayout", version, about = "Mind-map tree layout and renderer")]
pub struct Args {
    /// Input mind-map JSON file or '-' for stdin
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Output file. Defaults to stdout for SVG and JSON if omitted.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(short = 'e', long = "outputFormat", value_enum, default_value = "svg")]
    pub output_format: OutputFormat,

    /// Config JSON5 file (layout constants, palette, theme variables)
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,

    /// Theme preset, overrides the config file
    #[arg(long = "theme")]
    pub theme: Option<String>,

    /// Use the built-in width table instead of system fonts
    #[arg(long = "fast-text")]
    pub fast_text: bool,

    /// Outline subtree and children bounding rects
    #[arg(long = "debug")]
    pub debug: bool,

    /// Minimum canvas width
    #[arg(short = 'w', long = "width")]
    pub width: Option<f32>,

    /// Minimum canvas height
    #[arg(short = 'H', long = "height")]
    pub height: Option<f32>,

    /// Log layout progress to stderr
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Svg,
    Png,
    Json,
}

pub fn run() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);
    let config = resolve_config(&args)?;

    let input = read_input(args.input.as_deref())?;
    let tree = load_tree(&input)?;
    debug!(root = %tree.id, nodes = tree.len(), "tree loaded");

    let mut engine = LayoutEngine::from_config(&config);
    let result = engine.layout(tree)?;
    info!(
        corrections = result.corrections.len(),
        warnings = result.warnings.len(),
        "layout finished"
    );

    write_result(&result, &config, args.output_format, args.output.as_deref())
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn resolve_config(args: &Args) -> Result<Config> {
    let mut config = load_config_with_theme(args.config.as_deref(), args.theme.as_deref())?;
    if args.fast_text {
        config.layout.fast_text_metrics = true;
    }
    if args.debug {
        config.render.debug_overlay = true;
    }
    if let Some(width) = args.width {
        config.render.width = width;
    }
    if let Some(height) = args.height {
        config.render.height = height;
    }
    Ok(config)
}

fn write_result(
    result: &LayoutResult,
    config: &Config,
    format: OutputFormat,
    output: Option<&Path>,
) -> Result<()> {
    match format {
        OutputFormat::Svg => {
            let svg = render_svg(result, &config.theme, &config.layout, &config.render);
            write_output_svg(&svg, output)
        }
        OutputFormat::Json => match output {
            Some(path) => write_layout_dump(path, result),
            None => {
                println!("{}", layout_dump_json(result)?);
                Ok(())
            }
        },
        OutputFormat::Png => {
            let output = ensure_output(output, "png")?;
            let svg = render_svg(result, &config.theme, &config.layout, &config.render);
            write_png(&svg, &output, config)
        }
    }
}

#[cfg(feature = "png")]
fn write_png(svg: &str, output: &Path, config: &Config) -> Result<()> {
    crate::render::write_output_png(svg, output, &config.render, &config.theme)
}

#[cfg(not(feature = "png"))]
fn write_png(_svg: &str, _output: &Path, _config: &Config) -> Result<()> {
    Err(anyhow::anyhow!("PNG output requires the `png` feature"))
}

fn read_input(path: Option<&Path>) -> Result<String> {
    if let Some(path) = path {
        if path != Path::new("-") {
            return Ok(std::fs::read_to_string(path)?);
        }
    }
    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok(buf)
}

fn ensure_output(output: Option<&Path>, ext: &str) -> Result<PathBuf> {
    if let Some(path) = output {
        return Ok(path.to_path_buf());
    }
    Err(anyhow::anyhow!("Output path required for {} output", ext))
}
