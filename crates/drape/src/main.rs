//! drape: render garment/print composites from the command line.
//!
//! # Usage
//!
//! ```text
//! drape composite tee.png --print logo.png \
//!     --mask '{"x":0.3,"y":0.2,"width":0.4,"height":0.3,"rotation":0}' \
//!     --aspect 4:5 --color '#1a1a1a' --blend multiply -o preview.png
//!
//! drape export catalogue.json --out-dir exports/
//! ```
//!
//! Logging goes to stderr; set `RUST_LOG` or pass `-v` / `-vv` for more.

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{ArgAction, Args, Parser, Subcommand};
use drape_core::{CompositeOptions, Dimensions, Mask};
use drape_export::ManifestFile;
use tracing_subscriber::EnvFilter;

/// Place prints on garment photos and render faithful composites.
#[derive(Parser)]
#[command(name = "drape", version)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace). `RUST_LOG` wins.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render one composite to a PNG file.
    Composite(CompositeArgs),
    /// Render every garment side / print combination of a manifest.
    Export(ExportArgs),
}

#[derive(Args)]
struct CompositeArgs {
    /// Garment photo (PNG, JPEG, BMP, WebP).
    garment: PathBuf,

    /// Print/logo image. Ignored without `--mask`.
    #[arg(long)]
    print: Option<PathBuf>,

    /// Normalized mask as JSON: `{x, y, width, height, rotation, skewX?, skewY?}`.
    #[arg(long, value_name = "JSON")]
    mask: Option<String>,

    /// Size the mask was authored against, as "WxH". Defaults to the
    /// garment image's own size.
    #[arg(long, value_name = "WxH", value_parser = parse_size)]
    size: Option<Dimensions>,

    /// Output PNG path.
    #[arg(short, long)]
    output: PathBuf,

    #[command(flatten)]
    options: OptionArgs,
}

#[derive(Args)]
struct ExportArgs {
    /// Export manifest (JSON). Relative image paths resolve against its
    /// directory.
    manifest: PathBuf,

    /// Directory the PNGs are written into (created if missing).
    #[arg(long, default_value = "drape-export")]
    out_dir: PathBuf,

    #[command(flatten)]
    options: OptionArgs,
}

#[derive(Args)]
struct OptionArgs {
    /// Canvas aspect ratio: "original" or "W:H".
    #[arg(long, default_value = "original")]
    aspect: String,

    /// Recolor the garment towards this hex color (e.g. "#1a1a1a").
    #[arg(long, value_name = "HEX")]
    color: Option<String>,

    /// Blend mode for the print (canvas composite operation name).
    #[arg(long, default_value = "normal")]
    blend: String,

    /// Full composite options as a JSON string.
    ///
    /// When provided, `--aspect`, `--color` and `--blend` are ignored.
    /// The JSON must be a valid `CompositeOptions` serialization.
    #[arg(long, value_name = "JSON")]
    options_json: Option<String>,
}

impl OptionArgs {
    fn resolve(&self) -> Result<CompositeOptions, String> {
        if let Some(ref json) = self.options_json {
            return serde_json::from_str(json)
                .map_err(|e| format!("Error parsing --options-json: {e}"));
        }
        CompositeOptions::from_tokens(&self.aspect, self.color.as_deref(), &self.blend)
            .map_err(|e| e.to_string())
    }
}

fn parse_size(s: &str) -> Result<Dimensions, String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("size must be 'WxH', got: '{s}'"))?;
    let width = w
        .trim()
        .parse()
        .map_err(|e| format!("invalid width '{w}': {e}"))?;
    let height = h
        .trim()
        .parse()
        .map_err(|e| format!("invalid height '{h}': {e}"))?;
    Ok(Dimensions { width, height })
}

/// `error: cause: cause`, for one-line stderr reports.
struct Chain<'a>(&'a dyn std::error::Error);

impl fmt::Display for Chain<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)?;
        let mut source = self.0.source();
        while let Some(cause) = source {
            write!(f, ": {cause}")?;
            source = cause.source();
        }
        Ok(())
    }
}

fn read(path: &Path) -> Result<Vec<u8>, String> {
    std::fs::read(path).map_err(|e| format!("Error reading {}: {e}", path.display()))
}

fn run_composite(args: &CompositeArgs) -> Result<(), String> {
    let options = args.options.resolve()?;
    let mask: Option<Mask> = args
        .mask
        .as_deref()
        .map(serde_json::from_str)
        .transpose()
        .map_err(|e| format!("Error parsing --mask: {e}"))?;

    let garment = read(&args.garment)?;
    let print = match (&args.print, &mask) {
        (Some(path), Some(_)) => Some(read(path)?),
        (Some(path), None) => {
            tracing::warn!(print = %path.display(), "no --mask given, print is ignored");
            None
        }
        _ => None,
    };
    let size = match args.size {
        Some(size) => size,
        None => drape_core::decode::read_dimensions(&garment)
            .map_err(|e| format!("Error reading garment size: {}", Chain(&e)))?,
    };

    let png = drape_core::composite(
        &garment,
        print.as_deref(),
        mask.as_ref(),
        size,
        &options,
    )
    .map_err(|e| Chain(&e).to_string())?;

    std::fs::write(&args.output, &png)
        .map_err(|e| format!("Error writing {}: {e}", args.output.display()))?;
    tracing::info!(
        output = %args.output.display(),
        bytes = png.len(),
        width = size.width,
        height = size.height,
        "composite written"
    );
    Ok(())
}

fn run_export(args: &ExportArgs) -> Result<ExitCode, String> {
    let options = args.options.resolve()?;
    let json = std::fs::read_to_string(&args.manifest)
        .map_err(|e| format!("Error reading {}: {e}", args.manifest.display()))?;
    let base = args.manifest.parent().unwrap_or_else(|| Path::new("."));
    let manifest = ManifestFile::from_json(&json)
        .and_then(|m| m.resolve(base, |path| std::fs::read(path)))
        .map_err(|e| Chain(&e).to_string())?;

    let report = drape_export::export_batch(&manifest, &options);

    std::fs::create_dir_all(&args.out_dir)
        .map_err(|e| format!("Error creating {}: {e}", args.out_dir.display()))?;
    for image in &report.rendered {
        let path = args.out_dir.join(&image.file_name);
        std::fs::write(&path, &image.png)
            .map_err(|e| format!("Error writing {}: {e}", path.display()))?;
    }

    println!(
        "{} rendered, {} skipped -> {}",
        report.rendered.len(),
        report.skipped.len(),
        args.out_dir.display()
    );
    for skipped in &report.skipped {
        eprintln!("skipped {}: {}", skipped.file_name, skipped.reason);
    }

    // Partial exports still succeed; an export that rendered nothing
    // while something failed does not.
    if report.rendered.is_empty() && !report.skipped.is_empty() {
        Ok(ExitCode::FAILURE)
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match &cli.command {
        Command::Composite(args) => run_composite(args).map(|()| ExitCode::SUCCESS),
        Command::Export(args) => run_export(args),
    };

    match result {
        Ok(code) => code,
        Err(msg) => {
            eprintln!("{msg}");
            ExitCode::FAILURE
        }
    }
}
