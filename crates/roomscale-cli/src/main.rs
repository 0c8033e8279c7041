//! roomscale-cli: estimate room dimensions from a photo on the command line.
//!
//! Sends the photo to the inference service once and prints the labeled
//! estimates, optionally writing the annotated overlay as a standalone
//! SVG.
//!
//! # Usage
//!
//! ```text
//! GEMINI_API_KEY=... cargo run --bin roomscale-cli -- [OPTIONS] <IMAGE>
//! ```

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use roomscale_analysis::{Analysis, AnalysisResult, ImageMime, analyze};
use roomscale_client::{ClientConfig, DEFAULT_ENDPOINT, DEFAULT_MODEL, GeminiClient};
use roomscale_export::SvgMetadata;
use tracing_subscriber::EnvFilter;

/// Estimate room dimensions from a single photo.
///
/// The API key is read from `GEMINI_API_KEY`, falling back to `API_KEY`.
#[derive(Parser)]
#[command(name = "roomscale-cli", version)]
struct Cli {
    /// Path to the room photo (PNG, JPEG, WebP).
    image: PathBuf,

    /// Model identifier.
    #[arg(long, default_value = DEFAULT_MODEL)]
    model: String,

    /// API base URL up to and including the version segment.
    #[arg(long, default_value = DEFAULT_ENDPOINT)]
    endpoint: String,

    /// Print the result as JSON instead of a table.
    #[arg(long)]
    json: bool,

    /// Write the photo with its overlay to this SVG file.
    #[arg(long)]
    svg: Option<PathBuf>,
}

/// Format the dimension table printed by default.
fn report(analysis: &Analysis) -> String {
    if analysis.dimensions.is_empty() {
        return "No dimensions could be estimated from this photo.".to_owned();
    }
    let width = analysis
        .dimensions
        .iter()
        .map(|d| d.label.chars().count())
        .max()
        .unwrap_or(0);
    analysis
        .dimensions
        .iter()
        .map(|d| format!("{:<width$}  {}", d.label, d.estimate))
        .collect::<Vec<_>>()
        .join("\n")
}

/// The JSON shape printed with `--json`: the service's schema with the
/// sanitized overlay.
fn to_json(analysis: &Analysis) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&AnalysisResult {
        dimensions: analysis.dimensions.clone(),
        annotated_image_svg: analysis.overlay.as_str().to_owned(),
    })
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = ClientConfig::from_env()
        .with_model(cli.model)
        .with_endpoint(cli.endpoint);
    let client = match GeminiClient::new(&config) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let image_bytes = match std::fs::read(&cli.image) {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("Error reading {}: {e}", cli.image.display());
            return ExitCode::FAILURE;
        }
    };
    let name = cli
        .image
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mime = match ImageMime::detect(&name, &image_bytes) {
        Ok(mime) => mime,
        Err(e) => {
            eprintln!("{}: {e}", cli.image.display());
            return ExitCode::FAILURE;
        }
    };

    eprintln!(
        "Image: {} ({} bytes, {mime})",
        cli.image.display(),
        image_bytes.len(),
    );

    let analysis = match analyze(&client, &image_bytes, mime).await {
        Ok(analysis) => analysis,
        Err(e) => {
            eprintln!("Analysis failed: {e}");
            return ExitCode::FAILURE;
        }
    };
    if analysis.overlay.dropped() > 0 {
        eprintln!(
            "Removed {} unsupported element(s) or attribute(s) from the overlay",
            analysis.overlay.dropped()
        );
    }

    if cli.json {
        match to_json(&analysis) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("Error serializing result: {e}");
                return ExitCode::FAILURE;
            }
        }
    } else {
        println!("{}", report(&analysis));
    }

    if let Some(ref svg_path) = cli.svg {
        let title = cli.image.file_stem().and_then(|s| s.to_str());
        let metadata = SvgMetadata {
            title,
            description: None,
        };
        let svg = match roomscale_export::to_annotated_svg(&image_bytes, mime, &analysis, &metadata)
        {
            Ok(svg) => svg,
            Err(e) => {
                eprintln!("Error exporting SVG: {e}");
                return ExitCode::FAILURE;
            }
        };
        if let Err(e) = std::fs::write(svg_path, &svg) {
            eprintln!("Error writing {}: {e}", svg_path.display());
            return ExitCode::FAILURE;
        }
        eprintln!("SVG written to {} ({} bytes)", svg_path.display(), svg.len());
    }

    ExitCode::SUCCESS
}
