//! perceptualdiff CLI - perceptual image comparison for test suites.
//!
//! Compares two images under a model of human vision and reports whether
//! they are perceptually indistinguishable. The exit code follows Unix
//! tool convention (0 = pass, 1 = fail) so the binary can serve directly
//! as a visual-regression oracle in test automation.

use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{ColorChoice, Parser};
use colored::Colorize;
use perceptualdiff::{compare, CompareParams, Img};
use serde::Serialize;

/// Perceptual image comparison (Yee's metric)
///
/// Decides whether two equally-sized images are perceptually
/// indistinguishable: pixels are converted to CIE L*a*b* plus physical
/// luminance, run through a contrast-sensitivity and visual-masking model,
/// and counted against a failure threshold.
#[derive(Parser, Debug)]
#[command(name = "perceptualdiff")]
#[command(author, version, about, long_about = None)]
#[command(after_help = "EXAMPLES:
    Compare two rendered frames:
        perceptualdiff expected.png actual.png

    Stricter threshold for small images:
        perceptualdiff --threshold 10 expected.png actual.png

    Machine-readable output for test harnesses:
        perceptualdiff --json expected.png actual.png

EXIT CODES:
    0 - Images are identical or perceptually indistinguishable
    1 - Images are visibly different or dimensions do not match
    2 - Error (file not found, invalid image, etc.)")]
struct Cli {
    /// Reference image (expected output)
    #[arg(value_name = "REFERENCE")]
    reference: PathBuf,

    /// Test image (actual output)
    #[arg(value_name = "TEST")]
    test: PathBuf,

    /// Display gamma used to expand 8-bit channel values
    #[arg(long, default_value = "2.2")]
    gamma: f32,

    /// White-point luminance of the display in candelas per meter squared
    #[arg(long, default_value = "100.0", value_name = "CD_M2")]
    luminance: f32,

    /// Observer field of view in degrees
    #[arg(long = "fov", default_value = "45.0", value_name = "DEGREES")]
    field_of_view: f32,

    /// Number of visibly different pixels at which the comparison fails
    #[arg(long, short = 't', default_value = "100", value_name = "PIXELS")]
    threshold: u32,

    /// Print the effective configuration before comparing
    #[arg(long, short = 'v')]
    verbose: bool,

    /// Output JSON instead of the status lines
    #[arg(long)]
    json: bool,

    /// Control color output
    #[arg(long, value_enum, default_value = "auto")]
    color: ColorChoice,
}

#[derive(Serialize)]
struct JsonOutput<'a> {
    verdict: &'a str,
    status: String,
    failed_pixels: u32,
    width: u32,
    height: u32,
    params: JsonParams,
}

#[derive(Serialize)]
struct JsonParams {
    gamma: f32,
    luminance: f32,
    field_of_view: f32,
    threshold_pixels: u32,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    setup_colors(&cli);

    if cli.verbose {
        print_config(&cli);
    }

    let (img_a, dims) = match load_argb(&cli.reference) {
        Ok(v) => v,
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            return ExitCode::from(2);
        }
    };
    let (img_b, _) = match load_argb(&cli.test) {
        Ok(v) => v,
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            return ExitCode::from(2);
        }
    };

    let params = CompareParams::new()
        .with_gamma(cli.gamma)
        .with_luminance(cli.luminance)
        .with_field_of_view(cli.field_of_view)
        .with_threshold_pixels(cli.threshold);

    let status = compare(img_a.as_ref(), img_b.as_ref(), &params);

    if cli.json {
        let out = JsonOutput {
            verdict: if status.passed() { "pass" } else { "fail" },
            status: status.to_string(),
            failed_pixels: status.failed_pixels(),
            width: dims.0,
            height: dims.1,
            params: JsonParams {
                gamma: cli.gamma,
                luminance: cli.luminance,
                field_of_view: cli.field_of_view,
                threshold_pixels: cli.threshold,
            },
        };
        match serde_json::to_string_pretty(&out) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("{}: {}", "error".red().bold(), e);
                return ExitCode::from(2);
            }
        }
    } else {
        println!("{status}");
    }

    if status.passed() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    }
}

fn setup_colors(cli: &Cli) {
    match cli.color {
        ColorChoice::Always => colored::control::set_override(true),
        ColorChoice::Never => colored::control::set_override(false),
        ColorChoice::Auto => {
            if !io::stdout().is_terminal() {
                colored::control::set_override(false);
            }
        }
    }
}

fn print_config(cli: &Cli) {
    eprintln!("Field of view is {} degrees", cli.field_of_view);
    eprintln!("Threshold pixels is {} pixels", cli.threshold);
    eprintln!("The gamma is {}", cli.gamma);
    eprintln!(
        "The display's luminance is {} candela per meter squared",
        cli.luminance
    );
}

/// Loads an image and packs it into premultiplied ARGB, the pixel layout
/// the engine consumes.
fn load_argb(path: &Path) -> Result<(Img<Vec<u32>>, (u32, u32)), String> {
    let decoded = image::open(path)
        .map_err(|e| format!("failed to load '{}': {}", path.display(), e))?;
    let rgba = decoded.to_rgba8();
    let (width, height) = rgba.dimensions();

    let pixels: Vec<u32> = rgba
        .pixels()
        .map(|p| {
            let [r, g, b, a] = p.0;
            let a = u32::from(a);
            // cairo-style premultiplication with rounding
            let pm = |c: u8| (u32::from(c) * a + 127) / 255;
            (a << 24) | (pm(r) << 16) | (pm(g) << 8) | pm(b)
        })
        .collect();

    Ok((
        Img::new(pixels, width as usize, height as usize),
        (width, height),
    ))
}
