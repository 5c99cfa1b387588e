use std::path::PathBuf;
use std::process;

use anyhow::{bail, Context, Result};
use carvekit::{init_logging, CarveConfig, ReliefCarver, VERSION};
use tracing::info;

struct CliArgs {
    input: PathBuf,
    output: PathBuf,
    config: Option<PathBuf>,
    save_compensated: bool,
}

fn print_usage() {
    eprintln!("carvekit {}", VERSION);
    eprintln!("Usage: carvekit <image> [-o <output.nc>] [-c <config.toml|json>] [--save-compensated]");
}

fn parse_args() -> Result<CliArgs> {
    let mut input = None;
    let mut output = None;
    let mut config = None;
    let mut save_compensated = false;

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-o" | "--output" => {
                output = Some(PathBuf::from(
                    args.next().context("missing value for -o")?,
                ));
            }
            "-c" | "--config" => {
                config = Some(PathBuf::from(
                    args.next().context("missing value for -c")?,
                ));
            }
            "--save-compensated" => save_compensated = true,
            "-h" | "--help" => {
                print_usage();
                process::exit(0);
            }
            other if !other.starts_with('-') && input.is_none() => {
                input = Some(PathBuf::from(other));
            }
            other => bail!("unexpected argument: {}", other),
        }
    }

    let input: PathBuf = input.context("no input image given")?;
    let output = output.unwrap_or_else(|| input.with_extension("nc"));
    Ok(CliArgs {
        input,
        output,
        config,
        save_compensated,
    })
}

fn main() -> Result<()> {
    init_logging()?;

    let args = match parse_args() {
        Ok(args) => args,
        Err(e) => {
            print_usage();
            return Err(e);
        }
    };

    let config = match &args.config {
        Some(path) => CarveConfig::load_from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => CarveConfig::load_default().context("loading default config")?,
    };
    config.validate()?;

    let carver = ReliefCarver::from_file(&args.input, config)
        .with_context(|| format!("processing {}", args.input.display()))?;

    let (width_mm, height_mm) = carver.output_size_mm();
    info!(
        "generating toolpath for {:.1}mm x {:.1}mm stock, estimated {:.1} minutes",
        width_mm,
        height_mm,
        carver.estimate_time() / 60.0
    );

    if args.save_compensated {
        let path = args.input.with_extension("compensated.png");
        carver.save_compensated(&path)?;
        info!(path = %path.display(), "saved compensated image");
    }

    let gcode = carver.generate_gcode()?;
    std::fs::write(&args.output, gcode)
        .with_context(|| format!("writing {}", args.output.display()))?;
    info!(path = %args.output.display(), "wrote G-code");

    Ok(())
}
