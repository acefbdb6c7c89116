//! Command-line surface.

use std::path::PathBuf;

use clap::Parser;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WindowSize {
    pub width: u32,
    pub height: u32,
}

fn parse_size(raw: &str) -> Result<WindowSize, String> {
    let (width, height) = raw
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{raw}'"))?;
    let width: u32 = width
        .trim()
        .parse()
        .map_err(|_| format!("invalid width '{width}'"))?;
    let height: u32 = height
        .trim()
        .parse()
        .map_err(|_| format!("invalid height '{height}'"))?;
    if width == 0 || height == 0 {
        return Err("window dimensions must be non-zero".to_string());
    }
    Ok(WindowSize { width, height })
}

#[derive(Debug, Parser)]
#[command(name = "graphpaper", version, about = "Equation grapher drawing through live-synthesized GPU shaders")]
pub struct Args {
    /// Initial window size as WIDTHxHEIGHT.
    #[arg(long, value_parser = parse_size, default_value = "1200x720")]
    pub size: WindowSize,

    /// Curve thickness in pixels.
    #[arg(long, default_value_t = 2.0)]
    pub thickness: f32,

    /// Write each synthesized fragment shader to this file.
    #[arg(long, value_name = "PATH")]
    pub dump_shader: Option<PathBuf>,
}

pub fn parse() -> Args {
    Args::parse()
}
