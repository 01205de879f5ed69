//! `rdeflate-gzip PATH` compresses `PATH` and writes `PATH.gz`.

#[path = "common.rs"]
mod common;

use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use log::info;
use rdeflate::{compress, Container, Level};

use crate::common::Verbosity;

#[derive(Parser, Debug)]
#[command(author, version, about = "Compress a file into a .gz archive")]
struct Cli
{
    /// File to compress
    path: PathBuf,
    /// Compression level, 0 (fastest) to 9 (best)
    #[arg(short = 'l', long, default_value_t = 6, value_parser = clap::value_parser!(u8).range(0..=9))]
    level: u8,
    #[command(flatten)]
    verbosity: Verbosity
}

fn main() -> anyhow::Result<()>
{
    let cli = Cli::parse();
    cli.verbosity.init_logger();

    let input = fs::read(&cli.path).with_context(|| format!("reading {}", cli.path.display()))?;
    info!("read {} bytes from {}", input.len(), cli.path.display());

    let mut out = Vec::new();
    compress(&input[..], &mut out, Container::Gzip, Level::new(cli.level))
        .with_context(|| format!("compressing {}", cli.path.display()))?;

    let mut dest = cli.path.clone().into_os_string();
    dest.push(".gz");
    let dest = PathBuf::from(dest);
    common::write_atomically(&dest, &out).with_context(|| format!("writing {}", dest.display()))?;
    info!("wrote {} bytes to {}", out.len(), dest.display());
    Ok(())
}
