//! `rdeflate-gunzip PATH.gz` decompresses `PATH.gz` and writes `PATH`.

#[path = "common.rs"]
mod common;

use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::Parser;
use log::info;
use rdeflate::{decompress, Container};

use crate::common::Verbosity;

#[derive(Parser, Debug)]
#[command(author, version, about = "Decompress a .gz archive")]
struct Cli
{
    /// Gzip archive to decompress
    path: PathBuf,
    #[command(flatten)]
    verbosity: Verbosity
}

fn main() -> anyhow::Result<()>
{
    let cli = Cli::parse();
    cli.verbosity.init_logger();

    let Some(dest) = strip_gz_suffix(&cli.path)
    else
    {
        bail!("{}: expected a .gz file name", cli.path.display());
    };

    let input = fs::read(&cli.path).with_context(|| format!("reading {}", cli.path.display()))?;
    info!("read {} bytes from {}", input.len(), cli.path.display());

    let mut out = Vec::new();
    decompress(&input[..], &mut out, Container::Gzip)
        .with_context(|| format!("decompressing {}", cli.path.display()))?;

    common::write_atomically(&dest, &out).with_context(|| format!("writing {}", dest.display()))?;
    info!("wrote {} bytes to {}", out.len(), dest.display());
    Ok(())
}

fn strip_gz_suffix(path: &std::path::Path) -> Option<PathBuf>
{
    let name = path.file_name()?.to_str()?;
    let stripped = name.strip_suffix(".gz")?;
    Some(path.with_file_name(stripped))
}
