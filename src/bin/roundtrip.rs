//! `rdeflate-roundtrip` compresses then decompresses stdin and checks the
//! result is byte-identical, as a quick sanity check of the codec.

#[path = "common.rs"]
mod common;

use std::io::{self, Read};

use anyhow::{bail, Context};
use clap::Parser;
use log::info;
use rdeflate::{compress, decompress, Container, Level};

use crate::common::Verbosity;

#[derive(Parser, Debug)]
#[command(author, version, about = "Round-trip stdin through the codec and verify it is unchanged")]
struct Cli
{
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

    let mut input = Vec::new();
    io::stdin().read_to_end(&mut input).context("reading stdin")?;
    info!("read {} bytes from stdin", input.len());

    let mut compressed = Vec::new();
    compress(&input[..], &mut compressed, Container::Gzip, Level::new(cli.level)).context("compressing")?;
    info!("compressed to {} bytes", compressed.len());

    let mut decoded = Vec::new();
    decompress(&compressed[..], &mut decoded, Container::Gzip).context("decompressing")?;

    if decoded != input
    {
        bail!("round trip mismatch: {} bytes in, {} bytes out", input.len(), decoded.len());
    }
    info!("round trip verified, {} bytes match", input.len());
    Ok(())
}
