//! `rdeflate-decompress` reads a compressed stream from stdin and writes
//! the decompressed bytes to stdout.

#[path = "common.rs"]
mod common;

use std::io::{self, Read, Write};

use anyhow::Context;
use clap::{Parser, ValueEnum};
use log::info;
use rdeflate::{decompress, Container};

use crate::common::Verbosity;

#[derive(ValueEnum, Debug, Clone, Copy)]
enum Format
{
    Raw,
    Zlib,
    Gzip
}

impl From<Format> for Container
{
    fn from(f: Format) -> Self
    {
        match f
        {
            Format::Raw => Container::Raw,
            Format::Zlib => Container::Zlib,
            Format::Gzip => Container::Gzip
        }
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Decompress stdin to stdout")]
struct Cli
{
    /// Container format of the input stream
    #[arg(short, long, value_enum, default_value_t = Format::Gzip)]
    format: Format,
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

    let mut out = Vec::new();
    decompress(&input[..], &mut out, cli.format.into()).context("decompressing stdin")?;

    io::stdout().write_all(&out).context("writing stdout")?;
    Ok(())
}
