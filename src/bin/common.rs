//! Shared plumbing for the four CLI tools: verbosity flags wired the way
//! `zune-bin`'s `global_options.rs` does, and atomic temp-file-then-rename
//! output writing.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use log::Level;

#[derive(clap::Args, Debug, Clone, Copy)]
pub struct Verbosity
{
    /// Display debug information and higher
    #[arg(long)]
    pub debug: bool,
    /// Display very verbose information
    #[arg(long)]
    pub trace: bool,
    /// Display warnings and errors
    #[arg(long)]
    pub warn: bool,
    /// Display information about the encoding/decoding options chosen
    #[arg(long)]
    pub info: bool
}

impl Verbosity
{
    pub fn init_logger(&self)
    {
        let level = if self.trace
        {
            Level::Trace
        }
        else if self.debug
        {
            Level::Debug
        }
        else if self.info
        {
            Level::Info
        }
        else if self.warn
        {
            Level::Warn
        }
        else
        {
            Level::Warn
        };
        let _ = simple_logger::init_with_level(level);
    }
}

/// Write `data` to `path` atomically: write to a sibling temporary file
/// then rename over the destination, so a crash or interrupted write never
/// leaves a partial file at `path`.
pub fn write_atomically(path: &Path, data: &[u8]) -> anyhow::Result<()>
{
    let tmp_path = tmp_path_for(path);
    let mut file = File::create(&tmp_path)?;
    file.write_all(data)?;
    file.sync_all()?;
    std::fs::rename(&tmp_path, path)?;
    Ok(())
}

fn tmp_path_for(path: &Path) -> PathBuf
{
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".rdeflate-tmp");
    path.with_file_name(name)
}
