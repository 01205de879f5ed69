//! The streaming compressor: wires the sliding window, hash chain,
//! tokenizer and block writer together behind `write`/`flush`/`close`, and
//! the one-shot `compress` entry points built on top of it.

use std::io::{self, Read, Write};

use crate::bitwriter::BitWriter;
use crate::blockwriter::{self, BlockMode};
use crate::constants::WINDOW_SIZE;
use crate::container::{self, Checksum, Container};
use crate::errors::DeflateError;
use crate::hashchain::HashChain;
use crate::token::Token;
use crate::tokenizer::{level_args, LevelArgs, Tokenizer};
use crate::window::SlidingWindow;

/// Compression effort, 0 (fastest, least searching) to 9 (slowest, most
/// thorough). The named aliases match spec-level usage; any other value in
/// range is equally valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Level(u8);

impl Level
{
    pub const FAST: Level = Level(4);
    pub const DEFAULT: Level = Level(6);
    pub const BEST: Level = Level(9);

    pub fn new(level: u8) -> Self
    {
        Level(level.min(9))
    }

    fn args(self) -> LevelArgs
    {
        level_args(self.0)
    }

    /// Level 0 is "stored only": no LZ77 match search, and every block is
    /// emitted as a raw stored block regardless of estimated bit cost.
    fn is_stored_only(self) -> bool
    {
        self.0 == 0
    }
}

impl Default for Level
{
    fn default() -> Self
    {
        Level::DEFAULT
    }
}

/// Number of tokens buffered before a block is forced out, matching the
/// active value between the source's two conflicting headers (Open
/// Question (b)): `1 << 15`.
const MAX_TOKENS_PER_BLOCK: usize = 1 << 15;

/// A streaming DEFLATE/zlib/gzip encoder over any [`Write`]r.
pub struct Compressor<W: Write>
{
    writer: W,
    container: Container,
    window: SlidingWindow,
    chain: HashChain,
    tokenizer: Tokenizer,
    tokens: Vec<Token>,
    args: LevelArgs,
    matching_enabled: bool,
    mode: BlockMode,
    bitwriter: BitWriter,
    checksum: Checksum,
    total_in: u64,
    closed: bool
}

impl<W: Write> Compressor<W>
{
    fn new_inner(
        writer: W,
        container: Container,
        args: LevelArgs,
        matching_enabled: bool,
        mode: BlockMode
    ) -> Result<Self, DeflateError>
    {
        let mut bitwriter = BitWriter::new();
        let mut header = Vec::new();
        container::write_header(&mut header, container);
        bitwriter.write_aligned_bytes(&header);

        let mut compressor = Compressor {
            writer,
            container,
            window: SlidingWindow::new(),
            chain: HashChain::new(2 * WINDOW_SIZE),
            tokenizer: Tokenizer::new(),
            tokens: Vec::with_capacity(MAX_TOKENS_PER_BLOCK),
            args,
            matching_enabled,
            mode,
            bitwriter,
            checksum: Checksum::for_container(container),
            total_in: 0,
            closed: false
        };
        compressor.flush_bitwriter_bytes()?;
        Ok(compressor)
    }

    pub fn new(writer: W, container: Container, level: Level) -> Result<Self, DeflateError>
    {
        if level.is_stored_only()
        {
            Self::new_inner(writer, container, level.args(), false, BlockMode::StoredOnly)
        }
        else
        {
            Self::new_inner(writer, container, level.args(), true, BlockMode::Auto)
        }
    }

    pub fn huffman_only(writer: W, container: Container) -> Result<Self, DeflateError>
    {
        Self::new_inner(writer, container, level_args(0), false, BlockMode::HuffmanOnly)
    }

    /// Consume as much of `data` as fits, tokenizing and emitting blocks as
    /// the sliding window fills. Returns the number of bytes consumed
    /// (equal to `data.len()` unless the caller should retry with the
    /// remainder after another call).
    pub fn write(&mut self, data: &[u8]) -> Result<usize, DeflateError>
    {
        if self.closed
        {
            return Err(DeflateError::AlreadyClosed);
        }

        let mut total = 0;
        let mut remaining = data;
        while !remaining.is_empty()
        {
            let n = self.window.write(remaining);
            if n == 0
            {
                self.pump(false)?;
                self.try_slide();
                if self.window.writable() == 0
                {
                    break;
                }
                continue;
            }
            self.checksum.update(&remaining[..n]);
            self.total_in += n as u64;
            total += n;
            remaining = &remaining[n..];
            self.pump(false)?;
            self.try_slide();
        }
        Ok(total)
    }

    /// Emit a non-final block covering everything consumed so far, so it
    /// is recoverable from the compressed output without ending the
    /// stream.
    pub fn flush(&mut self) -> Result<(), DeflateError>
    {
        if self.closed
        {
            return Err(DeflateError::AlreadyClosed);
        }
        self.pump(true)?;
        self.emit_block(false)?;
        self.writer.flush()?;
        Ok(())
    }

    /// Finish the stream: emit a final block and the container footer,
    /// then hand back the underlying writer.
    pub fn close(mut self) -> Result<W, DeflateError>
    {
        if self.closed
        {
            return Err(DeflateError::AlreadyClosed);
        }
        self.pump(true)?;
        self.emit_block(true)?;

        let mut footer = Vec::new();
        let checksum = std::mem::replace(&mut self.checksum, Checksum::None);
        checksum.write_footer(&mut footer, self.container, self.total_in as u32);
        self.writer.write_all(&footer)?;
        self.writer.flush()?;
        self.closed = true;
        Ok(self.writer)
    }

    fn pump(&mut self, flush_now: bool) -> Result<(), DeflateError>
    {
        loop
        {
            self.tokenizer.run(
                &mut self.window,
                &mut self.chain,
                &self.args,
                self.matching_enabled,
                flush_now,
                &mut self.tokens,
                MAX_TOKENS_PER_BLOCK
            );
            if self.tokens.len() < MAX_TOKENS_PER_BLOCK
            {
                break;
            }
            self.emit_block(false)?;
        }
        Ok(())
    }

    fn emit_block(&mut self, final_block: bool) -> Result<(), DeflateError>
    {
        blockwriter::write_block(
            &mut self.bitwriter,
            &self.tokens,
            self.window.pending_raw_bytes(),
            final_block,
            self.mode
        );
        self.tokens.clear();
        self.window.mark_flushed();
        self.try_slide();
        self.flush_bitwriter_bytes()
    }

    fn try_slide(&mut self)
    {
        if self.window.read_pos() >= WINDOW_SIZE
        {
            self.window.slide(&mut self.chain);
        }
    }

    fn flush_bitwriter_bytes(&mut self) -> Result<(), DeflateError>
    {
        let bytes = self.bitwriter.drain_bytes();
        if !bytes.is_empty()
        {
            self.writer.write_all(&bytes)?;
        }
        Ok(())
    }
}

/// Compress everything `reader` yields into `writer` in one call, at the
/// given level.
pub fn compress<R: Read, W: Write>(
    mut reader: R,
    writer: W,
    container: Container,
    level: Level
) -> Result<(), DeflateError>
{
    let mut compressor = Compressor::new(writer, container, level)?;
    let mut buf = [0_u8; 16 * 1024];
    loop
    {
        let n = reader.read(&mut buf)?;
        if n == 0
        {
            break;
        }
        let mut chunk = &buf[..n];
        while !chunk.is_empty()
        {
            let written = compressor.write(chunk)?;
            if written == 0
            {
                return Err(DeflateError::WriteFailed("compressor made no progress on a non-empty chunk".into()));
            }
            chunk = &chunk[written..];
        }
    }
    compressor.close()?;
    Ok(())
}

/// Convenience wrapper matching spec-level naming: compress `writer`-bound
/// output with no Huffman-only restriction.
pub fn compressor<W: Write>(writer: W, container: Container, level: Level) -> Result<Compressor<W>, DeflateError>
{
    Compressor::new(writer, container, level)
}

/// A compressor that never emits back-references (Huffman coding of
/// literals only), matching a level-0-like variant that skips LZ77
/// entirely.
pub fn huffman_only_compressor<W: Write>(writer: W, container: Container) -> Result<Compressor<W>, DeflateError>
{
    Compressor::huffman_only(writer, container)
}

#[cfg(test)]
mod tests
{
    use super::*;
    use crate::inflate::Inflate;

    fn round_trip(data: &[u8], container: Container, level: Level)
    {
        let mut compressed = Vec::new();
        compress(data, &mut compressed, container, level).unwrap();

        let body = container::read_header(&compressed, container).unwrap();
        let footer_len = container::footer_len(container);
        let stream = &body[..body.len() - footer_len];
        let decoded = Inflate::new(stream).decode_all().unwrap();
        assert_eq!(decoded, data);

        container::verify_footer(&body[body.len() - footer_len..], container, &decoded).unwrap();
    }

    #[test]
    fn round_trips_raw_at_every_level()
    {
        let data = b"Blah blah blah blah blah! ABCDEABCD ABCDEABCD aaaaaaaaaa";
        for lvl in [0, 1, 4, 6, 9]
        {
            round_trip(data, Container::Raw, Level::new(lvl));
        }
    }

    #[test]
    fn round_trips_gzip_and_zlib()
    {
        let data = b"Hello world\n";
        round_trip(data, Container::Gzip, Level::DEFAULT);
        round_trip(data, Container::Zlib, Level::DEFAULT);
    }

    #[test]
    fn huffman_only_round_trips()
    {
        let data = b"aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
        let mut compressed = Vec::new();
        {
            let mut c = huffman_only_compressor(&mut compressed, Container::Raw).unwrap();
            c.write(data).unwrap();
            c.close().unwrap();
        }
        let decoded = Inflate::new(&compressed).decode_all().unwrap();
        assert_eq!(decoded, data);
    }

    #[test]
    fn empty_input_round_trips()
    {
        round_trip(b"", Container::Raw, Level::DEFAULT);
    }

    #[test]
    fn large_input_spans_multiple_blocks_and_window_slides()
    {
        let data: Vec<u8> = (0..200_000).map(|i| (i % 251) as u8).collect();
        round_trip(&data, Container::Raw, Level::DEFAULT);
    }
}
