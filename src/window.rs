//! Encoder-side sliding window: a buffer holding already-consumed history
//! plus the not-yet-tokenized lookahead, large enough to always keep the
//! last `WINDOW_SIZE` bytes available for back-references.

use crate::constants::{MAX_MATCH_LENGTH, WINDOW_SIZE};
use crate::hashchain::HashChain;

/// `WINDOW_SIZE` of history, `WINDOW_SIZE` of lookahead, plus a small
/// margin so a match starting near the boundary can still read its full
/// length without a mid-match slide.
const BUFFER_SIZE: usize = 2 * WINDOW_SIZE + MAX_MATCH_LENGTH;

pub struct SlidingWindow
{
    buf: Vec<u8>,
    /// Write position: end of valid data.
    wp: usize,
    /// Read position: start of not-yet-tokenized lookahead.
    rp: usize,
    /// Last position flushed to a block (bytes `[fp, rp)` are the raw
    /// bytes the current in-progress block's tokens represent).
    fp: usize
}

impl SlidingWindow
{
    pub fn new() -> Self
    {
        SlidingWindow { buf: vec![0; BUFFER_SIZE], wp: 0, rp: 0, fp: 0 }
    }

    pub fn writable(&self) -> usize
    {
        self.buf.len() - self.wp
    }

    /// Copy as much of `data` as fits into free space, returning the
    /// number of bytes consumed.
    pub fn write(&mut self, data: &[u8]) -> usize
    {
        let n = data.len().min(self.writable());
        self.buf[self.wp..self.wp + n].copy_from_slice(&data[..n]);
        self.wp += n;
        n
    }

    /// Slide the upper half down to the start of the buffer, freeing the
    /// rest for new input. Only valid to call once no match in flight can
    /// still need the discarded bytes (`rp >= WINDOW_SIZE`).
    pub fn slide(&mut self, chain: &mut HashChain)
    {
        debug_assert!(self.rp >= WINDOW_SIZE);
        self.buf.copy_within(WINDOW_SIZE..self.wp, 0);
        self.wp -= WINDOW_SIZE;
        self.rp -= WINDOW_SIZE;
        self.fp = self.fp.saturating_sub(WINDOW_SIZE);
        chain.slide(WINDOW_SIZE as u32);
    }

    /// Slice from the read cursor to the write cursor: everything not yet
    /// handed to the tokenizer.
    pub fn active_lookahead(&self) -> &[u8]
    {
        &self.buf[self.rp..self.wp]
    }

    /// The whole buffer up to the write cursor, for match extension
    /// (candidates always lie before `rp`).
    pub fn window(&self) -> &[u8]
    {
        &self.buf[..self.wp]
    }

    pub fn advance(&mut self, step: usize)
    {
        self.rp += step;
        debug_assert!(self.rp <= self.wp);
    }

    pub fn read_pos(&self) -> usize
    {
        self.rp
    }

    pub fn write_pos(&self) -> usize
    {
        self.wp
    }

    /// Raw bytes represented by the tokens accumulated since the last
    /// flush; used by the BlockWriter to emit a stored block.
    pub fn pending_raw_bytes(&self) -> &[u8]
    {
        &self.buf[self.fp..self.rp]
    }

    /// Mark everything up to the read cursor as flushed into a block.
    pub fn mark_flushed(&mut self)
    {
        self.fp = self.rp;
    }
}

impl Default for SlidingWindow
{
    fn default() -> Self
    {
        Self::new()
    }
}
