//! The inflate decoder: a block-level state machine that parses DEFLATE
//! blocks, reconstructs the per-block Huffman tables, and writes decoded
//! bytes into a [`CircularBuffer`].

use crate::bitreader::BitReader;
use crate::circularbuffer::CircularBuffer;
use crate::constants::{
    fixed_dist_lengths, fixed_litlen_lengths, DIST_BASE_EXTRA, END_OF_BLOCK_SYMBOL, LENGTH_BASE_EXTRA,
    MAX_MATCH_LENGTH, MAX_PRECODE_CODEWORD_LEN, NUM_DIST_SYMS, NUM_LITLEN_SYMS, NUM_PRECODE_SYMS,
    PRECODE_LENS_PERMUTATION, REPEAT_PREV_BASE, REPEAT_PREV_EXTRA_BITS, REPEAT_ZERO_LONG_BASE,
    REPEAT_ZERO_LONG_EXTRA_BITS, REPEAT_ZERO_SHORT_BASE, REPEAT_ZERO_SHORT_EXTRA_BITS
};
use crate::errors::InflateError;
use crate::huffman_decode::DecodeTable;

const LITLEN_LUT_BITS: u32 = 9;
const DIST_LUT_BITS: u32 = 6;

enum BlockState
{
    NeedHeader,
    Stored { remaining: usize },
    Huffman { lit: DecodeTable, dist: DecodeTable },
    Finished
}

/// Streaming DEFLATE decoder over a byte slice. Call [`next`](Self::next)
/// or [`read`](Self::read) to pull decoded bytes; decoding proceeds lazily,
/// only as far as needed to satisfy the request.
pub struct Inflate<'src>
{
    reader: BitReader<'src>,
    buffer: CircularBuffer,
    state: BlockState,
    is_last_block: bool
}

impl<'src> Inflate<'src>
{
    pub fn new(data: &'src [u8]) -> Self
    {
        Inflate {
            reader: BitReader::new(data),
            buffer: CircularBuffer::new(),
            state: BlockState::NeedHeader,
            is_last_block: false
        }
    }

    /// Yield the next chunk of decoded output, or `None` at end of
    /// stream.
    pub fn next(&mut self) -> Result<Option<&[u8]>, InflateError>
    {
        loop
        {
            if self.buffer.readable() > 0
            {
                return Ok(self.buffer.next());
            }
            if matches!(self.state, BlockState::Finished)
            {
                return Ok(None);
            }
            self.advance()?;
        }
    }

    /// Copy decoded bytes into `dst`, decoding as needed. Returns the
    /// number of bytes copied; 0 means end of stream.
    pub fn read(&mut self, dst: &mut [u8]) -> Result<usize, InflateError>
    {
        let mut copied = 0;
        while copied < dst.len()
        {
            if self.buffer.readable() == 0
            {
                if matches!(self.state, BlockState::Finished)
                {
                    break;
                }
                self.advance()?;
                continue;
            }
            copied += self.buffer.read(&mut dst[copied..]);
        }
        Ok(copied)
    }

    /// Decode the whole stream into a `Vec<u8>` in one call.
    pub fn decode_all(mut self) -> Result<Vec<u8>, InflateError>
    {
        let mut out = Vec::new();
        while let Some(chunk) = self.next()?
        {
            out.extend_from_slice(chunk);
        }
        Ok(out)
    }

    fn advance(&mut self) -> Result<(), InflateError>
    {
        match self.state
        {
            BlockState::NeedHeader => self.start_block(),
            BlockState::Stored { .. } => self.continue_stored(),
            BlockState::Huffman { .. } => self.continue_huffman(),
            BlockState::Finished => Ok(())
        }
    }

    fn start_block(&mut self) -> Result<(), InflateError>
    {
        let final_bit = self.reader.read_bits(1)?;
        self.is_last_block = final_bit != 0;
        let btype = self.reader.read_bits(2)?;
        match btype
        {
            0 => self.start_stored_block(),
            1 =>
            {
                let lit = DecodeTable::build(&fixed_litlen_lengths(), LITLEN_LUT_BITS)?;
                let dist = DecodeTable::build(&fixed_dist_lengths(), DIST_LUT_BITS)?;
                self.state = BlockState::Huffman { lit, dist };
                Ok(())
            }
            2 => self.start_dynamic_block(),
            _ => Err(InflateError::CorruptedStream("reserved block type 11"))
        }
    }

    fn start_stored_block(&mut self) -> Result<(), InflateError>
    {
        self.reader.align_to_byte();
        let header = self.reader.read_aligned_bytes(4)?;
        let len = u16::from_le_bytes([header[0], header[1]]);
        let nlen = u16::from_le_bytes([header[2], header[3]]);
        if len != !nlen
        {
            return Err(InflateError::CorruptedStream("stored block LEN does not match ~NLEN"));
        }
        self.state = BlockState::Stored { remaining: len as usize };
        Ok(())
    }

    fn continue_stored(&mut self) -> Result<(), InflateError>
    {
        let remaining = match &self.state
        {
            BlockState::Stored { remaining } => *remaining,
            _ => unreachable!()
        };
        if remaining == 0
        {
            self.state = if self.is_last_block { BlockState::Finished } else { BlockState::NeedHeader };
            return Ok(());
        }
        let to_copy = remaining.min(self.buffer.free());
        if to_copy == 0
        {
            return Ok(());
        }
        let bytes = self.reader.read_aligned_bytes(to_copy)?;
        for &b in bytes
        {
            self.buffer.write_byte(b);
        }
        self.state = BlockState::Stored { remaining: remaining - to_copy };
        Ok(())
    }

    fn start_dynamic_block(&mut self) -> Result<(), InflateError>
    {
        let hlit = self.reader.read_bits(5)? as usize + 257;
        let hdist = self.reader.read_bits(5)? as usize + 1;
        let hclen = self.reader.read_bits(4)? as usize + 4;

        if hlit > NUM_LITLEN_SYMS
        {
            return Err(InflateError::CorruptedStream("HLIT names a reserved literal/length symbol"));
        }
        if hdist > NUM_DIST_SYMS
        {
            return Err(InflateError::CorruptedStream("HDIST names a reserved distance symbol"));
        }

        let mut precode_lens = [0_u8; NUM_PRECODE_SYMS];
        for &sym in PRECODE_LENS_PERMUTATION.iter().take(hclen)
        {
            precode_lens[sym as usize] = self.reader.read_bits(3)? as u8;
        }
        let precode_table = DecodeTable::build(&precode_lens, MAX_PRECODE_CODEWORD_LEN as u32)?;

        let total = hlit + hdist;
        let mut lens: Vec<u8> = Vec::with_capacity(total);
        while lens.len() < total
        {
            let sym = precode_table.decode(&mut self.reader)?;
            match sym
            {
                0..=15 => lens.push(sym as u8),
                16 =>
                {
                    let prev = *lens
                        .last()
                        .ok_or(InflateError::CorruptedStream("repeat-previous code with no previous length"))?;
                    let extra = self.reader.read_bits(REPEAT_PREV_EXTRA_BITS as u32)? as usize;
                    let count = REPEAT_PREV_BASE as usize + extra;
                    if lens.len() + count > total
                    {
                        return Err(InflateError::CorruptedStream("code-length repeat overruns table"));
                    }
                    lens.extend(std::iter::repeat(prev).take(count));
                }
                17 =>
                {
                    let extra = self.reader.read_bits(REPEAT_ZERO_SHORT_EXTRA_BITS as u32)? as usize;
                    let count = REPEAT_ZERO_SHORT_BASE as usize + extra;
                    if lens.len() + count > total
                    {
                        return Err(InflateError::CorruptedStream("code-length repeat overruns table"));
                    }
                    lens.extend(std::iter::repeat(0).take(count));
                }
                18 =>
                {
                    let extra = self.reader.read_bits(REPEAT_ZERO_LONG_EXTRA_BITS as u32)? as usize;
                    let count = REPEAT_ZERO_LONG_BASE as usize + extra;
                    if lens.len() + count > total
                    {
                        return Err(InflateError::CorruptedStream("code-length repeat overruns table"));
                    }
                    lens.extend(std::iter::repeat(0).take(count));
                }
                _ => return Err(InflateError::CorruptedStream("invalid code-length symbol"))
            }
        }

        let mut lit_lens = [0_u8; NUM_LITLEN_SYMS];
        lit_lens[..hlit].copy_from_slice(&lens[..hlit]);
        let mut dist_lens = [0_u8; NUM_DIST_SYMS];
        dist_lens[..hdist].copy_from_slice(&lens[hlit..hlit + hdist]);

        let lit = DecodeTable::build(&lit_lens, LITLEN_LUT_BITS)?;
        let dist = DecodeTable::build(&dist_lens, DIST_LUT_BITS)?;
        self.state = BlockState::Huffman { lit, dist };
        Ok(())
    }

    fn continue_huffman(&mut self) -> Result<(), InflateError>
    {
        loop
        {
            if self.buffer.free() < MAX_MATCH_LENGTH
            {
                return Ok(());
            }

            let sym = {
                let lit = match &self.state
                {
                    BlockState::Huffman { lit, .. } => lit,
                    _ => unreachable!()
                };
                lit.decode(&mut self.reader)?
            };

            if sym < 256
            {
                self.buffer.write_byte(sym as u8);
            }
            else if sym == END_OF_BLOCK_SYMBOL
            {
                self.state = if self.is_last_block { BlockState::Finished } else { BlockState::NeedHeader };
                return Ok(());
            }
            else
            {
                let idx = (sym - 257) as usize;
                if idx >= LENGTH_BASE_EXTRA.len()
                {
                    return Err(InflateError::CorruptedStream("invalid length symbol"));
                }
                let (base, extra_bits) = LENGTH_BASE_EXTRA[idx];
                let extra = if extra_bits > 0 { self.reader.read_bits(extra_bits as u32)? } else { 0 };
                let length = base as usize + extra as usize;

                let dsym = {
                    let dist = match &self.state
                    {
                        BlockState::Huffman { dist, .. } => dist,
                        _ => unreachable!()
                    };
                    dist.decode(&mut self.reader)?
                };
                if dsym as usize >= DIST_BASE_EXTRA.len()
                {
                    return Err(InflateError::CorruptedStream("invalid distance symbol"));
                }
                let (dbase, dextra_bits) = DIST_BASE_EXTRA[dsym as usize];
                let dextra = if dextra_bits > 0 { self.reader.read_bits(dextra_bits as u32)? } else { 0 };
                let distance = dbase as usize + dextra as usize;

                if distance as u64 > self.buffer.bytes_written()
                {
                    return Err(InflateError::CorruptedStream(
                        "back-reference distance exceeds bytes written so far"
                    ));
                }
                self.buffer.write_match(length, distance)?;
            }
        }
    }
}

#[cfg(test)]
mod tests
{
    use super::*;
    use crate::bitwriter::BitWriter;

    #[test]
    fn decodes_a_stored_block()
    {
        let mut w = BitWriter::new();
        w.write_bits(1, 1); // final
        w.write_bits(0, 2); // stored
        w.align_to_byte();
        let data = b"Hello world\n";
        w.write_aligned_bytes(&(data.len() as u16).to_le_bytes());
        w.write_aligned_bytes(&(!(data.len() as u16)).to_le_bytes());
        w.write_aligned_bytes(data);
        let bytes = w.finish();

        let out = Inflate::new(&bytes).decode_all().unwrap();
        assert_eq!(out, data);
    }

    #[test]
    fn rejects_reserved_block_type()
    {
        let mut w = BitWriter::new();
        w.write_bits(1, 1);
        w.write_bits(0b11, 2);
        let bytes = w.finish();
        assert!(Inflate::new(&bytes).decode_all().is_err());
    }

    #[test]
    fn rejects_truncated_stream()
    {
        let mut w = BitWriter::new();
        w.write_bits(0, 1); // not final
        w.write_bits(0, 2); // stored
        let bytes = w.finish();
        let err = Inflate::new(&bytes).decode_all().unwrap_err();
        assert_eq!(err, InflateError::UnexpectedEndOfStream);
    }
}
