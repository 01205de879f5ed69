//! Huffman decode tables: a small direct-lookup table (LUT) for short
//! codes plus a hash-map fallback for codes longer than the LUT width.
//!
//! Every codeword is stored bit-reversed (matching the LSB-first order
//! codes are actually transmitted in) with a leading `1` marker bit
//! appended above its length, so the dictionary can hold codes of
//! different lengths that happen to share a bit prefix without
//! colliding.

use std::collections::HashMap;

use crate::bitreader::BitReader;
use crate::bitwriter::reverse_bits;
use crate::constants::MAX_CODEWORD_LEN;
use crate::errors::InflateError;
use crate::huffman::canonical_codes;

pub struct DecodeTable
{
    lut: Box<[(u16, u8)]>,
    dict: HashMap<u16, (u16, u8)>,
    lut_bits: u32
}

impl DecodeTable
{
    /// Build a decode table from per-symbol code lengths (0 = symbol
    /// unused). Validates that the lengths form a complete canonical code
    /// (neither oversubscribed nor, except for the single-symbol case,
    /// incomplete).
    pub fn build(lengths: &[u8], lut_bits: u32) -> Result<Self, InflateError>
    {
        validate_code_lengths(lengths)?;

        let codes = canonical_codes(lengths, MAX_CODEWORD_LEN);
        let mut lut = vec![(0_u16, 0_u8); 1_usize << lut_bits].into_boxed_slice();
        let mut dict = HashMap::new();

        for (sym, &len) in lengths.iter().enumerate()
        {
            if len == 0
            {
                continue;
            }
            let reversed = reverse_bits(codes[sym], len);
            if (len as u32) <= lut_bits
            {
                let step = 1_usize << len;
                let mut idx = reversed as usize;
                while idx < (1_usize << lut_bits)
                {
                    lut[idx] = (sym as u16, len);
                    idx += step;
                }
            }
            else
            {
                let key = reversed | (1_u16 << len);
                dict.insert(key, (sym as u16, len));
            }
        }

        Ok(DecodeTable { lut, dict, lut_bits })
    }

    /// Decode one symbol, consuming its codeword's bits.
    pub fn decode(&self, reader: &mut BitReader) -> Result<u16, InflateError>
    {
        let peeked = reader.peek_bits(self.lut_bits);
        let (sym, len) = self.lut[peeked as usize];
        if len > 0
        {
            if reader.bits_remaining() < len as usize
            {
                return Err(InflateError::UnexpectedEndOfStream);
            }
            reader.consume_bits(len as u32);
            return Ok(sym);
        }

        for total_len in (self.lut_bits + 1)..=(MAX_CODEWORD_LEN as u32)
        {
            if reader.bits_remaining() < total_len as usize
            {
                return Err(InflateError::UnexpectedEndOfStream);
            }
            let bits = reader.peek_bits(total_len);
            let key = (bits as u16) | (1_u16 << total_len);
            if let Some(&(sym, len)) = self.dict.get(&key)
            {
                debug_assert_eq!(len as u32, total_len);
                reader.consume_bits(total_len);
                return Ok(sym);
            }
        }

        Err(InflateError::CorruptedStream("invalid huffman codeword"))
    }
}

/// RFC 1951 code-tree validity check: reject oversubscribed codes
/// outright, and reject incomplete codes unless exactly one symbol is in
/// use (the one case RFC 1951 itself permits, e.g. a distance table with
/// `HDIST == 0`).
pub fn validate_code_lengths(lengths: &[u8]) -> Result<(), InflateError>
{
    let max_bits = MAX_CODEWORD_LEN;
    let mut bl_count = vec![0_u32; max_bits + 1];
    let mut used = 0_u32;
    for &len in lengths
    {
        if len > 0
        {
            if len as usize > max_bits
            {
                return Err(InflateError::CorruptedStream("codeword length exceeds limit"));
            }
            bl_count[len as usize] += 1;
            used += 1;
        }
    }
    if used == 0
    {
        return Ok(());
    }

    let mut left: i64 = 1;
    for bits in 1..=max_bits
    {
        left <<= 1;
        left -= bl_count[bits] as i64;
        if left < 0
        {
            return Err(InflateError::CorruptedStream("oversubscribed huffman code"));
        }
    }
    if left > 0 && used > 1
    {
        return Err(InflateError::CorruptedStream("incomplete huffman code"));
    }
    Ok(())
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn decodes_every_symbol_of_a_small_code()
    {
        // 4 symbols, lengths 1,2,3,3 is a valid complete code.
        let lengths = [1_u8, 2, 3, 3];
        let table = DecodeTable::build(&lengths, 3).unwrap();
        let codes = canonical_codes(&lengths, MAX_CODEWORD_LEN);

        for (sym, &len) in lengths.iter().enumerate()
        {
            let mut w = crate::bitwriter::BitWriter::new();
            w.write_huffman_code(codes[sym], len);
            w.write_bits(0, 8); // padding so the reader never runs dry mid-peek
            let bytes = w.finish();
            let mut r = BitReader::new(&bytes);
            assert_eq!(table.decode(&mut r).unwrap(), sym as u16);
        }
    }

    #[test]
    fn decodes_codes_longer_than_the_lut()
    {
        let lengths = [1_u8, 3, 5, 5, 5, 5, 5, 5];
        let table = DecodeTable::build(&lengths, 2).unwrap();
        let codes = canonical_codes(&lengths, MAX_CODEWORD_LEN);
        for (sym, &len) in lengths.iter().enumerate()
        {
            let mut w = crate::bitwriter::BitWriter::new();
            w.write_huffman_code(codes[sym], len);
            w.write_bits(0, 8);
            let bytes = w.finish();
            let mut r = BitReader::new(&bytes);
            assert_eq!(table.decode(&mut r).unwrap(), sym as u16);
        }
    }

    #[test]
    fn rejects_oversubscribed_code()
    {
        let lengths = [1_u8, 1, 1];
        assert!(validate_code_lengths(&lengths).is_err());
    }

    #[test]
    fn allows_single_symbol_code()
    {
        let lengths = [0_u8, 5, 0];
        assert!(validate_code_lengths(&lengths).is_ok());
    }
}
