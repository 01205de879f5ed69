//! Chooses between stored, fixed-Huffman and dynamic-Huffman block
//! encodings by estimated bit cost, then emits the chosen block.

use crate::bitwriter::BitWriter;
use crate::constants::{
    distance_to_symbol, fixed_dist_lengths, fixed_litlen_lengths, length_to_symbol, BLOCKTYPE_DYNAMIC,
    BLOCKTYPE_FIXED, BLOCKTYPE_STORED, END_OF_BLOCK_SYMBOL, MAX_CODEWORD_LEN, MAX_PRECODE_CODEWORD_LEN,
    NUM_DIST_SYMS, NUM_LITLEN_SYMS, NUM_PRECODE_SYMS, PRECODE_LENS_PERMUTATION, REPEAT_PREV_BASE,
    REPEAT_PREV_EXTRA_BITS, REPEAT_ZERO_LONG_BASE, REPEAT_ZERO_LONG_EXTRA_BITS, REPEAT_ZERO_SHORT_BASE,
    REPEAT_ZERO_SHORT_EXTRA_BITS
};
use crate::huffman::{canonical_codes, length_limited_code_lengths};
use crate::token::Token;

/// Run-length-encode a code-length sequence using the code-length
/// alphabet's repeat opcodes (RFC 1951 §3.2.7): 16 repeats the previous
/// nonzero length, 17/18 repeat runs of zero.
fn rle_encode_lengths(lens: &[u8]) -> Vec<(u8, u16)>
{
    let mut out = Vec::new();
    let mut i = 0;
    while i < lens.len()
    {
        let cur = lens[i];
        let mut run = 1;
        while i + run < lens.len() && lens[i + run] == cur
        {
            run += 1;
        }

        if cur == 0
        {
            let mut remaining = run;
            while remaining > 0
            {
                if remaining < 3
                {
                    for _ in 0..remaining
                    {
                        out.push((0, 0));
                    }
                    remaining = 0;
                }
                else if remaining <= 10
                {
                    out.push((17, (remaining - REPEAT_ZERO_SHORT_BASE as usize) as u16));
                    remaining = 0;
                }
                else
                {
                    let take = remaining.min(138);
                    out.push((18, (take - REPEAT_ZERO_LONG_BASE as usize) as u16));
                    remaining -= take;
                }
            }
        }
        else
        {
            out.push((cur, 0));
            let mut remaining = run - 1;
            while remaining > 0
            {
                if remaining < 3
                {
                    for _ in 0..remaining
                    {
                        out.push((cur, 0));
                    }
                    remaining = 0;
                }
                else
                {
                    let take = remaining.min(6);
                    out.push((16, (take - REPEAT_PREV_BASE as usize) as u16));
                    remaining -= take;
                }
            }
        }
        i += run;
    }
    out
}

fn repeat_extra_bits(sym: u8) -> u8
{
    match sym
    {
        16 => REPEAT_PREV_EXTRA_BITS,
        17 => REPEAT_ZERO_SHORT_EXTRA_BITS,
        18 => REPEAT_ZERO_LONG_EXTRA_BITS,
        _ => 0
    }
}

fn trim_trailing_zeros(lens: &[u8], min_len: usize) -> usize
{
    let mut n = lens.len();
    while n > min_len && lens[n - 1] == 0
    {
        n -= 1;
    }
    n
}

struct DynamicPlan
{
    hlit_count: usize,
    hdist_count: usize,
    hclen_count: usize,
    precode_lens: [u8; NUM_PRECODE_SYMS],
    rle: Vec<(u8, u16)>,
    header_bits: usize
}

fn plan_dynamic_block(lit_lens: &[u8], dist_lens: &[u8]) -> DynamicPlan
{
    let hlit_count = trim_trailing_zeros(lit_lens, 257);
    let hdist_count = trim_trailing_zeros(dist_lens, 1);

    let mut combined = Vec::with_capacity(hlit_count + hdist_count);
    combined.extend_from_slice(&lit_lens[..hlit_count]);
    combined.extend_from_slice(&dist_lens[..hdist_count]);

    let rle = rle_encode_lengths(&combined);

    let mut precode_freq = [0_u64; NUM_PRECODE_SYMS];
    for &(sym, _) in &rle
    {
        precode_freq[sym as usize] += 1;
    }
    let precode_lens_vec = length_limited_code_lengths(&precode_freq, MAX_PRECODE_CODEWORD_LEN);
    let mut precode_lens = [0_u8; NUM_PRECODE_SYMS];
    precode_lens.copy_from_slice(&precode_lens_vec);

    // Lengths are stored in the fixed permutation order; HCLEN trims
    // trailing zeros of *that* reordered sequence down to a minimum of 4.
    let permuted: Vec<u8> = PRECODE_LENS_PERMUTATION.iter().map(|&sym| precode_lens[sym as usize]).collect();
    let hclen_count = trim_trailing_zeros(&permuted, 4);

    let mut header_bits = 5 + 5 + 4 + hclen_count * 3;
    for &(sym, _) in &rle
    {
        header_bits += precode_lens[sym as usize] as usize + repeat_extra_bits(sym) as usize;
    }

    DynamicPlan { hlit_count, hdist_count, hclen_count, precode_lens, rle, header_bits }
}

fn token_stream_cost(tokens: &[Token], lit_lens: &[u8], dist_lens: &[u8]) -> usize
{
    let mut bits = 0_usize;
    for t in tokens
    {
        match *t
        {
            Token::Literal(b) => bits += lit_lens[b as usize] as usize,
            Token::Match { length, distance } =>
            {
                let (lsym, _, lextra) = length_to_symbol(length as usize);
                let (dsym, _, dextra) = distance_to_symbol(distance as usize);
                bits += lit_lens[lsym as usize] as usize + lextra as usize;
                bits += dist_lens[dsym as usize] as usize + dextra as usize;
            }
        }
    }
    bits
}

fn build_histograms(tokens: &[Token]) -> ([u64; NUM_LITLEN_SYMS], [u64; NUM_DIST_SYMS])
{
    let mut lit_freq = [0_u64; NUM_LITLEN_SYMS];
    let mut dist_freq = [0_u64; NUM_DIST_SYMS];
    lit_freq[END_OF_BLOCK_SYMBOL as usize] = 1;

    for t in tokens
    {
        match *t
        {
            Token::Literal(b) => lit_freq[b as usize] += 1,
            Token::Match { length, distance } =>
            {
                let (lsym, _, _) = length_to_symbol(length as usize);
                lit_freq[lsym as usize] += 1;
                let (dsym, _, _) = distance_to_symbol(distance as usize);
                dist_freq[dsym as usize] += 1;
            }
        }
    }
    // RFC 1951 allows a degenerate one-entry distance tree even when no
    // match ever uses it.
    if dist_freq.iter().all(|&f| f == 0)
    {
        dist_freq[0] = 1;
    }
    (lit_freq, dist_freq)
}

fn write_literal_or_match(
    writer: &mut BitWriter,
    token: &Token,
    lit_codes: &[u16],
    lit_lens: &[u8],
    dist_codes: &[u16],
    dist_lens: &[u8]
)
{
    match *token
    {
        Token::Literal(b) =>
        {
            writer.write_huffman_code(lit_codes[b as usize], lit_lens[b as usize]);
        }
        Token::Match { length, distance } =>
        {
            let (lsym, lextra_val, lextra_bits) = length_to_symbol(length as usize);
            writer.write_huffman_code(lit_codes[lsym as usize], lit_lens[lsym as usize]);
            if lextra_bits > 0
            {
                writer.write_bits(lextra_val as u32, lextra_bits as u32);
            }
            let (dsym, dextra_val, dextra_bits) = distance_to_symbol(distance as usize);
            writer.write_huffman_code(dist_codes[dsym as usize], dist_lens[dsym as usize]);
            if dextra_bits > 0
            {
                writer.write_bits(dextra_val as u32, dextra_bits as u32);
            }
        }
    }
}

fn write_block_header(writer: &mut BitWriter, final_block: bool, btype: u64)
{
    writer.write_bits(final_block as u32, 1);
    writer.write_bits(btype as u32, 2);
}

fn write_stored_block(writer: &mut BitWriter, raw: &[u8], final_block: bool)
{
    write_block_header(writer, final_block, BLOCKTYPE_STORED);
    writer.align_to_byte();
    let len = raw.len() as u16;
    writer.write_aligned_bytes(&len.to_le_bytes());
    writer.write_aligned_bytes(&(!len).to_le_bytes());
    writer.write_aligned_bytes(raw);
}

fn write_fixed_block(writer: &mut BitWriter, tokens: &[Token], final_block: bool)
{
    write_block_header(writer, final_block, BLOCKTYPE_FIXED);
    let lit_lens = fixed_litlen_lengths();
    let dist_lens = fixed_dist_lengths();
    let lit_codes = canonical_codes(&lit_lens, MAX_CODEWORD_LEN);
    let dist_codes = canonical_codes(&dist_lens, MAX_CODEWORD_LEN);

    for t in tokens
    {
        write_literal_or_match(writer, t, &lit_codes, &lit_lens, &dist_codes, &dist_lens);
    }
    writer.write_huffman_code(lit_codes[END_OF_BLOCK_SYMBOL as usize], lit_lens[END_OF_BLOCK_SYMBOL as usize]);
}

#[allow(clippy::too_many_arguments)]
fn write_dynamic_block(
    writer: &mut BitWriter,
    tokens: &[Token],
    lit_lens: &[u8],
    dist_lens: &[u8],
    plan: &DynamicPlan,
    final_block: bool
)
{
    write_block_header(writer, final_block, BLOCKTYPE_DYNAMIC);

    writer.write_bits((plan.hlit_count - 257) as u32, 5);
    writer.write_bits((plan.hdist_count - 1) as u32, 5);
    writer.write_bits((plan.hclen_count - 4) as u32, 4);

    for &sym in PRECODE_LENS_PERMUTATION.iter().take(plan.hclen_count)
    {
        writer.write_bits(plan.precode_lens[sym as usize] as u32, 3);
    }

    let precode_codes = canonical_codes(&plan.precode_lens, MAX_PRECODE_CODEWORD_LEN);
    for &(sym, extra_val) in &plan.rle
    {
        writer.write_huffman_code(precode_codes[sym as usize], plan.precode_lens[sym as usize]);
        let extra_bits = repeat_extra_bits(sym);
        if extra_bits > 0
        {
            writer.write_bits(extra_val as u32, extra_bits as u32);
        }
    }

    let lit_codes = canonical_codes(lit_lens, MAX_CODEWORD_LEN);
    let dist_codes = canonical_codes(dist_lens, MAX_CODEWORD_LEN);
    for t in tokens
    {
        write_literal_or_match(writer, t, &lit_codes, lit_lens, &dist_codes, dist_lens);
    }
    writer.write_huffman_code(lit_codes[END_OF_BLOCK_SYMBOL as usize], lit_lens[END_OF_BLOCK_SYMBOL as usize]);
}

/// Which block kinds `write_block` is allowed to choose between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockMode
{
    /// Choose whichever of stored/fixed/dynamic is cheapest (§4.6).
    Auto,
    /// Level 0: always emit a stored block, no Huffman coding at all.
    StoredOnly,
    /// Huffman-only: always Huffman-code the literal stream (fixed or
    /// dynamic, whichever is cheaper); stored is never chosen even if it
    /// would be smaller.
    HuffmanOnly
}

fn write_huffman_coded_block(
    writer: &mut BitWriter,
    tokens: &[Token],
    dyn_lit_lens: &[u8],
    dyn_dist_lens: &[u8],
    plan: &DynamicPlan,
    fixed_cost: usize,
    dynamic_cost: usize,
    final_block: bool
)
{
    if dynamic_cost <= fixed_cost
    {
        write_dynamic_block(writer, tokens, dyn_lit_lens, dyn_dist_lens, plan, final_block);
    }
    else
    {
        write_fixed_block(writer, tokens, final_block);
    }
}

/// Emit a single DEFLATE block for `tokens` (representing `raw` bytes of
/// input), choosing the block kind `mode` allows.
pub fn write_block(writer: &mut BitWriter, tokens: &[Token], raw: &[u8], final_block: bool, mode: BlockMode)
{
    if mode == BlockMode::StoredOnly
    {
        // Stored blocks are limited to 65535 bytes each; split if needed.
        let chunks: Vec<&[u8]> = raw.chunks(u16::MAX as usize).collect();
        if chunks.is_empty()
        {
            write_stored_block(writer, &[], final_block);
            return;
        }
        for (i, chunk) in chunks.iter().enumerate()
        {
            let is_last_chunk = i == chunks.len() - 1;
            write_stored_block(writer, chunk, final_block && is_last_chunk);
        }
        return;
    }

    let (lit_freq, dist_freq) = build_histograms(tokens);
    let dyn_lit_lens = length_limited_code_lengths(&lit_freq, MAX_CODEWORD_LEN);
    let dyn_dist_lens = length_limited_code_lengths(&dist_freq, MAX_CODEWORD_LEN);

    let fixed_lit_lens = fixed_litlen_lengths();
    let fixed_dist_lens = fixed_dist_lengths();
    let fixed_cost = 3
        + token_stream_cost(tokens, &fixed_lit_lens, &fixed_dist_lens)
        + fixed_lit_lens[END_OF_BLOCK_SYMBOL as usize] as usize;

    let plan = plan_dynamic_block(&dyn_lit_lens, &dyn_dist_lens);
    let dynamic_cost = 3
        + plan.header_bits
        + token_stream_cost(tokens, &dyn_lit_lens, &dyn_dist_lens)
        + dyn_lit_lens[END_OF_BLOCK_SYMBOL as usize] as usize;

    if mode == BlockMode::HuffmanOnly
    {
        write_huffman_coded_block(
            writer,
            tokens,
            &dyn_lit_lens,
            &dyn_dist_lens,
            &plan,
            fixed_cost,
            dynamic_cost,
            final_block
        );
        return;
    }

    let stored_cost = if raw.len() <= u16::MAX as usize { 3 + 7 + 32 + raw.len() * 8 } else { usize::MAX };

    // §4.6: even when a Huffman coding is cheaper, a small input that
    // doesn't actually shrink (compressed size ≥ raw size) is stored
    // instead, so the block carries no Huffman-table overhead for data
    // that gains nothing from it.
    let best_huffman_bytes = (fixed_cost.min(dynamic_cost) + 7) / 8;
    let ratio_forces_stored = stored_cost != usize::MAX && best_huffman_bytes >= raw.len();

    if ratio_forces_stored
    {
        write_stored_block(writer, raw, final_block);
    }
    else if dynamic_cost <= fixed_cost && dynamic_cost <= stored_cost
    {
        write_dynamic_block(writer, tokens, &dyn_lit_lens, &dyn_dist_lens, &plan, final_block);
    }
    else if fixed_cost <= stored_cost
    {
        write_fixed_block(writer, tokens, final_block);
    }
    else
    {
        write_stored_block(writer, raw, final_block);
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn rle_collapses_long_zero_runs()
    {
        let mut lens = vec![3_u8, 3];
        lens.extend(std::iter::repeat(0).take(20));
        let rle = rle_encode_lengths(&lens);
        assert!(rle.iter().any(|&(sym, _)| sym == 18));
    }

    #[test]
    fn stored_block_round_trips_header_fields()
    {
        let mut writer = BitWriter::new();
        write_stored_block(&mut writer, b"hello world\n", true);
        let bytes = writer.finish();
        // 1 bit final + 2 bit type + 5 pad bits = 1 byte header.
        assert_eq!(bytes[0] & 0b111, 0b001);
        let len = u16::from_le_bytes([bytes[1], bytes[2]]);
        assert_eq!(len as usize, 12);
    }
}
