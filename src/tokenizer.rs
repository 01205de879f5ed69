//! The lazy-matching main loop: turns a sliding window's lookahead into a
//! stream of [`Token`]s, deferring each match by one position to check
//! whether the next position starts an even longer one.

use crate::constants::MIN_MATCH_LENGTH;
use crate::hashchain::HashChain;
use crate::matchfinder::{find_match, Match};
use crate::token::Token;
use crate::window::SlidingWindow;

/// Hash-chain search tuning, selected per compression level (spec table:
/// levels 4..=9). Levels 1..=3 reuse level 4's tuning; level 0 and
/// Huffman-only mode never consult these fields at all, since matching is
/// disabled entirely for them (see `matching_enabled` on `Tokenizer::run`).
#[derive(Debug, Clone, Copy)]
pub struct LevelArgs
{
    pub good: usize,
    pub lazy: usize,
    pub nice: usize,
    pub chain: usize
}

pub fn level_args(level: u8) -> LevelArgs
{
    match level
    {
        0..=4 => LevelArgs { good: 4, lazy: 4, nice: 16, chain: 16 },
        5 => LevelArgs { good: 8, lazy: 16, nice: 32, chain: 32 },
        6 => LevelArgs { good: 8, lazy: 16, nice: 128, chain: 128 },
        7 => LevelArgs { good: 8, lazy: 32, nice: 128, chain: 256 },
        8 => LevelArgs { good: 32, lazy: 128, nice: 258, chain: 1024 },
        _ => LevelArgs { good: 32, lazy: 258, nice: 258, chain: 4096 }
    }
}

#[derive(Default)]
pub struct Tokenizer
{
    prev_match: Option<Match>,
    prev_literal: Option<u8>
}

impl Tokenizer
{
    pub fn new() -> Self
    {
        Tokenizer { prev_match: None, prev_literal: None }
    }

    /// True once any deferred state has been committed — callers must
    /// drain this before treating a block's token list as complete.
    pub fn is_idle(&self) -> bool
    {
        self.prev_match.is_none() && self.prev_literal.is_none()
    }

    /// Run the lazy-matching loop, appending tokens to `out` until the
    /// lookahead is exhausted, `out` reaches `max_tokens`, or (when
    /// `flush` is set and the lookahead runs out) every deferred byte has
    /// been committed.
    ///
    /// When `matching_enabled` is false, LZ77 match search never runs at
    /// all: every byte becomes its own `Literal` token. This is how level 0
    /// ("stored only") and Huffman-only mode satisfy "no LZ77" — the
    /// `BlockWriter` then decides separately whether those literals get
    /// stored raw or Huffman-coded.
    pub fn run(
        &mut self,
        window: &mut SlidingWindow,
        chain: &mut HashChain,
        args: &LevelArgs,
        matching_enabled: bool,
        flush: bool,
        out: &mut Vec<Token>,
        max_tokens: usize
    )
    {
        loop
        {
            if out.len() >= max_tokens
            {
                break;
            }
            let lookahead_len = window.write_pos() - window.read_pos();
            if lookahead_len == 0
            {
                break;
            }

            let pos = window.read_pos();
            let cur_byte = window.window()[pos];

            if !matching_enabled
            {
                out.push(Token::literal(cur_byte));
                window.advance(1);
                continue;
            }

            if !flush && lookahead_len < MIN_MATCH_LENGTH + 1
            {
                break;
            }

            let min_len = self.prev_match.map_or(0, |m| m.length);
            let found =
                find_match(window.window(), pos, lookahead_len, min_len, chain, args.good, args.nice, args.chain);

            match found
            {
                Some(m) =>
                {
                    if let Some(lit) = self.prev_literal.take()
                    {
                        out.push(Token::literal(lit));
                    }
                    if m.length >= args.lazy
                    {
                        out.push(Token::new_match(m.length, m.distance));
                        if m.length > 1
                        {
                            chain.bulk_add(window.window(), m.length - 1, pos + 1);
                        }
                        window.advance(m.length);
                        self.prev_match = None;
                    }
                    else
                    {
                        self.prev_match = Some(m);
                        self.prev_literal = Some(cur_byte);
                        window.advance(1);
                    }
                }
                None =>
                {
                    if let Some(pm) = self.prev_match.take()
                    {
                        out.push(Token::new_match(pm.length, pm.distance));
                        let step = pm.length - 1;
                        if step > 1
                        {
                            chain.bulk_add(window.window(), step - 1, pos + 1);
                        }
                        window.advance(step);
                        self.prev_literal = None;
                    }
                    else
                    {
                        if let Some(lit) = self.prev_literal.take()
                        {
                            out.push(Token::literal(lit));
                        }
                        self.prev_literal = Some(cur_byte);
                        window.advance(1);
                    }
                }
            }
        }

        if flush && window.read_pos() == window.write_pos()
        {
            if let Some(pm) = self.prev_match.take()
            {
                out.push(Token::new_match(pm.length, pm.distance));
            }
            else if let Some(lit) = self.prev_literal.take()
            {
                out.push(Token::literal(lit));
            }
        }
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    fn tokenize_all(data: &[u8]) -> Vec<Token>
    {
        let mut window = SlidingWindow::new();
        let mut chain = HashChain::new(data.len() + 1);
        let mut tokenizer = Tokenizer::new();
        let mut out = Vec::new();
        window.write(data);
        tokenizer.run(&mut window, &mut chain, &level_args(6), true, true, &mut out, usize::MAX);
        out
    }

    fn detokenize(tokens: &[Token]) -> Vec<u8>
    {
        let mut out = Vec::new();
        for t in tokens
        {
            match *t
            {
                Token::Literal(b) => out.push(b),
                Token::Match { length, distance } =>
                {
                    let start = out.len() - distance as usize;
                    for i in 0..length as usize
                    {
                        out.push(out[start + i]);
                    }
                }
            }
        }
        out
    }

    #[test]
    fn round_trips_through_detokenize()
    {
        let data = b"Blah blah blah blah blah!";
        let tokens = tokenize_all(data);
        assert_eq!(detokenize(&tokens), data);
    }

    #[test]
    fn self_overlapping_match_round_trips()
    {
        let data = b"aaaaaaaaaa";
        let tokens = tokenize_all(data);
        assert_eq!(detokenize(&tokens), data);
    }

    #[test]
    fn repeated_word_round_trips()
    {
        let data = b"ABCDEABCD ABCDEABCD";
        let tokens = tokenize_all(data);
        assert_eq!(detokenize(&tokens), data);
    }
}
