//! Longest-match search over a [`HashChain`]: follow the chain for the
//! current 4-byte hash, extending each candidate against the lookahead,
//! stopping once a "nice" length is hit or the chain budget runs out.

use crate::constants::{MAX_MATCH_DISTANCE, MAX_MATCH_LENGTH, MIN_MATCH_LENGTH};
use crate::hashchain::HashChain;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Match
{
    pub length: usize,
    pub distance: usize
}

/// Length of the common run starting at `window[a]` and `window[pos]`,
/// capped at `max_len`.
#[inline]
fn match_length(window: &[u8], a: usize, pos: usize, max_len: usize) -> usize
{
    let mut n = 0;
    while n < max_len && window[a + n] == window[pos + n]
    {
        n += 1;
    }
    n
}

/// Insert `pos` into `chain` and search for the longest match against
/// earlier positions in `window`.
///
/// `lookahead_len` bounds how far the match may extend (the number of
/// valid bytes at and after `pos`); `min_len` is the best length already
/// known (from a deferred lazy match at the previous position, or 0) — a
/// candidate only replaces it if strictly longer. `good`/`nice`/`max_chain`
/// follow the level-tuning table.
#[allow(clippy::too_many_arguments)]
pub fn find_match(
    window: &[u8],
    pos: usize,
    lookahead_len: usize,
    min_len: usize,
    chain: &mut HashChain,
    good: usize,
    nice: usize,
    max_chain: usize
) -> Option<Match>
{
    if lookahead_len < 4 || pos + 4 > window.len()
    {
        return None;
    }

    let prev_pos = chain.add(&window[pos..], pos);
    if prev_pos == 0
    {
        return None;
    }

    let max_len = lookahead_len.min(MAX_MATCH_LENGTH);
    let mut best_len = min_len;
    let mut best_distance = 0_usize;
    let mut candidate = prev_pos;
    let mut tries = 0_usize;

    while candidate != 0
    {
        let distance = pos - candidate as usize;
        if distance > MAX_MATCH_DISTANCE
        {
            break;
        }

        let new_len = match_length(window, candidate as usize, pos, max_len);
        if new_len > best_len
        {
            best_len = new_len;
            best_distance = distance;
            if new_len >= nice
            {
                break;
            }
        }

        tries += 1;
        let budget = if best_len >= good { max_chain / 4 } else { max_chain };
        if tries >= budget
        {
            break;
        }
        candidate = chain.prev(candidate);
    }

    if best_len >= MIN_MATCH_LENGTH && best_distance > 0
    {
        Some(Match { length: best_len, distance: best_distance })
    }
    else
    {
        None
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn finds_earlier_occurrence()
    {
        let data = b"abcdabcdabcd";
        let mut chain = HashChain::new(data.len());
        for i in 0..data.len().saturating_sub(3)
        {
            let _ = find_match(data, i, data.len() - i, 0, &mut chain, 8, 128, 128);
        }
        let m = find_match(data, 8, data.len() - 8, 0, &mut chain, 8, 128, 128);
        assert_eq!(m, Some(Match { length: 4, distance: 4 }));
    }

    #[test]
    fn no_match_when_nothing_repeats()
    {
        let data = b"abcdefgh";
        let mut chain = HashChain::new(data.len());
        assert!(find_match(data, 0, data.len(), 0, &mut chain, 8, 128, 128).is_none());
        assert!(find_match(data, 4, data.len() - 4, 0, &mut chain, 8, 128, 128).is_none());
    }
}
