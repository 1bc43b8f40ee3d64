//! String similarity scoring for track matching.
//!
//! Implements the Ratcliff/Obershelp ratio: twice the number of matching
//! characters divided by the total length of both strings, where matching
//! characters are found by recursively taking the longest common substring
//! and matching the pieces to its left and right.

use rustc_hash::FxHashMap;

/// Similarity of two strings in `[0.0, 1.0]`.
///
/// 1.0 for equal strings (including two empty strings), 0.0 when the
/// strings share no characters.
pub fn similarity(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    let matches = matching_chars(&a, &b, 0, a.len(), 0, b.len());
    2.0 * matches as f64 / total as f64
}

/// Longest common substring of `a[a_lo..a_hi]` and `b[b_lo..b_hi]`.
///
/// Returns `(start_a, start_b, len)`; on ties the earliest block in `a`
/// (then in `b`) wins, so decomposition is deterministic.
fn longest_match(
    a: &[char],
    b: &[char],
    a_lo: usize,
    a_hi: usize,
    b_lo: usize,
    b_hi: usize,
) -> (usize, usize, usize) {
    let mut best = (a_lo, b_lo, 0usize);
    // run_lengths[j] = length of the common run ending at a[i], b[j]
    let mut run_lengths: FxHashMap<usize, usize> = FxHashMap::default();
    for i in a_lo..a_hi {
        let mut next_runs = FxHashMap::default();
        for j in b_lo..b_hi {
            if a[i] == b[j] {
                let len = j
                    .checked_sub(1)
                    .and_then(|prev| run_lengths.get(&prev))
                    .copied()
                    .unwrap_or(0)
                    + 1;
                next_runs.insert(j, len);
                if len > best.2 {
                    best = (i + 1 - len, j + 1 - len, len);
                }
            }
        }
        run_lengths = next_runs;
    }
    best
}

fn matching_chars(
    a: &[char],
    b: &[char],
    a_lo: usize,
    a_hi: usize,
    b_lo: usize,
    b_hi: usize,
) -> usize {
    let (start_a, start_b, len) = longest_match(a, b, a_lo, a_hi, b_lo, b_hi);
    if len == 0 {
        return 0;
    }
    len + matching_chars(a, b, a_lo, start_a, b_lo, start_b)
        + matching_chars(a, b, start_a + len, a_hi, start_b + len, b_hi)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn equal_strings_score_one() {
        assert_close(similarity("01 Song One", "01 Song One"), 1.0);
        assert_close(similarity("", ""), 1.0);
    }

    #[test]
    fn disjoint_strings_score_zero() {
        assert_close(similarity("abc", "xyz"), 0.0);
        assert_close(similarity("", "abc"), 0.0);
    }

    #[test]
    fn known_ratios() {
        // blocks: "bcd" -> 2*3 / (4+4)
        assert_close(similarity("abcd", "bcde"), 0.75);
        // the extension only costs the ratio, the stem still matches fully
        assert_close(similarity("01 Song One.mp3", "01 Song One"), 22.0 / 26.0);
    }

    #[test]
    fn closer_track_number_scores_higher() {
        let target = "01 Song One";
        assert!(similarity("01 Song One.mp3", target) > similarity("02 Song Two.mp3", target));
        assert!(similarity("01-song_one.flac", target) > similarity("09-intro.flac", target));
    }

    #[test]
    fn ratio_is_symmetric_in_length_totals() {
        // 2*M/total is unchanged by argument order for these pairs
        assert_close(
            similarity("abcd", "bcde"),
            similarity("bcde", "abcd"),
        );
    }
}
