//! Fixed-length perceptual hashes and their Hamming distance.

use crate::error::HashError;

const NIBBLES_PER_WORD: usize = 16;

/// A perceptual hash parsed from its stored hex form.
///
/// Nibbles are packed big-endian into 64-bit words so distance is a word-wise
/// XOR and popcount.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PerceptualHash {
    words: Vec<u64>,
}

impl PerceptualHash {
    /// Parse a hex string that must be exactly `expected_len` characters.
    ///
    /// Upper and lower case digits are both accepted. `record_id` is only
    /// used to label the error.
    pub fn parse(record_id: i64, value: &str, expected_len: usize) -> Result<Self, HashError> {
        let malformed = |reason: String| HashError::Malformed {
            record_id,
            value: value.to_string(),
            reason,
        };

        if value.len() != expected_len {
            return Err(malformed(format!(
                "expected {} hex characters, found {}",
                expected_len,
                value.chars().count()
            )));
        }

        let mut words = vec![0u64; expected_len.div_ceil(NIBBLES_PER_WORD)];
        for (i, c) in value.chars().enumerate() {
            let nibble = c
                .to_digit(16)
                .ok_or_else(|| malformed(format!("invalid hex character {c:?} at position {i}")))?;
            let shift = 60 - 4 * (i % NIBBLES_PER_WORD);
            words[i / NIBBLES_PER_WORD] |= u64::from(nibble) << shift;
        }

        Ok(Self { words })
    }

    /// Count of differing bits.
    ///
    /// Both hashes are expected to have the same length; any extra words on
    /// the longer side count as differing from zero.
    pub fn distance(&self, other: &PerceptualHash) -> u32 {
        let (long, short) = if self.words.len() >= other.words.len() {
            (&self.words, &other.words)
        } else {
            (&other.words, &self.words)
        };
        long.iter()
            .enumerate()
            .map(|(i, w)| (w ^ short.get(i).copied().unwrap_or(0)).count_ones())
            .sum()
    }
}

/// Hamming distance between two hex hashes of equal length.
///
/// Returns `None` if either is not valid hex or the lengths differ.
pub fn hamming_distance(a: &str, b: &str) -> Option<u32> {
    if a.len() != b.len() {
        return None;
    }
    let ha = PerceptualHash::parse(0, a, a.len()).ok()?;
    let hb = PerceptualHash::parse(0, b, b.len()).ok()?;
    Some(ha.distance(&hb))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_identical() {
        assert_eq!(hamming_distance("aaaa", "aaaa"), Some(0));
    }

    #[test]
    fn test_distance_one_bit() {
        assert_eq!(hamming_distance("AAAA", "AAAB"), Some(1));
    }

    #[test]
    fn test_distance_all_bits() {
        assert_eq!(hamming_distance("0000", "ffff"), Some(16));
        assert_eq!(
            hamming_distance("0000000000000000", "ffffffffffffffff"),
            Some(64)
        );
    }

    #[test]
    fn test_distance_spans_multiple_words() {
        let a = "0".repeat(64);
        let mut b = "0".repeat(63);
        b.push('1');
        assert_eq!(hamming_distance(&a, &b), Some(1));

        let c = format!("8{}", "0".repeat(63));
        assert_eq!(hamming_distance(&a, &c), Some(1));
        assert_eq!(hamming_distance(&b, &c), Some(2));
    }

    #[test]
    fn test_case_insensitive_value() {
        assert_eq!(hamming_distance("abcd", "ABCD"), Some(0));
    }

    #[test]
    fn test_length_mismatch() {
        assert_eq!(hamming_distance("aaaa", "aaa"), None);
        let err = PerceptualHash::parse(9, "aaa", 4).unwrap_err();
        match err {
            HashError::Malformed {
                record_id, reason, ..
            } => {
                assert_eq!(record_id, 9);
                assert!(reason.contains("expected 4"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_invalid_character() {
        let err = PerceptualHash::parse(3, "aaxa", 4).unwrap_err();
        assert!(err.to_string().contains("invalid hex character 'x' at position 2"));
    }

    #[test]
    fn test_empty_value_rejected() {
        assert!(PerceptualHash::parse(1, "", 16).is_err());
    }
}
