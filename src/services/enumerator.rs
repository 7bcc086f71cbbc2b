use crate::models::{Combination, MAX_NUMBER, PICK, TOTAL_COMBINATIONS};

/// Lazy iterator over every strictly ascending 6-combination of 1..=45 in
/// lexicographic order.
///
/// Each call to [`combinations()`] starts an independent sequence; the iterator
/// holds only the current tuple and the remaining count.
#[derive(Debug, Clone)]
pub struct Combinations {
    current: [u8; PICK],
    remaining: u64,
}

/// Start a fresh sequence at `1,2,3,4,5,6`.
pub fn combinations() -> Combinations {
    Combinations {
        current: [1, 2, 3, 4, 5, 6],
        remaining: TOTAL_COMBINATIONS,
    }
}

impl Combinations {
    /// Advance `current` to its lexicographic successor.
    ///
    /// Finds the rightmost position that can still grow (position `i` tops out at
    /// `45 - (5 - i)`), increments it and resets everything to its right to the
    /// smallest ascending tail.
    fn advance(&mut self) {
        for i in (0..PICK).rev() {
            let ceiling = MAX_NUMBER - (PICK - 1 - i) as u8;
            if self.current[i] < ceiling {
                self.current[i] += 1;
                for j in i + 1..PICK {
                    self.current[j] = self.current[j - 1] + 1;
                }
                return;
            }
        }
    }
}

impl Iterator for Combinations {
    type Item = Combination;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }

        let item = Combination::from_sorted_unchecked(self.current);
        self.remaining -= 1;
        if self.remaining > 0 {
            self.advance();
        }
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.remaining as usize;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Combinations {}

impl std::iter::FusedIterator for Combinations {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_items() {
        let first: Vec<String> = combinations().take(3).map(|c| c.signature()).collect();
        assert_eq!(first, vec!["1,2,3,4,5,6", "1,2,3,4,5,7", "1,2,3,4,5,8"]);
    }

    #[test]
    fn test_rollover() {
        // 1,2,3,4,5,45 is followed by 1,2,3,4,6,7
        let mut iter = combinations().skip(39);
        assert_eq!(iter.next().unwrap().signature(), "1,2,3,4,5,45");
        assert_eq!(iter.next().unwrap().signature(), "1,2,3,4,6,7");
    }

    #[test]
    fn test_exact_size() {
        let mut iter = combinations();
        assert_eq!(iter.len() as u64, TOTAL_COMBINATIONS);
        iter.next();
        assert_eq!(iter.len() as u64, TOTAL_COMBINATIONS - 1);
    }

    #[test]
    fn test_full_sequence() {
        let mut count = 0u64;
        let mut previous: Option<Combination> = None;
        let mut last = None;

        for combo in combinations() {
            assert!(combo.numbers().windows(2).all(|w| w[0] < w[1]));
            if let Some(prev) = previous {
                assert!(prev < combo, "{} should precede {}", prev, combo);
            }
            previous = Some(combo);
            last = Some(combo);
            count += 1;
        }

        assert_eq!(count, TOTAL_COMBINATIONS);
        assert_eq!(last.unwrap().signature(), "40,41,42,43,44,45");
    }

    #[test]
    fn test_restartable() {
        let a: Vec<_> = combinations().take(100).collect();
        let b: Vec<_> = combinations().take(100).collect();
        assert_eq!(a, b);
    }
}
