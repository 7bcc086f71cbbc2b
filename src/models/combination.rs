use std::fmt;
use std::str::FromStr;

use crate::rules::RuleError;

/// Number of values in a combination.
pub const PICK: usize = 6;

/// Smallest drawable number.
pub const MIN_NUMBER: u8 = 1;

/// Largest drawable number.
pub const MAX_NUMBER: u8 = 45;

/// C(45, 6): size of the full combination space.
pub const TOTAL_COMBINATIONS: u64 = 8_145_060;

/// Six distinct numbers from 1..=45 in strictly ascending order.
///
/// The invariant is enforced at construction, so everything downstream of the
/// enumerator can rely on it without re-checking. The text form (and the
/// soft-delete signature) is the comma-joined ascending values, e.g. `1,2,3,4,5,6`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Combination([u8; PICK]);

impl Combination {
    /// Build a combination from values that are already strictly ascending.
    pub fn new(numbers: [u8; PICK]) -> Result<Self, RuleError> {
        for (i, &value) in numbers.iter().enumerate() {
            if !(MIN_NUMBER..=MAX_NUMBER).contains(&value) {
                return Err(RuleError::out_of_range(value));
            }
            if i > 0 && value <= numbers[i - 1] {
                return Err(RuleError::InvalidCombination(format!(
                    "values must be strictly ascending, got {:?}",
                    numbers
                )));
            }
        }
        Ok(Self(numbers))
    }

    /// Validate an arbitrary slice and normalize it into a combination.
    ///
    /// Checks arity, range and distinctness, then sorts. This is the single
    /// validation path shared by every rule's `evaluate`.
    pub fn from_slice(values: &[u8]) -> Result<Self, RuleError> {
        let mut numbers: [u8; PICK] = values.try_into().map_err(|_| {
            RuleError::InvalidCombination(format!(
                "expected {} numbers, got {}",
                PICK,
                values.len()
            ))
        })?;

        if let Some(&bad) = numbers
            .iter()
            .find(|v| !(MIN_NUMBER..=MAX_NUMBER).contains(*v))
        {
            return Err(RuleError::out_of_range(bad));
        }

        numbers.sort_unstable();
        if numbers.windows(2).any(|w| w[0] == w[1]) {
            return Err(RuleError::InvalidCombination(format!(
                "values must be distinct, got {:?}",
                values
            )));
        }

        Ok(Self(numbers))
    }

    /// Internal constructor for the enumerator, which produces valid tuples by construction.
    pub(crate) const fn from_sorted_unchecked(numbers: [u8; PICK]) -> Self {
        Self(numbers)
    }

    pub fn numbers(&self) -> &[u8; PICK] {
        &self.0
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    pub fn sum(&self) -> u32 {
        self.0.iter().map(|&n| n as u32).sum()
    }

    pub fn contains(&self, number: u8) -> bool {
        self.0.binary_search(&number).is_ok()
    }

    /// Packs the six values into 36 bits (6 bits each). Collision-free because
    /// every value fits in 6 bits and the order is canonical.
    pub fn packed(&self) -> u64 {
        self.0
            .iter()
            .enumerate()
            .fold(0u64, |key, (i, &n)| key | ((n as u64 & 0x3F) << (i * 6)))
    }

    /// Canonical text signature used by the soft-delete set and the export sink.
    pub fn signature(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Combination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{},{},{},{},{},{}", a, b, c, d, e, g)
    }
}

impl FromStr for Combination {
    type Err = RuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let values = s
            .split(',')
            .map(|part| {
                part.trim().parse::<u8>().map_err(|_| {
                    RuleError::InvalidCombination(format!("'{}' is not a number in {}", part, s))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_slice(&values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_unsorted() {
        assert!(Combination::new([1, 2, 3, 4, 6, 5]).is_err());
        assert!(Combination::new([1, 1, 3, 4, 5, 6]).is_err());
        assert!(Combination::new([1, 2, 3, 4, 5, 6]).is_ok());
    }

    #[test]
    fn test_new_rejects_out_of_range() {
        assert!(Combination::new([0, 2, 3, 4, 5, 6]).is_err());
        assert!(Combination::new([1, 2, 3, 4, 5, 46]).is_err());
    }

    #[test]
    fn test_from_slice_sorts_and_validates() {
        let combo = Combination::from_slice(&[45, 3, 12, 1, 30, 22]).unwrap();
        assert_eq!(combo.numbers(), &[1, 3, 12, 22, 30, 45]);

        assert!(Combination::from_slice(&[1, 2, 3, 4, 5]).is_err());
        assert!(Combination::from_slice(&[1, 2, 3, 4, 5, 6, 7]).is_err());
        assert!(Combination::from_slice(&[1, 2, 3, 4, 5, 5]).is_err());
        assert!(Combination::from_slice(&[1, 2, 3, 4, 5, 99]).is_err());
    }

    #[test]
    fn test_signature_and_parse() {
        let combo = Combination::new([1, 7, 13, 22, 38, 45]).unwrap();
        assert_eq!(combo.signature(), "1,7,13,22,38,45");
        assert_eq!("1,7,13,22,38,45".parse::<Combination>().unwrap(), combo);
        assert_eq!(" 45, 1,7 ,13,22,38".parse::<Combination>().unwrap(), combo);
        assert!("1,2,three,4,5,6".parse::<Combination>().is_err());
    }

    #[test]
    fn test_packed_key_is_distinct() {
        let a = Combination::new([1, 2, 3, 4, 5, 6]).unwrap();
        let b = Combination::new([1, 2, 3, 4, 5, 7]).unwrap();
        assert_ne!(a.packed(), b.packed());
        assert_eq!(a.packed(), Combination::from_slice(&[6, 5, 4, 3, 2, 1]).unwrap().packed());
    }

    #[test]
    fn test_sum_and_contains() {
        let combo = Combination::new([1, 2, 3, 10, 20, 30]).unwrap();
        assert_eq!(combo.sum(), 66);
        assert!(combo.contains(10));
        assert!(!combo.contains(11));
    }
}
