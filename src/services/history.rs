use crate::models::{Combination, MAX_NUMBER, PICK};
use crate::rules::RuleError;
use camino::{Utf8Path, Utf8PathBuf};
use std::collections::HashSet;
use std::fmt::Write as _;
use std::fs;
use thiserror::Error;

/// Read-only lookup of past first-prize draws.
///
/// Implementations must answer synchronously without I/O; the scan worker calls
/// this for every candidate.
pub trait DrawHistory: Send + Sync {
    fn contains_combination(&self, combo: &Combination) -> bool;
}

/// Errors from the draw history store
#[derive(Error, Debug)]
pub enum HistoryError {
    #[error("Failed to read draw history {path}: {source}")]
    Read {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write draw history {path}: {source}")]
    Write {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid draw {draw_no}: {source}")]
    InvalidDraw {
        draw_no: u32,
        #[source]
        source: RuleError,
    },

    #[error("Draw history has no file path")]
    NoPath,
}

/// One recorded first-prize draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawRecord {
    pub draw_no: u32,
    pub combination: Combination,
}

/// How often a number has been drawn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NumberStatistic {
    pub number: u8,
    pub count: u32,
    /// `count / total draws`
    pub rate: f64,
}

/// Append-only store of historical first-prize draws backed by a CSV file of
/// `drawNo,n1,n2,n3,n4,n5,n6` lines.
#[derive(Debug)]
pub struct WinningHistory {
    path: Option<Utf8PathBuf>,
    records: Vec<DrawRecord>,
    keys: HashSet<u64>,
    counts: [u32; MAX_NUMBER as usize + 1],
}

impl Default for WinningHistory {
    fn default() -> Self {
        Self {
            path: None,
            records: Vec::new(),
            keys: HashSet::new(),
            counts: [0; MAX_NUMBER as usize + 1],
        }
    }
}

impl WinningHistory {
    /// An in-memory store with no draws and no backing file.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load the store from `path`.
    ///
    /// A missing file gives an empty store bound to `path`. Lines that are blank,
    /// malformed, out of range or duplicates of an earlier draw are skipped.
    pub fn load(path: impl AsRef<Utf8Path>) -> Result<Self, HistoryError> {
        let path = path.as_ref();
        let mut history = Self {
            path: Some(path.to_path_buf()),
            ..Self::default()
        };

        if !path.exists() {
            tracing::info!("No draw history at {}, starting empty", path);
            return Ok(history);
        }

        let content = fs::read_to_string(path).map_err(|source| HistoryError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let mut skipped = 0usize;
        for line in content.lines().filter(|line| !line.trim().is_empty()) {
            match parse_line(line) {
                Some((draw_no, combination)) => {
                    if !history.insert(draw_no, combination) {
                        skipped += 1;
                    }
                }
                None => skipped += 1,
            }
        }
        history.records.sort_by_key(|record| record.draw_no);

        if skipped > 0 {
            tracing::warn!("Skipped {} invalid or duplicate lines in {}", skipped, path);
        }
        tracing::info!("Loaded {} historical draws from {}", history.len(), path);

        Ok(history)
    }

    pub fn path(&self) -> Option<&Utf8Path> {
        self.path.as_deref()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[DrawRecord] {
        &self.records
    }

    /// Record with the highest draw number.
    pub fn latest_draw(&self) -> Option<&DrawRecord> {
        self.records.iter().max_by_key(|record| record.draw_no)
    }

    /// Add a draw. Numbers may be in any order.
    ///
    /// # Returns
    ///
    /// `true` if the combination was new, `false` if it was already recorded.
    pub fn append(&mut self, draw_no: u32, numbers: [u8; PICK]) -> Result<bool, HistoryError> {
        let combination = Combination::from_slice(&numbers)
            .map_err(|source| HistoryError::InvalidDraw { draw_no, source })?;

        let added = self.insert(draw_no, combination);
        if added {
            self.records.sort_by_key(|record| record.draw_no);
        }
        Ok(added)
    }

    /// Write every record, ordered by draw number, to the backing file.
    pub fn save(&self) -> Result<(), HistoryError> {
        let path = self.path.as_ref().ok_or(HistoryError::NoPath)?;
        let write_error = |source: std::io::Error| HistoryError::Write {
            path: path.clone(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_str().is_empty()) {
            fs::create_dir_all(parent).map_err(write_error)?;
        }

        let mut content = String::with_capacity(self.records.len() * 24);
        for record in &self.records {
            // writing into a String cannot fail
            let _ = writeln!(content, "{},{}", record.draw_no, record.combination);
        }

        fs::write(path, content).map_err(write_error)?;
        tracing::debug!("Saved {} draws to {}", self.records.len(), path);
        Ok(())
    }

    /// Per-number draw counts and rates for 1..=45; empty when there are no draws.
    pub fn number_statistics(&self) -> Vec<NumberStatistic> {
        if self.records.is_empty() {
            return Vec::new();
        }

        let total = self.records.len() as f64;
        (1..=MAX_NUMBER)
            .map(|number| {
                let count = self.counts[number as usize];
                NumberStatistic {
                    number,
                    count,
                    rate: count as f64 / total,
                }
            })
            .collect()
    }

    fn insert(&mut self, draw_no: u32, combination: Combination) -> bool {
        if !self.keys.insert(combination.packed()) {
            return false;
        }
        for &n in combination.numbers() {
            self.counts[n as usize] += 1;
        }
        self.records.push(DrawRecord {
            draw_no,
            combination,
        });
        true
    }
}

impl DrawHistory for WinningHistory {
    fn contains_combination(&self, combo: &Combination) -> bool {
        self.keys.contains(&combo.packed())
    }
}

fn parse_line(line: &str) -> Option<(u32, Combination)> {
    let parts: Vec<&str> = line.split(',').map(str::trim).collect();
    if parts.len() != PICK + 1 {
        return None;
    }

    let draw_no = parts[0].parse::<u32>().ok()?;
    let numbers = parts[1..]
        .iter()
        .map(|part| part.parse::<u8>().ok())
        .collect::<Option<Vec<_>>>()?;

    Combination::from_slice(&numbers)
        .ok()
        .map(|combination| (draw_no, combination))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn combo(values: [u8; 6]) -> Combination {
        Combination::from_slice(&values).unwrap()
    }

    #[test]
    fn test_parse_line() {
        assert_eq!(
            parse_line("1001, 45,3,12,1,30,22"),
            Some((1001, combo([1, 3, 12, 22, 30, 45])))
        );
        assert_eq!(parse_line("1,2,3,4,5,6"), None);
        assert_eq!(parse_line("x,1,2,3,4,5,6"), None);
        assert_eq!(parse_line("1,1,2,3,4,5,46"), None);
        assert_eq!(parse_line("1,1,1,3,4,5,6"), None);
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let path = Utf8PathBuf::from_path_buf(dir.path().join("none.csv")).unwrap();

        let history = WinningHistory::load(&path).unwrap();
        assert!(history.is_empty());
        assert_eq!(history.path(), Some(path.as_path()));
        assert!(history.number_statistics().is_empty());
    }

    #[test]
    fn test_load_skips_bad_lines() {
        let dir = TempDir::new().unwrap();
        let path = Utf8PathBuf::from_path_buf(dir.path().join("history.csv")).unwrap();
        fs::write(
            &path,
            "2,5,10,15,20,25,30\n\nbogus\n1,1,2,3,4,5,6\n3,30,25,20,15,10,5\n4,1,2,3,4,5,99\n",
        )
        .unwrap();

        let history = WinningHistory::load(&path).unwrap();

        assert_eq!(history.len(), 2);
        assert_eq!(history.records()[0].draw_no, 1);
        assert_eq!(history.latest_draw().unwrap().draw_no, 2);
        assert!(history.contains_combination(&combo([5, 10, 15, 20, 25, 30])));
        assert!(!history.contains_combination(&combo([5, 10, 15, 20, 25, 31])));
    }

    #[test]
    fn test_append_and_statistics() {
        let mut history = WinningHistory::empty();
        assert!(history.append(2, [1, 2, 3, 4, 5, 6]).unwrap());
        assert!(history.append(1, [6, 7, 8, 9, 10, 1]).unwrap());
        assert!(!history.append(3, [6, 5, 4, 3, 2, 1]).unwrap());
        assert!(history.append(4, [1, 2, 3, 4, 5, 5]).is_err());

        let stats = history.number_statistics();
        assert_eq!(stats.len(), 45);
        assert_eq!(stats[0].number, 1);
        assert_eq!(stats[0].count, 2);
        assert!((stats[0].rate - 1.0).abs() < f64::EPSILON);
        assert_eq!(stats[6].count, 1);
        assert!((stats[6].rate - 0.5).abs() < f64::EPSILON);
        assert_eq!(stats[44].count, 0);

        assert_eq!(history.records()[0].draw_no, 1);
    }

    #[test]
    fn test_save_round_trips_in_draw_order() {
        let dir = TempDir::new().unwrap();
        let path = Utf8PathBuf::from_path_buf(dir.path().join("nested/history.csv")).unwrap();

        let mut history = WinningHistory::load(&path).unwrap();
        history.append(7, [40, 41, 42, 43, 44, 45]).unwrap();
        history.append(3, [1, 2, 3, 4, 5, 6]).unwrap();
        history.save().unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content, "3,1,2,3,4,5,6\n7,40,41,42,43,44,45\n");

        let reloaded = WinningHistory::load(&path).unwrap();
        assert_eq!(reloaded.len(), 2);
        assert!(reloaded.contains_combination(&combo([40, 41, 42, 43, 44, 45])));
    }

    #[test]
    fn test_save_without_path() {
        assert!(matches!(WinningHistory::empty().save(), Err(HistoryError::NoPath)));
    }
}
