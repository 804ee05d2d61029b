//! Per-field summary statistics
//!
//! Completeness is collected for every field. The statistics attached to a
//! field's `SummaryType` are collected on top of it.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::dictionary::SummaryType;

/// Statistics for one field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SummaryStats {
    Completeness,
    Average {
        min: Option<f64>,
        max: Option<f64>,
        average: Option<f64>,
        stddev: Option<f64>,
    },
    MinMax {
        min: Option<f64>,
        max: Option<f64>,
    },
    Frequency {
        counts: BTreeMap<String, u64>,
    },
    UniqueCount {
        distinct: u64,
    },
}

/// Summary of one field of one file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSummary {
    pub field: String,
    /// Rows carrying a usable value
    pub populated: u64,
    /// Rows with an empty cell or a missing code
    pub missing: u64,
    pub stats: SummaryStats,
}

impl FieldSummary {
    /// Fraction of rows carrying a usable value, 0 when no rows were seen
    pub fn completeness(&self) -> f64 {
        let total = self.populated + self.missing;
        if total == 0 {
            0.0
        } else {
            self.populated as f64 / total as f64
        }
    }
}

#[derive(Debug)]
enum Accumulator {
    Completeness,
    Numeric {
        count: u64,
        min: f64,
        max: f64,
        mean: f64,
        m2: f64,
        with_moments: bool,
    },
    Frequency(BTreeMap<String, u64>),
    Distinct(HashSet<String>),
}

/// Streams cell values of one field into a `FieldSummary`
#[derive(Debug)]
pub struct SummaryCollector {
    field: String,
    populated: u64,
    missing: u64,
    accumulator: Accumulator,
}

impl SummaryCollector {
    pub fn new(field: impl Into<String>, summary_type: Option<SummaryType>) -> Self {
        let accumulator = match summary_type {
            None => Accumulator::Completeness,
            Some(SummaryType::Average) | Some(SummaryType::MinMax) => Accumulator::Numeric {
                count: 0,
                min: f64::INFINITY,
                max: f64::NEG_INFINITY,
                mean: 0.0,
                m2: 0.0,
                with_moments: summary_type == Some(SummaryType::Average),
            },
            Some(SummaryType::Frequency) => Accumulator::Frequency(BTreeMap::new()),
            Some(SummaryType::UniqueCount) => Accumulator::Distinct(HashSet::new()),
        };
        Self {
            field: field.into(),
            populated: 0,
            missing: 0,
            accumulator,
        }
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn observe_missing(&mut self) {
        self.missing += 1;
    }

    /// Records a populated cell. `numeric` is the coerced value when the
    /// field is numeric and coercion succeeded.
    pub fn observe(&mut self, raw: &str, numeric: Option<f64>) {
        self.populated += 1;
        match &mut self.accumulator {
            Accumulator::Completeness => {}
            Accumulator::Numeric {
                count,
                min,
                max,
                mean,
                m2,
                ..
            } => {
                if let Some(x) = numeric {
                    // Welford's online update
                    *count += 1;
                    *min = min.min(x);
                    *max = max.max(x);
                    let delta = x - *mean;
                    *mean += delta / *count as f64;
                    *m2 += delta * (x - *mean);
                }
            }
            Accumulator::Frequency(counts) => {
                *counts.entry(raw.to_string()).or_insert(0) += 1;
            }
            Accumulator::Distinct(seen) => {
                if !seen.contains(raw) {
                    seen.insert(raw.to_string());
                }
            }
        }
    }

    pub fn finish(self) -> FieldSummary {
        let stats = match self.accumulator {
            Accumulator::Completeness => SummaryStats::Completeness,
            Accumulator::Numeric {
                count,
                min,
                max,
                mean,
                m2,
                with_moments,
            } => {
                let (min, max) = if count == 0 { (None, None) } else { (Some(min), Some(max)) };
                if with_moments {
                    SummaryStats::Average {
                        min,
                        max,
                        average: (count > 0).then_some(mean),
                        stddev: (count > 0).then(|| (m2 / count as f64).sqrt()),
                    }
                } else {
                    SummaryStats::MinMax { min, max }
                }
            }
            Accumulator::Frequency(counts) => SummaryStats::Frequency { counts },
            Accumulator::Distinct(seen) => SummaryStats::UniqueCount {
                distinct: seen.len() as u64,
            },
        };

        FieldSummary {
            field: self.field,
            populated: self.populated,
            missing: self.missing,
            stats,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_average_and_stddev() {
        let mut collector = SummaryCollector::new("age", Some(SummaryType::Average));
        for x in [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0] {
            collector.observe(&x.to_string(), Some(x));
        }
        collector.observe_missing();

        let summary = collector.finish();
        assert_eq!(summary.populated, 8);
        assert_eq!(summary.missing, 1);
        match summary.stats {
            SummaryStats::Average {
                min,
                max,
                average,
                stddev,
            } => {
                assert_eq!(min, Some(2.0));
                assert_eq!(max, Some(9.0));
                assert!((average.unwrap() - 5.0).abs() < 1e-9);
                assert!((stddev.unwrap() - 2.0).abs() < 1e-9);
            }
            other => panic!("unexpected stats {:?}", other),
        }
    }

    #[test]
    fn test_frequency_and_unique_count() {
        let mut frequency = SummaryCollector::new("sex", Some(SummaryType::Frequency));
        let mut distinct = SummaryCollector::new("sex", Some(SummaryType::UniqueCount));
        for v in ["1", "2", "1"] {
            frequency.observe(v, None);
            distinct.observe(v, None);
        }

        match frequency.finish().stats {
            SummaryStats::Frequency { counts } => assert_eq!(counts.get("1"), Some(&2)),
            other => panic!("unexpected stats {:?}", other),
        }
        assert_eq!(
            distinct.finish().stats,
            SummaryStats::UniqueCount { distinct: 2 }
        );
    }

    #[test]
    fn test_completeness_only() {
        let mut collector = SummaryCollector::new("notes", None);
        collector.observe("x", None);
        collector.observe_missing();
        let summary = collector.finish();
        assert_eq!(summary.stats, SummaryStats::Completeness);
        assert!((summary.completeness() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_min_max_without_values() {
        let summary = SummaryCollector::new("age", Some(SummaryType::MinMax)).finish();
        assert_eq!(summary.stats, SummaryStats::MinMax { min: None, max: None });
        assert_eq!(summary.completeness(), 0.0);
    }
}
