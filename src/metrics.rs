use std::collections::HashMap;

use crate::data::TakesRecord;
use crate::normalize::Correction;
use crate::types::CourseNo;

/// Per-pass correction counts.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CorrectionSummary {
    /// Records seen.
    pub total: usize,
    /// Records whose course number was already valid.
    pub valid: usize,
    /// Records truncated at the delimiter.
    pub corrected: usize,
    /// Records left unchanged for review.
    pub uncorrectable: usize,
    /// Occurrences of each course number that was not in the snapshot.
    pub bad_course_counts: HashMap<CourseNo, usize>,
}

/// One bad course number and its share of all bad records.
#[derive(Clone, Debug, PartialEq)]
pub struct BadCourseShare {
    /// Course number as it appeared before correction.
    pub course_no: CourseNo,
    /// Records carrying it.
    pub count: usize,
    /// `count` over all bad records, in `0.0..=1.0`.
    pub share: f64,
}

impl CorrectionSummary {
    /// Count one normalized record.
    pub fn record(&mut self, normalized: &TakesRecord, correction: &Correction) {
        self.total += 1;
        let bad = match correction {
            Correction::Valid => {
                self.valid += 1;
                return;
            }
            Correction::Corrected { original } => {
                self.corrected += 1;
                original
            }
            Correction::Uncorrectable => {
                self.uncorrectable += 1;
                &normalized.course_no
            }
        };
        *self.bad_course_counts.entry(bad.clone()).or_insert(0) += 1;
    }

    /// Build a summary from `(normalized, correction)` pairs.
    pub fn from_outcomes<'a>(
        outcomes: impl IntoIterator<Item = (&'a TakesRecord, &'a Correction)>,
    ) -> Self {
        let mut summary = Self::default();
        for (record, correction) in outcomes {
            summary.record(record, correction);
        }
        summary
    }

    /// Fraction of all records that were corrected.
    pub fn corrected_share(&self) -> f64 {
        share(self.corrected, self.total)
    }

    /// Fraction of all records that could not be corrected.
    pub fn uncorrectable_share(&self) -> f64 {
        share(self.uncorrectable, self.total)
    }

    /// Most frequent bad course numbers, highest count first, ties by name.
    pub fn most_frequent_bad(&self, limit: usize) -> Vec<BadCourseShare> {
        let bad_total = self.corrected + self.uncorrectable;
        let mut shares: Vec<BadCourseShare> = self
            .bad_course_counts
            .iter()
            .map(|(course_no, count)| BadCourseShare {
                course_no: course_no.clone(),
                count: *count,
                share: share(*count, bad_total),
            })
            .collect();
        shares.sort_by(|a, b| {
            b.count
                .cmp(&a.count)
                .then_with(|| a.course_no.cmp(&b.course_no))
        });
        shares.truncate(limit);
        shares
    }
}

fn share(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64
    }
}
