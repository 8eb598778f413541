//! Course-number normalization against a valid-course snapshot.
//!
//! A record whose course number is in the snapshot passes through untouched.
//! Otherwise the course number is truncated at the first delimiter, which
//! recovers values such as `CS101-A` (course plus section suffix). Values
//! without a delimiter cannot be repaired and are returned unchanged.

use std::collections::HashSet;

use tracing::warn;

use crate::constants::normalize::COURSE_NO_DELIMITER;
use crate::data::{ClassRecord, TakesRecord};
use crate::types::CourseNo;

/// Read-only snapshot of every course number known to be valid.
///
/// Built once per pass and shared read-only with every worker; membership
/// tests are hash lookups.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ValidCourseSet {
    courses: HashSet<CourseNo>,
}

impl ValidCourseSet {
    /// Empty snapshot. Every lookup misses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a snapshot from Class table rows. Duplicate rows collapse.
    pub fn from_classes(classes: impl IntoIterator<Item = ClassRecord>) -> Self {
        classes
            .into_iter()
            .map(|class| class.course_no)
            .collect()
    }

    /// True if `course_no` is a known valid course number.
    pub fn contains(&self, course_no: &str) -> bool {
        self.courses.contains(course_no)
    }

    /// Number of distinct course numbers.
    pub fn len(&self) -> usize {
        self.courses.len()
    }

    /// True if the Class table held no course numbers.
    pub fn is_empty(&self) -> bool {
        self.courses.is_empty()
    }

    /// Course numbers in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = &str> + '_ {
        self.courses.iter().map(String::as_str)
    }
}

impl<S: Into<CourseNo>> FromIterator<S> for ValidCourseSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            courses: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// Decision taken for a single record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Correction {
    /// Course number was already in the snapshot.
    Valid,
    /// Course number was truncated at the first delimiter.
    Corrected {
        /// Value before truncation.
        original: CourseNo,
    },
    /// Course number is not valid and has no delimiter to split on.
    Uncorrectable,
}

impl Correction {
    /// The record was already valid.
    pub fn is_valid(&self) -> bool {
        matches!(self, Correction::Valid)
    }

    /// The course number was truncated.
    pub fn is_corrected(&self) -> bool {
        matches!(self, Correction::Corrected { .. })
    }

    /// The record was left unchanged for review.
    pub fn is_uncorrectable(&self) -> bool {
        matches!(self, Correction::Uncorrectable)
    }
}

/// Stateless normalizer parameterized by the split delimiter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Normalizer {
    delimiter: char,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self {
            delimiter: COURSE_NO_DELIMITER,
        }
    }
}

impl Normalizer {
    /// Override the split delimiter.
    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Character the course number is split on.
    pub fn delimiter(&self) -> char {
        self.delimiter
    }

    /// Decide what `normalize` would do with `record`, without logging.
    pub fn classify(&self, record: &TakesRecord, valid_courses: &ValidCourseSet) -> Correction {
        if valid_courses.contains(&record.course_no) {
            Correction::Valid
        } else if self.prefix(&record.course_no).is_some() {
            Correction::Corrected {
                original: record.course_no.clone(),
            }
        } else {
            Correction::Uncorrectable
        }
    }

    /// Normalize `record` and report the decision taken.
    ///
    /// Emits one `warn!` per record whose course number is not in the snapshot.
    pub fn normalize_with_outcome(
        &self,
        mut record: TakesRecord,
        valid_courses: &ValidCourseSet,
    ) -> (TakesRecord, Correction) {
        if valid_courses.contains(&record.course_no) {
            return (record, Correction::Valid);
        }
        match self.prefix(&record.course_no).map(str::to_string) {
            Some(prefix) => {
                warn!(
                    "[takes:normalize] found bad cno: {} (sid={}); corrected to {}",
                    record.course_no, record.student_id, prefix
                );
                let original = std::mem::replace(&mut record.course_no, prefix);
                (record, Correction::Corrected { original })
            }
            None => {
                warn!(
                    "[takes:normalize] found bad cno: {} (sid={}); no '{}' to split on, left for review",
                    record.course_no, record.student_id, self.delimiter
                );
                (record, Correction::Uncorrectable)
            }
        }
    }

    /// Normalize `record`, discarding the decision.
    pub fn normalize(&self, record: TakesRecord, valid_courses: &ValidCourseSet) -> TakesRecord {
        self.normalize_with_outcome(record, valid_courses).0
    }

    fn prefix<'a>(&self, course_no: &'a str) -> Option<&'a str> {
        course_no
            .split_once(self.delimiter)
            .map(|(prefix, _)| prefix)
    }
}

/// Normalize one Takes record with the default `-` delimiter.
///
/// Exactly one record comes out for every record that goes in.
pub fn normalize(record: TakesRecord, valid_courses: &ValidCourseSet) -> TakesRecord {
    Normalizer::default().normalize(record, valid_courses)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::{Arc, Mutex};

    fn courses(values: &[&str]) -> ValidCourseSet {
        values.iter().copied().collect()
    }

    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl CapturedLogs {
        fn text(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    impl io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn with_captured_logs(body: impl FnOnce()) -> String {
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::TRACE)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        tracing::subscriber::with_default(subscriber, body);
        logs.text()
    }

    #[test]
    fn section_suffix_is_truncated() {
        let valid = courses(&["CS101", "MATH200"]);
        let out = normalize(TakesRecord::new("S1", "CS101-A", "B"), &valid);
        assert_eq!(out, TakesRecord::new("S1", "CS101", "B"));
    }

    #[test]
    fn valid_course_passes_through() {
        let valid = courses(&["CS101", "PHYS300"]);
        let record = TakesRecord::new("S2", "PHYS300", "A");
        assert_eq!(normalize(record.clone(), &valid), record);
    }

    #[test]
    fn value_without_delimiter_is_left_unchanged() {
        let valid = courses(&["CS101"]);
        let record = TakesRecord::new("S3", "ZZZ", "C");
        let (out, correction) = Normalizer::default().normalize_with_outcome(record.clone(), &valid);
        assert_eq!(out, record);
        assert_eq!(correction, Correction::Uncorrectable);
    }

    #[test]
    fn bad_course_numbers_are_named_in_a_warning() {
        let valid = courses(&["CS101", "PHYS300"]);
        let logs = with_captured_logs(|| {
            normalize(TakesRecord::new("S1", "CS101-A", "B"), &valid);
            normalize(TakesRecord::new("S2", "PHYS300", "A"), &valid);
            normalize(TakesRecord::new("S3", "ZZZ", "C"), &valid);
        });

        assert!(logs.contains("found bad cno: CS101-A"), "{logs}");
        assert!(logs.contains("found bad cno: ZZZ"), "{logs}");
        assert!(!logs.contains("PHYS300"), "{logs}");
        assert_eq!(logs.lines().count(), 2, "{logs}");
        assert!(logs.lines().all(|line| line.contains("WARN")), "{logs}");
    }

    #[test]
    fn valid_records_log_nothing() {
        let valid = courses(&["CS101"]);
        let logs = with_captured_logs(|| {
            normalize(TakesRecord::new("S1", "CS101", "B"), &valid);
        });
        assert!(logs.is_empty(), "{logs}");
    }

    #[test]
    fn only_first_delimiter_is_split() {
        let valid = courses(&["CS101"]);
        let (out, correction) = Normalizer::default()
            .normalize_with_outcome(TakesRecord::new("S4", "CS101-A-LAB", "A"), &valid);
        assert_eq!(out.course_no, "CS101");
        assert_eq!(
            correction,
            Correction::Corrected {
                original: "CS101-A-LAB".to_string()
            }
        );
    }

    #[test]
    fn leading_delimiter_yields_empty_prefix() {
        let valid = courses(&["CS101"]);
        let out = normalize(TakesRecord::new("S5", "-A", "B"), &valid);
        assert_eq!(out.course_no, "");
    }

    #[test]
    fn empty_snapshot_corrects_every_delimited_value() {
        let valid = ValidCourseSet::new();
        assert!(valid.is_empty());
        let out = normalize(TakesRecord::new("S6", "MATH200-H", "A"), &valid);
        assert_eq!(out.course_no, "MATH200");
        let out = normalize(TakesRecord::new("S6", "MATH200", "A"), &valid);
        assert_eq!(out.course_no, "MATH200");
    }

    #[test]
    fn prefix_that_is_still_invalid_is_reported_as_corrected() {
        let valid = courses(&["CS101"]);
        let (out, correction) = Normalizer::default()
            .normalize_with_outcome(TakesRecord::new("S7", "BIO9-X", "B"), &valid);
        assert_eq!(out.course_no, "BIO9");
        assert!(correction.is_corrected());
    }

    #[test]
    fn normalizing_twice_matches_normalizing_once() {
        let valid = courses(&["CS101", "MATH200", "PHYS300"]);
        let inputs = [
            "CS101", "CS101-A", "CS101-A-B", "ZZZ", "ZZZ-1", "-", "", "MATH200-", "PHYS300",
        ];
        for course_no in inputs {
            let once = normalize(TakesRecord::new("S", course_no, "A"), &valid);
            let twice = normalize(once.clone(), &valid);
            assert_eq!(once, twice, "course_no {course_no:?}");
        }
    }

    #[test]
    fn classify_agrees_with_normalize() {
        let valid = courses(&["CS101"]);
        let normalizer = Normalizer::default();
        for course_no in ["CS101", "CS101-A", "ZZZ"] {
            let record = TakesRecord::new("S", course_no, "A");
            let predicted = normalizer.classify(&record, &valid);
            let (_, observed) = normalizer.normalize_with_outcome(record, &valid);
            assert_eq!(predicted, observed);
        }
    }

    #[test]
    fn custom_delimiter_is_honored() {
        let valid = courses(&["CS101"]);
        let normalizer = Normalizer::default().with_delimiter('/');
        assert_eq!(normalizer.delimiter(), '/');
        let out = normalizer.normalize(TakesRecord::new("S8", "CS101/A", "B"), &valid);
        assert_eq!(out.course_no, "CS101");
        let out = normalizer.normalize(TakesRecord::new("S8", "CS101-A", "B"), &valid);
        assert_eq!(out.course_no, "CS101-A");
    }

    #[test]
    fn snapshot_collapses_duplicate_classes() {
        let valid = ValidCourseSet::from_classes(vec![
            ClassRecord::new("CS101"),
            ClassRecord::new("CS101"),
            ClassRecord::new("MATH200"),
        ]);
        assert_eq!(valid.len(), 2);
        let mut listed: Vec<&str> = valid.iter().collect();
        listed.sort();
        assert_eq!(listed, vec!["CS101", "MATH200"]);
    }

    #[test]
    fn shared_snapshot_gives_same_answer_on_every_thread() {
        let valid = Arc::new(courses(&["CS101"]));
        let results: Vec<TakesRecord> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..4)
                .map(|idx| {
                    let valid = Arc::clone(&valid);
                    scope.spawn(move || {
                        normalize(TakesRecord::new(format!("S{idx}"), "CS101-A", "B"), &valid)
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        assert!(results.iter().all(|record| record.course_no == "CS101"));
    }
}
