use takes_normalizer::{Correction, Normalizer, TakesRecord, ValidCourseSet, normalize};

fn valid_set(values: &[&str]) -> ValidCourseSet {
    values.iter().copied().collect()
}

fn course_numbers() -> Vec<&'static str> {
    vec![
        "CS101", "CS101-A", "CS101-", "CS101--B", "MATH200", "MATH200-H-2", "PHYS300", "ZZZ", "-",
        "-A", "", "BIO9-X", "bio9", "CS 101-A",
    ]
}

fn snapshots() -> Vec<ValidCourseSet> {
    vec![
        ValidCourseSet::new(),
        valid_set(&["CS101"]),
        valid_set(&["CS101", "MATH200", "PHYS300"]),
        valid_set(&["CS101-A", "ZZZ", ""]),
    ]
}

#[test]
fn valid_course_numbers_are_identity() {
    for valid in snapshots() {
        for course_no in course_numbers() {
            if !valid.contains(course_no) {
                continue;
            }
            let record = TakesRecord::new("S", course_no, "A");
            assert_eq!(normalize(record.clone(), &valid), record);
        }
    }
}

#[test]
fn invalid_delimited_values_keep_their_first_segment() {
    for valid in snapshots() {
        for course_no in course_numbers() {
            if valid.contains(course_no) || !course_no.contains('-') {
                continue;
            }
            let expected = course_no.split('-').next().unwrap_or_default();
            let out = normalize(TakesRecord::new("S", course_no, "A"), &valid);
            assert_eq!(out.course_no, expected, "input {course_no:?}");
        }
    }
}

#[test]
fn invalid_values_without_delimiter_pass_through() {
    for valid in snapshots() {
        for course_no in course_numbers() {
            if valid.contains(course_no) || course_no.contains('-') {
                continue;
            }
            let record = TakesRecord::new("S", course_no, "A");
            let (out, correction) =
                Normalizer::default().normalize_with_outcome(record.clone(), &valid);
            assert_eq!(out, record);
            assert_eq!(correction, Correction::Uncorrectable);
        }
    }
}

#[test]
fn normalization_is_idempotent() {
    for valid in snapshots() {
        for course_no in course_numbers() {
            let once = normalize(TakesRecord::new("S", course_no, "A"), &valid);
            let twice = normalize(once.clone(), &valid);
            assert_eq!(once, twice, "input {course_no:?}");
        }
    }
}

#[test]
fn only_the_course_number_changes() {
    let valid = valid_set(&["CS101"]);
    let out = normalize(TakesRecord::new("S9", "CS101-LAB", "B+"), &valid);
    assert_eq!(out.student_id, "S9");
    assert_eq!(out.grade, "B+");
}

#[test]
fn scenario_section_suffix_is_dropped() {
    let valid = valid_set(&["CS101", "MATH200"]);
    let out = normalize(TakesRecord::new("S1", "CS101-A", "B"), &valid);
    assert_eq!(out, TakesRecord::new("S1", "CS101", "B"));
}

#[test]
fn scenario_known_course_is_untouched() {
    let valid = valid_set(&["CS101", "PHYS300"]);
    let record = TakesRecord::new("S2", "PHYS300", "A");
    assert_eq!(normalize(record.clone(), &valid), record);
}

#[test]
fn scenario_unknown_course_without_delimiter_is_left_for_review() {
    let valid = valid_set(&["CS101"]);
    let record = TakesRecord::new("S3", "ZZZ", "C");
    let normalizer = Normalizer::default();
    assert_eq!(normalizer.classify(&record, &valid), Correction::Uncorrectable);
    let out = normalizer.normalize(record.clone(), &valid);
    assert_eq!(out.course_no, "ZZZ");
    assert_eq!(out, record);
}
