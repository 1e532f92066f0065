/// Letter grade and GPA for a percentage score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradePoint {
    pub grade: &'static str,
    pub gpa: f64,
}

/// Thresholds are evaluated top-down; the first band the percentage reaches
/// wins. Anything below 55 is an F.
const GRADE_SCALE: &[(f64, &str, f64)] = &[
    (90.0, "A+", 4.0),
    (85.0, "A", 3.7),
    (80.0, "B+", 3.3),
    (75.0, "B", 3.0),
    (70.0, "C+", 2.7),
    (65.0, "C", 2.3),
    (60.0, "D+", 2.0),
    (55.0, "D", 1.7),
];

pub fn evaluate_grade(percentage: f64) -> GradePoint {
    let pct = if percentage.is_finite() { percentage } else { 0.0 };

    for (threshold, grade, gpa) in GRADE_SCALE {
        if pct >= *threshold {
            return GradePoint { grade, gpa: *gpa };
        }
    }

    GradePoint { grade: "F", gpa: 0.0 }
}
