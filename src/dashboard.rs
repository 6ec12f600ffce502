//! Dashboard aggregation helpers.
//!
//! Pure data reshaping behind the summary tiles and bar charts: counts,
//! lessons grouped per standard, lessons grouped per grade. Rendering is the
//! caller's concern.

use crate::models::{ChartBar, DashboardStats, Lesson, Standard};
use std::collections::HashMap;

/// Bar ceiling for the distribution charts.
pub const MAX_CHART_BARS: usize = 15;

/// Questions assumed per lesson when no lesson carries sample questions.
const QUESTIONS_PER_LESSON_ESTIMATE: usize = 4;

// ============================================================================
// Aggregation
// ============================================================================

pub fn summary_stats(standards: &[Standard], lessons: &[Lesson]) -> DashboardStats {
    let question_count: usize = lessons.iter().map(|l| l.sample_questions.len()).sum();

    let (question_count, questions_estimated) = if question_count == 0 {
        (lessons.len() * QUESTIONS_PER_LESSON_ESTIMATE, true)
    } else {
        (question_count, false)
    };

    DashboardStats {
        standard_count: standards.len(),
        lesson_count: lessons.len(),
        question_count,
        questions_estimated,
    }
}

/// Lessons grouped by standard code, labeled with the standard's name.
/// Standards without lessons are dropped, bars sort by code, and the chart
/// keeps at most `MAX_CHART_BARS` entries.
pub fn lessons_per_standard(standards: &[Standard], lessons: &[Lesson]) -> Vec<ChartBar> {
    let mut counts: HashMap<&str, usize> = standards.iter().map(|s| (s.code.as_str(), 0)).collect();

    // Lessons referencing an unknown standard are ignored.
    for lesson in lessons {
        if let Some(ref code) = lesson.standard_code {
            if let Some(count) = counts.get_mut(code.as_str()) {
                *count += 1;
            }
        }
    }

    let mut bars: Vec<ChartBar> = standards
        .iter()
        .filter_map(|standard| {
            let count = counts.get(standard.code.as_str()).copied().unwrap_or(0);
            if count == 0 {
                return None;
            }
            let label = if standard.name.is_empty() {
                standard.code.clone()
            } else {
                standard.name.clone()
            };
            Some(ChartBar {
                key: standard.code.clone(),
                label,
                count,
            })
        })
        .collect();

    bars.sort_by(|a, b| a.key.cmp(&b.key));
    bars.truncate(MAX_CHART_BARS);
    bars
}

/// Lessons grouped by grade. Grades sort numerically when both contain a
/// number ("grade 10" after "grade 9"), alphabetically otherwise.
pub fn lessons_per_grade(lessons: &[Lesson]) -> Vec<ChartBar> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for lesson in lessons {
        let grade = lesson
            .grade
            .clone()
            .unwrap_or_else(|| "Unknown".to_string());
        *counts.entry(grade).or_insert(0) += 1;
    }

    let mut bars: Vec<ChartBar> = counts
        .into_iter()
        .map(|(grade, count)| ChartBar {
            key: grade.clone(),
            label: grade,
            count,
        })
        .collect();

    bars.sort_by(|a, b| match (grade_number(&a.key), grade_number(&b.key)) {
        (Some(na), Some(nb)) => na.cmp(&nb),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => a.key.cmp(&b.key),
    });
    bars
}

/// First run of digits in a grade label, if any.
fn grade_number(grade: &str) -> Option<u32> {
    let digits: String = grade
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

// ============================================================================
// Tests
// ============================================================================
