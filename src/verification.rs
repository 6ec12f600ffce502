//! Question verification view model.
//!
//! Curriculum questions embed their answer choices in the question text
//! itself, so this module scans for the handful of formats that actually
//! occur: lettered bullets, "the answer is X" designations, markdown tables,
//! true/false phrasing, and emphasized text as a last resort. The result is
//! a confidence-tagged guess, not a parse; callers surface low-confidence
//! output as a hint and nothing more.

use crate::models::{Choice, ChoiceExtraction, Confidence, ExtractionMethod, Question};
use regex::Regex;

// ============================================================================
// Choice Extraction
// ============================================================================

pub fn extract_choices(question_text: &str) -> ChoiceExtraction {
    // Lettered multiple choice is the common case; a designation phrase can
    // still name the correct letter when no inline marker does.
    let mut choices = extract_letter_choices(question_text);
    if !choices.is_empty() {
        let mut method = ExtractionMethod::LetterBullets;
        if !choices.iter().any(|c| c.correct) {
            if let Some(letter) = find_designated_answer(question_text) {
                for choice in &mut choices {
                    choice.correct = choice.label.eq_ignore_ascii_case(&letter);
                }
                if choices.iter().any(|c| c.correct) {
                    method = ExtractionMethod::AnswerDesignation;
                }
            }
        }
        let correct_identified = choices.iter().any(|c| c.correct);
        return ChoiceExtraction {
            choices,
            method,
            confidence: if correct_identified {
                Confidence::High
            } else {
                Confidence::Medium
            },
            correct_identified,
        };
    }

    let table = extract_table_choices(question_text);
    if !table.is_empty() {
        let correct_identified = table.iter().any(|c| c.correct);
        return ChoiceExtraction {
            choices: table,
            method: ExtractionMethod::Table,
            confidence: Confidence::Medium,
            correct_identified,
        };
    }

    if let Some(tf) = extract_true_false(question_text) {
        let correct_identified = tf.iter().any(|c| c.correct);
        return ChoiceExtraction {
            choices: tf,
            method: ExtractionMethod::TrueFalse,
            confidence: if correct_identified {
                Confidence::High
            } else {
                Confidence::Medium
            },
            correct_identified,
        };
    }

    let emphasized = extract_emphasized(question_text);
    if !emphasized.is_empty() {
        return ChoiceExtraction {
            choices: emphasized,
            method: ExtractionMethod::Emphasis,
            confidence: Confidence::Low,
            correct_identified: true, // emphasized text is assumed to be the answer
        };
    }

    ChoiceExtraction::none()
}

/// Lines of the form `A. some answer`, with inline correctness markers.
fn extract_letter_choices(text: &str) -> Vec<Choice> {
    let mut choices = Vec::new();
    let re = match Regex::new(r"(?i)^([A-D])\.\s+(.+)$") {
        Ok(re) => re,
        Err(_) => return choices,
    };

    for line in text.lines() {
        let trimmed = line.trim();
        if let Some(caps) = re.captures(trimmed) {
            let letter = caps[1].to_uppercase();
            let choice_text = caps[2].to_string();
            let correct = is_marked_correct(trimmed, &choice_text);
            choices.push(Choice {
                label: letter,
                text: choice_text,
                correct,
            });
        }
    }
    choices
}

fn is_marked_correct(line: &str, choice_text: &str) -> bool {
    choice_text.to_lowercase().contains("correct")
        || line.contains('✓')
        || line.contains('✅')
        || line.contains("*correct*")
        || line.contains("**correct**")
        || line.ends_with("(correct)")
        || line.ends_with("(Correct)")
        || line.ends_with("(RIGHT)")
        || line.ends_with("(right)")
}

/// "The answer is C" and friends.
fn find_designated_answer(text: &str) -> Option<String> {
    let patterns = [
        r"(?i)The\s+correct\s+answer\s+is\s+([A-D])\b",
        r"(?i)The\s+answer\s+is\s+([A-D])\b",
        r"(?i)Correct\s+answer:\s+([A-D])\b",
        r"(?i)Answer:\s+([A-D])\b",
    ];

    for pattern in patterns {
        if let Ok(re) = Regex::new(pattern) {
            if let Some(caps) = re.captures(text) {
                return Some(caps[1].to_string());
            }
        }
    }
    None
}

/// Markdown-style table rows, one choice per row past the header.
fn extract_table_choices(text: &str) -> Vec<Choice> {
    if !text.contains('|') {
        return Vec::new();
    }
    let rows: Vec<&str> = text
        .lines()
        .map(|l| l.trim())
        .filter(|l| l.starts_with('|'))
        .collect();
    if rows.len() < 2 {
        return Vec::new();
    }

    // Skip the header row, and the separator row when present.
    let start = if rows[1].contains("---") { 2 } else { 1 };
    let mut choices = Vec::new();
    for row in &rows[start..] {
        let cells: Vec<&str> = row
            .split('|')
            .map(|c| c.trim())
            .filter(|c| !c.is_empty())
            .collect();
        if cells.is_empty() {
            continue;
        }
        let row_text = cells.join(" - ");
        let correct = row_text.to_lowercase().contains("correct")
            || row_text.contains('✓')
            || row_text.contains('✅');
        choices.push(Choice {
            label: "•".to_string(),
            text: row_text,
            correct,
        });
    }
    choices
}

/// True/false questions, with the designated side marked when the text names
/// it.
fn extract_true_false(text: &str) -> Option<Vec<Choice>> {
    let lower = text.to_lowercase();
    if !lower.contains("true or false") && !lower.contains("true/false") {
        return None;
    }

    let is_true = lower.contains("the answer is true")
        || lower.contains("correct answer is true")
        || lower.contains("answer: true");
    let is_false = lower.contains("the answer is false")
        || lower.contains("correct answer is false")
        || lower.contains("answer: false");

    Some(vec![
        Choice {
            label: "TRUE".to_string(),
            text: "True".to_string(),
            correct: is_true,
        },
        Choice {
            label: "FALSE".to_string(),
            text: "False".to_string(),
            correct: is_false,
        },
    ])
}

/// Last resort: markdown emphasis often marks the expected answer.
fn extract_emphasized(text: &str) -> Vec<Choice> {
    let patterns = [
        (r"\*\*([^*]+)\*\*", "BOLD"),
        (r"\*([^*]+)\*", "ITALIC"),
        (r"__([^_]+)__", "UNDERLINE"),
        (r"~~([^~]+)~~", "STRIKETHROUGH"),
    ];

    let mut choices = Vec::new();
    for (pattern, format) in patterns {
        if let Ok(re) = Regex::new(pattern) {
            for caps in re.captures_iter(text) {
                choices.push(Choice {
                    label: format.to_string(),
                    text: caps[1].to_string(),
                    correct: true,
                });
            }
        }
    }
    choices
}

// ============================================================================
// Metadata Display
// ============================================================================

/// Ordered label/value pairs for the metadata panel: the known fields first,
/// then any primitive extras the question carried.
pub fn display_metadata(question: &Question) -> Vec<(String, String)> {
    let mut items = Vec::new();

    items.push((
        "Standard".to_string(),
        question
            .standard_code
            .clone()
            .unwrap_or_else(|| "N/A".to_string()),
    ));
    if let Some(ref desc) = question.standard_description {
        items.push(("Standard Description".to_string(), desc.clone()));
    }
    items.push((
        "Lesson".to_string(),
        question
            .lesson_title
            .clone()
            .unwrap_or_else(|| "N/A".to_string()),
    ));
    if let Some(ref grade) = question.grade {
        items.push(("Grade".to_string(), grade.clone()));
    }
    if let Some(ref difficulty) = question.difficulty {
        items.push(("Difficulty".to_string(), difficulty.clone()));
    }

    for (key, value) in &question.extra {
        let display = match value {
            serde_json::Value::String(s) => s.clone(),
            serde_json::Value::Number(n) => n.to_string(),
            serde_json::Value::Bool(b) => b.to_string(),
            _ => continue, // objects and arrays don't belong in the panel
        };
        items.push((title_case(key), display));
    }

    items
}

/// "lesson_id" -> "Lesson Id".
fn title_case(key: &str) -> String {
    key.split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lettered_choices_with_inline_marker() {
        let text = "Which force acts downward?\n\
                    A. Friction\n\
                    B. Gravity (correct)\n\
                    C. Normal force\n\
                    D. Tension";

        let extraction = extract_choices(text);
        assert_eq!(extraction.method, ExtractionMethod::LetterBullets);
        assert_eq!(extraction.confidence, Confidence::High);
        assert_eq!(extraction.choices.len(), 4);

        let correct: Vec<&str> = extraction
            .choices
            .iter()
            .filter(|c| c.correct)
            .map(|c| c.label.as_str())
            .collect();
        assert_eq!(correct, vec!["B"]);
    }

    #[test]
    fn designation_phrase_marks_the_letter() {
        let text = "What is 2 + 2?\n\
                    A. 3\n\
                    B. 4\n\
                    C. 5\n\
                    The answer is B.";

        let extraction = extract_choices(text);
        assert_eq!(extraction.method, ExtractionMethod::AnswerDesignation);
        assert!(extraction.correct_identified);
        assert!(extraction.choices.iter().find(|c| c.label == "B").unwrap().correct);
    }

    #[test]
    fn lettered_choices_without_a_marker_are_medium_confidence() {
        let text = "Pick one:\nA. Red\nB. Blue";

        let extraction = extract_choices(text);
        assert_eq!(extraction.method, ExtractionMethod::LetterBullets);
        assert_eq!(extraction.confidence, Confidence::Medium);
        assert!(!extraction.correct_identified);
    }

    #[test]
    fn table_rows_become_choices() {
        let text = "Match the term:\n\
                    | Term | Definition |\n\
                    | --- | --- |\n\
                    | Velocity | Speed with direction ✓ |\n\
                    | Speed | Distance over time |";

        let extraction = extract_choices(text);
        assert_eq!(extraction.method, ExtractionMethod::Table);
        assert_eq!(extraction.choices.len(), 2);
        assert!(extraction.choices[0].correct);
        assert!(!extraction.choices[1].correct);
        assert_eq!(extraction.choices[0].text, "Velocity - Speed with direction ✓");
    }

    #[test]
    fn true_false_with_designated_answer() {
        let text = "True or false: heavier objects fall faster.\nThe answer is false.";

        let extraction = extract_choices(text);
        assert_eq!(extraction.method, ExtractionMethod::TrueFalse);
        assert_eq!(extraction.confidence, Confidence::High);
        let false_choice = extraction
            .choices
            .iter()
            .find(|c| c.label == "FALSE")
            .unwrap();
        assert!(false_choice.correct);
    }

    #[test]
    fn emphasized_text_is_a_low_confidence_guess() {
        let text = "Fill in the blank: the net force on a balanced object is **zero**.";

        let extraction = extract_choices(text);
        assert_eq!(extraction.method, ExtractionMethod::Emphasis);
        assert_eq!(extraction.confidence, Confidence::Low);
        assert_eq!(extraction.choices[0].text, "zero");
    }

    #[test]
    fn plain_prose_yields_no_choices() {
        let extraction = extract_choices("Explain how friction affects motion.");
        assert_eq!(extraction.method, ExtractionMethod::NoChoices);
        assert!(extraction.choices.is_empty());
        assert!(!extraction.correct_identified);
    }

    #[test]
    fn metadata_lists_known_fields_then_extras() {
        let mut extra = serde_json::Map::new();
        extra.insert(
            "lesson_id".to_string(),
            serde_json::Value::String("L42".to_string()),
        );
        extra.insert(
            "choices".to_string(),
            serde_json::Value::Array(Vec::new()), // skipped
        );

        let question = Question {
            question_text: "Q".to_string(),
            standard_code: Some("MS-PS2-1".to_string()),
            standard_description: None,
            lesson_title: None,
            grade: Some("8".to_string()),
            difficulty: None,
            extra,
        };

        let items = display_metadata(&question);
        assert_eq!(items[0], ("Standard".to_string(), "MS-PS2-1".to_string()));
        assert_eq!(items[1], ("Lesson".to_string(), "N/A".to_string()));
        assert_eq!(items[2], ("Grade".to_string(), "8".to_string()));
        assert!(items.contains(&("Lesson Id".to_string(), "L42".to_string())));
        assert!(!items.iter().any(|(label, _)| label == "Choices"));
    }
}
