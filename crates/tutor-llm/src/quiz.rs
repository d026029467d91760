//! Parse free-form multiple-choice quiz text into structured questions.
//!
//! Expected shape (tolerant of markdown emphasis and blank lines):
//!
//! ```text
//! Q: What is the powerhouse of the cell?
//! A) Nucleus
//! B) Ribosome
//! C) Mitochondria [CORRECT]
//! D) Golgi body
//! Explanation: Mitochondria produce most of the cell's ATP.
//! ```

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

pub const OPTIONS_PER_QUESTION: usize = 4;
pub const NO_EXPLANATION: &str = "No explanation provided.";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub id: String,
    pub question: String,
    pub options: Vec<String>,
    /// Index into `options`.
    pub correct_answer: usize,
    pub explanation: String,
}

fn question_split_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^[ \t]*(?:\*\*)?Q\d*:(?:\*\*)?[ \t]*").expect("valid regex"))
}

fn option_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^([A-D])\)\s*(.+)$").expect("valid regex"))
}

fn answer_line_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^(?:correct\s+)?answer\s*:\s*\(?([A-D])\b").expect("valid regex"))
}

fn letter_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\(?([A-D])\b").expect("valid regex"))
}

fn explanation_prefix_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^explanation\s*:\s*").expect("valid regex"))
}

const CORRECT_MARKER: &str = "[CORRECT]";

fn strip_markdown(s: &str) -> String {
    s.trim_start_matches('#').replace('*', "").trim().to_string()
}

fn letter_index(letter: &str) -> Option<usize> {
    letter
        .chars()
        .next()
        .map(|c| (c.to_ascii_uppercase() as u8).wrapping_sub(b'A') as usize)
        .filter(|i| *i < OPTIONS_PER_QUESTION)
}

/// Parse every well-formed question in `text`. Blocks that do not have
/// exactly four options are dropped; ids are assigned to kept questions only.
pub fn parse_quiz(text: &str) -> Vec<QuizQuestion> {
    let mut questions = Vec::new();
    for block in question_split_regex().split(text).skip(1) {
        if let Some(mut q) = parse_block(block) {
            q.id = format!("q_{}", questions.len() + 1);
            questions.push(q);
        }
    }
    questions
}

fn parse_block(block: &str) -> Option<QuizQuestion> {
    let lines: Vec<&str> = block.lines().map(str::trim).filter(|l| !l.is_empty()).collect();

    let question_at = lines.iter().position(|l| !option_regex().is_match(l))?;
    let question = strip_markdown(lines[question_at]);
    if question.is_empty() {
        return None;
    }

    let mut options: Vec<String> = Vec::with_capacity(OPTIONS_PER_QUESTION);
    let mut correct: Option<usize> = None;
    let mut explanation = String::new();

    let mut i = question_at + 1;
    while i < lines.len() {
        let line = lines[i];

        if let Some(rest) = line.strip_prefix(CORRECT_MARKER) {
            // "[CORRECT] B) ..." names the answer directly; a bare marker
            // points at the next option line.
            let named = letter_regex()
                .captures(rest.trim())
                .and_then(|c| letter_index(&c[1]));
            correct = named.or_else(|| {
                lines[i + 1..]
                    .iter()
                    .find_map(|l| option_regex().captures(l).and_then(|c| letter_index(&c[1])))
            }).or(correct);
            i += 1;
            continue;
        }

        if let Some(c) = answer_line_regex().captures(line) {
            correct = letter_index(&c[1]).or(correct);
            i += 1;
            continue;
        }

        if let Some(c) = option_regex().captures(line) {
            let raw = &c[2];
            if raw.contains(CORRECT_MARKER) {
                correct = Some(options.len());
            }
            if options.len() < OPTIONS_PER_QUESTION {
                options.push(strip_markdown(&raw.replace(CORRECT_MARKER, "")));
            }
            i += 1;
            continue;
        }

        if options.len() == OPTIONS_PER_QUESTION {
            let rest = lines[i..].join(" ");
            explanation = explanation_prefix_regex().replace(&rest, "").trim().to_string();
            break;
        }
        i += 1;
    }

    if options.len() != OPTIONS_PER_QUESTION {
        return None;
    }

    Some(QuizQuestion {
        id: String::new(),
        question,
        options,
        correct_answer: correct.filter(|c| *c < OPTIONS_PER_QUESTION).unwrap_or(0),
        explanation: if explanation.is_empty() { NO_EXPLANATION.to_string() } else { explanation },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_marker_line_before_explanation() {
        let text = "Q: What is the primary byproduct of photosynthesis in plants?\n\
                    \n\
                    A) Glucose and oxygen\n\
                    B) Glucose and carbon dioxide\n\
                    C) Oxygen and water\n\
                    D) Carbon dioxide and nitrogen\n\
                    \n\
                    [CORRECT] A) Glucose and oxygen\n\
                    Explanation: Plants turn light, water and CO2 into glucose and oxygen.";
        let qs = parse_quiz(text);
        assert_eq!(qs.len(), 1);
        let q = &qs[0];
        assert_eq!(q.id, "q_1");
        assert_eq!(q.question, "What is the primary byproduct of photosynthesis in plants?");
        assert_eq!(q.options[3], "Carbon dioxide and nitrogen");
        assert_eq!(q.correct_answer, 0);
        assert_eq!(q.explanation, "Plants turn light, water and CO2 into glucose and oxygen.");
    }

    #[test]
    fn test_inline_marker() {
        let text = "Q: Powerhouse of the cell?\nA) Nucleus\nB) Ribosome\nC) **Mitochondria** [CORRECT]\nD) Golgi body\n";
        let q = &parse_quiz(text)[0];
        assert_eq!(q.correct_answer, 2);
        assert_eq!(q.options[2], "Mitochondria");
        assert_eq!(q.explanation, NO_EXPLANATION);
    }

    #[test]
    fn test_bare_marker_points_at_next_option() {
        let text = "Q: 2 + 2?\nA) 3\n[CORRECT]\nB) 4\nC) 5\nD) 22\nExplanation: basic arithmetic";
        let q = &parse_quiz(text)[0];
        assert_eq!(q.correct_answer, 1);
        assert_eq!(q.explanation, "basic arithmetic");
    }

    #[test]
    fn test_answer_line() {
        let text = "Q: Largest planet?\nA) Mars\nB) Venus\nC) Earth\nD) Jupiter\nAnswer: D) Jupiter\nIt is a gas giant.";
        let q = &parse_quiz(text)[0];
        assert_eq!(q.correct_answer, 3);
        assert_eq!(q.explanation, "It is a gas giant.");
    }

    #[test]
    fn test_incomplete_blocks_skipped_and_ids_sequential() {
        let text = "Q: Only three?\nA) a\nB) b\nC) c\n\n\
                    **Q2:** Which gas do plants absorb?\nA) Oxygen\nB) Carbon dioxide [CORRECT]\nC) Nitrogen\nD) Helium\n";
        let qs = parse_quiz(text);
        assert_eq!(qs.len(), 1);
        assert_eq!(qs[0].id, "q_1");
        assert_eq!(qs[0].question, "Which gas do plants absorb?");
        assert_eq!(qs[0].correct_answer, 1);
    }

    #[test]
    fn test_unmarked_defaults_to_first() {
        let text = "Q: Pick one\nA) w\nB) x\nC) y\nD) z";
        assert_eq!(parse_quiz(text)[0].correct_answer, 0);
    }

    #[test]
    fn test_no_questions() {
        assert!(parse_quiz("Here are some notes without questions.").is_empty());
        assert!(parse_quiz("").is_empty());
    }
}
