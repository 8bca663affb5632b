//! Interactive message analysis
//!
//! Reads one message per line, classifies it and prints the label with its
//! confidence. `exit` (any case) ends the session.

use crate::classifier::TextClassifier;
use crate::types::TextUnit;
use std::io::{self, BufRead, Write};

pub const EXIT_TOKEN: &str = "exit";
pub const PROMPT: &str = "Enter your message: ";

/// Counters for one console session
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ConsoleSummary {
    pub analyzed: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Run the loop until `exit` or end of input.
pub fn run_console<R, W>(
    classifier: &dyn TextClassifier,
    input: R,
    output: &mut W,
) -> io::Result<ConsoleSummary>
where
    R: BufRead,
    W: Write,
{
    let mut summary = ConsoleSummary::default();
    writeln!(output, "💬 Message Analysis Tool (type '{EXIT_TOKEN}' to quit)")?;

    let mut lines = input.lines();
    loop {
        write!(output, "{PROMPT}")?;
        output.flush()?;

        let line = match lines.next() {
            Some(line) => line?,
            None => {
                writeln!(output)?;
                break;
            }
        };

        if line.trim().eq_ignore_ascii_case(EXIT_TOKEN) {
            writeln!(output, "👋 Exiting program...")?;
            break;
        }

        let unit = match TextUnit::new(&line) {
            Some(unit) => unit,
            None => {
                summary.skipped += 1;
                continue;
            }
        };

        match classifier.classify(unit.as_str()) {
            Ok(prediction) => {
                summary.analyzed += 1;
                writeln!(
                    output,
                    "👉 Analysis: {} (confidence: {})\n",
                    prediction.label,
                    round4(prediction.score)
                )?;
            }
            Err(e) => {
                summary.failed += 1;
                tracing::warn!("⚠️  {e}");
                writeln!(output, "❌ Analysis: ERROR ({e})\n")?;
            }
        }
    }

    Ok(summary)
}

fn round4(score: f64) -> f64 {
    (score * 10_000.0).round() / 10_000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{AnalyzerError, AnalyzerResult};
    use crate::types::{ClassifierKind, Prediction};
    use std::cell::RefCell;
    use std::io::Cursor;

    struct Recording {
        seen: RefCell<Vec<String>>,
    }

    impl TextClassifier for Recording {
        fn kind(&self) -> ClassifierKind {
            ClassifierKind::Emotion
        }

        fn name(&self) -> &str {
            "recording"
        }

        fn classify(&self, text: &str) -> AnalyzerResult<Prediction> {
            self.seen.borrow_mut().push(text.to_string());
            if text == "boom" {
                return Err(AnalyzerError::classification("recording", "offline"));
            }
            Ok(Prediction::new("joy", 0.987654))
        }
    }

    fn run(input: &str) -> (ConsoleSummary, Vec<String>, String) {
        let classifier = Recording {
            seen: RefCell::new(Vec::new()),
        };
        let mut out = Vec::new();
        let summary = run_console(&classifier, Cursor::new(input), &mut out).unwrap();
        (
            summary,
            classifier.seen.into_inner(),
            String::from_utf8(out).unwrap(),
        )
    }

    #[test]
    fn test_exit_stops_before_later_lines() {
        let (summary, seen, out) = run("hello\nEXIT\nnever read\n");
        assert_eq!(seen, vec!["hello"]);
        assert_eq!(summary.analyzed, 1);
        assert!(out.contains("👉 Analysis: joy (confidence: 0.9877)"));
        assert!(out.contains("👋 Exiting program..."));
    }

    #[test]
    fn test_empty_lines_are_skipped_not_terminal() {
        let (summary, seen, _) = run("\n   \nstill here\nexit\n");
        assert_eq!(seen, vec!["still here"]);
        assert_eq!(summary.skipped, 2);
    }

    #[test]
    fn test_failure_does_not_end_session() {
        let (summary, seen, out) = run("boom\nfine\n exit \n");
        assert_eq!(seen, vec!["boom", "fine"]);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.analyzed, 1);
        assert!(out.contains("ERROR"));
    }

    #[test]
    fn test_end_of_input_ends_session() {
        let (summary, _, _) = run("one\ntwo");
        assert_eq!(summary.analyzed, 2);
    }
}
