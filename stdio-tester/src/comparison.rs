//! Streaming, token-wise comparison of produced output against expected output.

use bigdecimal::{BigDecimal, Zero};
use colored::Colorize;
use std::{fmt::Display, io::BufRead};

use crate::error::Error;
use crate::tolerance::{TokenComparison, Tolerance};

/// Outcome of comparing one produced line against one expected line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ComparisonVerdict {
    /// All tokens matched exactly (or within tolerance with zero error).
    Match,
    /// The lines hold different numbers of tokens.
    TokenCountMismatch {
        /// Number of tokens produced.
        given: usize,
        /// Number of tokens expected.
        expected: usize,
    },
    /// A token differs and no tolerance is in effect.
    TokenMismatch {
        /// 1-based index of the differing token.
        index: usize,
        /// The produced token.
        given: String,
        /// The expected token.
        expected: String,
    },
    /// All tokens are within tolerance, but at least one differs numerically. Carries the
    /// last non-zero error seen on the line. Not a failure.
    NumericDiff(BigDecimal),
    /// A token's relative error reached the tolerance.
    ToleranceExceeded {
        /// 1-based index of the offending token.
        index: usize,
        /// The relative error.
        error: BigDecimal,
        /// The tolerance in effect.
        tolerance: BigDecimal,
    },
}

impl ComparisonVerdict {
    /// Returns whether this verdict fails the test.
    pub const fn is_failure(&self) -> bool {
        matches!(
            self,
            Self::TokenCountMismatch { .. } | Self::TokenMismatch { .. } | Self::ToleranceExceeded { .. }
        )
    }
}

/// Result of comparing a line pair: the verdict plus the largest relative error computed
/// while reaching it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LineComparison {
    /// The verdict for the line.
    pub verdict: ComparisonVerdict,
    /// The largest relative error computed on this line, if any was.
    pub max_error: Option<BigDecimal>,
}

/// Compares a produced line against an expected line, token by token.
pub fn compare_lines(
    given: &str,
    expected: &str,
    tolerance: &Tolerance,
) -> Result<LineComparison, Error> {
    let given_tokens: Vec<_> = given.split_whitespace().collect();
    let expected_tokens: Vec<_> = expected.split_whitespace().collect();

    if given_tokens.len() != expected_tokens.len() {
        return Ok(LineComparison {
            verdict: ComparisonVerdict::TokenCountMismatch {
                given: given_tokens.len(),
                expected: expected_tokens.len(),
            },
            max_error: None,
        });
    }

    let mut max_error: Option<BigDecimal> = None;
    let mut last_diff = None;

    for (i, (given_token, expected_token)) in given_tokens.iter().zip(&expected_tokens).enumerate()
    {
        let comparison = tolerance.compare(given_token, expected_token)?;

        let error = match &comparison {
            TokenComparison::WithinTolerance(error) | TokenComparison::Exceeds(Some(error)) => {
                Some(error)
            }
            _ => None,
        };

        if let Some(error) = error {
            if max_error.as_ref().is_none_or(|max| error > max) {
                max_error = Some(error.clone());
            }
        }

        match comparison {
            TokenComparison::Equal => (),
            TokenComparison::WithinTolerance(error) => {
                if !error.is_zero() {
                    last_diff = Some(error);
                }
            }
            TokenComparison::Exceeds(None) => {
                return Ok(LineComparison {
                    verdict: ComparisonVerdict::TokenMismatch {
                        index: i + 1,
                        given: (*given_token).to_owned(),
                        expected: (*expected_token).to_owned(),
                    },
                    max_error,
                });
            }
            TokenComparison::Exceeds(Some(error)) => {
                return Ok(LineComparison {
                    verdict: ComparisonVerdict::ToleranceExceeded {
                        index: i + 1,
                        error,
                        tolerance: tolerance.value().clone(),
                    },
                    max_error,
                });
            }
        }
    }

    let verdict = last_diff.map_or(ComparisonVerdict::Match, ComparisonVerdict::NumericDiff);

    Ok(LineComparison { verdict, max_error })
}

/// A diagnostic produced while comparing a test's output.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Diagnostic {
    /// A produced line failed to match its expected line.
    LineMismatch {
        /// 1-based number of the line.
        line: usize,
        /// Why it failed.
        verdict: ComparisonVerdict,
    },
    /// A produced line matched within tolerance, but with a non-zero error.
    NumericDiff {
        /// 1-based number of the line.
        line: usize,
        /// The relative error.
        error: BigDecimal,
    },
    /// The produced output ended before this expected line.
    MissingOutput {
        /// The expected line, without its line terminator.
        expected: String,
        /// Number of tokens on the expected line.
        expected_tokens: usize,
    },
}

impl Diagnostic {
    /// Returns whether this diagnostic fails the test.
    pub const fn is_failure(&self) -> bool {
        !matches!(self, Self::NumericDiff { .. })
    }
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LineMismatch { line, verdict } => match verdict {
                ComparisonVerdict::TokenCountMismatch { given, expected } => write!(
                    f,
                    "{}",
                    std::format!(
                        "(number of tokens: {given} vs {expected})->(diff on line {line}) "
                    )
                    .red()
                ),
                ComparisonVerdict::TokenMismatch {
                    index,
                    given,
                    expected,
                } => write!(
                    f,
                    "{}",
                    std::format!(
                        "(diff on line {line}) (token #{index}: {given} should be {expected}) "
                    )
                    .red()
                ),
                ComparisonVerdict::ToleranceExceeded {
                    error, tolerance, ..
                } => write!(
                    f,
                    "{}",
                    std::format!(
                        "(diff on line {line}) (ERROR: {error} bigger than tolerance {tolerance}) "
                    )
                    .red()
                ),
                ComparisonVerdict::Match | ComparisonVerdict::NumericDiff(_) => Ok(()),
            },
            Self::NumericDiff { error, .. } => {
                write!(f, "{}", std::format!("(diff: {error}) ").yellow())
            }
            Self::MissingOutput {
                expected,
                expected_tokens,
            } => write!(
                f,
                "{}",
                std::format!(
                    "(number of tokens: 0 vs {expected_tokens})->(missing output, expected: {expected}) "
                )
                .red()
            ),
        }
    }
}

/// A lazy, finite, non-restartable sequence of lines read from a stream.
///
/// Exhaustion is tracked explicitly: once the underlying stream reports end-of-file, no
/// further reads are attempted.
pub struct LineSource<R> {
    reader: R,
    buffer: Vec<u8>,
    exhausted: bool,
}

impl<R: BufRead> LineSource<R> {
    /// Wraps the given reader.
    pub const fn new(reader: R) -> Self {
        Self {
            reader,
            buffer: Vec::new(),
            exhausted: false,
        }
    }

    /// Returns whether the end of the stream has been reached.
    pub const fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Reads the next line, without its terminator. Returns `None` once exhausted.
    /// Invalid UTF-8 is replaced rather than rejected.
    pub fn next_line(&mut self) -> std::io::Result<Option<String>> {
        if self.exhausted {
            return Ok(None);
        }

        self.buffer.clear();
        if self.reader.read_until(b'\n', &mut self.buffer)? == 0 {
            self.exhausted = true;
            return Ok(None);
        }

        let line = String::from_utf8_lossy(&self.buffer);
        let line = line.strip_suffix('\n').unwrap_or(&line);
        let line = line.strip_suffix('\r').unwrap_or(line);

        Ok(Some(line.to_owned()))
    }
}

/// Result of comparing a test's full output against its expected output.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OutputComparison {
    /// Whether any failing diagnostic was produced.
    pub failed: bool,
    /// All diagnostics reported, in order.
    pub diagnostics: Vec<Diagnostic>,
    /// The largest relative error computed, if any was.
    pub max_error: Option<BigDecimal>,
}

/// Walks a produced output stream and an expected output stream in lockstep.
pub struct StreamComparator<'a> {
    tolerance: &'a Tolerance,
}

impl<'a> StreamComparator<'a> {
    /// Creates a comparator applying the given tolerance.
    pub const fn new(tolerance: &'a Tolerance) -> Self {
        Self { tolerance }
    }

    /// Compares `given` against `expected`, handing each diagnostic to `on_diagnostic` as
    /// soon as it is found.
    ///
    /// Produced lines beyond the end of the expected output are read but not compared.
    /// Expected lines beyond the end of the produced output are each reported as missing.
    /// After the first failure, remaining lines are still walked but only non-fatal
    /// diagnostics are reported for them; lines that can't be compared are skipped.
    ///
    /// # Errors
    ///
    /// Fails on I/O errors, or when a token can't be compared numerically before any
    /// failure was found; either is fatal for the run as a whole.
    pub fn compare<G, E, F>(
        &self,
        given: G,
        expected: E,
        mut on_diagnostic: F,
    ) -> Result<OutputComparison, Error>
    where
        G: BufRead,
        E: BufRead,
        F: FnMut(&Diagnostic) -> std::io::Result<()>,
    {
        let mut given = LineSource::new(given);
        let mut expected = LineSource::new(expected);
        let mut result = OutputComparison::default();

        let mut report = |result: &mut OutputComparison, diagnostic: Diagnostic| {
            result.failed |= diagnostic.is_failure();
            let outcome = on_diagnostic(&diagnostic);
            result.diagnostics.push(diagnostic);
            outcome
        };

        let mut line_number = 0;
        while let Some(given_line) = given.next_line()? {
            line_number += 1;

            let Some(expected_line) = expected.next_line()? else {
                continue;
            };

            let comparison = match compare_lines(&given_line, &expected_line, self.tolerance) {
                Ok(comparison) => comparison,
                // The test has already failed; a later unparseable token can't change that.
                Err(err) if result.failed => {
                    tracing::debug!(target: "compare", "line {line_number}: {err}");
                    continue;
                }
                Err(err) => return Err(err),
            };

            if let Some(error) = comparison.max_error {
                if result.max_error.as_ref().is_none_or(|max| &error > max) {
                    result.max_error = Some(error);
                }
            }

            match comparison.verdict {
                ComparisonVerdict::Match => (),
                ComparisonVerdict::NumericDiff(error) => {
                    report(&mut result, Diagnostic::NumericDiff {
                        line: line_number,
                        error,
                    })?;
                }
                verdict => {
                    tracing::debug!(target: "compare", "line {line_number}: {verdict:?}");
                    if !result.failed {
                        report(&mut result, Diagnostic::LineMismatch {
                            line: line_number,
                            verdict,
                        })?;
                    }
                }
            }
        }

        while let Some(expected_line) = expected.next_line()? {
            let expected_tokens = expected_line.split_whitespace().count();
            if expected_tokens > 0 {
                report(&mut result, Diagnostic::MissingOutput {
                    expected: expected_line,
                    expected_tokens,
                })?;
            }
        }

        Ok(result)
    }
}

#[cfg(test)]
#[allow(clippy::panic_in_result_fn)]
mod tests {
    use super::*;
    use pretty_assertions::{assert_eq, assert_matches};
    use std::str::FromStr;

    fn tolerance(s: &str) -> Tolerance {
        s.parse().unwrap()
    }

    fn compare(given: &str, expected: &str, tolerance: &Tolerance) -> OutputComparison {
        StreamComparator::new(tolerance)
            .compare(given.as_bytes(), expected.as_bytes(), |_| Ok(()))
            .unwrap()
    }

    #[test]
    fn exact_line_comparison() -> Result<(), Error> {
        let exact = Tolerance::exact();

        assert_eq!(
            compare_lines("1 2 3", "1 2 3", &exact)?.verdict,
            ComparisonVerdict::Match
        );
        assert_eq!(
            compare_lines("1 2 3", "1 2 4", &exact)?.verdict,
            ComparisonVerdict::TokenMismatch {
                index: 3,
                given: "3".into(),
                expected: "4".into()
            }
        );
        Ok(())
    }

    #[test]
    fn whitespace_layout_is_irrelevant() -> Result<(), Error> {
        assert_eq!(
            compare_lines("  1\t2   3 ", "1 2 3", &Tolerance::exact())?.verdict,
            ComparisonVerdict::Match
        );
        Ok(())
    }

    #[test]
    fn token_count_mismatch_ignores_tolerance() -> Result<(), Error> {
        for t in [Tolerance::exact(), tolerance("0.5")] {
            assert_eq!(
                compare_lines("1 2", "1 2 3", &t)?.verdict,
                ComparisonVerdict::TokenCountMismatch {
                    given: 2,
                    expected: 3
                }
            );
        }
        Ok(())
    }

    #[test]
    fn tolerant_line_comparison() -> Result<(), Error> {
        let t = tolerance("0.01");

        let result = compare_lines("100", "101", &t)?;
        assert_matches!(result.verdict, ComparisonVerdict::NumericDiff(_));
        assert!(!result.verdict.is_failure());

        let result = compare_lines("90", "100", &t)?;
        assert_eq!(
            result.verdict,
            ComparisonVerdict::ToleranceExceeded {
                index: 1,
                error: BigDecimal::from_str("0.1").unwrap(),
                tolerance: BigDecimal::from_str("0.01").unwrap(),
            }
        );
        assert_eq!(result.max_error, Some(BigDecimal::from_str("0.1").unwrap()));
        Ok(())
    }

    #[test]
    fn numeric_diff_reports_last_nonzero_error() -> Result<(), Error> {
        let result = compare_lines("99 1.0 199", "100 1 200", &tolerance("0.05"))?;
        assert_eq!(
            result.verdict,
            ComparisonVerdict::NumericDiff(BigDecimal::from_str("0.005").unwrap())
        );
        assert_eq!(result.max_error, Some(BigDecimal::from_str("0.01").unwrap()));
        Ok(())
    }

    #[test]
    fn first_exceeding_token_wins() -> Result<(), Error> {
        let result = compare_lines("1 5 9", "1 6 10", &Tolerance::exact())?;
        assert_matches!(
            result.verdict,
            ComparisonVerdict::TokenMismatch { index: 2, .. }
        );
        Ok(())
    }

    #[test]
    fn matching_streams_pass() {
        let result = compare("1 2\n3\n", "1 2\n3\n", &Tolerance::exact());
        assert_eq!(result, OutputComparison::default());
    }

    #[test]
    fn missing_trailing_newline_is_irrelevant() {
        let result = compare("1 2\r\n3", "1 2\n3\n", &Tolerance::exact());
        assert!(!result.failed);
    }

    #[test]
    fn missing_output_is_reported_per_line() {
        let result = compare("a\nb\n", "a\nb\nc\nd e\n", &Tolerance::exact());

        assert!(result.failed);
        assert_eq!(
            result.diagnostics,
            vec![
                Diagnostic::MissingOutput {
                    expected: "c".into(),
                    expected_tokens: 1
                },
                Diagnostic::MissingOutput {
                    expected: "d e".into(),
                    expected_tokens: 2
                },
            ]
        );
    }

    #[test]
    fn blank_leftover_lines_are_not_missing() {
        let result = compare("a\n", "a\n\n  \n", &Tolerance::exact());
        assert!(!result.failed);
        assert!(result.diagnostics.is_empty());
    }

    #[test]
    fn extra_output_is_ignored() {
        let given = "1\n2\n3\n4\n5\n";
        let expected = "1\n2\n3\n";

        let first = compare(given, expected, &Tolerance::exact());
        let second = compare(given, expected, &Tolerance::exact());

        assert!(!first.failed);
        assert_eq!(first, second);
    }

    #[test]
    fn only_first_failure_is_reported() {
        let result = compare("1\nx\ny\n", "1\n2\n3\n", &Tolerance::exact());

        assert!(result.failed);
        assert_eq!(
            result.diagnostics,
            vec![Diagnostic::LineMismatch {
                line: 2,
                verdict: ComparisonVerdict::TokenMismatch {
                    index: 1,
                    given: "x".into(),
                    expected: "2".into()
                }
            }]
        );
    }

    #[test]
    fn numeric_diffs_keep_reporting_after_failure() {
        let result = compare("90\n99\n", "100\n100\n", &tolerance("0.05"));

        assert!(result.failed);
        assert_eq!(result.diagnostics.len(), 2);
        assert_matches!(
            &result.diagnostics[1],
            Diagnostic::NumericDiff { line: 2, .. }
        );
        assert_eq!(result.max_error, Some(BigDecimal::from_str("0.1").unwrap()));
    }

    #[test]
    fn failure_after_mismatch_does_not_invent_missing_lines() {
        let result = compare("1\nx\n3\n", "1\n2\n3\n", &Tolerance::exact());
        assert_eq!(result.diagnostics.len(), 1);
    }

    #[test]
    fn unparseable_tokens_after_a_failure_are_not_fatal() {
        let result = compare("1 2\nabc\n99\n", "1\n7\n100\n", &tolerance("0.05"));

        assert!(result.failed);
        assert_eq!(result.diagnostics.len(), 2);
        assert_matches!(
            &result.diagnostics[0],
            Diagnostic::LineMismatch { line: 1, .. }
        );
        assert_matches!(
            &result.diagnostics[1],
            Diagnostic::NumericDiff { line: 3, .. }
        );
    }

    #[test]
    fn unparseable_tokens_abort_the_comparison() {
        let t = tolerance("0.1");
        let result =
            StreamComparator::new(&t).compare("abc\n".as_bytes(), "1\n".as_bytes(), |_| Ok(()));
        assert_matches!(result, Err(Error::NumberParse { .. }));
    }

    #[test]
    fn diagnostics_are_streamed() -> Result<(), Error> {
        colored::control::set_override(false);

        let mut seen = vec![];
        StreamComparator::new(&Tolerance::exact()).compare(
            "1 2\n".as_bytes(),
            "1 2 3\nz\n".as_bytes(),
            |d| {
                seen.push(d.to_string());
                Ok(())
            },
        )?;

        assert_eq!(
            seen,
            vec![
                "(number of tokens: 2 vs 3)->(diff on line 1) ".to_owned(),
                "(number of tokens: 0 vs 1)->(missing output, expected: z) ".to_owned(),
            ]
        );
        Ok(())
    }

    #[test]
    fn line_source_tracks_exhaustion() -> std::io::Result<()> {
        let mut source = LineSource::new("a\nb".as_bytes());
        assert_eq!(source.next_line()?, Some("a".to_owned()));
        assert_eq!(source.next_line()?, Some("b".to_owned()));
        assert!(!source.is_exhausted());
        assert_eq!(source.next_line()?, None);
        assert!(source.is_exhausted());
        assert_eq!(source.next_line()?, None);
        Ok(())
    }
}
