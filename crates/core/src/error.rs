use thiserror::Error;

/// A parse failure.
///
/// The set of kinds is closed. Each message is the user-facing diagnostic
/// printed on the second line of a failure report (see [`UsageError`]).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The next token does not match a literal or predicate.
    #[error("Expected '{expected}'. Got '{got}'.")]
    UnexpectedToken { expected: String, got: String },

    /// The stream ran out before one or more mandatory parsers matched.
    /// Names are flag spellings (`--verbose`, `-x`), argument keys, or
    /// subcommand names, in the order they were encountered.
    #[error("The following arguments are required: {}.", .names.join(", "))]
    MissingRequired { names: Vec<String> },

    /// A matched token could not be converted to its target type.
    #[error("Invalid value '{raw}' for {name}: {reason}.")]
    ConversionFailed {
        name: String,
        raw: String,
        reason: String,
    },

    /// Identity of the merge algebra: no alternative was attempted.
    #[error("No alternatives to parse.")]
    EmptyAlternative,
}

impl ParseError {
    pub fn unexpected(expected: impl Into<String>, got: impl Into<String>) -> Self {
        ParseError::UnexpectedToken {
            expected: expected.into(),
            got: got.into(),
        }
    }

    pub fn missing(name: impl Into<String>) -> Self {
        ParseError::MissingRequired {
            names: vec![name.into()],
        }
    }

    pub fn conversion(
        name: impl Into<String>,
        raw: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        ParseError::ConversionFailed {
            name: name.into(),
            raw: raw.into(),
            reason: reason.into(),
        }
    }

    /// Specificity used to pick between two failed alternatives.
    fn rank(&self) -> u8 {
        match self {
            ParseError::ConversionFailed { .. } => 3,
            ParseError::UnexpectedToken { .. } => 2,
            ParseError::MissingRequired { .. } => 1,
            ParseError::EmptyAlternative => 0,
        }
    }

    /// Combine the failures of two alternatives.
    ///
    /// The more specific kind wins. Two `MissingRequired` errors union their
    /// names in encounter order; any other tie keeps `self`. The operation is
    /// associative and [`ParseError::EmptyAlternative`] is its identity, so a
    /// chain of alternatives reports the same diagnostic however it is
    /// grouped.
    pub fn merge(self, other: ParseError) -> ParseError {
        match (self, other) {
            (
                ParseError::MissingRequired { mut names },
                ParseError::MissingRequired { names: more },
            ) => {
                for name in more {
                    if !names.contains(&name) {
                        names.push(name);
                    }
                }
                ParseError::MissingRequired { names }
            }
            (left, right) => {
                if right.rank() > left.rank() {
                    right
                } else {
                    left
                }
            }
        }
    }
}

/// A failure ready to show the user: the synthesized usage line followed by
/// one specific diagnostic.
///
/// `EmptyAlternative` only reaches this point when nothing could be tried at
/// all, and is reported as such rather than with its internal message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("usage: {usage}\n{}", diagnostic(.error))]
pub struct UsageError {
    pub usage: String,
    pub error: ParseError,
}

fn diagnostic(error: &ParseError) -> String {
    match error {
        ParseError::EmptyAlternative => "No command accepts these arguments.".to_owned(),
        other => other.to_string(),
    }
}

impl UsageError {
    pub fn new(usage: impl Into<String>, error: ParseError) -> Self {
        UsageError {
            usage: usage.into(),
            error,
        }
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn samples() -> Vec<ParseError> {
        vec![
            ParseError::EmptyAlternative,
            ParseError::missing("-x"),
            ParseError::missing("y"),
            ParseError::unexpected("--verbose", "-x"),
            ParseError::unexpected("--quiet", "--typo"),
            ParseError::conversion("x", "abc", "invalid digit found in string"),
        ]
    }

    #[test]
    fn messages_match_user_facing_format() {
        assert_eq!(
            ParseError::unexpected("-x", "-typo").to_string(),
            "Expected '-x'. Got '-typo'."
        );
        assert_eq!(
            ParseError::missing("--verbose").to_string(),
            "The following arguments are required: --verbose."
        );
        let both = ParseError::missing("-x").merge(ParseError::missing("y"));
        assert_eq!(
            both.to_string(),
            "The following arguments are required: -x, y."
        );
    }

    #[test]
    fn empty_alternative_is_identity() {
        for e in samples() {
            assert_eq!(e.clone().merge(ParseError::EmptyAlternative), e);
            assert_eq!(ParseError::EmptyAlternative.merge(e.clone()), e);
        }
    }

    #[test]
    fn merge_is_associative() {
        let all = samples();
        for a in &all {
            for b in &all {
                for c in &all {
                    let left = a.clone().merge(b.clone()).merge(c.clone());
                    let right = a.clone().merge(b.clone().merge(c.clone()));
                    assert_eq!(left, right, "a={a:?} b={b:?} c={c:?}");
                }
            }
        }
    }

    #[test]
    fn literal_mismatch_beats_missing_either_side() {
        let unexpected = ParseError::unexpected("--verbose", "-x");
        let missing = ParseError::missing("-y");
        assert_eq!(missing.clone().merge(unexpected.clone()), unexpected);
        assert_eq!(unexpected.clone().merge(missing), unexpected);
    }

    #[test]
    fn usage_error_renders_two_lines() {
        let err = UsageError::new("-x X", ParseError::missing("-x"));
        assert_eq!(
            err.to_string(),
            "usage: -x X\nThe following arguments are required: -x."
        );
    }

    #[test]
    fn usage_error_hides_empty_alternative() {
        let err = UsageError::new("", ParseError::EmptyAlternative);
        assert_eq!(err.to_string(), "usage: \nNo command accepts these arguments.");
        assert!(!err.to_string().contains("No alternatives"));
    }
}
