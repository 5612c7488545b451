//! Assertion facade: wrap a queried value and compare it, with failure
//! messages a human can act on.
//!
//! Three entry points: [`expect`] for deep structural equality over any
//! serializable value, [`expect_text`] for substring/regex containment,
//! and [`expect_present`] for existence checks on query results. For
//! poll-based assertions, compose with the condition poller through
//! [`crate::wait::Check::from_result`]; the assertion closure then
//! re-resolves and re-asserts on every tick.

use crate::result::{AsentarError, AsentarResult};
use regex::Regex;
use serde::Serialize;
use serde_json::Value;

// =============================================================================
// TEXT PATTERN
// =============================================================================

/// Pattern for text containment: a plain substring or a compiled regex
#[derive(Debug, Clone)]
pub enum TextPattern {
    /// Literal substring match
    Substring(String),
    /// Regex match
    Pattern(Regex),
}

impl TextPattern {
    /// Whether the haystack satisfies this pattern
    #[must_use]
    pub fn matches(&self, haystack: &str) -> bool {
        match self {
            Self::Substring(needle) => haystack.contains(needle.as_str()),
            Self::Pattern(regex) => regex.is_match(haystack),
        }
    }

    fn describe(&self) -> String {
        match self {
            Self::Substring(needle) => format!("substring {needle:?}"),
            Self::Pattern(regex) => format!("pattern /{}/", regex.as_str()),
        }
    }
}

impl From<&str> for TextPattern {
    fn from(needle: &str) -> Self {
        Self::Substring(needle.to_string())
    }
}

impl From<String> for TextPattern {
    fn from(needle: String) -> Self {
        Self::Substring(needle)
    }
}

impl From<Regex> for TextPattern {
    fn from(regex: Regex) -> Self {
        Self::Pattern(regex)
    }
}

// =============================================================================
// DIFF
// =============================================================================

/// Path of the first structural divergence between two JSON values, in
/// `$.field[index]` notation, or `None` if they are equal.
fn first_divergence(expected: &Value, actual: &Value, path: &str) -> Option<String> {
    match (expected, actual) {
        (Value::Object(expected), Value::Object(actual)) => {
            for (key, expected_child) in expected {
                match actual.get(key) {
                    Some(actual_child) => {
                        if let Some(divergence) =
                            first_divergence(expected_child, actual_child, &format!("{path}.{key}"))
                        {
                            return Some(divergence);
                        }
                    }
                    None => return Some(format!("{path}.{key} (missing in actual)")),
                }
            }
            actual
                .keys()
                .find(|key| !expected.contains_key(*key))
                .map(|key| format!("{path}.{key} (unexpected in actual)"))
        }
        (Value::Array(expected), Value::Array(actual)) => {
            for (index, (expected_child, actual_child)) in
                expected.iter().zip(actual.iter()).enumerate()
            {
                if let Some(divergence) =
                    first_divergence(expected_child, actual_child, &format!("{path}[{index}]"))
                {
                    return Some(divergence);
                }
            }
            (expected.len() != actual.len()).then(|| {
                format!(
                    "{path} (length {} expected, {} actual)",
                    expected.len(),
                    actual.len()
                )
            })
        }
        (expected, actual) => (expected != actual).then(|| path.to_string()),
    }
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

fn equality_diff(description: Option<&str>, expected: &Value, actual: &Value) -> String {
    let subject = description.unwrap_or("values");
    let at = first_divergence(expected, actual, "$")
        .unwrap_or_else(|| String::from("$"));
    format!(
        "{subject} differ at {at}\nexpected:\n{}\nactual:\n{}",
        pretty(expected),
        pretty(actual)
    )
}

// =============================================================================
// VALUE EXPECTATION
// =============================================================================

/// Expectation over a serializable value, compared by deep structural
/// equality of its JSON form.
#[derive(Debug)]
pub struct ValueExpectation {
    actual: Result<Value, serde_json::Error>,
    description: Option<String>,
}

impl ValueExpectation {
    /// Attach a subject label used in failure messages
    #[must_use]
    pub fn described_as(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Assert deep structural equality with `expected`
    pub fn to_equal<E: Serialize>(self, expected: &E) -> AsentarResult<()> {
        let actual = self.actual?;
        let expected = serde_json::to_value(expected)?;
        if actual == expected {
            Ok(())
        } else {
            Err(AsentarError::Assertion {
                message: equality_diff(self.description.as_deref(), &expected, &actual),
            })
        }
    }
}

/// Wrap a serializable value for deep-equality assertions
pub fn expect<T: Serialize>(actual: &T) -> ValueExpectation {
    ValueExpectation {
        actual: serde_json::to_value(actual),
        description: None,
    }
}

// =============================================================================
// TEXT EXPECTATION
// =============================================================================

/// Expectation over rendered text
#[derive(Debug)]
pub struct TextExpectation {
    actual: String,
    description: Option<String>,
}

impl TextExpectation {
    /// Attach a subject label used in failure messages
    #[must_use]
    pub fn described_as(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    fn subject(&self) -> &str {
        self.description.as_deref().unwrap_or("text")
    }

    /// Assert exact equality with `expected`
    pub fn to_equal(self, expected: &str) -> AsentarResult<()> {
        if self.actual == expected {
            Ok(())
        } else {
            Err(AsentarError::Assertion {
                message: format!(
                    "expected {} to equal {expected:?}, got {:?}",
                    self.subject(),
                    self.actual
                ),
            })
        }
    }

    /// Assert the text contains a substring or matches a regex
    pub fn to_contain(self, pattern: impl Into<TextPattern>) -> AsentarResult<()> {
        let pattern = pattern.into();
        if pattern.matches(&self.actual) {
            Ok(())
        } else {
            Err(AsentarError::Assertion {
                message: format!(
                    "expected {} {:?} to contain {}",
                    self.subject(),
                    self.actual,
                    pattern.describe()
                ),
            })
        }
    }

    /// Assert the text matches a regex
    pub fn to_match(self, regex: &Regex) -> AsentarResult<()> {
        self.to_contain(TextPattern::Pattern(regex.clone()))
    }
}

/// Wrap text for containment and equality assertions
pub fn expect_text(actual: impl Into<String>) -> TextExpectation {
    TextExpectation {
        actual: actual.into(),
        description: None,
    }
}

// =============================================================================
// PRESENCE EXPECTATION
// =============================================================================

/// Expectation over an optional query result
#[derive(Debug)]
pub struct PresenceExpectation<T> {
    actual: Option<T>,
    description: Option<String>,
}

impl<T: std::fmt::Debug> PresenceExpectation<T> {
    /// Attach a subject label used in failure messages
    #[must_use]
    pub fn described_as(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    fn subject(&self) -> &str {
        self.description.as_deref().unwrap_or("queried value")
    }

    /// Assert the value exists and unwrap it
    pub fn to_exist(self) -> AsentarResult<T> {
        let subject = self.subject().to_string();
        self.actual.ok_or(AsentarError::Assertion {
            message: format!("expected {subject} to exist, found none"),
        })
    }

    /// Assert the value is absent
    pub fn to_be_absent(self) -> AsentarResult<()> {
        match self.actual {
            None => Ok(()),
            Some(ref value) => Err(AsentarError::Assertion {
                message: format!("expected {} to be absent, found {value:?}", self.subject()),
            }),
        }
    }
}

/// Wrap an optional query result for existence assertions
pub fn expect_present<T>(actual: Option<T>) -> PresenceExpectation<T> {
    PresenceExpectation {
        actual,
        description: None,
    }
}
