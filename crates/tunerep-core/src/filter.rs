//! Lexical validation of report filter expressions.
//!
//! Filters are a small SQL-like boolean language, e.g.
//! `(publisher_id > 0 AND site.name LIKE 'acme%')`. Validation is purely
//! lexical: brackets must balance and every token must be a literal, a known
//! operator or conjunction, or something shaped like a field name. Whether a
//! field exists on a given endpoint is not checked here.

use std::fmt::{Display, Formatter};
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::error::FilterError;

const OPERATORS: [&str; 14] = [
    "=", "!=", "<", "<=", ">", ">=", "IS", "NOT", "NULL", "IN", "LIKE", "RLIKE", "REGEXP",
    "BETWEEN",
];
const CONJUNCTIONS: [&str; 2] = ["AND", "OR"];
const OPENERS: [char; 3] = ['(', '[', '{'];
const CLOSERS: [char; 3] = [')', ']', '}'];

static QUOTED_LITERAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^'[A-Za-z0-9_%$.\-@:/]*'$").expect("valid quoted literal regex"));
static NUMERIC_LITERAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[+-]?(\d+(\.\d*)?|\.\d+)$").expect("valid numeric regex"));
static FIELD_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9._]+$").expect("valid field name regex"));

/// What a filter token was recognized as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    QuotedLiteral,
    NumericLiteral,
    Operator,
    Conjunction,
    FieldName,
    /// Comma-separated literals, as found inside `IN (...)`.
    LiteralList,
}

/// A validated filter, wrapped once in parentheses.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(into = "String")]
pub struct FilterExpression(String);

impl FilterExpression {
    /// Validates `input` and returns it whitespace-normalized and wrapped in `(...)`.
    pub fn parse(input: &str) -> Result<Self, FilterError> {
        let normalized = collapse_whitespace(input);
        check_brackets(&normalized)?;

        let stripped = normalized.replace(['(', ')'], " ");
        let mut token_count = 0_usize;
        for token in stripped.split_whitespace() {
            if classify(token).is_none() {
                return Err(FilterError::InvalidToken {
                    token: token.to_owned(),
                });
            }
            token_count += 1;
        }

        if token_count == 0 {
            return Err(FilterError::Empty);
        }

        Ok(Self(format!("({normalized})")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl Display for FilterExpression {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for FilterExpression {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for FilterExpression {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<FilterExpression> for String {
    fn from(value: FilterExpression) -> Self {
        value.0
    }
}

/// Classifies one whitespace-delimited token; `None` means the token is not allowed.
pub fn classify(token: &str) -> Option<TokenKind> {
    if QUOTED_LITERAL.is_match(token) {
        return Some(TokenKind::QuotedLiteral);
    }
    if NUMERIC_LITERAL.is_match(token) {
        return Some(TokenKind::NumericLiteral);
    }
    if OPERATORS
        .iter()
        .any(|operator| operator.eq_ignore_ascii_case(token))
    {
        return Some(TokenKind::Operator);
    }
    if CONJUNCTIONS
        .iter()
        .any(|conjunction| conjunction.eq_ignore_ascii_case(token))
    {
        return Some(TokenKind::Conjunction);
    }
    if FIELD_NAME.is_match(token) {
        return Some(TokenKind::FieldName);
    }
    if token.contains(',') && is_literal_list(token) {
        return Some(TokenKind::LiteralList);
    }
    None
}

fn is_literal_list(token: &str) -> bool {
    let mut pieces = token.split(',').filter(|piece| !piece.is_empty()).peekable();
    if pieces.peek().is_none() {
        return false;
    }
    pieces.all(|piece| QUOTED_LITERAL.is_match(piece) || NUMERIC_LITERAL.is_match(piece))
}

fn collapse_whitespace(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn check_brackets(input: &str) -> Result<(), FilterError> {
    // (pair index, position of the opening bracket)
    let mut stack: Vec<(usize, usize)> = Vec::new();

    for (index, ch) in input.char_indices() {
        if let Some(pair) = OPENERS.iter().position(|open| *open == ch) {
            stack.push((pair, index));
            continue;
        }

        let Some(pair) = CLOSERS.iter().position(|close| *close == ch) else {
            continue;
        };

        match stack.pop() {
            None => return Err(FilterError::UnexpectedClose { found: ch, index }),
            Some((open_pair, _)) if open_pair != pair => {
                return Err(FilterError::MismatchedClose {
                    found: ch,
                    expected: CLOSERS[open_pair],
                    index,
                });
            }
            Some(_) => {}
        }
    }

    match stack.pop() {
        Some((pair, index)) => Err(FilterError::UnclosedOpen {
            open: OPENERS[pair],
            index,
        }),
        None => Ok(()),
    }
}
