//! Per-column type-narrowing classifier.
//!
//! Every column starts out as an integer and is offered one field at a time.
//! When a value disproves the current hypothesis the column falls back to
//! the next [`Variant`] in a fixed order:
//!
//! ```text
//! Integer -> Float -> DateTime -> Date -> Time -> Text
//! ```
//!
//! A column never moves backwards in that order, and `Text` accepts every
//! value, so the chain always terminates. Each variant keeps only the
//! statistics needed to render its [`TypeDeclaration`]; those statistics are
//! dropped whenever the column advances.
//!
//! Under [`FallbackMode::Discard`] the value that caused a transition is not
//! offered to the new variant. [`FallbackMode::Replay`] keeps offering it to
//! successive variants until one accepts it.

use std::{
    collections::BTreeSet,
    fmt, mem,
    sync::{Arc, LazyLock},
};

use clap::ValueEnum;
use log::debug;
use regex::Regex;

use crate::{
    declaration::{IntegerWidth, TypeDeclaration},
    error::{InferError, IntegerOverflow},
};

pub const DEFAULT_DATETIME_PATTERN: &str = r"\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2}";
pub const DEFAULT_DATE_PATTERN: &str = r"\d{4}-\d{2}-\d{2}";
pub const DEFAULT_TIME_PATTERN: &str = r"\d{2}:\d{2}:\d{2}";

/// Widths up to this value render as single precision.
const REAL_MAX_LITERAL_WIDTH: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Variant {
    Integer,
    Float,
    DateTime,
    Date,
    Time,
    Text,
}

impl Variant {
    pub const FALLBACK_ORDER: [Variant; 6] = [
        Variant::Integer,
        Variant::Float,
        Variant::DateTime,
        Variant::Date,
        Variant::Time,
        Variant::Text,
    ];

    /// Successor in the fallback order. `Text` is terminal and has none.
    pub const fn next(self) -> Option<Variant> {
        match self {
            Variant::Integer => Some(Variant::Float),
            Variant::Float => Some(Variant::DateTime),
            Variant::DateTime => Some(Variant::Date),
            Variant::Date => Some(Variant::Time),
            Variant::Time => Some(Variant::Text),
            Variant::Text => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Variant::Integer => "integer",
            Variant::Float => "float",
            Variant::DateTime => "datetime",
            Variant::Date => "date",
            Variant::Time => "time",
            Variant::Text => "text",
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
#[value(rename_all = "kebab-case")]
pub enum FallbackMode {
    /// Drop the value that forced a transition
    #[default]
    Discard,
    /// Offer the rejected value to each following variant until one accepts it
    Replay,
}

/// Search patterns for the temporal variants.
///
/// Patterns are matched anywhere inside a value, so `"due 2020-01-01"`
/// satisfies the default date pattern.
#[derive(Debug, Clone)]
pub struct TemporalPatterns {
    datetime: Regex,
    date: Regex,
    time: Regex,
}

impl TemporalPatterns {
    pub fn new(datetime: &str, date: &str, time: &str) -> Result<Self, InferError> {
        Ok(Self {
            datetime: compile_pattern("datetime", datetime)?,
            date: compile_pattern("date", date)?,
            time: compile_pattern("time", time)?,
        })
    }

    /// Builds patterns from optional overrides, using the defaults for the rest.
    pub fn with_overrides(
        datetime: Option<&str>,
        date: Option<&str>,
        time: Option<&str>,
    ) -> Result<Self, InferError> {
        let defaults = &*DEFAULT_PATTERNS;
        Ok(Self {
            datetime: override_or(defaults.datetime(), "datetime", datetime)?,
            date: override_or(defaults.date(), "date", date)?,
            time: override_or(defaults.time(), "time", time)?,
        })
    }

    pub fn datetime(&self) -> &Regex {
        &self.datetime
    }

    pub fn date(&self) -> &Regex {
        &self.date
    }

    pub fn time(&self) -> &Regex {
        &self.time
    }
}

static DEFAULT_PATTERNS: LazyLock<TemporalPatterns> = LazyLock::new(|| {
    TemporalPatterns::new(
        DEFAULT_DATETIME_PATTERN,
        DEFAULT_DATE_PATTERN,
        DEFAULT_TIME_PATTERN,
    )
    .expect("Invalid default temporal pattern")
});

impl Default for TemporalPatterns {
    fn default() -> Self {
        DEFAULT_PATTERNS.clone()
    }
}

fn override_or(
    default: &Regex,
    kind: &'static str,
    pattern: Option<&str>,
) -> Result<Regex, InferError> {
    pattern.map_or_else(|| Ok(default.clone()), |pattern| compile_pattern(kind, pattern))
}

fn compile_pattern(kind: &'static str, pattern: &str) -> Result<Regex, InferError> {
    Regex::new(pattern).map_err(|source| InferError::InvalidPattern {
        kind,
        pattern: pattern.to_string(),
        source,
    })
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IntegerStats {
    range: Option<(i128, i128)>,
}

impl IntegerStats {
    pub fn range(&self) -> Option<(i128, i128)> {
        self.range
    }

    fn record(&mut self, value: i128) {
        self.range = Some(match self.range {
            Some((min, max)) => (min.min(value), max.max(value)),
            None => (value, value),
        });
    }

    fn width(&self) -> Result<IntegerWidth, IntegerOverflow> {
        let Some((min, max)) = self.range else {
            return Ok(IntegerWidth::Bits8);
        };
        IntegerWidth::narrowest(min, max).ok_or(IntegerOverflow { min, max })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FloatStats {
    max_literal_width: usize,
}

impl FloatStats {
    pub fn max_literal_width(&self) -> usize {
        self.max_literal_width
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextStats {
    lengths: BTreeSet<usize>,
    ascii_only: bool,
}

impl Default for TextStats {
    fn default() -> Self {
        Self {
            lengths: BTreeSet::new(),
            ascii_only: true,
        }
    }
}

impl TextStats {
    pub fn lengths(&self) -> &BTreeSet<usize> {
        &self.lengths
    }

    pub fn ascii_only(&self) -> bool {
        self.ascii_only
    }

    fn record(&mut self, value: &str) {
        self.lengths.insert(value.chars().count());
        if self.ascii_only && !value.is_ascii() {
            self.ascii_only = false;
        }
    }

    fn declaration(&self) -> TypeDeclaration {
        let national = !self.ascii_only;
        let width = self.lengths.last().copied().unwrap_or(0).max(1);
        if self.lengths.len() == 1 {
            TypeDeclaration::Char { width, national }
        } else {
            TypeDeclaration::Varchar { width, national }
        }
    }
}

/// Current hypothesis for one column, with the statistics it has gathered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeState {
    Integer(IntegerStats),
    Float(FloatStats),
    DateTime,
    Date,
    Time,
    Text(TextStats),
}

impl Default for TypeState {
    fn default() -> Self {
        TypeState::Integer(IntegerStats::default())
    }
}

/// Outcome of offering one value to a [`TypeState`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Accepted(TypeState),
    /// The value was rejected; holds the freshly entered successor state.
    Advanced(TypeState),
}

impl Step {
    pub fn into_state(self) -> TypeState {
        match self {
            Step::Accepted(state) | Step::Advanced(state) => state,
        }
    }
}

impl TypeState {
    /// Empty state for `variant`, as entered on a transition.
    pub fn fresh(variant: Variant) -> Self {
        match variant {
            Variant::Integer => TypeState::Integer(IntegerStats::default()),
            Variant::Float => TypeState::Float(FloatStats::default()),
            Variant::DateTime => TypeState::DateTime,
            Variant::Date => TypeState::Date,
            Variant::Time => TypeState::Time,
            Variant::Text => TypeState::Text(TextStats::default()),
        }
    }

    pub fn variant(&self) -> Variant {
        match self {
            TypeState::Integer(_) => Variant::Integer,
            TypeState::Float(_) => Variant::Float,
            TypeState::DateTime => Variant::DateTime,
            TypeState::Date => Variant::Date,
            TypeState::Time => Variant::Time,
            TypeState::Text(_) => Variant::Text,
        }
    }

    /// Offers `value` and returns the state the column should hold next.
    pub fn accept(self, value: &str, patterns: &TemporalPatterns) -> TypeState {
        self.offer(value, patterns).into_state()
    }

    pub fn offer(self, value: &str, patterns: &TemporalPatterns) -> Step {
        match self {
            TypeState::Integer(mut stats) => {
                if value.is_empty() {
                    return Step::Accepted(TypeState::Integer(stats));
                }
                match parse_integer_literal(value) {
                    Some(parsed) => {
                        stats.record(parsed);
                        Step::Accepted(TypeState::Integer(stats))
                    }
                    None => Self::rejected(Variant::Integer),
                }
            }
            TypeState::Float(mut stats) => {
                if value.is_empty() {
                    return Step::Accepted(TypeState::Float(stats));
                }
                match decimal_literal_width(value) {
                    Some(width) => {
                        stats.max_literal_width = stats.max_literal_width.max(width);
                        Step::Accepted(TypeState::Float(stats))
                    }
                    None => Self::rejected(Variant::Float),
                }
            }
            TypeState::DateTime => Self::search(Variant::DateTime, patterns.datetime(), value),
            TypeState::Date => Self::search(Variant::Date, patterns.date(), value),
            TypeState::Time => Self::search(Variant::Time, patterns.time(), value),
            TypeState::Text(mut stats) => {
                stats.record(value);
                Step::Accepted(TypeState::Text(stats))
            }
        }
    }

    fn search(variant: Variant, pattern: &Regex, value: &str) -> Step {
        if pattern.is_match(value) {
            Step::Accepted(Self::fresh(variant))
        } else {
            Self::rejected(variant)
        }
    }

    /// Only reachable from non-terminal variants; `Text` never rejects.
    fn rejected(variant: Variant) -> Step {
        match variant.next() {
            Some(next) => Step::Advanced(Self::fresh(next)),
            None => Step::Accepted(Self::fresh(variant)),
        }
    }

    pub fn render(&self) -> Result<TypeDeclaration, IntegerOverflow> {
        Ok(match self {
            TypeState::Integer(stats) => TypeDeclaration::Integer(stats.width()?),
            TypeState::Float(stats) => {
                if stats.max_literal_width <= REAL_MAX_LITERAL_WIDTH {
                    TypeDeclaration::Real
                } else {
                    TypeDeclaration::DoublePrecision
                }
            }
            TypeState::DateTime => TypeDeclaration::Timestamp,
            TypeState::Date => TypeDeclaration::Date,
            TypeState::Time => TypeDeclaration::Time,
            TypeState::Text(stats) => stats.declaration(),
        })
    }

    /// Short human-readable summary of the gathered statistics.
    pub fn describe_stats(&self) -> String {
        match self {
            TypeState::Integer(stats) => match stats.range {
                Some((min, max)) => format!("range {min}..={max}"),
                None => "no values".to_string(),
            },
            TypeState::Float(stats) => format!("literal width {}", stats.max_literal_width),
            TypeState::DateTime | TypeState::Date | TypeState::Time => String::new(),
            TypeState::Text(stats) => {
                let lengths = stats
                    .lengths
                    .iter()
                    .map(|len| len.to_string())
                    .collect::<Vec<_>>()
                    .join(",");
                let charset = if stats.ascii_only { "ascii" } else { "non-ascii" };
                format!("lengths {{{lengths}}}, {charset}")
            }
        }
    }
}

/// Parses `-?[0-9]+`, saturating literals too large for `i128`.
fn parse_integer_literal(value: &str) -> Option<i128> {
    let (negative, digits) = match value.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, value),
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    // Digits only, so the only possible failure is overflow.
    Some(value.parse::<i128>().unwrap_or(if negative {
        i128::MIN
    } else {
        i128::MAX
    }))
}

/// Width of a `-?[0-9]+\.[0-9]+` literal, not counting the decimal point.
fn decimal_literal_width(value: &str) -> Option<usize> {
    let unsigned = value.strip_prefix('-').unwrap_or(value);
    let (whole, fraction) = unsigned.split_once('.')?;
    let all_digits = |part: &str| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit());
    if all_digits(whole) && all_digits(fraction) {
        Some(value.len() - 1)
    } else {
        None
    }
}

/// One column's name together with its evolving [`TypeState`].
#[derive(Debug, Clone)]
pub struct ColumnClassifier {
    name: String,
    state: TypeState,
    patterns: Arc<TemporalPatterns>,
    fallback: FallbackMode,
}

impl ColumnClassifier {
    pub fn new(
        name: impl Into<String>,
        patterns: Arc<TemporalPatterns>,
        fallback: FallbackMode,
    ) -> Self {
        Self {
            name: name.into(),
            state: TypeState::default(),
            patterns,
            fallback,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> &TypeState {
        &self.state
    }

    pub fn variant(&self) -> Variant {
        self.state.variant()
    }

    pub fn accept(&mut self, value: &str) {
        let mut state = mem::take(&mut self.state);
        loop {
            let from = state.variant();
            match state.offer(value, &self.patterns) {
                Step::Accepted(next) => {
                    state = next;
                    break;
                }
                Step::Advanced(next) => {
                    debug!(
                        "Column '{}' fell back from {} to {} on {:?}",
                        self.name,
                        from,
                        next.variant(),
                        value
                    );
                    state = next;
                    if self.fallback == FallbackMode::Discard {
                        break;
                    }
                }
            }
        }
        self.state = state;
    }

    pub fn render(&self) -> Result<TypeDeclaration, InferError> {
        self.state
            .render()
            .map_err(|source| InferError::IntegerOverflow {
                column: self.name.clone(),
                source,
            })
    }
}
