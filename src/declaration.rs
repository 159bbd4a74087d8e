//! Rendered SQL column types.
//!
//! [`TypeDeclaration`] is the closed set of declarations the classifier can
//! produce. Type names follow the Netezza (IBM PureData) dialect:
//!
//! | Declaration | SQL text |
//! |---|---|
//! | 8/16/32/64-bit integer | `BYTEINT`, `SMALLINT`, `INTEGER`, `BIGINT` |
//! | single/double float | `REAL`, `DOUBLE PRECISION` |
//! | temporal | `TIMESTAMP`, `DATE`, `TIME` |
//! | character | `CHAR(n)`, `VARCHAR(n)`, `NCHAR(n)`, `NVARCHAR(n)` |

use std::fmt;

use serde::{Serialize, Serializer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum IntegerWidth {
    Bits8,
    Bits16,
    Bits32,
    Bits64,
}

impl IntegerWidth {
    /// Candidate widths, narrowest first.
    pub const ALL: [IntegerWidth; 4] = [
        IntegerWidth::Bits8,
        IntegerWidth::Bits16,
        IntegerWidth::Bits32,
        IntegerWidth::Bits64,
    ];

    pub const fn bits(self) -> u32 {
        match self {
            IntegerWidth::Bits8 => 8,
            IntegerWidth::Bits16 => 16,
            IntegerWidth::Bits32 => 32,
            IntegerWidth::Bits64 => 64,
        }
    }

    pub const fn min_value(self) -> i128 {
        -(1i128 << (self.bits() - 1))
    }

    pub const fn max_value(self) -> i128 {
        (1i128 << (self.bits() - 1)) - 1
    }

    pub fn holds(self, min: i128, max: i128) -> bool {
        self.min_value() <= min && max <= self.max_value()
    }

    /// Narrowest width holding every value in `min..=max`.
    pub fn narrowest(min: i128, max: i128) -> Option<Self> {
        Self::ALL.into_iter().find(|width| width.holds(min, max))
    }

    pub fn sql_name(self) -> &'static str {
        match self {
            IntegerWidth::Bits8 => "BYTEINT",
            IntegerWidth::Bits16 => "SMALLINT",
            IntegerWidth::Bits32 => "INTEGER",
            IntegerWidth::Bits64 => "BIGINT",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeDeclaration {
    Integer(IntegerWidth),
    Real,
    DoublePrecision,
    Timestamp,
    Date,
    Time,
    Char { width: usize, national: bool },
    Varchar { width: usize, national: bool },
}

impl fmt::Display for TypeDeclaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeDeclaration::Integer(width) => f.write_str(width.sql_name()),
            TypeDeclaration::Real => f.write_str("REAL"),
            TypeDeclaration::DoublePrecision => f.write_str("DOUBLE PRECISION"),
            TypeDeclaration::Timestamp => f.write_str("TIMESTAMP"),
            TypeDeclaration::Date => f.write_str("DATE"),
            TypeDeclaration::Time => f.write_str("TIME"),
            TypeDeclaration::Char { width, national } => {
                let prefix = if *national { "N" } else { "" };
                write!(f, "{prefix}CHAR({width})")
            }
            TypeDeclaration::Varchar { width, national } => {
                let prefix = if *national { "N" } else { "" };
                write!(f, "{prefix}VARCHAR({width})")
            }
        }
    }
}

impl Serialize for TypeDeclaration {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_width_bounds_match_twos_complement() {
        assert_eq!(IntegerWidth::Bits8.min_value(), -128);
        assert_eq!(IntegerWidth::Bits8.max_value(), 127);
        assert_eq!(IntegerWidth::Bits64.min_value(), i64::MIN as i128);
        assert_eq!(IntegerWidth::Bits64.max_value(), i64::MAX as i128);
    }

    #[test]
    fn narrowest_width_picks_smallest_fit() {
        assert_eq!(IntegerWidth::narrowest(-128, 127), Some(IntegerWidth::Bits8));
        assert_eq!(IntegerWidth::narrowest(0, 128), Some(IntegerWidth::Bits16));
        assert_eq!(IntegerWidth::narrowest(-32769, 0), Some(IntegerWidth::Bits32));
        assert_eq!(
            IntegerWidth::narrowest(0, i64::MAX as i128 + 1),
            None,
            "values beyond i64 have no width"
        );
    }

    #[test]
    fn display_renders_sql_text() {
        assert_eq!(
            TypeDeclaration::Integer(IntegerWidth::Bits32).to_string(),
            "INTEGER"
        );
        assert_eq!(TypeDeclaration::DoublePrecision.to_string(), "DOUBLE PRECISION");
        assert_eq!(
            TypeDeclaration::Char {
                width: 5,
                national: false
            }
            .to_string(),
            "CHAR(5)"
        );
        assert_eq!(
            TypeDeclaration::Varchar {
                width: 12,
                national: true
            }
            .to_string(),
            "NVARCHAR(12)"
        );
    }
}
