use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    pub(crate) static ref INTEGER_SHAPE: Regex = Regex::new(r"^[+-]?\d+$").unwrap();
    pub(crate) static ref FLOAT_SHAPE: Regex = Regex::new(r"^[+-]?\d+(\.\d+)?$").unwrap();
}

/// The type a stored value is treated as at query time.
///
/// Every value is persisted as text; the type is inferred from its shape
/// whenever a comparison needs it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    /// Optional sign followed by digits.
    Integer,
    /// Optional sign, digits, a dot and more digits.
    Float,
    /// `true` or `false`, any case.
    Boolean,
    /// The literal `NULL`, any case.
    Null,
    /// Anything else.
    Text,
}

impl DataType {
    /// Infers the type of a single stored value from its textual shape.
    pub fn infer(value: &str) -> Self {
        if INTEGER_SHAPE.is_match(value) {
            DataType::Integer
        } else if FLOAT_SHAPE.is_match(value) {
            DataType::Float
        } else if value.eq_ignore_ascii_case("true") || value.eq_ignore_ascii_case("false") {
            DataType::Boolean
        } else if value.eq_ignore_ascii_case("null") {
            DataType::Null
        } else {
            DataType::Text
        }
    }
}

/// Parses `value` as a number if it reads as one.
///
/// This is looser than [DataType::infer]: exponents and surrounding
/// whitespace are accepted. Spellings of infinity and NaN are text.
pub fn parse_number(value: &str) -> Option<f64> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|number| number.is_finite())
}
