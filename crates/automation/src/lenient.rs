//! Serde helpers for input coming straight from form widgets, which hand
//! numbers back as text more often than not.

use std::fmt::Display;
use std::str::FromStr;

use serde::de::{self, Deserializer};
use serde::Deserialize;

/// A numeric form value. Non-finite floats never make it into a form: the
/// backend wire format has no representation for them.
pub trait FormNumber: FromStr {
    fn is_finite_number(&self) -> bool;
}

impl FormNumber for f64 {
    fn is_finite_number(&self) -> bool {
        self.is_finite()
    }
}

impl FormNumber for u32 {
    fn is_finite_number(&self) -> bool {
        true
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
pub(crate) enum NumberOrText<T> {
    Number(T),
    Text(String),
}

impl NumberOrText<f64> {
    /// Unparseable text becomes NaN, which downstream treats as "no value".
    pub(crate) fn into_f64(self) -> f64 {
        match self {
            Self::Number(n) => n,
            Self::Text(s) => s.trim().parse().unwrap_or(f64::NAN),
        }
    }
}

fn parse_text<T, E>(s: &str) -> Result<T, E>
where
    T: FormNumber,
    T::Err: Display,
    E: de::Error,
{
    let n: T = s
        .trim()
        .parse()
        .map_err(|e| E::custom(format!("invalid number {s:?}: {e}")))?;
    finite(n)
}

fn finite<T: FormNumber, E: de::Error>(n: T) -> Result<T, E> {
    if n.is_finite_number() {
        Ok(n)
    } else {
        Err(E::custom("number must be finite"))
    }
}

/// Accept `30`, `30.5` or `"30"` for a numeric field.
pub fn number<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + FormNumber,
    T::Err: Display,
{
    match NumberOrText::<T>::deserialize(deserializer)? {
        NumberOrText::Number(n) => finite(n),
        NumberOrText::Text(s) => parse_text(&s),
    }
}

/// Like [`number`], but `null` and blank text mean "not set".
pub fn option_number<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + FormNumber,
    T::Err: Display,
{
    match Option::<NumberOrText<T>>::deserialize(deserializer)? {
        None => Ok(None),
        Some(NumberOrText::Number(n)) => finite(n).map(Some),
        Some(NumberOrText::Text(s)) if s.trim().is_empty() => Ok(None),
        Some(NumberOrText::Text(s)) => parse_text(&s).map(Some),
    }
}

/// Parse an optional string through `FromStr`; unknown values become `None`
/// instead of failing the whole document.
pub fn parsed_or_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.and_then(|s| s.trim().parse().ok()))
}
