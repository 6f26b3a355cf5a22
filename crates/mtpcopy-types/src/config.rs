//! Configuration value types for mtpcopy
//!
//! This module provides validated configuration values shared by the config
//! loader, the engine, and the command line front-end.

use crate::path::is_separator;
use crate::{Error, Result};
use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};
use std::fmt::{self, Write as _};

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

const DAY_NAMES: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

/// Maximum number of fraction digits a pattern may request
const MAX_FRACTION_DIGITS: usize = 7;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Literal(String),
    Year(usize),
    Month(usize),
    Day(usize),
    Hour24(usize),
    Hour12(usize),
    Minute(usize),
    Second(usize),
    Fraction(usize),
    AmPm(usize),
}

/// A token-based date/time pattern that turns a capture time into a
/// relative target path
///
/// Tokens follow the familiar custom date format letters (`yyyy`, `MM`,
/// `dd`, `HH`, `mm`, `ss`, ...). Text in single or double quotes and
/// characters after a backslash are copied verbatim. Every other character
/// is literal, so `/` introduces a subdirectory.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "String", into = "String")
)]
pub struct NamingPattern {
    raw: String,
    tokens: Vec<Token>,
}

impl NamingPattern {
    /// The default pattern: year and month folders, timestamped file name
    pub const DEFAULT: &'static str = "yyyy/MM/yyyy-MM-dd_HH-mm-ss";

    /// Parse and validate a pattern
    ///
    /// Patterns must produce a relative path: they may not be empty, start
    /// with a separator, or yield empty, `.` or `..` segments.
    pub fn parse(raw: &str) -> Result<Self> {
        if raw.trim().is_empty() {
            return Err(Error::config("naming pattern is empty"));
        }
        let tokens = tokenize(raw)?;
        let pattern = Self {
            raw: raw.to_string(),
            tokens,
        };

        let sample = NaiveDate::from_ymd_opt(2001, 12, 31)
            .and_then(|d| d.and_hms_opt(23, 59, 58))
            .ok_or_else(|| Error::other("invalid sample date"))?;
        let rendered = pattern.format(&sample);
        if rendered.starts_with(is_separator) {
            return Err(Error::config(format!(
                "naming pattern '{}' must produce a relative path",
                raw
            )));
        }
        for segment in rendered.split(is_separator) {
            if segment.is_empty() || segment == "." || segment == ".." {
                return Err(Error::config(format!(
                    "naming pattern '{}' produces an invalid path segment '{}'",
                    raw, segment
                )));
            }
        }

        Ok(pattern)
    }

    /// The pattern text as written
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Render the pattern for a timestamp
    pub fn format(&self, at: &NaiveDateTime) -> String {
        let mut out = String::with_capacity(self.raw.len() + 8);
        for token in &self.tokens {
            match token {
                Token::Literal(text) => out.push_str(text),
                Token::Year(width) if *width <= 2 => {
                    let short = at.year().rem_euclid(100);
                    let _ = write!(out, "{:0width$}", short, width = *width);
                }
                Token::Year(width) => {
                    let _ = write!(out, "{:0width$}", at.year(), width = *width);
                }
                Token::Month(width) if *width >= 4 => {
                    out.push_str(MONTH_NAMES[at.month0() as usize]);
                }
                Token::Month(3) => out.push_str(&MONTH_NAMES[at.month0() as usize][..3]),
                Token::Month(width) => push_number(&mut out, at.month(), *width),
                Token::Day(width) if *width >= 4 => {
                    out.push_str(DAY_NAMES[at.weekday().num_days_from_monday() as usize]);
                }
                Token::Day(3) => {
                    out.push_str(&DAY_NAMES[at.weekday().num_days_from_monday() as usize][..3]);
                }
                Token::Day(width) => push_number(&mut out, at.day(), *width),
                Token::Hour24(width) => push_number(&mut out, at.hour(), *width),
                Token::Hour12(width) => push_number(&mut out, at.hour12().1, *width),
                Token::Minute(width) => push_number(&mut out, at.minute(), *width),
                Token::Second(width) => push_number(&mut out, at.second(), *width),
                Token::Fraction(digits) => {
                    let nanos = at.nanosecond() % 1_000_000_000;
                    let scaled = nanos / 10u32.pow((9 - *digits) as u32);
                    let _ = write!(out, "{:0width$}", scaled, width = *digits);
                }
                Token::AmPm(width) => {
                    let marker = if at.hour12().0 { "PM" } else { "AM" };
                    out.push_str(if *width == 1 { &marker[..1] } else { marker });
                }
            }
        }
        out
    }
}

/// Two digits at any width of two or more; no padding at width one
fn push_number(out: &mut String, value: u32, width: usize) {
    let _ = write!(out, "{:0width$}", value, width = width.min(2));
}

fn tokenize(raw: &str) -> Result<Vec<Token>> {
    let chars: Vec<char> = raw.chars().collect();
    let mut tokens = Vec::new();
    let mut literal = String::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            '\'' | '"' => {
                let close = chars[i + 1..]
                    .iter()
                    .position(|&q| q == c)
                    .ok_or_else(|| {
                        Error::config(format!("unterminated quote in naming pattern '{}'", raw))
                    })?;
                literal.extend(&chars[i + 1..i + 1 + close]);
                i += close + 2;
            }
            '\\' => {
                let escaped = chars.get(i + 1).ok_or_else(|| {
                    Error::config(format!("dangling escape in naming pattern '{}'", raw))
                })?;
                literal.push(*escaped);
                i += 2;
            }
            'y' | 'M' | 'd' | 'H' | 'h' | 'm' | 's' | 'f' | 't' => {
                let run = chars[i..].iter().take_while(|&&x| x == c).count();
                if !literal.is_empty() {
                    tokens.push(Token::Literal(std::mem::take(&mut literal)));
                }
                tokens.push(match c {
                    'y' => Token::Year(run),
                    'M' => Token::Month(run),
                    'd' => Token::Day(run),
                    'H' => Token::Hour24(run),
                    'h' => Token::Hour12(run),
                    'm' => Token::Minute(run),
                    's' => Token::Second(run),
                    'f' if run > MAX_FRACTION_DIGITS => {
                        return Err(Error::config(format!(
                            "naming pattern '{}' requests more than {} fraction digits",
                            raw, MAX_FRACTION_DIGITS
                        )))
                    }
                    'f' => Token::Fraction(run),
                    _ => Token::AmPm(run),
                });
                i += run;
            }
            _ => {
                literal.push(c);
                i += 1;
            }
        }
    }

    if !literal.is_empty() {
        tokens.push(Token::Literal(literal));
    }
    Ok(tokens)
}

impl Default for NamingPattern {
    fn default() -> Self {
        Self {
            raw: Self::DEFAULT.to_string(),
            tokens: tokenize(Self::DEFAULT).unwrap_or_default(),
        }
    }
}

impl fmt::Display for NamingPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl std::str::FromStr for NamingPattern {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for NamingPattern {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<NamingPattern> for String {
    fn from(pattern: NamingPattern) -> Self {
        pattern.raw
    }
}

/// What to do when the resolved target path is already occupied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "lowercase")
)]
pub enum CollisionPolicy {
    /// Keep both: place the new file as `name (1).ext`, `name (2).ext`, ...
    #[default]
    Rename,
    /// Replace the existing file
    Overwrite,
    /// Abort the run with `DestinationExists`
    Fail,
}

impl fmt::Display for CollisionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Rename => "rename",
            Self::Overwrite => "overwrite",
            Self::Fail => "fail",
        };
        f.write_str(name)
    }
}
