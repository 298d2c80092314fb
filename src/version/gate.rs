//! What's-new gate.
//!
//! Decides whether the startup notice fires by comparing the previously
//! recorded version with the running one. Only the minor component counts:
//! the notice tracks the minor release that changed the converter
//! requirements (pdftocairo), so patch bumps and major jumps stay quiet.

use std::cmp::Ordering;

/// One parsed dot-separated version component.
///
/// Anything that is not a plain signed integer becomes `NotANumber`, which
/// never compares greater or smaller than anything, itself included.
/// Numbers are kept as `f64` so arbitrarily long digit runs still order.
#[derive(Debug, Clone, Copy)]
pub enum Component {
    Number(f64),
    NotANumber,
}

impl Component {
    /// Parse a single component.
    ///
    /// Surrounding whitespace is ignored and an empty component reads as `0`,
    /// so `"1..3"` has minor `0` while `"1.x.3"` has no numeric minor.
    /// A single leading `+` or `-` is accepted.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.is_empty() {
            return Self::Number(0.0);
        }
        let digits = raw.strip_prefix(['+', '-']).unwrap_or(raw);
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Self::NotANumber;
        }
        raw.parse().map_or(Self::NotANumber, Self::Number)
    }
}

impl PartialEq for Component {
    fn eq(&self, other: &Self) -> bool {
        matches!((self, other), (Self::Number(a), Self::Number(b)) if a == b)
    }
}

impl PartialOrd for Component {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Self::Number(a), Self::Number(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}

/// Component at `index`, or `NotANumber` when the string is too short.
fn component(version: &str, index: usize) -> Component {
    version
        .split('.')
        .nth(index)
        .map_or(Component::NotANumber, Component::parse)
}

/// Minor component (index 1) of a version string.
pub fn minor(version: &str) -> Component {
    component(version, 1)
}

/// Whether the what's-new notice should be shown.
///
/// - no previous record: always notify
/// - previous without any `.`: malformed, notify
/// - otherwise notify iff `current`'s minor is strictly greater; a
///   non-numeric minor on either side means no notice
pub fn should_notify(previous: Option<&str>, current: &str) -> bool {
    let Some(previous) = previous else {
        return true;
    };

    if !previous.contains('.') {
        return true;
    }

    minor(current) > minor(previous)
}
