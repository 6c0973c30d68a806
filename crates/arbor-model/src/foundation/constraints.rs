//! Value and node constraints.
//!
//! Two constraint families live here:
//!
//! - **Type constraints** bound the value space of a leaf type: numeric
//!   ranges, string/binary lengths, patterns, fraction digits. They
//!   accumulate along a type derivation chain and may only narrow.
//! - **Node constraints** bound the data tree: mandatory presence,
//!   element cardinality, `must` and `when` guards.
//!
//! # Narrowing
//!
//! [`TypeConstraints`] is fed from the most derived type outward to its
//! base. The first non-empty set of each family wins; every later
//! (more basic) set must contain it. A derived type that reaches
//! outside its base is rejected, which keeps restriction monotonic
//! along the whole chain.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single bound of a numeric range.
///
/// Integer and decimal bounds may meet in one derivation chain when a
/// decimal type is restricted with whole-number bounds. Values are
/// finite by construction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum RangeValue {
    /// Integer bound.
    Int(i128),
    /// Decimal bound.
    Decimal(f64),
}

// 2^127, the first finite f64 past every i128.
const I128_EDGE: f64 = 170141183460469231731687303715884105728.0;

impl RangeValue {
    /// Numeric `<=` across both representations.
    ///
    /// Mixed comparisons stay exact: the decimal side is floored or
    /// ceiled onto the integer lattice rather than the integer side
    /// rounding through `f64`, which loses precision past 2^53.
    pub fn le(&self, other: &RangeValue) -> bool {
        match (*self, *other) {
            (RangeValue::Int(a), RangeValue::Int(b)) => a <= b,
            (RangeValue::Decimal(a), RangeValue::Decimal(b)) => a <= b,
            (RangeValue::Int(a), RangeValue::Decimal(b)) => {
                if b >= I128_EDGE {
                    true
                } else if b < -I128_EDGE {
                    false
                } else {
                    a <= b.floor() as i128
                }
            }
            (RangeValue::Decimal(a), RangeValue::Int(b)) => {
                if a >= I128_EDGE {
                    false
                } else if a < -I128_EDGE {
                    true
                } else {
                    a.ceil() as i128 <= b
                }
            }
        }
    }
}

impl fmt::Display for RangeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RangeValue::Int(v) => write!(f, "{v}"),
            RangeValue::Decimal(v) => write!(f, "{v}"),
        }
    }
}

/// Closed numeric interval `low..high`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Range {
    /// Lower bound, inclusive.
    pub low: RangeValue,
    /// Upper bound, inclusive.
    pub high: RangeValue,
}

impl Range {
    /// Integer interval.
    pub fn int(low: i128, high: i128) -> Self {
        Self {
            low: RangeValue::Int(low),
            high: RangeValue::Int(high),
        }
    }

    /// Decimal interval.
    pub fn decimal(low: f64, high: f64) -> Self {
        Self {
            low: RangeValue::Decimal(low),
            high: RangeValue::Decimal(high),
        }
    }

    /// True when `other` lies entirely inside this interval.
    pub fn contains(&self, other: &Range) -> bool {
        self.low.le(&other.low) && other.high.le(&self.high)
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.low, self.high)
    }
}

/// Closed length interval for string and binary values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Length {
    /// Minimum length, inclusive.
    pub low: u64,
    /// Maximum length, inclusive.
    pub high: u64,
}

impl Length {
    /// Length interval `low..high`.
    pub fn new(low: u64, high: u64) -> Self {
        Self { low, high }
    }

    /// True when `other` lies entirely inside this interval.
    pub fn contains(&self, other: &Length) -> bool {
        self.low <= other.low && other.high <= self.high
    }
}

impl fmt::Display for Length {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.low, self.high)
    }
}

/// Regular expression constraint on a string type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pattern {
    /// The regular expression source text.
    pub regex: String,
    /// Message to report when a value does not match.
    pub error_message: Option<String>,
}

impl Pattern {
    /// Pattern with no custom error message.
    pub fn new(regex: impl Into<String>) -> Self {
        Self {
            regex: regex.into(),
            error_message: None,
        }
    }
}

/// Violation of the narrowing rule along a derivation chain.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConstraintError {
    /// A derived range reaches outside every range of its base.
    #[error("range {child} is not within the base type range")]
    RangeNotNarrower {
        /// The offending derived range.
        child: Range,
    },
    /// A derived length reaches outside every length of its base.
    #[error("length {child} is not within the base type length")]
    LengthNotNarrower {
        /// The offending derived length.
        child: Length,
    },
    /// fraction-digits differs from the base type.
    #[error("fraction-digits {child} does not match base type fraction-digits {base}")]
    FractionDigitsMismatch {
        /// Digits on the derived type.
        child: u8,
        /// Digits on the base type.
        base: u8,
    },
}

/// Accumulator for type constraints along a derivation chain.
///
/// Feed it derived-first: the first non-empty range/length set becomes
/// the effective one and later sets only validate containment.
/// Patterns are cumulative; a value must satisfy all of them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TypeConstraints {
    ranges: Vec<Range>,
    lengths: Vec<Length>,
    patterns: Vec<Pattern>,
    fraction_digits: Option<u8>,
}

impl TypeConstraints {
    /// Empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge a range set from the next link of the chain.
    ///
    /// The first non-empty set is kept as effective; any later set must
    /// contain every effective range.
    pub fn add_ranges(&mut self, ranges: &[Range]) -> Result<(), ConstraintError> {
        if ranges.is_empty() {
            return Ok(());
        }
        if self.ranges.is_empty() {
            self.ranges = ranges.to_vec();
            return Ok(());
        }
        for child in &self.ranges {
            if !ranges.iter().any(|base| base.contains(child)) {
                return Err(ConstraintError::RangeNotNarrower { child: *child });
            }
        }
        Ok(())
    }

    /// Merge a length set from the next link of the chain.
    pub fn add_lengths(&mut self, lengths: &[Length]) -> Result<(), ConstraintError> {
        if lengths.is_empty() {
            return Ok(());
        }
        if self.lengths.is_empty() {
            self.lengths = lengths.to_vec();
            return Ok(());
        }
        for child in &self.lengths {
            if !lengths.iter().any(|base| base.contains(child)) {
                return Err(ConstraintError::LengthNotNarrower { child: *child });
            }
        }
        Ok(())
    }

    /// Add patterns from the next link of the chain. All of them apply.
    pub fn add_patterns(&mut self, patterns: &[Pattern]) {
        self.patterns.extend_from_slice(patterns);
    }

    /// Record fraction digits. Digits are fixed by the first link that
    /// declares them; a later differing declaration is an error.
    pub fn set_fraction_digits(&mut self, digits: u8) -> Result<(), ConstraintError> {
        match self.fraction_digits {
            None => {
                self.fraction_digits = Some(digits);
                Ok(())
            }
            Some(existing) if existing == digits => Ok(()),
            Some(existing) => Err(ConstraintError::FractionDigitsMismatch {
                child: existing,
                base: digits,
            }),
        }
    }

    /// Effective ranges.
    pub fn ranges(&self) -> &[Range] {
        &self.ranges
    }

    /// Effective lengths.
    pub fn lengths(&self) -> &[Length] {
        &self.lengths
    }

    /// All applicable patterns, most derived first.
    pub fn patterns(&self) -> &[Pattern] {
        &self.patterns
    }

    /// Declared fraction digits, if any.
    pub fn fraction_digits(&self) -> Option<u8> {
        self.fraction_digits
    }

    /// True when nothing has been accumulated.
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
            && self.lengths.is_empty()
            && self.patterns.is_empty()
            && self.fraction_digits.is_none()
    }
}

/// `must` guard on a data node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Must {
    /// The guard expression. Carried opaquely; evaluation is a data
    /// tree concern, not a schema concern.
    pub condition: String,
    /// Message to report when the guard fails.
    pub error_message: Option<String>,
    /// Application tag to report when the guard fails.
    pub error_app_tag: Option<String>,
    /// Statement description.
    pub description: Option<String>,
    /// Statement reference.
    pub reference: Option<String>,
}

impl Must {
    /// Guard with only a condition.
    pub fn new(condition: impl Into<String>) -> Self {
        Self {
            condition: condition.into(),
            error_message: None,
            error_app_tag: None,
            description: None,
            reference: None,
        }
    }
}

/// Data tree constraints of a schema node.
///
/// `min_elements` above zero implies `mandatory`; builders maintain
/// that implication when the fields are set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeConstraints {
    /// The node (or at least one element of it) must exist.
    pub mandatory: bool,
    /// Minimum number of list / leaf-list elements.
    pub min_elements: Option<u32>,
    /// Maximum number of list / leaf-list elements.
    pub max_elements: Option<u32>,
    /// Guards that instance data must satisfy.
    pub musts: Vec<Must>,
    /// Conditional presence expression.
    pub when: Option<String>,
}
