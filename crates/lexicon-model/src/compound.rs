//! Compound specifications (`"left: right"`).
//!
//! Three record fields encode a two-sided reference in one string. They are
//! parsed once, at the boundary, into a `CompoundSpec`; the raw string is kept
//! only for error messages.

use nom::bytes::complete::take_till;
use nom::character::complete::char;
use nom::combinator::all_consuming;
use nom::sequence::separated_pair;
use nom::IResult;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::fields::{
    ENHANCEMENT_MEDIUM_SPECIFICATION, RESPONSIBILITY_SPECIFICATION, TRANSFORMATION_SPECIFICATION,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompoundKind {
    /// `Task:Responsibility`
    Responsibility,
    /// `taskProduct:task`
    Transformation,
    /// `enhancement:taskProduct`
    EnhancementMedium,
}

impl CompoundKind {
    pub const ALL: [CompoundKind; 3] = [
        CompoundKind::Responsibility,
        CompoundKind::Transformation,
        CompoundKind::EnhancementMedium,
    ];

    pub fn field_name(self) -> &'static str {
        match self {
            CompoundKind::Responsibility => RESPONSIBILITY_SPECIFICATION,
            CompoundKind::Transformation => TRANSFORMATION_SPECIFICATION,
            CompoundKind::EnhancementMedium => ENHANCEMENT_MEDIUM_SPECIFICATION,
        }
    }

    pub fn from_field_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.field_name() == name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompoundParseError {
    #[error("expected exactly one ':' in compound value `{raw}`, found {colons}")]
    ColonCount { raw: String, colons: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompoundSpec {
    pub kind: CompoundKind,
    pub left: String,
    pub right: String,
    pub raw: String,
}

impl CompoundSpec {
    /// Parse `raw` as `left: right`, trimming both sides.
    pub fn parse(kind: CompoundKind, raw: &str) -> Result<Self, CompoundParseError> {
        let (_, (left, right)) = sides(raw).map_err(|_| CompoundParseError::ColonCount {
            raw: raw.to_string(),
            colons: raw.matches(':').count(),
        })?;
        Ok(Self {
            kind,
            left: left.trim().to_string(),
            right: right.trim().to_string(),
            raw: raw.to_string(),
        })
    }
}

fn sides(input: &str) -> IResult<&str, (&str, &str)> {
    all_consuming(separated_pair(
        take_till(|c: char| c == ':'),
        char(':'),
        take_till(|c: char| c == ':'),
    ))(input)
}
