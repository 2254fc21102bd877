//! Validation layer shared by all entities.
//!
//! # Responsibility
//! - Enumerate every reason an entity can fail its persistability contract.
//! - Carry the full reason list so callers can surface all failures at once.
//!
//! # Invariants
//! - Validation never mutates; normalization (trimming) is a separate step
//!   that runs before the emptiness checks.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// A single reason an entity failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationReason {
    /// Card native text is empty after trimming.
    EmptyNative,
    /// Card translation text is empty after trimming.
    EmptyTranslation,
    /// Collection name is empty after trimming.
    EmptyCollectionName,
    /// Card has no owning collection assigned.
    MissingCollection,
}

impl ValidationReason {
    fn describe(self) -> &'static str {
        match self {
            Self::EmptyNative => "native text is empty",
            Self::EmptyTranslation => "translation text is empty",
            Self::EmptyCollectionName => "collection name is empty",
            Self::MissingCollection => "card is not assigned to a collection",
        }
    }
}

/// Validation failure carrying every failed reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    reasons: Vec<ValidationReason>,
}

impl ValidationError {
    /// Builds a result from collected reasons: `Ok(())` when empty.
    pub fn from_reasons(reasons: Vec<ValidationReason>) -> Result<(), ValidationError> {
        if reasons.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { reasons })
        }
    }

    /// The failed reasons, in check order.
    pub fn reasons(&self) -> &[ValidationReason] {
        &self.reasons
    }

    /// Returns whether a specific reason is present.
    pub fn contains(&self, reason: ValidationReason) -> bool {
        self.reasons.contains(&reason)
    }
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "validation failed: ")?;
        for (index, reason) in self.reasons.iter().enumerate() {
            if index > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{}", reason.describe())?;
        }
        Ok(())
    }
}

impl Error for ValidationError {}
