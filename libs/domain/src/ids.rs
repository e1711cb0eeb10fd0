//! Entity identifiers.
//!
//! `WorkflowId` is generated locally and wraps a time-ordered UUID, the way
//! every internally-minted entity in this codebase is identified. `ServerId`
//! is different: it is the opaque string the fleet controller assigns when a
//! machine is first discovered, so it wraps a `String` rather than a `Uuid`
//! and is never generated locally.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{self, Display};
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// Errors that can occur when parsing entity IDs.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IdParseError {
    #[error("missing prefix separator '_'")]
    MissingPrefix,
    #[error("wrong prefix: expected '{expected}', got '{got}'")]
    WrongPrefix { expected: &'static str, got: String },
    #[error("invalid UUID: {0}")]
    InvalidUuid(String),
}

impl From<uuid::Error> for IdParseError {
    fn from(e: uuid::Error) -> Self {
        IdParseError::InvalidUuid(e.to_string())
    }
}

/// A locally-generated, time-ordered, prefixed UUID identifier.
macro_rules! define_prefixed_id {
    ($name:ident, $prefix:literal) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub struct $name(Uuid);

        impl $name {
            /// The string prefix for this ID type.
            pub const PREFIX: &'static str = $prefix;

            /// Create a new ID with UUID v7 (time-ordered).
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Create an ID from an existing UUID.
            #[must_use]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Get the underlying UUID.
            #[must_use]
            pub const fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}_{}", Self::PREFIX, self.0)
            }
        }

        impl FromStr for $name {
            type Err = IdParseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let (prefix, uuid_str) = s.split_once('_').ok_or(IdParseError::MissingPrefix)?;

                if prefix != Self::PREFIX {
                    return Err(IdParseError::WrongPrefix {
                        expected: Self::PREFIX,
                        got: prefix.to_string(),
                    });
                }

                let uuid = Uuid::parse_str(uuid_str)?;
                Ok(Self(uuid))
            }
        }

        impl Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: Serializer,
            {
                serializer.serialize_str(&self.to_string())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: Deserializer<'de>,
            {
                let s = String::deserialize(deserializer)?;
                s.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

define_prefixed_id!(WorkflowId, "wf");

/// Opaque machine identifier assigned by the fleet controller.
///
/// Never generated locally — always received from C5 responses and used
/// verbatim as the store's primary key for `servers`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServerId(String);

impl ServerId {
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ServerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for ServerId {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

impl From<&str> for ServerId {
    fn from(raw: &str) -> Self {
        Self(raw.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn workflow_id_roundtrip() {
        let id = WorkflowId::new();
        let s = id.to_string();
        assert!(s.starts_with("wf_"));
        let parsed: WorkflowId = s.parse().expect("should parse");
        assert_eq!(id, parsed);
    }

    #[test]
    fn workflow_id_wrong_prefix() {
        let result = "server_01961a8e-7d3a-7f1c-9b2e-4a5c6d7e8f90".parse::<WorkflowId>();
        assert!(matches!(result, Err(IdParseError::WrongPrefix { .. })));
    }

    #[test]
    fn server_id_is_opaque() {
        let id = ServerId::new("abc12");
        assert_eq!(id.as_str(), "abc12");
        assert_eq!(id.to_string(), "abc12");
    }

    #[test]
    fn server_id_serde_roundtrip() {
        let id = ServerId::new("abc12");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"abc12\"");
        let parsed: ServerId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, parsed);
    }
}
