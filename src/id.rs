use std::collections::HashMap;
use std::error::Error;
use std::fmt;

use serde::de::{self, Deserializer, Visitor};
use serde::ser::{self, Serializer};
use serde::{Deserialize, Serialize};

/// Reference to a remote entity that is either already committed
/// (server-assigned integer) or still pending in the command queue
/// (client-generated token).
///
/// Both wire shapes can appear side by side in one field, e.g. an item's
/// label list mixing `123` with `"0196…"`. A permanent id of `0` or an empty
/// temporary id is never valid and is rejected by the checked constructors,
/// by serialization and by deserialization.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Id {
    Permanent(i64),
    Temporary(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdError {
    ZeroIdentifier,
}

impl fmt::Display for IdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdError::ZeroIdentifier => write!(f, "both permanent and temporary id are zero"),
        }
    }
}

impl Error for IdError {}

impl Id {
    pub fn permanent(value: i64) -> Result<Self, IdError> {
        let id = Id::Permanent(value);
        id.validate()?;
        Ok(id)
    }

    pub fn temporary(value: impl Into<String>) -> Result<Self, IdError> {
        let id = Id::Temporary(value.into());
        id.validate()?;
        Ok(id)
    }

    pub fn validate(&self) -> Result<(), IdError> {
        match self {
            Id::Permanent(0) => Err(IdError::ZeroIdentifier),
            Id::Temporary(value) if value.is_empty() => Err(IdError::ZeroIdentifier),
            _ => Ok(()),
        }
    }

    pub fn as_permanent(&self) -> Option<i64> {
        match self {
            Id::Permanent(value) => Some(*value),
            Id::Temporary(_) => None,
        }
    }

    pub fn as_temporary(&self) -> Option<&str> {
        match self {
            Id::Permanent(_) => None,
            Id::Temporary(value) => Some(value),
        }
    }

    /// Permanent id for this reference, looking temporary ids up in a
    /// temp-to-permanent mapping accumulated from pushes.
    pub fn resolve(&self, mapping: &HashMap<String, i64>) -> Option<i64> {
        match self {
            Id::Permanent(value) => Some(*value),
            Id::Temporary(value) => mapping.get(value).copied(),
        }
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Id::Permanent(value) => write!(f, "{}", value),
            Id::Temporary(value) => write!(f, "{}", value),
        }
    }
}

impl Serialize for Id {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.validate().map_err(<S::Error as ser::Error>::custom)?;
        match self {
            Id::Permanent(value) => serializer.serialize_i64(*value),
            Id::Temporary(value) => serializer.serialize_str(value),
        }
    }
}

struct IdVisitor;

impl<'de> Visitor<'de> for IdVisitor {
    type Value = Id;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "a non-zero integer or a non-empty string")
    }

    fn visit_i64<E>(self, value: i64) -> Result<Id, E>
    where
        E: de::Error,
    {
        Id::permanent(value).map_err(E::custom)
    }

    fn visit_u64<E>(self, value: u64) -> Result<Id, E>
    where
        E: de::Error,
    {
        let value = i64::try_from(value)
            .map_err(|_| E::invalid_value(de::Unexpected::Unsigned(value), &self))?;
        self.visit_i64(value)
    }

    fn visit_str<E>(self, value: &str) -> Result<Id, E>
    where
        E: de::Error,
    {
        Id::temporary(value).map_err(E::custom)
    }

    fn visit_string<E>(self, value: String) -> Result<Id, E>
    where
        E: de::Error,
    {
        Id::temporary(value).map_err(E::custom)
    }
}

impl<'de> Deserialize<'de> for Id {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(IdVisitor)
    }
}
