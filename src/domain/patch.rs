//! Tri-state field for partial updates.
//!
//! A JSON patch body has three distinguishable states per field: the field
//! is missing, the field is `null`, or the field carries a value. `Option`
//! collapses the first two, so update requests use [`Patch`] instead.

use serde::{Deserialize, Deserializer};

/// A single field of a partial update.
///
/// Deserialize with `#[serde(default)]` on the containing struct field so a
/// missing key yields [`Patch::Absent`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Patch<T> {
    /// The field was not provided; keep the current value.
    #[default]
    Absent,
    /// The field was provided as an explicit `null`.
    Null,
    /// The field was provided with a value.
    Value(T),
}

impl<T> Patch<T> {
    /// Returns `true` unless the field is [`Patch::Absent`].
    #[must_use]
    pub const fn is_present(&self) -> bool {
        !matches!(self, Self::Absent)
    }

    /// Borrows the value, if any.
    #[must_use]
    pub const fn as_value(&self) -> Option<&T> {
        match self {
            Self::Value(v) => Some(v),
            Self::Absent | Self::Null => None,
        }
    }

    /// Resolves the patch against the current value of a nullable field.
    ///
    /// `Absent` keeps `current`, `Null` clears it, `Value` replaces it.
    #[must_use]
    pub fn apply_nullable(self, current: Option<T>) -> Option<T> {
        match self {
            Self::Absent => current,
            Self::Null => None,
            Self::Value(v) => Some(v),
        }
    }
}

impl<T> From<Option<T>> for Patch<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Self::Value)
    }
}

impl<'de, T> Deserialize<'de> for Patch<T>
where
    T: Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        // Only reached when the key is present; a missing key falls back to
        // `Default` through `#[serde(default)]`.
        Option::<T>::deserialize(deserializer).map(Self::from)
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct Body {
        #[serde(default)]
        description: Patch<String>,
    }

    fn parse(json: &str) -> Body {
        serde_json::from_str(json).unwrap_or_else(|e| panic!("invalid body {json}: {e}"))
    }

    #[test]
    fn missing_key_is_absent() {
        assert_eq!(parse("{}").description, Patch::Absent);
    }

    #[test]
    fn explicit_null_is_null() {
        assert_eq!(parse(r#"{"description": null}"#).description, Patch::Null);
    }

    #[test]
    fn value_is_value() {
        assert_eq!(
            parse(r#"{"description": "projector"}"#).description,
            Patch::Value("projector".to_string())
        );
    }

    #[test]
    fn apply_nullable_follows_tri_state() {
        let current = Some("old".to_string());
        assert_eq!(Patch::Absent.apply_nullable(current.clone()), current);
        assert_eq!(Patch::<String>::Null.apply_nullable(current.clone()), None);
        assert_eq!(
            Patch::Value("new".to_string()).apply_nullable(current),
            Some("new".to_string())
        );
    }
}
