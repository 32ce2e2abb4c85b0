// ── Tri-state attribute values ──
//
// A planned attribute is either a concrete value, explicitly absent, or
// not resolvable until some other resource has been applied.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// An attribute value as seen at plan time.
///
/// `Unknown` means "no constraint yet": comparisons against it never
/// report a mismatch. `Null` is a real value distinct from any concrete
/// default; whether a null falls back to a default is decided by the
/// attribute's mutability class, not by this type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttrValue<T> {
    Known(T),
    Null,
    Unknown,
}

impl<T> Default for AttrValue<T> {
    fn default() -> Self {
        Self::Null
    }
}

impl<T> AttrValue<T> {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown)
    }

    pub fn as_known(&self) -> Option<&T> {
        match self {
            Self::Known(v) => Some(v),
            Self::Null | Self::Unknown => None,
        }
    }

    pub fn as_ref(&self) -> AttrValue<&T> {
        match self {
            Self::Known(v) => AttrValue::Known(v),
            Self::Null => AttrValue::Null,
            Self::Unknown => AttrValue::Unknown,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> AttrValue<U> {
        match self {
            Self::Known(v) => AttrValue::Known(f(v)),
            Self::Null => AttrValue::Null,
            Self::Unknown => AttrValue::Unknown,
        }
    }

    /// Resolve `Null` to `default`, leaving `Known` and `Unknown` alone.
    pub fn or_default_with(self, default: impl FnOnce() -> T) -> Self {
        match self {
            Self::Null => Self::Known(default()),
            other => other,
        }
    }

    /// Whether `observed` satisfies this planned value.
    ///
    /// `Unknown` accepts anything. `Null` stands for the attribute's
    /// `default`, so it matches only an observed default.
    pub fn accepts(&self, observed: &T, default: impl FnOnce() -> T) -> bool
    where
        T: PartialEq,
    {
        match self {
            Self::Unknown => true,
            Self::Known(v) => v == observed,
            Self::Null => default() == *observed,
        }
    }
}

impl<T> From<Option<T>> for AttrValue<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Self::Known)
    }
}

// Configuration documents cannot spell "unknown": they deserialize to
// `Known` or `Null`. `Unknown` is produced only by orchestrators building
// plans in code, and serializes as null.

impl<T: Serialize> Serialize for AttrValue<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Known(v) => v.serialize(serializer),
            Self::Null | Self::Unknown => serializer.serialize_none(),
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for AttrValue<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Option::<T>::deserialize(deserializer).map(Self::from)
    }
}
