//! Typed Identifiers
//!
//! The commerce backend hands out opaque global ids (`gid://shopify/CartLine/...`).
//! Wrapping them in a marker-typed newtype keeps a line id from being passed
//! where a merchandise id is expected.

use std::{
    cmp::Ordering,
    fmt::{Debug, Display, Formatter, Result as FmtResult},
    hash::{Hash, Hasher},
    marker::PhantomData,
};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::cart::{CartLine, CartSnapshot, Merchandise};

/// Cart identifier.
pub type CartId = TypedGid<CartSnapshot>;

/// Cart line identifier, assigned by the backend.
pub type CartLineId = TypedGid<CartLine>;

/// Purchasable variant identifier.
pub type MerchandiseId = TypedGid<Merchandise>;

/// Opaque backend identifier tagged with the type it identifies.
pub struct TypedGid<T>(String, PhantomData<fn() -> T>);

impl<T> TypedGid<T> {
    /// Wrap a raw backend id.
    pub fn new(gid: impl Into<String>) -> Self {
        Self(gid.into(), PhantomData)
    }

    /// Borrow the raw backend id.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Unwrap into the raw backend id.
    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl<T> Clone for TypedGid<T> {
    fn clone(&self) -> Self {
        Self::new(self.0.clone())
    }
}

impl<T> Debug for TypedGid<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        Debug::fmt(&self.0, f)
    }
}

impl<T> Display for TypedGid<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        Display::fmt(&self.0, f)
    }
}

impl<T> PartialEq for TypedGid<T> {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl<T> Eq for TypedGid<T> {}

impl<T> Hash for TypedGid<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl<T> PartialOrd for TypedGid<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for TypedGid<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.cmp(&other.0)
    }
}

impl<T> From<String> for TypedGid<T> {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl<T> From<&str> for TypedGid<T> {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl<T> Serialize for TypedGid<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de, T> Deserialize<'de> for TypedGid<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Self::new)
    }
}
