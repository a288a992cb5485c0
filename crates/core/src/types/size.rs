//! Shoe genders, their size ranges, and per-size quantity breakdowns.

use std::collections::BTreeMap;
use std::ops::RangeInclusive;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::DomainError;

/// Shoe gender. Selects the active size range of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Gender {
    #[default]
    #[serde(rename = "Nữ")]
    Female,
    #[serde(rename = "Nam")]
    Male,
}

impl Gender {
    /// Sizes produced for this gender.
    #[must_use]
    pub const fn size_range(self) -> RangeInclusive<u8> {
        match self {
            Self::Female => 34..=40,
            Self::Male => 38..=45,
        }
    }

    /// Whether `size` belongs to this gender's range.
    #[must_use]
    pub const fn has_size(self, size: u8) -> bool {
        let range = self.size_range();
        size >= *range.start() && size <= *range.end()
    }
}

impl std::fmt::Display for Gender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Female => write!(f, "Nữ"),
            Self::Male => write!(f, "Nam"),
        }
    }
}

/// Quantity per shoe size.
///
/// Serialized as a flat object keyed `size<N>` (`{"size37": 50}`). Missing
/// and `null` entries read as zero.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SizeBreakdown(BTreeMap<u8, u32>);

impl SizeBreakdown {
    /// Every size of `gender` present with quantity zero.
    #[must_use]
    pub fn zeroed(gender: Gender) -> Self {
        Self(gender.size_range().map(|size| (size, 0)).collect())
    }

    /// Zeroed breakdown for `gender` with a single size filled in.
    #[must_use]
    pub fn only(gender: Gender, size: u8, quantity: u32) -> Self {
        let mut sizes = Self::zeroed(gender);
        sizes.set(size, quantity);
        sizes
    }

    /// Quantity for `size`, zero when absent.
    #[must_use]
    pub fn get(&self, size: u8) -> u32 {
        self.0.get(&size).copied().unwrap_or(0)
    }

    pub fn set(&mut self, size: u8, quantity: u32) {
        self.0.insert(size, quantity);
    }

    /// Sum of all size quantities.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::InvalidQuantity`] when the sum overflows.
    pub fn total(&self) -> Result<u32, DomainError> {
        self.0
            .values()
            .try_fold(0_u32, |sum, qty| sum.checked_add(*qty))
            .ok_or(DomainError::InvalidQuantity)
    }

    /// Whether every size quantity is zero.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.values().all(|qty| *qty == 0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (u8, u32)> + '_ {
        self.0.iter().map(|(size, qty)| (*size, *qty))
    }
}

impl FromIterator<(u8, u32)> for SizeBreakdown {
    fn from_iter<T: IntoIterator<Item = (u8, u32)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Serialize for SizeBreakdown {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (size, qty) in &self.0 {
            map.serialize_entry(&format!("size{size}"), qty)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for SizeBreakdown {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct SizesVisitor;

        impl<'de> Visitor<'de> for SizesVisitor {
            type Value = SizeBreakdown;

            fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str("a map of size<N> keys to quantities")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut sizes = BTreeMap::new();
                while let Some(key) = access.next_key::<String>()? {
                    let size = key
                        .strip_prefix("size")
                        .and_then(|n| n.parse::<u8>().ok())
                        .ok_or_else(|| {
                            serde::de::Error::custom(format!("invalid size key: {key}"))
                        })?;
                    let qty: Option<u32> = access.next_value()?;
                    sizes.insert(size, qty.unwrap_or(0));
                }
                Ok(SizeBreakdown(sizes))
            }
        }

        deserializer.deserialize_map(SizesVisitor)
    }
}
