//! What a cart line or order line refers to.
//!
//! The store keeps two nullable foreign keys per line. [`LineSource`] is the
//! only way service code reads or writes them, so a line always refers to
//! exactly one food item or one combo.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The catalog entry a line was created from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum LineSource {
    /// A single food item
    FoodItem(i64),
    /// A combo
    Combo(i64),
}

impl LineSource {
    /// Rebuilds the source from the stored column pair.
    ///
    /// Returns `None` when neither or both columns are set, which only happens
    /// for rows written outside this crate.
    #[must_use]
    pub const fn from_columns(food_item_id: Option<i64>, combo_id: Option<i64>) -> Option<Self> {
        match (food_item_id, combo_id) {
            (Some(id), None) => Some(Self::FoodItem(id)),
            (None, Some(id)) => Some(Self::Combo(id)),
            _ => None,
        }
    }

    /// Splits the source into `(food_item_id, combo_id)` column values.
    #[must_use]
    pub const fn to_columns(self) -> (Option<i64>, Option<i64>) {
        match self {
            Self::FoodItem(id) => (Some(id), None),
            Self::Combo(id) => (None, Some(id)),
        }
    }

    /// Builds a source from two optional ids where exactly one must be set.
    ///
    /// Used for form input where both fields are optional.
    pub fn from_exclusive(
        food_item_id: Option<i64>,
        combo_id: Option<i64>,
    ) -> crate::errors::Result<Self> {
        Self::from_columns(food_item_id, combo_id).ok_or_else(|| {
            crate::errors::Error::invalid("exactly one of food_item_id or combo_id must be set")
        })
    }
}

impl fmt::Display for LineSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FoodItem(id) => write!(f, "food item {id}"),
            Self::Combo(id) => write!(f, "combo {id}"),
        }
    }
}
