//! Item resource guarded by the `items:*` permissions.

use serde::{Deserialize, Serialize};

/// A stored item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: u64,
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    pub tax: Option<f64>,
}

/// Create/replace payload. `name` and `price` are required; they are
/// optional here so missing fields can be reported instead of failing
/// deserialization.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ItemInput {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub tax: Option<f64>,
}
