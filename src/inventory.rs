use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::detect::Symbology;

/// A scanned item together with the product attributes captured alongside
/// the barcode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryRecord {
    pub id: Uuid,
    pub barcode: String,
    pub format: Symbology,
    #[serde(default)]
    pub design: String,
    #[serde(default)]
    pub sizes: Vec<String>,
    #[serde(default)]
    pub colors: Vec<String>,
    #[serde(default)]
    pub price: Option<f64>,
    pub created_at: DateTime<Utc>,
}

impl InventoryRecord {
    /// A bare record from a scan match, attributes left empty.
    pub fn from_scan<S: Into<String>>(barcode: S, format: Symbology) -> Self {
        Self {
            id: Uuid::new_v4(),
            barcode: barcode.into(),
            format,
            design: String::new(),
            sizes: Vec::new(),
            colors: Vec::new(),
            price: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_design<S: Into<String>>(mut self, design: S) -> Self {
        self.design = design.into();
        self
    }

    pub fn with_sizes(mut self, sizes: Vec<String>) -> Self {
        self.sizes = sizes;
        self
    }

    pub fn with_colors(mut self, colors: Vec<String>) -> Self {
        self.colors = colors;
        self
    }

    pub fn with_price(mut self, price: f64) -> Self {
        self.price = Some(price);
        self
    }
}
