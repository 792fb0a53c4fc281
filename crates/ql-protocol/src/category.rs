use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Scenario a rule answers questions about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Inventory,
    Testing,
    ProductionTracking,
    Comparison,
    Statistics,
    Other,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Inventory,
        Category::Testing,
        Category::ProductionTracking,
        Category::Comparison,
        Category::Statistics,
        Category::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Inventory => "inventory",
            Category::Testing => "testing",
            Category::ProductionTracking => "production-tracking",
            Category::Comparison => "comparison",
            Category::Statistics => "statistics",
            Category::Other => "other",
        }
    }

    /// Fixed output schema a consuming page expects for this category.
    ///
    /// Comparison, statistics and other results have no fixed page shape;
    /// their rows follow the rule's own display field list.
    pub fn canonical_fields(&self) -> Option<&'static [CanonicalField]> {
        match self {
            Category::Inventory => Some(INVENTORY_FIELDS),
            Category::Testing => Some(TESTING_FIELDS),
            Category::ProductionTracking => Some(PRODUCTION_TRACKING_FIELDS),
            Category::Comparison | Category::Statistics | Category::Other => None,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown category: {0}")]
pub struct ParseCategoryError(pub String);

impl FromStr for Category {
    type Err = ParseCategoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| ParseCategoryError(s.to_string()))
    }
}

/// Value substituted when a row has no usable value for a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldDefault {
    /// `""`
    Empty,
    /// `0`
    Zero,
    /// `"未知"`
    Unknown,
    /// `"N/A"`
    NotApplicable,
}

impl FieldDefault {
    pub fn to_value(self) -> Value {
        match self {
            FieldDefault::Empty => Value::String(String::new()),
            FieldDefault::Zero => Value::from(0),
            FieldDefault::Unknown => Value::String("未知".into()),
            FieldDefault::NotApplicable => Value::String("N/A".into()),
        }
    }
}

/// One field of a category's canonical output schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanonicalField {
    pub name: &'static str,
    pub default: FieldDefault,
}

const fn field(name: &'static str, default: FieldDefault) -> CanonicalField {
    CanonicalField { name, default }
}

use FieldDefault::{Empty, NotApplicable, Unknown, Zero};

pub const INVENTORY_FIELDS: &[CanonicalField] = &[
    field("factory", Unknown),
    field("warehouse", Unknown),
    field("materialCode", Empty),
    field("materialName", Empty),
    field("supplier", Unknown),
    field("quantity", Zero),
    field("status", Unknown),
    field("inboundTime", Empty),
    field("expiryTime", Empty),
    field("notes", Empty),
];

pub const TESTING_FIELDS: &[CanonicalField] = &[
    field("testId", Empty),
    field("date", Empty),
    field("project", Unknown),
    field("baseline", Unknown),
    field("materialCode", Empty),
    field("materialName", Empty),
    field("supplier", Unknown),
    field("testResult", Unknown),
    field("defectDescription", Empty),
    field("notes", Empty),
];

pub const PRODUCTION_TRACKING_FIELDS: &[CanonicalField] = &[
    field("factory", Unknown),
    field("baseline", Unknown),
    field("project", Unknown),
    field("materialCode", Empty),
    field("materialName", Empty),
    field("supplier", Unknown),
    field("batchCode", Empty),
    field("defectRate", Zero),
    field("weeklyAnomaly", NotApplicable),
    field("inspectionDate", Empty),
    field("notes", Empty),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_serde_uses_kebab_case() {
        let json = serde_json::to_string(&Category::ProductionTracking).unwrap();
        assert_eq!(json, r#""production-tracking""#);
        let back: Category = serde_json::from_str(r#""testing""#).unwrap();
        assert_eq!(back, Category::Testing);
    }

    #[test]
    fn category_from_str_matches_as_str() {
        for c in Category::ALL {
            assert_eq!(c.as_str().parse::<Category>().unwrap(), c);
        }
        assert!("warehouse".parse::<Category>().is_err());
    }

    #[test]
    fn canonical_field_sets() {
        let inv = Category::Inventory.canonical_fields().unwrap();
        assert_eq!(inv.len(), 10);
        assert_eq!(inv[0].name, "factory");
        assert_eq!(inv[9].name, "notes");

        let prod = Category::ProductionTracking.canonical_fields().unwrap();
        assert_eq!(prod.len(), 11);
        assert!(prod.iter().any(|f| f.name == "defectRate"));

        assert!(Category::Statistics.canonical_fields().is_none());
    }

    #[test]
    fn field_defaults_are_never_null() {
        for d in [
            FieldDefault::Empty,
            FieldDefault::Zero,
            FieldDefault::Unknown,
            FieldDefault::NotApplicable,
        ] {
            assert!(!d.to_value().is_null());
        }
        assert_eq!(FieldDefault::Unknown.to_value(), "未知");
        assert_eq!(FieldDefault::Zero.to_value(), 0);
    }
}
