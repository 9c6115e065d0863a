//! Catalog entity types and pass results.

use crate::core::error::CuratorError;
use crate::core::store::{Fields, Record, Table};
use serde::de::DeserializeOwned;
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value as JsonValue;

/// A record type the reconciler can converge.
///
/// `differing_fields` is implemented per type with an exhaustive destructure,
/// so a field added to the struct must also be added to the comparison.
pub trait CatalogEntity: Serialize + DeserializeOwned {
    const TABLE: Table;
    /// Singular noun used in error messages ("category", "achievement").
    const KIND: &'static str;

    fn key(&self) -> &str;

    /// Names of mutable fields whose value differs from `stored`.
    fn differing_fields(&self, stored: &Self) -> Vec<&'static str>;

    /// Full row including the key column, as inserted.
    fn to_row(&self) -> Result<Fields, CuratorError> {
        match serde_json::to_value(self)? {
            JsonValue::Object(map) => Ok(map),
            other => Err(CuratorError::StoreError(format!(
                "{} serialized to non-object {}",
                Self::KIND,
                other
            ))),
        }
    }

    /// Every column except the immutable key, as sent on update.
    fn mutable_fields(&self) -> Result<Fields, CuratorError> {
        let mut row = self.to_row()?;
        row.remove(Self::TABLE.key_column());
        Ok(row)
    }

    fn from_record(record: &Record) -> Result<Self, CuratorError> {
        Ok(serde_json::from_value(JsonValue::Object(record.fields.clone()))?)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    #[serde(rename = "category_key")]
    pub key: String,
    pub name: String,
    pub description: String,
    pub icon: String,
    pub gradient: String,
    pub order_index: i64,
    pub is_active: bool,
}

impl CatalogEntity for Category {
    const TABLE: Table = Table::Categories;
    const KIND: &'static str = "category";

    fn key(&self) -> &str {
        &self.key
    }

    fn differing_fields(&self, stored: &Self) -> Vec<&'static str> {
        let Category {
            key: _,
            name,
            description,
            icon,
            gradient,
            order_index,
            is_active,
        } = self;

        let mut diff = Vec::new();
        if *name != stored.name {
            diff.push("name");
        }
        if *description != stored.description {
            diff.push("description");
        }
        if *icon != stored.icon {
            diff.push("icon");
        }
        if *gradient != stored.gradient {
            diff.push("gradient");
        }
        if *order_index != stored.order_index {
            diff.push("order_index");
        }
        if *is_active != stored.is_active {
            diff.push("is_active");
        }
        diff
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CriteriaType {
    UnlockCount,
    CategoryCount,
    DownloadCount,
    RatingCount,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Bronze,
    Silver,
    Gold,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Achievement {
    #[serde(rename = "achievement_key")]
    pub key: String,
    pub name: String,
    pub description: String,
    pub icon: String,
    pub color: String,
    pub criteria_type: CriteriaType,
    pub criteria_value: i64,
    pub order_index: i64,
    pub tier: Tier,
}

impl CatalogEntity for Achievement {
    const TABLE: Table = Table::Achievements;
    const KIND: &'static str = "achievement";

    fn key(&self) -> &str {
        &self.key
    }

    fn differing_fields(&self, stored: &Self) -> Vec<&'static str> {
        let Achievement {
            key: _,
            name,
            description,
            icon,
            color,
            criteria_type,
            criteria_value,
            order_index,
            tier,
        } = self;

        let mut diff = Vec::new();
        if *name != stored.name {
            diff.push("name");
        }
        if *description != stored.description {
            diff.push("description");
        }
        if *icon != stored.icon {
            diff.push("icon");
        }
        if *color != stored.color {
            diff.push("color");
        }
        if *criteria_type != stored.criteria_type {
            diff.push("criteria_type");
        }
        if *criteria_value != stored.criteria_value {
            diff.push("criteria_value");
        }
        if *order_index != stored.order_index {
            diff.push("order_index");
        }
        if *tier != stored.tier {
            diff.push("tier");
        }
        diff
    }
}

/// Content row belonging to a category. Only ever created as a seed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub category_id: String,
    pub name: String,
    pub description: Option<String>,
    pub file_type: Option<String>,
    pub is_active: bool,
}

impl Item {
    pub const PLACEHOLDER_FILE_TYPE: &'static str = "placeholder";

    /// The single starter item seeded into an empty category.
    pub fn placeholder(category: &Category, category_id: &str) -> Self {
        Self {
            category_id: category_id.to_string(),
            name: format!("{} Starter", category.name),
            description: Some(format!(
                "Starter resource for {}. Replace it with real content.",
                category.name
            )),
            file_type: Some(Self::PLACEHOLDER_FILE_TYPE.to_string()),
            is_active: true,
        }
    }

    pub fn to_row(&self) -> Result<Fields, CuratorError> {
        match serde_json::to_value(self)? {
            JsonValue::Object(map) => Ok(map),
            other => Err(CuratorError::StoreError(format!(
                "item serialized to non-object {}",
                other
            ))),
        }
    }
}

/// One per-entity failure recorded during a pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityError {
    pub entity_key: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconciliationResult {
    pub created_count: usize,
    pub updated_count: usize,
    /// Placeholder items inserted. Informational; never affects `success`.
    pub seeded_count: usize,
    pub errors: Vec<EntityError>,
}

impl ReconciliationResult {
    pub fn success(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn is_noop(&self) -> bool {
        self.created_count == 0 && self.updated_count == 0
    }

    pub fn error_messages(&self) -> Vec<&str> {
        self.errors.iter().map(|e| e.message.as_str()).collect()
    }
}

impl Serialize for ReconciliationResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("ReconciliationResult", 5)?;
        s.serialize_field("success", &self.success())?;
        s.serialize_field("created_count", &self.created_count)?;
        s.serialize_field("updated_count", &self.updated_count)?;
        s.serialize_field("seeded_count", &self.seeded_count)?;
        s.serialize_field("errors", &self.errors)?;
        s.end()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VerificationResult {
    pub missing_category_keys: Vec<String>,
    pub missing_achievement_keys: Vec<String>,
}

impl VerificationResult {
    pub fn is_valid(&self) -> bool {
        self.missing_category_keys.is_empty() && self.missing_achievement_keys.is_empty()
    }
}

impl Serialize for VerificationResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("VerificationResult", 3)?;
        s.serialize_field("is_valid", &self.is_valid())?;
        s.serialize_field("missing_category_keys", &self.missing_category_keys)?;
        s.serialize_field("missing_achievement_keys", &self.missing_achievement_keys)?;
        s.end()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryStats {
    pub key: String,
    pub name: String,
    pub item_count: u64,
}
