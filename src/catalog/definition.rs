//! The canonical catalog: every category and achievement the store must hold.
//!
//! The definition is compiled in. Changing it and redeploying is the only way
//! to change desired state; the next reconciliation pass converges the store.
//! Bump [`DEFINITION_VERSION`] whenever an entry changes.

use crate::catalog::model::{Achievement, Category, CriteriaType, Tier};
use crate::core::error::CuratorError;
use regex::Regex;
use rustc_hash::FxHashSet;
use sha2::{Digest, Sha256};
use std::sync::OnceLock;

pub const DEFINITION_VERSION: &str = "2025.06.1";

fn key_pattern() -> &'static Regex {
    static KEY_RE: OnceLock<Regex> = OnceLock::new();
    KEY_RE.get_or_init(|| Regex::new(r"^[a-z][a-z0-9_]*$").expect("static regex"))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogDefinition {
    pub version: String,
    pub categories: Vec<Category>,
    pub achievements: Vec<Achievement>,
}

impl CatalogDefinition {
    pub fn new(version: &str, categories: Vec<Category>, achievements: Vec<Achievement>) -> Self {
        Self {
            version: version.to_string(),
            categories,
            achievements,
        }
    }

    /// The built-in toolkit catalog.
    pub fn builtin() -> Self {
        Self::new(DEFINITION_VERSION, builtin_categories(), builtin_achievements())
    }

    pub fn category_keys(&self) -> impl Iterator<Item = &str> {
        self.categories.iter().map(|c| c.key.as_str())
    }

    pub fn achievement_keys(&self) -> impl Iterator<Item = &str> {
        self.achievements.iter().map(|a| a.key.as_str())
    }

    pub fn category(&self, key: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.key == key)
    }

    /// Reject definitions the engine cannot reconcile safely: empty or
    /// malformed keys, duplicate keys, blank names, non-positive thresholds.
    pub fn validate(&self) -> Result<(), CuratorError> {
        let re = key_pattern();

        let mut seen = FxHashSet::default();
        for c in &self.categories {
            check_key("category", &c.key, re, &mut seen)?;
            check_name("category", &c.key, &c.name)?;
        }

        let mut seen = FxHashSet::default();
        for a in &self.achievements {
            check_key("achievement", &a.key, re, &mut seen)?;
            check_name("achievement", &a.key, &a.name)?;
            if a.criteria_value <= 0 {
                return Err(CuratorError::InvalidDefinition(format!(
                    "achievement '{}' has non-positive criteria_value {}",
                    a.key, a.criteria_value
                )));
            }
        }
        Ok(())
    }

    /// SHA-256 over the version and every entry's serialized form, hex encoded.
    pub fn fingerprint(&self) -> Result<String, CuratorError> {
        let mut hasher = Sha256::new();
        hasher.update(self.version.as_bytes());
        for c in &self.categories {
            hasher.update([0u8]);
            hasher.update(serde_json::to_vec(c)?);
        }
        for a in &self.achievements {
            hasher.update([1u8]);
            hasher.update(serde_json::to_vec(a)?);
        }
        Ok(format!("{:x}", hasher.finalize()))
    }
}

fn check_key<'a>(
    kind: &str,
    key: &'a str,
    re: &Regex,
    seen: &mut FxHashSet<&'a str>,
) -> Result<(), CuratorError> {
    if !re.is_match(key) {
        return Err(CuratorError::InvalidDefinition(format!(
            "{} key '{}' must be lowercase snake_case",
            kind, key
        )));
    }
    if !seen.insert(key) {
        return Err(CuratorError::InvalidDefinition(format!(
            "duplicate {} key '{}'",
            kind, key
        )));
    }
    Ok(())
}

fn check_name(kind: &str, key: &str, name: &str) -> Result<(), CuratorError> {
    if name.trim().is_empty() {
        return Err(CuratorError::InvalidDefinition(format!(
            "{} '{}' has an empty name",
            kind, key
        )));
    }
    Ok(())
}

fn category(
    key: &str,
    name: &str,
    description: &str,
    icon: &str,
    gradient: &str,
    order_index: i64,
) -> Category {
    Category {
        key: key.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        icon: icon.to_string(),
        gradient: gradient.to_string(),
        order_index,
        is_active: true,
    }
}

fn builtin_categories() -> Vec<Category> {
    vec![
        category(
            "email",
            "Email Templates",
            "Professional email templates for donors, volunteers and partners",
            "Mail",
            "from-blue-500 to-purple-600",
            1,
        ),
        category(
            "grants",
            "Grant Writing",
            "Proposal outlines, budgets and narrative templates for funding applications",
            "FileText",
            "from-green-500 to-teal-600",
            2,
        ),
        category(
            "data",
            "Data & Reporting",
            "Dashboards, impact reports and data analysis worksheets",
            "BarChart3",
            "from-orange-500 to-red-600",
            3,
        ),
        category(
            "automation",
            "Workflow Automation",
            "Checklists and playbooks for automating repetitive operations",
            "Workflow",
            "from-purple-500 to-pink-600",
            4,
        ),
        category(
            "volunteers",
            "Volunteer Management",
            "Recruitment, onboarding and recognition resources for volunteer teams",
            "Users",
            "from-cyan-500 to-blue-600",
            5,
        ),
        category(
            "social",
            "Social Media",
            "Post calendars, caption formulas and campaign planners",
            "Share2",
            "from-pink-500 to-rose-600",
            6,
        ),
        category(
            "training",
            "Training Guides",
            "Step-by-step learning guides and prompt libraries for staff",
            "BookOpen",
            "from-amber-500 to-yellow-600",
            7,
        ),
        category(
            "presentations",
            "Presentations",
            "Board decks, pitch slides and storytelling frameworks",
            "Presentation",
            "from-indigo-500 to-violet-600",
            8,
        ),
    ]
}

fn builtin_achievements() -> Vec<Achievement> {
    vec![
        Achievement {
            key: "first_unlock".to_string(),
            name: "First Steps".to_string(),
            description: "Unlock your first toolkit item".to_string(),
            icon: "Star".to_string(),
            color: "text-yellow-500".to_string(),
            criteria_type: CriteriaType::UnlockCount,
            criteria_value: 1,
            order_index: 1,
            tier: Tier::Bronze,
        },
        Achievement {
            key: "category_explorer".to_string(),
            name: "Explorer".to_string(),
            description: "Unlock items from three different categories".to_string(),
            icon: "Grid3X3".to_string(),
            color: "text-blue-500".to_string(),
            criteria_type: CriteriaType::CategoryCount,
            criteria_value: 3,
            order_index: 2,
            tier: Tier::Silver,
        },
        Achievement {
            key: "toolkit_master".to_string(),
            name: "Toolkit Master".to_string(),
            description: "Unlock ten toolkit items".to_string(),
            icon: "Zap".to_string(),
            color: "text-purple-500".to_string(),
            criteria_type: CriteriaType::UnlockCount,
            criteria_value: 10,
            order_index: 3,
            tier: Tier::Gold,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_shape() {
        let def = CatalogDefinition::builtin();
        assert_eq!(def.categories.len(), 8);
        assert_eq!(def.achievements.len(), 3);
        def.validate().unwrap();
        assert!(def.categories.iter().all(|c| c.is_active));
    }

    #[test]
    fn test_builtin_order_indexes_are_distinct() {
        let def = CatalogDefinition::builtin();
        let orders: FxHashSet<i64> = def.categories.iter().map(|c| c.order_index).collect();
        assert_eq!(orders.len(), def.categories.len());
    }

    #[test]
    fn test_duplicate_key_is_invalid() {
        let mut def = CatalogDefinition::builtin();
        let dup = def.categories[0].clone();
        def.categories.push(dup);
        let err = def.validate().unwrap_err();
        assert!(err.to_string().contains("duplicate category key 'email'"));
    }

    #[test]
    fn test_malformed_key_is_invalid() {
        let mut def = CatalogDefinition::builtin();
        def.achievements[0].key = "First Unlock".to_string();
        assert!(matches!(
            def.validate(),
            Err(CuratorError::InvalidDefinition(_))
        ));
    }

    #[test]
    fn test_non_positive_threshold_is_invalid() {
        let mut def = CatalogDefinition::builtin();
        def.achievements[1].criteria_value = 0;
        assert!(def.validate().is_err());
    }

    #[test]
    fn test_fingerprint_tracks_content() {
        let def = CatalogDefinition::builtin();
        let a = def.fingerprint().unwrap();
        assert_eq!(a, CatalogDefinition::builtin().fingerprint().unwrap());
        assert_eq!(a.len(), 64);

        let mut changed = CatalogDefinition::builtin();
        changed.categories[2].gradient = "from-gray-500 to-gray-600".to_string();
        assert_ne!(a, changed.fingerprint().unwrap());
    }
}
