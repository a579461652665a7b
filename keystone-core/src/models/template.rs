use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TemplateItem {
    pub id: Uuid,
    pub project_id: Uuid,
    pub name: String,
    pub category: ItemCategory,
    /// Quantity before any waste factor.
    pub base_quantity: f64,
    /// Quantity after the waste factor, if one applies.
    pub quantity: f64,
    pub unit: String,
    pub unit_price: f64,
    pub total_price: f64,
    pub apply_waste: bool,
    pub position: i64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ItemCategory {
    Material,
    Labor,
}

impl ItemCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Material => "material",
            Self::Labor => "labor",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "material" => Some(Self::Material),
            "labor" => Some(Self::Labor),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewTemplateItem {
    pub name: String,
    pub category: ItemCategory,
    pub base_quantity: f64,
    pub unit: String,
    pub unit_price: f64,
    #[serde(default)]
    pub apply_waste: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateTemplateItemInput {
    pub name: Option<String>,
    pub category: Option<ItemCategory>,
    pub base_quantity: Option<f64>,
    pub unit: Option<String>,
    pub unit_price: Option<f64>,
    pub apply_waste: Option<bool>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Trade {
    Flooring,
    Painting,
    Drywall,
    Tiling,
    Insulation,
}

impl Trade {
    pub const ALL: [Trade; 5] = [
        Self::Flooring,
        Self::Painting,
        Self::Drywall,
        Self::Tiling,
        Self::Insulation,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Flooring => "flooring",
            Self::Painting => "painting",
            Self::Drywall => "drywall",
            Self::Tiling => "tiling",
            Self::Insulation => "insulation",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "flooring" => Some(Self::Flooring),
            "painting" => Some(Self::Painting),
            "drywall" => Some(Self::Drywall),
            "tiling" | "tile" => Some(Self::Tiling),
            "insulation" => Some(Self::Insulation),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Flooring => "Flooring",
            Self::Painting => "Painting",
            Self::Drywall => "Drywall",
            Self::Tiling => "Tiling",
            Self::Insulation => "Insulation",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SiteCondition {
    #[default]
    Clear,
    Demolition,
}

impl SiteCondition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Clear => "clear",
            Self::Demolition => "demolition",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "clear" => Some(Self::Clear),
            "demolition" => Some(Self::Demolition),
            _ => None,
        }
    }
}

/// Percentages that feed the cost rollup for a project.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct TemplateSettings {
    pub waste_percent: f64,
    pub markup_percent: f64,
}

impl Default for TemplateSettings {
    fn default() -> Self {
        Self {
            waste_percent: 10.0,
            markup_percent: 0.0,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateSettingsInput {
    pub waste_percent: Option<f64>,
    pub markup_percent: Option<f64>,
}
