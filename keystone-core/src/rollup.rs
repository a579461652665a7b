//! Waste, markup and tax rollup over a template's line items.
//!
//! Totals are always derived from the current item list and percentages;
//! nothing here caches a total across edits.

use serde::{Deserialize, Serialize};

use crate::models::{ItemCategory, SiteCondition, TemplateItem};

/// Regional sales tax (13% HST) applied when no other rate is configured.
pub const DEFAULT_TAX_RATE: f64 = 0.13;

/// Demolition cost per square foot of GFA when no DEMOLITION_PRICE fact exists.
pub const DEFAULT_DEMOLITION_UNIT_PRICE: f64 = 2.50;

pub fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

/// `ceil(base * (1 + waste_percent / 100))`, ignoring float noise below
/// one millionth so that e.g. 100 at 10% is 110 rather than 111.
pub fn waste_quantity(base_quantity: f64, waste_percent: f64) -> f64 {
    let raw = base_quantity * (100.0 + waste_percent) / 100.0;
    ((raw * 1e6).round() / 1e6).ceil()
}

/// Recompute `quantity` and `total_price` for one item from its base quantity.
pub fn recompute_item(item: &mut TemplateItem, waste_percent: f64) {
    item.quantity = if item.apply_waste && item.category == ItemCategory::Material {
        waste_quantity(item.base_quantity, waste_percent)
    } else {
        item.base_quantity
    };
    item.total_price = round_cents(item.quantity * item.unit_price);
}

/// Re-apply the waste factor to every item. Quantities are derived from
/// `base_quantity`, so applying the same percentage twice is a no-op.
pub fn apply_waste(items: &mut [TemplateItem], waste_percent: f64) {
    for item in items.iter_mut() {
        recompute_item(item, waste_percent);
    }
}

/// Deployment-wide pricing parameters.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Pricing {
    pub tax_rate: f64,
    pub default_demolition_unit_price: f64,
}

impl Default for Pricing {
    fn default() -> Self {
        Self {
            tax_rate: DEFAULT_TAX_RATE,
            default_demolition_unit_price: DEFAULT_DEMOLITION_UNIT_PRICE,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct CostInputs {
    pub gfa_sqft: f64,
    pub site_condition: SiteCondition,
    pub demolition_unit_price: f64,
    pub markup_percent: f64,
    pub tax_rate: f64,
}

impl Default for CostInputs {
    fn default() -> Self {
        Self {
            gfa_sqft: 0.0,
            site_condition: SiteCondition::Clear,
            demolition_unit_price: DEFAULT_DEMOLITION_UNIT_PRICE,
            markup_percent: 0.0,
            tax_rate: DEFAULT_TAX_RATE,
        }
    }
}

/// Cost breakdown with the pre-tax and post-tax figures kept apart.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct CostSummary {
    pub material_total: f64,
    pub labor_total: f64,
    pub demolition_cost: f64,
    pub subtotal: f64,
    pub markup_percent: f64,
    pub markup_amount: f64,
    /// Subtotal plus markup, before tax.
    pub net_total: f64,
    pub tax_rate: f64,
    pub tax_amount: f64,
    /// Net total plus tax.
    pub grand_total: f64,
}

pub fn summarize(items: &[TemplateItem], inputs: &CostInputs) -> CostSummary {
    let line_total = |category: ItemCategory| -> f64 {
        items
            .iter()
            .filter(|i| i.category == category)
            .map(|i| i.quantity * i.unit_price)
            .sum()
    };

    let material_total = round_cents(line_total(ItemCategory::Material));
    let labor_total = round_cents(line_total(ItemCategory::Labor));
    let demolition_cost = match inputs.site_condition {
        SiteCondition::Demolition => round_cents(inputs.gfa_sqft * inputs.demolition_unit_price),
        SiteCondition::Clear => 0.0,
    };

    let subtotal = round_cents(material_total + labor_total + demolition_cost);
    let markup_amount = round_cents(subtotal * inputs.markup_percent / 100.0);
    let net_total = round_cents(subtotal + markup_amount);
    let tax_amount = round_cents(net_total * inputs.tax_rate);
    let grand_total = round_cents(net_total + tax_amount);

    CostSummary {
        material_total,
        labor_total,
        demolition_cost,
        subtotal,
        markup_percent: inputs.markup_percent,
        markup_amount,
        net_total,
        tax_rate: inputs.tax_rate,
        tax_amount,
        grand_total,
    }
}
