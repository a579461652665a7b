//! Built-in material and labor templates per trade.
//!
//! Each row scales with GFA: `base_quantity = ceil(gfa_sqft * per_sqft)`,
//! never less than one unit.

use crate::models::{ItemCategory, NewTemplateItem, Trade};

struct Row {
    name: &'static str,
    category: ItemCategory,
    per_sqft: f64,
    unit: &'static str,
    unit_price: f64,
    apply_waste: bool,
}

const fn material(name: &'static str, per_sqft: f64, unit: &'static str, unit_price: f64) -> Row {
    Row {
        name,
        category: ItemCategory::Material,
        per_sqft,
        unit,
        unit_price,
        apply_waste: true,
    }
}

const fn fixed(name: &'static str, per_sqft: f64, unit: &'static str, unit_price: f64) -> Row {
    Row {
        name,
        category: ItemCategory::Material,
        per_sqft,
        unit,
        unit_price,
        apply_waste: false,
    }
}

const fn labor(name: &'static str, per_sqft: f64, unit: &'static str, unit_price: f64) -> Row {
    Row {
        name,
        category: ItemCategory::Labor,
        per_sqft,
        unit,
        unit_price,
        apply_waste: false,
    }
}

const FLOORING: &[Row] = &[
    material("Hardwood Flooring", 1.0, "sq ft", 8.50),
    material("Foam Underlayment", 1.0, "sq ft", 0.65),
    material("Baseboard Trim", 0.4, "lin ft", 2.25),
    fixed("Transition Strips", 0.004, "ea", 25.00),
    labor("Flooring Installation", 1.0, "sq ft", 4.50),
    labor("Baseboard Installation", 0.4, "lin ft", 1.75),
];

const PAINTING: &[Row] = &[
    material("Interior Paint", 0.0075, "gal", 48.00),
    material("Primer", 0.004, "gal", 32.00),
    fixed("Painter's Tape & Drop Cloths", 0.002, "kit", 18.00),
    labor("Surface Prep & Patching", 1.0, "sq ft", 0.60),
    labor("Painting Labor", 1.0, "sq ft", 1.90),
];

const DRYWALL: &[Row] = &[
    material("Drywall Sheets 4x8", 0.034, "sheet", 16.50),
    material("Joint Compound", 0.0015, "bucket", 22.00),
    material("Drywall Screws", 0.001, "box", 12.00),
    material("Joint Tape", 0.0025, "roll", 6.00),
    labor("Drywall Hanging", 1.0, "sq ft", 1.40),
    labor("Taping & Mudding", 1.0, "sq ft", 1.10),
];

const TILING: &[Row] = &[
    material("Porcelain Tile", 1.0, "sq ft", 6.75),
    material("Thinset Mortar", 0.02, "bag", 28.00),
    material("Cement Backer Board", 0.0313, "sheet", 14.00),
    material("Grout", 0.01, "bag", 24.00),
    labor("Tile Installation", 1.0, "sq ft", 9.00),
    labor("Grouting & Sealing", 1.0, "sq ft", 1.50),
];

const INSULATION: &[Row] = &[
    material("Batt Insulation R-20", 1.0, "sq ft", 1.10),
    material("Vapor Barrier", 1.0, "sq ft", 0.25),
    fixed("Acoustic Sealant", 0.005, "tube", 9.00),
    labor("Insulation Installation", 1.0, "sq ft", 0.85),
];

fn rows(trade: Trade) -> &'static [Row] {
    match trade {
        Trade::Flooring => FLOORING,
        Trade::Painting => PAINTING,
        Trade::Drywall => DRYWALL,
        Trade::Tiling => TILING,
        Trade::Insulation => INSULATION,
    }
}

pub fn catalog_template(trade: Trade, gfa_sqft: f64) -> Vec<NewTemplateItem> {
    rows(trade)
        .iter()
        .map(|row| NewTemplateItem {
            name: row.name.to_string(),
            category: row.category,
            base_quantity: (gfa_sqft * row.per_sqft).ceil().max(1.0),
            unit: row.unit.to_string(),
            unit_price: row.unit_price,
            apply_waste: row.apply_waste,
        })
        .collect()
}
