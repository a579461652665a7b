use std::path::PathBuf;

use clap::Args;
use keystone_core::rollup::{DEFAULT_DEMOLITION_UNIT_PRICE, DEFAULT_TAX_RATE};
use keystone_core::{Database, Pricing};

use crate::generator::TemplateGenerator;
use crate::storage::BlobStore;

/// Settings shared by the HTTP and MCP servers.
#[derive(Debug, Clone, Args)]
pub struct Config {
    /// SQLite database file (defaults to the platform data directory)
    #[arg(long, env = "KEYSTONE_DB")]
    pub database: Option<PathBuf>,

    /// Directory for uploaded files and template snapshots
    #[arg(long, env = "KEYSTONE_BLOB_DIR")]
    pub blob_dir: Option<PathBuf>,

    /// Remote template generator endpoint; the built-in catalog is used when unset
    #[arg(long, env = "KEYSTONE_GENERATOR_URL")]
    pub generator_url: Option<String>,

    /// Sales tax rate applied on top of the pre-tax net total
    #[arg(long, env = "KEYSTONE_TAX_RATE", default_value_t = DEFAULT_TAX_RATE)]
    pub tax_rate: f64,

    /// Demolition price per square foot when no DEMOLITION_PRICE fact exists
    #[arg(long, env = "KEYSTONE_DEMOLITION_PRICE", default_value_t = DEFAULT_DEMOLITION_UNIT_PRICE)]
    pub demolition_price: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: None,
            blob_dir: None,
            generator_url: None,
            tax_rate: DEFAULT_TAX_RATE,
            demolition_price: DEFAULT_DEMOLITION_UNIT_PRICE,
        }
    }
}

impl Config {
    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.tax_rate.is_finite() && (0.0..1.0).contains(&self.tax_rate),
            "tax rate must be a fraction in [0, 1), got {}",
            self.tax_rate
        );
        anyhow::ensure!(
            self.demolition_price.is_finite() && self.demolition_price >= 0.0,
            "demolition price must be non-negative, got {}",
            self.demolition_price
        );
        Ok(())
    }

    pub fn pricing(&self) -> Pricing {
        Pricing {
            tax_rate: self.tax_rate,
            default_demolition_unit_price: self.demolition_price,
        }
    }

    pub fn open_database(&self) -> anyhow::Result<Database> {
        let db = match &self.database {
            Some(path) => Database::open(path)?,
            None => Database::open_default()?,
        };
        db.migrate()?;
        Ok(db)
    }

    pub fn blob_store(&self) -> anyhow::Result<BlobStore> {
        let root = match &self.blob_dir {
            Some(dir) => dir.clone(),
            None => BlobStore::default_root()?,
        };
        Ok(BlobStore::new(root))
    }

    pub fn generator(&self) -> anyhow::Result<TemplateGenerator> {
        match &self.generator_url {
            Some(url) => TemplateGenerator::remote(url.as_str()),
            None => Ok(TemplateGenerator::Catalog),
        }
    }
}
