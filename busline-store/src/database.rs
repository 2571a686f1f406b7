use busline_core::{RefundTier, StoreError};
use rust_decimal::Decimal;
use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use sqlx::{Pool, Postgres};
use std::str::FromStr;
use std::time::Duration;
use tracing::{info, warn};

use crate::app_config::{BusinessRules, DatabaseConfig};

pub(crate) fn db_err(e: sqlx::Error) -> StoreError {
    StoreError::Backend(e.to_string())
}

#[derive(Clone)]
pub struct DbClient {
    pub pool: Pool<Postgres>,
}

impl DbClient {
    pub async fn new(config: &DatabaseConfig) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&config.url)
            .await?;

        Ok(Self { pool })
    }

    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        info!("Running database migrations...");
        sqlx::migrate!("../migrations")
            .run(&self.pool)
            .await?;
        info!("Migrations completed successfully.");
        Ok(())
    }

    /// Overlays rules stored in the `business_rules` table on top of file/env configuration.
    pub async fn fetch_business_rules(&self, defaults: BusinessRules) -> Result<BusinessRules, sqlx::Error> {
        #[derive(sqlx::FromRow)]
        struct RuleRow {
            rule_key: String,
            rule_value: Value,
        }

        let rows = sqlx::query_as::<_, RuleRow>("SELECT rule_key, rule_value FROM business_rules")
            .fetch_all(&self.pool)
            .await?;

        let mut rules = defaults;
        for row in rows {
            // Expected format: {"value": <number/string/array>}
            match row.rule_value.get("value") {
                Some(v) => apply_rule(&mut rules, &row.rule_key, v),
                None => warn!("Business rule {} has no value, ignoring", row.rule_key),
            }
        }

        Ok(rules)
    }
}

fn as_decimal(v: &Value) -> Option<Decimal> {
    match v {
        Value::String(s) => Decimal::from_str(s).ok(),
        Value::Number(n) => Decimal::from_str(&n.to_string()).ok(),
        _ => None,
    }
}

pub(crate) fn apply_rule(rules: &mut BusinessRules, key: &str, v: &Value) {
    match key {
        "pet_surcharge" => {
            if let Some(d) = as_decimal(v) {
                rules.pricing.pet_surcharge = d;
            }
        }
        "max_pet_weight_kg" => {
            if let Some(d) = as_decimal(v) {
                rules.passengers.max_pet_weight_kg = d;
            }
        }
        "adult_age" => {
            if let Some(age) = v.as_u64().and_then(|a| u8::try_from(a).ok()) {
                rules.passengers.adult_age = age;
            }
        }
        "allowed_pet_species" => {
            if let Some(list) = v.as_array() {
                rules.passengers.allowed_pet_species = list
                    .iter()
                    .filter_map(|s| s.as_str().map(String::from))
                    .collect();
            }
        }
        "cancellation_tiers" => match serde_json::from_value::<Vec<RefundTier>>(v.clone()) {
            Ok(tiers) if !tiers.is_empty() => rules.cancellation.tiers = tiers,
            Ok(_) => warn!("Ignoring empty cancellation_tiers override"),
            Err(e) => warn!("Invalid cancellation_tiers override: {}", e),
        },
        other => warn!("Unknown business rule {}", other),
    }
}
