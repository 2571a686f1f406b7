use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingRules {
    /// Flat amount added per passenger travelling with a pet.
    #[serde(default = "default_pet_surcharge")]
    pub pet_surcharge: Decimal,
}

fn default_pet_surcharge() -> Decimal { Decimal::new(1500, 2) }

impl Default for PricingRules {
    fn default() -> Self {
        Self { pet_surcharge: default_pet_surcharge() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PassengerRules {
    /// Passengers younger than this need guardian data or notarized permission.
    #[serde(default = "default_adult_age")]
    pub adult_age: u8,
    /// Compared case-insensitively.
    #[serde(default = "default_species")]
    pub allowed_pet_species: Vec<String>,
    #[serde(default = "default_max_pet_weight")]
    pub max_pet_weight_kg: Decimal,
}

fn default_adult_age() -> u8 { 18 }
fn default_species() -> Vec<String> { vec!["dog".to_string(), "cat".to_string()] }
fn default_max_pet_weight() -> Decimal { Decimal::new(8, 0) }

impl Default for PassengerRules {
    fn default() -> Self {
        Self {
            adult_age: default_adult_age(),
            allowed_pet_species: default_species(),
            max_pet_weight_kg: default_max_pet_weight(),
        }
    }
}

impl PassengerRules {
    pub fn species_allowed(&self, species: &str) -> bool {
        let species = species.trim();
        self.allowed_pet_species
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(species))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefundTier {
    /// Inclusive lower bound on the time left before departure.
    pub hours_before_departure: u32,
    /// 0..=100
    pub refund_percent: Decimal,
    #[serde(default)]
    pub flat_penalty: Decimal,
}

impl RefundTier {
    pub fn new(hours_before_departure: u32, refund_percent: Decimal, flat_penalty: Decimal) -> Self {
        Self { hours_before_departure, refund_percent, flat_penalty }
    }

    pub fn applies_penalty(&self) -> bool {
        self.flat_penalty > Decimal::ZERO
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancellationPolicy {
    #[serde(default = "default_tiers")]
    pub tiers: Vec<RefundTier>,
}

fn default_tiers() -> Vec<RefundTier> {
    vec![
        RefundTier::new(2, Decimal::ONE_HUNDRED, Decimal::ZERO),
        RefundTier::new(1, Decimal::new(50, 0), Decimal::new(10, 0)),
        RefundTier::new(0, Decimal::ZERO, Decimal::ZERO),
    ]
}

impl Default for CancellationPolicy {
    fn default() -> Self {
        Self { tiers: default_tiers() }
    }
}

impl CancellationPolicy {
    pub fn new(tiers: Vec<RefundTier>) -> Self {
        Self { tiers }.normalized()
    }

    /// Orders tiers from most generous (largest threshold) to most restrictive.
    pub fn normalized(mut self) -> Self {
        self.tiers.sort_by(|a, b| b.hours_before_departure.cmp(&a.hours_before_departure));
        if self.tiers.is_empty() {
            self.tiers = default_tiers();
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_tiers() {
        let policy = CancellationPolicy::default();
        assert_eq!(policy.tiers.len(), 3);
        assert_eq!(policy.tiers[0].hours_before_departure, 2);
        assert!(policy.tiers[1].applies_penalty());
        assert!(!policy.tiers[2].applies_penalty());
    }

    #[test]
    fn test_normalized_sorts_descending() {
        let policy = CancellationPolicy::new(vec![
            RefundTier::new(0, Decimal::ZERO, Decimal::ZERO),
            RefundTier::new(24, Decimal::ONE_HUNDRED, Decimal::ZERO),
            RefundTier::new(6, Decimal::new(75, 0), Decimal::ZERO),
        ]);
        let thresholds: Vec<u32> = policy.tiers.iter().map(|t| t.hours_before_departure).collect();
        assert_eq!(thresholds, vec![24, 6, 0]);
    }

    #[test]
    fn test_species_match_ignores_case() {
        let rules = PassengerRules::default();
        assert!(rules.species_allowed("Dog"));
        assert!(rules.species_allowed(" cat "));
        assert!(!rules.species_allowed("iguana"));
    }

    #[test]
    fn test_rules_deserialize_with_defaults() {
        let rules: PassengerRules = serde_json::from_str(r#"{"max_pet_weight_kg": "10"}"#).unwrap();
        assert_eq!(rules.adult_age, 18);
        assert_eq!(rules.max_pet_weight_kg, Decimal::new(10, 0));

        let pricing: PricingRules = serde_json::from_str("{}").unwrap();
        assert_eq!(pricing.pet_surcharge, Decimal::new(1500, 2));
    }
}
