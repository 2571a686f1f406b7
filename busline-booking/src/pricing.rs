use busline_core::{to_cents, Passenger, PricingRules, TripSnapshot};
use rust_decimal::Decimal;
use serde::Serialize;

/// Breakdown of the amount due for one booking.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Quote {
    pub fares: Decimal,
    pub pet_surcharges: Decimal,
    pub total: Decimal,
}

/// Fare calculator. Amounts are exact decimals, rounded to cents once at the end.
#[derive(Debug, Clone, Default)]
pub struct PricingEngine {
    rules: PricingRules,
}

impl PricingEngine {
    pub fn new(rules: PricingRules) -> Self {
        Self { rules }
    }

    /// `seats * base_fare + pets * surcharge`, against the fare captured for this booking.
    pub fn quote(&self, trip: &TripSnapshot, passengers: &[Passenger]) -> Quote {
        let seats = Decimal::from(passengers.len() as u64);
        let pets = Decimal::from(passengers.iter().filter(|p| p.travels_with_pet()).count() as u64);

        let fares = trip.base_fare * seats;
        let pet_surcharges = self.rules.pet_surcharge * pets;

        Quote {
            fares: to_cents(fares),
            pet_surcharges: to_cents(pet_surcharges),
            total: to_cents(fares + pet_surcharges),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{adult, pet, trip};
    use rust_decimal_macros::dec;

    #[test]
    fn test_two_adults_no_pets() {
        let engine = PricingEngine::default();
        let snapshot = trip(40, dec!(35.00), true).snapshot();

        let quote = engine.quote(&snapshot, &[adult("Ana"), adult("Bruno")]);
        assert_eq!(quote.total, dec!(70.00));
        assert_eq!(quote.pet_surcharges, dec!(0));
        assert_eq!(quote.total.to_string(), "70.00");
    }

    #[test]
    fn test_pet_surcharge_added_once_per_pet() {
        let engine = PricingEngine::default();
        let snapshot = trip(40, dec!(35.00), true).snapshot();

        let mut with_pet = adult("Bruno");
        with_pet.pet = Some(pet("dog", dec!(5)));

        let quote = engine.quote(&snapshot, &[adult("Ana"), with_pet]);
        assert_eq!(quote.fares, dec!(70.00));
        assert_eq!(quote.pet_surcharges, dec!(15.00));
        assert_eq!(quote.total, dec!(85.00));
    }

    #[test]
    fn test_no_cent_drift_over_many_seats() {
        let engine = PricingEngine::default();
        let snapshot = trip(60, dec!(0.10), false).snapshot();
        let passengers: Vec<_> = (0..30).map(|i| adult(&format!("P{}", i))).collect();

        assert_eq!(engine.quote(&snapshot, &passengers).total, dec!(3.00));
    }
}
