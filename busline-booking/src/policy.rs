use busline_core::{Consent, Passenger, PassengerInput, PassengerRules, PolicyReason, Trip};

/// Per-passenger compliance checks, independent of seat availability.
#[derive(Debug, Clone, Default)]
pub struct PassengerPolicy {
    rules: PassengerRules,
}

impl PassengerPolicy {
    pub fn new(rules: PassengerRules) -> Self {
        Self { rules }
    }

    /// Converts a submitted passenger and runs every check on the result.
    pub fn admit(&self, input: PassengerInput, trip: &Trip) -> Result<Passenger, PolicyReason> {
        let passenger = input.into_passenger(self.rules.adult_age)?;
        self.validate(&passenger, trip)?;
        Ok(passenger)
    }

    pub fn validate(&self, passenger: &Passenger, trip: &Trip) -> Result<(), PolicyReason> {
        Self::check_required(passenger)?;
        self.check_consent(passenger)?;
        self.check_pet(passenger, trip)
    }

    fn check_required(passenger: &Passenger) -> Result<(), PolicyReason> {
        if passenger.name.trim().is_empty() {
            return Err(PolicyReason::MissingName);
        }
        if passenger.surname.trim().is_empty() {
            return Err(PolicyReason::MissingSurname);
        }
        if passenger.national_id.expose().trim().is_empty() {
            return Err(PolicyReason::MissingNationalId);
        }
        if passenger.contact_phone.expose().trim().is_empty() {
            return Err(PolicyReason::MissingContactPhone);
        }
        Ok(())
    }

    fn check_consent(&self, passenger: &Passenger) -> Result<(), PolicyReason> {
        if passenger.age >= self.rules.adult_age {
            return Ok(());
        }
        match &passenger.consent {
            Some(Consent::Guardian(guardian))
                if guardian.name.trim().is_empty() || guardian.national_id.expose().trim().is_empty() =>
            {
                Err(PolicyReason::IncompleteGuardian)
            }
            Some(_) => Ok(()),
            None => Err(PolicyReason::MinorWithoutConsent),
        }
    }

    fn check_pet(&self, passenger: &Passenger, trip: &Trip) -> Result<(), PolicyReason> {
        let Some(pet) = &passenger.pet else {
            return Ok(());
        };
        // A bus that does not carry pets rejects regardless of species or weight.
        if !trip.allows_pets() {
            return Err(PolicyReason::PetsNotAllowedOnTrip);
        }
        if !self.rules.species_allowed(&pet.species) {
            return Err(PolicyReason::PetSpeciesNotAllowed);
        }
        if pet.weight_kg > self.rules.max_pet_weight_kg {
            return Err(PolicyReason::PetTooHeavy);
        }
        Ok(())
    }
}
