use busline_shared::Masked;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Female,
    Male,
    Other,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Female => "female",
            Gender::Male => "male",
            Gender::Other => "other",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "female" => Some(Gender::Female),
            "male" => Some(Gender::Male),
            "other" => Some(Gender::Other),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Guardian {
    pub name: String,
    pub national_id: Masked<String>,
}

/// Proof that a minor may travel. The two proofs are alternatives, never combined.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Consent {
    Guardian(Guardian),
    NotarizedPermission,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Pet {
    pub species: String,
    pub name: Option<String>,
    pub weight_kg: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Passenger {
    pub name: String,
    pub surname: String,
    pub national_id: Masked<String>,
    pub age: u8,
    pub gender: Gender,
    pub contact_phone: Masked<String>,
    pub consent: Option<Consent>,
    pub pet: Option<Pet>,
}

impl Passenger {
    pub fn travels_with_pet(&self) -> bool {
        self.pet.is_some()
    }
}

/// Machine-readable reason a passenger was rejected.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, thiserror::Error)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PolicyReason {
    #[error("name is required")]
    MissingName,
    #[error("surname is required")]
    MissingSurname,
    #[error("national id is required")]
    MissingNationalId,
    #[error("age is required")]
    MissingAge,
    #[error("gender is required")]
    MissingGender,
    #[error("contact phone is required")]
    MissingContactPhone,
    #[error("minor requires guardian data or notarized permission")]
    MinorWithoutConsent,
    #[error("guardian data and notarized permission are mutually exclusive")]
    ConflictingConsent,
    #[error("guardian name and guardian id must both be present")]
    IncompleteGuardian,
    #[error("pet species is required")]
    PetSpeciesMissing,
    #[error("pet weight is required")]
    PetWeightMissing,
    #[error("pet species is not allowed")]
    PetSpeciesNotAllowed,
    #[error("pet exceeds the maximum weight")]
    PetTooHeavy,
    #[error("trip does not accept pets")]
    PetsNotAllowedOnTrip,
}

impl PolicyReason {
    pub fn code(&self) -> &'static str {
        match self {
            PolicyReason::MissingName => "MISSING_NAME",
            PolicyReason::MissingSurname => "MISSING_SURNAME",
            PolicyReason::MissingNationalId => "MISSING_NATIONAL_ID",
            PolicyReason::MissingAge => "MISSING_AGE",
            PolicyReason::MissingGender => "MISSING_GENDER",
            PolicyReason::MissingContactPhone => "MISSING_CONTACT_PHONE",
            PolicyReason::MinorWithoutConsent => "MINOR_WITHOUT_CONSENT",
            PolicyReason::ConflictingConsent => "CONFLICTING_CONSENT",
            PolicyReason::IncompleteGuardian => "INCOMPLETE_GUARDIAN",
            PolicyReason::PetSpeciesMissing => "PET_SPECIES_MISSING",
            PolicyReason::PetWeightMissing => "PET_WEIGHT_MISSING",
            PolicyReason::PetSpeciesNotAllowed => "PET_SPECIES_NOT_ALLOWED",
            PolicyReason::PetTooHeavy => "PET_TOO_HEAVY",
            PolicyReason::PetsNotAllowedOnTrip => "PETS_NOT_ALLOWED_ON_TRIP",
        }
    }
}

// ============================================================================
// Wire shape
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PetInput {
    pub species: Option<String>,
    pub name: Option<String>,
    pub weight_kg: Option<Decimal>,
}

/// Passenger as submitted by clients: a flat record of optional fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PassengerInput {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub surname: String,
    #[serde(default)]
    pub national_id: Masked<String>,
    pub age: Option<u8>,
    pub gender: Option<Gender>,
    #[serde(default)]
    pub contact_phone: Masked<String>,
    pub guardian_name: Option<String>,
    pub guardian_id: Option<String>,
    #[serde(default)]
    pub notarized_permission: bool,
    #[serde(default)]
    pub travels_with_pet: bool,
    pub pet: Option<PetInput>,
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl PassengerInput {
    /// Folds the optional fields into the variant model.
    ///
    /// Only structural problems are reported here; business rules are left to the validator.
    /// Consent fields are read for minors only, so an adult carrying a stray guardian field is
    /// not rejected for it.
    pub fn into_passenger(self, adult_age: u8) -> Result<Passenger, PolicyReason> {
        let age = self.age.ok_or(PolicyReason::MissingAge)?;
        let gender = self.gender.ok_or(PolicyReason::MissingGender)?;

        let consent = if age < adult_age {
            let guardian = match (present(&self.guardian_name), present(&self.guardian_id)) {
                (Some(name), Some(id)) => Some(Guardian {
                    name: name.to_string(),
                    national_id: Masked::new(id.to_string()),
                }),
                (None, None) => None,
                _ => return Err(PolicyReason::IncompleteGuardian),
            };

            match (guardian, self.notarized_permission) {
                (Some(_), true) => return Err(PolicyReason::ConflictingConsent),
                (Some(g), false) => Some(Consent::Guardian(g)),
                (None, true) => Some(Consent::NotarizedPermission),
                (None, false) => None,
            }
        } else {
            None
        };

        let pet = if self.travels_with_pet {
            let input = self.pet.unwrap_or_default();
            let species = present(&input.species)
                .ok_or(PolicyReason::PetSpeciesMissing)?
                .to_string();
            let weight_kg = input.weight_kg.ok_or(PolicyReason::PetWeightMissing)?;
            Some(Pet { species, name: input.name, weight_kg })
        } else {
            None
        };

        Ok(Passenger {
            name: self.name,
            surname: self.surname,
            national_id: self.national_id,
            age,
            gender,
            contact_phone: self.contact_phone,
            consent,
            pet,
        })
    }
}

impl From<Passenger> for PassengerInput {
    fn from(p: Passenger) -> Self {
        let (guardian_name, guardian_id, notarized_permission) = match p.consent {
            Some(Consent::Guardian(g)) => (Some(g.name), Some(g.national_id.into_inner()), false),
            Some(Consent::NotarizedPermission) => (None, None, true),
            None => (None, None, false),
        };
        let travels_with_pet = p.pet.is_some();
        let pet = p.pet.map(|pet| PetInput {
            species: Some(pet.species),
            name: pet.name,
            weight_kg: Some(pet.weight_kg),
        });

        Self {
            name: p.name,
            surname: p.surname,
            national_id: p.national_id,
            age: Some(p.age),
            gender: Some(p.gender),
            contact_phone: p.contact_phone,
            guardian_name,
            guardian_id,
            notarized_permission,
            travels_with_pet,
            pet,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const ADULT_AGE: u8 = 18;

    fn adult_input() -> PassengerInput {
        PassengerInput {
            name: "Lucía".into(),
            surname: "Pereyra".into(),
            national_id: "30111222".into(),
            age: Some(34),
            gender: Some(Gender::Female),
            contact_phone: "+54 341 555 0101".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_adult_without_extras() {
        let passenger = adult_input().into_passenger(ADULT_AGE).unwrap();
        assert_eq!(passenger.consent, None);
        assert!(!passenger.travels_with_pet());
    }

    #[test]
    fn test_missing_age_and_gender() {
        let mut input = adult_input();
        input.age = None;
        assert_eq!(input.into_passenger(ADULT_AGE).unwrap_err(), PolicyReason::MissingAge);

        let mut input = adult_input();
        input.gender = None;
        assert_eq!(input.into_passenger(ADULT_AGE).unwrap_err(), PolicyReason::MissingGender);
    }

    #[test]
    fn test_guardian_becomes_consent_variant() {
        let mut input = adult_input();
        input.age = Some(15);
        input.guardian_name = Some("Marta Pereyra".into());
        input.guardian_id = Some("20999888".into());

        let passenger = input.into_passenger(ADULT_AGE).unwrap();
        match passenger.consent {
            Some(Consent::Guardian(g)) => assert_eq!(g.name, "Marta Pereyra"),
            other => panic!("unexpected consent: {:?}", other),
        }
    }

    #[test]
    fn test_half_guardian_is_rejected() {
        let mut input = adult_input();
        input.age = Some(15);
        input.guardian_name = Some("Marta Pereyra".into());
        input.guardian_id = Some("   ".into());
        assert_eq!(input.into_passenger(ADULT_AGE).unwrap_err(), PolicyReason::IncompleteGuardian);
    }

    #[test]
    fn test_both_proofs_conflict() {
        let mut input = adult_input();
        input.age = Some(15);
        input.guardian_name = Some("Marta Pereyra".into());
        input.guardian_id = Some("20999888".into());
        input.notarized_permission = true;
        assert_eq!(input.into_passenger(ADULT_AGE).unwrap_err(), PolicyReason::ConflictingConsent);
    }

    #[test]
    fn test_adult_consent_fields_are_ignored() {
        let mut input = adult_input();
        input.guardian_name = Some("Someone".into());
        assert_eq!(input.clone().into_passenger(ADULT_AGE).unwrap().consent, None);

        input.guardian_id = Some("20999888".into());
        input.notarized_permission = true;
        assert_eq!(input.into_passenger(ADULT_AGE).unwrap().consent, None);
    }

    #[test]
    fn test_adult_age_threshold_is_configurable() {
        let mut input = adult_input();
        input.age = Some(19);
        input.guardian_name = Some("Marta Pereyra".into());
        assert_eq!(input.into_passenger(21).unwrap_err(), PolicyReason::IncompleteGuardian);
    }

    #[test]
    fn test_round_trip_from_domain() {
        let mut input = adult_input();
        input.age = Some(12);
        input.guardian_name = Some("Marta Pereyra".into());
        input.guardian_id = Some("20999888".into());
        let passenger = input.into_passenger(ADULT_AGE).unwrap();

        let back = PassengerInput::from(passenger.clone()).into_passenger(ADULT_AGE).unwrap();
        assert_eq!(back, passenger);
    }

    #[test]
    fn test_pet_requires_species_and_weight() {
        let mut input = adult_input();
        input.travels_with_pet = true;
        assert_eq!(input.clone().into_passenger(ADULT_AGE).unwrap_err(), PolicyReason::PetSpeciesMissing);

        input.pet = Some(PetInput { species: Some("dog".into()), name: Some("Tango".into()), weight_kg: None });
        assert_eq!(input.clone().into_passenger(ADULT_AGE).unwrap_err(), PolicyReason::PetWeightMissing);

        input.pet = Some(PetInput { species: Some("dog".into()), name: Some("Tango".into()), weight_kg: Some(dec!(6.5)) });
        let passenger = input.into_passenger(ADULT_AGE).unwrap();
        assert_eq!(passenger.pet.unwrap().weight_kg, dec!(6.5));
    }

    #[test]
    fn test_pet_payload_ignored_without_flag() {
        let mut input = adult_input();
        input.pet = Some(PetInput { species: Some("dog".into()), name: None, weight_kg: Some(dec!(3)) });
        assert!(input.into_passenger(ADULT_AGE).unwrap().pet.is_none());
    }

    #[test]
    fn test_wire_shape_deserializes_camel_case() {
        let json = r#"{
            "name": "Tomás", "surname": "Ibarra", "nationalId": "44123456",
            "age": 15, "gender": "male", "contactPhone": "+54 351 555 0199",
            "notarizedPermission": true
        }"#;
        let input: PassengerInput = serde_json::from_str(json).expect("Failed to deserialize");
        let passenger = input.into_passenger(ADULT_AGE).unwrap();
        assert_eq!(passenger.consent, Some(Consent::NotarizedPermission));
        assert_eq!(PolicyReason::MinorWithoutConsent.code(), "MINOR_WITHOUT_CONSENT");
        assert_eq!(
            serde_json::to_value(PolicyReason::PetTooHeavy).unwrap(),
            serde_json::json!("PET_TOO_HEAVY")
        );
    }
}
