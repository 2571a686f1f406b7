//! Fixtures shared by the unit tests of this crate.

use busline_core::{BusRef, Gender, Passenger, Pet, RouteRef, Trip, TripStatus};
use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

pub fn trip(capacity: u32, base_fare: Decimal, pet_friendly: bool) -> Trip {
    let departure_at = Utc::now() + Duration::hours(3);
    Trip {
        id: Uuid::new_v4(),
        route: RouteRef {
            origin: "Rosario".to_string(),
            destination: "Córdoba".to_string(),
            base_fare,
        },
        bus: BusRef {
            plate: "AE 512 KX".to_string(),
            capacity,
            pet_friendly,
        },
        departure_at,
        arrival_at: departure_at + Duration::hours(6),
        status: TripStatus::Scheduled,
    }
}

pub fn adult(name: &str) -> Passenger {
    Passenger {
        name: name.to_string(),
        surname: "Pereyra".to_string(),
        national_id: "30111222".into(),
        age: 34,
        gender: Gender::Female,
        contact_phone: "+54 341 555 0101".into(),
        consent: None,
        pet: None,
    }
}

pub fn minor(name: &str, age: u8) -> Passenger {
    Passenger {
        age,
        gender: Gender::Male,
        ..adult(name)
    }
}

pub fn pet(species: &str, weight_kg: Decimal) -> Pet {
    Pet {
        species: species.to_string(),
        name: Some("Tango".to_string()),
        weight_kg,
    }
}
