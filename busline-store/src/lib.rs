pub mod app_config;
pub mod booking_repo;
pub mod database;
pub mod events;
pub mod redis_repo;
pub mod seat_repo;
pub mod trip_repo;

pub use booking_repo::PgBookingRepository;
pub use database::DbClient;
pub use events::EventProducer;
pub use redis_repo::RedisClient;
pub use seat_repo::PgSeatLedger;
pub use trip_repo::PgTripCatalog;
