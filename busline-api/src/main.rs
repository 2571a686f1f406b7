use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use busline_api::{app, AppState};
use busline_booking::{
    BookingEngine, CancellationService, MemoryBookingStore, MemorySeatLedger, MemoryTripCatalog,
    PassengerPolicy, PricingEngine,
};
use busline_core::{BookingRepository, SeatLedger, TripCatalog};
use busline_store::app_config::Config;
use busline_store::{DbClient, EventProducer, PgBookingRepository, PgSeatLedger, PgTripCatalog, RedisClient};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "busline_api=debug,busline_booking=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().context("Failed to load config")?;
    tracing::info!("Starting Busline API on port {}", config.server.port);

    let mut business_rules = config.business_rules.clone();

    let (catalog, ledger, bookings): (Arc<dyn TripCatalog>, Arc<dyn SeatLedger>, Arc<dyn BookingRepository>) =
        match &config.database {
            Some(db_config) => {
                let db = DbClient::new(db_config).await.context("Failed to connect to Postgres")?;
                if db_config.run_migrations {
                    db.migrate().await.context("Failed to run migrations")?;
                }
                business_rules = db
                    .fetch_business_rules(business_rules)
                    .await
                    .context("Failed to load business rules")?;

                let catalog: Arc<dyn TripCatalog> = Arc::new(PgTripCatalog::new(db.pool.clone()));
                let ledger: Arc<dyn SeatLedger> = Arc::new(PgSeatLedger::new(db.pool.clone()));
                let bookings: Arc<dyn BookingRepository> = Arc::new(PgBookingRepository::new(db.pool.clone()));
                (catalog, ledger, bookings)
            }
            None => {
                tracing::warn!("No database configured, bookings are kept in memory");
                let seats = Arc::new(MemorySeatLedger::new());
                let catalog: Arc<dyn TripCatalog> = Arc::new(MemoryTripCatalog::new());
                let bookings: Arc<dyn BookingRepository> = Arc::new(MemoryBookingStore::new(seats.clone()));
                let ledger: Arc<dyn SeatLedger> = seats;
                (catalog, ledger, bookings)
            }
        };

    let redis = match &config.redis {
        Some(redis_config) => Some(Arc::new(
            RedisClient::new(&redis_config.url).await.context("Failed to connect to Redis")?,
        )),
        None => None,
    };

    let events = match &config.kafka {
        Some(kafka_config) => Some(Arc::new(
            EventProducer::new(&kafka_config.brokers).context("Failed to create Kafka producer")?,
        )),
        None => None,
    };

    let engine = BookingEngine::new(
        catalog.clone(),
        ledger,
        bookings.clone(),
        PassengerPolicy::new(business_rules.passengers.clone()),
        PricingEngine::new(business_rules.pricing.clone()),
    );
    let cancellations = CancellationService::new(catalog, bookings, business_rules.cancellation.clone());

    let app_state = AppState {
        engine: Arc::new(engine),
        cancellations: Arc::new(cancellations),
        redis,
        events,
        rate_limit_per_minute: config.server.rate_limit_per_minute,
    };

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
