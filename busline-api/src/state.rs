use std::sync::Arc;
use busline_booking::{BookingEngine, CancellationService};
use busline_store::{EventProducer, RedisClient};

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<BookingEngine>,
    pub cancellations: Arc<CancellationService>,
    /// Rate limiting is only enforced when Redis is configured.
    pub redis: Option<Arc<RedisClient>>,
    pub events: Option<Arc<EventProducer>>,
    pub rate_limit_per_minute: i64,
}
