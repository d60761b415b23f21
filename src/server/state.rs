use std::sync::Arc;

use reasoning_oracle::ReasoningOracle;
use tokio::sync::Semaphore;

use crate::config::AppConfig;
use crate::store::WorkstreamStore;

#[derive(Clone)]
pub struct ServeState {
    pub config: Arc<AppConfig>,
    pub oracle: Option<Arc<dyn ReasoningOracle>>,
    pub workstream_store: Arc<dyn WorkstreamStore>,
    /// Bounds the number of Agent Sessions — each a dedicated headful
    /// browser — running at once (§5).
    pub session_slots: Arc<Semaphore>,
}

impl ServeState {
    pub fn new(
        config: Arc<AppConfig>,
        oracle: Option<Arc<dyn ReasoningOracle>>,
        workstream_store: Arc<dyn WorkstreamStore>,
    ) -> Self {
        let session_slots = Arc::new(Semaphore::new(config.max_concurrent_sessions));
        Self {
            config,
            oracle,
            workstream_store,
            session_slots,
        }
    }
}
