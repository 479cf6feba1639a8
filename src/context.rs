use std::sync::Arc;

use crate::config::AppConfig;
use crate::domain::user::UserRef;
use crate::error::AppResult;
use crate::services::TicketBackend;

#[derive(Clone)]
pub struct AppContext {
    pub config: AppConfig,
    pub session: UserRef,
    pub backend: Arc<dyn TicketBackend>,
}

impl AppContext {
    /// Fails when no user is signed in.
    pub fn new(config: AppConfig, backend: Arc<dyn TicketBackend>) -> AppResult<Self> {
        let session = config.session()?;
        Ok(Self {
            config,
            session,
            backend,
        })
    }
}
