use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

use crate::auth::AuthService;

/// Hourly purge of expired sessions and password reset tokens.
#[derive(Debug, Clone)]
pub struct CleanupScheduler {
    auth_service: AuthService,
    period: Duration,
}

impl CleanupScheduler {
    pub fn new(auth_service: AuthService) -> Self {
        Self {
            auth_service,
            period: Duration::from_secs(60 * 60),
        }
    }

    /// Start the cleanup loop in the background
    pub fn start(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = interval(self.period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                self.run_once().await;
            }
        })
    }

    pub async fn run_once(&self) {
        match self.auth_service.purge_expired().await {
            Ok((0, 0)) => tracing::debug!("No expired sessions or tokens"),
            Ok((sessions, verifications)) => {
                tracing::info!(sessions, verifications, "Purged expired sessions and tokens");
            }
            Err(e) => {
                tracing::error!("Failed to purge expired sessions: {}", e);
            }
        }
    }
}
