use std::sync::Arc;

use axum::extract::FromRef;
use sqlx::PgPool;

use crate::auth::{AuthService, RateLimitConfig, RateLimiter};
use crate::config::{AppConfig, StorageConfig};
use crate::services::{
    DashboardService, GoalService, Mailer, MediaService, PersonalRecordService, ReportService,
    TrainingService, TrainingTypeService,
};
use crate::storage::FileStorage;

/// Everything the routers need, built once at startup.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Arc<AppConfig>,
    pub storage_config: StorageConfig,
    pub auth_service: AuthService,
    pub rate_limiter: RateLimiter,
    pub training_types: TrainingTypeService,
    pub trainings: TrainingService,
    pub goals: GoalService,
    pub personal_records: PersonalRecordService,
    pub media: MediaService,
    pub dashboard: DashboardService,
    pub reports: ReportService,
}

impl AppState {
    pub fn new(db: PgPool, config: AppConfig, storage_config: StorageConfig, mailer: Mailer) -> Self {
        let auth_service = AuthService::new(db.clone(), &config, mailer);
        let storage = FileStorage::new(storage_config.upload_dir.clone());
        let media = MediaService::new(db.clone(), storage, storage_config.clone());
        let trainings = TrainingService::new(db.clone(), media.clone());
        let goals = GoalService::new(db.clone());
        let personal_records = PersonalRecordService::new(db.clone(), media.clone());
        let reports = ReportService::new(
            db.clone(),
            trainings.clone(),
            goals.clone(),
            personal_records.clone(),
        );

        Self {
            training_types: TrainingTypeService::new(db.clone()),
            dashboard: DashboardService::new(db.clone()),
            rate_limiter: RateLimiter::new(RateLimitConfig::default())
                .trusting_proxy(config.trust_proxy),
            config: Arc::new(config),
            db,
            storage_config,
            auth_service,
            trainings,
            goals,
            personal_records,
            media,
            reports,
        }
    }

    pub fn with_rate_limit(mut self, config: RateLimitConfig) -> Self {
        self.rate_limiter = RateLimiter::new(config).trusting_proxy(self.config.trust_proxy);
        self
    }
}

impl FromRef<AppState> for RateLimiter {
    fn from_ref(state: &AppState) -> Self {
        state.rate_limiter.clone()
    }
}
