//! Business logic services

pub mod cleanup_scheduler;
pub mod dashboard_service;
pub mod goal_service;
pub mod mail_service;
pub mod media_service;
pub mod personal_record_service;
pub mod report_service;
pub mod training_service;
pub mod training_type_service;

pub use cleanup_scheduler::CleanupScheduler;
pub use dashboard_service::DashboardService;
pub use goal_service::GoalService;
pub use mail_service::Mailer;
pub use media_service::MediaService;
pub use personal_record_service::PersonalRecordService;
pub use report_service::ReportService;
pub use training_service::TrainingService;
pub use training_type_service::TrainingTypeService;
