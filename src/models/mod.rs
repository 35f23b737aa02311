//! Journal domain models

pub mod dashboard;
pub mod goal;
pub mod media;
pub mod personal_record;
pub mod training;
pub mod training_type;
pub mod user;

pub use dashboard::*;
pub use goal::*;
pub use media::*;
pub use personal_record::*;
pub use training::*;
pub use training_type::*;
pub use user::*;
