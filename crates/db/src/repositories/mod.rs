pub mod alert_repo;
pub mod limit_config_repo;
pub mod reading_repo;

pub use alert_repo::AlertRepo;
pub use limit_config_repo::LimitConfigRepo;
pub use reading_repo::ReadingRepo;
