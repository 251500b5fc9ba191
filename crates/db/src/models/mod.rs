pub mod alert;
pub mod limit_config;
pub mod reading;
