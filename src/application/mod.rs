pub mod activity;
pub mod dashboard;
pub mod error;
pub mod notify;
pub mod pagination;
pub mod repos;
