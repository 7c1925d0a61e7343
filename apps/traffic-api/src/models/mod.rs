pub mod alert;
pub mod incident;
pub mod reading;
pub mod user;
