pub mod datetime;
pub mod unicode;
