pub mod databases;
pub mod query;
pub mod users;
