pub mod auth;
pub mod categories;
pub mod reports;
pub mod rewards;
pub mod roles;
pub mod staff;
pub mod users;
