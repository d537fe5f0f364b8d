mod user;

pub use user::{NewUser, User, USER_COLUMNS};
