pub mod handler;
pub mod model;

pub use handler::{admin_users, login, me, register};
