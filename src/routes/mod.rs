pub mod health;
pub mod notes;
pub mod tasks;
pub mod user;
pub mod ws;
