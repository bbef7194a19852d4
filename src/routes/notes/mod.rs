pub mod handler;
pub mod model;

pub use handler::{create_note, delete_note, get_note, get_notes, update_note};
