pub mod handler;

pub use handler::trigger_task;
