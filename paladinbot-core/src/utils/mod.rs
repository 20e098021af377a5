pub mod target;
pub mod time;
