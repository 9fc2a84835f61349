pub mod bridge;
pub mod console;
pub mod control;
