pub mod api;
pub mod backlog;
pub mod board;
pub mod config;
pub mod errors;
pub mod events;
pub mod logging;
pub mod stub;
pub mod team;

pub use taskboard_common as common;
