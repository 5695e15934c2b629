pub mod commands;
pub mod handlers;

pub use commands::{BuildArgs, CliArgs, Commands, DetectArgs, DoctorArgs};
pub use handlers::{handle_build, handle_detect, handle_doctor};
