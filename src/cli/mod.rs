pub mod commands;
pub mod core;
pub mod forms;
pub mod help;
pub mod io;
pub mod output;
mod shell;
pub mod ui;

pub use shell::run_cli;
