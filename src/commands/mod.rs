mod config_cmd;
mod export;

pub use config_cmd::ConfigCommand;
pub use export::ExportCommand;
