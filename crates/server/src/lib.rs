pub mod events;
pub mod server;
pub mod settings;
