pub mod routes;
pub mod server;
pub mod settings;

pub use server::Server;
pub use settings::Settings;
