pub mod middleware;
mod server;
mod services;
mod settings;

pub use server::run;
pub use settings::Settings;
