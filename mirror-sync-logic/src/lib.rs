pub mod client;
pub mod dispatcher;
pub mod idempotency;
pub mod message;
pub mod repository;
pub mod settings;
pub mod worker;

#[cfg(test)]
mod tests;
