pub mod cursors;
pub mod derived;
pub mod events;
pub mod idempotency;
