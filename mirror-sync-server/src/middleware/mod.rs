mod idempotency;

pub use idempotency::IdempotencyGuard;
