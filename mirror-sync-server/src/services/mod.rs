pub mod health;
pub mod worker;
