pub mod circles;
pub mod health;
