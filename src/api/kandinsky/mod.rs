pub mod client;
pub mod styles;
pub mod types;

pub use client::KandinskyClient;
