//! Chat bot front end for asynchronous text-to-image generation services.
//!
//! A conversation collects a style and a prompt, submits a job to the
//! configured provider (Kandinsky/FusionBrain or Yandex ART), polls it with a
//! bounded budget and delivers the finished images back to the chat.

pub mod api;
pub mod app;
pub mod chat;
pub mod error;
pub mod mime;
pub mod models;
pub mod poller;

pub use error::{Error, Result};
