//! Filesystem watch backends.

pub mod notify_backend;

pub use notify_backend::NotifyBackend;
