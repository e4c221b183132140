mod client;
mod remote_error;

pub use client::{ApiClient, RemotePublisher, RemoteSource};
pub use remote_error::RemoteError;
