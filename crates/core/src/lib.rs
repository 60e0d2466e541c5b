//! Rust client for the Skaha interactive session platform.
//!
//! The crate issues session create/fetch/info/logs/destroy calls against a
//! Skaha server. Batch calls (many replicas, many session IDs) are validated
//! up front, dispatched through a bounded [`FanOut`] executor, and returned as
//! a [`Correlated`] set with one [`ItemOutcome`] per input key.
//!
//! # Example
//!
//! ```ignore
//! use skaha::{ClientConfig, CreateRequest, SkahaClient};
//!
//! let client = SkahaClient::new(ClientConfig::load(None)?)?;
//! let created = client
//!     .sessions()
//!     .create(&CreateRequest::new("demo", "images.canfar.net/skaha/terminal:1.1.1").with_cmd("env").with_replicas(2))
//!     .await?;
//! let destroyed = client.sessions().destroy(created.handles()).await?;
//! println!("{:?}", destroyed.flags());
//! ```

pub mod client;
pub mod config;
pub mod context;
pub mod error;
pub mod fanout;
pub mod images;
pub mod outcome;
pub mod overview;
pub mod registry;
pub mod replica;
pub mod session;
pub mod transport;
pub mod validate;

/// Value sent in the `X-Skaha-Client` header.
pub const CLIENT_ID: &str = concat!("rust/", env!("CARGO_PKG_VERSION"));

pub use client::SkahaClient;
pub use config::ClientConfig;
pub use context::Context;
pub use error::{Error, Result};
pub use fanout::{DEFAULT_CONCURRENCY, FanOut};
pub use images::Images;
pub use outcome::{Correlated, ItemOutcome, correlate};
pub use overview::Overview;
pub use registry::ContainerRegistry;
pub use replica::{ReplicaParams, expand};
pub use session::{SessionHandle, Sessions};
pub use skaha_protocol as protocol;
pub use skaha_protocol::{FetchView, SessionKind, SessionStatus};
pub use transport::{HttpTransport, Method, Request, Transport};
pub use validate::{CreateRequest, FetchFilter, FetchRequest, SessionSpec, ValidationError, validate_create, validate_fetch};
