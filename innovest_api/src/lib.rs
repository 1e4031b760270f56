//! Client library for the Innovest hosted backend: auth sessions, table
//! reads and writes, and realtime change subscriptions. Everything is
//! blocking; callers run operations on worker threads.

pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod query;
pub mod realtime;
pub mod session;

pub use client::Client;
pub use config::ServiceConfig;
pub use error::{ApiError, Result};
pub use query::QueryBuilder;
pub use realtime::{ChangeEvent, ChangeKind, Subscription};
pub use session::{Session, User};
