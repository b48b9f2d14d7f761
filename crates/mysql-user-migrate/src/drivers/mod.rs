//! Database driver implementations.
//!
//! Each driver implements the [`Connector`](crate::core::Connector) seam and the
//! session traits it hands out. Only MySQL is provided; the engine itself is
//! driver-agnostic.

pub mod mysql;

pub use mysql::{MysqlConnector, MysqlSession};
