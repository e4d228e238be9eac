//! Connection establishment and pooling

pub mod net;
pub mod pool;
pub mod tcp;
pub mod types;

pub use net::NetTransport;
pub use pool::{ConnectionPool, PooledConnection};
pub use types::{BoxFuture, Connection, PoolKey, Transport};
