//! TCP helpers: name resolution, dialing and proxy tunnels

pub mod basic_connection;
pub mod dns;
pub mod http_connect;

pub use basic_connection::connect_to_address_list;
pub use dns::resolve_host;
pub use http_connect::{Tunnel, establish_connect_tunnel};
