pub mod connection;
pub mod manager;
pub mod node;
pub mod socket;

pub use connection::*;
pub use manager::*;
pub use node::*;
pub use socket::*;
