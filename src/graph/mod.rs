pub mod block;
pub mod connected;
pub mod connection;
pub mod connector;
pub mod data;
pub mod factory;

pub use block::*;
pub use connected::*;
pub use connection::*;
pub use connector::*;
pub use data::*;
