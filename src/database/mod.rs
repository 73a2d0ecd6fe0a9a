pub mod backup;
pub mod connection;
pub mod env_file;

pub use backup::*;
pub use connection::*;
pub use env_file::*;
