pub mod consistency;
pub mod error;
