pub mod consistency;
pub mod live;
pub mod memory;
pub mod utils;
