pub mod adapter;
pub mod builder;
pub mod error;
pub mod reader;
pub mod row;
pub mod source;
