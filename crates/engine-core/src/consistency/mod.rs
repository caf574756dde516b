pub mod algorithm;
pub mod checker;
pub mod context;
pub mod factory;
pub mod parameter;
pub mod result;
