pub mod builder;
pub mod params;
pub mod source;
pub mod value;
