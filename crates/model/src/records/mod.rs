pub mod position;
pub mod record;
