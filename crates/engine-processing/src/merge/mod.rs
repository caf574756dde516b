pub mod ack;
pub mod channel;
pub mod comparator;
pub mod merger;
pub mod unit;
