use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum MergeError {
    #[error("Channel queue is full")]
    ChannelFull,

    #[error("Channel was closed by the merger")]
    ChannelClosed,
}
