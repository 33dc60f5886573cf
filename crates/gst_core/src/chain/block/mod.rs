mod block_timestamp;
pub use block_timestamp::BlockTimestamp;
