pub mod group_buffer;

pub use group_buffer::{BatchHandler, GroupBuffer};
