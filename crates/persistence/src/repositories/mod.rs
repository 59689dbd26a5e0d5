//! Repository implementations.

pub mod channel;
pub mod order;
pub mod product_mapping;

pub use channel::ChannelRepository;
pub use order::OrderRepository;
pub use product_mapping::ProductMappingRepository;
