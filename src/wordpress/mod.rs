// Typed access to a WordPress REST content API.

pub mod client;
pub mod query;
pub mod types;

pub use client::ContentClient;
pub use query::{
    join_ids, DateRange, Direction, Embed, MetaFilter, Order, OrderBy, Pagination, Query,
    SearchFilters,
};
pub use types::*;
