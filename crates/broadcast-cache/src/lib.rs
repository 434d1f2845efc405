//! A bounded, TTL-expiring, cache-through view over the partner
//! repository, isolating the orchestrator from the backing store.

mod cache;
mod store;

pub use cache::{PartnerCache, DEFAULT_CAPACITY, DEFAULT_TTL};
