//! Domain modules organized as vertical slices.
//!
//! Each sub-module contains:
//! - `mod.rs`: Rich domain types and local validation
//! - `request.rs`: Request builders rendered through `mapping::to_api`
//! - `wire.rs`: Response schemas and the `ApiObject` types built from them
//! - `convert.rs`: Conversions between response and request types
//! - `client.rs`: Sub-client with HTTP methods

pub mod partitioning;
