//! # ML platform SDK
//!
//! Rust client core for the ML platform REST API.
//!
//! ## Architecture
//!
//! The SDK is organized in layers:
//!
//! 1. **Core**: Schemas, object mapping, native values, errors (no I/O)
//! 2. **Iteration**: Transport seam, pagination, async-job polling
//! 3. **Domain**: Datetime partitioning specification and response types
//! 4. **HTTP API**: `PlatformHttp` with per-request retry policies
//! 5. **High-Level Client**: `PlatformClient` with nested sub-clients
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use mlplatform_sdk::prelude::*;
//!
//! let client = PlatformClient::builder()
//!     .endpoint("https://app.example.com/api/v2")
//!     .token("my-token")
//!     .build()?;
//!
//! let mut spec = DatetimePartitioningSpecification::new("date");
//! spec.number_of_backtests = Some(3);
//! let partitioning = client.partitioning().generate(&project_id, &spec).await?;
//! ```
#![recursion_limit = "256"]

// ── Layer 1: Core ────────────────────────────────────────────────────────────

/// Shared newtypes, key case conversion and the native value model.
pub mod shared;

/// Declarative payload schemas and validation.
pub mod schema;

/// Server JSON ⇄ native mapping and the `ApiObject` trait.
pub mod mapping;

/// Unified SDK error types.
pub mod error;

/// Environment variable names and connection defaults.
pub mod network;

/// Client configuration resolution and the process-wide default.
pub mod config;

// ── Layer 2: Iteration ───────────────────────────────────────────────────────

/// The HTTP seam consumed by pagination and polling.
pub mod transport;

/// Lazy iteration over paginated list endpoints.
pub mod pagination;

/// Poll-until-terminal for long-running server jobs.
pub mod polling;

// ── Layer 3: Domain ──────────────────────────────────────────────────────────

/// Domain modules (vertical slices).
pub mod domain;

// ── Layer 4: HTTP API ────────────────────────────────────────────────────────

/// HTTP client with retry policies.
#[cfg(feature = "http")]
pub mod http;

// ── Layer 5: High-Level Client ───────────────────────────────────────────────

/// `PlatformClient`, the primary entry point.
#[cfg(feature = "http")]
pub mod client;

// ── Prelude ──────────────────────────────────────────────────────────────────

pub mod prelude {
    // Shared
    pub use crate::shared::{camelize, underscorize, Native, NativeMap, ProjectId};

    // Schema + mapping
    pub use crate::mapping::{from_api, to_api, to_api_value, ApiObject, KeepNulls};
    pub use crate::schema::{ExtraPolicy, Field, FieldType, Record, Schema};

    // Domain types: partitioning
    pub use crate::domain::partitioning::{
        construct_duration_string, resolve_backtest, Backtest, BacktestSpecification,
        BacktestWindow, DatetimePartitioning, DatetimePartitioningSpecification, Holdout,
        Periodicity,
    };

    // Iteration
    pub use crate::pagination::{collect_all, unpaginate, Pager, DEFAULT_BATCH_SIZE};
    pub use crate::polling::{wait_for_async_resolution, AsyncResolution, PollConfig};
    pub use crate::transport::{QueryParams, StatusPoll, Transport};

    // Errors
    pub use crate::error::{
        ConfigError, HttpError, InvalidUsageError, SchemaValidationError, SdkError,
    };

    // Config
    pub use crate::config::{ClientConfig, ConfigLoader};

    // HTTP client + sub-clients
    #[cfg(feature = "http")]
    pub use crate::client::{PartitioningClient, PlatformClient, PlatformClientBuilder};
    #[cfg(feature = "http")]
    pub use crate::http::retry::{RetryConfig, RetryPolicy};
}
