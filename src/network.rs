//! Connection constants for the platform API.

/// Environment variable naming a YAML config file.
pub const ENV_CONFIG_FILE: &str = "MLPLATFORM_CONFIG_FILE";

/// Environment variable holding the API endpoint, e.g. `https://host/api/v2`.
pub const ENV_ENDPOINT: &str = "MLPLATFORM_ENDPOINT";

/// Environment variable holding the API token.
pub const ENV_API_TOKEN: &str = "MLPLATFORM_API_TOKEN";

/// Directory under the user's config dir that holds the default config file.
pub const CONFIG_DIR_NAME: &str = "mlplatform";

pub const CONFIG_FILE_NAME: &str = "mlpconfig.yaml";

/// Seconds allowed for establishing a connection.
pub const DEFAULT_CONNECT_TIMEOUT_SECS: f64 = 6.05;

/// Whole-request timeout. Reads on slow list endpoints can take a while.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 600;

pub const USER_AGENT: &str = concat!("mlplatform-sdk-rust/", env!("CARGO_PKG_VERSION"));
