//! This modules defines the common functionality for limiting how much data a
//! list endpoint returns.

/// The config for pagination
#[derive(Debug, Clone)]
pub struct PaginationConfig {
    /// The maximum number of records to return when a request does not set a limit.
    pub default_page_size: u32,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_page_size: 50,
        }
    }
}
