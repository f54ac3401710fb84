//! Registry configuration

/// Configuration for the stream registry reducer
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Leading id segment marking relay-rewritten stream ids
    ///
    /// A stream id of exactly three `_`-separated segments whose first
    /// segment equals this prefix carries its owning participant in the
    /// middle segment.
    pub relay_prefix: String,

    /// Whether stream adds request displayable preview handles
    ///
    /// Off for headless consumers; entries are then tracked without urls.
    pub acquire_previews: bool,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            relay_prefix: "sfu".to_string(),
            acquire_previews: true,
        }
    }
}

impl RegistryConfig {
    /// Set the relay id prefix
    pub fn relay_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.relay_prefix = prefix.into();
        self
    }

    /// Enable or disable preview handle acquisition
    pub fn acquire_previews(mut self, acquire: bool) -> Self {
        self.acquire_previews = acquire;
        self
    }
}
