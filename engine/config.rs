use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Marker for configuration value types.
///
/// Configurations are plain data: tunable parameters fixed at construction
/// and never mutated afterwards. A swarm-level ("global") configuration is
/// shared read-only by every unit for the lifetime of the swarm; module-level
/// configurations are owned by the concrete module they parameterize.
pub trait Config: Send + Sync + 'static {}

/// Configuration with no parameters.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmptyConfig;

impl Config for EmptyConfig {}

/// Read-only handle to a configuration shared by many owners.
///
/// The holder never owns the configuration, only the lookup; the value lives
/// as long as the swarm that created it.
pub type ConfigHandle<C> = Arc<C>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_round_trips() {
        let json = serde_json::to_string(&EmptyConfig).unwrap();
        let back: EmptyConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, EmptyConfig);
    }
}
