//! Execution context configuration

use serde::{Deserialize, Serialize};

/// Limits and behaviour switches for a [`Vm`](crate::Vm)
///
/// Every field has a default, so a config file only needs the keys it
/// changes.
///
/// # Examples
///
/// ```
/// use interpreter::VmConfig;
///
/// let config: VmConfig = serde_json::from_str(r#"{"max_depth": 64}"#).unwrap();
/// assert_eq!(config.max_depth, 64);
/// assert_eq!(config.temp_strings, 16);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VmConfig {
    /// Maximum number of active frames, the host's entry frame included
    pub max_depth: usize,
    /// Slots available for saving callee local windows
    pub local_stack_size: usize,
    /// Statement budget per host call; `None` disables the guard
    pub runaway_limit: Option<u64>,
    /// Size of the temporary string ring
    pub temp_strings: usize,
    /// Upper bound on entity records, world included
    pub max_entities: usize,
    /// Leading entity records never handed out by spawn
    pub reserved_entities: usize,
    /// Delay STATE adds to `time` when scheduling `nextthink`
    pub state_interval: f32,
    /// Reject ADDRESS on the world entity
    pub protect_world: bool,
}

impl Default for VmConfig {
    fn default() -> Self {
        Self {
            max_depth: 32,
            local_stack_size: 2048,
            runaway_limit: None,
            temp_strings: 16,
            max_entities: 1024,
            reserved_entities: 1,
            state_interval: 0.1,
            protect_world: false,
        }
    }
}

impl VmConfig {
    /// Set the call depth bound
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Set the local save stack size
    pub fn with_local_stack_size(mut self, slots: usize) -> Self {
        self.local_stack_size = slots;
        self
    }

    /// Enable the runaway guard
    pub fn with_runaway_limit(mut self, statements: u64) -> Self {
        self.runaway_limit = Some(statements);
        self
    }

    /// Set the temporary string ring size
    pub fn with_temp_strings(mut self, slots: usize) -> Self {
        self.temp_strings = slots;
        self
    }

    /// Set the entity bound
    pub fn with_max_entities(mut self, max_entities: usize) -> Self {
        self.max_entities = max_entities;
        self
    }

    /// Set the reserved entity prefix
    pub fn with_reserved_entities(mut self, reserved: usize) -> Self {
        self.reserved_entities = reserved;
        self
    }

    /// Set the STATE think interval
    pub fn with_state_interval(mut self, interval: f32) -> Self {
        self.state_interval = interval;
        self
    }

    /// Toggle world protection
    pub fn with_protect_world(mut self, protect: bool) -> Self {
        self.protect_world = protect;
        self
    }
}
