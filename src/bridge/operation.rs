//! The shared operation table.
//!
//! Both the gateway and the renderer contract read channel names, arities
//! and fallbacks from [`OPERATIONS`]; no channel literal appears anywhere
//! else. Renaming a channel is a breaking change to the wire contract.

use crate::capability::BUILD_HINT;
use crate::persistence::{EMPTY_DOCUMENT, UNKNOWN_PATH};
use crate::value::BridgeValue;
use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Fallback greeting returned when the native backend is absent
pub static HELLO_FALLBACK: Lazy<String> =
    Lazy::new(|| format!("Native backend not loaded - build with \"{}\"", BUILD_HINT));

/// Bridge operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Greeting from the native side
    Hello,
    /// Add two numbers natively
    Add,
    /// Read the config document
    LoadConfig,
    /// Persist the config document
    SaveConfig,
    /// Resolve the config document location
    GetConfigPath,
}

/// Static description of one operation
#[derive(Debug, Clone, Copy)]
pub struct OperationSpec {
    /// The operation
    pub operation: Operation,
    /// Wire-level channel name
    pub channel: &'static str,
    /// Function name visible to the renderer
    pub exposed_as: &'static str,
    /// Positional argument count
    pub arity: usize,
}

/// Every operation the bridge serves, in registration order
pub const OPERATIONS: [OperationSpec; 5] = [
    OperationSpec {
        operation: Operation::Hello,
        channel: "rust-hello",
        exposed_as: "rustHello",
        arity: 0,
    },
    OperationSpec {
        operation: Operation::Add,
        channel: "rust-add",
        exposed_as: "rustAdd",
        arity: 2,
    },
    OperationSpec {
        operation: Operation::LoadConfig,
        channel: "load-config",
        exposed_as: "loadConfig",
        arity: 0,
    },
    OperationSpec {
        operation: Operation::SaveConfig,
        channel: "save-config",
        exposed_as: "saveConfig",
        arity: 1,
    },
    OperationSpec {
        operation: Operation::GetConfigPath,
        channel: "get-config-path",
        exposed_as: "getConfigPath",
        arity: 0,
    },
];

static BY_CHANNEL: Lazy<HashMap<&'static str, Operation>> = Lazy::new(|| {
    OPERATIONS
        .iter()
        .map(|spec| (spec.channel, spec.operation))
        .collect()
});

impl Operation {
    /// Look up an operation by wire channel name
    pub fn from_channel(channel: &str) -> Option<Self> {
        BY_CHANNEL.get(channel).copied()
    }

    /// The table row for this operation
    pub fn spec(self) -> &'static OperationSpec {
        // Rows are listed in declaration order.
        &OPERATIONS[self as usize]
    }

    /// Wire channel name
    pub fn channel(self) -> &'static str {
        self.spec().channel
    }

    /// Renderer-visible function name
    pub fn exposed_as(self) -> &'static str {
        self.spec().exposed_as
    }

    /// Value resolved when the native backend is absent
    pub fn fallback(self) -> BridgeValue {
        match self {
            Operation::Hello => BridgeValue::String(HELLO_FALLBACK.clone()),
            Operation::Add => BridgeValue::Null,
            Operation::LoadConfig => BridgeValue::from(EMPTY_DOCUMENT),
            Operation::SaveConfig => BridgeValue::Bool(false),
            Operation::GetConfigPath => BridgeValue::from(UNKNOWN_PATH),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_table_order_matches_enum() {
        for (index, spec) in OPERATIONS.iter().enumerate() {
            assert_eq!(spec.operation as usize, index);
            assert_eq!(spec.operation.spec().channel, spec.channel);
        }
    }

    #[test]
    fn test_channel_names_are_stable() {
        let channels: Vec<_> = OPERATIONS.iter().map(|s| s.channel).collect();
        assert_eq!(
            channels,
            ["rust-hello", "rust-add", "load-config", "save-config", "get-config-path"]
        );
    }

    #[test]
    fn test_names_are_unique() {
        let channels: HashSet<_> = OPERATIONS.iter().map(|s| s.channel).collect();
        let exposed: HashSet<_> = OPERATIONS.iter().map(|s| s.exposed_as).collect();
        assert_eq!(channels.len(), OPERATIONS.len());
        assert_eq!(exposed.len(), OPERATIONS.len());
    }

    #[test]
    fn test_from_channel() {
        assert_eq!(Operation::from_channel("rust-add"), Some(Operation::Add));
        assert_eq!(Operation::from_channel("rustAdd"), None);
        assert_eq!(Operation::from_channel("shell-exec"), None);
    }

    #[test]
    fn test_fallbacks() {
        assert_eq!(Operation::Add.fallback(), BridgeValue::Null);
        assert_eq!(Operation::LoadConfig.fallback(), BridgeValue::from("{}"));
        assert_eq!(Operation::SaveConfig.fallback(), BridgeValue::Bool(false));
        assert_eq!(Operation::GetConfigPath.fallback(), BridgeValue::from("unknown"));

        let hello = Operation::Hello.fallback();
        let text = hello.as_str().unwrap();
        assert!(text.starts_with("Native backend not loaded - build with"));
        assert!(text.contains(BUILD_HINT));
    }
}
