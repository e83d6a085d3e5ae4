use serde::{Deserialize, Serialize};

/// Total width of a library link placeholder in creation bytecode,
/// matching the width of a 20-byte hex address.
pub const PLACEHOLDER_WIDTH: usize = 40;

/// Longest library name a placeholder can carry before truncation.
pub const PLACEHOLDER_NAME_MAX: usize = 36;

/// A compiled contract unit as emitted by the build toolchain:
/// name, interface description, and creation bytecode.
///
/// Bytecode is a `0x`-prefixed hex string. Contracts that call into
/// not-yet-deployed libraries carry placeholders instead of addresses;
/// those must be resolved by link steps before deployment.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artifact {
    #[serde(rename = "contractName")]
    pub name: String,
    pub abi: serde_json::Value,
    pub bytecode: String,
}

impl Artifact {
    pub fn new(name: impl Into<String>, bytecode: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            abi: serde_json::Value::Array(Vec::new()),
            bytecode: bytecode.into(),
        }
    }

    /// The placeholder symbol standing in for this library's address:
    /// `__` + name, right-padded with `_` to 40 characters. Names longer
    /// than 36 characters are truncated, as the build toolchain does.
    pub fn placeholder(name: &str) -> String {
        let name: String = name.chars().take(PLACEHOLDER_NAME_MAX).collect();
        format!("__{name:_<width$}", width = PLACEHOLDER_WIDTH - 2)
    }

    /// True once no placeholder bytes remain in the bytecode.
    pub fn is_fully_linked(&self) -> bool {
        !self.bytecode.contains('_')
    }
}
