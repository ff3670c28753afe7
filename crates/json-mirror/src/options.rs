use serde::Deserialize;

use crate::error::TreeError;

/// Tree behavior switches.
///
/// ```
/// use json_mirror::TreeOptions;
///
/// let options = TreeOptions::from_toml_str("publish_changes = true").unwrap();
/// assert!(options.publish_changes);
/// assert!(!TreeOptions::default().publish_changes);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TreeOptions {
    /// Publish `Changed` when a scalar overwrites an existing value.
    /// Off by default: overwrites are silent.
    pub publish_changes: bool,
}

impl TreeOptions {
    pub fn from_toml_str(input: &str) -> Result<Self, TreeError> {
        toml::from_str(input).map_err(|e| TreeError::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        assert_eq!(TreeOptions::from_toml_str("").unwrap(), TreeOptions::default());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = TreeOptions::from_toml_str("publish = true").unwrap_err();
        assert!(matches!(err, TreeError::Config(_)));
    }
}
