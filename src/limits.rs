// Front-end safety limits
//
// Bounds the work a single source file can cause:
// - Oversized inputs and token streams
// - Runaway identifiers, strings and comments
// - Deeply nested expressions, long operator chains and statement blocks
//
// Defaults are permissive; a project's jass.toml can override any of them.

use serde::Deserialize;

use crate::config::ConfigError;

/// Front-end safety limits with permissive defaults
#[derive(Debug, Clone, PartialEq)]
pub struct CompilerLimits {
    // Lexer limits
    pub max_input_size: usize,        // Maximum source file size in bytes
    pub max_token_count: usize,       // Maximum number of tokens per file
    pub max_identifier_length: usize, // Maximum identifier length in bytes
    pub max_string_length: usize,     // Maximum string literal length in bytes
    pub max_comment_length: usize,    // Maximum comment length in bytes

    // Parser limits
    // Maximum nesting of expressions and blocks. Binary operators nest to
    // the right, so each operator of a chain like `a + b + c` is one level.
    pub max_expr_depth: usize,
}

// war3map.j files of large melee/custom maps run to a few MB
impl Default for CompilerLimits {
    fn default() -> Self {
        Self {
            max_input_size: 32_000_000,   // 32 MB
            max_token_count: 4_000_000,   // 4M tokens
            max_identifier_length: 1_000, // 1k bytes
            max_string_length: 1_000_000, // 1 MB
            max_comment_length: 100_000,  // 100k bytes
            max_expr_depth: 256,
        }
    }
}

impl CompilerLimits {
    /// Create with default limits
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply the values present in a `[limits]` table, keeping defaults for the rest
    pub(crate) fn merge(&mut self, overrides: &LimitsConfig) {
        if let Some(v) = overrides.max_input_size {
            self.max_input_size = v;
        }
        if let Some(v) = overrides.max_token_count {
            self.max_token_count = v;
        }
        if let Some(v) = overrides.max_identifier_length {
            self.max_identifier_length = v;
        }
        if let Some(v) = overrides.max_string_length {
            self.max_string_length = v;
        }
        if let Some(v) = overrides.max_comment_length {
            self.max_comment_length = v;
        }
        if let Some(v) = overrides.max_expr_depth {
            self.max_expr_depth = v;
        }
    }

    /// Validate that all limits are reasonable (positive, not absurdly large)
    pub fn validate(&self) -> Result<(), ConfigError> {
        const MAX_REASONABLE: usize = 256_000_000; // 256 MB

        if self.max_input_size == 0 || self.max_input_size > MAX_REASONABLE {
            return Err(ConfigError::invalid("max_input_size", self.max_input_size));
        }

        if self.max_token_count == 0 {
            return Err(ConfigError::invalid("max_token_count", self.max_token_count));
        }

        if self.max_identifier_length == 0 || self.max_identifier_length > 100_000 {
            return Err(ConfigError::invalid(
                "max_identifier_length",
                self.max_identifier_length,
            ));
        }

        if self.max_string_length == 0 || self.max_string_length > MAX_REASONABLE {
            return Err(ConfigError::invalid(
                "max_string_length",
                self.max_string_length,
            ));
        }

        if self.max_comment_length == 0 || self.max_comment_length > MAX_REASONABLE {
            return Err(ConfigError::invalid(
                "max_comment_length",
                self.max_comment_length,
            ));
        }

        if self.max_expr_depth == 0 || self.max_expr_depth > 10_000 {
            return Err(ConfigError::invalid("max_expr_depth", self.max_expr_depth));
        }

        Ok(())
    }
}

/// `[limits]` table of jass.toml
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct LimitsConfig {
    max_input_size: Option<usize>,
    max_token_count: Option<usize>,
    max_identifier_length: Option<usize>,
    max_string_length: Option<usize>,
    max_comment_length: Option<usize>,
    max_expr_depth: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_limits_are_reasonable() {
        let limits = CompilerLimits::default();
        assert!(limits.validate().is_ok());
    }

    #[test]
    fn test_default_values() {
        let limits = CompilerLimits::default();
        assert_eq!(limits.max_input_size, 32_000_000);
        assert_eq!(limits.max_token_count, 4_000_000);
        assert_eq!(limits.max_identifier_length, 1_000);
        assert_eq!(limits.max_string_length, 1_000_000);
        assert_eq!(limits.max_comment_length, 100_000);
        assert_eq!(limits.max_expr_depth, 256);
    }

    #[test]
    fn test_validation_catches_zero_values() {
        let mut limits = CompilerLimits::default();
        limits.max_input_size = 0;
        assert!(limits.validate().is_err());

        limits = CompilerLimits::default();
        limits.max_token_count = 0;
        assert!(limits.validate().is_err());

        limits = CompilerLimits::default();
        limits.max_identifier_length = 0;
        assert!(limits.validate().is_err());
    }

    #[test]
    fn test_validation_catches_too_large_values() {
        let mut limits = CompilerLimits::default();
        limits.max_input_size = 300_000_000;
        assert!(limits.validate().is_err());

        limits = CompilerLimits::default();
        limits.max_expr_depth = 20_000;
        assert!(limits.validate().is_err());
    }

    #[test]
    fn test_merge_only_overrides_present_values() {
        let overrides: LimitsConfig = toml::from_str("max_expr_depth = 12").unwrap();
        let mut limits = CompilerLimits::default();
        limits.merge(&overrides);

        assert_eq!(limits.max_expr_depth, 12);
        assert_eq!(limits.max_token_count, 4_000_000);
    }
}
