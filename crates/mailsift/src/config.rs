//! Parser configuration.

/// Default limit on nested multipart containers.
pub const DEFAULT_MAX_DEPTH: usize = 32;

/// Options controlling a parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    /// Maximum nesting of multipart containers below the message root.
    pub max_depth: usize,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl ParseOptions {
    /// Creates the default options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an options builder.
    #[must_use]
    pub fn builder() -> ParseOptionsBuilder {
        ParseOptionsBuilder::default()
    }
}

/// Builder for [`ParseOptions`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ParseOptionsBuilder {
    max_depth: Option<usize>,
}

impl ParseOptionsBuilder {
    /// Sets the maximum container nesting depth.
    #[must_use]
    pub const fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    /// Builds the options.
    #[must_use]
    pub fn build(self) -> ParseOptions {
        ParseOptions {
            max_depth: self.max_depth.unwrap_or(DEFAULT_MAX_DEPTH),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        assert_eq!(ParseOptions::new().max_depth, DEFAULT_MAX_DEPTH);
        assert_eq!(ParseOptions::builder().build(), ParseOptions::default());
    }

    #[test]
    fn test_builder_max_depth() {
        let options = ParseOptions::builder().max_depth(4).build();
        assert_eq!(options.max_depth, 4);
    }
}
