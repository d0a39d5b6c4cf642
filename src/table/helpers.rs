/// Retry timing for partially applied batches
pub(crate) mod retry_config {
    use std::time::Duration;

    /// Calculate retry delay with exponential backoff
    ///
    /// # Arguments
    /// * `attempt` - The retry attempt number (0-based)
    /// * `initial` - Initial delay duration
    /// * `max` - Optional maximum delay duration
    ///
    /// # Returns
    /// Duration to wait before retrying: `initial * 2^attempt`, saturating,
    /// and capped at `max` when one is configured.
    pub(crate) fn retry_delay(attempt: u32, initial: Duration, max: Option<Duration>) -> Duration {
        let delay = 2u32
            .checked_pow(attempt)
            .map_or(Duration::MAX, |factor| initial.saturating_mul(factor));

        match max {
            Some(max) => delay.min(max),
            None => delay,
        }
    }
}

/// Expression builders for scan requests
pub(crate) mod expressions {
    use std::collections::HashMap;

    use crate::table::KeySchema;

    /// Builds a projection expression over placeholder attribute names
    ///
    /// Placeholders keep key names that collide with DynamoDB reserved words
    /// (`name`, `key`, `date`, ...) usable in the expression.
    pub(crate) struct ProjectionBuilder {
        expression: Vec<String>,
        names: HashMap<String, String>,
    }

    impl ProjectionBuilder {
        pub(crate) fn new() -> Self {
            Self {
                expression: Vec::new(),
                names: HashMap::new(),
            }
        }

        pub(crate) fn with_attribute(mut self, name: &str) -> Self {
            let placeholder = format!("#k{}", self.expression.len());
            let _ = self.names.insert(placeholder.clone(), name.to_string());
            self.expression.push(placeholder);
            self
        }

        pub(crate) fn with_key_schema(self, key_schema: &KeySchema) -> Self {
            key_schema
                .attribute_names()
                .fold(self, |builder, name| builder.with_attribute(name))
        }

        pub(crate) fn build(self) -> (String, HashMap<String, String>) {
            (self.expression.join(", "), self.names)
        }
    }
}
