//! Configuration validation.

use crate::error::ConfigError;
use crate::schema::Config;

/// Smallest accepted read or handshake buffer.
const MIN_BUFFER_BYTES: usize = 512;

/// Tick intervals above this are accepted but reported.
const SLOW_TICK_MS: u64 = 1000;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Validation result.
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, warning: ValidationWarning) {
        self.warnings.push(warning);
    }

    /// Convert into a hard failure on the first error, keeping warnings otherwise.
    pub fn into_result(self) -> Result<Vec<ValidationWarning>, ConfigError> {
        match self.errors.into_iter().next() {
            Some(first) => Err(ConfigError::InvalidValue {
                field: first.path,
                message: first.message,
            }),
            None => Ok(self.warnings),
        }
    }
}

/// A validation error.
#[derive(Debug)]
pub struct ValidationError {
    pub path: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// A validation warning.
#[derive(Debug)]
pub struct ValidationWarning {
    pub path: String,
    pub message: String,
}

impl ValidationWarning {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Configuration validator.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the configuration.
    pub fn validate(config: &Config) -> Result<ValidationResult, ConfigError> {
        let mut result = ValidationResult::default();

        Self::validate_server(config, &mut result);
        Self::validate_connection(config, &mut result);
        Self::validate_dispatch(config, &mut result);
        Self::validate_shutdown(config, &mut result);
        Self::validate_logging(config, &mut result);

        Ok(result)
    }

    fn validate_server(config: &Config, result: &mut ValidationResult) {
        if config.server.port == 0 {
            result.add_error(ValidationError::new("server.port", "Port cannot be 0"));
        }

        if config.server.host.is_empty() {
            result.add_error(ValidationError::new("server.host", "Host cannot be empty"));
        }
    }

    fn validate_connection(config: &Config, result: &mut ValidationResult) {
        if config.connection.read_buffer_size < MIN_BUFFER_BYTES {
            result.add_error(ValidationError::new(
                "connection.read_buffer_size",
                format!("read_buffer_size must be at least {MIN_BUFFER_BYTES} bytes"),
            ));
        }

        if config.connection.max_handshake_bytes < MIN_BUFFER_BYTES {
            result.add_error(ValidationError::new(
                "connection.max_handshake_bytes",
                format!("max_handshake_bytes must be at least {MIN_BUFFER_BYTES} bytes"),
            ));
        }
    }

    fn validate_dispatch(config: &Config, result: &mut ValidationResult) {
        if config.dispatch.max_pending == 0 {
            result.add_error(ValidationError::new(
                "dispatch.max_pending",
                "max_pending must be greater than 0",
            ));
        }

        if config.dispatch.tick_interval_ms == 0 {
            result.add_error(ValidationError::new(
                "dispatch.tick_interval_ms",
                "tick_interval_ms must be greater than 0",
            ));
        } else if config.dispatch.tick_interval_ms > SLOW_TICK_MS {
            result.add_warning(ValidationWarning::new(
                "dispatch.tick_interval_ms",
                "tick_interval_ms is very high (>1000), requests will wait at least that long",
            ));
        }
    }

    fn validate_shutdown(config: &Config, result: &mut ValidationResult) {
        if config.shutdown.join_timeout_ms == 0 {
            result.add_error(ValidationError::new(
                "shutdown.join_timeout_ms",
                "join_timeout_ms must be greater than 0",
            ));
        }
    }

    fn validate_logging(config: &Config, result: &mut ValidationResult) {
        let level = config.logging.level.to_ascii_lowercase();
        if !LOG_LEVELS.contains(&level.as_str()) {
            result.add_error(ValidationError::new(
                "logging.level",
                format!(
                    "Unknown log level '{}', expected one of: {}",
                    config.logging.level,
                    LOG_LEVELS.join(", ")
                ),
            ));
        }
    }
}

#[cfg(test)]
#[path = "validator_tests.rs"]
mod tests;
