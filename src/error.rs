//! Error handling for ReplayKit
//!
//! This module defines custom error types and a Result alias for use
//! throughout the recorder and replay engine.

use thiserror::Error;

/// Main error type for ReplayKit operations
#[derive(Error, Debug)]
pub enum ReplayKitError {
    /// Screen grabbing failed
    #[error("Capture error: {0}")]
    Capture(String),

    /// Video sink could not be opened, written or finalized
    #[error("Video sink error: {0}")]
    VideoSink(String),

    /// Input listener could not be started
    #[error("Listener error: {0}")]
    Listener(String),

    /// Input injection call failed during replay
    #[error("Injection error: {0}")]
    Injection(String),

    /// Event log could not be parsed or is malformed
    #[error("Event log error: {0}")]
    EventLog(String),

    /// Recording artifact (directory, manifest) problems
    #[error("Artifact error: {0}")]
    Artifact(String),

    /// Errors related to configuration loading/saving
    #[error("Configuration error: {0}")]
    Config(String),

    /// Errors related to channel communication
    #[error("Channel error: {0}")]
    Channel(String),

    /// Timeout errors
    #[error("Timeout: {0}")]
    Timeout(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<ReplayKitError>,
    },
}

impl ReplayKitError {
    /// Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        ReplayKitError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }
}

impl From<serde_json::Error> for ReplayKitError {
    fn from(err: serde_json::Error) -> Self {
        ReplayKitError::Serialization(err.to_string())
    }
}

/// Result type alias for ReplayKit operations
pub type Result<T> = std::result::Result<T, ReplayKitError>;

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error result
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context lazily to an error result
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.with_context(f()))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, std::io::Error> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| ReplayKitError::from(e).with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| ReplayKitError::from(e).with_context(f()))
    }
}
