//! Error types for fleetkit
//!
//! Domain-specific error types using thiserror.

use std::path::PathBuf;
use thiserror::Error;

/// Path resolution errors raised while reading or writing a document field
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FieldError {
    /// A path segment does not match the shape of the node it addresses
    #[error("invalid field '{segment}' in '{path}'")]
    InvalidField { path: String, segment: String },

    /// A list index is past the end of the list
    #[error("index {index} out of range for '{path}' (length {len})")]
    IndexOutOfRange {
        path: String,
        index: usize,
        len: usize,
    },

    /// The raw input cannot be decoded into the shape of the target node
    #[error("cannot assign value to '{path}': {error}")]
    TypeMismatch { path: String, error: String },

    /// Append attempted on something other than a dictionary or list
    #[error("cannot append to {shape} '{path}'")]
    UnsupportedAppend { path: String, shape: String },

    /// A node could not be converted to its canonical tree
    #[error("cannot encode '{path}': {error}")]
    Encode { path: String, error: String },
}

/// Filesystem errors
#[derive(Error, Debug)]
pub enum FilesystemError {
    /// Failed to create directory
    #[error("Failed to create directory '{path}': {error}")]
    CreateDir { path: PathBuf, error: String },

    /// Failed to read file
    #[error("Failed to read file '{path}': {error}")]
    ReadFile { path: PathBuf, error: String },

    /// Failed to write file
    #[error("Failed to write file '{path}': {error}")]
    WriteFile { path: PathBuf, error: String },

    /// Failed to copy file
    #[error("Failed to copy '{src}' to '{dest}': {error}")]
    CopyFile {
        src: PathBuf,
        dest: PathBuf,
        error: String,
    },

    /// Failed to walk a directory tree
    #[error("Failed to walk '{path}': {error}")]
    Walk { path: PathBuf, error: String },
}

/// Configuration layer errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Layer file absent
    #[error("Configuration file not found: {path}")]
    NotFound { path: PathBuf },

    /// Layer file present but not a valid document (includes unknown fields)
    #[error("Failed to parse '{path}': {error}")]
    Parse { path: PathBuf, error: String },

    /// Filesystem error while reading or writing a layer
    #[error(transparent)]
    Filesystem(#[from] FilesystemError),

    /// Command requires a project but none was found
    #[error("No project found in '{path}' or any parent directory. Run 'fleetkit create' to start one.")]
    NoProjectContext { path: PathBuf },

    /// `exec` named a device missing from `devices`
    #[error("Device '{name}' not found")]
    UnknownDevice { name: String },

    /// Override not in `key=value` form
    #[error("Invalid override '{input}': expected key=value")]
    InvalidOverride { input: String },

    /// Field resolution error while applying a layer or override
    #[error(transparent)]
    Field(#[from] FieldError),
}

/// Template discovery and rendering errors
#[derive(Error, Debug)]
pub enum TemplateError {
    /// No template with the requested name was discovered
    #[error("Template '{name}' not found")]
    NotFound { name: String },

    /// A template names a base that does not exist
    #[error("Template '{template}' extends unknown base template '{name}'")]
    BaseTemplateNotFound { template: String, name: String },

    /// Base templates form a cycle
    #[error("Circular template dependency: {chain}")]
    CircularTemplateDependency { chain: String },

    /// Template text could not be parsed
    #[error("Template '{name}' line {line}: {message}")]
    Syntax {
        name: String,
        line: usize,
        message: String,
    },

    /// Template evaluation failed (missing keys included)
    #[error("Failed to render '{name}': {message}")]
    Render { name: String, message: String },

    /// Marker file present but invalid
    #[error("Invalid template info '{path}': {error}")]
    InfoParse { path: PathBuf, error: String },

    /// Filesystem error while reading templates or writing output
    #[error(transparent)]
    Filesystem(#[from] FilesystemError),
}

/// Expression evaluation errors
#[derive(Error, Debug)]
pub enum ExpressionError {
    /// A `${...}` marker names a path that does not resolve
    #[error("Cannot resolve '${{{expression}}}': {source}")]
    Unresolved {
        expression: String,
        #[source]
        source: FieldError,
    },
}

/// Sequence execution errors
#[derive(Error, Debug)]
pub enum SequenceError {
    /// A referenced sequence does not exist
    #[error("Sequence '{name}' not found")]
    SequenceNotFound { name: String },

    /// Sequences reference each other in a loop
    #[error("Circular sequence reference: {cycle}")]
    CircularSequenceReference { cycle: String },

    /// The transport reported a failure
    #[error("Command '{cmd}' failed: {error}")]
    CommandFailed { cmd: String, error: String },

    /// The command ran but its output differs from the expected one
    #[error("Command '{cmd}' validation failed; expected output '{expected}', actual '{actual}'")]
    OutputMismatch {
        cmd: String,
        expected: String,
        actual: String,
    },

    /// A step's command or expected output could not be rendered
    #[error("Sequence '{sequence}' step {step}: {source}")]
    Render {
        sequence: String,
        step: usize,
        #[source]
        source: TemplateError,
    },
}

impl SequenceError {
    /// Whether another attempt of the same step could succeed
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            Self::SequenceNotFound { .. } | Self::CircularSequenceReference { .. }
        )
    }
}

/// Option validation errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OptionError {
    /// Invalid option type
    #[error("Option '{name}' has invalid type: expected {expected}, got {got}")]
    InvalidType {
        name: String,
        expected: String,
        got: String,
    },

    /// Invalid choice value
    #[error("Option '{name}' has invalid value '{value}': must be one of {choices:?}")]
    InvalidChoice {
        name: String,
        value: String,
        choices: Vec<String>,
    },

    /// Choice option declared without values
    #[error("Option '{name}' is a choice without values")]
    EmptyChoices { name: String },
}

/// Application settings validation errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Mandatory field left empty
    #[error("Application field 'app.{field}' is required")]
    MissingField { field: String },

    /// Application name is not a single token
    #[error("Invalid application name '{name}': must not contain whitespace")]
    InvalidName { name: String },

    /// Version is not semantic
    #[error("Invalid application version '{version}': {error}")]
    InvalidVersion { version: String, error: String },

    /// `app.lang` names no known template
    #[error("Unsupported language '{lang}'; available: {available:?}")]
    UnknownLanguage {
        lang: String,
        available: Vec<String>,
    },

    /// Option failed validation
    #[error(transparent)]
    Option(#[from] OptionError),
}

/// Top-level fleetkit error type
#[derive(Error, Debug)]
pub enum FleetkitError {
    /// Field error
    #[error("Field error: {0}")]
    Field(#[from] FieldError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Template error
    #[error("Template error: {0}")]
    Template(#[from] TemplateError),

    /// Expression error
    #[error("Expression error: {0}")]
    Expression(#[from] ExpressionError),

    /// Sequence error
    #[error("Sequence error: {0}")]
    Sequence(#[from] SequenceError),

    /// Application error
    #[error("Application error: {0}")]
    App(#[from] AppError),
}
