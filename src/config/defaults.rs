//! Default configuration values

/// Name of the configuration file in every layer directory
pub const CONFIG_FILE_NAME: &str = "fleetkit.yaml";

/// Marker file describing a scaffolding template
pub const TEMPLATE_INFO_FILE: &str = ".template-info.yaml";

/// Subdirectory of a layer directory holding scaffolding templates
pub const TEMPLATES_SUBDIR: &str = "templates";

/// System-wide configuration directory
pub const SYSTEM_CONFIG_DIR: &str = "/etc/fleetkit";
