//! Configuration layers
//!
//! The effective configuration is built from three files, each overlaid on
//! the result of the previous ones:
//!
//! 1. system: `/etc/fleetkit/fleetkit.yaml`
//! 2. user: `~/.config/fleetkit/fleetkit.yaml`
//! 3. project: the nearest `fleetkit.yaml` above the working directory
//!
//! A layer is saved as its difference from the layers below it, so values
//! stay with the layer that set them.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde_yaml::{Mapping, Value};
use tracing::debug;

use crate::config::defaults::CONFIG_FILE_NAME;
use crate::core::app;
use crate::core::delta;
use crate::core::document::Document;
use crate::core::expression;
use crate::core::node;
use crate::core::template::{regen, TemplateCatalog};
use crate::error::{ConfigError, FieldError, FleetkitError, TemplateError};
use crate::infra::dirs::FleetkitDirs;
use crate::infra::filesystem;

/// Deployment stage exposed to templates and sequences as `stage`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Stage {
    #[default]
    Dev,
    Staging,
    Prod,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Dev => "dev",
            Self::Staging => "staging",
            Self::Prod => "prod",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Read one layer file
///
/// Returns `None` when the file does not exist. The file is checked against
/// the document schema; the raw tree is returned so that explicit values
/// equal to defaults still override lower layers.
pub fn read_layer(path: &Path) -> Result<Option<Value>, ConfigError> {
    let Some(content) = filesystem::read_optional(path)? else {
        debug!("No configuration at {}", path.display());
        return Ok(None);
    };
    let parse_error = |e: serde_yaml::Error| ConfigError::Parse {
        path: path.to_path_buf(),
        error: e.to_string(),
    };
    Document::from_yaml(&content).map_err(parse_error)?;
    let tree: Value = serde_yaml::from_str(&content).map_err(parse_error)?;
    debug!("Loaded configuration from {}", path.display());
    if tree.is_null() {
        return Ok(Some(Value::Mapping(serde_yaml::Mapping::new())));
    }
    Ok(Some(tree))
}

/// Write `layer` to `path` as its difference from `parent`
pub fn write_layer(path: &Path, layer: &Document, parent: &Document) -> Result<(), ConfigError> {
    let delta =
        delta::diff_layer(&parent.to_canonical()?, layer).map_err(|error| FieldError::Encode {
            path: String::new(),
            error,
        })?;
    let content = if delta::is_empty(&delta) {
        String::new()
    } else {
        serde_yaml::to_string(&delta).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?
    };
    filesystem::write_file(path, &content)?;
    debug!("Wrote configuration delta to {}", path.display());
    Ok(())
}

/// Nearest directory at or above `start` holding a configuration file
pub fn find_project_root(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(CONFIG_FILE_NAME).is_file())
        .map(Path::to_path_buf)
}

/// The loaded configuration cascade of one invocation
#[derive(Debug)]
pub struct Workspace {
    dirs: FleetkitDirs,
    cwd: PathBuf,
    /// System layer alone
    system: Document,
    /// System and user layers
    global: Document,
    /// All layers plus command-line overrides
    pub config: Document,
    project_root: Option<PathBuf>,
    catalog: Option<TemplateCatalog>,
}

impl Workspace {
    /// Load all layers
    ///
    /// With `project_root`, that directory must hold a configuration file.
    /// Otherwise the project is searched upward from `cwd`, and finding
    /// none leaves the workspace without project context.
    pub fn load(dirs: FleetkitDirs, project_root: Option<&Path>, cwd: &Path) -> Result<Self, ConfigError> {
        let mut config = Document::default();

        if let Some(tree) = read_layer(&dirs.system_config_path())? {
            config.overlay(&tree)?;
        }
        let system = config.clone();

        if let Some(tree) = read_layer(&dirs.user_config_path())? {
            config.overlay(&tree)?;
        }
        let global = config.clone();

        let project_root = match project_root {
            Some(root) => {
                let path = root.join(CONFIG_FILE_NAME);
                let tree = read_layer(&path)?.ok_or(ConfigError::NotFound { path })?;
                config.overlay(&tree)?;
                Some(root.to_path_buf())
            }
            None => match find_project_root(cwd) {
                Some(root) => {
                    if let Some(tree) = read_layer(&root.join(CONFIG_FILE_NAME))? {
                        config.overlay(&tree)?;
                    }
                    Some(root)
                }
                None => None,
            },
        };
        if let Some(root) = &project_root {
            debug!("Project root: {}", root.display());
        }

        Ok(Self {
            dirs,
            cwd: cwd.to_path_buf(),
            system,
            global,
            config,
            project_root,
            catalog: None,
        })
    }

    pub fn dirs(&self) -> &FleetkitDirs {
        &self.dirs
    }

    /// System and user layers, without the project
    pub fn global(&self) -> &Document {
        &self.global
    }

    pub fn global_mut(&mut self) -> &mut Document {
        &mut self.global
    }

    pub fn project_root(&self) -> Option<&Path> {
        self.project_root.as_deref()
    }

    /// Project root, or an error for commands that need one
    pub fn require_project_root(&self) -> Result<&Path, ConfigError> {
        self.project_root
            .as_deref()
            .ok_or_else(|| ConfigError::NoProjectContext {
                path: self.cwd.clone(),
            })
    }

    /// Apply `key=value` overrides to the effective configuration
    pub fn apply_overrides(&mut self, overrides: &[String]) -> Result<(), ConfigError> {
        for entry in overrides {
            let (key, value) = entry
                .split_once('=')
                .ok_or_else(|| ConfigError::InvalidOverride {
                    input: entry.clone(),
                })?;
            self.config.upsert_field(key.trim(), value)?;
            debug!("Override {} applied", key.trim());
        }
        Ok(())
    }

    /// Save the effective configuration as the project layer
    pub fn persist_project(&self) -> Result<PathBuf, ConfigError> {
        let path = self.require_project_root()?.join(CONFIG_FILE_NAME);
        write_layer(&path, &self.config, &self.global)?;
        Ok(path)
    }

    /// Save the global configuration as the user layer
    pub fn persist_global(&self) -> Result<PathBuf, ConfigError> {
        let path = self.dirs.user_config_path();
        write_layer(&path, &self.global, &self.system)?;
        Ok(path)
    }

    /// Templates from the system and user template directories
    pub fn catalog(&mut self) -> Result<&TemplateCatalog, TemplateError> {
        cached_catalog(&mut self.catalog, &self.dirs)
    }

    /// Validate `app` of the effective configuration against the templates
    pub fn validate_app(&mut self, require_complete: bool) -> Result<(), FleetkitError> {
        let catalog = cached_catalog(&mut self.catalog, &self.dirs)?;
        app::validate_app_settings(&mut self.config.app, catalog, require_complete)?;
        Ok(())
    }

    /// Rendering context: the canonical configuration plus `stage`
    pub fn context(&self, stage: Stage) -> Result<Value, FieldError> {
        let mut context = self.config.to_canonical()?;
        if let Value::Mapping(map) = &mut context {
            map.insert(
                Value::String("stage".to_string()),
                Value::String(stage.to_string()),
            );
        }
        Ok(context)
    }

    /// Context for running a sequence against `device`
    ///
    /// Adds `device` (the device record with its `name` and its `addr`
    /// evaluated through `${}` expressions) to [`Workspace::context`].
    pub fn device_context(&self, device: &str, stage: Stage) -> Result<Value, FleetkitError> {
        let record = self
            .config
            .devices
            .get(device)
            .ok_or_else(|| ConfigError::UnknownDevice {
                name: device.to_string(),
            })?;
        let mut context = self.context(stage)?;
        let addr = expression::evaluate(&record.addr, &context)?;

        let mut entry = match node::read(record, "")? {
            Value::Mapping(map) => map,
            _ => Mapping::new(),
        };
        entry.insert(Value::String("name".to_string()), Value::String(device.to_string()));
        entry.insert(Value::String("addr".to_string()), Value::String(addr));
        if let Value::Mapping(map) = &mut context {
            map.insert(Value::String("device".to_string()), Value::Mapping(entry));
        }
        Ok(context)
    }

    /// Scaffold a new project in `dest` from the `app.lang` template
    ///
    /// The destination becomes the project root; its configuration file
    /// receives the project layer and tracked files are regenerated.
    pub fn create(&mut self, dest: &Path, stage: Stage) -> Result<Vec<PathBuf>, FleetkitError> {
        self.validate_app(true)?;
        filesystem::create_dir_all(dest).map_err(ConfigError::from)?;

        let context = self.context(stage)?;
        let lang = self.config.app.lang.clone();
        let tracked: BTreeMap<String, String> =
            cached_catalog(&mut self.catalog, &self.dirs)?.render(&lang, dest, &context)?;
        self.config.templates.extend(tracked);

        self.project_root = Some(dest.to_path_buf());
        self.persist_project()?;
        self.regenerate(stage)
    }

    /// Re-render every tracked file of the project
    pub fn regenerate(&self, stage: Stage) -> Result<Vec<PathBuf>, FleetkitError> {
        let root = self.require_project_root()?;
        let context = self.context(stage)?;
        Ok(regen::regenerate(&self.config.templates, root, &context)?)
    }
}

fn cached_catalog<'a>(
    slot: &'a mut Option<TemplateCatalog>,
    dirs: &FleetkitDirs,
) -> Result<&'a TemplateCatalog, TemplateError> {
    if slot.is_none() {
        *slot = Some(TemplateCatalog::discover(&dirs.template_dirs())?);
    }
    Ok(slot.get_or_insert_with(TemplateCatalog::default))
}
