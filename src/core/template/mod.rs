//! Scaffolding templates
//!
//! A template is a directory tree marked by a `.template-info.yaml` file.
//! Every file path and file body in the tree is rendered through
//! [`engine`] against the configuration context. A path that renders to an
//! empty segment (`{{ if .app.options.docs }}docs{{ end }}/index.md` with the
//! option off) drops the file, which is how templates express optional
//! subtrees.
//!
//! Files listed under `regenFiles` are copied verbatim on creation and
//! re-rendered by [`regen`] whenever the configuration changes.

pub mod engine;
pub mod regen;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use tracing::debug;
use walkdir::WalkDir;

use crate::config::defaults::TEMPLATE_INFO_FILE;
use crate::error::{FilesystemError, TemplateError};
use crate::infra::filesystem;

/// Kind of a template option
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionKind {
    Boolean,
    Text,
    Choice,
}

/// A custom option declared by a template, stored under `app.options`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TemplateOption {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type")]
    pub kind: OptionKind,
    #[serde(default)]
    pub default: Value,
    /// Allowed values of a `choice` option
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<String>,
}

/// Packages a template needs to build and run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TemplateDependencies {
    pub compile: Vec<String>,
    pub runtime: Vec<String>,
}

/// Contents of a template marker file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "camelCase")]
pub struct TemplateInfo {
    pub name: String,
    pub description: String,
    pub dependencies: TemplateDependencies,
    pub options: Vec<TemplateOption>,
    /// Template-relative source path to project-relative destination path
    pub regen_files: BTreeMap<String, String>,
    /// Template rendered into the destination before this one
    pub base: Option<String>,
    /// Template root directory
    #[serde(skip)]
    pub path: PathBuf,
}

impl TemplateInfo {
    /// Read a marker file; the template root is the marker's directory
    pub fn load(marker: &Path) -> Result<Self, TemplateError> {
        let content = filesystem::read_file(marker)?;
        let mut info: Self =
            serde_yaml::from_str(&content).map_err(|e| TemplateError::InfoParse {
                path: marker.to_path_buf(),
                error: e.to_string(),
            })?;
        info.path = marker.parent().map(Path::to_path_buf).unwrap_or_default();
        Ok(info)
    }

    /// Declared option by name
    pub fn option(&self, name: &str) -> Option<&TemplateOption> {
        self.options.iter().find(|option| option.name == name)
    }
}

/// Templates available to this invocation, by name
///
/// Names come from the directory holding the marker file, not from the
/// marker's `name` field.
#[derive(Debug, Clone, Default)]
pub struct TemplateCatalog {
    templates: BTreeMap<String, TemplateInfo>,
}

impl TemplateCatalog {
    /// Scan directories for marker files; later directories win on name clashes
    ///
    /// Directories that do not exist are skipped. The scan does not descend
    /// into a template, so marker files among its contents are plain files.
    pub fn discover(dirs: &[PathBuf]) -> Result<Self, TemplateError> {
        let mut templates = BTreeMap::new();
        for dir in dirs {
            if !dir.is_dir() {
                debug!("Template directory {} not present", dir.display());
                continue;
            }
            let walker = WalkDir::new(dir)
                .sort_by_file_name()
                .into_iter()
                .filter_entry(|entry| {
                    entry.depth() == 0
                        || entry.file_name() == TEMPLATE_INFO_FILE
                        || !entry
                            .path()
                            .parent()
                            .is_some_and(|parent| parent.join(TEMPLATE_INFO_FILE).is_file())
                });
            for entry in walker {
                let entry = entry.map_err(|e| FilesystemError::Walk {
                    path: dir.clone(),
                    error: e.to_string(),
                })?;
                if entry.file_name() != TEMPLATE_INFO_FILE {
                    continue;
                }
                let info = TemplateInfo::load(entry.path())?;
                let Some(name) = info.path.file_name().map(|n| n.to_string_lossy().into_owned()) else {
                    continue;
                };
                debug!("Found template '{}' in {}", name, info.path.display());
                templates.insert(name, info);
            }
        }
        Ok(Self { templates })
    }

    /// Look up a template by name
    pub fn get(&self, name: &str) -> Result<&TemplateInfo, TemplateError> {
        self.templates.get(name).ok_or_else(|| TemplateError::NotFound {
            name: name.to_string(),
        })
    }

    /// All template names, sorted
    pub fn names(&self) -> Vec<String> {
        self.templates.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &TemplateInfo)> {
        self.templates.iter()
    }

    /// Render `name` (and its bases) into `dest`
    ///
    /// Returns the regen mappings of every rendered template, base first.
    pub fn render(
        &self,
        name: &str,
        dest: &Path,
        context: &Value,
    ) -> Result<BTreeMap<String, String>, TemplateError> {
        let mut chain = Vec::new();
        let mut regen = BTreeMap::new();
        self.render_chain(name, dest, context, &mut chain, &mut regen)?;
        Ok(regen)
    }

    fn render_chain(
        &self,
        name: &str,
        dest: &Path,
        context: &Value,
        chain: &mut Vec<String>,
        regen: &mut BTreeMap<String, String>,
    ) -> Result<(), TemplateError> {
        if chain.iter().any(|seen| seen == name) {
            chain.push(name.to_string());
            return Err(TemplateError::CircularTemplateDependency {
                chain: chain.join(" -> "),
            });
        }
        let info = self.get(name)?;
        chain.push(name.to_string());

        if let Some(base) = &info.base {
            if !self.templates.contains_key(base) {
                return Err(TemplateError::BaseTemplateNotFound {
                    template: name.to_string(),
                    name: base.clone(),
                });
            }
            self.render_chain(base, dest, context, chain, regen)?;
        }

        render(info, dest, context)?;
        regen.extend(info.regen_files.clone());
        Ok(())
    }
}

/// Render one template tree into `dest`, ignoring its base
pub fn render(info: &TemplateInfo, dest: &Path, context: &Value) -> Result<(), TemplateError> {
    debug!("Rendering template {} into {}", info.path.display(), dest.display());
    for relative in filesystem::list_files(&info.path)? {
        let source = info.path.join(&relative);
        let relative = relative.to_string_lossy().replace('\\', "/");
        if Path::new(&relative).file_name().is_some_and(|n| n == TEMPLATE_INFO_FILE) {
            continue;
        }

        if info.regen_files.contains_key(&relative) {
            filesystem::copy_file(&source, &dest.join(&relative))?;
            continue;
        }

        // A leading '/' means the first segment rendered empty
        let target = engine::render_str(&relative, &relative, context)?;
        if target.starts_with('/') || has_empty_elem(&target) {
            debug!("Skipping {relative}: rendered path '{target}' has an empty segment");
            continue;
        }
        let content = filesystem::read_file(&source)?;
        let name = source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| relative.clone());
        let rendered = engine::render_str(&name, &content, context)?;
        filesystem::write_like(&source, &dest.join(&target), &rendered)?;
    }
    Ok(())
}

/// Whether a rendered path has a blank segment
///
/// `/` alone is the root and is not blank; the empty string is.
pub fn has_empty_elem(path: &str) -> bool {
    if path == "/" {
        return false;
    }
    if path.is_empty() {
        return true;
    }
    path.trim_start_matches('/')
        .split('/')
        .any(|part| part.trim().is_empty())
}
