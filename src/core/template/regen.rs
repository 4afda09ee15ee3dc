//! Regeneration of tracked project files
//!
//! The document's `templates` dictionary maps a project-relative source
//! (copied verbatim from the template on creation) to its destination.
//! Regeneration renders each source against the current configuration.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde_yaml::Value;
use tracing::info;

use super::engine;
use crate::error::TemplateError;
use crate::infra::filesystem;

/// Render every tracked file, returning the destinations written
///
/// Relative destinations are resolved against `project_root`; absolute ones
/// are used as they are.
pub fn regenerate(
    templates: &BTreeMap<String, String>,
    project_root: &Path,
    context: &Value,
) -> Result<Vec<PathBuf>, TemplateError> {
    let mut written = Vec::with_capacity(templates.len());
    for (src, dest) in templates {
        let source = project_root.join(src);
        let dest = Path::new(dest);
        let target = if dest.is_absolute() {
            dest.to_path_buf()
        } else {
            project_root.join(dest)
        };

        let content = filesystem::read_file(&source)?;
        let rendered = engine::render_str(src, &content, context)?;
        filesystem::write_like(&source, &target, &rendered)?;
        info!("{} was regenerated", target.display());
        written.push(target);
    }
    Ok(written)
}
