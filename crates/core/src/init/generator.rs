//! `.showrunner/` directory generation.

use std::fs;
use std::path::{Path, PathBuf};

use super::error::{InitError, InitResult};
use super::templates::{get_template, list_templates};
use crate::config::CONFIG_DIR;

/// Options for initializing a `.showrunner/` directory.
#[derive(Debug, Clone)]
pub struct InitOptions {
    /// Target directory where `.showrunner/` will be created.
    pub target_dir: PathBuf,

    /// Overwrite an existing `.showrunner/` directory.
    pub force: bool,

    /// Only write `config.toml`; the built-in agent definitions are used
    /// until a project overrides them.
    pub minimal: bool,
}

impl Default for InitOptions {
    fn default() -> Self {
        Self {
            target_dir: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            force: false,
            minimal: false,
        }
    }
}

/// Generate the `.showrunner/` structure from embedded templates.
///
/// ```text
/// .showrunner/
/// ├── config.toml
/// └── agents/
///     ├── scout.md
///     ├── decode.md
///     ├── research.md
///     ├── architect.md
///     └── narrate.md   (agents/ omitted with `minimal`)
/// ```
pub fn generate_structure(options: &InitOptions) -> InitResult<()> {
    let dir = options.target_dir.join(CONFIG_DIR);

    if dir.exists() && !options.force {
        return Err(InitError::DirectoryExists(dir));
    }

    fs::create_dir_all(&dir).map_err(|source| InitError::DirectoryCreate {
        path: dir.clone(),
        source,
    })?;

    write_template_file(&dir, "config.toml")?;

    if !options.minimal {
        for agent_path in list_templates("agents/") {
            write_template_file(&dir, &agent_path)?;
        }
    }

    Ok(())
}

fn write_template_file(dir: &Path, template_path: &str) -> InitResult<()> {
    let content = get_template(template_path)
        .ok_or_else(|| InitError::TemplateNotFound(template_path.to_string()))?;

    let target_path = dir.join(template_path);
    if let Some(parent) = target_path.parent() {
        fs::create_dir_all(parent).map_err(|source| InitError::DirectoryCreate {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    fs::write(&target_path, content).map_err(|source| InitError::FileWrite {
        path: target_path,
        source,
    })
}
