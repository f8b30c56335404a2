//! Embedded template files for `.showrunner/` initialization.
//!
//! The repository root `templates/` directory is embedded into the binary
//! at compile time. The same files serve two purposes: `showrunner init`
//! copies them into a project, and the agent roster parses the `agents/`
//! files as its built-in defaults, so a project with no overrides runs on
//! exactly what `init` would have scaffolded.

use rust_embed::RustEmbed;

/// Embedded template files from the `templates/` directory.
///
/// The path is calculated relative to the crate root: `CARGO_MANIFEST_DIR`
/// is `crates/core`, so `../../templates` is the repository root
/// `templates/`. The `debug-embed` feature embeds the files in debug
/// builds too, so dev binaries behave like release ones.
#[derive(RustEmbed)]
#[folder = "$CARGO_MANIFEST_DIR/../../templates"]
pub struct TemplateAssets;

/// Get template file content by path relative to the templates root.
pub fn get_template(path: &str) -> Option<String> {
    TemplateAssets::get(path).map(|file| String::from_utf8_lossy(file.data.as_ref()).to_string())
}

/// List all template files under a prefix (e.g. `"agents/"`).
pub fn list_templates(prefix: &str) -> Vec<String> {
    TemplateAssets::iter()
        .filter(|path| path.starts_with(prefix))
        .map(|path| path.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_template_embedded() {
        let config = get_template("config.toml").expect("config.toml should be embedded");
        assert!(config.contains("[generation]"));
        assert!(config.contains("default_model"));
    }

    #[test]
    fn test_one_agent_template_per_stage() {
        let agents = list_templates("agents/");
        for stage in ["scout", "decode", "research", "architect", "narrate"] {
            assert!(
                agents.contains(&format!("agents/{stage}.md")),
                "missing agents/{stage}.md"
            );
        }
    }

    #[test]
    fn test_agent_templates_have_front_matter() {
        for path in list_templates("agents/") {
            let content = get_template(&path).unwrap();
            assert!(content.starts_with("---"), "{path} missing front matter");
            assert!(content.contains("name:"), "{path} missing name field");
        }
    }

    #[test]
    fn test_nonexistent_template_is_none() {
        assert!(get_template("nonexistent.txt").is_none());
    }
}
