use crate::artifact::DEFAULT_APP;
use crate::namer::ExtensionWhitelist;
use eyre::{Context, Result, eyre};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Contents of `config.toml`. Every key is optional.
#[derive(Debug, Deserialize, Default, PartialEq)]
pub struct FileConfig {
    pub target_dir: Option<PathBuf>,
    pub app: Option<String>,
    pub extensions: Option<Vec<String>>,
    pub frontmatter: Option<bool>,
}

/// Knobs of a single export run that do not depend on where output goes.
#[derive(Debug, Clone)]
pub struct ExportOptions {
    /// Leading component of every artifact name.
    pub app: String,
    pub extensions: ExtensionWhitelist,
    pub frontmatter: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            app: DEFAULT_APP.to_string(),
            extensions: ExtensionWhitelist::default(),
            frontmatter: true,
        }
    }
}

/// A fully resolved invocation: where the capture comes from, where artifacts go.
#[derive(Debug, Clone)]
pub struct ExportConfig {
    pub capture_path: PathBuf,
    pub target_dir: PathBuf,
    pub force: bool,
    pub dry_run: bool,
    pub options: ExportOptions,
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("chat-page-export/config.toml"))
}

/// Read `config.toml`. An explicit path must exist; the default one may be
/// absent, in which case every key takes its default.
pub fn load_file_config(explicit_path: Option<&Path>) -> Result<FileConfig> {
    let path = match explicit_path {
        Some(p) if !p.exists() => {
            return Err(eyre!("--config points at {}, which does not exist", p.display()));
        }
        Some(p) => p.to_path_buf(),
        None => match default_config_path().filter(|p| p.exists()) {
            Some(p) => p,
            None => return Ok(FileConfig::default()),
        },
    };

    let content = fs::read_to_string(&path)
        .wrap_err_with(|| format!("cannot read export settings from {}", path.display()))?;
    toml::from_str(&content)
        .wrap_err_with(|| format!("invalid export settings in {}", path.display()))
}

impl ExportOptions {
    /// CLI values win over the file, the file wins over defaults.
    pub fn resolve(file: &FileConfig, app: Option<String>, no_frontmatter: bool) -> Self {
        let defaults = Self::default();
        Self {
            app: app.or_else(|| file.app.clone()).unwrap_or(defaults.app),
            extensions: file
                .extensions
                .as_ref()
                .map(|exts| exts.iter().map(String::as_str).collect())
                .unwrap_or(defaults.extensions),
            frontmatter: !no_frontmatter && file.frontmatter.unwrap_or(defaults.frontmatter),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let err = load_file_config(Some(&dir.path().join("nope.toml"))).unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn parses_all_keys() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "target_dir = \"/tmp/out\"\napp = \"claude\"\nextensions = [\"py\", \"xyz\"]\nfrontmatter = false\n",
        )
        .unwrap();

        let cfg = load_file_config(Some(&path)).unwrap();
        assert_eq!(
            cfg,
            FileConfig {
                target_dir: Some(PathBuf::from("/tmp/out")),
                app: Some("claude".into()),
                extensions: Some(vec!["py".into(), "xyz".into()]),
                frontmatter: Some(false),
            }
        );
    }

    #[test]
    fn malformed_file_reports_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "app = [").unwrap();
        let err = load_file_config(Some(&path)).unwrap_err();
        assert!(err.to_string().contains("invalid export settings"));
    }

    #[test]
    fn resolve_prefers_cli_then_file() {
        let file = FileConfig {
            app: Some("from-file".into()),
            extensions: Some(vec!["xyz".into()]),
            frontmatter: Some(true),
            ..FileConfig::default()
        };
        let opts = ExportOptions::resolve(&file, Some("from-cli".into()), false);
        assert_eq!(opts.app, "from-cli");
        assert!(opts.extensions.contains("xyz"));
        assert!(!opts.extensions.contains("py"));
        assert!(opts.frontmatter);

        let opts = ExportOptions::resolve(&file, None, true);
        assert_eq!(opts.app, "from-file");
        assert!(!opts.frontmatter);
    }

    #[test]
    fn resolve_defaults() {
        let opts = ExportOptions::resolve(&FileConfig::default(), None, false);
        assert_eq!(opts.app, "chatgpt");
        assert_eq!(opts.extensions, ExtensionWhitelist::default());
        assert!(opts.frontmatter);
    }
}
