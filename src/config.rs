use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};

use crate::app::{DEFAULT_CONTENT_PREFIX, DEFAULT_SAVE_GRACE, EditorSettings};
use crate::markdown::LinkRewrite;

/// Server used when none is configured.
pub const DEFAULT_SERVER: &str = "http://localhost:8080/";

const APP_DIR: &str = "convind-editor";
const LOCAL_FILE: &str = ".convindrc";

/// Defaults that can live in a config file as command-line flags.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConfigFlags {
    pub server: Option<String>,
    pub link_scheme: Option<String>,
    pub link_prefix: Option<String>,
    pub content_prefix: Option<String>,
    pub save_grace_ms: Option<u64>,
    pub verbose: bool,
}

impl ConfigFlags {
    /// Merge two flag sets; values in `other` win.
    pub fn union(&self, other: &Self) -> Self {
        Self {
            server: other.server.clone().or_else(|| self.server.clone()),
            link_scheme: other.link_scheme.clone().or_else(|| self.link_scheme.clone()),
            link_prefix: other.link_prefix.clone().or_else(|| self.link_prefix.clone()),
            content_prefix: other
                .content_prefix
                .clone()
                .or_else(|| self.content_prefix.clone()),
            save_grace_ms: other.save_grace_ms.or(self.save_grace_ms),
            verbose: self.verbose || other.verbose,
        }
    }

    pub fn server(&self) -> &str {
        self.server.as_deref().unwrap_or(DEFAULT_SERVER)
    }

    /// Editor settings with defaults filled in.
    pub fn settings(&self) -> EditorSettings {
        let defaults = LinkRewrite::default();
        EditorSettings {
            links: LinkRewrite::new(
                self.link_scheme.as_deref().unwrap_or(defaults.scheme()),
                self.link_prefix.as_deref().unwrap_or(defaults.prefix()),
            ),
            content_prefix: self
                .content_prefix
                .clone()
                .unwrap_or_else(|| DEFAULT_CONTENT_PREFIX.to_string()),
            save_grace: self
                .save_grace_ms
                .map_or(DEFAULT_SAVE_GRACE, Duration::from_millis),
        }
    }
}

pub fn global_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        if let Some(appdata) = std::env::var_os("APPDATA") {
            return PathBuf::from(appdata).join(APP_DIR).join("config");
        }
    }

    #[cfg(target_os = "macos")]
    {
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home)
                .join("Library")
                .join("Application Support")
                .join(APP_DIR)
                .join("config");
        }
    }

    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME") {
            return PathBuf::from(xdg).join(APP_DIR).join("config");
        }
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home).join(".config").join(APP_DIR).join("config");
        }
    }

    PathBuf::from(LOCAL_FILE)
}

pub fn local_override_path() -> PathBuf {
    PathBuf::from(LOCAL_FILE)
}

pub fn load_config_flags(path: &Path) -> Result<ConfigFlags> {
    if !path.exists() {
        return Ok(ConfigFlags::default());
    }
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let tokens = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .flat_map(|line| line.split_whitespace().map(ToOwned::to_owned))
        .collect::<Vec<_>>();
    Ok(parse_flag_tokens(&tokens))
}

pub fn save_config_flags(path: &Path, flags: &ConfigFlags) -> Result<()> {
    let mut lines = vec!["# convind-editor defaults (saved with --save)".to_string()];
    let values = [
        ("--server", flags.server.clone()),
        ("--link-scheme", flags.link_scheme.clone()),
        ("--link-prefix", flags.link_prefix.clone()),
        ("--content-prefix", flags.content_prefix.clone()),
        ("--save-grace-ms", flags.save_grace_ms.map(|ms| ms.to_string())),
    ];
    for (flag, value) in values {
        if let Some(value) = value {
            lines.push(format!("{flag} {value}"));
        }
    }
    if flags.verbose {
        lines.push("--verbose".to_string());
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config dir {}", parent.display()))?;
    }
    fs::write(path, format!("{}\n", lines.join("\n")))
        .with_context(|| format!("Failed to write config {}", path.display()))
}

pub fn clear_config_flags(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_file(path).with_context(|| format!("Failed to remove {}", path.display()))?;
    }
    Ok(())
}

/// Pick the known flags out of a token list, ignoring everything else.
///
/// Value flags accept both `--flag value` and `--flag=value`.
pub fn parse_flag_tokens(tokens: &[String]) -> ConfigFlags {
    let mut flags = ConfigFlags::default();
    let mut i = 0;
    while i < tokens.len() {
        let token = tokens[i].as_str();
        if token == "--verbose" || token == "-v" {
            flags.verbose = true;
            i += 1;
            continue;
        }
        let (name, inline) = match token.split_once('=') {
            Some((name, value)) => (name, Some(value.to_string())),
            None => (token, None),
        };
        let slot = match name {
            "--server" => &mut flags.server,
            "--link-scheme" => &mut flags.link_scheme,
            "--link-prefix" => &mut flags.link_prefix,
            "--content-prefix" => &mut flags.content_prefix,
            "--save-grace-ms" => {
                let value = inline.or_else(|| {
                    i += 1;
                    tokens.get(i).cloned()
                });
                flags.save_grace_ms = value.and_then(|v| v.parse().ok()).or(flags.save_grace_ms);
                i += 1;
                continue;
            }
            _ => {
                i += 1;
                continue;
            }
        };
        let value = inline.or_else(|| {
            i += 1;
            tokens.get(i).cloned()
        });
        if value.is_some() {
            *slot = value;
        }
        i += 1;
    }
    flags
}
