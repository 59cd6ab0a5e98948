use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::document::{DisplayOptions, FontStyle, PaperStyle};

const APP_DIR: &str = "snapnote";
const LOCAL_RC: &str = ".snapnoterc";

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConfigFlags {
    pub watch: bool,
    pub no_diagrams: bool,
    pub plain: bool,
    pub perf: bool,
    pub font: Option<FontStyle>,
    pub paper: Option<PaperStyle>,
    pub render_debug_log: Option<PathBuf>,
    pub store: Option<PathBuf>,
    pub owner: Option<String>,
}

impl ConfigFlags {
    pub fn union(&self, other: &Self) -> Self {
        Self {
            watch: self.watch || other.watch,
            no_diagrams: self.no_diagrams || other.no_diagrams,
            plain: self.plain || other.plain,
            perf: self.perf || other.perf,
            font: other.font.or(self.font),
            paper: other.paper.or(self.paper),
            render_debug_log: other
                .render_debug_log
                .clone()
                .or_else(|| self.render_debug_log.clone()),
            store: other.store.clone().or_else(|| self.store.clone()),
            owner: other.owner.clone().or_else(|| self.owner.clone()),
        }
    }

    pub fn display_options(&self) -> DisplayOptions {
        DisplayOptions {
            show_diagrams: !self.no_diagrams,
            font_style: self.font.unwrap_or_default(),
            paper_style: self.paper.unwrap_or_default(),
        }
    }

    /// Note store file, defaulting to `notes.json` next to the global config.
    pub fn store_path(&self) -> PathBuf {
        self.store.clone().unwrap_or_else(|| {
            global_config_path()
                .parent()
                .map_or_else(|| PathBuf::from("notes.json"), |dir| dir.join("notes.json"))
        })
    }

    pub fn owner_id(&self) -> String {
        self.owner
            .clone()
            .or_else(|| std::env::var("USER").ok())
            .or_else(|| std::env::var("USERNAME").ok())
            .unwrap_or_else(|| "local".to_string())
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

    PathBuf::from(LOCAL_RC)
}

pub fn local_override_path() -> PathBuf {
    PathBuf::from(LOCAL_RC)
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
    let mut lines = vec!["# snapnote defaults (saved with --save)".to_string()];
    if flags.watch {
        lines.push("--watch".to_string());
    }
    if flags.no_diagrams {
        lines.push("--no-diagrams".to_string());
    }
    if flags.plain {
        lines.push("--plain".to_string());
    }
    if let Some(font) = flags.font {
        lines.push(format!("--font {}", font.as_str()));
    }
    if let Some(paper) = flags.paper {
        lines.push(format!("--paper {}", paper.as_str()));
    }
    if flags.perf {
        lines.push("--perf".to_string());
    }
    if let Some(path) = &flags.render_debug_log {
        lines.push(format!("--render-debug-log {}", path.display()));
    }
    if let Some(path) = &flags.store {
        lines.push(format!("--store {}", path.display()));
    }
    if let Some(owner) = &flags.owner {
        lines.push(format!("--owner {owner}"));
    }
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
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

/// Pick the known flags out of a token list. Unknown tokens are ignored.
pub fn parse_flag_tokens(tokens: &[String]) -> ConfigFlags {
    let mut flags = ConfigFlags::default();
    let mut i = 0;
    while i < tokens.len() {
        let token = tokens[i].as_str();
        let (name, inline) = match token.split_once('=') {
            Some((name, value)) if name.starts_with("--") => (name, Some(value)),
            _ => (token, None),
        };
        let mut value = || {
            inline.map(ToOwned::to_owned).or_else(|| {
                let next = tokens.get(i + 1).cloned();
                if next.is_some() {
                    i += 1;
                }
                next
            })
        };
        match name {
            "--watch" | "-w" => flags.watch = true,
            "--no-diagrams" => flags.no_diagrams = true,
            "--plain" => flags.plain = true,
            "--perf" => flags.perf = true,
            "--font" => flags.font = value().as_deref().and_then(FontStyle::parse),
            "--paper" => flags.paper = value().as_deref().and_then(PaperStyle::parse),
            "--render-debug-log" => flags.render_debug_log = value().map(PathBuf::from),
            "--store" => flags.store = value().map(PathBuf::from),
            "--owner" => flags.owner = value(),
            _ => {}
        }
        i += 1;
    }
    flags
}
