use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Default IRC port when a request omits one.
pub const DEFAULT_IRC_PORT: u16 = 6667;

/// Global configuration loaded from `~/.config/xdm/config.toml`.
///
/// These are the defaults applied to fields a download request leaves
/// unset; a request that names its own port, nickname, or download path
/// wins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct XdmConfig {
    /// IRC port used when the request omits one.
    pub default_port: u16,
    /// Nickname used to register with IRC servers when the request omits
    /// one. Placeholder identity; bots do not care.
    pub default_nickname: String,
    /// Directory downloads land in when the request omits a path.
    /// Relative paths resolve against the current working directory.
    pub download_dir: PathBuf,
}

impl Default for XdmConfig {
    fn default() -> Self {
        Self {
            default_port: DEFAULT_IRC_PORT,
            default_nickname: "xdmuser".to_string(),
            download_dir: PathBuf::from("downloads"),
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("xdm")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<XdmConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = XdmConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: XdmConfig = toml::from_str(&data)?;
    Ok(cfg)
}
