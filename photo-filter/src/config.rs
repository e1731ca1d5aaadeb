use crate::logic::{FailurePolicy, SessionOptions};
use anyhow::{Context, Result, bail};
use filter_client::{Percentage, ServiceConfig};
use log::debug;
use once_cell::sync::Lazy;
use platform_dirs::AppDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    sync::Mutex,
};

static CONFIG: Lazy<Mutex<Config>> = Lazy::new(|| Mutex::new(Config::default()));

#[derive(Serialize, Deserialize, Default, Debug, Clone, PartialEq)]
pub struct Config {
    #[serde(skip)]
    pub config_path: PathBuf,

    #[serde(skip)]
    pub is_first_run: bool,

    #[serde(skip)]
    pub app_name: String,

    #[serde(default)]
    pub service: ServiceConfig,

    #[serde(default)]
    pub output: Output,

    #[serde(default)]
    pub workflow: WorkflowSetting,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Derivative)]
#[derivative(Default)]
#[serde(default)]
pub struct Output {
    #[derivative(Default(value = "\"output-image.png\".to_string()"))]
    pub filename: String,

    /// Empty means the working directory.
    pub save_dir: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Derivative)]
#[derivative(Default)]
#[serde(default)]
pub struct WorkflowSetting {
    #[derivative(Default(value = "true"))]
    pub keep_result_on_failure: bool,

    #[derivative(Default(value = "50"))]
    pub default_percentage: i64,
}

impl Config {
    /// Resolves the config file path and loads it.
    ///
    /// # Parameters
    /// - `config_path`: explicit file, otherwise `<config dir>/<app>/<app>.toml`
    pub fn init(&mut self, config_path: Option<PathBuf>) -> Result<()> {
        self.app_name = env!("CARGO_PKG_NAME").to_string();

        self.config_path = match config_path {
            Some(path) => path,
            None => {
                let Some(app_dirs) = AppDirs::new(Some(&self.app_name), true) else {
                    bail!("no config directory available on this platform");
                };
                app_dirs
                    .config_dir
                    .join(format!("{}.toml", self.app_name))
            }
        };

        if let Some(dir) = self.config_path.parent()
            && !dir.as_os_str().is_empty()
        {
            fs::create_dir_all(dir)?;
        }

        self.load().with_context(|| "load config file failed")?;
        debug!("{:?}", self);
        Ok(())
    }

    /// Loads the config file, writing the defaults when it is missing or broken.
    fn load(&mut self) -> Result<()> {
        let loaded = fs::read_to_string(&self.config_path)
            .ok()
            .and_then(|text| match toml::from_str::<Config>(&text) {
                Ok(c) => Some(c),
                Err(e) => {
                    log::warn!("parse {} failed. {e}", self.config_path.display());
                    backup(&self.config_path);
                    None
                }
            });

        match loaded {
            Some(mut c) => {
                c.config_path = self.config_path.clone();
                c.is_first_run = false;
                c.app_name = self.app_name.clone();
                *self = c;
                Ok(())
            }
            None => {
                self.is_first_run = true;
                self.save()
            }
        }
    }

    pub fn save(&self) -> Result<()> {
        match toml::to_string_pretty(self) {
            Ok(text) => Ok(fs::write(&self.config_path, text)
                .with_context(|| "save config failed".to_string())?),
            Err(e) => bail!(format!("convert config to toml format failed. {e:?}")),
        }
    }

    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            service: self.service.clone(),
            policy: if self.workflow.keep_result_on_failure {
                FailurePolicy::KeepPrevious
            } else {
                FailurePolicy::Discard
            },
            default_percentage: Percentage::new(self.workflow.default_percentage),
            save_dir: PathBuf::from(&self.output.save_dir),
            filename: self.output.filename.clone(),
        }
    }
}

fn backup(path: &Path) {
    let bak_file = format!("{}.bak", path.display());
    if let Err(e) = fs::copy(path, &bak_file) {
        log::warn!("backup {} failed. {e}", path.display());
    }
}

/// Initializes the global configuration.
///
/// This should be called once at application startup.
pub fn init(config_path: Option<PathBuf>) -> Result<()> {
    CONFIG
        .lock()
        .map_err(|_| anyhow::anyhow!("config lock poisoned"))?
        .init(config_path)
}

/// Returns a clone of the current configuration.
pub fn all() -> Config {
    CONFIG
        .lock()
        .map(|config| config.clone())
        .unwrap_or_default()
}

/// Replaces the global configuration and writes it to disk.
pub fn save(conf: Config) -> Result<()> {
    let mut config = CONFIG
        .lock()
        .map_err(|_| anyhow::anyhow!("config lock poisoned"))?;
    *config = conf;
    config.save()
}
