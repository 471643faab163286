use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// 应用配置的根结构。
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub figure: FigureConfig,
    #[serde(default)]
    pub editor: EditorConfig,
}

impl AppConfig {
    /// 从显式路径加载配置。
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// 自动发现配置文件：优先读取环境变量 `AXPOS_CONFIG`，否则寻找 `./config/default.toml`。
    /// 若文件缺失，则返回默认配置。
    pub fn discover() -> Result<Self, ConfigError> {
        if let Some(path) = env::var_os("AXPOS_CONFIG") {
            return Self::from_file(PathBuf::from(path));
        }

        let default_path = env::current_dir()
            .map(|dir| dir.join("config").join("default.toml"))
            .map_err(|source| ConfigError::Context {
                message: "获取当前工作目录失败".to_string(),
                source,
            })?;

        if default_path.exists() {
            Self::from_file(default_path)
        } else {
            Ok(Self::default())
        }
    }
}

/// 日志配置，支持设置默认等级。
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "LoggingConfig::default_level")]
    pub level: String,
}

impl LoggingConfig {
    fn default_level() -> String {
        "info".to_string()
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
        }
    }
}

/// 启动时的图幅尺寸（英寸）与锚点。
#[derive(Debug, Clone, Deserialize)]
pub struct FigureConfig {
    #[serde(default = "FigureConfig::default_width")]
    pub width: f64,
    #[serde(default = "FigureConfig::default_height")]
    pub height: f64,
    #[serde(default = "FigureConfig::default_anchor")]
    pub anchor: String,
}

impl FigureConfig {
    fn default_width() -> f64 {
        8.0
    }

    fn default_height() -> f64 {
        6.0
    }

    fn default_anchor() -> String {
        "C".to_string()
    }
}

impl Default for FigureConfig {
    fn default() -> Self {
        Self {
            width: Self::default_width(),
            height: Self::default_height(),
            anchor: Self::default_anchor(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct EditorConfig {
    /// `add-at` 未给出尺寸时使用的宽度。
    #[serde(default = "EditorConfig::default_size")]
    pub default_width: f64,
    #[serde(default = "EditorConfig::default_size")]
    pub default_height: f64,
    /// 退出时以 `FIG:` + 逐行边界的流格式输出。
    #[serde(default)]
    pub stream_bounds: bool,
}

impl EditorConfig {
    fn default_size() -> f64 {
        0.4
    }
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            default_width: Self::default_size(),
            default_height: Self::default_size(),
            stream_bounds: false,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("读取配置文件 {path:?} 失败: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("解析配置文件 {path:?} 失败: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("{message}")]
    Context {
        message: String,
        #[source]
        source: std::io::Error,
    },
}
