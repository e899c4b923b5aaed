use anyhow::Result;
use config::{Config, ConfigBuilder, Environment, File, FileFormat};
use serde::de::DeserializeOwned;
use tracing::info;

/// 配置错误类型
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("配置文件不存在: {path}")]
    FileNotFound { path: String },
    #[error("配置项 '{key}' 不存在")]
    KeyNotFound { key: String },
    #[error("配置项 '{key}' 类型转换失败: {message}")]
    TypeConversionError { key: String, message: String },
    #[error("配置初始化失败: {message}")]
    InitializationError { message: String },
}

/// 配置数据源信息
#[derive(Debug, Clone)]
pub struct ConfigSourceInfo {
    pub source_type: String,
    pub description: String,
    pub priority: u8,
    pub loaded: bool,
}

/// 配置管理器
///
/// 按添加顺序叠加配置源，后添加者优先生效。
pub struct ConfigManager {
    config: Config,
    sources_info: Vec<ConfigSourceInfo>,
}

impl ConfigManager {
    /// 使用指定的配置源创建配置管理器
    pub fn with_sources(sources: Vec<ConfigSource>) -> std::result::Result<Self, ConfigError> {
        let mut builder = Config::builder();
        let mut sources_info = Vec::new();

        for (index, source) in sources.into_iter().enumerate() {
            let priority = (index + 1) as u8;
            let source_info = source.get_source_info(priority);

            // 可选文件不存在时只记录，不加入构建器
            if let ConfigSource::File { path, required, .. } = &source {
                if !std::path::Path::new(path).exists() {
                    if *required {
                        return Err(ConfigError::FileNotFound { path: path.clone() });
                    }
                    sources_info.push(source_info);
                    continue;
                }
            }

            builder = source
                .add_to_builder(builder)
                .map_err(|e| ConfigError::InitializationError {
                    message: format!("添加配置源失败: {}", e),
                })?;
            sources_info.push(ConfigSourceInfo {
                loaded: true,
                ..source_info
            });
        }

        let config = builder
            .build()
            .map_err(|e| ConfigError::InitializationError {
                message: format!("构建配置失败: {}", e),
            })?;

        Ok(Self {
            config,
            sources_info,
        })
    }

    /// 安全获取配置值，区分"不存在"和"类型错误"
    ///
    /// 不存在时返回 `Ok(None)`，这样调用方可以保留默认值，
    /// 同时不会把写错类型的配置静默吞掉。
    pub fn get_optional<T: DeserializeOwned>(
        &self,
        key: &str,
    ) -> std::result::Result<Option<T>, ConfigError> {
        match self.config.get::<T>(key) {
            Ok(v) => Ok(Some(v)),
            Err(config::ConfigError::NotFound(_)) => Ok(None),
            Err(e) => Err(ConfigError::TypeConversionError {
                key: key.to_string(),
                message: e.to_string(),
            }),
        }
    }

    /// 检查配置项是否存在
    pub fn exists(&self, key: &str) -> bool {
        self.config.get::<serde_json::Value>(key).is_ok()
    }

    /// 获取配置源统计信息 (总数, 已加载, 未加载)
    pub fn get_sources_stats(&self) -> (usize, usize, usize) {
        let total = self.sources_info.len();
        let loaded = self.sources_info.iter().filter(|info| info.loaded).count();
        (total, loaded, total - loaded)
    }

    /// 打印配置源详细信息
    pub fn print_sources_info(&self) {
        for info in &self.sources_info {
            let status = if info.loaded { "已加载" } else { "未加载" };
            info!(
                priority = info.priority,
                "{} - {} ({})",
                info.source_type,
                status,
                info.description
            );
        }

        let (total, loaded, skipped) = self.get_sources_stats();
        info!(
            "配置源统计: 总计 {} 个，已加载 {} 个，跳过 {} 个",
            total, loaded, skipped
        );
    }

    /// 验证必需的配置项
    pub fn validate_required_keys(
        &self,
        required_keys: &[&str],
    ) -> std::result::Result<(), ConfigError> {
        for key in required_keys {
            if !self.exists(key) {
                return Err(ConfigError::KeyNotFound {
                    key: key.to_string(),
                });
            }
        }
        Ok(())
    }
}

/// 配置源类型
pub enum ConfigSource {
    /// 文件配置源
    File {
        path: String,
        format: Option<FileFormat>,
        required: bool,
    },
    /// 环境变量配置源
    Env {
        prefix: String,
        separator: &'static str,
    },
    /// 字符串配置源
    String { content: String, format: FileFormat },
}

impl ConfigSource {
    /// 获取配置源信息
    pub fn get_source_info(&self, priority: u8) -> ConfigSourceInfo {
        let (source_type, description) = match self {
            ConfigSource::File { path, required, .. } => (
                "File",
                format!("文件配置源: {} (必需: {})", path, required),
            ),
            ConfigSource::Env { prefix, separator } => (
                "Environment",
                format!("环境变量配置源: 前缀={}, 分隔符={}", prefix, separator),
            ),
            ConfigSource::String { format, .. } => {
                ("String", format!("字符串配置源: 格式={:?}", format))
            }
        };
        ConfigSourceInfo {
            source_type: source_type.to_string(),
            description,
            priority,
            loaded: false,
        }
    }

    pub fn add_to_builder(
        self,
        builder: ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<ConfigBuilder<config::builder::DefaultState>> {
        match self {
            ConfigSource::File {
                path,
                format,
                required,
            } => {
                let file_source = match format {
                    Some(format) => File::with_name(&path).format(format),
                    None => File::with_name(&path),
                };
                Ok(builder.add_source(file_source.required(required)))
            }
            ConfigSource::Env { prefix, separator } => Ok(builder.add_source(
                Environment::with_prefix(&prefix)
                    .separator(separator)
                    .prefix_separator(separator)
                    .list_separator(",")
                    .with_list_parse_key("views.update_fields")
                    .try_parsing(true)
                    .ignore_empty(true),
            )),
            ConfigSource::String { content, format } => {
                Ok(builder.add_source(File::from_str(&content, format)))
            }
        }
    }
}
