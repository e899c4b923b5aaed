use crate::error::{AppError, AppResult};
use crate::modules::basic_app::models::SchoolField;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

lazy_static! {
    /// 主机名 / IPv4 / IPv6（不带方括号，例如 `::1`）
    static ref HOST_PATTERN: Regex = Regex::new(r"^[a-zA-Z0-9.:-]+$").unwrap();
}

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// 应用配置结构体
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfiguration {
    pub server_host: String,
    pub server_port: u16,
    pub server_workers: Option<usize>,
    pub server_debug: bool,
    pub database_url: String,
    pub database_max_connections: u32,
    pub logging_level: String,
    pub logging_json_format: bool,
    pub templates_dir: Option<String>,
    pub views_update_fields: Vec<String>,
    pub views_create_success_url: Option<String>,
    pub views_update_success_url: Option<String>,
}

impl Default for AppConfiguration {
    fn default() -> Self {
        Self {
            server_host: "127.0.0.1".to_string(),
            server_port: 8000,
            server_workers: Some(4),
            server_debug: false,
            database_url: "sqlite://advcbv.sqlite3?mode=rwc".to_string(),
            database_max_connections: 5,
            logging_level: "info".to_string(),
            logging_json_format: false,
            templates_dir: None,
            views_update_fields: vec!["name".to_string(), "principal".to_string()],
            views_create_success_url: None,
            views_update_success_url: None,
        }
    }
}

/// 配置验证器
#[derive(Debug, Default)]
pub struct ConfigValidator;

impl ConfigValidator {
    /// 创建新的配置验证器
    pub fn new() -> Self {
        Self
    }

    /// 验证整个配置
    pub fn validate_config(&self, config: &AppConfiguration) -> AppResult<()> {
        // 验证服务器主机
        if config.server_host.is_empty() {
            return Err(AppError::validation("server.host", "服务器主机不能为空"));
        }
        if !HOST_PATTERN.is_match(&config.server_host) {
            return Err(AppError::validation(
                "server.host",
                format!("非法的主机地址: {}", config.server_host),
            ));
        }

        // 验证端口范围
        if config.server_port < 1024 {
            return Err(AppError::validation("server.port", "端口必须在1024-65535范围内"));
        }

        // 验证工作线程数
        if let Some(workers) = config.server_workers {
            if workers == 0 || workers > 32 {
                return Err(AppError::validation("server.workers", "工作线程数必须在1-32范围内"));
            }
        }

        // 验证数据库
        if config.database_url.trim().is_empty() {
            return Err(AppError::validation("database.url", "数据库地址不能为空"));
        }
        if config.database_max_connections == 0 || config.database_max_connections > 100 {
            return Err(AppError::validation(
                "database.max_connections",
                "数据库连接池大小必须在1-100范围内",
            ));
        }

        // 验证日志级别
        if !LOG_LEVELS.contains(&config.logging_level.to_lowercase().as_str()) {
            return Err(AppError::validation(
                "logging.level",
                format!("值必须是以下之一: {}", LOG_LEVELS.join(", ")),
            ));
        }

        // 更新视图的字段白名单必须是 School 的字段
        SchoolField::parse_allow_list(&config.views_update_fields)?;

        for (key, url) in [
            ("views.create_success_url", &config.views_create_success_url),
            ("views.update_success_url", &config.views_update_success_url),
        ] {
            if let Some(url) = url {
                if !url.starts_with('/') && !url.starts_with("http://") && !url.starts_with("https://") {
                    return Err(AppError::validation(key, "跳转地址必须是绝对路径或完整 URL"));
                }
            }
        }

        Ok(())
    }
}

/// 环境特定配置加载器
#[derive(Debug, Clone)]
pub struct EnvironmentConfigLoader {
    environment: String,
}

impl EnvironmentConfigLoader {
    /// 从 `ADVCBV_ENV` 读取当前环境，默认 development
    pub fn new() -> Self {
        let environment =
            std::env::var("ADVCBV_ENV").unwrap_or_else(|_| "development".to_string());
        Self { environment }
    }

    /// 指定环境名创建加载器
    pub fn with_environment<T: Into<String>>(environment: T) -> Self {
        Self {
            environment: environment.into(),
        }
    }

    /// 获取当前环境
    pub fn get_environment(&self) -> &str {
        &self.environment
    }

    /// 获取环境特定的配置文件路径（优先级从低到高）
    pub fn get_config_paths(&self) -> Vec<String> {
        vec![
            "config/default.toml".to_string(),
            format!("config/{}.toml", self.environment),
            "config/local.toml".to_string(),
        ]
    }

    /// 是否为生产环境
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

impl Default for EnvironmentConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}
