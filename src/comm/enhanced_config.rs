use crate::comm::config::{ConfigManager, ConfigSource};
use crate::comm::config_validator::{AppConfiguration, ConfigValidator, EnvironmentConfigLoader};
use crate::error::AppResult;
use config::FileFormat;
use tracing::{debug, info};

/// 环境变量前缀，例如 `ADVCBV__SERVER__PORT=9000`
pub const ENV_PREFIX: &str = "ADVCBV";

/// 增强的配置管理器：分层加载 + 校验 + 汇总成 [`AppConfiguration`]
pub struct EnhancedConfigManager {
    config_manager: ConfigManager,
    env_loader: EnvironmentConfigLoader,
    app_config: AppConfiguration,
}

impl EnhancedConfigManager {
    /// 按当前环境加载配置文件与环境变量
    pub fn new() -> AppResult<Self> {
        let env_loader = EnvironmentConfigLoader::new();
        info!("当前环境: {}", env_loader.get_environment());

        let mut sources: Vec<ConfigSource> = env_loader
            .get_config_paths()
            .into_iter()
            .map(|path| ConfigSource::File {
                path,
                format: Some(FileFormat::Toml),
                required: false,
            })
            .collect();

        sources.push(ConfigSource::Env {
            prefix: ENV_PREFIX.to_string(),
            separator: "__",
        });

        Self::from_sources(env_loader, sources)
    }

    /// 使用显式配置源创建（测试与嵌入场景）
    pub fn from_sources(
        env_loader: EnvironmentConfigLoader,
        sources: Vec<ConfigSource>,
    ) -> AppResult<Self> {
        let config_manager = ConfigManager::with_sources(sources)?;
        let app_config = Self::load_app_config(&config_manager, &ConfigValidator::new())?;

        Ok(Self {
            config_manager,
            env_loader,
            app_config,
        })
    }

    /// 加载应用配置
    fn load_app_config(
        config_manager: &ConfigManager,
        validator: &ConfigValidator,
    ) -> AppResult<AppConfiguration> {
        let mut app_config = AppConfiguration::default();

        if let Some(host) = config_manager.get_optional("server.host")? {
            app_config.server_host = host;
        }
        if let Some(port) = config_manager.get_optional("server.port")? {
            app_config.server_port = port;
        }
        if let Some(workers) = config_manager.get_optional("server.workers")? {
            app_config.server_workers = Some(workers);
        }
        if let Some(debug) = config_manager.get_optional("server.debug")? {
            app_config.server_debug = debug;
        }
        if let Some(url) = config_manager.get_optional("database.url")? {
            app_config.database_url = url;
        }
        if let Some(max_conn) = config_manager.get_optional("database.max_connections")? {
            app_config.database_max_connections = max_conn;
        }
        if let Some(level) = config_manager.get_optional("logging.level")? {
            app_config.logging_level = level;
        }
        if let Some(json_format) = config_manager.get_optional("logging.json_format")? {
            app_config.logging_json_format = json_format;
        }
        app_config.templates_dir = Self::non_empty(config_manager, "templates.dir")?;
        if let Some(fields) = config_manager.get_optional("views.update_fields")? {
            app_config.views_update_fields = fields;
        }
        app_config.views_create_success_url =
            Self::non_empty(config_manager, "views.create_success_url")?;
        app_config.views_update_success_url =
            Self::non_empty(config_manager, "views.update_success_url")?;

        validator.validate_config(&app_config)?;

        debug!("应用配置: {:?}", app_config);
        Ok(app_config)
    }

    fn non_empty(config_manager: &ConfigManager, key: &str) -> AppResult<Option<String>> {
        Ok(config_manager
            .get_optional::<String>(key)?
            .filter(|s| !s.trim().is_empty()))
    }

    /// 获取应用配置
    pub fn get_app_config(&self) -> &AppConfiguration {
        &self.app_config
    }

    /// 获取应用配置的可变引用（命令行参数覆盖）
    pub fn get_app_config_mut(&mut self) -> &mut AppConfiguration {
        &mut self.app_config
    }

    /// 重新校验（覆盖参数之后调用）
    pub fn revalidate(&self) -> AppResult<()> {
        ConfigValidator::new().validate_config(&self.app_config)
    }

    /// 生产环境必须显式配置数据库
    pub fn validate_required_config(&self) -> AppResult<()> {
        if self.env_loader.is_production() {
            self.config_manager
                .validate_required_keys(&["server.host", "server.port", "database.url"])?;
        }
        Ok(())
    }

    /// 打印配置摘要
    pub fn print_config_summary(&self) {
        info!("=== 配置摘要 ===");
        info!("环境: {}", self.env_loader.get_environment());
        info!(
            "服务器: {}:{}",
            self.app_config.server_host, self.app_config.server_port
        );
        info!("工作线程: {:?}", self.app_config.server_workers);
        info!("调试模式: {}", self.app_config.server_debug);
        info!("日志级别: {}", self.app_config.logging_level);
        info!("数据库: {}", Self::mask_sensitive_info(&self.app_config.database_url));
        info!("更新字段: {:?}", self.app_config.views_update_fields);

        self.config_manager.print_sources_info();
    }

    /// 屏蔽敏感信息
    fn mask_sensitive_info(url: &str) -> String {
        // 查找 :// 和 @ 之间的 user:password
        if let Some(start) = url.find("://") {
            let credentials_start = start + 3;
            if let Some(at_pos) = url[credentials_start..].find('@') {
                let credentials_end = credentials_start + at_pos;
                if let Some(colon_pos) = url[credentials_start..credentials_end].find(':') {
                    let mut result = url.to_string();
                    result.replace_range(credentials_start + colon_pos + 1..credentials_end, "***");
                    return result;
                }
            }
        }
        url.to_string()
    }
}
