use actix_web::{middleware::Logger, web, App, HttpServer};
use std::net::{SocketAddr, ToSocketAddrs};
use std::sync::Arc;
use tracing::{error, info, instrument};

use crate::comm::AppConfiguration;
use crate::error::{AppError, AppResult};
use crate::modules::basic_app::store::{connect_store, SchoolRepository};
use crate::state::{AppState, ViewSettings};

/// 服务器配置
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
    pub debug: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            workers: Some(4),
            debug: false,
        }
    }
}

impl AppConfig {
    /// 解析监听地址，`::1` 这类 IPv6 地址不需要加方括号
    pub fn socket_addrs(&self) -> AppResult<Vec<SocketAddr>> {
        let addrs: Vec<SocketAddr> = (self.host.as_str(), self.port)
            .to_socket_addrs()
            .map_err(|e| AppError::Internal(anyhow::anyhow!("无法解析监听地址 '{}': {}", self.host, e)))?
            .collect();
        if addrs.is_empty() {
            return Err(AppError::Internal(anyhow::anyhow!("监听地址 '{}' 没有可用的解析结果", self.host)));
        }
        Ok(addrs)
    }
}

impl From<&AppConfiguration> for AppConfig {
    fn from(config: &AppConfiguration) -> Self {
        Self {
            host: config.server_host.clone(),
            port: config.server_port,
            workers: config.server_workers,
            debug: config.server_debug,
        }
    }
}

/// 应用启动器
pub struct AppBootstrap {
    config: Option<AppConfig>,
    app_configuration: AppConfiguration,
    store: Option<Arc<dyn SchoolRepository>>,
}

impl AppBootstrap {
    /// 创建新的应用启动器
    pub fn new(app_configuration: AppConfiguration) -> Self {
        Self {
            config: None,
            app_configuration,
            store: None,
        }
    }

    /// 设置服务器配置，未设置时取自应用配置
    pub fn with_config(mut self, config: AppConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// 使用已有的存储，不再按 `database.url` 连接
    pub fn with_store(mut self, store: Arc<dyn SchoolRepository>) -> Self {
        self.store = Some(store);
        self
    }

    /// 组装共享状态：连接存储、建表、加载模板
    pub async fn build_state(&self) -> AppResult<AppState> {
        let store = match &self.store {
            Some(store) => store.clone(),
            None => {
                connect_store(
                    &self.app_configuration.database_url,
                    self.app_configuration.database_max_connections,
                )
                .await?
            }
        };
        store.migrate().await?;

        AppState::new(
            store,
            self.app_configuration.templates_dir.as_deref(),
            ViewSettings::from(&self.app_configuration),
        )
    }

    /// 运行应用服务器
    #[instrument(skip(self))]
    pub async fn run(self) -> AppResult<()> {
        let config = self
            .config
            .clone()
            .unwrap_or_else(|| AppConfig::from(&self.app_configuration));
        info!("启动应用服务器，配置: {:?}", config);

        let state = web::Data::new(self.build_state().await?);
        if config.debug {
            state.routes.print_routes_info();
        }

        match self.start_http_server(config, state).await {
            Ok(_) => {
                info!("服务器已停止");
                Ok(())
            }
            Err(e) => {
                error!("服务器运行失败: {}", e);
                Err(e)
            }
        }
    }

    /// 启动HTTP服务器
    async fn start_http_server(&self, config: AppConfig, state: web::Data<AppState>) -> AppResult<()> {
        let mut server = HttpServer::new(move || {
            let routes = state.routes.clone();
            App::new()
                .wrap(Logger::default())
                .app_data(state.clone())
                .configure(move |cfg| routes.configure_all_routes(cfg))
        });
        if let Some(workers) = config.workers {
            server = server.workers(workers);
        }

        let addrs = config.socket_addrs()?;
        for addr in &addrs {
            info!("监听地址: http://{}", addr);
        }

        server
            .bind(addrs.as_slice())
            .map_err(|e| AppError::Internal(anyhow::Error::new(e)))?
            .run()
            .await
            .map_err(|e| AppError::Internal(anyhow::Error::new(e)))?;

        Ok(())
    }
}
