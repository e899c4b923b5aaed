use crate::comm::AppConfiguration;
use crate::error::AppResult;
use crate::modules::basic_app::store::SchoolRepository;
use crate::render::Templates;
use crate::route_registry::RouteRegistry;
use std::sync::Arc;

/// 视图行为配置
#[derive(Debug, Clone)]
pub struct ViewSettings {
    /// 更新视图允许修改的字段名，处理请求时再按 School 的字段校验
    pub update_fields: Vec<String>,
    /// 创建成功后的跳转地址，`{pk}` 会替换为新记录主键；为空时跳到详情页
    pub create_success_url: Option<String>,
    /// 更新成功后的跳转地址，规则同上
    pub update_success_url: Option<String>,
}

impl Default for ViewSettings {
    fn default() -> Self {
        Self {
            update_fields: vec!["name".to_string(), "principal".to_string()],
            create_success_url: None,
            update_success_url: None,
        }
    }
}

impl From<&AppConfiguration> for ViewSettings {
    fn from(config: &AppConfiguration) -> Self {
        Self {
            update_fields: config.views_update_fields.clone(),
            create_success_url: config.views_create_success_url.clone(),
            update_success_url: config.views_update_success_url.clone(),
        }
    }
}

/// 所有 worker 共享的应用状态
pub struct AppState {
    pub store: Arc<dyn SchoolRepository>,
    pub templates: Templates,
    pub routes: Arc<RouteRegistry>,
    pub settings: ViewSettings,
}

impl AppState {
    /// 组装状态：路由表 -> 模板（模板需要路由表做反向解析）
    pub fn new(
        store: Arc<dyn SchoolRepository>,
        templates_dir: Option<&str>,
        settings: ViewSettings,
    ) -> AppResult<Self> {
        let routes = Arc::new(crate::modules::build_routes());
        let templates = Templates::load(templates_dir, routes.clone())?;
        Ok(Self {
            store,
            templates,
            routes,
            settings,
        })
    }
}
