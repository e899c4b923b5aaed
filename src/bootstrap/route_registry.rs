use crate::error::{AppError, AppResult};
use actix_web::dev::ResourceDef;
use actix_web::{web, Resource};
use anyhow::anyhow;
use std::collections::{HashMap, HashSet};
use tracing::info;

/// 路由配置函数类型：给已经带好路径和名称的资源挂上各个方法的处理函数
pub type RouteConfigFn = fn(Resource) -> Resource;

/// 路由信息结构
#[derive(Debug, Clone)]
pub struct RouteInfo {
    /// 反向解析用的名称，例如 `basic_app:detail`
    pub name: String,
    /// actix 路径模式，例如 `/basic_app/{pk:\d+}/`
    pub path: String,
    pub description: String,
    pub module: String,
    pub config_fn: RouteConfigFn,
}

/// 路由注册器
///
/// 按注册顺序保存，actix 也按这个顺序匹配。
#[derive(Debug, Default)]
pub struct RouteRegistry {
    routes: Vec<RouteInfo>,
}

impl RouteRegistry {
    /// 创建新的路由注册器
    pub fn new() -> Self {
        Self { routes: Vec::new() }
    }

    /// 注册路由，同名路由会被替换
    pub fn register_route(&mut self, route_info: RouteInfo) {
        match self.routes.iter_mut().find(|r| r.name == route_info.name) {
            Some(existing) => *existing = route_info,
            None => self.routes.push(route_info),
        }
    }

    /// 获取所有路由
    pub fn get_routes(&self) -> &[RouteInfo] {
        &self.routes
    }

    /// 按名称查找路由
    pub fn get_route(&self, name: &str) -> Option<&RouteInfo> {
        self.routes.iter().find(|r| r.name == name)
    }

    /// 获取指定模块的路由
    pub fn get_routes_by_module(&self, module: &str) -> Vec<&RouteInfo> {
        self.routes
            .iter()
            .filter(|route| route.module == module)
            .collect()
    }

    /// 配置所有路由到 ServiceConfig
    pub fn configure_all_routes(&self, cfg: &mut web::ServiceConfig) {
        for route_info in &self.routes {
            let resource = web::resource(route_info.path.as_str()).name(&route_info.name);
            cfg.service((route_info.config_fn)(resource));
        }
    }

    /// 反向解析：按名称和参数生成路径
    ///
    /// 由 actix 的 `ResourceDef` 填充 `{name}` / `{name:regex}` 段，参数值先做 URL 编码。
    /// 缺少参数或多余参数都视为错误。
    pub fn reverse<K: AsRef<str>, V: AsRef<str>>(
        &self,
        name: &str,
        params: &[(K, V)],
    ) -> AppResult<String> {
        let route = self
            .get_route(name)
            .ok_or_else(|| AppError::Internal(anyhow!("未注册的路由: {}", name)))?;

        if let Some((extra, _)) = params
            .iter()
            .find(|(k, _)| !Self::has_segment(&route.path, k.as_ref()))
        {
            return Err(AppError::Internal(anyhow!(
                "反向解析 '{}' 收到多余参数 '{}'",
                name,
                extra.as_ref()
            )));
        }

        let values: HashMap<&str, String> = params
            .iter()
            .map(|(k, v)| (k.as_ref(), urlencoding::encode(v.as_ref()).into_owned()))
            .collect();

        let mut out = String::with_capacity(route.path.len());
        if !ResourceDef::new(route.path.as_str()).resource_path_from_map(&mut out, &values) {
            return Err(AppError::Internal(anyhow!("反向解析 '{}' 缺少参数", name)));
        }
        Ok(out)
    }

    fn has_segment(path: &str, segment: &str) -> bool {
        path.contains(&format!("{{{}}}", segment)) || path.contains(&format!("{{{}:", segment))
    }

    /// 获取路由统计信息
    pub fn get_stats(&self) -> (usize, Vec<String>) {
        let mut modules: Vec<String> = self
            .routes
            .iter()
            .map(|route| route.module.clone())
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        modules.sort();
        (self.routes.len(), modules)
    }

    /// 打印路由信息
    pub fn print_routes_info(&self) {
        let (total, modules) = self.get_stats();
        for module in &modules {
            for route in self.get_routes_by_module(module) {
                info!(module = %module, "{} {} - {}", route.name, route.path, route.description);
            }
        }
        info!("总计: {} 个路由, {} 个模块", total, modules.len());
    }
}

/// 便捷宏：注册路由
#[macro_export]
macro_rules! register_route {
    ($registry:expr, $name:expr, $path:expr, $description:expr, $module:expr, $config_fn:expr) => {
        $registry.register_route($crate::route_registry::RouteInfo {
            name: $name.to_string(),
            path: $path.to_string(),
            description: $description.to_string(),
            module: $module.to_string(),
            config_fn: $config_fn,
        })
    };
}
