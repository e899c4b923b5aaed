/// 模块管理
/// 包含所有业务模块的定义和导出
pub mod basic_app;

use crate::command_registry::register_module;
use crate::register_route;
use crate::route_registry::RouteRegistry;
use actix_web::{web, Resource};

fn index(resource: Resource) -> Resource {
    resource.route(web::get().to(basic_app::views::index))
}

fn probe(resource: Resource) -> Resource {
    resource.route(web::get().to(basic_app::views::probe))
}

/// 构建完整路由表：站点级路由 + 各模块路由
pub fn build_routes() -> RouteRegistry {
    let mut registry = RouteRegistry::new();
    basic_app::register_basic_app_routes(&mut registry);
    register_route!(registry, "index", "/", "首页", "project", index);
    register_route!(registry, "cbv", "/cbv/", "探活", "project", probe);
    registry
}

/// 注册所有模块的命令
pub fn register_commands() {
    register_module(Box::new(basic_app::BasicAppCommands));
}
