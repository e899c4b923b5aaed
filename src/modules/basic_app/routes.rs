use super::views;
use crate::register_route;
use crate::route_registry::RouteRegistry;
use actix_web::{web, Resource};

/// 模块名，同时是路由名的命名空间前缀
pub const MODULE: &str = "basic_app";

fn list(resource: Resource) -> Resource {
    resource.route(web::get().to(views::school_list))
}

fn detail(resource: Resource) -> Resource {
    resource.route(web::get().to(views::school_detail))
}

fn create(resource: Resource) -> Resource {
    resource
        .route(web::get().to(views::school_create_form))
        .route(web::post().to(views::school_create))
}

fn update(resource: Resource) -> Resource {
    resource
        .route(web::get().to(views::school_update_form))
        .route(web::post().to(views::school_update))
}

fn delete(resource: Resource) -> Resource {
    resource
        .route(web::get().to(views::school_delete_confirm))
        .route(web::post().to(views::school_delete))
}

/// 注册 basic_app 的路由
///
/// `create/` 必须排在 `{pk}` 之前；`{pk:\d+}` 本身也只匹配数字。
pub fn register_basic_app_routes(registry: &mut RouteRegistry) {
    register_route!(registry, "basic_app:list", "/basic_app/", "School 列表", MODULE, list);
    register_route!(registry, "basic_app:create", "/basic_app/create/", "创建 School", MODULE, create);
    register_route!(registry, "basic_app:detail", r"/basic_app/{pk:\d+}/", "School 详情", MODULE, detail);
    register_route!(registry, "basic_app:update", r"/basic_app/update/{pk:\d+}/", "更新 School", MODULE, update);
    register_route!(registry, "basic_app:delete", r"/basic_app/delete/{pk:\d+}/", "删除 School", MODULE, delete);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_routes_registered_in_order() {
        let mut registry = RouteRegistry::new();
        register_basic_app_routes(&mut registry);

        let names: Vec<&str> = registry.get_routes().iter().map(|r| r.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "basic_app:list",
                "basic_app:create",
                "basic_app:detail",
                "basic_app:update",
                "basic_app:delete"
            ]
        );
        assert_eq!(registry.get_routes_by_module(MODULE).len(), 5);
    }

    #[test]
    fn test_reverse_names() {
        let mut registry = RouteRegistry::new();
        register_basic_app_routes(&mut registry);

        assert_eq!(registry.reverse::<&str, &str>("basic_app:list", &[]).unwrap(), "/basic_app/");
        assert_eq!(registry.reverse("basic_app:detail", &[("pk", "7")]).unwrap(), "/basic_app/7/");
        assert_eq!(
            registry.reverse("basic_app:update", &[("pk", "7")]).unwrap(),
            "/basic_app/update/7/"
        );
        assert_eq!(
            registry.reverse("basic_app:delete", &[("pk", "7")]).unwrap(),
            "/basic_app/delete/7/"
        );
    }
}
