//! 模板渲染
//!
//! 内置模板编译进二进制，`templates.dir` 中的同名文件优先。
//! 模板里可以用 `url(name="basic_app:detail", pk=school.id)` 反向解析路由。

use crate::error::AppResult;
use crate::response::respond_html;
use crate::route_registry::RouteRegistry;
use actix_web::{http::StatusCode, HttpResponse};
use std::collections::HashMap;
use std::sync::Arc;
use tera::{Context, Tera, Value};
use tracing::info;

const BUILTIN_TEMPLATES: [(&str, &str); 6] = [
    ("base.html", include_str!("../templates/base.html")),
    ("index.html", include_str!("../templates/index.html")),
    (
        "basic_app/school_list.html",
        include_str!("../templates/basic_app/school_list.html"),
    ),
    (
        "basic_app/school_detail.html",
        include_str!("../templates/basic_app/school_detail.html"),
    ),
    (
        "basic_app/school_form.html",
        include_str!("../templates/basic_app/school_form.html"),
    ),
    (
        "basic_app/school_confirm_delete.html",
        include_str!("../templates/basic_app/school_confirm_delete.html"),
    ),
];

/// 模板引擎封装
pub struct Templates {
    tera: Tera,
}

impl Templates {
    /// 加载模板：先读取目录（如果配置了），再补上缺失的内置模板
    pub fn load(dir: Option<&str>, routes: Arc<RouteRegistry>) -> AppResult<Self> {
        let mut tera = match dir {
            Some(dir) => {
                let glob = format!("{}/**/*.html", dir.trim_end_matches('/'));
                // 只解析不建继承链，目录里的模板可能继承内置的 base.html
                let tera = Tera::parse(&glob)?;
                info!(dir, count = tera.get_template_names().count(), "已加载模板目录");
                tera
            }
            None => Tera::default(),
        };

        let mut builtin = Tera::default();
        builtin.add_raw_templates(BUILTIN_TEMPLATES.to_vec())?;
        // extend 不会覆盖已存在的同名模板，并在合并后建立继承链
        tera.extend(&builtin)?;

        tera.register_function("url", move |args: &HashMap<String, Value>| -> tera::Result<Value> {
            let name = args
                .get("name")
                .and_then(Value::as_str)
                .ok_or_else(|| tera::Error::msg("url() 需要 name 参数"))?;
            let params: Vec<(String, String)> = args
                .iter()
                .filter(|(key, _)| key.as_str() != "name")
                .map(|(key, value)| {
                    let value = match value {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    };
                    (key.clone(), value)
                })
                .collect();
            routes
                .reverse(name, &params)
                .map(Value::String)
                .map_err(|e| tera::Error::msg(e.to_string()))
        });

        Ok(Self { tera })
    }

    /// 渲染为字符串
    pub fn render(&self, template_name: &str, context: &Context) -> AppResult<String> {
        Ok(self.tera.render(template_name, context)?)
    }

    /// 渲染为 200 HTML 响应
    pub fn render_response(&self, template_name: &str, context: &Context) -> AppResult<HttpResponse> {
        let body = self.render(template_name, context)?;
        Ok(respond_html(StatusCode::OK, body))
    }

    pub fn has_template(&self, template_name: &str) -> bool {
        self.tera.get_template_names().any(|name| name == template_name)
    }
}

/// 所有视图共享的基础上下文
pub fn base_context(view: &str) -> Context {
    let mut context = Context::new();
    context.insert("view", view);
    context
}

/// 在基础上下文上合并额外条目，同名键以 `extra` 为准
pub fn extend_context(mut base: Context, extra: Context) -> Context {
    base.extend(extra);
    base
}
