use actix_web::{
    http::{header, StatusCode},
    HttpResponse,
};

// 通用 HTTP 响应封装（HTML、纯文本、跳转）
// Generic HTTP response helpers (HTML, plain text, redirect)

pub enum AutoBody {
    Html(String),
    Text(String),
}

// 渲染好的模板
// Rendered template
pub fn respond_html<S: Into<String>>(code: StatusCode, body: S) -> HttpResponse {
    respond_body(code, AutoBody::Html(body.into()))
}

// 纯文本
// Plain text
pub fn respond_text<S: Into<String>>(code: StatusCode, body: S) -> HttpResponse {
    respond_body(code, AutoBody::Text(body.into()))
}

// 指定体裁响应
// Response with explicit body kind
pub fn respond_body(code: StatusCode, body: AutoBody) -> HttpResponse {
    match body {
        AutoBody::Html(s) => HttpResponse::build(code)
            .content_type("text/html; charset=utf-8")
            .body(s),
        AutoBody::Text(s) => HttpResponse::build(code)
            .content_type("text/plain; charset=utf-8")
            .body(s),
    }
}

// 302 跳转
// 302 redirect
pub fn redirect_found<S: AsRef<str>>(location: S) -> HttpResponse {
    HttpResponse::build(StatusCode::FOUND)
        .insert_header((header::LOCATION, location.as_ref()))
        .finish()
}
