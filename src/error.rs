use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use thiserror::Error;

/// 统一的应用错误类型
#[derive(Error, Debug)]
pub enum AppError {
    #[error("配置错误: {0}")]
    Config(#[from] crate::comm::config::ConfigError),

    #[error("验证错误: {field}: {message}")]
    Validation { field: String, message: String },

    #[error("数据库错误: {message}")]
    Database { message: String },

    #[error("模板错误: {message}")]
    Template { message: String },

    #[error("资源未找到: {resource}")]
    NotFound { resource: String },

    #[error("内部错误: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// 创建验证错误
    pub fn validation<T: Into<String>, U: Into<String>>(field: T, message: U) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// 创建数据库错误
    pub fn database<T: Into<String>>(message: T) -> Self {
        Self::Database {
            message: message.into(),
        }
    }

    /// 创建资源未找到错误
    pub fn not_found<T: Into<String>>(resource: T) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    /// 获取错误代码
    pub fn error_code(&self) -> i32 {
        match self {
            AppError::Config(_) => 1001,
            AppError::Validation { .. } => 1004,
            AppError::Database { .. } => 1006,
            AppError::Template { .. } => 1007,
            AppError::NotFound { .. } => 1009,
            AppError::Internal(_) => 1000,
        }
    }

    /// 获取HTTP状态码
    ///
    /// 视图层的表单验证失败不会走到这里（表单会带着错误重新渲染），
    /// 这里的 `Validation` 只来自配置或字段白名单校验，属于服务端错误。
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::Config(_)
            | AppError::Validation { .. }
            | AppError::Database { .. }
            | AppError::Template { .. }
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::RowNotFound => AppError::not_found("row"),
            other => AppError::database(other.to_string()),
        }
    }
}

impl From<tera::Error> for AppError {
    fn from(e: tera::Error) -> Self {
        // tera 的顶层错误信息通常只有 "Failed to render"，需要拼上 source 链
        let mut message = e.to_string();
        let mut source = std::error::Error::source(&e);
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }
        AppError::Template { message }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        AppError::status_code(self)
    }

    fn error_response(&self) -> HttpResponse {
        let status = AppError::status_code(self);
        let message = self.to_string();

        // 记录错误日志
        match self {
            AppError::NotFound { .. } => {
                tracing::info!(code = self.error_code(), "Client error: {}", message);
            }
            _ => {
                tracing::error!(code = self.error_code(), "Internal error: {}", message);
            }
        }

        let title = status.canonical_reason().unwrap_or("Error");
        let detail = match self {
            AppError::NotFound { resource } => format!("No {} found matching the query", resource),
            _ => "The server encountered an internal error.".to_string(),
        };

        HttpResponse::build(status)
            .content_type("text/html; charset=utf-8")
            .body(format!(
                "<!DOCTYPE html>\n<html><head><title>{status} {title}</title></head>\
                 <body><h1>{title}</h1><p>{detail}</p></body></html>",
                status = status.as_u16(),
                title = title,
                detail = tera::escape_html(&detail),
            ))
    }
}

/// 应用结果类型
pub type AppResult<T> = Result<T, AppError>;
