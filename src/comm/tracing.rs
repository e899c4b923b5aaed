use anyhow::Result;
use chrono::{Datelike, Timelike};
use tracing_bunyan_formatter::{BunyanFormattingLayer, JsonStorageLayer};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter, Registry};

/// 本地时间，精确到百分之一秒
struct LogTimer;

impl fmt::time::FormatTime for LogTimer {
    fn format_time(&self, w: &mut fmt::format::Writer<'_>) -> std::fmt::Result {
        let now = chrono::Local::now();
        let cs = now.timestamp_subsec_millis() / 10;
        write!(
            w,
            "{:04}-{:02}-{:02} {:02}:{:02}:{:02}.{:02}",
            now.year(),
            now.month(),
            now.day(),
            now.hour(),
            now.minute(),
            now.second(),
            cs
        )
    }
}

/// 初始化日志
///
/// `RUST_LOG` 优先于配置中的 `logging.level`；`json_format` 为 true 时输出 bunyan JSON。
/// 重复调用（例如测试里）不会报错。
pub fn init_tracing(level: &str, json_format: bool) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(format!("{},sqlx=warn", level)))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    if json_format {
        let formatting_layer = BunyanFormattingLayer::new("advcbv".into(), std::io::stdout);
        Registry::default()
            .with(env_filter)
            .with(JsonStorageLayer)
            .with(formatting_layer)
            .try_init()
            .ok();
    } else {
        fmt::Subscriber::builder()
            .with_env_filter(env_filter)
            .with_timer(LogTimer)
            .compact()
            .with_target(false)
            .finish()
            .try_init()
            .ok();
    }
    Ok(())
}
