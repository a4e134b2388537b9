//! 结构化日志模块
//!
//! 基于 tracing 的日志初始化：可重新加载的过滤器、终端输出与可选的日志文件。

use std::fmt;
use std::path::Path;

use parking_lot::RwLock;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    fmt::MakeWriter,
    layer::{Layered, SubscriberExt},
    reload::{self, Handle},
    util::SubscriberInitExt,
    EnvFilter, Layer, Registry,
};

use crate::config::{Config, LoggingConfig};
use crate::error::{ObservabilityError, Result};

/// 日志级别重新加载句柄类型
type ReloadHandle = Handle<EnvFilter, Registry>;

/// 过滤器之上的订阅者类型
type Filtered = Layered<reload::Layer<EnvFilter, Registry>, Registry>;

type BoxedLayer = Box<dyn Layer<Filtered> + Send + Sync + 'static>;

/// 日志管理器
///
/// 持有文件写入线程的 guard，drop 时刷新尚未写出的日志。
pub struct LogManager {
    /// 配置
    config: RwLock<LoggingConfig>,

    /// 过滤器重新加载句柄
    reload_handle: ReloadHandle,

    _file_guard: Option<WorkerGuard>,
}

impl fmt::Debug for LogManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogManager")
            .field("config", &*self.config.read())
            .field("writes_file", &self._file_guard.is_some())
            .finish()
    }
}

impl LogManager {
    /// 创建日志管理器并安装全局订阅者
    pub async fn new(config: &Config) -> Result<Self> {
        let logging = config.logging.clone();

        // 构建环境过滤器
        let filter = build_filter(&logging)?;
        let (filter, reload_handle) = reload::Layer::new(filter);

        let mut layers: Vec<BoxedLayer> = Vec::new();
        if logging.console {
            layers.push(fmt_layer(std::io::stderr, logging.json_format, logging.ansi_colors));
        }

        let mut file_guard = None;
        if let Some(path) = &logging.file_path {
            let (writer, guard) = file_writer(path).await?;
            layers.push(fmt_layer(writer, logging.json_format, false));
            file_guard = Some(guard);
        }

        tracing_subscriber::registry()
            .with(filter)
            .with(layers)
            .try_init()
            .map_err(|e| ObservabilityError::logging(format!("Failed to install subscriber: {}", e)))?;

        tracing::info!(
            target: "folio_observability",
            "Log manager initialized with level: {}",
            logging.level
        );

        Ok(Self {
            config: RwLock::new(logging),
            reload_handle,
            _file_guard: file_guard,
        })
    }

    /// 动态更新日志级别
    pub fn update_level(&self, level: &str) -> Result<()> {
        let new_filter = EnvFilter::try_new(level)
            .map_err(|e| ObservabilityError::logging(format!("Invalid log level: {}", e)))?;

        self.reload_handle
            .modify(|filter| {
                *filter = new_filter;
            })
            .map_err(|e| ObservabilityError::logging(format!("Failed to update log level: {}", e)))?;

        self.config.write().level = level.to_string();

        tracing::info!(
            target: "folio_observability",
            "Log level updated to: {}",
            level
        );

        Ok(())
    }

    /// 当前日志级别
    pub fn level(&self) -> String {
        self.config.read().level.clone()
    }

    /// 获取当前配置
    pub fn config(&self) -> LoggingConfig {
        self.config.read().clone()
    }
}

/// 构建环境过滤器；设置了 `RUST_LOG` 时以它为准
fn build_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    let directives = match std::env::var(EnvFilter::DEFAULT_ENV) {
        Ok(from_env) if !from_env.trim().is_empty() => from_env,
        _ => config.level.clone(),
    };

    let mut filter = EnvFilter::try_new(&directives)
        .map_err(|e| ObservabilityError::logging(format!("Invalid log level: {}", e)))?;

    // 添加模块级别的过滤器
    for (module, level) in &config.module_levels {
        filter = filter.add_directive(
            format!("{}={}", module, level)
                .parse()
                .map_err(|e| ObservabilityError::logging(format!("Invalid directive: {}", e)))?,
        );
    }

    Ok(filter)
}

fn fmt_layer<W>(writer: W, json: bool, ansi: bool) -> BoxedLayer
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let layer = tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_target(true)
        .with_ansi(ansi);

    if json {
        layer.json().boxed()
    } else {
        layer.boxed()
    }
}

async fn file_writer(path: &Path) -> Result<(tracing_appender::non_blocking::NonBlocking, WorkerGuard)> {
    let file_name = path
        .file_name()
        .ok_or_else(|| ObservabilityError::config(format!("Log file path has no file name: {:?}", path)))?;
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::path::PathBuf::from("."),
    };

    tokio::fs::create_dir_all(&dir).await?;

    let appender = tracing_appender::rolling::never(dir, file_name);
    Ok(tracing_appender::non_blocking(appender))
}

/// 创建带有会话上下文的 span
pub fn session_span(session_id: &str) -> tracing::Span {
    tracing::info_span!("session", session_id = %session_id)
}

/// 创建命令行子命令的 span
pub fn command_span(command: &str) -> tracing::Span {
    tracing::info_span!("command", command = %command)
}
