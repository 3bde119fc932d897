//! 注入されたロガーへの出力
//!
//! 集計器はグローバルロガーに直接書かず、生成時に渡された `&dyn log::Log` に書く。
//! 既定値は `log::logger()` なので、通常は `env_logger` 等の設定がそのまま効く。

/// `run_log!(logger, Level::Info, "fmt", args...)`
///
/// ターゲットは `log` のマクロと同じく呼び出し元のモジュールパス。
macro_rules! run_log {
    ($logger:expr, $level:expr, $($arg:tt)+) => {{
        let logger: &dyn ::log::Log = $logger;
        let metadata = ::log::Metadata::builder()
            .level($level)
            .target(module_path!())
            .build();
        if logger.enabled(&metadata) {
            logger.log(
                &::log::Record::builder()
                    .metadata(metadata)
                    .args(format_args!($($arg)+))
                    .module_path(Some(module_path!()))
                    .file(Some(file!()))
                    .line(Some(line!()))
                    .build(),
            );
        }
    }};
}

pub(crate) use run_log;
