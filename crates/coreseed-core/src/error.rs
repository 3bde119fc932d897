//! レポート生成のエラー型
//!
//! どのエラーもレポート全体を中断させる。部分的なレポートは作らない。

use std::path::PathBuf;

use crate::function::FunctionId;

/// 集計・入力読み取りで発生するエラー
#[derive(thiserror::Error, Debug)]
pub enum ReportError {
    /// 登録されていない関数IDを参照した（呼び出し側のバグ）
    #[error("unknown function id {0}")]
    Lookup(FunctionId),

    /// 入力表に必要な列がない
    #[error("missing column \"{field}\" in {source_name}")]
    MissingField { field: String, source_name: String },

    /// 値が解釈できない（数値でないカウント、負のカウント、不正なフラグなど）
    #[error("{source_name} line {line}: bad value {value:?} in column \"{field}\": {reason}")]
    MalformedValue {
        source_name: String,
        line: usize,
        field: String,
        value: String,
        reason: String,
    },

    /// サブシステムのディレクトリやスプレッドシートが読めない
    #[error("subsystem {id}: {reason}")]
    Subsystem { id: String, reason: String },

    /// 外部I/Oのエラー（そのまま伝播する）
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ReportError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ReportError::Io { path: path.into(), source }
    }
}

/// 集計処理の Result 型
pub type ReportResult<T> = Result<T, ReportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_value_message_names_the_record() {
        let err = ReportError::MalformedValue {
            source_name: "protMapping.tbl".into(),
            line: 7,
            field: "count".into(),
            value: "ten".into(),
            reason: "not a number".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("protMapping.tbl line 7"), "{msg}");
        assert!(msg.contains("\"count\""), "{msg}");
        assert!(msg.contains("\"ten\""), "{msg}");
    }

    #[test]
    fn test_io_error_keeps_source() {
        let err = ReportError::io("/no/such/file", std::io::Error::from(std::io::ErrorKind::NotFound));
        assert!(err.to_string().contains("/no/such/file"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
