//! 設定ファイル（TOML）とコマンドライン引数のマージ
//!
//! 優先順位: コマンドライン > 設定ファイル > 既定値

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use crate::render::OutputFormat;

/// マッピング表の既定ファイル名
pub const DEFAULT_MAPPING_FILE: &str = "protMapping.tbl";
/// サブシステムディレクトリの既定名
pub const DEFAULT_SUBSYSTEM_DIR: &str = "Subsystems";
/// ロール検索リンクの既定プレフィックス（検索テキストを後ろに付ける）
pub const DEFAULT_SEARCH_URL: &str = "search?role=";

/// 設定ファイルの内容（全項目省略可）
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceConfigFile {
    #[serde(default)]
    pub core_dir: Option<PathBuf>,
    #[serde(default)]
    pub format: Option<OutputFormat>,
    #[serde(default)]
    pub output: Option<PathBuf>,
    #[serde(default)]
    pub search_url: Option<String>,
    #[serde(default)]
    pub parallel: Option<bool>,
    #[serde(default)]
    pub mapping_file: Option<String>,
    #[serde(default)]
    pub subsystem_dir: Option<String>,
}

/// コマンドラインで指定された値
#[derive(Clone, Debug, Default)]
pub struct CliOverrides {
    pub core_dir: Option<PathBuf>,
    pub format: Option<OutputFormat>,
    pub output: Option<PathBuf>,
    pub search_url: Option<String>,
    /// `--parallel` は立てた場合のみ上書きする
    pub parallel: bool,
}

/// 実行時設定
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServiceConfig {
    pub core_dir: PathBuf,
    pub format: OutputFormat,
    /// `-` は標準出力
    pub output: PathBuf,
    pub search_url: String,
    pub parallel: bool,
    pub mapping_file: String,
    pub subsystem_dir: String,
}

impl ServiceConfig {
    /// マッピング表のパス
    pub fn mapping_path(&self) -> PathBuf {
        self.core_dir.join(&self.mapping_file)
    }

    /// サブシステムディレクトリのパス
    pub fn subsystem_path(&self) -> PathBuf {
        self.core_dir.join(&self.subsystem_dir)
    }
}

pub fn load_config_file<P: AsRef<Path>>(path: P) -> Result<ServiceConfigFile> {
    let path = path.as_ref();
    let data = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    toml::from_str(&data).with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// 設定ファイルと CLI をマージする。データディレクトリがどちらにもなければエラー。
pub fn merge_config(file: Option<ServiceConfigFile>, cli: CliOverrides) -> Result<ServiceConfig> {
    let file = file.unwrap_or_default();
    let Some(core_dir) = cli.core_dir.or(file.core_dir) else {
        bail!("No CoreSEED data directory given (positional argument or `core_dir` in the config file)");
    };
    Ok(ServiceConfig {
        core_dir,
        format: cli.format.or(file.format).unwrap_or_default(),
        output: cli.output.or(file.output).unwrap_or_else(|| PathBuf::from("-")),
        search_url: cli
            .search_url
            .or(file.search_url)
            .unwrap_or_else(|| DEFAULT_SEARCH_URL.to_string()),
        parallel: cli.parallel || file.parallel.unwrap_or(false),
        mapping_file: file.mapping_file.unwrap_or_else(|| DEFAULT_MAPPING_FILE.to_string()),
        subsystem_dir: file.subsystem_dir.unwrap_or_else(|| DEFAULT_SUBSYSTEM_DIR.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn precedence_cli_over_config() {
        let file = ServiceConfigFile {
            core_dir: Some("/data/file".into()),
            format: Some(OutputFormat::Html),
            output: Some("out.html".into()),
            search_url: Some("https://example.org/find?q=".into()),
            parallel: Some(true),
            mapping_file: Some("protMapping.tbl.gz".into()),
            subsystem_dir: None,
        };
        let cli = CliOverrides {
            core_dir: Some("/data/cli".into()),
            format: Some(OutputFormat::Json),
            ..Default::default()
        };
        let merged = merge_config(Some(file), cli).unwrap();
        assert_eq!(merged.core_dir, PathBuf::from("/data/cli"));
        assert_eq!(merged.format, OutputFormat::Json);
        assert_eq!(merged.output, PathBuf::from("out.html"));
        assert_eq!(merged.search_url, "https://example.org/find?q=");
        assert!(merged.parallel);
        assert_eq!(merged.mapping_path(), PathBuf::from("/data/cli/protMapping.tbl.gz"));
        assert_eq!(merged.subsystem_path(), PathBuf::from("/data/cli/Subsystems"));
    }

    #[test]
    fn defaults_without_config_file() {
        let cli = CliOverrides {
            core_dir: Some("core".into()),
            ..Default::default()
        };
        let merged = merge_config(None, cli).unwrap();
        assert_eq!(merged.format, OutputFormat::Text);
        assert_eq!(merged.output, PathBuf::from("-"));
        assert_eq!(merged.search_url, DEFAULT_SEARCH_URL);
        assert!(!merged.parallel);
        assert_eq!(merged.mapping_file, DEFAULT_MAPPING_FILE);
    }

    #[test]
    fn missing_core_dir_is_error() {
        let err = merge_config(None, CliOverrides::default()).unwrap_err();
        assert!(err.to_string().contains("No CoreSEED data directory"));
    }

    #[test]
    fn parse_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("services.toml");
        std::fs::write(&path, "core_dir = \"/vol/core\"\nformat = \"tsv\"\nparallel = true\n").unwrap();
        let file = load_config_file(&path).unwrap();
        assert_eq!(file.core_dir, Some(PathBuf::from("/vol/core")));
        assert_eq!(file.format, Some(OutputFormat::Tsv));
        assert_eq!(file.parallel, Some(true));
    }

    #[test]
    fn unknown_key_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("services.toml");
        std::fs::write(&path, "cookie_dir = \"/tmp\"\n").unwrap();
        assert!(load_config_file(&path).is_err());
    }
}
