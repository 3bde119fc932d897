//! コマンド定義と実行
//!
//! コマンド名 → 処理の対応は [`Command`] の列挙で固定する。

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use coreseed_core::io::open_writer;
use coreseed_core::{
    DirectorySource, FunctionMap, FunctionMappingAggregator, ReportTable, SubsystemRoleAggregator, TabbedReader,
};
use log::info;

use crate::config::{CliOverrides, ServiceConfig, load_config_file, merge_config};
use crate::render::{OutputFormat, Renderer};

#[derive(Parser, Debug)]
#[command(about = "CoreSEED データディレクトリのレポート生成")]
pub struct Cli {
    /// 設定ファイル（TOML）
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// 出力形式
    #[arg(long, value_enum, global = true)]
    pub format: Option<OutputFormat>,

    /// 出力先（`-` は標準出力、`.gz` は圧縮）
    #[arg(short, long, global = true)]
    pub output: Option<PathBuf>,

    /// ロール検索リンクのプレフィックス（HTML 出力）
    #[arg(long, global = true)]
    pub search_url: Option<String>,

    /// サブシステムを並列に読み込む
    #[arg(long, global = true)]
    pub parallel: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// 共通の位置引数
#[derive(Args, Debug, Clone)]
pub struct CoreDirArgs {
    /// CoreSEED データディレクトリ（設定ファイルの `core_dir` でも可）
    pub core_dir: Option<PathBuf>,
}

/// レポートコマンド
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// PATRIC 関数 → CoreSEED 関数の変換一覧
    #[command(name = "show-map", alias = "showMap")]
    ShowMap(CoreDirArgs),

    /// サブシステムの有効な variant に現れるロールの一覧
    #[command(name = "subsystem-roles", alias = "subsystemRoles")]
    SubsystemRoles(CoreDirArgs),
}

/// レポートを作る処理
pub type Handler = fn(&ServiceConfig) -> Result<ReportTable>;

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::ShowMap(_) => "show-map",
            Command::SubsystemRoles(_) => "subsystem-roles",
        }
    }

    pub fn handler(&self) -> Handler {
        match self {
            Command::ShowMap(_) => show_map,
            Command::SubsystemRoles(_) => subsystem_roles,
        }
    }

    pub fn core_dir(&self) -> Option<&Path> {
        match self {
            Command::ShowMap(args) | Command::SubsystemRoles(args) => args.core_dir.as_deref(),
        }
    }
}

impl Cli {
    /// 設定ファイルを読み、CLI の値で上書きした実行時設定を作る
    pub fn service_config(&self) -> Result<ServiceConfig> {
        let file = self.config.as_ref().map(load_config_file).transpose()?;
        merge_config(
            file,
            CliOverrides {
                core_dir: self.command.core_dir().map(Path::to_path_buf),
                format: self.format,
                output: self.output.clone(),
                search_url: self.search_url.clone(),
                parallel: self.parallel,
            },
        )
    }
}

/// `protMapping.tbl` から関数マッピング表を作る
pub fn show_map(config: &ServiceConfig) -> Result<ReportTable> {
    let path = config.mapping_path();
    let reader = TabbedReader::open(&path)?;
    let mut functions = FunctionMap::new();
    let mut agg = FunctionMappingAggregator::new(&mut functions);
    agg.read_table(reader)
        .with_context(|| format!("Failed to process mappings in {}", path.display()))?;
    let report = agg.finish()?;
    info!("Formatting output table.");
    Ok(report.to_table())
}

/// `Subsystems` ディレクトリからロール表を作る
pub fn subsystem_roles(config: &ServiceConfig) -> Result<ReportTable> {
    let source = DirectorySource::new(config.subsystem_path());
    let mut functions = FunctionMap::new();
    let mut agg = SubsystemRoleAggregator::new(&mut functions);
    if config.parallel {
        agg.process_parallel(&source)?;
    } else {
        agg.process(&source)?;
    }
    let report = agg.finish()?;
    info!(
        "{} roles from {} subsystems ({} private skipped).",
        report.rows.len(),
        report.subsystems,
        report.private_skipped
    );
    Ok(report.to_table())
}

/// コマンドを実行して出力先に書き出す
pub fn run(command: &Command, config: &ServiceConfig) -> Result<()> {
    info!("Running {} on {}.", command.name(), config.core_dir.display());
    let table = (command.handler())(config)?;
    let mut out = open_writer(&config.output)
        .with_context(|| format!("Failed to open output: {}", config.output.display()))?;
    Renderer::new(config.format, &config.search_url).render(&table, &mut out)?;
    out.close()
        .with_context(|| format!("Failed to finish output: {}", config.output.display()))?;
    Ok(())
}
