/// CoreSEED データディレクトリのレポート生成
///
/// 使い方:
///   # PATRIC → CoreSEED 関数マッピング（protMapping.tbl）
///   coreseed_services show-map /vol/core-seed
///
///   # サブシステムの有効ロール一覧を HTML で
///   coreseed_services --format html -o roles.html subsystem-roles /vol/core-seed
///
///   # 設定ファイルを使う
///   coreseed_services --config services.toml subsystem-roles
use anyhow::Result;
use clap::Parser;

use tools::command::{self, Cli};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = cli.service_config()?;
    command::run(&cli.command, &config)
}
