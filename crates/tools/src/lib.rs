//! CoreSEED データディレクトリに対するレポートコマンド群
//!
//! 集計は `coreseed_core` が行い、このクレートは設定・コマンド選択・出力整形を受け持つ。

pub mod command;
pub mod config;
pub mod render;
