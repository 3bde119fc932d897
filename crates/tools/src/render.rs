//! レポート表の整形出力（テキスト / TSV / JSON / HTML）

use std::io::Write;

use anyhow::Result;
use clap::ValueEnum;
use coreseed_core::{Cell, ColKind, ReportTable};
use serde::{Deserialize, Serialize};

/// 出力形式
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// 桁揃えしたテキスト表
    #[default]
    Text,
    /// タブ区切り
    Tsv,
    /// JSON
    Json,
    /// 単体の HTML ページ
    Html,
}

/// 表の出力器
pub struct Renderer<'a> {
    format: OutputFormat,
    /// ロール検索リンクのプレフィックス（HTML のみ）
    search_url: &'a str,
}

impl<'a> Renderer<'a> {
    pub fn new(format: OutputFormat, search_url: &'a str) -> Self {
        Self { format, search_url }
    }

    pub fn render<W: Write>(&self, table: &ReportTable, out: &mut W) -> Result<()> {
        match self.format {
            OutputFormat::Text => write_text(table, out)?,
            OutputFormat::Tsv => write_tsv(table, out)?,
            OutputFormat::Json => {
                serde_json::to_writer_pretty(&mut *out, table)?;
                writeln!(out)?;
            }
            OutputFormat::Html => write_html(table, self.search_url, out)?,
        }
        Ok(())
    }
}

/// テキスト・TSV 用のセル文字列
fn cell_text(cell: &Cell) -> String {
    match cell {
        Cell::List(items) => format!("{}: {}", items.len(), items.join(", ")),
        other => other.plain(),
    }
}

fn write_text<W: Write>(table: &ReportTable, out: &mut W) -> std::io::Result<()> {
    let texts: Vec<Vec<String>> = table.rows.iter().map(|r| r.iter().map(cell_text).collect()).collect();
    let mut widths: Vec<usize> = table.columns.iter().map(|c| c.label.chars().count()).collect();
    for row in &texts {
        for (w, text) in widths.iter_mut().zip(row) {
            *w = (*w).max(text.chars().count());
        }
    }

    writeln!(out, "{}", table.title)?;
    writeln!(out, "{}", "=".repeat(table.title.chars().count()))?;
    let header: Vec<String> = table
        .columns
        .iter()
        .zip(&widths)
        .map(|(c, &w)| match c.kind {
            ColKind::Num => format!("{:>w$}", c.label),
            ColKind::Text => format!("{:<w$}", c.label),
        })
        .collect();
    writeln!(out, "{}", header.join("  ").trim_end())?;
    let total: usize = widths.iter().sum::<usize>() + 2 * widths.len().saturating_sub(1);
    writeln!(out, "{}", "-".repeat(total))?;

    for (row, cells) in texts.iter().zip(&table.rows) {
        let line: Vec<String> = row
            .iter()
            .zip(cells)
            .zip(table.columns.iter().zip(&widths))
            .map(|((text, cell), (col, &w))| {
                // 数値列でも内訳付きのセルは左寄せ
                if col.kind == ColKind::Num && matches!(cell, Cell::Num(_)) {
                    format!("{text:>w$}")
                } else {
                    format!("{text:<w$}")
                }
            })
            .collect();
        writeln!(out, "{}", line.join("  ").trim_end())?;
    }
    writeln!(out, "{} rows.", table.rows.len())?;
    Ok(())
}

fn write_tsv<W: Write>(table: &ReportTable, out: &mut W) -> std::io::Result<()> {
    let header: Vec<&str> = table.columns.iter().map(|c| c.label.as_str()).collect();
    writeln!(out, "{}", header.join("\t"))?;
    for row in &table.rows {
        let fields: Vec<String> = row
            .iter()
            .map(|cell| match cell {
                Cell::List(items) => items.join(", "),
                other => other.plain(),
            })
            .map(|s| s.replace(['\t', '\n'], " "))
            .collect();
        writeln!(out, "{}", fields.join("\t"))?;
    }
    Ok(())
}

/// HTML の特殊文字をエスケープする
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

/// ロール検索リンクの URL
pub fn search_link(search_url: &str, text: &str) -> String {
    let query: String = url::form_urlencoded::byte_serialize(text.as_bytes()).collect();
    format!("{search_url}{query}")
}

fn write_html<W: Write>(table: &ReportTable, search_url: &str, out: &mut W) -> std::io::Result<()> {
    let title = escape_html(&table.title);
    writeln!(out, "<!DOCTYPE html>")?;
    writeln!(out, "<html>")?;
    writeln!(out, "<head><meta charset=\"utf-8\"><title>{title}</title></head>")?;
    writeln!(out, "<body>")?;
    writeln!(out, "<h1>{title}</h1>")?;
    writeln!(out, "<p>{}</p>", escape_html(&table.legend))?;
    writeln!(out, "<div class=\"highlight\">")?;
    writeln!(out, "<table>")?;
    write!(out, "<tr>")?;
    for col in &table.columns {
        let class = match col.kind {
            ColKind::Num => " class=\"num\"",
            ColKind::Text => "",
        };
        write!(out, "<th{class}>{}</th>", escape_html(&col.label))?;
    }
    writeln!(out, "</tr>")?;
    for row in &table.rows {
        write!(out, "<tr>")?;
        for cell in row {
            match cell {
                Cell::Text(s) => write!(out, "<td>{}</td>", escape_html(s))?,
                Cell::Search(s) => write!(
                    out,
                    "<td><a href=\"{}\">{}</a></td>",
                    escape_html(&search_link(search_url, s)),
                    escape_html(s)
                )?,
                Cell::Num(n) => write!(out, "<td class=\"num\">{n}</td>")?,
                Cell::List(items) => write!(
                    out,
                    "<td class=\"num\" title=\"{}\">{}</td>",
                    escape_html(&items.join("\n")),
                    items.len()
                )?,
            }
        }
        writeln!(out, "</tr>")?;
    }
    writeln!(out, "</table>")?;
    writeln!(out, "</div>")?;
    writeln!(out, "</body>")?;
    writeln!(out, "</html>")?;
    Ok(())
}
