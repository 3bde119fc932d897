//! 表示用の表モデル
//!
//! 集計結果を列定義とセルの並びに変換する。HTML やテキストへの整形は呼び出し側で行う。

use serde::Serialize;

use crate::mapping::MappingReport;
use crate::subsystem::RoleReport;

/// 列の表示種別
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColKind {
    /// 左寄せのテキスト
    Text,
    /// 右寄せの数値
    Num,
}

/// 列定義
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColSpec {
    pub label: String,
    pub kind: ColKind,
}

impl ColSpec {
    pub fn text(label: &str) -> Self {
        Self {
            label: label.to_string(),
            kind: ColKind::Text,
        }
    }

    pub fn num(label: &str) -> Self {
        Self {
            label: label.to_string(),
            kind: ColKind::Num,
        }
    }
}

/// セルの値
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    Text(String),
    /// ロール検索へのリンクにするテキスト
    Search(String),
    Num(u64),
    /// 件数と、その内訳の名前
    List(Vec<String>),
}

impl Cell {
    /// リンクや件数を除いたプレーンな文字列
    pub fn plain(&self) -> String {
        match self {
            Cell::Text(s) | Cell::Search(s) => s.clone(),
            Cell::Num(n) => n.to_string(),
            Cell::List(items) => items.len().to_string(),
        }
    }
}

/// 表示用の表
#[derive(Debug, Clone, Serialize)]
pub struct ReportTable {
    pub title: String,
    pub legend: String,
    pub columns: Vec<ColSpec>,
    pub rows: Vec<Vec<Cell>>,
}

const MAPPING_LEGEND: &str = "Each PATRIC function is mapped to a single CoreSEED function. \
The count indicates the number of times the unmapped function occurred in the sample genomes from PATRIC. \
Click on a link in the first column to search for CoreSEED features containing the specified function.";

const ROLE_LEGEND: &str = "Click on a role link to see all features containing the specified role. \
The count shows the number of subsystems in which the role is active.";

impl MappingReport {
    pub fn to_table(&self) -> ReportTable {
        ReportTable {
            title: "Function Mapping".to_string(),
            legend: MAPPING_LEGEND.to_string(),
            columns: vec![
                ColSpec::text("core_function"),
                ColSpec::text("patric_function"),
                ColSpec::num("patric_count"),
            ],
            rows: self
                .rows
                .iter()
                .map(|r| {
                    vec![
                        Cell::Search(r.core_function.clone()),
                        Cell::Text(r.patric_function.clone()),
                        Cell::Num(r.count),
                    ]
                })
                .collect(),
        }
    }
}

impl RoleReport {
    pub fn to_table(&self) -> ReportTable {
        ReportTable {
            title: "Roles in Subsystems".to_string(),
            legend: ROLE_LEGEND.to_string(),
            columns: vec![ColSpec::text("Role"), ColSpec::num("subsystems")],
            rows: self
                .rows
                .iter()
                .map(|r| {
                    vec![
                        Cell::Search(r.role.clone()),
                        Cell::List(r.subsystems.iter().cloned().collect()),
                    ]
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::function::FunctionId;
    use crate::mapping::MappingRow;
    use crate::subsystem::RoleRow;

    #[test]
    fn test_mapping_table_columns() {
        let report = MappingReport {
            rows: vec![MappingRow {
                core_id: FunctionId::from("Core"),
                core_function: "core".into(),
                patric_id: FunctionId::from("Patr"),
                patric_function: "patric".into(),
                count: 42,
            }],
            lines_read: 1,
            core_functions: 1,
        };
        let table = report.to_table();
        assert_eq!(table.title, "Function Mapping");
        assert_eq!(table.columns[2], ColSpec::num("patric_count"));
        assert_eq!(
            table.rows[0],
            vec![Cell::Search("core".into()), Cell::Text("patric".into()), Cell::Num(42)]
        );
    }

    #[test]
    fn test_role_table_lists_subsystems() {
        let report = RoleReport {
            rows: vec![RoleRow {
                role_id: FunctionId::from("Enol"),
                role: "Enolase".into(),
                subsystems: ["TCA cycle".to_string(), "Glycolysis".to_string()].into_iter().collect(),
            }],
            subsystems: 2,
            private_skipped: 0,
        };
        let table = report.to_table();
        assert_eq!(table.columns.len(), 2);
        let cell = &table.rows[0][1];
        assert_eq!(cell, &Cell::List(vec!["Glycolysis".into(), "TCA cycle".into()]));
        assert_eq!(cell.plain(), "2");
    }
}
