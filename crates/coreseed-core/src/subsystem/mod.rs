//! サブシステムのロール集計
//!
//! 公開サブシステムの有効な行（active variant）で、フィーチャーが割り当てられている
//! セルの列ロールを集め、ロールごとにそれを含むサブシステム名の集合を作る。

pub mod spreadsheet;

use std::collections::{BTreeSet, HashMap};

use log::{Level, Log};
use rayon::prelude::*;
use serde::Serialize;

use crate::error::ReportResult;
use crate::function::{FunctionId, FunctionMap};
use crate::ordering::by_text_then_id;
use crate::runlog::run_log;

pub use spreadsheet::DirectorySource;

/// サブシステムの1セル（カンマ区切りのフィーチャーID）
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CellData {
    features: Vec<String>,
}

impl CellData {
    pub fn new<I, S>(features: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            features: features.into_iter().map(Into::into).collect(),
        }
    }

    /// スプレッドシートのセル文字列から作る
    pub fn parse(text: &str) -> Self {
        Self::new(text.split(',').map(str::trim).filter(|f| !f.is_empty()))
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn features(&self) -> &[String] {
        &self.features
    }
}

/// サブシステムの1行（1ゲノム分）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowData {
    genome: String,
    variant: String,
    cells: Vec<CellData>,
}

impl RowData {
    pub fn new(genome: &str, variant: &str, cells: Vec<CellData>) -> Self {
        Self {
            genome: genome.to_string(),
            variant: variant.to_string(),
            cells,
        }
    }

    pub fn genome(&self) -> &str {
        &self.genome
    }

    pub fn variant(&self) -> &str {
        &self.variant
    }

    /// 有効な variant か
    ///
    /// 先頭の `*`（補助マーク）を除いたコードが空、`0`、`-` 始まりなら無効。
    pub fn is_active(&self) -> bool {
        let code = self.variant.trim().trim_start_matches('*');
        !(code.is_empty() || code == "0" || code.starts_with('-'))
    }

    /// 列 `idx` のセル。行が短い場合は空セル扱い。
    pub fn cell(&self, idx: usize) -> Option<&CellData> {
        self.cells.get(idx)
    }

    pub fn is_empty_at(&self, idx: usize) -> bool {
        self.cell(idx).is_none_or(CellData::is_empty)
    }
}

/// 読み込み済みのサブシステム
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubsystemData {
    id: String,
    name: String,
    roles: Vec<String>,
    rows: Vec<RowData>,
}

impl SubsystemData {
    pub fn new(id: &str, roles: Vec<String>, rows: Vec<RowData>) -> Self {
        Self {
            id: id.to_string(),
            name: subsystem_name(id),
            roles,
            rows,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// ロール列の数
    pub fn width(&self) -> usize {
        self.roles.len()
    }

    pub fn role(&self, idx: usize) -> Option<&str> {
        self.roles.get(idx).map(String::as_str)
    }

    pub fn roles(&self) -> &[String] {
        &self.roles
    }

    pub fn rows(&self) -> &[RowData] {
        &self.rows
    }

    /// 有効な行で1度でも値の入った列番号
    pub fn active_columns(&self) -> BTreeSet<usize> {
        let mut found = BTreeSet::new();
        for row in self.rows.iter().filter(|r| r.is_active()) {
            found.extend((0..self.width()).filter(|&i| !row.is_empty_at(i)));
        }
        found
    }
}

/// サブシステムIDから表示名を作る（`_` → 空白）
pub fn subsystem_name(id: &str) -> String {
    id.replace('_', " ")
}

/// サブシステムの供給元
///
/// ディスク上の CoreSEED ディレクトリ以外（テスト用のメモリ上データなど）も差し込める。
pub trait SubsystemSource: Sync {
    /// 処理対象のサブシステムID（順序は集計結果に影響しないが、ログの順序になる）
    fn subsystem_ids(&self) -> ReportResult<Vec<String>>;

    /// 非公開なら `true`。非公開のサブシステムは読み込まない。
    fn is_private(&self, id: &str) -> ReportResult<bool>;

    fn load(&self, id: &str) -> ReportResult<SubsystemData>;
}

/// 1サブシステムで有効だったロール（正規化前）
///
/// 並列読み込みでも副作用を持たないよう、関数表への登録はマージ時に行う。
#[derive(Debug, Clone)]
struct ActiveRoles {
    name: String,
    role_texts: Vec<String>,
}

impl ActiveRoles {
    fn of(subsystem: &SubsystemData) -> Self {
        let role_texts = subsystem
            .active_columns()
            .into_iter()
            .filter_map(|i| subsystem.role(i).map(str::to_string))
            .collect();
        Self {
            name: subsystem.name().to_string(),
            role_texts,
        }
    }
}

/// ロールレポートの1行
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoleRow {
    pub role_id: FunctionId,
    pub role: String,
    pub subsystems: BTreeSet<String>,
}

/// ロールレポート（ロール表示名の昇順）
#[derive(Debug, Clone, Default, Serialize)]
pub struct RoleReport {
    pub rows: Vec<RoleRow>,
    /// 集計したサブシステム数（非公開を除く）
    pub subsystems: usize,
    /// 非公開のため飛ばしたサブシステム数
    pub private_skipped: usize,
}

/// サブシステム・ロール集計器
pub struct SubsystemRoleAggregator<'a> {
    functions: &'a mut FunctionMap,
    logger: &'a dyn Log,
    role_subs: HashMap<FunctionId, BTreeSet<String>>,
    subsystems: usize,
    private_skipped: usize,
}

impl<'a> SubsystemRoleAggregator<'a> {
    pub fn new(functions: &'a mut FunctionMap) -> Self {
        Self {
            functions,
            logger: log::logger(),
            role_subs: HashMap::with_capacity(12000),
            subsystems: 0,
            private_skipped: 0,
        }
    }

    /// この実行専用のロガーを使う
    pub fn with_logger(mut self, logger: &'a dyn Log) -> Self {
        self.logger = logger;
        self
    }

    /// サブシステム1つを取り込み、有効だったロール数を返す
    pub fn add_subsystem(&mut self, subsystem: &SubsystemData) -> usize {
        self.merge(ActiveRoles::of(subsystem))
    }

    fn merge(&mut self, active: ActiveRoles) -> usize {
        let mut found: BTreeSet<FunctionId> = BTreeSet::new();
        for text in &active.role_texts {
            found.insert(self.functions.find_or_insert(text).id().clone());
        }
        for role_id in &found {
            self.role_subs
                .entry(role_id.clone())
                .or_default()
                .insert(active.name.clone());
        }
        self.subsystems += 1;
        run_log!(self.logger, Level::Info, "{} roles active in {}.", found.len(), active.name);
        found.len()
    }

    /// 供給元の全サブシステムを順に処理する
    pub fn process<S: SubsystemSource>(&mut self, source: &S) -> ReportResult<()> {
        let ids = source.subsystem_ids()?;
        run_log!(self.logger, Level::Info, "{} subsystem directories found.", ids.len());
        for id in &ids {
            if source.is_private(id)? {
                self.skip_private(id);
                continue;
            }
            let subsystem = source.load(id)?;
            self.add_subsystem(&subsystem);
        }
        self.log_summary();
        Ok(())
    }

    /// 読み込みと有効列の抽出を並列に行い、ID順に逐次マージする
    ///
    /// 結果は [`process`](Self::process) と同一。
    pub fn process_parallel<S: SubsystemSource>(&mut self, source: &S) -> ReportResult<()> {
        let ids = source.subsystem_ids()?;
        run_log!(self.logger, Level::Info, "{} subsystem directories found.", ids.len());
        let loaded = ids
            .par_iter()
            .map(|id| {
                if source.is_private(id)? {
                    return Ok(None);
                }
                source.load(id).map(|ss| Some(ActiveRoles::of(&ss)))
            })
            .collect::<ReportResult<Vec<Option<ActiveRoles>>>>()?;
        for (id, active) in ids.iter().zip(loaded) {
            match active {
                Some(active) => {
                    self.merge(active);
                }
                None => self.skip_private(id),
            }
        }
        self.log_summary();
        Ok(())
    }

    fn skip_private(&mut self, id: &str) {
        self.private_skipped += 1;
        run_log!(self.logger, Level::Debug, "Skipping private subsystem {}.", id);
    }

    fn log_summary(&self) {
        run_log!(
            self.logger,
            Level::Info,
            "{} distinct roles found in active variants of {} subsystems.",
            self.role_subs.len(),
            self.subsystems
        );
    }

    /// ロール表示名の昇順に並べてレポートを作る
    pub fn finish(self) -> ReportResult<RoleReport> {
        let mut rows = Vec::with_capacity(self.role_subs.len());
        for (role_id, subsystems) in self.role_subs {
            let role = self.functions.get_name(&role_id)?.to_string();
            rows.push(RoleRow {
                role_id,
                role,
                subsystems,
            });
        }
        rows.sort_by(|a, b| by_text_then_id((a.role.as_str(), &a.role_id), (b.role.as_str(), &b.role_id)));
        Ok(RoleReport {
            rows,
            subsystems: self.subsystems,
            private_skipped: self.private_skipped,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReportError;
    use crate::runlog::capture::CaptureLogger;

    fn cells(texts: &[&str]) -> Vec<CellData> {
        texts.iter().map(|t| CellData::parse(t)).collect()
    }

    fn roles(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    /// メモリ上のサブシステム群
    struct MemorySource {
        subsystems: Vec<SubsystemData>,
        private: Vec<&'static str>,
    }

    impl SubsystemSource for MemorySource {
        fn subsystem_ids(&self) -> ReportResult<Vec<String>> {
            Ok(self.subsystems.iter().map(|s| s.id().to_string()).collect())
        }

        fn is_private(&self, id: &str) -> ReportResult<bool> {
            Ok(self.private.iter().any(|p| *p == id))
        }

        fn load(&self, id: &str) -> ReportResult<SubsystemData> {
            self.subsystems
                .iter()
                .find(|s| s.id() == id)
                .cloned()
                .ok_or_else(|| ReportError::Subsystem {
                    id: id.to_string(),
                    reason: "not found".into(),
                })
        }
    }

    fn glycolysis() -> SubsystemData {
        SubsystemData::new(
            "Glycolysis_core",
            roles(&["Hexokinase", "Enolase", "Pyruvate kinase"]),
            vec![
                // 同じロールを別の列・別の行で参照
                RowData::new("83333.1", "1", cells(&["fig|83333.1.peg.1", "", ""])),
                RowData::new("224308.1", "*2", cells(&["", "", ""])),
                RowData::new("224308.2", "2", cells(&["fig|224308.2.peg.9", "", ""])),
                // 無効な行のロールは数えない
                RowData::new("562.1", "-1", cells(&["", "fig|562.1.peg.4", ""])),
                RowData::new("562.2", "0", cells(&["", "", "fig|562.2.peg.5"])),
            ],
        )
    }

    fn tca() -> SubsystemData {
        SubsystemData::new(
            "TCA_cycle",
            roles(&["hexokinase (EC 2.7.1.1)", "Citrate synthase"]),
            vec![RowData::new("83333.1", "1", cells(&["fig|83333.1.peg.7", "fig|83333.1.peg.8,fig|83333.1.peg.9"]))],
        )
    }

    #[test]
    fn test_row_activity() {
        assert!(RowData::new("g", "1", vec![]).is_active());
        assert!(RowData::new("g", "*1", vec![]).is_active());
        assert!(RowData::new("g", "active", vec![]).is_active());
        assert!(!RowData::new("g", "0", vec![]).is_active());
        assert!(!RowData::new("g", "-1", vec![]).is_active());
        assert!(!RowData::new("g", "*-1", vec![]).is_active());
        assert!(!RowData::new("g", "", vec![]).is_active());
    }

    #[test]
    fn test_cell_parse() {
        assert!(CellData::parse("").is_empty());
        assert!(CellData::parse(" , ").is_empty());
        assert_eq!(CellData::parse("a, b").features(), &["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_active_roles_are_deduplicated_within_subsystem() {
        let mut functions = FunctionMap::new();
        let mut agg = SubsystemRoleAggregator::new(&mut functions);
        let found = agg.add_subsystem(&glycolysis());
        assert_eq!(found, 1);
        let report = agg.finish().unwrap();
        assert_eq!(report.rows.len(), 1);
        assert_eq!(report.rows[0].role, "Hexokinase");
        assert_eq!(report.rows[0].subsystems.iter().collect::<Vec<_>>(), vec!["Glycolysis core"]);
    }

    #[test]
    fn test_same_column_role_twice_counts_once() {
        let ss = SubsystemData::new(
            "Dup",
            roles(&["Enolase", "enolase"]),
            vec![
                RowData::new("g1", "1", cells(&["x", ""])),
                RowData::new("g2", "1", cells(&["", "y"])),
            ],
        );
        let mut functions = FunctionMap::new();
        let mut agg = SubsystemRoleAggregator::new(&mut functions);
        assert_eq!(agg.add_subsystem(&ss), 1);
        let report = agg.finish().unwrap();
        assert_eq!(report.rows.len(), 1);
        assert_eq!(report.rows[0].subsystems.len(), 1);
    }

    #[test]
    fn test_roles_merge_across_subsystems() {
        let mut functions = FunctionMap::new();
        let mut agg = SubsystemRoleAggregator::new(&mut functions);
        agg.add_subsystem(&glycolysis());
        agg.add_subsystem(&tca());
        // 同じサブシステムをもう一度入れても集合は変わらない
        agg.add_subsystem(&tca());
        let report = agg.finish().unwrap();
        let got: Vec<(&str, Vec<&str>)> = report
            .rows
            .iter()
            .map(|r| (r.role.as_str(), r.subsystems.iter().map(String::as_str).collect()))
            .collect();
        assert_eq!(
            got,
            vec![
                ("Citrate synthase", vec!["TCA cycle"]),
                ("Hexokinase", vec!["Glycolysis core", "TCA cycle"]),
            ]
        );
    }

    #[test]
    fn test_private_subsystems_contribute_nothing() {
        let source = MemorySource {
            subsystems: vec![glycolysis(), tca()],
            private: vec!["TCA_cycle"],
        };
        let mut functions = FunctionMap::new();
        let mut agg = SubsystemRoleAggregator::new(&mut functions);
        agg.process(&source).unwrap();
        let report = agg.finish().unwrap();
        assert_eq!(report.subsystems, 1);
        assert_eq!(report.private_skipped, 1);
        assert!(report.rows.iter().all(|r| !r.subsystems.contains("TCA cycle")));
        assert!(report.rows.iter().all(|r| r.role != "Citrate synthase"));
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let source = MemorySource {
            subsystems: vec![glycolysis(), tca()],
            private: vec![],
        };
        let mut seq_functions = FunctionMap::new();
        let mut seq = SubsystemRoleAggregator::new(&mut seq_functions);
        seq.process(&source).unwrap();
        let seq = seq.finish().unwrap();

        let mut par_functions = FunctionMap::new();
        let mut par = SubsystemRoleAggregator::new(&mut par_functions);
        par.process_parallel(&source).unwrap();
        let par = par.finish().unwrap();

        assert_eq!(seq.rows, par.rows);
        assert_eq!(seq.subsystems, par.subsystems);
    }

    #[test]
    fn test_load_failure_aborts() {
        struct Broken;
        impl SubsystemSource for Broken {
            fn subsystem_ids(&self) -> ReportResult<Vec<String>> {
                Ok(vec!["Bad_one".into()])
            }
            fn is_private(&self, _id: &str) -> ReportResult<bool> {
                Ok(false)
            }
            fn load(&self, id: &str) -> ReportResult<SubsystemData> {
                Err(ReportError::Subsystem {
                    id: id.to_string(),
                    reason: "spreadsheet unreadable".into(),
                })
            }
        }
        let mut functions = FunctionMap::new();
        let mut agg = SubsystemRoleAggregator::new(&mut functions);
        let err = agg.process(&Broken).unwrap_err();
        assert_eq!(err.to_string(), "subsystem Bad_one: spreadsheet unreadable");
        let err = agg.process_parallel(&Broken).unwrap_err();
        assert!(matches!(err, ReportError::Subsystem { .. }));
    }

    #[test]
    fn test_shared_function_map_across_reports() {
        let mut functions = FunctionMap::new();
        let hexo = functions.find_or_insert("Hexokinase").id().clone();
        let mut agg = SubsystemRoleAggregator::new(&mut functions);
        agg.add_subsystem(&tca());
        let report = agg.finish().unwrap();
        let row = report.rows.iter().find(|r| r.role_id == hexo).unwrap();
        // 先に登録された表記が表示名になる
        assert_eq!(row.role, "Hexokinase");
    }

    #[test]
    fn test_injected_logger_sees_per_subsystem_lines() {
        let logger = CaptureLogger::default();
        let source = MemorySource {
            subsystems: vec![glycolysis(), tca()],
            private: vec!["Glycolysis_core"],
        };
        let mut functions = FunctionMap::new();
        let mut agg = SubsystemRoleAggregator::new(&mut functions).with_logger(&logger);
        agg.process(&source).unwrap();
        let messages = logger.messages();
        assert!(messages.contains(&"2 subsystem directories found.".to_string()));
        assert!(messages.contains(&"Skipping private subsystem Glycolysis_core.".to_string()));
        assert!(messages.contains(&"2 roles active in TCA cycle.".to_string()));
    }
}
