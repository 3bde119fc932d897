//! PATRIC → CoreSEED 関数マッピングの集計
//!
//! 入力は `protMapping.tbl` の各行（`patric_function`, `core_function`, `count`, `good`）。
//! 良好なマッピングのうち、正規化後も関数が変わるものだけを残し、
//! CoreSEED 関数ごとの出現数を累積する。

use std::collections::HashMap;
use std::io::BufRead;

use log::{Level, Log};
use serde::Serialize;

use crate::counter::CountMap;
use crate::error::ReportResult;
use crate::function::{FunctionId, FunctionMap};
use crate::ordering;
use crate::runlog::run_log;
use crate::tabbed::{Line, TabbedReader};

/// CoreSEED 関数の列名
pub const CORE_FUNCTION_COL: &str = "core_function";
/// PATRIC 関数の列名
pub const PATRIC_FUNCTION_COL: &str = "patric_function";
/// 出現数の列名
pub const COUNT_COL: &str = "count";
/// マッピングの良否フラグの列名
pub const GOOD_COL: &str = "good";

/// 入力の1行分
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingTuple {
    pub patric_function: String,
    pub core_function: String,
    pub count: u64,
    pub good: bool,
}

impl MappingTuple {
    pub fn new(patric_function: &str, core_function: &str, count: u64, good: bool) -> Self {
        Self {
            patric_function: patric_function.to_string(),
            core_function: core_function.to_string(),
            count,
            good,
        }
    }
}

/// 入力表の列位置
#[derive(Debug, Clone, Copy)]
pub struct MappingColumns {
    core: usize,
    patric: usize,
    count: usize,
    good: usize,
}

impl MappingColumns {
    /// ヘッダから4列を探す。どれか欠けていればエラー。
    pub fn locate<R: BufRead>(reader: &TabbedReader<R>) -> ReportResult<Self> {
        Ok(Self {
            core: reader.find_field(CORE_FUNCTION_COL)?,
            patric: reader.find_field(PATRIC_FUNCTION_COL)?,
            count: reader.find_field(COUNT_COL)?,
            good: reader.find_field(GOOD_COL)?,
        })
    }
}

/// PATRIC 関数 1つ分のマッピング（キーは PATRIC 関数 ID）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingRecord {
    pub core_id: FunctionId,
    /// この行自身の出現数。レポートには累積値を使う。
    pub occurrence_count: u64,
}

impl MappingRecord {
    pub fn new(core_id: FunctionId, occurrence_count: u64) -> Self {
        Self {
            core_id,
            occurrence_count,
        }
    }
}

/// レポートの1行
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MappingRow {
    pub core_id: FunctionId,
    pub core_function: String,
    pub patric_id: FunctionId,
    pub patric_function: String,
    /// CoreSEED 関数の最終的な累積出現数
    pub count: u64,
}

/// 並び順確定済みのマッピングレポート
#[derive(Debug, Clone, Default, Serialize)]
pub struct MappingReport {
    pub rows: Vec<MappingRow>,
    /// 読み込んだ入力行数
    pub lines_read: usize,
    /// 対象となった CoreSEED 関数の数
    pub core_functions: usize,
}

/// マッピング集計器
pub struct FunctionMappingAggregator<'a> {
    functions: &'a mut FunctionMap,
    logger: &'a dyn Log,
    records: HashMap<FunctionId, MappingRecord>,
    core_counts: CountMap<FunctionId>,
    lines_read: usize,
}

impl<'a> FunctionMappingAggregator<'a> {
    pub fn new(functions: &'a mut FunctionMap) -> Self {
        Self {
            functions,
            logger: log::logger(),
            records: HashMap::with_capacity(5000),
            core_counts: CountMap::new(),
            lines_read: 0,
        }
    }

    /// この実行専用のロガーを使う
    pub fn with_logger(mut self, logger: &'a dyn Log) -> Self {
        self.logger = logger;
        self
    }

    /// 1行を取り込む。マッピングとして残った場合は `true`。
    pub fn fold(&mut self, tuple: &MappingTuple) -> bool {
        self.lines_read += 1;
        if !tuple.good {
            return false;
        }
        match self.distinct_ids(&tuple.patric_function, &tuple.core_function) {
            Some((patric_id, core_id)) => {
                self.upsert(patric_id, core_id, tuple.count);
                true
            }
            None => false,
        }
    }

    /// 表の1行を取り込む
    ///
    /// `good` が偽の行と変換になっていない行は `count` を読まずに捨てる。
    /// 残る行の `count` が不正ならエラー。
    pub fn fold_line(&mut self, columns: &MappingColumns, line: &Line) -> ReportResult<bool> {
        self.lines_read += 1;
        if !line.get_flag(columns.good)? {
            return Ok(false);
        }
        let Some((patric_id, core_id)) = self.distinct_ids(line.get(columns.patric)?, line.get(columns.core)?)
        else {
            return Ok(false);
        };
        let count = line.get_int(columns.count)?;
        self.upsert(patric_id, core_id, count);
        Ok(true)
    }

    /// 両方の関数を登録し、異なる関数なら ID の組を返す
    fn distinct_ids(&mut self, patric_function: &str, core_function: &str) -> Option<(FunctionId, FunctionId)> {
        let patric_id = self.functions.find_or_insert(patric_function).id().clone();
        let core_id = self.functions.find_or_insert(core_function).id().clone();
        // 同じなら名前の変換になっていない
        (patric_id != core_id).then_some((patric_id, core_id))
    }

    fn upsert(&mut self, patric_id: FunctionId, core_id: FunctionId, count: u64) {
        // 同じ PATRIC 関数が再度現れたら後勝ち。旧 CoreSEED 関数のカウントは戻さない。
        let replaced = self
            .records
            .insert(patric_id.clone(), MappingRecord::new(core_id.clone(), count));
        if let Some(old) = replaced {
            if old.core_id != core_id {
                run_log!(
                    self.logger,
                    Level::Debug,
                    "{} remapped from {} to {}.",
                    patric_id,
                    old.core_id,
                    core_id
                );
            }
        }
        self.core_counts.count(core_id, count);
    }

    /// 行のストリームを取り込む。途中のエラーで全体を中断する。
    pub fn ingest<I>(&mut self, tuples: I) -> ReportResult<()>
    where
        I: IntoIterator<Item = ReportResult<MappingTuple>>,
    {
        for tuple in tuples {
            self.fold(&tuple?);
        }
        self.log_summary();
        Ok(())
    }

    /// タブ区切り表を取り込む
    pub fn read_table<R: BufRead>(&mut self, reader: TabbedReader<R>) -> ReportResult<()> {
        run_log!(self.logger, Level::Info, "Processing mappings in {}.", reader.source_name());
        let columns = MappingColumns::locate(&reader)?;
        for line in reader {
            self.fold_line(&columns, &line?)?;
        }
        self.log_summary();
        Ok(())
    }

    fn log_summary(&self) {
        run_log!(
            self.logger,
            Level::Info,
            "{} mappings found in {} input lines, targeting {} coreSEED functions.",
            self.records.len(),
            self.lines_read,
            self.core_counts.len()
        );
    }

    pub fn records(&self) -> &HashMap<FunctionId, MappingRecord> {
        &self.records
    }

    pub fn core_counts(&self) -> &CountMap<FunctionId> {
        &self.core_counts
    }

    /// 並べ替えてレポートを作る
    pub fn finish(self) -> ReportResult<MappingReport> {
        run_log!(self.logger, Level::Info, "Sorting output.");
        let order = ordering::sorted_patric_ids(&self.records, &self.core_counts, self.functions)?;
        let mut rows = Vec::with_capacity(order.len());
        for patric_id in order {
            let record = &self.records[patric_id];
            rows.push(MappingRow {
                core_id: record.core_id.clone(),
                core_function: self.functions.get_name(&record.core_id)?.to_string(),
                patric_id: patric_id.clone(),
                patric_function: self.functions.get_name(patric_id)?.to_string(),
                count: self.core_counts.get(&record.core_id),
            });
        }
        Ok(MappingReport {
            rows,
            lines_read: self.lines_read,
            core_functions: self.core_counts.len(),
        })
    }
}
