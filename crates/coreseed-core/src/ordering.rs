//! レポート行の並び順
//!
//! 比較関数は外部状態をキャプチャしない。必要なマップは引数で受け取り、
//! 先にソートキーを作ってから並べる。

use std::cmp::{Ordering, Reverse};
use std::collections::HashMap;

use crate::counter::CountMap;
use crate::error::{ReportError, ReportResult};
use crate::function::{FunctionId, FunctionMap};
use crate::mapping::MappingRecord;

/// マッピングレポートのソートキー
///
/// 1. CoreSEED 関数の累積カウント（降順）
/// 2. CoreSEED 関数の表示テキスト（昇順）
/// 3. PATRIC 関数 ID（昇順）
///
/// PATRIC 関数 ID はマップのキーで一意なので全順序になる。
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct MappingSortKey<'a> {
    core_count: Reverse<u64>,
    core_text: &'a str,
    patric_id: &'a FunctionId,
}

impl<'a> MappingSortKey<'a> {
    /// `patric_id` のレコードからキーを作る
    pub fn new(
        patric_id: &'a FunctionId,
        records: &'a HashMap<FunctionId, MappingRecord>,
        core_counts: &CountMap<FunctionId>,
        functions: &'a FunctionMap,
    ) -> ReportResult<Self> {
        let record = records.get(patric_id).ok_or_else(|| ReportError::Lookup(patric_id.clone()))?;
        Ok(Self {
            core_count: Reverse(core_counts.get(&record.core_id)),
            core_text: functions.get_name(&record.core_id)?,
            patric_id,
        })
    }
}

/// 2つの PATRIC 関数の順序を比較する
pub fn compare_patric(
    left: &FunctionId,
    right: &FunctionId,
    records: &HashMap<FunctionId, MappingRecord>,
    core_counts: &CountMap<FunctionId>,
    functions: &FunctionMap,
) -> ReportResult<Ordering> {
    let l = MappingSortKey::new(left, records, core_counts, functions)?;
    let r = MappingSortKey::new(right, records, core_counts, functions)?;
    Ok(l.cmp(&r))
}

/// 全 PATRIC 関数 ID をレポート順に並べる
pub fn sorted_patric_ids<'a>(
    records: &'a HashMap<FunctionId, MappingRecord>,
    core_counts: &CountMap<FunctionId>,
    functions: &'a FunctionMap,
) -> ReportResult<Vec<&'a FunctionId>> {
    let mut keys = records
        .keys()
        .map(|id| MappingSortKey::new(id, records, core_counts, functions))
        .collect::<ReportResult<Vec<_>>>()?;
    keys.sort_unstable();
    Ok(keys.into_iter().map(|k| k.patric_id).collect())
}

/// 表示テキスト昇順、同じなら ID 昇順
pub fn by_text_then_id(left: (&str, &FunctionId), right: (&str, &FunctionId)) -> Ordering {
    left.0.cmp(right.0).then_with(|| left.1.cmp(right.1))
}
