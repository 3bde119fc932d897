//! CoreSEED アノテーションレポートの集計コア
//!
//! 関数名マッピング（PATRIC → CoreSEED）とサブシステムのロール表を読み込み、
//! 重複を除いた並び順の確定したレポート行を生成する。
//! ファイル形式の読み取りは [`tabbed`] と [`subsystem::spreadsheet`]、
//! 表示は呼び出し側の責務で、集計部分はどちらにも依存しない。

pub mod counter;
pub mod error;
pub mod function;
pub mod io;
pub mod mapping;
pub mod ordering;
pub mod report;
pub mod subsystem;
pub mod tabbed;

mod runlog;

pub use counter::CountMap;
pub use error::{ReportError, ReportResult};
pub use function::{CanonicalFunction, FunctionId, FunctionMap};
pub use mapping::{FunctionMappingAggregator, MappingRecord, MappingReport, MappingRow, MappingTuple};
pub use ordering::MappingSortKey;
pub use report::{Cell, ColKind, ColSpec, ReportTable};
pub use subsystem::{
    CellData, DirectorySource, RoleReport, RoleRow, RowData, SubsystemData, SubsystemRoleAggregator,
    SubsystemSource,
};
pub use tabbed::{Line, TabbedReader};
