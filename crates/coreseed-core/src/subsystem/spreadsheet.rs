//! CoreSEED データディレクトリからのサブシステム読み込み
//!
//! `<core>/Subsystems/<id>/spreadsheet` の形式:
//!
//! ```text
//! abbr<TAB>role          ← ロール定義（列順）
//! //
//! subset 定義（読み飛ばす）
//! //
//! genome<TAB>variant<TAB>cell_1<TAB>...<TAB>cell_n
//! ```
//!
//! 同じディレクトリの `EXCHANGABLE` の1行目が `1` なら公開、それ以外は非公開。

use std::fs;
use std::io::{self, BufRead};
use std::path::{Path, PathBuf};

use super::{CellData, RowData, SubsystemData, SubsystemSource};
use crate::error::{ReportError, ReportResult};
use crate::io::open_reader;

/// データディレクトリ内のサブシステムディレクトリ名
pub const SUBSYSTEM_DIR: &str = "Subsystems";
/// スプレッドシートのファイル名
pub const SPREADSHEET_FILE: &str = "spreadsheet";
/// 公開フラグのファイル名（綴りは SEED の慣習どおり）
pub const EXCHANGABLE_FILE: &str = "EXCHANGABLE";

const SECTION_END: &str = "//";

/// ディレクトリ上のサブシステム群
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    /// `root` はサブシステムディレクトリ群の親
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// CoreSEED データディレクトリ直下の `Subsystems` を使う
    pub fn in_core_dir(core_dir: &Path) -> Self {
        Self::new(core_dir.join(SUBSYSTEM_DIR))
    }

    fn subsystem_path(&self, id: &str) -> PathBuf {
        self.root.join(id)
    }
}

impl SubsystemSource for DirectorySource {
    /// スプレッドシートを持つ、`.` で始まらないディレクトリ（ID 昇順）
    fn subsystem_ids(&self) -> ReportResult<Vec<String>> {
        let entries = fs::read_dir(&self.root).map_err(|e| ReportError::io(&self.root, e))?;
        let mut ids = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| ReportError::io(&self.root, e))?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.starts_with('.') {
                continue;
            }
            let path = entry.path();
            if path.is_dir() && path.join(SPREADSHEET_FILE).is_file() {
                ids.push(name);
            }
        }
        ids.sort();
        Ok(ids)
    }

    fn is_private(&self, id: &str) -> ReportResult<bool> {
        let path = self.subsystem_path(id).join(EXCHANGABLE_FILE);
        match fs::read_to_string(&path) {
            Ok(text) => Ok(text.lines().next().map(str::trim) != Some("1")),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(true),
            Err(e) => Err(ReportError::io(path, e)),
        }
    }

    fn load(&self, id: &str) -> ReportResult<SubsystemData> {
        let path = self.subsystem_path(id).join(SPREADSHEET_FILE);
        let reader = open_reader(&path).map_err(|e| ReportError::Subsystem {
            id: id.to_string(),
            reason: format!("cannot open {}: {e}", path.display()),
        })?;
        parse_spreadsheet(id, reader)
    }
}

/// スプレッドシートを解析する
pub fn parse_spreadsheet<R: BufRead>(id: &str, reader: R) -> ReportResult<SubsystemData> {
    let bad = |reason: String| ReportError::Subsystem {
        id: id.to_string(),
        reason,
    };
    let mut roles = Vec::new();
    let mut rows = Vec::new();
    let mut section = 0;
    for (idx, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| bad(format!("read error: {e}")))?;
        let line = line.trim_end_matches('\r');
        if line.trim() == SECTION_END {
            section += 1;
            continue;
        }
        if line.trim().is_empty() {
            continue;
        }
        match section {
            0 => {
                let (_abbr, role) = line
                    .split_once('\t')
                    .ok_or_else(|| bad(format!("role line {} has no tab", idx + 1)))?;
                roles.push(role.trim().to_string());
            }
            1 => {}
            _ => {
                let mut fields = line.split('\t');
                let (Some(genome), Some(variant)) = (fields.next(), fields.next()) else {
                    return Err(bad(format!("row line {} has fewer than 2 fields", idx + 1)));
                };
                let cells = fields.map(CellData::parse).collect();
                rows.push(RowData::new(genome.trim(), variant, cells));
            }
        }
    }
    Ok(SubsystemData::new(id, roles, rows))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHEET: &str = "\
HK\tHexokinase (EC 2.7.1.1)
ENO\tEnolase (EC 4.2.1.11)
PK\tPyruvate kinase (EC 2.7.1.40)
//
aux\t2
//
83333.1\t1\tfig|83333.1.peg.10\t\tfig|83333.1.peg.12
224308.1\t-1\t\tfig|224308.1.peg.3
562.1\t*3\t\tfig|562.1.peg.5,fig|562.1.peg.6
";

    fn write_subsystem(root: &Path, id: &str, sheet: &str, exchangable: Option<&str>) {
        let dir = root.join(id);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(SPREADSHEET_FILE), sheet).unwrap();
        if let Some(flag) = exchangable {
            fs::write(dir.join(EXCHANGABLE_FILE), flag).unwrap();
        }
    }

    #[test]
    fn test_parse_spreadsheet() {
        let ss = parse_spreadsheet("Glycolysis_core", SHEET.as_bytes()).unwrap();
        assert_eq!(ss.name(), "Glycolysis core");
        assert_eq!(ss.width(), 3);
        assert_eq!(ss.role(1), Some("Enolase (EC 4.2.1.11)"));
        assert_eq!(ss.roles()[2], "Pyruvate kinase (EC 2.7.1.40)");
        assert_eq!(ss.rows().len(), 3);
        assert_eq!(ss.rows()[0].genome(), "83333.1");
        assert_eq!(ss.rows()[2].variant(), "*3");
        assert!(!ss.rows()[1].is_active());
        // 末尾の欠けたセルは空扱い
        assert!(ss.rows()[1].is_empty_at(2));
        assert_eq!(ss.rows()[2].cell(1).unwrap().features().len(), 2);
        assert_eq!(ss.active_columns().into_iter().collect::<Vec<_>>(), vec![0, 1, 2]);
    }

    #[test]
    fn test_parse_rejects_role_without_tab() {
        let err = parse_spreadsheet("Bad", "no tab here\n//\n//\n".as_bytes()).unwrap_err();
        assert_eq!(err.to_string(), "subsystem Bad: role line 1 has no tab");
    }

    #[test]
    fn test_parse_rejects_short_row() {
        let err = parse_spreadsheet("Bad", "A\tRole\n//\n//\n83333.1\n".as_bytes()).unwrap_err();
        assert!(err.to_string().contains("row line 4"), "{err}");
    }

    #[test]
    fn test_directory_listing_and_privacy() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().join(SUBSYSTEM_DIR);
        write_subsystem(&root, "Glycolysis_core", SHEET, Some("1\n"));
        write_subsystem(&root, "Secret_pathway", SHEET, Some("0\n"));
        write_subsystem(&root, "No_flag", SHEET, None);
        write_subsystem(&root, ".hidden", SHEET, Some("1\n"));
        fs::create_dir_all(root.join("Empty_dir")).unwrap();

        let source = DirectorySource::in_core_dir(tmp.path());
        let ids = source.subsystem_ids().unwrap();
        assert_eq!(ids, vec!["Glycolysis_core", "No_flag", "Secret_pathway"]);
        assert!(!source.is_private("Glycolysis_core").unwrap());
        assert!(source.is_private("Secret_pathway").unwrap());
        assert!(source.is_private("No_flag").unwrap());

        let ss = source.load("Glycolysis_core").unwrap();
        assert_eq!(ss.width(), 3);
    }

    #[test]
    fn test_missing_root_is_io_error() {
        let tmp = tempfile::tempdir().unwrap();
        let source = DirectorySource::in_core_dir(tmp.path());
        assert!(matches!(source.subsystem_ids().unwrap_err(), ReportError::Io { .. }));
    }

    #[test]
    fn test_missing_spreadsheet_names_subsystem() {
        let tmp = tempfile::tempdir().unwrap();
        let source = DirectorySource::new(tmp.path());
        let err = source.load("Ghost").unwrap_err();
        assert!(err.to_string().starts_with("subsystem Ghost: cannot open"), "{err}");
    }
}
