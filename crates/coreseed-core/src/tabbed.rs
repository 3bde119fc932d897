//! ヘッダ付きタブ区切りファイルの読み取り

use std::io::BufRead;
use std::path::Path;
use std::rc::Rc;

use crate::error::{ReportError, ReportResult};
use crate::io::open_reader;

/// ヘッダ付きタブ区切りリーダー
///
/// 1行目を列名として読み、以降の行を [`Line`] として返す。空行は飛ばす。
pub struct TabbedReader<R> {
    source_name: Rc<str>,
    headers: Rc<[String]>,
    inner: std::io::Lines<R>,
    line_no: usize,
}

impl TabbedReader<Box<dyn BufRead>> {
    /// ファイルを開く（`.gz` は展開、`-` は標準入力）
    pub fn open<P: AsRef<Path>>(path: P) -> ReportResult<Self> {
        let p = path.as_ref();
        let reader = open_reader(p).map_err(|e| ReportError::io(p, e))?;
        let name = p.file_name().map_or_else(|| p.display().to_string(), |n| n.to_string_lossy().into_owned());
        Self::new(name, reader)
    }
}

impl<R: BufRead> TabbedReader<R> {
    /// `source_name` はエラーメッセージ用の名前
    pub fn new(source_name: impl Into<String>, reader: R) -> ReportResult<Self> {
        let source_name: Rc<str> = Rc::from(source_name.into());
        let mut inner = reader.lines();
        let headers: Vec<String> = match inner.next() {
            Some(line) => {
                let line = line.map_err(|e| ReportError::io(&*source_name, e))?;
                split_fields(&line)
            }
            // 空ファイルは列なしとして扱い、find_field で失敗させる
            None => Vec::new(),
        };
        Ok(Self {
            source_name,
            headers: headers.into(),
            inner,
            line_no: 1,
        })
    }

    /// 列名から列番号を引く
    pub fn find_field(&self, name: &str) -> ReportResult<usize> {
        self.headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| ReportError::MissingField {
                field: name.to_string(),
                source_name: self.source_name.to_string(),
            })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn source_name(&self) -> &str {
        &self.source_name
    }
}

impl<R: BufRead> Iterator for TabbedReader<R> {
    type Item = ReportResult<Line>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = self.inner.next()?;
            self.line_no += 1;
            let line = match line {
                Ok(l) => l,
                Err(e) => return Some(Err(ReportError::io(&*self.source_name, e))),
            };
            if line.trim().is_empty() {
                continue;
            }
            return Some(Ok(Line {
                source_name: Rc::clone(&self.source_name),
                headers: Rc::clone(&self.headers),
                number: self.line_no,
                fields: split_fields(&line),
            }));
        }
    }
}

fn split_fields(line: &str) -> Vec<String> {
    line.trim_end_matches(['\r', '\n']).split('\t').map(str::to_string).collect()
}

/// タブ区切りファイルのデータ行
#[derive(Debug, Clone)]
pub struct Line {
    source_name: Rc<str>,
    headers: Rc<[String]>,
    number: usize,
    fields: Vec<String>,
}

impl Line {
    /// ファイル内の行番号（ヘッダが1行目）
    pub fn number(&self) -> usize {
        self.number
    }

    pub fn get(&self, idx: usize) -> ReportResult<&str> {
        self.fields
            .get(idx)
            .map(String::as_str)
            .ok_or_else(|| self.malformed(idx, "", "field missing from line"))
    }

    /// 非負整数として読む
    pub fn get_int(&self, idx: usize) -> ReportResult<u64> {
        let raw = self.get(idx)?;
        let text = raw.trim();
        match text.parse::<u64>() {
            Ok(n) => Ok(n),
            Err(_) if text.parse::<i64>().is_ok() => Err(self.malformed(idx, raw, "count is negative")),
            Err(_) => Err(self.malformed(idx, raw, "not a number")),
        }
    }

    /// 真偽値として読む
    ///
    /// `1 y yes t true` が真、空欄と `0 n no f false` が偽（大文字小文字は問わない）。
    pub fn get_flag(&self, idx: usize) -> ReportResult<bool> {
        let raw = self.get(idx)?;
        match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "y" | "yes" | "t" | "true" => Ok(true),
            "" | "0" | "n" | "no" | "f" | "false" => Ok(false),
            _ => Err(self.malformed(idx, raw, "not a truth value")),
        }
    }

    fn malformed(&self, idx: usize, value: &str, reason: &str) -> ReportError {
        let field = self.headers.get(idx).cloned().unwrap_or_else(|| format!("#{}", idx + 1));
        ReportError::MalformedValue {
            source_name: self.source_name.to_string(),
            line: self.number,
            field,
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }
}
