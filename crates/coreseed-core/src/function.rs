//! 関数記述文字列の正規化と ID 割当
//!
//! 機能アノテーションは表記ゆれ（大文字小文字、句読点、EC番号、コメント）を含むため、
//! 正規化したテキストをキーにして安定した ID を発行する。
//! ID は単語の先頭4文字を連結した「マジックID」で、衝突時のみ数字を付ける。

use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::error::{ReportError, ReportResult};

/// IDの語幹に使う単語数の上限
const MAX_ID_WORDS: usize = 5;
/// 各単語から取る文字数
const ID_WORD_LEN: usize = 4;

/// 単語が取れなかった場合の語幹
const EMPTY_STEM: &str = "Unknown";

/// ID の語幹から除外する語
const FILLER_WORDS: &[&str] = &["a", "an", "and", "by", "for", "from", "in", "of", "or", "the", "to", "with"];

/// `(EC 1.2.3.4)` / `(TC 2.A.1.1.1)` 形式の注記
static EC_TC_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\(\s*(?:EC|TC)\s+[0-9A-Za-z.\-]+\s*\)").expect("valid regex"));

/// 英数字以外の連続
static SEPARATOR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^0-9a-z]+").expect("valid regex"));

/// 正規化済み関数の ID
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct FunctionId(String);

impl FunctionId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FunctionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FunctionId {
    fn from(s: &str) -> Self {
        FunctionId(s.to_string())
    }
}

/// 正規化済みの関数
///
/// 一度作られたら変更されない。所有者は [`FunctionMap`]。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalFunction {
    id: FunctionId,
    display_text: String,
}

impl CanonicalFunction {
    pub fn id(&self) -> &FunctionId {
        &self.id
    }

    /// 最初に見た表記（コメント除去・前後空白除去済み）
    pub fn display_text(&self) -> &str {
        &self.display_text
    }
}

/// 関数記述 → 正規化関数の対応表
///
/// 1回のレポート実行の間だけ使う。削除操作はない。
#[derive(Debug, Default)]
pub struct FunctionMap {
    /// 正規化キー → ID
    by_key: HashMap<String, FunctionId>,
    /// ID → 関数
    by_id: HashMap<FunctionId, CanonicalFunction>,
}

impl FunctionMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// 生の記述に対応する関数を返す。未登録なら登録する。
    pub fn find_or_insert(&mut self, raw: &str) -> &CanonicalFunction {
        let display = comment_free(raw);
        let key = normalize(display);
        let id = match self.by_key.get(&key) {
            Some(id) => id.clone(),
            None => {
                let id = self.allocate_id(&key);
                self.by_key.insert(key, id.clone());
                self.by_id.insert(
                    id.clone(),
                    CanonicalFunction {
                        id: id.clone(),
                        display_text: display.to_string(),
                    },
                );
                id
            }
        };
        &self.by_id[&id]
    }

    /// ID から表示用テキストを引く
    pub fn get_name(&self, id: &FunctionId) -> ReportResult<&str> {
        self.by_id
            .get(id)
            .map(|f| f.display_text.as_str())
            .ok_or_else(|| ReportError::Lookup(id.clone()))
    }

    /// 登録済みの関数の数
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    fn allocate_id(&self, key: &str) -> FunctionId {
        let stem = id_stem(key);
        if !self.by_id.contains_key(stem.as_str()) {
            return FunctionId(stem);
        }
        // 語幹が使用済みなら空いている番号を探す
        let mut n = 2u32;
        loop {
            let candidate = format!("{stem}{n}");
            if !self.by_id.contains_key(candidate.as_str()) {
                return FunctionId(candidate);
            }
            n += 1;
        }
    }
}

impl std::borrow::Borrow<str> for FunctionId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// コメント（` #` / ` !` 以降）を除いた記述
fn comment_free(raw: &str) -> &str {
    let end = [" #", " !"]
        .iter()
        .filter_map(|marker| raw.find(marker))
        .min()
        .unwrap_or(raw.len());
    raw[..end].trim()
}

/// 同一性判定用の正規化キー
///
/// EC/TC 注記を除き、小文字化し、英数字以外の連続を空白1つにまとめる。
pub fn normalize(text: &str) -> String {
    let without_ec = EC_TC_RE.replace_all(text, " ");
    let lower = without_ec.to_lowercase();
    SEPARATOR_RE.replace_all(&lower, " ").trim().to_string()
}

fn id_stem(key: &str) -> String {
    let mut stem = String::new();
    for word in key
        .split(' ')
        .filter(|w| !w.is_empty() && !FILLER_WORDS.contains(w))
        .take(MAX_ID_WORDS)
    {
        let mut chars = word.chars().take(ID_WORD_LEN);
        if let Some(first) = chars.next() {
            stem.extend(first.to_uppercase());
            stem.extend(chars);
        }
    }
    if stem.is_empty() {
        stem.push_str(EMPTY_STEM);
    }
    stem
}
