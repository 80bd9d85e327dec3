//! 永続的な語彙ストア
//!
//! [`LexicalStore`] は文字列キーに対して値トークンの列を保持します。レコードは
//! [`FLD_SEP`] で連結された一つの文字列として [`StorageBackend`] に保存されます。
//!
//! 値トークンは次のいずれかです。
//!
//! - `form#class[.gender]`: 語彙項目。`form` が空の場合はレコードのキーを表します。
//! - `*<key>`: 別のレコードへの参照。参照先の語彙項目が展開されます。
//! - `*<数字>`: 複数語の長さのヒント。展開されずにそのまま返されます。

pub mod backend;
pub mod crypt;

use std::fmt;

use crate::errors::Result;
use crate::store::backend::{BackendKind, StorageBackend};

/// 鮮度の指紋を保存する予約キー
pub const SYS_KEY: &str = "~";

/// レコード内の値トークンの区切り文字
pub const FLD_SEP: char = '|';

/// 参照トークンの接頭辞
pub const KEY_REF: char = '*';

/// 複数値ソースの索引キーの接頭辞
pub const IDX_REF: char = '^';

/// 一つのレコードの最大バイト長
pub const MAX_RECORD_LENGTH: usize = 65_000;

/// レコード形式のバージョン。指紋に含まれます。
pub const FORMAT_VERSION: u32 = 1;

/// 値トークンの種類
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValueToken<'a> {
    /// `form#class[.gender]`
    Lexical(&'a str),
    /// 他のレコードへの参照
    Ref(&'a str),
    /// 複数語の長さのヒント
    Hint(usize),
}

impl<'a> ValueToken<'a> {
    /// 値トークンを分類します。
    pub fn parse(token: &'a str) -> Self {
        match token.strip_prefix(KEY_REF) {
            Some(rest) if !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_digit()) => {
                rest.parse().map_or(Self::Ref(rest), Self::Hint)
            }
            Some(rest) if !rest.is_empty() => Self::Ref(rest),
            _ => Self::Lexical(token),
        }
    }
}

/// 索引キー `^<n>` を作成します。
pub fn index_key(n: usize) -> String {
    format!("{IDX_REF}{n}")
}

/// 参照トークン `*<key>` を作成します。
pub fn ref_token(key: &str) -> String {
    format!("{KEY_REF}{key}")
}

/// ヒントトークン `*<n>` を作成します。
pub fn hint_token(n: usize) -> String {
    format!("{KEY_REF}{n}")
}

/// 辞書ひとつ分の語彙ストア
pub struct LexicalStore {
    id: String,
    backend: Box<dyn StorageBackend>,
    crypt: bool,
}

impl LexicalStore {
    /// 開かれたバックエンドから語彙ストアを作成します。
    ///
    /// # 引数
    ///
    /// * `id` - 辞書ID
    /// * `backend` - 開かれたバックエンド
    /// * `crypt` - キーと値を難読化するかどうか
    pub fn new<I: Into<String>>(id: I, backend: Box<dyn StorageBackend>, crypt: bool) -> Self {
        Self {
            id: id.into(),
            backend,
            crypt,
        }
    }

    /// 辞書ID
    pub fn id(&self) -> &str {
        &self.id
    }

    /// バックエンドの種類
    pub fn backend_kind(&self) -> BackendKind {
        self.backend.kind()
    }

    /// 難読化されているかどうか
    pub fn is_crypt(&self) -> bool {
        self.crypt
    }

    /// 指紋を含むレコード数
    pub fn len(&self) -> usize {
        self.backend.len()
    }

    /// レコードが無いかどうか
    pub fn is_empty(&self) -> bool {
        self.backend.is_empty()
    }

    /// キーに対応する値トークンを取得します。
    ///
    /// キーは小文字に正規化されます。参照トークンは一段階だけ展開され、参照先に
    /// 含まれる参照トークンは捨てられます。空の語形はそのレコードのキーで
    /// 補われます。ヒントトークンはそのまま返されます。結果は整列済みです。
    ///
    /// # 戻り値
    ///
    /// レコードが無い場合、または展開の結果が空の場合は `None`。
    pub fn lookup(&self, key: &str) -> Option<Vec<String>> {
        let key = key.to_lowercase();
        let tokens = self.read(&key)?;

        let mut values = Vec::with_capacity(tokens.len());
        for token in &tokens {
            match ValueToken::parse(token) {
                ValueToken::Lexical(value) => values.push(expand_form(&key, value)),
                ValueToken::Hint(_) => values.push(token.clone()),
                ValueToken::Ref(target) => {
                    let Some(target_tokens) = self.read(target) else {
                        log::debug!("[lemmata] {}: dangling reference {token} in '{key}'", self.id);
                        continue;
                    };
                    for target_token in &target_tokens {
                        if let ValueToken::Lexical(value) = ValueToken::parse(target_token) {
                            values.push(expand_form(target, value));
                        }
                    }
                }
            }
        }
        values.sort_unstable();
        values.dedup();

        if values.is_empty() { None } else { Some(values) }
    }

    /// 値トークンを追加します。
    ///
    /// 既存のレコードとマージし、重複を除いて整列したうえで保存します。連結した
    /// 長さが [`MAX_RECORD_LENGTH`] を超える場合、末尾の値から丸ごと捨てられます。
    ///
    /// # 引数
    ///
    /// * `key` - レコードのキー。小文字に正規化されます。
    /// * `values` - 追加する値トークン
    pub fn upsert<I, S>(&mut self, key: &str, values: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let key = key.to_lowercase();
        let mut merged = self.read(&key).unwrap_or_default();
        merged.extend(values.into_iter().map(Into::into).filter(|v| !v.is_empty()));
        merged.sort_unstable();
        merged.dedup();

        let record = join_record(&self.id, &key, &merged);
        self.write(&key, &record)
    }

    /// 保存されている指紋
    pub fn fingerprint(&self) -> Option<String> {
        let value = self.backend.get(SYS_KEY.as_bytes())?;
        String::from_utf8(value.to_vec()).ok()
    }

    /// 保存されている指紋が `fingerprint` と一致するかどうか
    pub fn is_fresh(&self, fingerprint: &str) -> bool {
        self.fingerprint().as_deref() == Some(fingerprint)
    }

    /// ストアを作り直します。
    ///
    /// すべてのレコードを削除してから `fill` を呼び、成功した場合に限り指紋を
    /// 書き込んで永続化します。`fill` が失敗した場合は指紋が書かれないため、
    /// 次に開いたときに再び作り直されます。
    pub fn rebuild<F, T>(&mut self, fingerprint: &str, fill: F) -> Result<T>
    where
        F: FnOnce(&mut Self) -> Result<T>,
    {
        self.backend.clear()?;
        let output = fill(self)?;
        self.backend
            .set(SYS_KEY.as_bytes(), fingerprint.as_bytes())?;
        self.backend.flush()?;
        Ok(output)
    }

    /// 保存されている生のレコードを列挙します。
    ///
    /// 難読化されたストアでは、キーはダイジェスト、値は変換後のバイト列です。
    pub fn raw_records(&self) -> Vec<(Vec<u8>, Vec<u8>)> {
        let mut records: Vec<_> = self
            .backend
            .each()
            .map(|(k, v)| (k.to_vec(), v.to_vec()))
            .collect();
        records.sort_unstable();
        records
    }

    /// ストアを閉じます。複数回呼んでも安全です。
    pub fn close(&mut self) -> Result<()> {
        self.backend.close()
    }

    /// 閉じているかどうか
    pub fn is_closed(&self) -> bool {
        self.backend.is_closed()
    }

    fn stored_key(&self, key: &str) -> Vec<u8> {
        if self.crypt && key != SYS_KEY {
            crypt::digest_key(key).into_bytes()
        } else {
            key.as_bytes().to_vec()
        }
    }

    fn read(&self, key: &str) -> Option<Vec<String>> {
        let raw = self.backend.get(&self.stored_key(key))?;
        let bytes = if self.crypt {
            crypt::decode_value(key, raw)
        } else {
            raw.to_vec()
        };
        let record = match String::from_utf8(bytes) {
            Ok(record) => record,
            Err(_) => {
                log::warn!("[lemmata] {}: undecodable record for '{key}'", self.id);
                return None;
            }
        };
        Some(
            record
                .split(FLD_SEP)
                .filter(|t| !t.is_empty())
                .map(String::from)
                .collect(),
        )
    }

    fn write(&mut self, key: &str, record: &str) -> Result<()> {
        let stored_key = self.stored_key(key);
        if self.crypt {
            let value = crypt::encode_value(key, record.as_bytes());
            self.backend.set(&stored_key, &value)
        } else {
            self.backend.set(&stored_key, record.as_bytes())
        }
    }
}

impl fmt::Debug for LexicalStore {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("LexicalStore")
            .field("id", &self.id)
            .field("backend", &self.backend.kind())
            .field("crypt", &self.crypt)
            .field("records", &self.backend.len())
            .finish()
    }
}

fn expand_form(key: &str, value: &str) -> String {
    if value.starts_with(crate::lexical::LEXICAL_SEPARATOR) {
        format!("{key}{value}")
    } else {
        value.to_string()
    }
}

fn join_record(id: &str, key: &str, values: &[String]) -> String {
    let mut record = String::new();
    for (i, value) in values.iter().enumerate() {
        let extra = if record.is_empty() { 0 } else { 1 };
        if record.len() + extra + value.len() > MAX_RECORD_LENGTH {
            log::warn!(
                "[lemmata] {id}: record '{key}' truncated, {} values dropped",
                values.len() - i
            );
            break;
        }
        if extra == 1 {
            record.push(FLD_SEP);
        }
        record.push_str(value);
    }
    record
}
