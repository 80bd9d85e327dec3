//! 辞書ソーステキストの読み込み
//!
//! [`Source`] はソーステキストを一行ずつ読み、[`LineFormat`] で検証して
//! [`RawEntry`] の列に変換します。検証に失敗した行はソースと同じ場所の
//! `.rev` ファイルに書き出され、件数が数えられます。

mod key_value;
mod multi_key;
mod multi_value;
mod single_word;
mod word_class;

use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use crate::config::{DictionaryConfig, TextFormat};
use crate::errors::{LemmataError, Result};
use crate::lexical::encode_record;
use crate::store::ref_token;

pub use crate::source::key_value::KeyValue;
pub use crate::source::multi_key::MultiKey;
pub use crate::source::multi_value::MultiValue;
pub use crate::source::single_word::SingleWord;
pub use crate::source::word_class::WordClass;

/// 語を構成する文字の正規表現
///
/// ラテン文字(拡張を含む)、数字、および一部の記号です。
pub(crate) const WORD_CHAR: &str =
    r"[a-z0-9\x{00C0}-\x{00D6}\x{00D8}-\x{00F6}\x{00F8}-\x{024F}\x{1E00}-\x{1EFF}\-_.'/&+]";

/// 空白区切りで一つ以上の語からなる項目の正規表現
pub(crate) fn term_pattern() -> String {
    format!("{WORD_CHAR}+(?: +{WORD_CHAR}+)*")
}

/// 品詞タグの正規表現
pub(crate) const CLASS_PATTERN: &str = r"[a-z?+\-]+";

/// 連続する空白を一つにまとめます。
pub(crate) fn normalize_term(term: &str) -> String {
    term.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// ソースから得られる値
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RawValue {
    /// 語彙項目。語形が空の場合はキーそのものを表します。
    Lexical {
        /// 語形
        form: String,
        /// 品詞タグ
        class: String,
        /// 性
        gender: Option<String>,
    },
    /// 別のキーへの参照
    Ref(String),
}

impl RawValue {
    /// 語彙項目の値を作成します。
    pub fn lexical<F: Into<String>, C: Into<String>>(form: F, class: C) -> Self {
        Self::Lexical {
            form: form.into(),
            class: class.into(),
            gender: None,
        }
    }

    /// 値トークンにエンコードします。
    ///
    /// # 引数
    ///
    /// * `origin` - ソース上のキー。空の語形はこのキーとして扱われます。
    /// * `key` - 実際に保存されるキー。語形がこれと一致する場合は空にします。
    pub fn encode(&self, origin: &str, key: &str) -> String {
        match self {
            Self::Lexical {
                form,
                class,
                gender,
            } => {
                let form = if form.is_empty() { origin } else { form };
                let form = if form == key { "" } else { form };
                encode_record(form, class, gender.as_deref())
            }
            Self::Ref(target) => ref_token(target),
        }
    }
}

/// ソースの一行から得られるエントリ
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawEntry {
    /// キー
    pub key: String,
    /// 値
    pub values: Vec<RawValue>,
}

impl RawEntry {
    /// 新しいエントリを作成します。
    pub fn new<K: Into<String>>(key: K, values: Vec<RawValue>) -> Self {
        Self {
            key: key.into(),
            values,
        }
    }
}

/// ソーステキストの行形式
pub trait LineFormat {
    /// 形式名
    fn name(&self) -> &'static str;

    /// 小文字化・前後の空白除去済みの一行をエントリに変換します。
    ///
    /// # 戻り値
    ///
    /// 行が形式に合わない場合は `None`。
    fn parse(&mut self, line: &str) -> Option<Vec<RawEntry>>;
}

/// 設定から行形式を作成します。
pub fn line_format(id: &str, config: &DictionaryConfig) -> Result<Box<dyn LineFormat>> {
    let sep = match config.separator() {
        Some(sep) => sep,
        None if config.txt_format == TextFormat::SingleWord => ' ',
        None => return Err(LemmataError::config(id, "separator is required")),
    };
    let def_wc = config.def_wc.as_str();
    if def_wc.contains(['#', '|', '*']) || def_wc.contains(char::is_whitespace) {
        return Err(LemmataError::invalid_format(
            "def-wc",
            format!("{id}: {def_wc:?} cannot be stored as a word class"),
        ));
    }
    Ok(match config.txt_format {
        TextFormat::SingleWord => Box::new(SingleWord::new(def_wc)?),
        TextFormat::KeyValue => Box::new(KeyValue::new(sep, def_wc)?),
        TextFormat::WordClass => Box::new(WordClass::new(sep)?),
        TextFormat::MultiValue => Box::new(MultiValue::new(sep, def_wc)?),
        TextFormat::MultiKey => Box::new(MultiKey::new(sep, def_wc)?),
    })
}

/// ソーステキストのリーダー
pub struct Source<R> {
    id: String,
    rdr: BufReader<R>,
    format: Box<dyn LineFormat>,
    reject_path: Option<PathBuf>,
    reject: Option<BufWriter<File>>,
    buf: Vec<u8>,
    pos: u64,
    size: u64,
    lines: usize,
    rejected: usize,
}

impl Source<File> {
    /// 設定されたソーステキストを開きます。
    ///
    /// 前回の `.rev` ファイルが残っている場合は削除されます。
    ///
    /// # エラー
    ///
    /// ソースファイルが存在しない場合は [`LemmataError::SourceFile`] を返します。
    pub fn open(id: &str, config: &DictionaryConfig) -> Result<Self> {
        let file = File::open(&config.name).map_err(|_| LemmataError::SourceFile {
            id: id.to_string(),
            path: config.name.clone(),
        })?;
        let size = file.metadata()?.len();

        let reject_path = config.name.with_extension("rev");
        if reject_path.exists() {
            fs::remove_file(&reject_path)?;
        }

        let mut source = Self::from_reader(id, file, line_format(id, config)?);
        source.size = size;
        source.reject_path = Some(reject_path);
        Ok(source)
    }
}

impl<R: Read> Source<R> {
    /// 任意のリーダーからソースを作成します。不正な行は数えるだけで書き出しません。
    pub fn from_reader<I: Into<String>>(id: I, rdr: R, format: Box<dyn LineFormat>) -> Self {
        Self {
            id: id.into(),
            rdr: BufReader::new(rdr),
            format,
            reject_path: None,
            reject: None,
            buf: Vec::new(),
            pos: 0,
            size: 0,
            lines: 0,
            rejected: 0,
        }
    }

    /// 次の有効な行のエントリを返します。
    ///
    /// 空行は読み飛ばし、形式に合わない行は拒否します。
    ///
    /// # 戻り値
    ///
    /// 入力の終わりに達した場合は `None`。
    pub fn next_entries(&mut self) -> Result<Option<Vec<RawEntry>>> {
        loop {
            self.buf.clear();
            let n = self.rdr.read_until(b'\n', &mut self.buf)?;
            if n == 0 {
                return Ok(None);
            }
            self.pos += n as u64;

            let line = match std::str::from_utf8(&self.buf) {
                Ok(line) => line.trim_start_matches('\u{feff}').trim().to_lowercase(),
                Err(_) => {
                    self.lines += 1;
                    let raw = self.buf.clone();
                    self.reject_line(&raw)?;
                    continue;
                }
            };
            if line.is_empty() {
                continue;
            }
            self.lines += 1;

            match self.format.parse(&line) {
                Some(entries) => return Ok(Some(entries)),
                None => {
                    let raw = self.buf.clone();
                    self.reject_line(&raw)?;
                }
            }
        }
    }

    fn reject_line(&mut self, raw: &[u8]) -> Result<()> {
        self.rejected += 1;
        let text = String::from_utf8_lossy(raw);
        log::warn!(
            "[lemmata] {}: rejected {} line {}: {}",
            self.id,
            self.format.name(),
            self.lines,
            text.trim_end()
        );

        if self.reject.is_none()
            && let Some(path) = &self.reject_path
        {
            self.reject = Some(BufWriter::new(File::create(path)?));
        }
        if let Some(wtr) = &mut self.reject {
            wtr.write_all(raw)?;
            if !raw.ends_with(b"\n") {
                wtr.write_all(b"\n")?;
            }
        }
        Ok(())
    }

    /// 辞書ID
    pub fn id(&self) -> &str {
        &self.id
    }

    /// 読み込んだバイト数
    pub fn pos(&self) -> u64 {
        self.pos
    }

    /// ソースの総バイト数。不明な場合は0です。
    pub fn size(&self) -> u64 {
        self.size
    }

    /// 読み込んだ空でない行数
    pub fn lines(&self) -> usize {
        self.lines
    }

    /// 拒否した行数
    pub fn rejected(&self) -> usize {
        self.rejected
    }

    /// 拒否した行を書き出したファイル
    pub fn reject_path(&self) -> Option<&Path> {
        if self.rejected > 0 {
            self.reject_path.as_deref()
        } else {
            None
        }
    }

    /// 拒否した行の書き出しを完了します。
    pub fn finish(&mut self) -> Result<()> {
        if let Some(wtr) = &mut self.reject {
            wtr.flush()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_value() {
        let value = RawValue::lexical("", "s");
        assert_eq!(value.encode("hase", "hase"), "#s");
        assert_eq!(value.encode("hase", "hasen"), "hase#s");

        let value = RawValue::lexical("hase", "s");
        assert_eq!(value.encode("hasen", "hase"), "#s");
        assert_eq!(RawValue::Ref("^3".into()).encode("x", "x"), "*^3");
    }

    #[test]
    fn test_source_counts_rejects() {
        let text = "Hase\n\nNase!\nKaninchen\n\u{00e4}rger\n";
        let mut source = Source::from_reader(
            "test",
            text.as_bytes(),
            Box::new(SingleWord::new("s").unwrap()),
        );
        let mut keys = vec![];
        while let Some(entries) = source.next_entries().unwrap() {
            keys.extend(entries.into_iter().map(|e| e.key));
        }
        assert_eq!(keys, ["hase", "kaninchen", "ärger"]);
        assert_eq!(source.lines(), 4);
        assert_eq!(source.rejected(), 1);
        assert_eq!(source.pos(), text.len() as u64);
    }

    #[test]
    fn test_source_writes_rev_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("words.txt");
        fs::write(&path, "hase\n<nase>\n").unwrap();
        let config = DictionaryConfig::new(&path, TextFormat::SingleWord);

        let mut source = Source::open("words", &config).unwrap();
        while source.next_entries().unwrap().is_some() {}
        source.finish().unwrap();

        let rev = dir.path().join("words.rev");
        assert_eq!(source.reject_path(), Some(rev.as_path()));
        assert_eq!(fs::read_to_string(rev).unwrap(), "<nase>\n");
    }

    #[test]
    fn test_unstorable_default_class() {
        let mut config = DictionaryConfig::new("words.txt", TextFormat::KeyValue);
        config.def_wc = "s#m".into();
        assert!(matches!(
            line_format("words", &config),
            Err(LemmataError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_missing_source() {
        let config = DictionaryConfig::new("/nonexistent/words.txt", TextFormat::SingleWord);
        assert!(matches!(
            Source::open("words", &config),
            Err(LemmataError::SourceFile { .. })
        ));
    }
}
