//! ソーステキストから語彙ストアへの変換
//!
//! 複数語のキーは、語彙化辞書が設定されていれば各語を基本形に置き換えた形でも
//! 保存されます。これにより、基本形に解析されたトークン列からも引けるように
//! なります。

use std::io::Read;

use crate::config::DictionaryConfig;
use crate::dictionary::Dictionary;
use crate::errors::Result;
use crate::lexical::class;
use crate::source::{RawEntry, Source, normalize_term};
use crate::store::{LexicalStore, hint_token};

/// 長さのヒントを書き込む複数語キーの語数
const HINT_TOKENS: usize = 3;

/// 変換結果の集計
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ConversionReport {
    /// 読み込んだ空でない行数
    pub lines: usize,
    /// 有効な行から得られたエントリ数
    pub entries: usize,
    /// 拒否した行数
    pub rejected: usize,
    /// 書き込んだキーの数(重複を含む)
    pub keys: usize,
}

/// ソーステキストを語彙ストアに変換します。
pub struct Converter<'a> {
    id: &'a str,
    config: &'a DictionaryConfig,
    lexicalizer: Option<&'a mut Dictionary>,
    suffixes: Vec<String>,
}

impl<'a> Converter<'a> {
    /// # 引数
    ///
    /// * `id` - 辞書ID
    /// * `config` - 辞書の設定
    /// * `lexicalizer` - 複数語キーの語彙化に使う辞書
    pub fn new(
        id: &'a str,
        config: &'a DictionaryConfig,
        lexicalizer: Option<&'a mut Dictionary>,
    ) -> Self {
        Self {
            id,
            config,
            lexicalizer,
            suffixes: config.inflect.suffixes(),
        }
    }

    /// 設定されたソーステキストをすべて変換します。
    ///
    /// # エラー
    ///
    /// ソースファイルが無い場合、または書き込みに失敗した場合にエラーを返します。
    pub fn convert(&mut self, store: &mut LexicalStore) -> Result<ConversionReport> {
        let mut source = Source::open(self.id, self.config)?;
        log::info!(
            "[lemmata] {}: converting {} ({} bytes)",
            self.id,
            self.config.name.display(),
            source.size()
        );
        let report = self.convert_source(&mut source, store)?;
        if let Some(path) = source.reject_path() {
            log::warn!(
                "[lemmata] {}: {} rejected lines written to {}",
                self.id,
                report.rejected,
                path.display()
            );
        }
        Ok(report)
    }

    /// 任意のソースを変換します。
    pub fn convert_source<R: Read>(
        &mut self,
        source: &mut Source<R>,
        store: &mut LexicalStore,
    ) -> Result<ConversionReport> {
        let mut report = ConversionReport::default();
        let mut next_decile = 1;

        while let Some(entries) = source.next_entries()? {
            for entry in entries {
                report.entries += 1;
                report.keys += self.store_entry(store, &entry)?;
            }

            if source.size() > 0 {
                let decile = source.pos() * 10 / source.size();
                if decile >= next_decile {
                    log::info!(
                        "[lemmata] {}: {}% converted",
                        self.id,
                        decile.min(10) * 10
                    );
                    next_decile = decile + 1;
                }
            }
        }
        source.finish()?;

        report.lines = source.lines();
        report.rejected = source.rejected();
        log::info!(
            "[lemmata] {}: {} lines, {} entries, {} rejected, {} keys",
            self.id,
            report.lines,
            report.entries,
            report.rejected,
            report.keys
        );
        Ok(report)
    }

    fn store_entry(&mut self, store: &mut LexicalStore, entry: &RawEntry) -> Result<usize> {
        if entry.values.is_empty() {
            return Ok(0);
        }
        let keys = self.keys_for(&entry.key);
        for key in &keys {
            let tokens: Vec<&str> = key.split(' ').collect();
            if tokens.len() > HINT_TOKENS {
                store.upsert(&tokens[..HINT_TOKENS].join(" "), [hint_token(tokens.len())])?;
            }
            let values: Vec<String> = entry
                .values
                .iter()
                .map(|v| v.encode(&entry.key, key))
                .collect();
            store.upsert(key, values)?;
        }
        Ok(keys.len())
    }

    /// エントリのキーから実際に保存するキーの一覧を作成します。
    fn keys_for(&mut self, key: &str) -> Vec<String> {
        let mut keys = vec![key.to_string()];
        if self.config.hyphenate && key.contains('-') {
            keys.push(normalize_term(&key.replace('-', " ")));
        }

        if self.lexicalizer.is_some() {
            let mut variants = vec![];
            for key in &keys {
                if key.contains(' ') {
                    variants.extend(self.lexicalized_keys(key));
                }
            }
            keys.extend(variants);
        }

        let mut unique: Vec<String> = Vec::with_capacity(keys.len());
        for key in keys {
            if !key.is_empty() && !unique.contains(&key) {
                unique.push(key);
            }
        }
        unique
    }

    fn lexicalized_keys(&mut self, key: &str) -> Vec<String> {
        let Some(dic) = self.lexicalizer.as_deref_mut() else {
            return vec![];
        };

        let words: Vec<(String, bool)> = key
            .split(' ')
            .map(|token| {
                let word = dic.find_word(token);
                match word.lexicals().first() {
                    Some(lex) => (lex.form().to_string(), lex.is_class(class::ADJECTIVE)),
                    None => (token.to_string(), false),
                }
            })
            .collect();

        let mut keys = vec![join_words(words.iter().map(|(w, _)| w.as_str()))];

        let last = words.len() - 1;
        if words[..last].iter().any(|(_, adj)| *adj) {
            for suffix in &self.suffixes {
                keys.push(join_words(words.iter().enumerate().map(|(i, (w, adj))| {
                    if *adj && i < last {
                        format!("{w}{suffix}")
                    } else {
                        w.clone()
                    }
                })));
            }
        }
        keys
    }
}

fn join_words<I, S>(words: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut s = String::new();
    for w in words {
        if !s.is_empty() {
            s.push(' ');
        }
        s.push_str(w.as_ref());
    }
    s
}
