//! # lemmata
//!
//! lemmataは、索引付けのための語彙知識ベースと複合語分解器です。
//!
//! ## 概要
//!
//! 人が編集できるテキスト形式の辞書ソースを永続的なキー・値ストアに変換し、
//! 単語をその基本形と品詞タグ(語彙項目)に解決します。辞書に無い語は、辞書に
//! 載っている語の連結として分解を試みます。
//!
//! 処理は次の層で構成されます。
//!
//! - **ストレージ**: [`store::backend::StorageBackend`] と [`store::LexicalStore`]
//! - **ソース変換**: [`source`] の5つの行形式と [`converter::Converter`]
//! - **検索**: [`cache::LexicalCache`] と [`Dictionary`]
//! - **複合語分解**: [`Grammar`]
//!
//! ストアはソースの指紋が変わったときだけ作り直されます。
//!
//! ## 使用例
//!
//! ```
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use lemmata::config::{CompositumConfig, DictionaryConfig, LanguageConfig, SelectMode, TextFormat};
//! use lemmata::{Dictionary, Grammar, StoreRegistry, WordStatus};
//!
//! let dir = tempfile::tempdir()?;
//! let source = dir.path().join("words.txt");
//! std::fs::write(&source, "klein,#a\nseite,#s\n")?;
//!
//! let mut config = LanguageConfig::default();
//! config.store.priority = vec!["memory".into()];
//! config.insert_dictionary("sys-dic", DictionaryConfig::new(&source, TextFormat::WordClass));
//!
//! let mut registry = StoreRegistry::new(config);
//! let dic = Dictionary::new(&mut registry, &["sys-dic"], SelectMode::All)?;
//! let mut grammar = Grammar::new(dic, CompositumConfig::default());
//!
//! let word = grammar.find_compound("Kleinseite");
//! assert_eq!(word.status(), WordStatus::Compound);
//! assert_eq!(word.to_string(), "<Kleinseite|KOM = [(klein/a+), (seite/s+), (kleinseite/k)]>");
//! # Ok(())
//! # }
//! ```
#![cfg_attr(docsrs, feature(doc_cfg))]

/// 検索結果のキャッシュ
pub mod cache;

/// 言語設定
pub mod config;

/// ソーステキストから語彙ストアへの変換
pub mod converter;

/// 複数の語彙ストアにまたがる辞書
pub mod dictionary;

/// エラー型の定義
pub mod errors;

/// 複合語の分解
pub mod grammar;

/// 語彙項目・単語・トークン
pub mod lexical;

/// 語彙ストアのレジストリ
pub mod registry;

/// 辞書ソーステキストの読み込み
pub mod source;

/// 永続的な語彙ストア
pub mod store;

#[cfg(test)]
mod test_utils;
#[cfg(test)]
mod tests;

// Re-exports
pub use dictionary::Dictionary;
pub use grammar::Grammar;
pub use lexical::{Lexical, Token, Word, WordStatus};
pub use registry::StoreRegistry;

/// このライブラリのバージョン番号
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
