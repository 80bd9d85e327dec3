//! 言語設定
//!
//! 辞書ごとの設定(ソースファイル・フォーマット・区切り文字など)、形態論の設定
//! (接尾辞・接中辞規則、複合語分解のしきい値)、ストアの設定を TOML から読み込みます。
//!
//! ```toml
//! [store]
//! priority = ["rkyv", "zstd", "memory"]
//!
//! [dictionaries.sys-dic]
//! name = "de/lingo-dic.txt"
//! txt-format = "WordClass"
//!
//! [morphology]
//! suffix = [["s", "s e en/e"]]
//!
//! [morphology.compositum]
//! min-word-size = 7
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::{LemmataError, Result};

/// ソーステキストのフォーマット
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TextFormat {
    /// `term`
    SingleWord,
    /// `key<sep>value`
    KeyValue,
    /// `key<sep>v1 #c1 v2 #c2 …`
    WordClass,
    /// `v1;v2;v3`
    MultiValue,
    /// `k;v1;v2`
    MultiKey,
}

impl TextFormat {
    /// フォーマットごとの既定の区切り文字
    pub const fn default_separator(self) -> Option<char> {
        match self {
            Self::SingleWord => None,
            Self::KeyValue => Some('*'),
            Self::WordClass => Some(','),
            Self::MultiValue | Self::MultiKey => Some(';'),
        }
    }
}

/// 複数の辞書ソースからの選択方法
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectMode {
    /// 最初にヒットしたソースで止める
    First,
    /// すべてのソースの結果を連結する
    #[default]
    All,
}

/// 活用語尾の派生設定
///
/// `true` で既定の語尾集合、配列で任意の語尾集合を指定します。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InflectConfig {
    Enabled(bool),
    Suffixes(Vec<String>),
}

impl Default for InflectConfig {
    fn default() -> Self {
        Self::Enabled(false)
    }
}

impl InflectConfig {
    const DEFAULT_SUFFIXES: &'static [&'static str] = &["e", "en", "er", "es", "em"];

    /// 派生に使う語尾の列。無効な場合は空です。
    pub fn suffixes(&self) -> Vec<String> {
        match self {
            Self::Enabled(false) => vec![],
            Self::Enabled(true) => Self::DEFAULT_SUFFIXES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            Self::Suffixes(suffixes) => suffixes.clone(),
        }
    }
}

fn default_def_wc() -> String {
    "?".to_string()
}

/// 辞書ひとつ分の設定
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DictionaryConfig {
    /// ソーステキストファイルのパス
    pub name: PathBuf,
    /// ソーステキストのフォーマット
    pub txt_format: TextFormat,
    /// 区切り文字(省略時はフォーマットの既定値)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub separator: Option<String>,
    /// 既定の品詞タグ
    #[serde(default = "default_def_wc")]
    pub def_wc: String,
    /// 値を難読化して保存するかどうか
    #[serde(default)]
    pub crypt: bool,
    /// 複数語キーの語彙化に使う辞書ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_lex: Option<String>,
    /// 語彙化辞書の選択方法
    #[serde(default)]
    pub lex_mode: SelectMode,
    /// ハイフンを含むキーを空白区切りでも登録するかどうか
    #[serde(default)]
    pub hyphenate: bool,
    /// 活用語尾の派生
    #[serde(default)]
    pub inflect: InflectConfig,
}

impl DictionaryConfig {
    /// `txt_format` で `name` を読む最小構成を作成します。
    pub fn new<P: Into<PathBuf>>(name: P, txt_format: TextFormat) -> Self {
        Self {
            name: name.into(),
            txt_format,
            separator: None,
            def_wc: default_def_wc(),
            crypt: false,
            use_lex: None,
            lex_mode: SelectMode::default(),
            hyphenate: false,
            inflect: InflectConfig::default(),
        }
    }

    /// 実際に使われる区切り文字
    pub fn separator(&self) -> Option<char> {
        match &self.separator {
            Some(sep) => sep.chars().next(),
            None => self.txt_format.default_separator(),
        }
    }

    fn validate(&self, id: &str) -> Result<()> {
        if let Some(sep) = &self.separator
            && sep.chars().count() != 1
        {
            return Err(LemmataError::config(
                id,
                format!("separator must be a single character, got {sep:?}"),
            ));
        }
        if self.def_wc.is_empty() {
            return Err(LemmataError::config(id, "def-wc must not be empty"));
        }
        Ok(())
    }
}

/// 複合語分解のしきい値
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct CompositumConfig {
    /// この長さ以下の入力は分解しない
    pub min_word_size: usize,
    /// 構成要素の平均長の下限
    pub min_avg_part_size: usize,
    /// 最短の構成要素の長さの下限
    pub min_part_size: usize,
    /// 構成要素数の上限
    pub max_parts: usize,
    /// 構成要素の品詞タグに付加する文字列
    pub append_wordclass: String,
    /// 拒否する品詞列
    pub skip_sequences: Vec<String>,
}

impl Default for CompositumConfig {
    fn default() -> Self {
        Self {
            min_word_size: 7,
            min_avg_part_size: 4,
            min_part_size: 1,
            max_parts: 4,
            append_wordclass: "+".to_string(),
            skip_sequences: vec![],
        }
    }
}

/// 形態論の設定
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct MorphologyConfig {
    /// 接尾辞規則: `[品詞タグ, "語尾[/置換] …"]`
    pub suffix: Vec<(String, String)>,
    /// 接中辞規則: `[品詞タグ, "連結要素[/置換] …"]`
    pub infix: Vec<(String, String)>,
    /// 複合語分解のしきい値
    pub compositum: CompositumConfig,
}

/// ストアの設定
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct StoreConfig {
    /// バックエンドの優先順位
    pub priority: Vec<String>,
    /// 明示的に指定されたバックエンド。利用できない場合は致命的エラーです。
    pub backend: Option<String>,
    /// ストアを置く場所の候補。空の場合は既定の検索パスを使います。
    pub search_path: Vec<PathBuf>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            priority: vec!["rkyv".into(), "zstd".into(), "memory".into()],
            backend: None,
            search_path: vec![],
        }
    }
}

/// 言語設定全体
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct LanguageConfig {
    /// ストアの設定
    pub store: StoreConfig,
    /// 辞書IDごとの設定
    pub dictionaries: BTreeMap<String, DictionaryConfig>,
    /// 形態論の設定
    pub morphology: MorphologyConfig,
}

impl LanguageConfig {
    /// 設定ファイルを読み込みます。
    ///
    /// 相対パスは設定ファイルのあるディレクトリを基準に解決されます。
    ///
    /// # 引数
    ///
    /// * `path` - TOML形式の設定ファイル
    ///
    /// # エラー
    ///
    /// ファイルが読めない場合、TOMLとして不正な場合、または辞書設定が不正な場合に
    /// エラーを返します。
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        Self::parse(&text, base_dir, &path.display().to_string())
    }

    /// TOML文字列から設定を読み込みます。
    ///
    /// # エラー
    ///
    /// TOMLとして不正な場合、または辞書設定が不正な場合に [`LemmataError::Config`]
    /// を返します。
    pub fn from_toml_str<P: AsRef<Path>>(text: &str, base_dir: P) -> Result<Self> {
        Self::parse(text, base_dir.as_ref(), "<toml>")
    }

    fn parse(text: &str, base_dir: &Path, origin: &str) -> Result<Self> {
        let mut config: Self =
            toml::from_str(text).map_err(|e| LemmataError::config(origin, e.message()))?;
        config.resolve_paths(base_dir);
        config.validate()?;
        Ok(config)
    }

    /// 辞書設定を取得します。
    ///
    /// # エラー
    ///
    /// `id` が設定されていない場合、[`LemmataError::Config`] を返します。
    pub fn dictionary(&self, id: &str) -> Result<&DictionaryConfig> {
        self.dictionaries
            .get(id)
            .ok_or_else(|| LemmataError::config(id, "no such dictionary configured"))
    }

    /// 辞書設定を追加します。
    pub fn insert_dictionary<I: Into<String>>(&mut self, id: I, config: DictionaryConfig) {
        self.dictionaries.insert(id.into(), config);
    }

    fn resolve_paths(&mut self, base_dir: &Path) {
        for dic in self.dictionaries.values_mut() {
            if dic.name.is_relative() {
                dic.name = base_dir.join(&dic.name);
            }
        }
        for dir in &mut self.store.search_path {
            if dir.is_relative() {
                *dir = base_dir.join(&*dir);
            }
        }
    }

    /// 辞書設定の整合性を検査します。
    pub fn validate(&self) -> Result<()> {
        for (id, dic) in &self.dictionaries {
            dic.validate(id)?;
            if let Some(lex) = &dic.use_lex
                && !self.dictionaries.contains_key(lex)
            {
                return Err(LemmataError::config(
                    id,
                    format!("use-lex refers to unknown dictionary '{lex}'"),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: &str = r#"
[store]
priority = ["zstd", "memory"]
search-path = ["store"]

[dictionaries.sys-dic]
name = "de/lingo-dic.txt"
txt-format = "WordClass"

[dictionaries.mul-dic]
name = "de/lingo-mul.txt"
txt-format = "SingleWord"
def-wc = "m"
use-lex = "sys-dic"
lex-mode = "first"
inflect = ["e", "en"]

[morphology]
suffix = [["s", "s e en/e"]]
infix = [["f", "s"]]

[morphology.compositum]
min-word-size = 8
skip-sequences = ["vv"]
"#;

    #[test]
    fn test_from_toml_str() {
        let config = LanguageConfig::from_toml_str(CONFIG, "/opt/lang").unwrap();

        let sys = config.dictionary("sys-dic").unwrap();
        assert_eq!(sys.name, PathBuf::from("/opt/lang/de/lingo-dic.txt"));
        assert_eq!(sys.txt_format, TextFormat::WordClass);
        assert_eq!(sys.separator(), Some(','));
        assert_eq!(sys.def_wc, "?");
        assert_eq!(sys.lex_mode, SelectMode::All);
        assert!(sys.inflect.suffixes().is_empty());

        let mul = config.dictionary("mul-dic").unwrap();
        assert_eq!(mul.use_lex.as_deref(), Some("sys-dic"));
        assert_eq!(mul.lex_mode, SelectMode::First);
        assert_eq!(mul.inflect.suffixes(), ["e", "en"]);
        assert_eq!(mul.separator(), None);

        assert_eq!(config.store.priority, ["zstd", "memory"]);
        assert_eq!(config.store.search_path, [PathBuf::from("/opt/lang/store")]);
        assert_eq!(
            config.morphology.suffix,
            vec![("s".to_string(), "s e en/e".to_string())]
        );
        assert_eq!(config.morphology.compositum.min_word_size, 8);
        assert_eq!(config.morphology.compositum.max_parts, 4);
        assert_eq!(config.morphology.compositum.append_wordclass, "+");
    }

    #[test]
    fn test_missing_dictionary() {
        let config = LanguageConfig::default();
        let err = config.dictionary("tst-dic").unwrap_err();
        assert!(matches!(err, LemmataError::Config { ref id, .. } if id == "tst-dic"));
    }

    #[test]
    fn test_unknown_use_lex() {
        let text = r#"
[dictionaries.mul-dic]
name = "mul.txt"
txt-format = "SingleWord"
use-lex = "nowhere"
"#;
        assert!(LanguageConfig::from_toml_str(text, ".").is_err());
    }

    #[test]
    fn test_invalid_separator() {
        let text = r#"
[dictionaries.kv]
name = "kv.txt"
txt-format = "KeyValue"
separator = "**"
"#;
        assert!(LanguageConfig::from_toml_str(text, ".").is_err());
    }

    #[test]
    fn test_malformed_toml_is_config_error() {
        let text = "[dictionaries.kv\nname = \"kv.txt\"\n";
        let err = LanguageConfig::from_toml_str(text, ".").unwrap_err();
        assert!(matches!(err, LemmataError::Config { ref id, .. } if id == "<toml>"));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lang.toml");
        fs::write(&path, "[store]\npriority = 3\n").unwrap();
        let err = LanguageConfig::from_path(&path).unwrap_err();
        assert!(
            matches!(err, LemmataError::Config { ref id, .. } if id == &path.display().to_string())
        );
    }

    #[test]
    fn test_inflect_true() {
        assert_eq!(
            InflectConfig::Enabled(true).suffixes(),
            ["e", "en", "er", "es", "em"]
        );
    }
}
