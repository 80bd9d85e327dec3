//! 複数の語彙ストアにまたがる辞書
//!
//! [`Dictionary`] は設定された順序で語彙ストアを引き、結果をまとめます。
//! 直接引けない語には接尾辞規則・接中辞規則を適用して再検索します。

use hashbrown::HashMap;
use regex::{NoExpand, Regex};

use crate::cache::{CacheStats, LexicalCache, StoreHandle};
use crate::config::{MorphologyConfig, SelectMode};
use crate::errors::{LemmataError, Result};
use crate::lexical::{Lexical, Word, WordStatus, class};
use crate::registry::StoreRegistry;

/// 語末の書き換え規則
///
/// 語末が `pattern` に一致する場合にそれを `replacement` で置き換えた語を引き、
/// 品詞タグが `class` の語彙項目だけを採用します。
#[derive(Clone, Debug)]
pub struct AffixRule {
    class: String,
    pattern: Regex,
    replacement: String,
}

impl AffixRule {
    /// `"語尾[/置換] 語尾[/置換] …"` 形式の規則列を読み込みます。
    ///
    /// # 引数
    ///
    /// * `class` - 規則が適用される品詞タグ
    /// * `text` - 空白区切りの規則列
    ///
    /// # エラー
    ///
    /// 語尾が正規表現として不正な場合にエラーを返します。
    pub fn parse(class: &str, text: &str) -> Result<Vec<Self>> {
        let mut rules = vec![];
        for rule in text.split_whitespace() {
            let (pattern, replacement) = rule.split_once('/').unwrap_or((rule, ""));
            if pattern.is_empty() {
                return Err(LemmataError::invalid_argument(
                    "morphology",
                    format!("empty pattern in rule {rule:?}"),
                ));
            }
            rules.push(Self {
                class: class.to_string(),
                pattern: Regex::new(&format!("(?:{pattern})$"))?,
                replacement: replacement.to_string(),
            });
        }
        Ok(rules)
    }

    /// 品詞タグ
    pub fn class(&self) -> &str {
        &self.class
    }

    /// 規則を適用した語を返します。適用できない場合は `None` です。
    pub fn apply(&self, term: &str) -> Option<String> {
        if !self.pattern.is_match(term) {
            return None;
        }
        let reduced = self
            .pattern
            .replace(term, NoExpand(&self.replacement))
            .into_owned();
        if reduced.is_empty() || reduced == term {
            None
        } else {
            Some(reduced)
        }
    }
}

fn parse_rules(rules: &[(String, String)]) -> Result<Vec<AffixRule>> {
    let mut parsed = vec![];
    for (class, text) in rules {
        parsed.extend(AffixRule::parse(class, text)?);
    }
    Ok(parsed)
}

/// 語彙ストアの列と形態論規則
pub struct Dictionary {
    sources: Vec<LexicalCache>,
    mode: SelectMode,
    suffixes: Vec<AffixRule>,
    infixes: Vec<AffixRule>,
    words: HashMap<String, Word>,
}

impl Dictionary {
    /// レジストリから語彙ストアを開いて辞書を作成します。
    ///
    /// # 引数
    ///
    /// * `registry` - ストアのレジストリ。形態論規則もここから読まれます。
    /// * `ids` - 引く順序に並べた辞書ID
    /// * `mode` - 選択方法
    ///
    /// # エラー
    ///
    /// いずれかのストアを開けない場合にエラーを返します。
    pub fn new<S: AsRef<str>>(
        registry: &mut StoreRegistry,
        ids: &[S],
        mode: SelectMode,
    ) -> Result<Self> {
        let mut stores = Vec::with_capacity(ids.len());
        for id in ids {
            stores.push(registry.open(id.as_ref())?);
        }
        let morphology = registry.config().morphology.clone();
        Self::from_stores(stores, mode, &morphology)
    }

    /// 開かれた語彙ストアから辞書を作成します。
    pub fn from_stores(
        stores: Vec<StoreHandle>,
        mode: SelectMode,
        morphology: &MorphologyConfig,
    ) -> Result<Self> {
        Ok(Self {
            sources: stores.into_iter().map(LexicalCache::new).collect(),
            mode,
            suffixes: parse_rules(&morphology.suffix)?,
            infixes: parse_rules(&morphology.infix)?,
            words: HashMap::new(),
        })
    }

    /// 選択方法
    pub fn mode(&self) -> SelectMode {
        self.mode
    }

    /// 各ソースを引き、語彙項目を整列して返します。
    ///
    /// [`SelectMode::First`] では最初に結果を返したソースで打ち切ります。
    pub fn select(&mut self, term: &str) -> Vec<Lexical> {
        let key = term.to_lowercase();
        let mut lexicals = vec![];
        for source in &mut self.sources {
            let found = source.select(&key);
            if found.is_empty() {
                continue;
            }
            lexicals.extend(found);
            if self.mode == SelectMode::First {
                break;
            }
        }
        lexicals.sort();
        lexicals.dedup();
        lexicals
    }

    /// 直接引けない場合に接尾辞規則を適用して引きます。
    pub fn select_with_suffix(&mut self, term: &str) -> Vec<Lexical> {
        let candidates = affix_candidates(&self.suffixes, term);
        self.select_with_candidates(term, candidates)
    }

    /// 直接引けない場合に接中辞規則を適用して引きます。
    pub fn select_with_infix(&mut self, term: &str) -> Vec<Lexical> {
        let candidates = affix_candidates(&self.infixes, term);
        self.select_with_candidates(term, candidates)
    }

    fn select_with_candidates(
        &mut self,
        term: &str,
        candidates: Vec<(String, String)>,
    ) -> Vec<Lexical> {
        let lexicals = self.select(term);
        if !lexicals.is_empty() {
            return lexicals;
        }

        let mut lexicals = vec![];
        for (reduced, class) in candidates {
            lexicals.extend(
                self.select(&reduced)
                    .into_iter()
                    .filter(|lex| lex.is_class(&class)),
            );
        }
        lexicals.sort();
        lexicals.dedup();
        lexicals
    }

    /// 複数語の長さのヒントを返します。
    ///
    /// `term` は先頭の三語です。すべてのソースのヒントを合わせて返します。
    pub fn multiword_hints(&mut self, term: &str) -> Vec<usize> {
        let key = term.to_lowercase();
        let mut hints: Vec<usize> = self
            .sources
            .iter_mut()
            .flat_map(|source| source.hints(&key))
            .collect();
        hints.sort_unstable();
        hints.dedup();
        hints
    }

    /// 単語を辞書で解決します。結果はメモ化されます。
    ///
    /// # 戻り値
    ///
    /// 語彙項目が見つかれば [`WordStatus::Identified`]、見つからなければ
    /// [`WordStatus::Unknown`] の単語。
    pub fn find_word(&mut self, term: &str) -> Word {
        if let Some(word) = self.words.get(term) {
            return word.clone();
        }
        let lexicals = self.select_with_suffix(term);
        let word = if lexicals.is_empty() {
            Word::new(term, WordStatus::Unknown)
        } else {
            Word::with_lexicals(term, WordStatus::Identified, lexicals)
        };
        self.words.insert(term.to_string(), word.clone());
        word
    }

    /// 単語の同義語を集めます。
    ///
    /// 未知の単語はその表層形で引きます。複合語は合成された語彙項目だけを
    /// たどります。同義語クラスの語彙項目からさらにたどることはありません。
    pub fn find_synonyms(&mut self, word: &Word) -> Vec<Lexical> {
        let compound = word.status() == WordStatus::Compound;
        let forms: Vec<String> = if word.lexicals().is_empty() {
            vec![word.form().to_lowercase()]
        } else {
            word.lexicals()
                .iter()
                .filter(|lex| !lex.is_class(class::SYNONYM))
                .filter(|lex| !compound || lex.is_class(class::COMPOUND))
                .map(|lex| lex.form().to_string())
                .collect()
        };

        let mut synonyms = vec![];
        for form in &forms {
            synonyms.extend(
                self.select(form)
                    .into_iter()
                    .filter(|lex| lex.is_class(class::SYNONYM) && lex.form() != form),
            );
        }
        synonyms.sort();
        synonyms.dedup();
        synonyms
    }

    /// ソースごとのキャッシュ統計
    pub fn report(&self) -> Vec<(String, CacheStats)> {
        self.sources
            .iter()
            .map(|source| (source.id().to_string(), source.stats()))
            .collect()
    }
}

fn affix_candidates(rules: &[AffixRule], term: &str) -> Vec<(String, String)> {
    let term = term.to_lowercase();
    rules
        .iter()
        .filter_map(|rule| Some((rule.apply(&term)?, rule.class().to_string())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_affix_rule() {
        let rules = AffixRule::parse("s", "en/e s e/").unwrap();
        assert_eq!(rules.len(), 3);
        assert_eq!(rules[0].apply("hasen").as_deref(), Some("hase"));
        assert_eq!(rules[1].apply("autos").as_deref(), Some("auto"));
        assert_eq!(rules[2].apply("hunde").as_deref(), Some("hund"));
        assert_eq!(rules[0].apply("hase"), None);
        assert_eq!(rules[1].apply("s"), None);
    }

    #[test]
    fn test_affix_rule_invalid() {
        assert!(AffixRule::parse("s", "/e").is_err());
        assert!(AffixRule::parse("s", "(e").is_err());
    }

    #[test]
    fn test_affix_candidates() {
        let rules = parse_rules(&[
            ("s".to_string(), "en/e".to_string()),
            ("v".to_string(), "en".to_string()),
        ])
        .unwrap();
        assert_eq!(
            affix_candidates(&rules, "Hasen"),
            vec![
                ("hase".to_string(), "s".to_string()),
                ("has".to_string(), "v".to_string()),
            ]
        );
    }
}
