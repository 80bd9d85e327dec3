use regex::Regex;

use crate::errors::Result;
use crate::source::{LineFormat, RawEntry, RawValue, normalize_term, term_pattern};
use crate::store::index_key;

/// 同義の語を区切り文字で並べる形式
///
/// ```text
/// Hase;Kaninchen;Karnickel
/// ```
///
/// 一行ごとに索引キー `^<n>` を割り当て、そこにすべての語を保存します。各語の
/// レコードには索引キーへの参照だけを保存するため、どの語を引いても同じ
/// 語の集合が得られます。
pub struct MultiValue {
    sep: char,
    term_re: Regex,
    def_wc: String,
    next_index: usize,
}

impl MultiValue {
    /// # 引数
    ///
    /// * `sep` - 区切り文字(既定は `;`)
    /// * `def_wc` - 既定の品詞タグ
    pub fn new(sep: char, def_wc: &str) -> Result<Self> {
        Ok(Self {
            sep,
            term_re: Regex::new(&format!("^{}$", term_pattern()))?,
            def_wc: def_wc.to_string(),
            next_index: 0,
        })
    }
}

impl LineFormat for MultiValue {
    fn name(&self) -> &'static str {
        "multi-value"
    }

    fn parse(&mut self, line: &str) -> Option<Vec<RawEntry>> {
        let mut terms: Vec<String> = vec![];
        for term in line.split(self.sep).map(str::trim) {
            if !self.term_re.is_match(term) {
                return None;
            }
            let term = normalize_term(term);
            if !terms.contains(&term) {
                terms.push(term);
            }
        }

        let index = index_key(self.next_index);
        self.next_index += 1;

        let mut entries = Vec::with_capacity(terms.len() + 1);
        entries.push(RawEntry::new(
            index.clone(),
            terms
                .iter()
                .map(|t| RawValue::lexical(t.as_str(), self.def_wc.as_str()))
                .collect(),
        ));
        for term in terms {
            entries.push(RawEntry::new(term, vec![RawValue::Ref(index.clone())]));
        }
        Some(entries)
    }
}
