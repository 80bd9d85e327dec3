use regex::Regex;

use crate::errors::Result;
use crate::source::{LineFormat, RawEntry, RawValue, normalize_term, term_pattern};

/// 代表語の後に変種を区切り文字で並べる形式
///
/// ```text
/// Fotografie;Photographie;Fotographie
/// ```
///
/// 代表語のレコードにはすべての変種を、各変種のレコードには代表語を保存します。
pub struct MultiKey {
    sep: char,
    term_re: Regex,
    def_wc: String,
}

impl MultiKey {
    /// # 引数
    ///
    /// * `sep` - 区切り文字(既定は `;`)
    /// * `def_wc` - 既定の品詞タグ
    pub fn new(sep: char, def_wc: &str) -> Result<Self> {
        Ok(Self {
            sep,
            term_re: Regex::new(&format!("^{}$", term_pattern()))?,
            def_wc: def_wc.to_string(),
        })
    }
}

impl LineFormat for MultiKey {
    fn name(&self) -> &'static str {
        "multi-key"
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
        let (key, variants) = terms.split_first()?;

        let mut entries = Vec::with_capacity(terms.len());
        entries.push(RawEntry::new(
            key.clone(),
            variants
                .iter()
                .map(|v| RawValue::lexical(v.as_str(), self.def_wc.as_str()))
                .collect(),
        ));
        for variant in variants {
            entries.push(RawEntry::new(
                variant.clone(),
                vec![RawValue::lexical(key.as_str(), self.def_wc.as_str())],
            ));
        }
        Some(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        let mut format = MultiKey::new(';', "s").unwrap();
        assert_eq!(
            format.parse("fotografie;photographie;fotographie"),
            Some(vec![
                RawEntry::new(
                    "fotografie",
                    vec![
                        RawValue::lexical("photographie", "s"),
                        RawValue::lexical("fotographie", "s"),
                    ]
                ),
                RawEntry::new("photographie", vec![RawValue::lexical("fotografie", "s")]),
                RawEntry::new("fotographie", vec![RawValue::lexical("fotografie", "s")]),
            ])
        );
        assert!(format.parse("fotografie;").is_none());
    }
}
