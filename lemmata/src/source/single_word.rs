use regex::Regex;

use crate::errors::Result;
use crate::lexical::class;
use crate::source::{LineFormat, RawEntry, RawValue, normalize_term, term_pattern};

/// 一行に一語(または空白区切りの複数語)を書く形式
///
/// ```text
/// Hasenohr
/// Abstrakte Kunst
/// ```
///
/// 値は既定の品詞タグを持つ語彙項目です。空白を含む項目は複数語として扱われます。
pub struct SingleWord {
    line_re: Regex,
    def_wc: String,
}

impl SingleWord {
    /// # 引数
    ///
    /// * `def_wc` - 既定の品詞タグ
    pub fn new(def_wc: &str) -> Result<Self> {
        Ok(Self {
            line_re: Regex::new(&format!("^{}$", term_pattern()))?,
            def_wc: def_wc.to_string(),
        })
    }
}

impl LineFormat for SingleWord {
    fn name(&self) -> &'static str {
        "single-word"
    }

    fn parse(&mut self, line: &str) -> Option<Vec<RawEntry>> {
        if !self.line_re.is_match(line) {
            return None;
        }
        let key = normalize_term(line);
        let class = if key.contains(' ') {
            class::MULTIWORD
        } else {
            self.def_wc.as_str()
        };
        Some(vec![RawEntry::new(key, vec![RawValue::lexical("", class)])])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        let mut format = SingleWord::new("s").unwrap();
        assert_eq!(
            format.parse("hasenohr"),
            Some(vec![RawEntry::new("hasenohr", vec![RawValue::lexical("", "s")])])
        );
        assert_eq!(
            format.parse("abstrakte   kunst"),
            Some(vec![RawEntry::new(
                "abstrakte kunst",
                vec![RawValue::lexical("", "m")]
            )])
        );
        assert!(format.parse("o'neill").is_some());
        assert!(format.parse("hase;nase").is_none());
        assert!(format.parse("#kommentar").is_none());
    }
}
