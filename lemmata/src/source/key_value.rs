use regex::Regex;

use crate::errors::Result;
use crate::source::{CLASS_PATTERN, LineFormat, RawEntry, RawValue, normalize_term, term_pattern};

/// キーと値を区切り文字で並べる形式
///
/// ```text
/// Hasen*Hase
/// Goethe*Goethe, Johann Wolfgang#e
/// ```
///
/// 値の末尾に `#品詞` を書くと既定の品詞タグを上書きします。
pub struct KeyValue {
    line_re: Regex,
    def_wc: String,
}

impl KeyValue {
    /// # 引数
    ///
    /// * `sep` - 区切り文字(既定は `*`)
    /// * `def_wc` - 既定の品詞タグ
    pub fn new(sep: char, def_wc: &str) -> Result<Self> {
        let term = term_pattern();
        let sep = regex::escape(&sep.to_string());
        let line_re = Regex::new(&format!(
            r"^({term}) *{sep} *({term}(?:,? +{term})*)(?: *#({CLASS_PATTERN})(?:\.([a-z]+))?)?$"
        ))?;
        Ok(Self {
            line_re,
            def_wc: def_wc.to_string(),
        })
    }
}

impl LineFormat for KeyValue {
    fn name(&self) -> &'static str {
        "key-value"
    }

    fn parse(&mut self, line: &str) -> Option<Vec<RawEntry>> {
        let caps = self.line_re.captures(line)?;
        let key = normalize_term(&caps[1]);
        let form = normalize_term(&caps[2]);
        let form = if form == key { String::new() } else { form };
        let class = caps
            .get(3)
            .map_or(self.def_wc.clone(), |m| m.as_str().to_string());
        let gender = caps.get(4).map(|m| m.as_str().to_string());
        Some(vec![RawEntry::new(
            key,
            vec![RawValue::Lexical {
                form,
                class,
                gender,
            }],
        )])
    }
}
