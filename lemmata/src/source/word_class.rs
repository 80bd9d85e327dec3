use regex::Regex;

use crate::errors::Result;
use crate::source::{CLASS_PATTERN, LineFormat, RawEntry, RawValue, normalize_term, term_pattern};

/// キーの後に `語形 #品詞[.性]` を並べる形式
///
/// ```text
/// abbauend,abbauen #v abbauend #a
/// häsin,hase #s.f
/// ```
pub struct WordClass {
    line_re: Regex,
    value_re: Regex,
}

impl WordClass {
    /// # 引数
    ///
    /// * `sep` - キーと値の区切り文字(既定は `,`)
    pub fn new(sep: char) -> Result<Self> {
        let term = term_pattern();
        let sep = regex::escape(&sep.to_string());
        let value = format!(r"(?:{term})? *#{CLASS_PATTERN}(?:\.[a-z]+)?");
        let line_re = Regex::new(&format!(r"^({term}) *{sep} *((?:{value} *)+)$"))?;
        let value_re = Regex::new(&format!(
            r"({term})? *#({CLASS_PATTERN})(?:\.([a-z]+))?"
        ))?;
        Ok(Self { line_re, value_re })
    }
}

impl LineFormat for WordClass {
    fn name(&self) -> &'static str {
        "word-class"
    }

    fn parse(&mut self, line: &str) -> Option<Vec<RawEntry>> {
        let caps = self.line_re.captures(line)?;
        let key = normalize_term(&caps[1]);

        let mut values = vec![];
        for value in self.value_re.captures_iter(&caps[2]) {
            let form = value.get(1).map_or(String::new(), |m| normalize_term(m.as_str()));
            let form = if form == key { String::new() } else { form };
            values.push(RawValue::Lexical {
                form,
                class: value[2].to_string(),
                gender: value.get(3).map(|m| m.as_str().to_string()),
            });
        }
        if values.is_empty() {
            return None;
        }
        Some(vec![RawEntry::new(key, values)])
    }
}
