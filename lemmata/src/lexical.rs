//! 語彙項目・単語・トークンの型定義
//!
//! このモジュールは、辞書引きの結果として得られる [`Lexical`]、表層形と解析状態を
//! 保持する [`Word`]、そしてトークナイザーが出力する [`Token`] を提供します。
//!
//! 辞書レコードの値は `form#class[.gender]` の形式でエンコードされます。
//! `form` が空の場合は、そのレコードのキー自身を意味します。

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// レコード内で語形と品詞タグを区切る文字
pub const LEXICAL_SEPARATOR: char = '#';

/// 品詞タグと性を区切る文字
pub const GENDER_SEPARATOR: char = '.';

/// 品詞タグ(単語クラス)の定数
pub mod class {
    /// 複合語として合成された語彙項目
    pub const COMPOUND: &str = "k";
    /// 複数語表現
    pub const MULTIWORD: &str = "m";
    /// 名詞
    pub const NOUN: &str = "s";
    /// 形容詞
    pub const ADJECTIVE: &str = "a";
    /// 動詞
    pub const VERB: &str = "v";
    /// 固有名詞
    pub const NAME: &str = "e";
    /// 同義語
    pub const SYNONYM: &str = "y";
    /// 語形(活用形)
    pub const WORDFORM: &str = "w";
    /// 辞書に無い部分を文字通り採用したもの(最低信頼度)
    pub const TAKE_AS_IS: &str = "x+";
    /// 未分類
    pub const UNKNOWN: &str = "?";

    /// ソート時の優先順位
    ///
    /// この表に無いタグは、すべての既知タグの後ろに並びます。
    pub(crate) const PRIORITY: &[&str] = &[
        MULTIWORD, COMPOUND, NOUN, ADJECTIVE, VERB, NAME, SYNONYM, WORDFORM, TAKE_AS_IS, UNKNOWN,
    ];
}

/// 辞書によって解決された基本形と品詞タグの組
///
/// 等価性とハッシュは語形・タグ・性のみで判定し、由来する辞書(`src`)は無視します。
#[derive(Clone, Debug)]
pub struct Lexical {
    form: String,
    class: String,
    gender: Option<String>,
    src: Option<String>,
}

impl Lexical {
    /// 新しい語彙項目を作成します。
    ///
    /// # 引数
    ///
    /// * `form` - 基本形
    /// * `class` - 品詞タグ
    pub fn new<F, C>(form: F, class: C) -> Self
    where
        F: Into<String>,
        C: Into<String>,
    {
        Self {
            form: form.into(),
            class: class.into(),
            gender: None,
            src: None,
        }
    }

    /// 性を設定します。
    pub fn with_gender<G: Into<String>>(mut self, gender: Option<G>) -> Self {
        self.gender = gender.map(Into::into);
        self
    }

    /// 由来する辞書IDを設定します。
    pub fn with_src<S: Into<String>>(mut self, src: S) -> Self {
        self.src = Some(src.into());
        self
    }

    /// レコードの値トークンから語彙項目を復元します。
    ///
    /// # 引数
    ///
    /// * `key` - レコードのキー。語形が空の場合に使われます。
    /// * `token` - `form#class[.gender]` 形式の値
    ///
    /// # 戻り値
    ///
    /// 区切り文字を含まないトークンの場合は `None`。
    pub fn from_record(key: &str, token: &str) -> Option<Self> {
        let (form, tag) = token.rsplit_once(LEXICAL_SEPARATOR)?;
        let form = if form.is_empty() { key } else { form };
        let (class, gender) = match tag.split_once(GENDER_SEPARATOR) {
            Some((class, gender)) if !gender.is_empty() => (class, Some(gender)),
            Some((class, _)) => (class, None),
            None => (tag, None),
        };
        if class.is_empty() {
            return None;
        }
        Some(Self::new(form, class).with_gender(gender))
    }

    /// `form#class[.gender]` 形式にエンコードします。
    pub fn to_record(&self) -> String {
        encode_record(&self.form, &self.class, self.gender.as_deref())
    }

    /// 基本形を取得します。
    #[inline(always)]
    pub fn form(&self) -> &str {
        &self.form
    }

    /// 品詞タグを取得します。
    #[inline(always)]
    pub fn class(&self) -> &str {
        &self.class
    }

    /// 性を取得します。
    #[inline(always)]
    pub fn gender(&self) -> Option<&str> {
        self.gender.as_deref()
    }

    /// 由来する辞書IDを取得します。
    #[inline(always)]
    pub fn src(&self) -> Option<&str> {
        self.src.as_deref()
    }

    /// 品詞タグが `class` と一致するかどうか
    #[inline(always)]
    pub fn is_class(&self, class: &str) -> bool {
        self.class == class
    }

    /// 品詞タグの末尾に `suffix` を付加した複製を返します。
    pub(crate) fn with_appended_class(&self, suffix: &str) -> Self {
        let mut lex = self.clone();
        lex.class.push_str(suffix);
        lex
    }

    fn rank(&self) -> usize {
        class::PRIORITY
            .iter()
            .position(|c| *c == self.class)
            .unwrap_or(class::PRIORITY.len())
    }
}

/// `form#class[.gender]` 形式の値を組み立てます。
pub(crate) fn encode_record(form: &str, class: &str, gender: Option<&str>) -> String {
    let mut s = String::with_capacity(form.len() + class.len() + 4);
    s.push_str(form);
    s.push(LEXICAL_SEPARATOR);
    s.push_str(class);
    if let Some(gender) = gender {
        s.push(GENDER_SEPARATOR);
        s.push_str(gender);
    }
    s
}

impl PartialEq for Lexical {
    fn eq(&self, other: &Self) -> bool {
        self.form == other.form && self.class == other.class && self.gender == other.gender
    }
}

impl Eq for Lexical {}

impl Hash for Lexical {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.form.hash(state);
        self.class.hash(state);
        self.gender.hash(state);
    }
}

impl Ord for Lexical {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank()
            .cmp(&other.rank())
            .then_with(|| self.class.cmp(&other.class))
            .then_with(|| self.form.cmp(&other.form))
            .then_with(|| self.gender.cmp(&other.gender))
    }
}

impl PartialOrd for Lexical {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Lexical {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}/{}", self.form, self.class)?;
        if let Some(gender) = &self.gender {
            write!(f, ".{gender}")?;
        }
        Ok(())
    }
}

/// 単語の解析状態
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum WordStatus {
    /// まだ辞書引きされていない
    #[default]
    Unset,
    /// 辞書で見つかった
    Identified,
    /// 辞書で見つからなかった
    Unknown,
    /// 複合語として分解された
    Compound,
    /// 複数語表現の一部として認識された
    Multiword,
    /// 品詞列パターンとして認識された
    Sequence,
    /// 複数語表現の未知の構成要素
    UnknownMultipart,
}

impl WordStatus {
    /// 出力用の短いタグ
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Unset => "-",
            Self::Identified => "IDF",
            Self::Unknown => "?",
            Self::Compound => "KOM",
            Self::Multiword => "MUL",
            Self::Sequence => "SEQ",
            Self::UnknownMultipart => "MU?",
        }
    }
}

/// 表層形と、解決された語彙項目の列
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Word {
    form: String,
    status: WordStatus,
    lexicals: Vec<Lexical>,
    head: Option<Lexical>,
    pattern: Option<String>,
}

impl Word {
    /// 語彙項目を持たない単語を作成します。
    pub fn new<F: Into<String>>(form: F, status: WordStatus) -> Self {
        Self {
            form: form.into(),
            status,
            lexicals: vec![],
            head: None,
            pattern: None,
        }
    }

    /// 語彙項目付きの単語を作成します。
    pub fn with_lexicals<F: Into<String>>(
        form: F,
        status: WordStatus,
        lexicals: Vec<Lexical>,
    ) -> Self {
        Self {
            lexicals,
            ..Self::new(form, status)
        }
    }

    /// 複合語の主要部を設定します。
    pub fn with_head(mut self, head: Option<Lexical>) -> Self {
        self.head = head;
        self
    }

    /// パターンタグを設定します。
    pub fn with_pattern<P: Into<String>>(mut self, pattern: P) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    /// 元の表層形
    #[inline(always)]
    pub fn form(&self) -> &str {
        &self.form
    }

    /// 解析状態
    #[inline(always)]
    pub fn status(&self) -> WordStatus {
        self.status
    }

    /// 語彙項目の列
    #[inline(always)]
    pub fn lexicals(&self) -> &[Lexical] {
        &self.lexicals
    }

    /// 複合語の主要部
    #[inline(always)]
    pub fn head(&self) -> Option<&Lexical> {
        self.head.as_ref()
    }

    /// パターンタグ
    #[inline(always)]
    pub fn pattern(&self) -> Option<&str> {
        self.pattern.as_deref()
    }

    /// 辞書で見つからなかったかどうか
    #[inline(always)]
    pub fn is_unknown(&self) -> bool {
        self.status == WordStatus::Unknown
    }

    /// 索引付けのために出力する見出し語
    ///
    /// 語彙項目を持たない単語は空の列を返します。
    pub fn lemmas(&self) -> Vec<&str> {
        if self.lexicals.is_empty() {
            return vec![];
        }
        let mut lemmas: Vec<&str> = Vec::with_capacity(self.lexicals.len());
        for lex in &self.lexicals {
            if !lemmas.contains(&lex.form()) {
                lemmas.push(lex.form());
            }
        }
        lemmas
    }
}

impl fmt::Display for Word {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "<{}", self.form)?;
        if self.status != WordStatus::Identified {
            write!(f, "|{}", self.status.tag())?;
        }
        if !self.lexicals.is_empty() {
            f.write_str(" = [")?;
            for (i, lex) in self.lexicals.iter().enumerate() {
                if i != 0 {
                    f.write_str(", ")?;
                }
                write!(f, "({lex})")?;
            }
            f.write_str("]")?;
        }
        f.write_str(">")
    }
}

/// トークナイザーの出力単位
///
/// 語彙項目を持たない [`Word`] の兄弟型です。
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Token {
    form: String,
    rule: String,
}

impl Token {
    /// 新しいトークンを作成します。
    ///
    /// # 引数
    ///
    /// * `form` - 表層形
    /// * `rule` - トークナイザーの規則タグ(例: `WORD`, `NUMS`, `PUNC`)
    pub fn new<F, R>(form: F, rule: R) -> Self
    where
        F: Into<String>,
        R: Into<String>,
    {
        Self {
            form: form.into(),
            rule: rule.into(),
        }
    }

    /// 表層形
    #[inline(always)]
    pub fn form(&self) -> &str {
        &self.form
    }

    /// 規則タグ
    #[inline(always)]
    pub fn rule(&self) -> &str {
        &self.rule
    }

    /// 未解析の [`Word`] に変換します。規則タグはパターンタグとして引き継がれます。
    pub fn into_word(self) -> Word {
        Word::new(self.form, WordStatus::Unset).with_pattern(self.rule)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, ":{}/{}:", self.form, self.rule)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_record() {
        let lex = Lexical::from_record("wort1", "projektion1#?").unwrap();
        assert_eq!(lex.form(), "projektion1");
        assert_eq!(lex.class(), "?");
        assert_eq!(lex.gender(), None);

        let lex = Lexical::from_record("haus", "#s.n").unwrap();
        assert_eq!(lex.form(), "haus");
        assert_eq!(lex.class(), "s");
        assert_eq!(lex.gender(), Some("n"));

        assert!(Lexical::from_record("haus", "haus").is_none());
        assert!(Lexical::from_record("haus", "haus#").is_none());
    }

    #[test]
    fn test_to_record() {
        let lex = Lexical::new("haus", "s").with_gender(Some("n"));
        assert_eq!(lex.to_record(), "haus#s.n");
        assert_eq!(Lexical::new("klein", "a").to_record(), "klein#a");
    }

    #[test]
    fn test_ordering() {
        let mut lexicals = vec![
            Lexical::new("zebra", "s"),
            Lexical::new("fremd", "q"),
            Lexical::new("klein", "a"),
            Lexical::new("kleinseite", "k"),
            Lexical::new("affe", "s"),
            Lexical::new("anders", "p"),
        ];
        lexicals.sort();
        let shown: Vec<_> = lexicals.iter().map(|l| l.to_string()).collect();
        assert_eq!(
            shown,
            ["kleinseite/k", "affe/s", "zebra/s", "klein/a", "anders/p", "fremd/q"]
        );
    }

    #[test]
    fn test_equality_ignores_src() {
        let a = Lexical::new("hase", "s").with_src("sys-dic");
        let b = Lexical::new("hase", "s").with_src("usr-dic");
        assert_eq!(a, b);
    }

    #[test]
    fn test_word_display() {
        let word = Word::with_lexicals(
            "Kleinseite",
            WordStatus::Compound,
            vec![
                Lexical::new("klein", "a+"),
                Lexical::new("seite", "s+"),
                Lexical::new("kleinseite", "k"),
            ],
        );
        assert_eq!(
            word.to_string(),
            "<Kleinseite|KOM = [(klein/a+), (seite/s+), (kleinseite/k)]>"
        );
        assert_eq!(word.lemmas(), ["klein", "seite", "kleinseite"]);
    }

    #[test]
    fn test_token_into_word() {
        let word = Token::new("Hasen", "WORD").into_word();
        assert_eq!(word.status(), WordStatus::Unset);
        assert_eq!(word.pattern(), Some("WORD"));
        assert!(word.lexicals().is_empty());
    }
}
