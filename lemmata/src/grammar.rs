//! 複合語の分解
//!
//! [`Grammar`] は辞書に無い語を、辞書に載っている前部と後部に分割できるかを
//! 再帰的に調べます。ハイフンを含む語は最後のハイフンでのみ分割され、
//! 辞書に無い部分はそのまま採用されます(信頼度の低い候補として扱われます)。
//! ハイフンを含まない語はすべての分割位置を左から試し、辞書だけで説明できる
//! 最初の分割を採用します。

use hashbrown::HashMap;

use crate::config::CompositumConfig;
use crate::dictionary::Dictionary;
use crate::lexical::{Lexical, Word, WordStatus, class};

const HYPHEN: char = '-';

/// 分解の結果
#[derive(Clone, Debug, PartialEq, Eq)]
struct Split {
    /// 各構成要素の文字数
    parts: Vec<usize>,
    /// 構成要素の語彙項目と、最後に合成された語彙項目
    lexicals: Vec<Lexical>,
    /// 主要部の語彙項目
    head: Option<Lexical>,
    /// 各構成要素の品詞タグの頭文字
    sequence: String,
}

impl Split {
    fn compound(&self) -> Option<&Lexical> {
        self.lexicals.last().filter(|lex| lex.is_class(class::COMPOUND))
    }
}

/// 分割の片側
struct Side {
    lexicals: Vec<Lexical>,
    form: String,
    head: Option<Lexical>,
    parts: Vec<usize>,
    sequence: String,
    genuine: bool,
}

impl Side {
    /// 複合語以外の語彙項目から片側を作ります。そのような語彙項目が無ければ `None`。
    fn from_lexicals(
        surface: &str,
        lexicals: Vec<Lexical>,
        back: bool,
        append: &str,
    ) -> Option<Self> {
        let constituents: Vec<&Lexical> = lexicals
            .iter()
            .filter(|lex| !lex.is_class(class::COMPOUND))
            .collect();
        let first = *constituents.first()?;
        let form = if back {
            first.form().to_string()
        } else {
            surface.to_string()
        };
        let lexicals: Vec<Lexical> = constituents
            .iter()
            .map(|lex| lex.with_appended_class(append))
            .collect();
        Some(Self {
            head: lexicals.first().cloned(),
            sequence: first.class().chars().next().into_iter().collect(),
            lexicals,
            form,
            parts: vec![surface.chars().count()],
            genuine: true,
        })
    }

    fn from_split(surface: &str, split: Split, genuine: bool, back: bool) -> Self {
        let form = match split.compound() {
            Some(compound) if back => compound.form().to_string(),
            _ => surface.to_string(),
        };
        let lexicals = split
            .lexicals
            .into_iter()
            .filter(|lex| !lex.is_class(class::COMPOUND))
            .collect();
        Self {
            lexicals,
            form,
            head: split.head,
            parts: split.parts,
            sequence: split.sequence,
            genuine,
        }
    }

    fn literal(surface: &str) -> Self {
        let lex = Lexical::new(surface, class::TAKE_AS_IS);
        Self {
            head: Some(lex.clone()),
            lexicals: vec![lex],
            form: surface.to_string(),
            parts: vec![surface.chars().count()],
            sequence: "x".to_string(),
            genuine: false,
        }
    }

    fn combine(fore: Self, infix: &str, aft: Self) -> (Split, bool) {
        let compound = Lexical::new(format!("{}{infix}{}", fore.form, aft.form), class::COMPOUND);
        let genuine = fore.genuine && aft.genuine;

        let mut lexicals = fore.lexicals;
        lexicals.extend(aft.lexicals);
        lexicals.push(compound);

        let mut parts = fore.parts;
        parts.extend(aft.parts);

        (
            Split {
                parts,
                lexicals,
                head: aft.head,
                sequence: fore.sequence + &aft.sequence,
            },
            genuine,
        )
    }
}

/// 分解器の統計
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GrammarStats {
    /// 問い合わせ数
    pub queries: usize,
    /// メモから応答した数
    pub memo_hits: usize,
    /// 分解できた語の数(メモ化された異なる語)
    pub compounds: usize,
}

/// 複合語分解器
pub struct Grammar {
    dic: Dictionary,
    config: CompositumConfig,
    memo: HashMap<String, Option<Split>>,
    stats: GrammarStats,
}

impl Grammar {
    /// # 引数
    ///
    /// * `dic` - 構成要素を引く辞書
    /// * `config` - 分解のしきい値
    pub fn new(dic: Dictionary, config: CompositumConfig) -> Self {
        Self {
            dic,
            config,
            memo: HashMap::new(),
            stats: GrammarStats::default(),
        }
    }

    /// 構成要素を引く辞書
    pub fn dictionary(&self) -> &Dictionary {
        &self.dic
    }

    /// 構成要素を引く辞書
    pub fn dictionary_mut(&mut self) -> &mut Dictionary {
        &mut self.dic
    }

    /// 分解のしきい値
    pub fn config(&self) -> &CompositumConfig {
        &self.config
    }

    /// 語を複合語として分解します。
    ///
    /// 結果は小文字化した入力をキーにメモ化されます。
    ///
    /// # 戻り値
    ///
    /// 分解できた場合は [`WordStatus::Compound`] の単語。語彙項目は前部の構成要素、
    /// 後部の構成要素、合成された語彙項目の順に並びます。分解できない場合は
    /// [`WordStatus::Unknown`] の単語。
    pub fn find_compound(&mut self, surface: &str) -> Word {
        self.stats.queries += 1;
        let key = surface.to_lowercase();

        let split = match self.memo.get(&key) {
            Some(split) => {
                self.stats.memo_hits += 1;
                split.clone()
            }
            None => {
                let split = self.decompose(&key, true).map(|(split, _)| split);
                if split.is_some() {
                    self.stats.compounds += 1;
                }
                self.memo.insert(key, split.clone());
                split
            }
        };

        match split {
            Some(split) => Word::with_lexicals(surface, WordStatus::Compound, split.lexicals)
                .with_head(split.head),
            None => Word::new(surface, WordStatus::Unknown),
        }
    }

    /// 統計
    pub fn report(&self) -> GrammarStats {
        self.stats
    }

    /// `word` の分解を試みます。
    ///
    /// 最短語長以下の語は、最上位でも構成要素の再分解でも分解しません。
    ///
    /// # 引数
    ///
    /// * `word` - 小文字化された語
    /// * `tail` - 語の末尾を含むかどうか。末尾でない後部には接中辞規則も使います。
    ///
    /// # 戻り値
    ///
    /// 分割と、辞書だけで説明できたかどうか。
    fn decompose(&mut self, word: &str, tail: bool) -> Option<(Split, bool)> {
        let chars: Vec<char> = word.chars().collect();
        if chars.len() <= self.config.min_word_size {
            return None;
        }

        if let Some(pos) = chars.iter().rposition(|&c| c == HYPHEN) {
            let fore: String = chars[..pos].iter().collect();
            let aft: String = chars[pos + 1..].iter().collect();
            if fore.is_empty() || aft.is_empty() {
                return None;
            }
            return self
                .test_split(&fore, "-", &aft, tail, true)
                .filter(|(split, _)| self.is_valid(split));
        }

        let min_part = self.config.min_part_size.max(1);
        let mut fallback = None;
        for i in min_part..chars.len() {
            if chars.len() - i < min_part {
                break;
            }
            let fore: String = chars[..i].iter().collect();
            let aft: String = chars[i..].iter().collect();
            let Some((split, genuine)) = self.test_split(&fore, "", &aft, tail, false)
            else {
                continue;
            };
            if !self.is_valid(&split) {
                continue;
            }
            if genuine {
                return Some((split, true));
            }
            if fallback.is_none() {
                fallback = Some((split, false));
            }
        }
        fallback
    }

    fn test_split(
        &mut self,
        fore: &str,
        infix: &str,
        aft: &str,
        tail: bool,
        hyphen: bool,
    ) -> Option<(Split, bool)> {
        let aft = self.resolve_back(aft, tail, hyphen)?;
        let fore = self.resolve_front(fore, hyphen)?;
        Some(Side::combine(fore, infix, aft))
    }

    fn resolve_back(&mut self, aft: &str, tail: bool, hyphen: bool) -> Option<Side> {
        let append = &self.config.append_wordclass;
        let mut side = Side::from_lexicals(aft, self.dic.select_with_suffix(aft), true, append);
        if side.is_none() && !tail {
            side = Side::from_lexicals(aft, self.dic.select_with_infix(aft), true, append);
        }
        if side.is_some() {
            return side;
        }
        if hyphen {
            return Some(match self.decompose(aft, tail) {
                Some((split, genuine)) => Side::from_split(aft, split, genuine, true),
                None => Side::literal(aft),
            });
        }
        None
    }

    fn resolve_front(&mut self, fore: &str, hyphen: bool) -> Option<Side> {
        let lexicals = self.dic.select_with_infix(fore);
        let side = Side::from_lexicals(fore, lexicals, false, &self.config.append_wordclass);
        if side.is_some() {
            return side;
        }
        if let Some((split, genuine)) = self.decompose(fore, false) {
            return Some(Side::from_split(fore, split, genuine, false));
        }
        if hyphen {
            return Some(Side::literal(fore));
        }
        None
    }

    fn is_valid(&self, split: &Split) -> bool {
        let n = split.parts.len();
        if n == 0 || n > self.config.max_parts {
            return false;
        }
        let min = split.parts.iter().copied().min().unwrap_or(0);
        if min < self.config.min_part_size {
            return false;
        }
        let avg = split.parts.iter().sum::<usize>() / n;
        if avg < self.config.min_avg_part_size {
            return false;
        }
        !self
            .config
            .skip_sequences
            .iter()
            .any(|seq| *seq == split.sequence)
    }
}
