//! 語彙ストアの検索結果のキャッシュ

use std::cell::RefCell;
use std::rc::Rc;

use hashbrown::HashMap;

use crate::lexical::Lexical;
use crate::store::{LexicalStore, ValueToken};

/// 共有される語彙ストアへのハンドル
pub type StoreHandle = Rc<RefCell<LexicalStore>>;

/// キャッシュの統計
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// 問い合わせ数
    pub queries: usize,
    /// キャッシュから応答した数
    pub cache_hits: usize,
    /// ストアにレコードがあった数
    pub store_hits: usize,
    /// 返した語彙項目の総数
    pub lexicals: usize,
}

#[derive(Clone, Debug, Default)]
struct Entry {
    lexicals: Vec<Lexical>,
    hints: Vec<usize>,
}

/// 一つの語彙ストアの前に置かれる、無制限のメモ化キャッシュ
///
/// 存在しないキーも記録されるため、同じキーでストアを二度引くことはありません。
pub struct LexicalCache {
    id: String,
    store: StoreHandle,
    memo: HashMap<String, Option<Entry>>,
    stats: CacheStats,
}

impl LexicalCache {
    /// 新しいキャッシュを作成します。
    pub fn new(store: StoreHandle) -> Self {
        let id = store.borrow().id().to_string();
        Self {
            id,
            store,
            memo: HashMap::new(),
            stats: CacheStats::default(),
        }
    }

    /// 辞書ID
    pub fn id(&self) -> &str {
        &self.id
    }

    /// キーに対応する語彙項目を整列して返します。
    ///
    /// 各語彙項目の `src` にはこのキャッシュの辞書IDが設定されます。
    /// 長さのヒントは含まれません。
    pub fn select(&mut self, key: &str) -> Vec<Lexical> {
        self.stats.queries += 1;
        let lexicals = match self.entry(key) {
            Some(entry) => entry.lexicals.clone(),
            None => vec![],
        };
        self.stats.lexicals += lexicals.len();
        lexicals
    }

    /// キーに書き込まれた複数語の長さのヒントを返します。
    pub fn hints(&mut self, key: &str) -> Vec<usize> {
        self.stats.queries += 1;
        match self.entry(key) {
            Some(entry) => entry.hints.clone(),
            None => vec![],
        }
    }

    /// 統計
    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    fn entry(&mut self, key: &str) -> Option<&Entry> {
        let key = key.to_lowercase();
        if self.memo.contains_key(&key) {
            self.stats.cache_hits += 1;
        } else {
            let entry = self.load(&key);
            if entry.is_some() {
                self.stats.store_hits += 1;
            }
            self.memo.insert(key.clone(), entry);
        }
        self.memo.get(&key).and_then(Option::as_ref)
    }

    fn load(&self, key: &str) -> Option<Entry> {
        let tokens = self.store.borrow().lookup(key)?;

        let mut entry = Entry::default();
        for token in &tokens {
            match ValueToken::parse(token) {
                ValueToken::Hint(n) => entry.hints.push(n),
                ValueToken::Lexical(value) => {
                    if let Some(lex) = Lexical::from_record(key, value) {
                        entry.lexicals.push(lex.with_src(self.id.as_str()));
                    }
                }
                ValueToken::Ref(_) => {}
            }
        }
        entry.lexicals.sort();
        entry.lexicals.dedup();
        entry.hints.sort_unstable();
        entry.hints.dedup();
        Some(entry)
    }
}
