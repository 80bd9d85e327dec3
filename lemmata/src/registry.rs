//! 語彙ストアのレジストリ
//!
//! [`StoreRegistry`] は言語設定を保持し、辞書IDごとに語彙ストアを一度だけ開きます。
//! 開くときにソーステキストの指紋を計算し、ストアに保存された指紋と異なれば
//! ストアを作り直します。

use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::LazyLock;
use std::time::UNIX_EPOCH;

use hashbrown::HashMap;
use sha2::{Digest, Sha256};

use crate::cache::StoreHandle;
use crate::config::{DictionaryConfig, LanguageConfig};
use crate::converter::{ConversionReport, Converter};
use crate::dictionary::Dictionary;
use crate::errors::{BackendError, LemmataError, Result};
use crate::store::backend::BackendKind;
use crate::store::{FORMAT_VERSION, LexicalStore};

/// ユーザーごとのデータディレクトリ
///
/// ソースと同じ場所に書き込めない場合のストアの置き場所です。
pub static GLOBAL_DATA_DIR: LazyLock<Option<PathBuf>> =
    LazyLock::new(|| Some(dirs::data_local_dir()?.join("lemmata")));

/// 開かれた語彙ストアの集合
pub struct StoreRegistry {
    config: LanguageConfig,
    stores: HashMap<String, StoreHandle>,
    reports: HashMap<String, ConversionReport>,
}

impl StoreRegistry {
    /// 新しいレジストリを作成します。ストアはまだ開かれません。
    pub fn new(config: LanguageConfig) -> Self {
        Self {
            config,
            stores: HashMap::new(),
            reports: HashMap::new(),
        }
    }

    /// 言語設定
    pub fn config(&self) -> &LanguageConfig {
        &self.config
    }

    /// 語彙ストアを開きます。
    ///
    /// すでに開かれている場合は同じハンドルを返します。ストアが古い場合は
    /// ソーステキストから作り直します。`use-lex` が設定されていれば、先に
    /// 語彙化辞書のストアを開きます。
    ///
    /// # エラー
    ///
    /// 設定の欠落・循環、ソースファイルの欠落、バックエンドの選択や
    /// 書き込みの失敗はすべてエラーになります。
    pub fn open(&mut self, id: &str) -> Result<StoreHandle> {
        if let Some(handle) = self.stores.get(id)
            && !handle.borrow().is_closed()
        {
            return Ok(Rc::clone(handle));
        }

        let dic = self.config.dictionary(id)?.clone();
        let fingerprint = self.fingerprint(id)?;
        let (kind, path) = self.locate(id, &dic)?;

        let mut backend = kind.create().ok_or_else(|| BackendError::Unavailable {
            name: kind.name().to_string(),
        })?;
        backend.open(path.as_deref().unwrap_or(Path::new("")))?;
        let mut store = LexicalStore::new(id, backend, dic.crypt);

        if store.is_fresh(&fingerprint) {
            log::debug!("[lemmata] {id}: {kind} store is up to date");
        } else {
            log::info!(
                "[lemmata] {id}: building {kind} store{}",
                path.as_deref()
                    .map(|p| format!(" at {}", p.display()))
                    .unwrap_or_default()
            );
            let mut lexicalizer = match &dic.use_lex {
                Some(lex_id) => Some(Dictionary::new(self, &[lex_id.as_str()], dic.lex_mode)?),
                None => None,
            };
            let report = store.rebuild(&fingerprint, |store| {
                Converter::new(id, &dic, lexicalizer.as_mut()).convert(store)
            })?;
            self.reports.insert(id.to_string(), report);
        }

        let handle = Rc::new(RefCell::new(store));
        self.stores.insert(id.to_string(), Rc::clone(&handle));
        Ok(handle)
    }

    /// 語彙ストアを閉じます。開かれていない場合は何もしません。
    pub fn close(&mut self, id: &str) -> Result<()> {
        match self.stores.get(id) {
            Some(handle) => handle.borrow_mut().close(),
            None => Ok(()),
        }
    }

    /// すべての語彙ストアを閉じます。
    ///
    /// 失敗したストアがあっても残りを閉じ、最初のエラーを返します。
    pub fn close_all(&mut self) -> Result<()> {
        let mut result = Ok(());
        for (id, handle) in &self.stores {
            if let Err(e) = handle.borrow_mut().close() {
                log::error!("[lemmata] {id}: failed to close store: {e}");
                if result.is_ok() {
                    result = Err(e);
                }
            }
        }
        result
    }

    /// 開いている間に作り直したストアの変換結果
    pub fn report(&self, id: &str) -> Option<ConversionReport> {
        self.reports.get(id).copied()
    }

    /// 辞書の指紋を計算します。
    ///
    /// ソースファイルの大きさと更新時刻、レコード形式のバージョン、辞書の設定、
    /// および語彙化辞書の指紋から求めます。
    ///
    /// # エラー
    ///
    /// ソースファイルが無い場合、または `use-lex` が循環している場合。
    pub fn fingerprint(&self, id: &str) -> Result<String> {
        let mut chain = vec![];
        self.fingerprint_inner(id, &mut chain)
    }

    fn fingerprint_inner(&self, id: &str, chain: &mut Vec<String>) -> Result<String> {
        if chain.iter().any(|c| c == id) {
            return Err(LemmataError::config(
                id,
                format!("use-lex cycle: {} -> {id}", chain.join(" -> ")),
            ));
        }
        let dic = self.config.dictionary(id)?;
        let source_missing = || LemmataError::SourceFile {
            id: id.to_string(),
            path: dic.name.clone(),
        };
        let meta = fs::metadata(&dic.name).map_err(|_| source_missing())?;
        if !meta.is_file() {
            return Err(source_missing());
        }

        let mut hasher = Sha256::new();
        hasher.update(meta.len().to_le_bytes());
        if let Ok(mtime) = meta.modified()
            && let Ok(since) = mtime.duration_since(UNIX_EPOCH)
        {
            hasher.update(since.as_secs().to_le_bytes());
            hasher.update(since.subsec_nanos().to_le_bytes());
        }
        hasher.update(FORMAT_VERSION.to_le_bytes());
        hasher.update(serialize_config(id, dic)?.as_bytes());

        if let Some(lex_id) = &dic.use_lex {
            chain.push(id.to_string());
            let lex_fingerprint = self.fingerprint_inner(lex_id, chain)?;
            chain.pop();
            hasher.update(lex_fingerprint.as_bytes());
            let morphology = toml::to_string(&self.config.morphology)
                .map_err(|e| LemmataError::config(id, e.to_string()))?;
            hasher.update(morphology.as_bytes());
        }

        Ok(hex::encode(hasher.finalize()))
    }

    /// ストアのバックエンドと置き場所を決めます。
    ///
    /// 検索パスに既存のストアファイルがあればその形式を使います。無ければ
    /// 優先順位に従い、最初の書き込み可能な場所に作成します。
    fn locate(&self, id: &str, dic: &DictionaryConfig) -> Result<(BackendKind, Option<PathBuf>)> {
        let stem = dic
            .name
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| LemmataError::config(id, "invalid source file name"))?;
        let dirs = self.search_path(dic);

        let explicit = match &self.config.store.backend {
            Some(name) => {
                let kind = BackendKind::from_name(name)
                    .ok_or_else(|| LemmataError::config(id, format!("unknown backend '{name}'")))?;
                if !kind.is_available() {
                    return Err(BackendError::Unavailable { name: name.clone() }.into());
                }
                Some(kind)
            }
            None => None,
        };

        for dir in &dirs {
            for kind in BackendKind::PERSISTENT {
                if !kind.is_available() || explicit.is_some_and(|e| e != kind) {
                    continue;
                }
                let path = store_path(dir, stem, kind);
                if path.is_file() {
                    return Ok((kind, Some(path)));
                }
            }
        }

        let candidates = match explicit {
            Some(kind) => vec![kind],
            None => {
                let mut candidates = vec![];
                for name in &self.config.store.priority {
                    let kind = BackendKind::from_name(name).ok_or_else(|| {
                        LemmataError::config(id, format!("unknown backend '{name}'"))
                    })?;
                    if kind.is_available() {
                        candidates.push(kind);
                    } else {
                        log::debug!("[lemmata] {id}: backend '{name}' is not available");
                    }
                }
                candidates
            }
        };
        if candidates.is_empty() {
            return Err(BackendError::Unavailable {
                name: self.config.store.priority.join(","),
            }
            .into());
        }

        let mut writable = None;
        for kind in candidates {
            if !kind.is_persistent() {
                if writable == Some(None) {
                    log::warn!("[lemmata] {id}: no writable store location, using memory");
                }
                return Ok((kind, None));
            }
            let dir = *writable.get_or_insert_with(|| dirs.iter().find(|dir| is_writable(dir)));
            if let Some(dir) = dir {
                return Ok((kind, Some(store_path(dir, stem, kind))));
            }
        }
        Err(BackendError::NoWritableLocation { paths: dirs }.into())
    }

    fn search_path(&self, dic: &DictionaryConfig) -> Vec<PathBuf> {
        if !self.config.store.search_path.is_empty() {
            return self.config.store.search_path.clone();
        }
        let mut dirs = vec![
            dic.name
                .parent()
                .unwrap_or(Path::new(""))
                .join("store"),
        ];
        if let Some(dir) = GLOBAL_DATA_DIR.as_ref() {
            dirs.push(dir.join("store"));
        }
        dirs
    }
}

fn serialize_config(id: &str, dic: &DictionaryConfig) -> Result<String> {
    toml::to_string(dic).map_err(|e| LemmataError::config(id, e.to_string()))
}

fn store_path(dir: &Path, stem: &str, kind: BackendKind) -> PathBuf {
    match kind.extension() {
        Some(ext) => dir.join(format!("{stem}.{ext}")),
        None => dir.join(stem),
    }
}

fn is_writable(dir: &Path) -> bool {
    fs::create_dir_all(dir).is_ok() && tempfile::NamedTempFile::new_in(dir).is_ok()
}
