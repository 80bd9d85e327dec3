//! テスト用ユーティリティ
//!
//! 一時ディレクトリにソーステキストを書き出し、それを参照する言語設定を
//! 組み立てる [`TestEnv`] を提供します。

use std::fs;
use std::path::PathBuf;

use tempfile::{TempDir, tempdir};

use crate::config::{DictionaryConfig, LanguageConfig, TextFormat};
use crate::registry::StoreRegistry;

pub struct TestEnv {
    _temp_dir: TempDir,
    pub work_dir: PathBuf,
    pub config: LanguageConfig,
}

impl TestEnv {
    /// ストアを `<work_dir>/store` に置く環境を作成します。
    pub fn new() -> Self {
        let temp_dir = tempdir().expect("Failed to create a temporary directory");
        let work_dir = temp_dir.path().to_path_buf();

        let mut config = LanguageConfig::default();
        config.store.search_path = vec![work_dir.join("store")];

        Self {
            _temp_dir: temp_dir,
            work_dir,
            config,
        }
    }

    /// ソーステキストを書き出し、辞書として登録します。
    ///
    /// 返り値の設定は登録後に書き換えられます。
    pub fn add_source(
        &mut self,
        id: &str,
        file_name: &str,
        txt_format: TextFormat,
        text: &str,
    ) -> &mut DictionaryConfig {
        let path = self.work_dir.join(file_name);
        fs::write(&path, text).unwrap();
        self.config
            .insert_dictionary(id, DictionaryConfig::new(path, txt_format));
        self.config.dictionaries.get_mut(id).unwrap()
    }

    /// 登録済みのソーステキストを書き換えます。
    pub fn rewrite_source(&self, id: &str, text: &str) {
        let path = &self.config.dictionaries[id].name;
        fs::write(path, text).unwrap();
    }

    /// 現在の設定でレジストリを作成します。
    pub fn registry(&self) -> StoreRegistry {
        StoreRegistry::new(self.config.clone())
    }

    /// `<work_dir>/store` 以下のファイル名
    pub fn store_files(&self) -> Vec<String> {
        let mut names: Vec<String> = match fs::read_dir(self.work_dir.join("store")) {
            Ok(entries) => entries
                .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
                .collect(),
            Err(_) => vec![],
        };
        names.sort();
        names
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        TestEnv::new()
    }
}

/// 文字列の列を作成します。
pub fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
