//! 語彙ストアのビルドモジュール
//!
//! 言語設定に載っている辞書のストアを開き、古いものをソーステキストから
//! 作り直します。作り直したストアについては変換結果の件数を表示します。

use std::path::PathBuf;

use clap::Parser;
use lemmata::StoreRegistry;
use lemmata::config::LanguageConfig;
use lemmata::errors::LemmataError;

/// ビルドコマンドの引数
#[derive(Parser, Debug)]
#[clap(name = "build", about = "A program to build the lexical stores of a language.")]
pub struct Args {
    /// Language configuration file (TOML).
    #[clap(short = 'c', long)]
    config: PathBuf,

    /// Dictionary ids to build. All configured dictionaries are built if omitted.
    #[clap(short = 'd', long = "dictionary")]
    dictionaries: Vec<String>,
}

/// ビルド処理中に発生する可能性のあるエラー
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// 設定ファイルに辞書が一つも無い
    #[error("No dictionaries are configured in {0}")]
    NoDictionaries(PathBuf),

    /// ストアの構築エラー
    #[error("Store building failed: {0}")]
    Lemmata(#[from] LemmataError),
}

/// ビルドコマンドを実行する
///
/// # エラー
///
/// 設定の読み込み、またはいずれかのストアの構築に失敗した場合、`BuildError`を返します。
pub fn run(args: Args) -> Result<(), BuildError> {
    let config = LanguageConfig::from_path(&args.config)?;
    let ids: Vec<String> = if args.dictionaries.is_empty() {
        config.dictionaries.keys().cloned().collect()
    } else {
        args.dictionaries
    };
    if ids.is_empty() {
        return Err(BuildError::NoDictionaries(args.config));
    }

    let mut registry = StoreRegistry::new(config);
    for id in &ids {
        let store = registry.open(id)?;
        let store = store.borrow();
        match registry.report(id) {
            Some(report) => println!(
                "{id}: built {} store ({} lines, {} entries, {} rejected, {} keys)",
                store.backend_kind(),
                report.lines,
                report.entries,
                report.rejected,
                report.keys,
            ),
            None => println!(
                "{id}: {} store is up to date ({} records)",
                store.backend_kind(),
                store.len(),
            ),
        }
    }
    registry.close_all()?;

    println!("Successfully built {} store(s)", ids.len());
    Ok(())
}
