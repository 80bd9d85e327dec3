//! 語彙ストアの内容を表示するモジュール

use std::io::{BufWriter, Write};
use std::path::PathBuf;

use clap::Parser;
use lemmata::StoreRegistry;
use lemmata::config::LanguageConfig;
use lemmata::errors::LemmataError;

/// 表示コマンドの引数
#[derive(Parser, Debug)]
#[clap(name = "inspect", about = "A program to dump the records of a lexical store.")]
pub struct Args {
    /// Language configuration file (TOML).
    #[clap(short = 'c', long)]
    config: PathBuf,

    /// Dictionary id whose store is dumped.
    #[clap(short = 'd', long = "dictionary")]
    dictionary: String,

    /// Looks up a single key instead of dumping every record.
    #[clap(short = 'k', long)]
    key: Option<String>,
}

/// 表示処理中に発生する可能性のあるエラー
#[derive(Debug, thiserror::Error)]
pub enum InspectError {
    /// 出力エラー
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// ストアのエラー
    #[error(transparent)]
    Lemmata(#[from] LemmataError),
}

/// 表示コマンドを実行する
///
/// キーが指定された場合は復号・展開済みの値を、指定されない場合は保存されている
/// 生のレコードをタブ区切りで出力します。難読化されたストアの生のレコードは
/// そのままでは読めません。
pub fn run(args: Args) -> Result<(), InspectError> {
    let config = LanguageConfig::from_path(&args.config)?;
    let mut registry = StoreRegistry::new(config);
    let handle = registry.open(&args.dictionary)?;
    let store = handle.borrow();

    let out = std::io::stdout();
    let mut out = BufWriter::new(out.lock());

    if let Some(key) = &args.key {
        match store.lookup(key) {
            Some(values) => writeln!(out, "{key}\t{}", values.join(" "))?,
            None => writeln!(out, "{key}\t(not found)")?,
        }
    } else {
        for (key, value) in store.raw_records() {
            writeln!(
                out,
                "{}\t{}",
                String::from_utf8_lossy(&key),
                String::from_utf8_lossy(&value)
            )?;
        }
        log::info!(
            "{}: {} records in {} store",
            args.dictionary,
            store.len(),
            store.backend_kind()
        );
    }
    out.flush()?;
    drop(store);

    registry.close_all()?;
    Ok(())
}
