//! lemmata 語彙ストアコンパイラのメインエントリーポイント
//!
//! 言語設定に従って辞書ソーステキストを語彙ストアに変換するサブコマンドと、
//! 変換済みのストアの内容を確認するサブコマンドを提供します。

mod build;
mod inspect;

use clap::Parser;
use thiserror::Error;

use crate::{build::BuildError, inspect::InspectError};

/// コマンドライン引数の構造体
#[derive(Parser, Debug)]
#[clap(name = "compile", version)]
struct Cli {
    /// 実行するサブコマンド
    #[clap(subcommand)]
    command: Command,
}

/// 利用可能なサブコマンド
#[derive(Parser, Debug)]
enum Command {
    /// 語彙ストアを構築します
    ///
    /// ソーステキストが変わった辞書だけを作り直します。
    Build(build::Args),

    /// 語彙ストアの内容を表示します
    Inspect(inspect::Args),
}

/// コンパイラの実行中に発生する可能性のあるエラー
#[derive(Debug, Error)]
pub enum CompileError {
    /// ストア構築中のエラー
    #[error(transparent)]
    BuildError(#[from] BuildError),
    /// ストア表示中のエラー
    #[error(transparent)]
    InspectError(#[from] InspectError),
}

/// メイン関数
///
/// ロガーを初期化し、コマンドライン引数をパースしてサブコマンドを実行します。
///
/// # エラー
///
/// 各サブコマンドの実行中にエラーが発生した場合、そのエラーが返されます。
fn main() -> Result<(), CompileError> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match cli.command {
        Command::Build(args) => Ok(build::run(args)?),
        Command::Inspect(args) => Ok(inspect::run(args)?),
    }
}
