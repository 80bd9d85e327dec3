//! エラー型の定義
//!
//! このモジュールは、lemmataライブラリで使用されるすべてのエラー型を定義します。
//! 辞書ストアを開けない場合のエラーはすべて致命的であり、呼び出し側はその時点で
//! 処理全体を中断することが想定されています。行単位のフォーマットエラーはここには
//! 現れません。それらは `.rev` ファイルへ退避され、件数として数えられます。

use std::error::Error;
use std::fmt;
use std::path::PathBuf;

/// lemmata専用のResult型
///
/// エラー型としてデフォルトで[`LemmataError`]を使用します。
pub type Result<T, E = LemmataError> = std::result::Result<T, E>;

/// lemmataのエラー型
///
/// このライブラリで発生する可能性のあるすべてのエラーを表現します。
#[derive(Debug, thiserror::Error)]
pub enum LemmataError {
    /// 無効な引数エラー
    #[error(transparent)]
    InvalidArgument(InvalidArgumentError),

    /// 無効なフォーマットエラー
    #[error(transparent)]
    InvalidFormat(InvalidFormatError),

    /// 無効な状態エラー
    #[error(transparent)]
    InvalidState(InvalidStateError),

    /// 設定ファイルまたは辞書設定の欠落や不正
    ///
    /// 該当する段の起動を中断します。
    #[error("ConfigError: '{id}': {msg}")]
    Config {
        /// 辞書ID、または設定ファイルのパス
        id: String,
        /// エラーメッセージ
        msg: String,
    },

    /// 宣言されたソーステキストファイルが存在しない
    #[error("SourceFileError: dictionary '{id}': source file '{}' not found", path.display())]
    SourceFile {
        /// 辞書ID
        id: String,
        /// ソースファイルのパス
        path: PathBuf,
    },

    /// ストレージバックエンドのエラー
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// UTF-8エンコーディングエラー
    #[error(transparent)]
    Utf8(#[from] std::str::Utf8Error),

    /// 正規表現のコンパイルエラー
    #[error(transparent)]
    Regex(#[from] regex::Error),

    /// I/Oエラー
    #[error(transparent)]
    IoError(#[from] std::io::Error),

    /// rkyvシリアライゼーションエラー
    #[error(transparent)]
    RkyvError(#[from] rkyv::rancor::Error),

    /// 一時ファイルの永続化エラー
    #[error(transparent)]
    PathPersist(#[from] tempfile::PersistError),
}

impl LemmataError {
    /// 無効な引数エラーを生成します
    ///
    /// # 引数
    ///
    /// * `arg` - 引数の名前
    /// * `msg` - エラーメッセージ
    pub(crate) fn invalid_argument<S>(arg: &'static str, msg: S) -> Self
    where
        S: Into<String>,
    {
        Self::InvalidArgument(InvalidArgumentError {
            arg,
            msg: msg.into(),
        })
    }

    /// 無効なフォーマットエラーを生成します
    ///
    /// # 引数
    ///
    /// * `arg` - フォーマット名
    /// * `msg` - エラーメッセージ
    pub(crate) fn invalid_format<S>(arg: &'static str, msg: S) -> Self
    where
        S: Into<String>,
    {
        Self::InvalidFormat(InvalidFormatError {
            arg,
            msg: msg.into(),
        })
    }

    /// 無効な状態エラーを生成します
    ///
    /// # 引数
    ///
    /// * `msg` - エラーメッセージ
    /// * `cause` - エラーの原因
    pub(crate) fn invalid_state<S, M>(msg: S, cause: M) -> Self
    where
        S: Into<String>,
        M: Into<String>,
    {
        Self::InvalidState(InvalidStateError {
            msg: msg.into(),
            cause: cause.into(),
        })
    }

    /// 設定エラーを生成します
    pub(crate) fn config<I, S>(id: I, msg: S) -> Self
    where
        I: Into<String>,
        S: Into<String>,
    {
        Self::Config {
            id: id.into(),
            msg: msg.into(),
        }
    }
}

/// ストレージバックエンドに関するエラー
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// 要求されたバックエンドがこのビルドで利用できない
    #[error("BackendError: backend '{name}' is not available in this build")]
    Unavailable {
        /// バックエンド名
        name: String,
    },

    /// 検索パスのどこにも書き込み可能な場所がない
    #[error("BackendError: no writable store location in {paths:?}")]
    NoWritableLocation {
        /// 試行したパス
        paths: Vec<PathBuf>,
    },

    /// ストアファイルが破損している
    #[error("BackendError: store file '{}' is corrupted: {msg}", path.display())]
    Corrupted {
        /// ストアファイルのパス
        path: PathBuf,
        /// エラーメッセージ
        msg: String,
    },
}

/// 引数が無効な場合に使用されるエラー
#[derive(Debug)]
pub struct InvalidArgumentError {
    /// 引数の名前
    pub(crate) arg: &'static str,

    /// エラーメッセージ
    pub(crate) msg: String,
}

impl fmt::Display for InvalidArgumentError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "InvalidArgumentError: {}: {}", self.arg, self.msg)
    }
}

impl Error for InvalidArgumentError {}

/// 入力フォーマットが無効な場合に使用されるエラー
#[derive(Debug)]
pub struct InvalidFormatError {
    /// フォーマットの名前
    pub(crate) arg: &'static str,

    /// エラーメッセージ
    pub(crate) msg: String,
}

impl fmt::Display for InvalidFormatError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "InvalidFormatError: {}: {}", self.arg, self.msg)
    }
}

impl Error for InvalidFormatError {}

/// 状態が無効な場合に使用されるエラー
#[derive(Debug)]
pub struct InvalidStateError {
    /// エラーメッセージ
    pub(crate) msg: String,

    /// エラーの根本原因
    pub(crate) cause: String,
}

impl fmt::Display for InvalidStateError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "InvalidStateError: {}: {}", self.msg, self.cause)
    }
}

impl Error for InvalidStateError {}
