//! キー・値ストレージのバックエンド
//!
//! 任意のバイト列をキーと値として保持する [`StorageBackend`] トレイトと、その実装を
//! 提供します。どのバックエンドも開いている間はレコードをメモリ上に保持し、
//! 永続バックエンドは [`StorageBackend::flush`] の時点でファイルへ書き出します。
//!
//! | 名前 | 拡張子 | フィーチャー | 永続性 |
//! |------|--------|--------------|--------|
//! | `rkyv` | `.rkv` | `rkyv-store` | rkyvアーカイブ(メモリマップで読み込み) |
//! | `zstd` | `.rkv.zst` | `zstd-store` | Zstandard圧縮したrkyvアーカイブ |
//! | `memory` | なし | 常に有効 | 揮発性 |

mod archive;
mod memory;

use std::fmt;
use std::path::Path;

use crate::errors::Result;

pub use crate::store::backend::archive::ArchiveBackend;
pub use crate::store::backend::memory::MemoryBackend;

/// レコードを保持するマップ
pub(crate) type RecordMap = hashbrown::HashMap<Vec<u8>, Vec<u8>>;

/// バイト列のキー・値ストア
///
/// 存在しないファイルや空のファイルを開いた場合は空のマップとして扱い、
/// エラーにはなりません。
pub trait StorageBackend {
    /// バックエンドの種類
    fn kind(&self) -> BackendKind;

    /// `path` のストアを開きます。揮発性バックエンドは `path` を無視します。
    fn open(&mut self, path: &Path) -> Result<()>;

    /// 値を取得します。
    fn get(&self, key: &[u8]) -> Option<&[u8]>;

    /// 値を設定します。
    fn set(&mut self, key: &[u8], value: &[u8]) -> Result<()>;

    /// すべてのレコードを列挙します。順序は不定です。
    fn each(&self) -> Box<dyn Iterator<Item = (&[u8], &[u8])> + '_>;

    /// レコード数
    fn len(&self) -> usize;

    /// レコードが無いかどうか
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// すべてのレコードを削除します。
    fn clear(&mut self) -> Result<()>;

    /// 変更を永続化します。
    fn flush(&mut self) -> Result<()>;

    /// 変更を永続化してストアを閉じます。複数回呼んでも安全です。
    fn close(&mut self) -> Result<()>;

    /// 閉じているかどうか
    fn is_closed(&self) -> bool;
}

/// バックエンドの種類
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BackendKind {
    /// rkyvアーカイブ
    Rkyv,
    /// Zstandard圧縮したrkyvアーカイブ
    Zstd,
    /// 揮発性のハッシュマップ
    Memory,
}

impl BackendKind {
    /// 永続バックエンドの一覧(拡張子の推定に使われます)
    pub const PERSISTENT: [Self; 2] = [Self::Zstd, Self::Rkyv];

    /// 設定で使われる名前から種類を得ます。
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "rkyv" => Some(Self::Rkyv),
            "zstd" => Some(Self::Zstd),
            "memory" => Some(Self::Memory),
            _ => None,
        }
    }

    /// 設定で使われる名前
    pub const fn name(self) -> &'static str {
        match self {
            Self::Rkyv => "rkyv",
            Self::Zstd => "zstd",
            Self::Memory => "memory",
        }
    }

    /// ストアファイルの拡張子
    pub const fn extension(self) -> Option<&'static str> {
        match self {
            Self::Rkyv => Some("rkv"),
            Self::Zstd => Some("rkv.zst"),
            Self::Memory => None,
        }
    }

    /// このビルドで利用可能かどうか
    pub const fn is_available(self) -> bool {
        match self {
            Self::Rkyv => cfg!(feature = "rkyv-store"),
            Self::Zstd => cfg!(feature = "zstd-store"),
            Self::Memory => true,
        }
    }

    /// 永続化するかどうか
    pub const fn is_persistent(self) -> bool {
        !matches!(self, Self::Memory)
    }

    /// 閉じた状態のバックエンドを作成します。
    ///
    /// 利用できない種類の場合は `None` を返します。
    pub fn create(self) -> Option<Box<dyn StorageBackend>> {
        if !self.is_available() {
            return None;
        }
        match self {
            Self::Rkyv | Self::Zstd => Some(Box::new(ArchiveBackend::new(self))),
            Self::Memory => Some(Box::new(MemoryBackend::new())),
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_name() {
        assert_eq!(BackendKind::from_name("rkyv"), Some(BackendKind::Rkyv));
        assert_eq!(BackendKind::from_name("zstd"), Some(BackendKind::Zstd));
        assert_eq!(BackendKind::from_name("memory"), Some(BackendKind::Memory));
        assert_eq!(BackendKind::from_name("gdbm"), None);
    }

    #[test]
    fn test_memory_always_available() {
        let backend = BackendKind::Memory.create().unwrap();
        assert!(backend.is_closed());
        assert_eq!(backend.kind(), BackendKind::Memory);
    }
}
