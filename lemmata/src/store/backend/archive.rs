use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use rkyv::rancor::Error;
use rkyv::util::AlignedVec;
use rkyv::{
    Archive, Deserialize, Serialize, api::serialize_using, ser::Serializer,
    ser::allocator::Arena, ser::sharing::Share, ser::writer::IoWriter, util::with_arena,
};

use crate::errors::{BackendError, LemmataError, Result};
use crate::store::backend::{BackendKind, RecordMap, StorageBackend};

/// ストアファイルのマジックナンバー
pub const STORE_MAGIC: &[u8] = b"LemmataStore 1\n";

const STORE_MAGIC_LEN: usize = STORE_MAGIC.len();
const RKYV_ALIGNMENT: usize = 16;
const PADDING_LEN: usize = (RKYV_ALIGNMENT - (STORE_MAGIC_LEN % RKYV_ALIGNMENT)) % RKYV_ALIGNMENT;
const DATA_START: usize = STORE_MAGIC_LEN + PADDING_LEN;

#[cfg(feature = "zstd-store")]
const ZSTD_LEVEL: i32 = 3;

#[derive(Archive, Serialize, Deserialize)]
struct StoreRecord {
    key: Vec<u8>,
    value: Vec<u8>,
}

#[derive(Archive, Serialize, Deserialize)]
struct StoreImage {
    records: Vec<StoreRecord>,
}

/// rkyvアーカイブによる永続バックエンド
///
/// 開くときにファイル全体を読み込み、[`StorageBackend::flush`] で同じディレクトリの
/// 一時ファイルに書き出してから置き換えます。書き出しの途中で失敗しても元の
/// ファイルは壊れません。
pub struct ArchiveBackend {
    kind: BackendKind,
    path: Option<PathBuf>,
    map: RecordMap,
    dirty: bool,
}

impl ArchiveBackend {
    /// 閉じた状態のバックエンドを作成します。
    ///
    /// `kind` は [`BackendKind::Rkyv`] か [`BackendKind::Zstd`] です。
    pub(crate) fn new(kind: BackendKind) -> Self {
        debug_assert!(kind.is_persistent());
        Self {
            kind,
            path: None,
            map: RecordMap::new(),
            dirty: false,
        }
    }

    /// 開いているファイルのパス
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn read_records(&self, path: &Path) -> Result<RecordMap> {
        let file = match File::open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(RecordMap::new()),
            Err(e) => return Err(e.into()),
        };
        if file.metadata()?.len() == 0 {
            return Ok(RecordMap::new());
        }

        match self.kind {
            BackendKind::Zstd => read_zstd(path, file),
            _ => read_plain(path, file),
        }
    }

    fn write_records(&self, path: &Path) -> Result<()> {
        let dir = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir)?;

        let mut records: Vec<StoreRecord> = self
            .map
            .iter()
            .map(|(k, v)| StoreRecord {
                key: k.clone(),
                value: v.clone(),
            })
            .collect();
        records.sort_unstable_by(|a, b| a.key.cmp(&b.key));
        let image = StoreImage { records };

        let mut temp_file = tempfile::NamedTempFile::new_in(&dir)?;
        match self.kind {
            BackendKind::Zstd => write_zstd(&image, temp_file.as_file_mut())?,
            _ => write_image(&image, temp_file.as_file_mut())?,
        }
        temp_file.as_file().sync_all()?;
        temp_file.persist(path)?;

        log::debug!(
            "[lemmata] wrote {} records to {}",
            image.records.len(),
            path.display()
        );
        Ok(())
    }
}

#[cfg(feature = "rkyv-store")]
fn read_plain(path: &Path, file: File) -> Result<RecordMap> {
    // SAFETY: ストアファイルは rename でのみ置き換えられ、マップ中の内容は変化しない。
    let mmap = unsafe { memmap2::Mmap::map(&file)? };
    parse_image(path, &mmap)
}

#[cfg(not(feature = "rkyv-store"))]
fn read_plain(path: &Path, file: File) -> Result<RecordMap> {
    drop(file);
    parse_image(path, &fs::read(path)?)
}

#[cfg(feature = "zstd-store")]
fn read_zstd(path: &Path, file: File) -> Result<RecordMap> {
    let bytes = zstd::decode_all(file)?;
    parse_image(path, &bytes)
}

#[cfg(not(feature = "zstd-store"))]
fn read_zstd(_path: &Path, _file: File) -> Result<RecordMap> {
    Err(BackendError::Unavailable {
        name: BackendKind::Zstd.name().to_string(),
    }
    .into())
}

#[cfg(feature = "zstd-store")]
fn write_zstd(image: &StoreImage, file: &mut File) -> Result<()> {
    let mut encoder = zstd::Encoder::new(file, ZSTD_LEVEL)?;
    write_image(image, &mut encoder)?;
    encoder.finish()?;
    Ok(())
}

#[cfg(not(feature = "zstd-store"))]
fn write_zstd(_image: &StoreImage, _file: &mut File) -> Result<()> {
    Err(BackendError::Unavailable {
        name: BackendKind::Zstd.name().to_string(),
    }
    .into())
}

fn write_image<W>(image: &StoreImage, mut wtr: W) -> Result<()>
where
    W: Write,
{
    wtr.write_all(STORE_MAGIC)?;
    wtr.write_all(&[0xFF; PADDING_LEN])?;

    with_arena(|arena: &mut Arena| {
        let writer = IoWriter::new(&mut wtr);
        let mut serializer = Serializer::new(writer, arena.acquire(), Share::new());
        serialize_using::<_, Error>(image, &mut serializer)
    })
    .map_err(|e| LemmataError::invalid_state("rkyv serialization failed", e.to_string()))?;

    wtr.flush()?;
    Ok(())
}

fn parse_image(path: &Path, bytes: &[u8]) -> Result<RecordMap> {
    if !bytes.starts_with(STORE_MAGIC) {
        return Err(BackendError::Corrupted {
            path: path.to_path_buf(),
            msg: "the magic number mismatches".to_string(),
        }
        .into());
    }
    let Some(data_bytes) = bytes.get(DATA_START..) else {
        return Err(BackendError::Corrupted {
            path: path.to_path_buf(),
            msg: "file too small".to_string(),
        }
        .into());
    };

    let mut aligned_bytes = AlignedVec::<RKYV_ALIGNMENT>::with_capacity(data_bytes.len());
    aligned_bytes.extend_from_slice(data_bytes);

    let image = rkyv::from_bytes::<StoreImage, Error>(&aligned_bytes).map_err(|e| {
        BackendError::Corrupted {
            path: path.to_path_buf(),
            msg: format!("rkyv validation failed: {e}"),
        }
    })?;

    let mut map = RecordMap::with_capacity(image.records.len());
    for record in image.records {
        map.insert(record.key, record.value);
    }
    Ok(map)
}

impl StorageBackend for ArchiveBackend {
    fn kind(&self) -> BackendKind {
        self.kind
    }

    fn open(&mut self, path: &Path) -> Result<()> {
        self.map = self.read_records(path)?;
        self.path = Some(path.to_path_buf());
        self.dirty = false;
        log::debug!(
            "[lemmata] opened {} store {} ({} records)",
            self.kind,
            path.display(),
            self.map.len()
        );
        Ok(())
    }

    fn get(&self, key: &[u8]) -> Option<&[u8]> {
        self.map.get(key).map(Vec::as_slice)
    }

    fn set(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        if self.path.is_none() {
            return Err(LemmataError::invalid_state("store is closed", key.escape_ascii().to_string()));
        }
        self.map.insert(key.to_vec(), value.to_vec());
        self.dirty = true;
        Ok(())
    }

    fn each(&self) -> Box<dyn Iterator<Item = (&[u8], &[u8])> + '_> {
        Box::new(self.map.iter().map(|(k, v)| (k.as_slice(), v.as_slice())))
    }

    fn len(&self) -> usize {
        self.map.len()
    }

    fn clear(&mut self) -> Result<()> {
        self.map.clear();
        self.dirty = true;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        if !self.dirty {
            return Ok(());
        }
        let Some(path) = self.path.as_deref() else {
            return Ok(());
        };
        self.write_records(path)?;
        self.dirty = false;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        if self.path.is_none() {
            return Ok(());
        }
        self.flush()?;
        self.map.clear();
        self.path = None;
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.path.is_none()
    }
}

#[cfg(all(test, feature = "rkyv-store"))]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let mut backend = ArchiveBackend::new(BackendKind::Rkyv);
        backend.open(&dir.path().join("absent.rkv")).unwrap();
        assert!(backend.is_empty());
        assert!(!backend.is_closed());
    }

    #[test]
    fn test_empty_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.rkv");
        File::create(&path).unwrap();
        let mut backend = ArchiveBackend::new(BackendKind::Rkyv);
        backend.open(&path).unwrap();
        assert!(backend.is_empty());
    }

    #[test]
    fn test_persist_and_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("de.rkv");

        let mut backend = ArchiveBackend::new(BackendKind::Rkyv);
        backend.open(&path).unwrap();
        backend.set(b"hase", b"#s").unwrap();
        backend.set(&[0xC3, 0x28], &[0xFF, 0x00]).unwrap();
        backend.close().unwrap();
        assert!(path.exists());

        let mut backend = ArchiveBackend::new(BackendKind::Rkyv);
        backend.open(&path).unwrap();
        assert_eq!(backend.get(b"hase"), Some(&b"#s"[..]));
        assert_eq!(backend.get(&[0xC3, 0x28]), Some(&[0xFF, 0x00][..]));
        assert_eq!(backend.len(), 2);
    }

    #[test]
    fn test_foreign_file_is_corrupted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("foreign.rkv");
        fs::write(&path, b"not a store").unwrap();
        let mut backend = ArchiveBackend::new(BackendKind::Rkyv);
        assert!(matches!(
            backend.open(&path),
            Err(LemmataError::Backend(BackendError::Corrupted { .. }))
        ));
    }

    #[test]
    fn test_unflushed_changes_are_not_written() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("de.rkv");
        let mut backend = ArchiveBackend::new(BackendKind::Rkyv);
        backend.open(&path).unwrap();
        backend.set(b"k", b"v").unwrap();
        drop(backend);
        assert!(!path.exists());
    }

    #[cfg(feature = "zstd-store")]
    #[test]
    fn test_zstd_persist_and_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("de.rkv.zst");

        let mut backend = ArchiveBackend::new(BackendKind::Zstd);
        backend.open(&path).unwrap();
        backend.set(b"~", b"fingerprint").unwrap();
        backend.flush().unwrap();
        backend.close().unwrap();

        let mut backend = ArchiveBackend::new(BackendKind::Zstd);
        backend.open(&path).unwrap();
        assert_eq!(backend.get(b"~"), Some(&b"fingerprint"[..]));
    }
}
