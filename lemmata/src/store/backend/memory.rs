use std::path::Path;

use crate::errors::Result;
use crate::store::backend::{BackendKind, RecordMap, StorageBackend};

/// 揮発性のバックエンド
///
/// 永続バックエンドが使えない場合、または書き込み可能な場所が無い場合の
/// フォールバックです。閉じるとすべてのレコードが失われます。
#[derive(Default)]
pub struct MemoryBackend {
    map: RecordMap,
    closed: bool,
}

impl MemoryBackend {
    /// 閉じた状態のバックエンドを作成します。
    pub fn new() -> Self {
        Self {
            map: RecordMap::new(),
            closed: true,
        }
    }
}

impl StorageBackend for MemoryBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Memory
    }

    fn open(&mut self, _path: &Path) -> Result<()> {
        self.closed = false;
        Ok(())
    }

    fn get(&self, key: &[u8]) -> Option<&[u8]> {
        self.map.get(key).map(Vec::as_slice)
    }

    fn set(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        self.map.insert(key.to_vec(), value.to_vec());
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
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.map.clear();
        self.closed = true;
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_close() {
        let mut backend = MemoryBackend::new();
        backend.open(Path::new("ignored")).unwrap();
        backend.set(b"k", &[0, 159, 146, 150]).unwrap();
        assert_eq!(backend.get(b"k"), Some(&[0u8, 159, 146, 150][..]));
        assert_eq!(backend.len(), 1);

        backend.close().unwrap();
        backend.close().unwrap();
        assert!(backend.is_closed());
        assert!(backend.get(b"k").is_none());
    }
}
