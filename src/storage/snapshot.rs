use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use xxhash_rust::xxh3::Xxh3;

use crate::core::Node;

/// 快照文件 Header
const MAGIC: u32 = 0x4849_5831; // "HIX1"
const VERSION_CURRENT: u32 = 1;
const STATE_COMMITTED: u32 = 0x0000_0001;
const STATE_INCOMPLETE: u32 = 0xFFFF_FFFF;
const HEADER_SIZE: usize = 4 + 4 + 4 + 8 + 8; // magic + version + state + data_len + xxh3

/// 单个 Ordered Sequence 的原子快照（atomic replacement）
///
/// 落盘流程：
/// 1) 写 `<name>.tmp` 的 INCOMPLETE header（len/checksum 先置 0）
/// 2) `bincode::serialize_into` 流式写 body，边写边算 xxh3 / data_len
/// 3) seek 回开头覆盖 COMMITTED header
/// 4) fsync(tmpfile)
/// 5) rename(tmp, target)
/// 6) fsync(dir)
///
/// 加载时校验 magic + version + state + data_len + checksum，任一不符视为缓存未命中。
pub struct SnapshotStore {
    path: PathBuf,
}

struct ChecksumWriter<'a, W: Write> {
    inner: &'a mut W,
    hasher: Xxh3,
    bytes: u64,
}

impl<'a, W: Write> ChecksumWriter<'a, W> {
    fn new(inner: &'a mut W) -> Self {
        Self {
            inner,
            hasher: Xxh3::new(),
            bytes: 0,
        }
    }

    fn finish(self) -> (u64, u64) {
        (self.bytes, self.hasher.digest())
    }
}

impl<'a, W: Write> Write for ChecksumWriter<'a, W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.hasher.update(&buf[..n]);
        self.bytes += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}

fn encode_header(state: u32, data_len: u64, checksum: u64) -> [u8; HEADER_SIZE] {
    let mut header = [0u8; HEADER_SIZE];
    header[0..4].copy_from_slice(&MAGIC.to_le_bytes());
    header[4..8].copy_from_slice(&VERSION_CURRENT.to_le_bytes());
    header[8..12].copy_from_slice(&state.to_le_bytes());
    header[12..20].copy_from_slice(&data_len.to_le_bytes());
    header[20..28].copy_from_slice(&checksum.to_le_bytes());
    header
}

impl SnapshotStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 加载快照；文件不存在或校验失败返回 `Ok(None)`，只有 IO 错误才返回 Err。
    pub fn load_if_valid<R: DeserializeOwned>(&self) -> anyhow::Result<Option<Vec<Node<R>>>> {
        let data = match std::fs::read(&self.path) {
            Ok(d) => d,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        if data.len() < HEADER_SIZE {
            tracing::warn!("Snapshot {:?} too small, ignoring", self.path);
            return Ok(None);
        }

        let magic = u32::from_le_bytes(data[0..4].try_into()?);
        let version = u32::from_le_bytes(data[4..8].try_into()?);
        let state = u32::from_le_bytes(data[8..12].try_into()?);
        let data_len = u64::from_le_bytes(data[12..20].try_into()?);
        let stored_checksum = u64::from_le_bytes(data[20..28].try_into()?);

        if magic != MAGIC {
            tracing::warn!("Snapshot magic mismatch: {:#x} != {:#x}", magic, MAGIC);
            return Ok(None);
        }
        if version != VERSION_CURRENT {
            tracing::warn!(
                "Snapshot version mismatch: {} != {}",
                version,
                VERSION_CURRENT
            );
            return Ok(None);
        }
        if state != STATE_COMMITTED {
            tracing::warn!("Snapshot {:?} state INCOMPLETE, ignoring", self.path);
            return Ok(None);
        }

        let body = &data[HEADER_SIZE..];
        if body.len() as u64 != data_len {
            tracing::warn!("Snapshot data length mismatch");
            return Ok(None);
        }

        let computed = xxhash_rust::xxh3::xxh3_64(body);
        if computed != stored_checksum {
            tracing::warn!(
                "Snapshot checksum mismatch: {:#x} != {:#x}",
                computed,
                stored_checksum
            );
            return Ok(None);
        }

        match bincode::deserialize::<Vec<Node<R>>>(body) {
            Ok(nodes) => Ok(Some(nodes)),
            Err(e) => {
                tracing::warn!("Snapshot deserialize failed: {}", e);
                Ok(None)
            }
        }
    }

    /// 原子写入快照
    pub fn write_atomic<R: Serialize>(&self, nodes: &[Node<R>]) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut tmp_name = self.path.as_os_str().to_owned();
        tmp_name.push(".tmp");
        let tmp_path = PathBuf::from(tmp_name);

        let mut file = std::fs::File::create(&tmp_path)?;
        file.write_all(&encode_header(STATE_INCOMPLETE, 0, 0))?;

        let (data_len, checksum) = {
            let mut cw = ChecksumWriter::new(&mut file);
            bincode::serialize_into(&mut cw, nodes)?;
            cw.finish()
        };

        file.seek(SeekFrom::Start(0))?;
        file.write_all(&encode_header(STATE_COMMITTED, data_len, checksum))?;
        file.sync_all()?;

        std::fs::rename(&tmp_path, &self.path)?;

        if let Some(parent) = self.path.parent() {
            if let Ok(dir) = std::fs::File::open(parent) {
                let _ = dir.sync_all();
            }
        }

        tracing::info!(
            "Snapshot written: {} nodes, {} bytes -> {:?}",
            nodes.len(),
            HEADER_SIZE as u64 + data_len,
            self.path
        );
        Ok(())
    }

    pub fn remove(&self) -> anyhow::Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{FieldValue, Item};

    fn unique_tmp_dir(tag: &str) -> PathBuf {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir().join(format!("hier-index-{}-{}", tag, nanos))
    }

    fn nodes() -> Vec<Node<Item>> {
        vec![
            Node::new(0, Item::new().with("id", 1).with("t", "Books")),
            Node::new(1, Item::new().with("id", 2).with("w", FieldValue::Float(2.5))),
        ]
    }

    #[test]
    fn write_then_load_roundtrip() {
        let dir = unique_tmp_dir("snap-rt");
        let store = SnapshotStore::new(dir.join("a.hier"));
        store.write_atomic(&nodes()).unwrap();
        let loaded: Vec<Node<Item>> = store.load_if_valid().unwrap().unwrap();
        assert_eq!(loaded, nodes());
        assert!(!dir.join("a.hier.tmp").exists());
    }

    #[test]
    fn missing_file_is_a_miss() {
        let dir = unique_tmp_dir("snap-missing");
        let store = SnapshotStore::new(dir.join("none.hier"));
        assert!(store.load_if_valid::<Item>().unwrap().is_none());
        store.remove().unwrap();
    }

    #[test]
    fn corrupted_body_is_a_miss() {
        let dir = unique_tmp_dir("snap-corrupt");
        let store = SnapshotStore::new(dir.join("c.hier"));
        store.write_atomic(&nodes()).unwrap();

        let mut raw = std::fs::read(store.path()).unwrap();
        let last = raw.len() - 1;
        raw[last] ^= 0xFF;
        std::fs::write(store.path(), &raw).unwrap();
        assert!(store.load_if_valid::<Item>().unwrap().is_none());

        std::fs::write(store.path(), &raw[..HEADER_SIZE - 1]).unwrap();
        assert!(store.load_if_valid::<Item>().unwrap().is_none());
    }

    #[test]
    fn incomplete_header_is_a_miss() {
        let dir = unique_tmp_dir("snap-incomplete");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("i.hier");
        std::fs::write(&path, encode_header(STATE_INCOMPLETE, 0, 0)).unwrap();
        let store = SnapshotStore::new(path);
        assert!(store.load_if_valid::<Item>().unwrap().is_none());
    }
}
