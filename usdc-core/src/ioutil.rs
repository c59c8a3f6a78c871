// Byte I/O primitives: little-endian fixed-width integers and IEEE-754
// floats over a seekable sink, plus the two concrete backends (in-memory
// and on-disk) every higher-level table or encoder writes through.

use std::{
    fs::File,
    io::{BufReader, BufWriter, Cursor, Read, Seek, SeekFrom, Write},
    path::PathBuf,
    sync::Arc,
};

use usdc_base::{err, Result};

pub trait Reader: Read + Seek + Send + Sized {
    fn try_clone_independent(&self) -> std::io::Result<Self>;

    fn pos(&mut self) -> Result<u64> {
        Ok(self.stream_position()?)
    }

    fn rewind_to(&mut self, pos: u64) -> Result<()> {
        self.seek(SeekFrom::Start(pos))?;
        Ok(())
    }

    /// Reads an unsigned little-endian integer of `n` bytes, `n` in `1..=8`.
    fn read_le_uint(&mut self, n: usize) -> Result<u64> {
        debug_assert!(n >= 1 && n <= 8);
        let mut buf = [0u8; 8];
        self.read_exact(&mut buf[..n])
            .map_err(|e| err(format!("short read of {n}-byte integer: {e}")))?;
        Ok(u64::from_le_bytes(buf))
    }

    fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_le_uint(1)? as u8)
    }
    fn read_u32(&mut self) -> Result<u32> {
        Ok(self.read_le_uint(4)? as u32)
    }
    fn read_u64(&mut self) -> Result<u64> {
        self.read_le_uint(8)
    }
    fn read_i32(&mut self) -> Result<i32> {
        Ok(self.read_le_uint(4)? as u32 as i32)
    }
    fn read_i64(&mut self) -> Result<i64> {
        Ok(self.read_le_uint(8)? as i64)
    }

    fn read_f32(&mut self) -> Result<f32> {
        let mut buf = [0u8; 4];
        self.read_exact(&mut buf)
            .map_err(|e| err(format!("short read of f32: {e}")))?;
        Ok(f32::from_le_bytes(buf))
    }
    fn read_f64(&mut self) -> Result<f64> {
        let mut buf = [0u8; 8];
        self.read_exact(&mut buf)
            .map_err(|e| err(format!("short read of f64: {e}")))?;
        Ok(f64::from_le_bytes(buf))
    }

    fn read_bytes(&mut self, n: usize) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; n];
        self.read_exact(&mut buf)
            .map_err(|e| err(format!("short read of {n} bytes: {e}")))?;
        Ok(buf)
    }
}

pub trait Writer: Write + Seek + Send + Sized {
    type PairedReader: Reader;
    fn try_into_reader(self) -> std::io::Result<Self::PairedReader>;

    fn pos(&mut self) -> Result<u64> {
        Ok(self.stream_position()?)
    }

    fn rewind_to(&mut self, pos: u64) -> Result<()> {
        self.seek(SeekFrom::Start(pos))?;
        Ok(())
    }

    /// Writes the low `n` bytes of `value` as a little-endian unsigned
    /// integer, `n` in `1..=8`.
    fn write_le_uint(&mut self, value: u64, n: usize) -> Result<()> {
        debug_assert!(n >= 1 && n <= 8);
        let buf = value.to_le_bytes();
        self.write_all(&buf[..n])?;
        Ok(())
    }

    fn write_u8(&mut self, v: u8) -> Result<()> {
        self.write_le_uint(v as u64, 1)
    }
    fn write_u32(&mut self, v: u32) -> Result<()> {
        self.write_le_uint(v as u64, 4)
    }
    fn write_u64(&mut self, v: u64) -> Result<()> {
        self.write_le_uint(v, 8)
    }
    fn write_i32(&mut self, v: i32) -> Result<()> {
        self.write_le_uint(v as u32 as u64, 4)
    }
    fn write_i64(&mut self, v: i64) -> Result<()> {
        self.write_le_uint(v as u64, 8)
    }

    fn write_f32(&mut self, v: f32) -> Result<()> {
        self.write_all(&v.to_le_bytes())?;
        Ok(())
    }
    fn write_f64(&mut self, v: f64) -> Result<()> {
        self.write_all(&v.to_le_bytes())?;
        Ok(())
    }

    /// Pads with zero bytes up to the next multiple of `size`. No current
    /// section boundary in the crate-file layout needs alignment; kept for
    /// parity with the io layer's general contract.
    fn seek_to_alignment(&mut self, size: u64) -> Result<()> {
        let pos = self.pos()?;
        let rem = pos % size;
        if rem != 0 {
            let pad = vec![0u8; (size - rem) as usize];
            self.write_all(&pad)?;
        }
        Ok(())
    }
}

// MemReader / MemWriter

pub struct MemReader {
    mem: Cursor<Arc<[u8]>>,
}

impl MemReader {
    fn new(mem: Arc<[u8]>) -> Self {
        Self {
            mem: Cursor::new(mem),
        }
    }
}

impl From<Vec<u8>> for MemReader {
    fn from(vec: Vec<u8>) -> Self {
        let rc: Arc<[u8]> = Arc::from(vec);
        Self::new(rc)
    }
}

impl Read for MemReader {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.mem.read(buf)
    }
}

impl Seek for MemReader {
    fn seek(&mut self, pos: SeekFrom) -> std::io::Result<u64> {
        self.mem.seek(pos)
    }
}

impl Reader for MemReader {
    fn try_clone_independent(&self) -> std::io::Result<Self> {
        let rc = self.mem.get_ref().clone();
        Ok(Self::new(rc))
    }
}

pub struct MemWriter {
    mem: Cursor<Vec<u8>>,
}

impl MemWriter {
    pub fn new() -> Self {
        Self {
            mem: Cursor::new(Vec::new()),
        }
    }
}

impl Default for MemWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl Write for MemWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.mem.write(buf)
    }
    fn flush(&mut self) -> std::io::Result<()> {
        self.mem.flush()
    }
}

impl Seek for MemWriter {
    fn seek(&mut self, pos: SeekFrom) -> std::io::Result<u64> {
        self.mem.seek(pos)
    }
}

impl Writer for MemWriter {
    type PairedReader = MemReader;
    fn try_into_reader(self) -> std::io::Result<Self::PairedReader> {
        let mem = self.mem.into_inner();
        let rc: Arc<[u8]> = Arc::from(mem);
        Ok(MemReader {
            mem: Cursor::new(rc),
        })
    }
}

// FileReader / FileWriter

pub struct FileReader {
    file: BufReader<File>,
    path: PathBuf,
}

impl FileReader {
    pub fn try_open_existing(path: PathBuf) -> std::io::Result<Self> {
        let file = File::open(&path)?;
        let file = BufReader::new(file);
        Ok(Self { file, path })
    }
}
impl Read for FileReader {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.file.read(buf)
    }
}

impl Seek for FileReader {
    fn seek(&mut self, pos: SeekFrom) -> std::io::Result<u64> {
        self.file.seek(pos)
    }
}

impl Reader for FileReader {
    fn try_clone_independent(&self) -> std::io::Result<Self> {
        FileReader::try_open_existing(self.path.clone())
    }
}

pub struct FileWriter {
    file: BufWriter<File>,
    path: PathBuf,
}

impl FileWriter {
    pub fn try_create_non_existing(path: PathBuf) -> std::io::Result<Self> {
        let file = std::fs::OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .open(&path)?;
        let file = BufWriter::new(file);
        Ok(Self { file, path })
    }
}

impl Write for FileWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.file.write(buf)
    }
    fn flush(&mut self) -> std::io::Result<()> {
        self.file.flush()
    }
}
impl Seek for FileWriter {
    fn seek(&mut self, pos: SeekFrom) -> std::io::Result<u64> {
        self.file.seek(pos)
    }
}

impl Writer for FileWriter {
    type PairedReader = FileReader;
    fn try_into_reader(self) -> std::io::Result<Self::PairedReader> {
        let Self { mut file, path } = self;
        file.flush()?;
        let file = file.into_inner().map_err(|e| e.into_error())?;
        file.sync_all()?;
        drop(file);
        FileReader::try_open_existing(path)
    }
}
