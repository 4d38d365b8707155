use std::fs::File;
use std::io::{self, BufReader, Cursor, Read, Seek, SeekFrom};
use std::path::Path;

use anyhow::Result;

/// Byte source behind an [`InputReader`].
///
/// Pipes are not seekable, so stdin is buffered in memory.
pub enum InputSource {
    File(BufReader<File>),
    Memory(Cursor<Vec<u8>>),
}

impl Read for InputSource {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            InputSource::File(r) => r.read(buf),
            InputSource::Memory(r) => r.read(buf),
        }
    }
}

impl Seek for InputSource {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        match self {
            InputSource::File(r) => r.seek(pos),
            InputSource::Memory(r) => r.seek(pos),
        }
    }
}

/// Unified input reader that handles both file and pipe input with buffered reading
pub struct InputReader {
    source: InputSource,
    is_pipe: bool,
}

impl InputReader {
    /// Create a new InputReader from a path
    /// Use "-" for stdin pipe input
    pub fn new<P: AsRef<Path>>(input_path: P) -> Result<Self> {
        let path_str = input_path.as_ref().to_string_lossy();
        let is_pipe = path_str == "-";

        let source = if is_pipe {
            let mut data = Vec::new();
            io::stdin().lock().read_to_end(&mut data)?;
            log::debug!("Buffered {} bytes from stdin", data.len());
            InputSource::Memory(Cursor::new(data))
        } else {
            let file = File::open(input_path)?;
            InputSource::File(BufReader::new(file))
        };

        Ok(Self { source, is_pipe })
    }

    /// Read up to `size` bytes from the start of the input, then rewind.
    pub fn read_preview(&mut self, size: usize) -> Result<Vec<u8>> {
        self.source.seek(SeekFrom::Start(0))?;

        let mut preview = Vec::with_capacity(size);
        self.source.by_ref().take(size as u64).read_to_end(&mut preview)?;

        self.source.seek(SeekFrom::Start(0))?;
        Ok(preview)
    }

    /// Total length of the input in bytes.
    pub fn stream_length(&mut self) -> Result<u64> {
        let pos = self.source.stream_position()?;
        let len = self.source.seek(SeekFrom::End(0))?;
        self.source.seek(SeekFrom::Start(pos))?;
        Ok(len)
    }

    /// Check if this is pipe input
    pub fn is_pipe(&self) -> bool {
        self.is_pipe
    }

    pub fn into_source(self) -> InputSource {
        self.source
    }
}
