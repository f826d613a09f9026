//! Source readers: the assembler's "next line / rewind" capability.
//!
//! The two-pass engine never holds the whole source; it asks a reader for
//! one line at a time and rewinds between passes. [`StringReader`] backs
//! the common in-memory case; [`BlockReader`] streams from a sectorised
//! [`BlockDevice`] through a fixed working buffer, which is how sources
//! too large for core are assembled in the self-hosted environment.

/// Sector size of a block device, in bytes.
pub const SECTOR_SIZE: usize = 512;

/// Default working-buffer capacity of a [`BlockReader`], in bytes.
pub const DEFAULT_LINE_BUFFER: usize = 256;

/// A reader failure.
#[derive(Debug, thiserror::Error)]
pub enum ReadError {
    /// A source line does not fit the streaming working buffer.
    #[error("source line exceeds the {0}-byte working buffer")]
    BufferOverflow(usize),

    /// The backing device failed.
    #[error("device error: {0}")]
    Device(String),
}

/// Produces source lines in order and can restart from the beginning.
pub trait SourceReader {
    /// Returns the next line without its terminator, or `None` at the end
    /// of the source.
    fn next_line(&mut self) -> Result<Option<String>, ReadError>;

    /// Restarts the stream from the first line (used for pass 2).
    fn rewind(&mut self) -> Result<(), ReadError>;
}

/// An in-memory reader over a source string.
pub struct StringReader {
    lines: Vec<String>,
    pos: usize,
}

impl StringReader {
    /// Creates a reader over `source`.
    pub fn new(source: &str) -> Self {
        Self {
            lines: source.lines().map(str::to_string).collect(),
            pos: 0,
        }
    }
}

impl SourceReader for StringReader {
    fn next_line(&mut self) -> Result<Option<String>, ReadError> {
        if self.pos >= self.lines.len() {
            return Ok(None);
        }
        self.pos += 1;
        Ok(Some(self.lines[self.pos - 1].clone()))
    }

    fn rewind(&mut self) -> Result<(), ReadError> {
        self.pos = 0;
        Ok(())
    }
}

/// A sectorised storage device holding assembly source.
///
/// The stream ends at the first NUL byte or when the sectors run out.
pub trait BlockDevice {
    /// Reads sector `index` into `buf`.
    fn read_sector(&mut self, index: u32, buf: &mut [u8; SECTOR_SIZE]) -> Result<(), String>;

    /// Number of sectors on the device.
    fn sector_count(&self) -> u32;
}

/// Streams lines from a [`BlockDevice`] through a fixed working buffer.
///
/// Refills sector by sector; a line longer than the buffer capacity is a
/// fatal [`ReadError::BufferOverflow`]. Rewinding restarts from sector 0.
pub struct BlockReader<D: BlockDevice> {
    device: D,
    capacity: usize,
    sector: u32,
    /// Byte position within the loaded sector.
    offset: usize,
    buf: [u8; SECTOR_SIZE],
    loaded: Option<u32>,
    done: bool,
}

impl<D: BlockDevice> BlockReader<D> {
    /// Creates a reader with the default working-buffer capacity.
    pub fn new(device: D) -> Self {
        Self::with_capacity(device, DEFAULT_LINE_BUFFER)
    }

    /// Creates a reader with an explicit working-buffer capacity.
    pub fn with_capacity(device: D, capacity: usize) -> Self {
        Self {
            device,
            capacity,
            sector: 0,
            offset: 0,
            buf: [0; SECTOR_SIZE],
            loaded: None,
            done: false,
        }
    }

    fn next_byte(&mut self) -> Result<Option<u8>, ReadError> {
        loop {
            if self.sector >= self.device.sector_count() {
                return Ok(None);
            }
            if self.loaded != Some(self.sector) {
                self.device
                    .read_sector(self.sector, &mut self.buf)
                    .map_err(ReadError::Device)?;
                self.loaded = Some(self.sector);
            }
            if self.offset < SECTOR_SIZE {
                let byte = self.buf[self.offset];
                self.offset += 1;
                return Ok(Some(byte));
            }
            self.sector += 1;
            self.offset = 0;
        }
    }
}

impl<D: BlockDevice> SourceReader for BlockReader<D> {
    fn next_line(&mut self) -> Result<Option<String>, ReadError> {
        if self.done {
            return Ok(None);
        }
        let mut line = Vec::new();
        loop {
            match self.next_byte()? {
                None | Some(0) => {
                    self.done = true;
                    if line.is_empty() {
                        return Ok(None);
                    }
                    break;
                }
                Some(b'\n') => break,
                Some(b'\r') => continue,
                Some(byte) => {
                    if line.len() >= self.capacity {
                        return Err(ReadError::BufferOverflow(self.capacity));
                    }
                    line.push(byte);
                }
            }
        }
        Ok(Some(String::from_utf8_lossy(&line).into_owned()))
    }

    fn rewind(&mut self) -> Result<(), ReadError> {
        self.sector = 0;
        self.offset = 0;
        self.loaded = None;
        self.done = false;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A device over an in-memory byte image.
    pub(crate) struct MemDevice {
        pub image: Vec<u8>,
    }

    impl MemDevice {
        pub fn from_text(text: &str) -> Self {
            let mut image = text.as_bytes().to_vec();
            let sectors = image.len().div_ceil(SECTOR_SIZE).max(1);
            image.resize(sectors * SECTOR_SIZE, 0);
            Self { image }
        }
    }

    impl BlockDevice for MemDevice {
        fn read_sector(&mut self, index: u32, buf: &mut [u8; SECTOR_SIZE]) -> Result<(), String> {
            let start = index as usize * SECTOR_SIZE;
            buf.copy_from_slice(&self.image[start..start + SECTOR_SIZE]);
            Ok(())
        }

        fn sector_count(&self) -> u32 {
            (self.image.len() / SECTOR_SIZE) as u32
        }
    }

    #[test]
    fn string_reader_iterates_and_rewinds() {
        let mut reader = StringReader::new("one\ntwo\n");
        assert_eq!(reader.next_line().unwrap().as_deref(), Some("one"));
        assert_eq!(reader.next_line().unwrap().as_deref(), Some("two"));
        assert_eq!(reader.next_line().unwrap(), None);
        reader.rewind().unwrap();
        assert_eq!(reader.next_line().unwrap().as_deref(), Some("one"));
    }

    #[test]
    fn block_reader_crosses_sector_boundaries() {
        // One long line of 'a's straddling the first sector boundary.
        let mut text = String::new();
        for _ in 0..60 {
            text.push_str("12345678\n");
        }
        let mut reader = BlockReader::new(MemDevice::from_text(&text));
        let mut count = 0;
        while let Some(line) = reader.next_line().unwrap() {
            assert_eq!(line, "12345678");
            count += 1;
        }
        assert_eq!(count, 60);
    }

    #[test]
    fn block_reader_rewinds_to_sector_zero() {
        let mut reader = BlockReader::new(MemDevice::from_text("alpha\nbeta\n"));
        assert_eq!(reader.next_line().unwrap().as_deref(), Some("alpha"));
        reader.rewind().unwrap();
        assert_eq!(reader.next_line().unwrap().as_deref(), Some("alpha"));
        assert_eq!(reader.next_line().unwrap().as_deref(), Some("beta"));
        assert_eq!(reader.next_line().unwrap(), None);
    }

    #[test]
    fn block_reader_overflows_on_long_line() {
        let long = "a".repeat(300);
        let mut reader =
            BlockReader::with_capacity(MemDevice::from_text(&long), DEFAULT_LINE_BUFFER);
        assert!(matches!(
            reader.next_line(),
            Err(ReadError::BufferOverflow(DEFAULT_LINE_BUFFER))
        ));
    }

    #[test]
    fn block_reader_stops_at_nul() {
        let mut reader = BlockReader::new(MemDevice::from_text("live\n"));
        assert_eq!(reader.next_line().unwrap().as_deref(), Some("live"));
        // The padding after the text is NUL; the stream ends there.
        assert_eq!(reader.next_line().unwrap(), None);
    }
}
