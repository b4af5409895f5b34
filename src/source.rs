use std::{
    fs::File,
    io::{self, BufRead, BufReader, ErrorKind, Read},
    path::Path,
};

use tracing::debug;

/// Payload bytes for one transmission.
///
/// The stream is consumed strictly in order and closed when dropped.
pub struct SourceStream<R: Read> {
    reader: BufReader<R>,
    total_len: Option<u64>,
    position: u64,
}

impl SourceStream<File> {
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let file = File::open(path)?;
        let total_len = file
            .metadata()
            .ok()
            .filter(|m| m.is_file())
            .map(|m| m.len());

        Ok(Self::new(file, total_len))
    }
}

impl<R: Read> SourceStream<R> {
    pub fn new(reader: R, total_len: Option<u64>) -> Self {
        Self {
            reader: BufReader::new(reader),
            total_len,
            position: 0,
        }
    }

    pub fn total_len(&self) -> Option<u64> {
        self.total_len
    }

    /// Bytes handed out so far.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Reads until `buf` is full or the source ends. A count below
    /// `buf.len()` means the source is exhausted.
    pub fn read_chunk(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut filled = 0;

        while filled < buf.len() {
            match self.reader.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }

        self.position += filled as u64;

        Ok(filled)
    }

    /// True once no bytes remain. Does not consume anything.
    pub fn is_exhausted(&mut self) -> io::Result<bool> {
        loop {
            match self.reader.fill_buf() {
                Ok(buf) => return Ok(buf.is_empty()),
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }
}

impl<R: Read> Drop for SourceStream<R> {
    fn drop(&mut self) {
        debug!("source closed after {} bytes", self.position);
    }
}

#[cfg(test)]
mod tests {
    use std::io::{self, Cursor, Read};

    use anyhow::Result;

    use super::SourceStream;

    /// Hands out at most `step` bytes per read, like a pipe.
    struct Trickle {
        data: Cursor<Vec<u8>>,
        step: usize,
    }

    impl Read for Trickle {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let n = buf.len().min(self.step);
            self.data.read(&mut buf[..n])
        }
    }

    #[test]
    fn read_chunk_fills_across_short_reads() -> Result<()> {
        let data: Vec<u8> = (0..100).collect();
        let mut src = SourceStream::new(
            Trickle {
                data: Cursor::new(data.clone()),
                step: 7,
            },
            None,
        );

        let mut buf = [0u8; 40];
        assert_eq!(src.read_chunk(&mut buf)?, 40);
        assert_eq!(&buf[..], &data[..40]);

        let mut buf = [0u8; 80];
        assert_eq!(src.read_chunk(&mut buf)?, 60);
        assert_eq!(&buf[..60], &data[40..]);
        assert_eq!(src.position(), 100);

        Ok(())
    }

    #[test]
    fn exhaustion_probe_does_not_consume() -> Result<()> {
        let mut src = SourceStream::new(Cursor::new(vec![1u8, 2, 3]), Some(3));

        assert!(!src.is_exhausted()?);
        assert_eq!(src.position(), 0);

        let mut buf = [0u8; 3];
        assert_eq!(src.read_chunk(&mut buf)?, 3);
        assert_eq!(buf, [1, 2, 3]);
        assert!(src.is_exhausted()?);

        Ok(())
    }

    #[test]
    fn open_reports_length() -> Result<()> {
        let path = std::env::temp_dir().join(format!("qamtx-source-{}", std::process::id()));
        std::fs::write(&path, [0u8; 1234])?;

        let src = SourceStream::open(&path)?;
        assert_eq!(src.total_len(), Some(1234));
        drop(src);

        std::fs::remove_file(&path)?;

        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn device_files_have_unknown_length() -> Result<()> {
        let src = SourceStream::open("/dev/null")?;
        assert_eq!(src.total_len(), None);

        Ok(())
    }

    #[test]
    fn open_missing_file_fails() {
        assert!(SourceStream::open("/nonexistent/qamtx/payload.bin").is_err());
    }
}
