use std::{
    fs::File,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use futuresdr::num_complex::Complex;
use tracing::{info, warn};

use crate::{
    error::{Error, Result},
    sym::{Iq, BYTES_PER_SYMBOL},
};

/// Symbols per hardware buffer on the reference board.
pub const BUFFER_SYMBOLS: usize = 65536;

/// Where filled buffers go to be transmitted.
///
/// A channel is released when it is dropped.
pub trait StreamingChannel {
    /// Symbols per buffer, fixed when the channel was opened.
    fn capacity(&self) -> usize;

    fn allocate_buffer(&self) -> Vec<Iq> {
        vec![Complex::new(0, 0); self.capacity()]
    }

    /// Transmits one full buffer and returns the number of bytes written.
    fn push(&mut self, buf: &[Iq]) -> Result<usize>;
}

/// Writes every pushed buffer to a file as interleaved little-endian i16
/// (CS16), for bench work without a board.
pub struct CaptureChannel {
    out: BufWriter<File>,
    path: PathBuf,
    capacity: usize,
    pushed: u64,
}

impl CaptureChannel {
    pub fn create(path: impl AsRef<Path>, capacity: usize) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::create(&path).map_err(|e| Error::config("capture file", e))?;

        info!("capturing I/Q to {}", path.display());

        Ok(Self {
            out: BufWriter::new(file),
            path,
            capacity,
            pushed: 0,
        })
    }
}

impl StreamingChannel for CaptureChannel {
    fn capacity(&self) -> usize {
        self.capacity
    }

    fn push(&mut self, buf: &[Iq]) -> Result<usize> {
        assert_eq!(buf.len(), self.capacity);

        for s in buf {
            self.out
                .write_all(&s.re.to_le_bytes())
                .and_then(|_| self.out.write_all(&s.im.to_le_bytes()))
                .map_err(|e| Error::Push(e.to_string()))?;
        }

        self.pushed += 1;

        Ok(buf.len() * BYTES_PER_SYMBOL)
    }
}

impl Drop for CaptureChannel {
    fn drop(&mut self) {
        if let Err(e) = self.out.flush() {
            warn!("could not flush {}: {e}", self.path.display());
        }

        info!(
            "capture closed, {} buffers in {}",
            self.pushed,
            self.path.display()
        );
    }
}
