use std::io::Read;

use tracing::trace;

use crate::{
    bits::BitGroups,
    error::{Error, Result},
    source::SourceStream,
    sym::{Iq, ModulationScheme},
};

pub const PREAMBLE: [u8; 18] = [0x33; 18];
pub const SYNC_WORD: [u8; 2] = [0x33, 0xf7];

/// Upper bound on a single read from the payload source.
pub const DATA_BYTES_PER_READ: usize = 64_000;

/// Outcome of filling one buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameFill {
    pub bytes_consumed: usize,
    /// Symbols carrying real payload; everything after them is padding.
    pub payload_symbols: usize,
    pub payload_exhausted: bool,
}

/// Lays out preamble, sync word and payload into fixed-size buffers.
pub struct FrameEncoder {
    scheme: ModulationScheme,
    capacity: usize,
    header: Vec<Iq>,
    chunk: Vec<u8>,
}

impl FrameEncoder {
    pub fn new(scheme: ModulationScheme, capacity: usize) -> Result<Self> {
        Self::with_chunk_size(scheme, capacity, DATA_BYTES_PER_READ)
    }

    pub fn with_chunk_size(
        scheme: ModulationScheme,
        capacity: usize,
        chunk_size: usize,
    ) -> Result<Self> {
        let mut header = Vec::new();
        push_bytes(scheme, &PREAMBLE, &mut header);
        push_bytes(scheme, &SYNC_WORD, &mut header);

        let gpb = scheme.groups_per_byte();

        if capacity < header.len() + gpb {
            return Err(Error::FrameTooSmall {
                capacity,
                header: header.len(),
            });
        }

        let payload_bytes = (capacity - header.len()) / gpb;

        Ok(Self {
            scheme,
            capacity,
            header,
            chunk: vec![0; chunk_size.clamp(1, payload_bytes)],
        })
    }

    pub fn scheme(&self) -> ModulationScheme {
        self.scheme
    }

    /// Symbols per frame.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Preamble plus sync word, in symbols.
    pub fn header_len(&self) -> usize {
        self.header.len()
    }

    /// Whole payload bytes that fit in one frame.
    pub fn payload_bytes_per_frame(&self) -> usize {
        (self.capacity - self.header.len()) / self.scheme.groups_per_byte()
    }

    /// Frames needed to carry `len` payload bytes.
    pub fn frames_for(&self, len: u64) -> u64 {
        len.div_ceil(self.payload_bytes_per_frame() as u64)
    }

    /// Fills `buf` with one frame, pulling payload from `source`.
    ///
    /// The source is read in chunks of at most the configured chunk size. A
    /// chunk that comes back short ends the payload, and so does a source
    /// found empty right after the frame was filled exactly. Slots without
    /// payload are padded with the scheme's zero symbol.
    pub fn build_frame<R: Read>(
        &mut self,
        source: &mut SourceStream<R>,
        buf: &mut [Iq],
    ) -> Result<FrameFill> {
        assert_eq!(buf.len(), self.capacity, "buffer does not match frame size");

        let byte_capacity = self.payload_bytes_per_frame();
        let (header, payload) = buf.split_at_mut(self.header.len());
        header.copy_from_slice(&self.header);

        let mut consumed = 0;
        let mut filled = 0;
        let mut exhausted = false;

        while consumed < byte_capacity {
            let want = (byte_capacity - consumed).min(self.chunk.len());
            let n = source.read_chunk(&mut self.chunk[..want])?;

            filled += modulate(self.scheme, &self.chunk[..n], &mut payload[filled..]);
            consumed += n;

            if n < want {
                exhausted = true;
                break;
            }
        }

        if !exhausted {
            exhausted = source.is_exhausted()?;
        }

        payload[filled..].fill(self.scheme.zero_symbol());

        trace!(
            consumed,
            payload_symbols = filled,
            padding = payload.len() - filled,
            exhausted,
            "frame built"
        );

        Ok(FrameFill {
            bytes_consumed: consumed,
            payload_symbols: filled,
            payload_exhausted: exhausted,
        })
    }
}

fn push_bytes(scheme: ModulationScheme, bytes: &[u8], out: &mut Vec<Iq>) {
    out.extend(BitGroups::new(bytes, scheme.bits_per_symbol()).map(|g| scheme.lookup(g)));
}

/// Writes the symbols for `bytes` to the front of `out`, returning how many.
fn modulate(scheme: ModulationScheme, bytes: &[u8], out: &mut [Iq]) -> usize {
    let groups = BitGroups::new(bytes, scheme.bits_per_symbol());
    let n = groups.len();

    out.iter_mut()
        .zip(groups)
        .for_each(|(o, g)| *o = scheme.lookup(g));

    n
}
