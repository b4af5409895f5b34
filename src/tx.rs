use std::{
    io::Read,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use tracing::{debug, info};

use crate::{
    channel::StreamingChannel,
    error::Result,
    frame::{FrameEncoder, FrameFill},
    source::SourceStream,
    sym::ModulationScheme,
};

/// Cooperative stop request, shared with the Ctrl+C handler.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Re-arms the token once the operation it stopped has wound down.
    pub fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransmissionState {
    pub bytes_transmitted: u64,
    /// `None` when the source length could not be determined.
    pub total_bytes: Option<u64>,
    pub frames: u64,
    pub complete: bool,
    pub cancelled: bool,
}

impl TransmissionState {
    fn new(total_bytes: Option<u64>) -> Self {
        Self {
            bytes_transmitted: 0,
            total_bytes,
            frames: 0,
            complete: false,
            cancelled: false,
        }
    }
}

#[derive(Debug)]
enum Stage {
    Idle,
    Framing,
    Pushing(FrameFill),
    Complete,
    Cancelled,
}

/// Drives frames from a source through a streaming channel.
pub struct Transmitter<'a, C: StreamingChannel> {
    channel: &'a mut C,
    cancel: CancelToken,
}

impl<'a, C: StreamingChannel> Transmitter<'a, C> {
    pub fn new(channel: &'a mut C, cancel: CancelToken) -> Self {
        Self { channel, cancel }
    }

    /// Transmits `source` in full, one frame per channel buffer.
    ///
    /// The cancel token is checked before each frame is built, never during
    /// a push. `progress` is called after every successful push. The source
    /// is closed before this returns, whatever the outcome.
    pub fn send<R: Read>(
        &mut self,
        scheme: ModulationScheme,
        mut source: SourceStream<R>,
        mut progress: impl FnMut(&TransmissionState),
    ) -> Result<TransmissionState> {
        let mut encoder = FrameEncoder::new(scheme, self.channel.capacity())?;
        let mut buf = self.channel.allocate_buffer();
        let mut state = TransmissionState::new(source.total_len());

        match state.total_bytes {
            Some(total) => info!(
                "{scheme} transmission of {total} bytes in {} frames",
                encoder.frames_for(total)
            ),
            None => info!("{scheme} transmission of unknown length"),
        }

        let mut stage = Stage::Idle;

        loop {
            stage = match stage {
                Stage::Idle => {
                    if source.is_exhausted()? {
                        Stage::Complete
                    } else {
                        Stage::Framing
                    }
                }
                Stage::Framing => {
                    if self.cancel.is_cancelled() {
                        Stage::Cancelled
                    } else {
                        Stage::Pushing(encoder.build_frame(&mut source, &mut buf)?)
                    }
                }
                Stage::Pushing(fill) => {
                    let n = self.channel.push(&buf)?;

                    state.frames += 1;
                    state.bytes_transmitted += fill.bytes_consumed as u64;
                    debug!(
                        frame = state.frames,
                        pushed = n,
                        payload = fill.bytes_consumed,
                        "frame sent"
                    );
                    progress(&state);

                    if fill.payload_exhausted {
                        Stage::Complete
                    } else {
                        Stage::Framing
                    }
                }
                Stage::Complete => {
                    state.complete = true;
                    info!(
                        "transmission complete, {} bytes in {} frames",
                        state.bytes_transmitted, state.frames
                    );
                    break;
                }
                Stage::Cancelled => {
                    state.cancelled = true;
                    info!(
                        "transmission cancelled after {} bytes",
                        state.bytes_transmitted
                    );
                    break;
                }
            };
        }

        Ok(state)
    }

    /// Cycles through every constellation point, filling a whole buffer
    /// with one point per push, until cancelled. Returns the number of
    /// buffers pushed.
    pub fn cycle_test(
        &mut self,
        scheme: ModulationScheme,
        mut on_symbol: impl FnMut(u8),
    ) -> Result<u64> {
        let mut buf = self.channel.allocate_buffer();
        let mut pushed = 0;

        for group in scheme.bit_groups().cycle() {
            if self.cancel.is_cancelled() {
                break;
            }

            on_symbol(group);
            buf.fill(scheme.lookup(group));
            self.channel.push(&buf)?;
            pushed += 1;
        }

        info!("{scheme} test stopped after {pushed} buffers");

        Ok(pushed)
    }
}
