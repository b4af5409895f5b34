use std::{
    fs::File,
    io::{BufRead, Read, Write},
};

use tracing::{debug, warn};

use crate::{
    channel::StreamingChannel,
    error::Result,
    progress::{self, format_size, PROGRESS_BAR_WIDTH},
    source::SourceStream,
    sym::{ModulationScheme, EXAMPLE_BYTE},
    tx::{CancelToken, Transmitter},
};

const SEPARATOR: &str = "-----------------------------------------------";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Example(ModulationScheme),
    Test(ModulationScheme),
    Send(ModulationScheme),
    Shutdown,
}

impl Mode {
    /// Maps a menu number to its mode.
    pub fn from_selection(n: u32) -> Option<Self> {
        use ModulationScheme::*;

        Some(match n {
            1 => Mode::Example(Qpsk),
            2 => Mode::Test(Qpsk),
            3 => Mode::Send(Qpsk),
            4 => Mode::Example(SixteenQam),
            5 => Mode::Test(SixteenQam),
            6 => Mode::Send(SixteenQam),
            7 => Mode::Shutdown,
            _ => return None,
        })
    }
}

/// Text menu driving the transmitter.
pub struct Console<I, O> {
    input: I,
    out: O,
    cancel: CancelToken,
}

impl<I: BufRead, O: Write> Console<I, O> {
    pub fn new(input: I, out: O, cancel: CancelToken) -> Self {
        Self { input, out, cancel }
    }

    /// Serves the menu until shutdown is chosen or input ends.
    pub fn run<C: StreamingChannel>(&mut self, channel: &mut C) -> Result<()> {
        loop {
            self.print_menu()?;

            let mode = match self.read_line()? {
                None => return Ok(()),
                Some(line) => line.parse().ok().and_then(Mode::from_selection),
            };

            let Some(mode) = mode else {
                writeln!(self.out, "Invalid selection, please try again.")?;
                continue;
            };

            writeln!(self.out, "\n{SEPARATOR}")?;
            debug!(?mode, "mode selected");

            // An interrupt at the menu or prompt belongs to no mode.
            self.cancel.reset();

            match mode {
                Mode::Example(scheme) => self.example(scheme)?,
                Mode::Test(scheme) => self.test(channel, scheme)?,
                Mode::Send(scheme) => {
                    if let Some(source) = self.prompt_source()? {
                        self.cancel.reset();
                        self.send(channel, scheme, source)?;
                    }
                }
                Mode::Shutdown => return Ok(()),
            }

            self.cancel.reset();
            writeln!(self.out, "\n{SEPARATOR}")?;
        }
    }

    /// Shows how the bits of [`EXAMPLE_BYTE`] become symbols.
    pub fn example(&mut self, scheme: ModulationScheme) -> Result<()> {
        let width = scheme.bits_per_symbol();
        let what = if width == 2 { "bit pair" } else { "four bits" };

        writeln!(
            self.out,
            "\n{scheme} example using a data byte = {EXAMPLE_BYTE:08b}.\n"
        )?;
        writeln!(
            self.out,
            "In {scheme}, {width} bits are scanned at a time, and assigned one\n\
             of {} I and Q pairs based on their value. Each I and Q pair\n\
             represents a phase-shifted signal.\n",
            scheme.table().len()
        )?;

        for (n, (group, iq)) in scheme.constellation_example().into_iter().enumerate() {
            writeln!(
                self.out,
                "{} {what} = {} -> i = {}, q = {}",
                ordinal(n + 1),
                scheme.format_group(group),
                iq.re,
                iq.im
            )?;
        }

        Ok(())
    }

    /// Cycles the constellation until cancelled.
    pub fn test<C: StreamingChannel>(
        &mut self,
        channel: &mut C,
        scheme: ModulationScheme,
    ) -> Result<()> {
        writeln!(
            self.out,
            "\nBeginning {scheme} transmission test, press ctrl+c to stop.\n\
             This test will cycle between sending the {} {scheme} signals\n\
             and is meant to be viewed on a vector analyzer for testing.\n",
            scheme.table().len()
        )?;

        let out = &mut self.out;

        Transmitter::new(channel, self.cancel.clone()).cycle_test(scheme, |group| {
            if write!(out, "Transmitting {}\r", scheme.format_group(group))
                .and_then(|_| out.flush())
                .is_err()
            {
                warn!("console output failed");
            }
        })?;

        writeln!(self.out)?;

        Ok(())
    }

    /// Transmits `source`, drawing a progress bar as frames go out.
    pub fn send<C: StreamingChannel, R: Read>(
        &mut self,
        channel: &mut C,
        scheme: ModulationScheme,
        source: SourceStream<R>,
    ) -> Result<()> {
        writeln!(
            self.out,
            "\nBeginning {scheme} transmission, press ctrl+c to stop\n"
        )?;

        match source.total_len() {
            Some(len) => writeln!(self.out, "File size is {}. Transmitting...", format_size(len))?,
            None => writeln!(self.out, "Transmitting...")?,
        }

        let out = &mut self.out;
        let state =
            Transmitter::new(channel, self.cancel.clone()).send(scheme, source, |state| {
                if write!(out, "{}\r", progress::render(state, PROGRESS_BAR_WIDTH))
                    .and_then(|_| out.flush())
                    .is_err()
                {
                    warn!("console output failed");
                }
            })?;

        writeln!(self.out)?;

        if state.cancelled {
            writeln!(self.out, "Transmission stopped after {} frames.", state.frames)?;
        } else {
            writeln!(self.out, "Transmission complete, {} frames sent.", state.frames)?;
        }

        Ok(())
    }

    /// Asks for a file until one opens. `None` when the operator types
    /// `exit` or input ends.
    fn prompt_source(&mut self) -> Result<Option<SourceStream<File>>> {
        loop {
            writeln!(
                self.out,
                "\nPlease enter the full path to a file that you want to transmit.\n\
                 If you want to exit back to operation menu, type 'exit'.\n"
            )?;

            let path = match self.read_line()? {
                None => return Ok(None),
                Some(p) if p == "exit" => return Ok(None),
                Some(p) => p,
            };

            match SourceStream::open(&path) {
                Ok(source) => return Ok(Some(source)),
                Err(e) => {
                    debug!("could not open {path}: {e}");
                    writeln!(
                        self.out,
                        "\nNo valid file exists at the provided path. Please try again."
                    )?;
                }
            }
        }
    }

    fn print_menu(&mut self) -> Result<()> {
        writeln!(
            self.out,
            "\nTransmitter operation menu.\n\n\
             Please enter a number to select transmitter mode:\n  \
             1 - QPSK example\n  \
             2 - QPSK transmission test\n  \
             3 - QPSK transmission of data\n  \
             4 - 16QAM example\n  \
             5 - 16QAM transmission test\n  \
             6 - 16QAM transmission of data\n  \
             7 - Shutdown transmitter\n"
        )?;
        self.out.flush()?;

        Ok(())
    }

    /// Next trimmed line of input, `None` at end of input.
    fn read_line(&mut self) -> Result<Option<String>> {
        let mut line = String::new();

        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }

        Ok(Some(line.trim().to_string()))
    }
}

fn ordinal(n: usize) -> String {
    let suffix = match (n % 10, n % 100) {
        (1, 11) | (2, 12) | (3, 13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };

    format!("{n}{suffix}")
}
