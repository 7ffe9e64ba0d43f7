//! The stimulus source trait and its four variants.

use crate::error::StimError;
use crate::format::NumFormat;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;
use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::{Path, PathBuf};
use strobe_common::BitVec;

/// A polymorphic producer of stimulus values.
///
/// `next_value` returns `Ok(Some(v))` while values remain, `Ok(None)` once a
/// finite source is exhausted, and `Err` only for fatal conditions (missing
/// stimulus, I/O failure). The owning process decides whether exhaustion is
/// an orderly stop or a fatal demand-after-exhaustion.
pub trait StimulusSource {
    /// Pulls the next value from the source.
    fn next_value(&mut self) -> Result<Option<BitVec>, StimError>;

    /// Takes any warnings accumulated since the last pull.
    ///
    /// The owning process is expected to log these.
    fn take_warnings(&mut self) -> Vec<String> {
        Vec::new()
    }
}

/// Produces the same value on every pull. Never exhausts.
#[derive(Clone, Debug)]
pub struct Static {
    value: BitVec,
}

impl Static {
    /// Creates a source that always produces `value`.
    pub fn new(value: BitVec) -> Self {
        Self { value }
    }
}

impl StimulusSource for Static {
    fn next_value(&mut self) -> Result<Option<BitVec>, StimError> {
        Ok(Some(self.value.clone()))
    }
}

/// Produces each value of an ordered list once, then exhausts.
#[derive(Clone, Debug)]
pub struct Sequential {
    values: VecDeque<BitVec>,
}

impl Sequential {
    /// Creates a source producing `values` in order.
    pub fn new(values: impl IntoIterator<Item = BitVec>) -> Self {
        Self {
            values: values.into_iter().collect(),
        }
    }
}

impl StimulusSource for Sequential {
    fn next_value(&mut self) -> Result<Option<BitVec>, StimError> {
        Ok(self.values.pop_front())
    }
}

/// An infinite deterministic pseudo-random stream.
///
/// Identical seed and width produce an identical, bit-for-bit reproducible
/// sequence; the generator state is private to the source, so two sources
/// with the same seed never interfere.
pub struct RandomSeeded {
    rng: StdRng,
    width: u32,
}

impl RandomSeeded {
    /// Creates a source of `width`-bit values from the given seed.
    pub fn new(seed: u64, width: u32) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            width,
        }
    }
}

impl StimulusSource for RandomSeeded {
    fn next_value(&mut self) -> Result<Option<BitVec>, StimError> {
        let words: Vec<u64> = (0..self.width.div_ceil(64))
            .map(|_| self.rng.gen())
            .collect();
        Ok(Some(BitVec::from_words(&words, self.width)))
    }
}

/// Produces values parsed lazily from a record file.
///
/// The file contains whitespace- or newline-delimited tokens, each parsed
/// under one configured [`NumFormat`]; file order is pull order. Malformed
/// tokens are skipped and surfaced through
/// [`take_warnings`](StimulusSource::take_warnings). Exhaustion after at
/// least one valid record is `Ok(None)`; a demand against a file that never
/// yielded a valid record is [`StimError::NoStimulus`]. The file handle is
/// owned by the source, so it closes when the owning process drops it, on
/// every exit path, including fatal termination.
pub struct FileDriven {
    path: PathBuf,
    format: NumFormat,
    width: u32,
    lines: Lines<BufReader<File>>,
    pending: VecDeque<String>,
    produced_any: bool,
    warnings: Vec<String>,
}

impl FileDriven {
    /// Opens the record file at `path` for lazy parsing.
    pub fn open(path: &Path, format: NumFormat, width: u32) -> Result<Self, StimError> {
        let file = File::open(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            format,
            width,
            lines: BufReader::new(file).lines(),
            pending: VecDeque::new(),
            produced_any: false,
            warnings: Vec::new(),
        })
    }

    fn next_token(&mut self) -> Result<Option<String>, StimError> {
        loop {
            if let Some(token) = self.pending.pop_front() {
                return Ok(Some(token));
            }
            match self.lines.next() {
                Some(line) => {
                    let line = line?;
                    self.pending
                        .extend(line.split_whitespace().map(str::to_string));
                }
                None => return Ok(None),
            }
        }
    }
}

impl StimulusSource for FileDriven {
    fn next_value(&mut self) -> Result<Option<BitVec>, StimError> {
        while let Some(token) = self.next_token()? {
            match self.format.parse_token(&token, self.width) {
                Some(value) => {
                    self.produced_any = true;
                    return Ok(Some(value));
                }
                None => {
                    self.warnings.push(format!(
                        "skipping malformed {} record '{}' in {}",
                        self.format,
                        token,
                        self.path.display()
                    ));
                }
            }
        }
        if self.produced_any {
            Ok(None)
        } else {
            Err(StimError::NoStimulus {
                path: self.path.display().to_string(),
            })
        }
    }

    fn take_warnings(&mut self) -> Vec<String> {
        std::mem::take(&mut self.warnings)
    }
}
