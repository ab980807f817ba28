//! Hand-off slot between the sampling context and the control tick.
//!
//! The sampling interrupt publishes fresh [`Measurements`] after every
//! cycle while the 5 ms tick reads whatever was published last. The cell
//! holds two sequence-locked banks over plain atomics and the writer
//! alternates between them, so a publish never touches the bank readers
//! are directed to. A reader that preempts an unfinished publish still
//! finds the previous copy complete. Reads are bounded: a reader that is
//! lapped by the writer on every attempt gets `None` and keeps its last
//! consistent values.

use portable_atomic::{AtomicU32, Ordering, fence};

use crate::{ChannelReading, Measurements};

const WORDS: usize = 8;

/// Read attempts before a load gives up on a writer that keeps lapping it.
const LOAD_ATTEMPTS: usize = 4;

#[derive(Debug)]
struct Bank {
    sequence: AtomicU32,
    words: [AtomicU32; WORDS],
}

impl Bank {
    fn new(words: [u32; WORDS]) -> Self {
        Self {
            sequence: AtomicU32::new(0),
            words: words.map(AtomicU32::new),
        }
    }

    fn write(&self, words: [u32; WORDS]) {
        self.sequence.fetch_add(1, Ordering::Relaxed);
        fence(Ordering::Release);
        for (slot, word) in self.words.iter().zip(words) {
            slot.store(word, Ordering::Relaxed);
        }
        self.sequence.fetch_add(1, Ordering::Release);
    }

    fn read(&self) -> Option<[u32; WORDS]> {
        let before = self.sequence.load(Ordering::Acquire);
        if before % 2 != 0 {
            return None;
        }
        let words = self.words.each_ref().map(|w| w.load(Ordering::Relaxed));
        fence(Ordering::Acquire);
        (self.sequence.load(Ordering::Relaxed) == before).then_some(words)
    }
}

/// Single-writer, multi-reader slot holding the latest [`Measurements`].
#[derive(Debug)]
pub struct MeasurementCell {
    generation: AtomicU32,
    even: Bank,
    odd: Bank,
}

impl MeasurementCell {
    /// Creates a cell holding `initial`.
    #[must_use]
    pub fn new(initial: Measurements) -> Self {
        let words = encode(&initial);
        Self {
            generation: AtomicU32::new(0),
            even: Bank::new(words),
            odd: Bank::new(words),
        }
    }

    /// Publishes a new set of values. Only one context may publish.
    pub fn publish(&self, measurements: &Measurements) {
        let next = self.generation.load(Ordering::Relaxed).wrapping_add(1);
        self.bank(next).write(encode(measurements));
        self.generation.store(next, Ordering::Release);
    }

    /// Loads the most recent consistent values.
    ///
    /// Returns `None` if every attempt raced a publish into the same bank,
    /// which takes two publishes within one read.
    #[must_use]
    pub fn load(&self) -> Option<Measurements> {
        for _ in 0..LOAD_ATTEMPTS {
            let generation = self.generation.load(Ordering::Acquire);
            if let Some(words) = self.bank(generation).read() {
                return Some(decode(words));
            }
            core::hint::spin_loop();
        }
        None
    }

    /// Number of publishes so far.
    #[must_use]
    pub fn generation(&self) -> u32 {
        self.generation.load(Ordering::Acquire)
    }

    const fn bank(&self, generation: u32) -> &Bank {
        if generation % 2 == 0 {
            &self.even
        } else {
            &self.odd
        }
    }
}

impl Default for MeasurementCell {
    fn default() -> Self {
        Self::new(Measurements::POWER_UP)
    }
}

fn encode(m: &Measurements) -> [u32; WORDS] {
    [
        m.vin.instant,
        m.vin.average,
        m.iin.instant,
        m.iin.average,
        m.vout.instant,
        m.vout.average,
        m.iout.instant,
        m.iout.average,
    ]
}

fn decode(words: [u32; WORDS]) -> Measurements {
    let [vin_i, vin_a, iin_i, iin_a, vout_i, vout_a, iout_i, iout_a] = words;
    let reading = |instant, average| ChannelReading { instant, average };
    Measurements {
        vin: reading(vin_i, vin_a),
        iin: reading(iin_i, iin_a),
        vout: reading(vout_i, vout_a),
        iout: reading(iout_i, iout_a),
    }
}
