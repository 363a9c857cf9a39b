//! Melody tables for `playTune`.

use std::time::Duration;

use crate::scheduler::{Scheduler, TaskId};

/// One note of a melody.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Note {
    pub name: &'static str,
    /// Hz.
    pub frequency: f64,
    /// Beats, where one beat is [`BEAT`].
    pub beats: f64,
}

/// Length of one beat.
pub const BEAT: Duration = Duration::from_secs(1);

const fn note(name: &'static str, frequency: f64, beats: f64) -> Note {
    Note {
        name,
        frequency,
        beats,
    }
}

const C4: f64 = 261.63;
const E4: f64 = 329.63;
const G4: f64 = 392.00;
const C5: f64 = 523.25;
const G3: f64 = 196.00;
const B3: f64 = 246.94;
const D4: f64 = 293.66;
const FS4: f64 = 369.99;

pub const HAPPY: &[Note] = &[
    note("C4", C4, 0.5),
    note("E4", E4, 0.5),
    note("G4", G4, 0.5),
    note("C5", C5, 1.0),
];

pub const MYSTERY: &[Note] = &[
    note("G3", G3, 0.5),
    note("B3", B3, 0.5),
    note("D4", D4, 0.5),
    note("F#4", FS4, 1.0),
];

pub const VICTORY: &[Note] = &[
    note("C4", C4, 0.25),
    note("E4", E4, 0.25),
    note("G4", G4, 0.25),
    note("C5", C5, 0.5),
    note("G4", G4, 0.25),
    note("C5", C5, 1.0),
];

/// Notes for a `create_melody` option value.
pub fn melody(tune_id: &str) -> Option<&'static [Note]> {
    match tune_id {
        "HAPPY" => Some(HAPPY),
        "MYSTERY" => Some(MYSTERY),
        "VICTORY" => Some(VICTORY),
        _ => None,
    }
}

/// Total length of a melody.
pub fn duration(notes: &[Note]) -> Duration {
    notes.iter().map(|n| BEAT.mul_f64(n.beats)).sum()
}

/// Each note paired with its delay after the note before it, so every
/// note starts when the previous one ends.
pub fn steps(notes: &[Note]) -> Vec<(Duration, Note)> {
    let mut previous = Duration::ZERO;
    notes
        .iter()
        .map(|&n| {
            let delay = previous;
            previous = BEAT.mul_f64(n.beats);
            (delay, n)
        })
        .collect()
}

/// Schedule a melody through [`steps`].
///
/// Returns `None` for an unknown tune; nothing is scheduled.
pub fn schedule_tune(scheduler: &mut Scheduler<Note>, tune_id: &str) -> Option<TaskId> {
    let notes = melody(tune_id)?;
    Some(scheduler.schedule(steps(notes)))
}
