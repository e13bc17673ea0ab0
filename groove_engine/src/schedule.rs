// Deferred note emission.
//
// Comping strums and humanized timing push notes slightly after the tick
// that decided them. Instead of timers, the performer schedules each such
// note here as a task due at an absolute performance time, and drains due
// tasks as the clock advances. Tasks are ordered by `(due_ms, sequence)`;
// `sequence` is a monotonic counter, so tasks due at the same instant play
// in the order they were scheduled.
//
// A task owns a copy of its `NoteEvent`, fixed when it was scheduled. Later
// pattern or voicing changes cannot reach into the queue and alter it; the
// only way to stop a scheduled note is `cancel` with its `TaskHandle`.
//
// See also: `performer.rs`, the only producer.

use crate::output::{NoteEvent, SoundOutput};
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// Identifies a scheduled task for cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskHandle(u64);

#[derive(Debug, Clone)]
struct ScheduledNote {
    due_ms: f64,
    sequence: u64,
    event: NoteEvent,
}

// Min-heap on (due_ms, sequence): BinaryHeap is a max-heap, so reverse.
impl PartialEq for ScheduledNote {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ScheduledNote {}

impl PartialOrd for ScheduledNote {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ScheduledNote {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .due_ms
            .total_cmp(&self.due_ms)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

#[derive(Debug, Clone, Default)]
pub struct NoteScheduler {
    heap: BinaryHeap<ScheduledNote>,
    next_sequence: u64,
}

impl NoteScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `event` to play at `due_ms`.
    pub fn schedule(&mut self, due_ms: f64, event: NoteEvent) -> TaskHandle {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        let due_ms = if due_ms.is_finite() { due_ms } else { 0.0 };
        self.heap.push(ScheduledNote {
            due_ms,
            sequence,
            event,
        });
        TaskHandle(sequence)
    }

    /// Drop a pending task. Returns false if it already played or was
    /// cancelled.
    pub fn cancel(&mut self, handle: TaskHandle) -> bool {
        let before = self.heap.len();
        self.heap.retain(|n| n.sequence != handle.0);
        self.heap.len() != before
    }

    /// Play every task due at or before `now_ms`, earliest first. Returns
    /// how many were played.
    pub fn drain_due(&mut self, now_ms: f64, output: &mut dyn SoundOutput) -> usize {
        let mut played = 0;
        while self.heap.peek().is_some_and(|n| n.due_ms <= now_ms) {
            if let Some(note) = self.heap.pop() {
                output.play(note.due_ms, note.event);
                played += 1;
            }
        }
        played
    }

    /// Play everything still pending, regardless of time.
    pub fn flush(&mut self, output: &mut dyn SoundOutput) -> usize {
        self.drain_due(f64::INFINITY, output)
    }

    pub fn next_due_ms(&self) -> Option<f64> {
        self.heap.peek().map(|n| n.due_ms)
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}
