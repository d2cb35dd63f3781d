//! Low-rate snapshots of the string shape for a display running on another
//! thread.
//!
//! The render side and the observer exchange a fixed pool of preallocated
//! frames over two single-producer/single-consumer rings: filled frames go to
//! the observer, consumed frames come back for reuse. Neither side locks, and
//! the render side never allocates once the pool exists.

use rtrb::{Consumer, Producer, RingBuffer};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Frames in flight per voice. Both rings have exactly this capacity, so a
/// push can never find its ring full.
const FRAME_POOL_SIZE: usize = 4;

/// One captured string shape.
#[derive(Debug, Clone, Default)]
pub struct StringFrame {
    note_id: u64,
    register: usize,
    fret: i32,
    displacement: Vec<f32>,
}

impl StringFrame {
    fn with_capacity(points: usize) -> Self {
        Self {
            displacement: Vec::with_capacity(points),
            ..Default::default()
        }
    }

    pub fn register(&self) -> usize {
        self.register
    }

    pub fn fret(&self) -> i32 {
        self.fret
    }

    pub fn displacement(&self) -> &[f32] {
        &self.displacement
    }
}

/// Render-side half: captures every `interval` samples.
pub struct VisualizationSampler {
    interval: usize,
    countdown: usize,
    note_id: u64,
    register: Option<usize>,
    fret: Option<i32>,
    latest: Vec<f32>,
    live_note: Arc<AtomicU64>,
    frames: Producer<StringFrame>,
    recycled: Consumer<StringFrame>,
}

/// Observer half, typically polled by a UI at display rate.
pub struct VisualObserver {
    live_note: Arc<AtomicU64>,
    frames: Consumer<StringFrame>,
    recycled: Producer<StringFrame>,
    latest: Option<StringFrame>,
}

/// Creates a connected sampler/observer pair whose frames hold up to
/// `max_points` displacement values without reallocating.
pub fn channel(interval: usize, max_points: usize) -> (VisualizationSampler, VisualObserver) {
    let (frame_tx, frame_rx) = RingBuffer::new(FRAME_POOL_SIZE);
    let (mut recycle_tx, recycle_rx) = RingBuffer::new(FRAME_POOL_SIZE);
    for _ in 0..FRAME_POOL_SIZE {
        let _ = recycle_tx.push(StringFrame::with_capacity(max_points));
    }
    let live_note = Arc::new(AtomicU64::new(0));

    let sampler = VisualizationSampler {
        interval: interval.max(1),
        countdown: 0,
        note_id: 0,
        register: None,
        fret: None,
        latest: Vec::with_capacity(max_points),
        live_note: live_note.clone(),
        frames: frame_tx,
        recycled: recycle_rx,
    };
    let observer = VisualObserver {
        live_note,
        frames: frame_rx,
        recycled: recycle_tx,
        latest: None,
    };
    (sampler, observer)
}

impl VisualizationSampler {
    pub fn reserve(&mut self, max_points: usize) {
        self.latest
            .reserve(max_points.saturating_sub(self.latest.len()));
    }

    /// Starts publishing for a new note.
    pub fn begin(&mut self, register: usize, fret: i32) {
        self.note_id += 1;
        self.register = Some(register);
        self.fret = Some(fret);
        self.countdown = 0;
        self.latest.clear();
        self.live_note.store(self.note_id, Ordering::Release);
    }

    /// Called once per rendered sample with the current string shape.
    pub fn tick(&mut self, displacement: &[f32]) {
        if self.countdown == 0 {
            self.capture(displacement);
            self.countdown = self.interval;
        }
        self.countdown -= 1;
    }

    fn capture(&mut self, displacement: &[f32]) {
        self.latest.clear();
        self.latest.extend_from_slice(displacement);

        // An empty recycle ring means the observer is holding every frame;
        // skip publishing rather than allocate.
        if let Ok(mut frame) = self.recycled.pop() {
            frame.note_id = self.note_id;
            frame.register = self.register.unwrap_or_default();
            frame.fret = self.fret.unwrap_or_default();
            frame.displacement.clear();
            frame.displacement.extend_from_slice(displacement);
            let _ = self.frames.push(frame);
        }
    }

    /// Withdraws the published shape when the voice goes idle.
    pub fn clear(&mut self) {
        self.register = None;
        self.fret = None;
        self.latest.clear();
        self.live_note.store(0, Ordering::Release);
    }

    /// Most recent capture for this note, empty when idle.
    pub fn snapshot(&self) -> &[f32] {
        &self.latest
    }

    pub fn register(&self) -> Option<usize> {
        self.register
    }

    pub fn fret(&self) -> Option<i32> {
        self.fret
    }
}

impl VisualObserver {
    /// Returns the newest frame of the note currently sounding, or `None`
    /// when the voice is idle.
    pub fn snapshot(&mut self) -> Option<&StringFrame> {
        while let Ok(frame) = self.frames.pop() {
            if let Some(stale) = self.latest.replace(frame) {
                let _ = self.recycled.push(stale);
            }
        }

        let live = self.live_note.load(Ordering::Acquire);
        self.latest
            .as_ref()
            .filter(|frame| live != 0 && frame.note_id == live)
    }
}
