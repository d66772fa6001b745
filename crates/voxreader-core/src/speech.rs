//! The priority speech scheduler: two lanes, preemption, deferral.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::tokens::OutputToken;

/// The synthesizer interface the scheduler drives.
///
/// Completion is reported by calling `SpeechScheduler::utterance_finished`
/// when the device finishes an utterance. Implementations must report
/// completion asynchronously (from their own thread or a later main-loop
/// turn), never from inside `speak`/`stop`.
pub trait TtsDevice: Send {
    fn speak(&mut self, text: &str);
    /// Stop whatever is playing, immediately. Idempotent.
    fn stop(&mut self);
}

#[derive(Default)]
struct State {
    /// Queued announcement texts not yet at the device.
    announcements: VecDeque<String>,
    /// An announcement utterance is at the device.
    announcement_active: bool,
    /// Unspoken remainder of the active readout batch.
    current: VecDeque<String>,
    /// Readout batch deferred behind announcements. Holds at most one batch:
    /// a later submission replaces an earlier one wholesale.
    pending: Option<Vec<String>>,
    /// The device is speaking an utterance.
    speaking: bool,
}

enum DeviceOp {
    Stop,
    Speak(String),
}

/// Serializes utterances onto one synthesizer with two priority lanes.
///
/// Announcements (high priority) play in arrival order and preempt readouts.
/// Readouts (low priority) arrive as whole batches; a batch submitted while
/// an announcement is active is deferred, not dropped, and a later batch
/// replaces an earlier one. Within a batch, utterances are strictly FIFO.
///
/// Cloning yields another handle to the same queue. Device calls are made
/// after the internal lock is released, so a device may share state with
/// other threads freely.
#[derive(Clone)]
pub struct SpeechScheduler {
    state: Arc<Mutex<State>>,
    device: Arc<Mutex<Box<dyn TtsDevice>>>,
}

impl SpeechScheduler {
    pub fn new(device: Box<dyn TtsDevice>) -> Self {
        SpeechScheduler {
            state: Arc::new(Mutex::new(State::default())),
            device: Arc::new(Mutex::new(device)),
        }
    }

    /// High-priority lane. If no announcement is active, stops any current
    /// speech and speaks immediately; otherwise queues behind the active one.
    pub fn announce(&self, text: impl Into<String>) {
        let text = text.into();
        let ops = {
            let mut st = self.state.lock().unwrap();
            if st.announcement_active {
                st.announcements.push_back(text);
                Vec::new()
            } else {
                // Preempt the readout lane. Its unspoken remainder is kept
                // for after the announcements, unless a newer batch is
                // already waiting.
                if st.pending.is_none() && (st.speaking || !st.current.is_empty()) {
                    let remainder: Vec<String> = st.current.drain(..).collect();
                    st.pending = Some(remainder);
                } else {
                    st.current.clear();
                }
                st.announcement_active = true;
                st.speaking = true;
                vec![DeviceOp::Stop, DeviceOp::Speak(text)]
            }
        };
        self.apply(ops);
    }

    /// Semantic entry point: render a token list and submit it as a readout
    /// batch. Silent control tokens and empty renderings are dropped here.
    pub fn convey(&self, tokens: &[OutputToken]) {
        let utterances: Vec<String> = tokens
            .iter()
            .filter_map(OutputToken::render)
            .filter(|s| !s.is_empty())
            .collect();
        self.submit(utterances);
    }

    /// A scoped readout batch. Consumed by `UtteranceBatch::flush`; the move
    /// makes reuse a compile error.
    pub fn make_queue(&self) -> UtteranceBatch {
        UtteranceBatch { scheduler: self.clone(), items: Vec::new() }
    }

    /// Clear both lanes and stop the synthesizer immediately.
    pub fn interrupt(&self) {
        {
            let mut st = self.state.lock().unwrap();
            st.announcements.clear();
            st.announcement_active = false;
            st.current.clear();
            st.pending = None;
            st.speaking = false;
        }
        self.apply(vec![DeviceOp::Stop]);
    }

    /// Called when the device finishes an utterance: drain the announcement
    /// list first; once it runs dry, release any deferred readout batch.
    pub fn utterance_finished(&self) {
        let ops = {
            let mut st = self.state.lock().unwrap();
            if st.announcement_active {
                if let Some(next) = st.announcements.pop_front() {
                    st.speaking = true;
                    vec![DeviceOp::Speak(next)]
                } else {
                    st.announcement_active = false;
                    st.take_pending_op()
                }
            } else if let Some(next) = st.current.pop_front() {
                st.speaking = true;
                vec![DeviceOp::Speak(next)]
            } else {
                st.speaking = false;
                Vec::new()
            }
        };
        self.apply(ops);
    }

    pub fn is_idle(&self) -> bool {
        let st = self.state.lock().unwrap();
        !st.speaking
            && !st.announcement_active
            && st.announcements.is_empty()
            && st.current.is_empty()
            && st.pending.is_none()
    }

    fn submit(&self, items: Vec<String>) {
        let ops = {
            let mut st = self.state.lock().unwrap();
            if st.announcement_active || !st.announcements.is_empty() {
                st.pending = Some(items);
                Vec::new()
            } else {
                st.current = VecDeque::from(items);
                let mut ops = vec![DeviceOp::Stop];
                if let Some(first) = st.current.pop_front() {
                    st.speaking = true;
                    ops.push(DeviceOp::Speak(first));
                } else {
                    st.speaking = false;
                }
                ops
            }
        };
        self.apply(ops);
    }

    fn apply(&self, ops: Vec<DeviceOp>) {
        if ops.is_empty() {
            return;
        }
        let mut device = self.device.lock().unwrap();
        for op in ops {
            match op {
                DeviceOp::Stop => device.stop(),
                DeviceOp::Speak(text) => device.speak(&text),
            }
        }
    }
}

impl State {
    fn take_pending_op(&mut self) -> Vec<DeviceOp> {
        if let Some(batch) = self.pending.take() {
            self.current = VecDeque::from(batch);
        }
        if let Some(first) = self.current.pop_front() {
            self.speaking = true;
            vec![DeviceOp::Speak(first)]
        } else {
            self.speaking = false;
            Vec::new()
        }
    }
}

/// A readout batch under construction. Obtained from
/// [`SpeechScheduler::make_queue`]; committing consumes it.
pub struct UtteranceBatch {
    scheduler: SpeechScheduler,
    items: Vec<String>,
}

impl UtteranceBatch {
    pub fn push(&mut self, text: impl Into<String>) {
        self.items.push(text.into());
    }

    /// Stop the synthesizer and speak each queued item as a separate
    /// utterance, in order (deferred if announcements are active).
    pub fn flush(self) {
        let UtteranceBatch { scheduler, items } = self;
        scheduler.submit(items);
    }
}
