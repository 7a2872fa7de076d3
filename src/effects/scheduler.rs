//! Frame-driven playback of sequences
//!
//! The host calls [`Scheduler::tick`] once per frame. Everything runs on the
//! calling thread; shared state is `Rc`/`RefCell` and nothing here is `Send`.

use log::{debug, warn};
use std::cell::{Cell, RefCell};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, Waker};
use std::time::Duration;

use super::animations::Sequence;

/// A sequence that has been handed to the scheduler.
struct Playback {
    sequence: RefCell<Sequence>,
    complete: Cell<bool>,
    waiters: RefCell<Vec<Box<dyn FnOnce()>>>,
    waker: RefCell<Option<Waker>>,
}

impl Playback {
    fn new(sequence: Sequence) -> Self {
        Self {
            sequence: RefCell::new(sequence),
            complete: Cell::new(false),
            waiters: RefCell::new(Vec::new()),
            waker: RefCell::new(None),
        }
    }

    /// Advance by `dt` seconds (`f32::INFINITY` fast-forwards). Returns true
    /// once the sequence has completed.
    fn advance(&self, dt: f32) -> bool {
        if self.complete.get() {
            return true;
        }

        let done = match self.sequence.try_borrow_mut() {
            Ok(mut sequence) => {
                if dt.is_infinite() {
                    sequence.complete();
                } else {
                    sequence.advance(dt);
                }
                sequence.is_complete()
            }
            Err(_) => {
                // Completion requested from inside one of this sequence's own hooks
                warn!("Ignoring re-entrant advance of a running transition");
                false
            }
        };

        if done {
            self.finish();
        }
        done
    }

    fn finish(&self) {
        if self.complete.replace(true) {
            return;
        }

        let waiters = std::mem::take(&mut *self.waiters.borrow_mut());
        for waiter in waiters {
            waiter();
        }
        if let Some(waker) = self.waker.borrow_mut().take() {
            waker.wake();
        }
    }
}

/// Handle to a playing (or finished) transition.
///
/// Cloning yields another handle to the same transition. Awaiting a handle
/// resolves once the transition has completed; something must keep ticking
/// the scheduler meanwhile.
#[derive(Clone)]
pub struct TransitionHandle {
    playback: Rc<Playback>,
}

impl TransitionHandle {
    /// A handle that is already complete. Used for no-op transitions.
    pub fn completed() -> Self {
        let playback = Playback::new(Sequence::new());
        playback.advance(0.0);
        Self {
            playback: Rc::new(playback),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.playback.complete.get()
    }

    /// Fast-forward to the end state, firing every remaining hook now.
    pub fn complete(&self) {
        self.playback.advance(f32::INFINITY);
    }

    /// Run `f` once the transition completes (immediately if it already has).
    pub fn on_complete(&self, f: impl FnOnce() + 'static) {
        if self.is_complete() {
            f();
        } else {
            self.playback.waiters.borrow_mut().push(Box::new(f));
        }
    }

    /// Total length of the underlying timeline.
    pub fn duration(&self) -> Duration {
        match self.playback.sequence.try_borrow() {
            Ok(sequence) => sequence.duration(),
            Err(_) => Duration::ZERO,
        }
    }

    /// Whether both handles refer to the same transition.
    pub fn same_as(&self, other: &TransitionHandle) -> bool {
        Rc::ptr_eq(&self.playback, &other.playback)
    }
}

impl fmt::Debug for TransitionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransitionHandle")
            .field("complete", &self.is_complete())
            .finish()
    }
}

impl Future for TransitionHandle {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if self.is_complete() {
            Poll::Ready(())
        } else {
            *self.playback.waker.borrow_mut() = Some(cx.waker().clone());
            Poll::Pending
        }
    }
}

struct SchedulerState {
    active: Vec<Rc<Playback>>,
    time_scale: f32,
    paused: bool,
}

impl Default for SchedulerState {
    fn default() -> Self {
        Self {
            active: Vec::new(),
            time_scale: 1.0,
            paused: false,
        }
    }
}

/// Plays sequences against a frame clock. Clones share the same queue.
#[derive(Clone, Default)]
pub struct Scheduler {
    state: Rc<RefCell<SchedulerState>>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start playing `sequence`.
    ///
    /// The sequence is advanced by zero time before this returns, so its
    /// start hooks have already run. A zero-length sequence comes back
    /// complete.
    pub fn play(&self, sequence: Sequence) -> TransitionHandle {
        let playback = Rc::new(Playback::new(sequence));
        if !playback.advance(0.0) {
            self.state.borrow_mut().active.push(playback.clone());
        }
        TransitionHandle { playback }
    }

    /// Run `f` after `delay` of scheduler time.
    pub fn after(&self, delay: Duration, f: impl FnOnce() + 'static) -> TransitionHandle {
        let mut sequence = Sequence::new();
        sequence.append_interval(delay).append_callback(f);
        self.play(sequence)
    }

    /// Advance every playing transition by one frame.
    pub fn tick(&self, dt: Duration) {
        let (playing, scale) = {
            let state = self.state.borrow();
            if state.paused {
                return;
            }
            (state.active.clone(), state.time_scale)
        };

        let dt = dt.as_secs_f32() * scale;
        for playback in &playing {
            playback.advance(dt);
        }

        self.state
            .borrow_mut()
            .active
            .retain(|playback| !playback.complete.get());
    }

    /// Fast-forward everything currently playing.
    pub fn complete_all(&self) {
        let playing = self.state.borrow().active.clone();
        debug!("Completing {} active transitions", playing.len());
        for playback in &playing {
            playback.advance(f32::INFINITY);
        }
        self.state
            .borrow_mut()
            .active
            .retain(|playback| !playback.complete.get());
    }

    /// Number of transitions still running.
    pub fn active_count(&self) -> usize {
        self.state
            .borrow()
            .active
            .iter()
            .filter(|playback| !playback.complete.get())
            .count()
    }

    pub fn is_idle(&self) -> bool {
        self.active_count() == 0
    }

    pub fn set_paused(&self, paused: bool) {
        self.state.borrow_mut().paused = paused;
    }

    /// Scale applied to every tick's delta time.
    pub fn set_time_scale(&self, scale: f32) {
        self.state.borrow_mut().time_scale = scale.max(0.0);
    }
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("active", &self.active_count())
            .finish()
    }
}
