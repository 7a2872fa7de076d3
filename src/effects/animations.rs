//! Tweens and sequences
//!
//! A [`Sequence`] is a timeline of steps. `append` places a step at the end of
//! the timeline, `join` starts it together with the previously placed step,
//! and `append_callback` fires a closure at the current end. Sequences nest:
//! a window's own show motion is a sequence appended into the manager's.
//!
//! Playback is driven externally (see [`super::scheduler`]). Advancing always
//! walks the timeline boundary by boundary, so hooks fire in time order even
//! when a single call jumps straight to the end.

use cgmath::Vector2;
use log::trace;
use std::fmt;
use std::time::Duration;

use super::Ease;
use crate::surface::SharedVisual;

/// Something a tween drives.
pub trait TweenTarget {
    /// Called once when the tween starts; capture the starting value here.
    fn begin(&mut self);

    /// Apply eased progress (0.0 - 1.0).
    fn apply(&mut self, progress: f32);
}

/// A single interpolation over time.
pub struct Tween {
    duration: f32,
    ease: Ease,
    target: Box<dyn TweenTarget>,
    on_start: Option<Box<dyn FnOnce()>>,
}

impl Tween {
    pub fn new(duration: Duration, ease: Ease, target: impl TweenTarget + 'static) -> Self {
        Self {
            duration: duration.as_secs_f32(),
            ease,
            target: Box::new(target),
            on_start: None,
        }
    }

    /// Tween that hands eased progress to a closure.
    pub fn from_fn(duration: Duration, ease: Ease, apply: impl FnMut(f32) + 'static) -> Self {
        Self::new(duration, ease, FnTarget(apply))
    }

    /// Run `f` right before the tween captures its starting value.
    pub fn with_on_start(mut self, f: impl FnOnce() + 'static) -> Self {
        self.on_start = Some(Box::new(f));
        self
    }

    pub fn duration(&self) -> Duration {
        Duration::from_secs_f32(self.duration)
    }

    fn begin(&mut self) {
        if let Some(on_start) = self.on_start.take() {
            on_start();
        }
        self.target.begin();
    }

    fn seek(&mut self, local: f32, finished: bool) {
        let progress = if finished || self.duration <= 0.0 {
            1.0
        } else {
            (local / self.duration).clamp(0.0, 1.0)
        };
        self.target.apply(self.ease.apply(progress));
    }
}

impl fmt::Debug for Tween {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tween")
            .field("duration", &self.duration)
            .field("ease", &self.ease)
            .finish()
    }
}

struct FnTarget<F>(F);

impl<F: FnMut(f32)> TweenTarget for FnTarget<F> {
    fn begin(&mut self) {}

    fn apply(&mut self, progress: f32) {
        (self.0)(progress)
    }
}

/// Fades a window visual's alpha group from its current value to `to`.
pub struct FadeTarget {
    visual: SharedVisual,
    from: f32,
    to: f32,
}

impl TweenTarget for FadeTarget {
    fn begin(&mut self) {
        self.from = self.visual.borrow().alpha();
    }

    fn apply(&mut self, progress: f32) {
        let alpha = self.from + (self.to - self.from) * progress;
        self.visual.borrow_mut().set_alpha(alpha);
    }
}

/// Moves a window visual's anchor from its current position to `to`.
pub struct SlideTarget {
    visual: SharedVisual,
    from: Vector2<f32>,
    to: Vector2<f32>,
}

impl TweenTarget for SlideTarget {
    fn begin(&mut self) {
        self.from = self.visual.borrow().anchor();
    }

    fn apply(&mut self, progress: f32) {
        let anchor = self.from + (self.to - self.from) * progress;
        self.visual.borrow_mut().set_anchor(anchor);
    }
}

/// Fade `visual` to `to`.
pub fn fade(visual: &SharedVisual, to: f32, duration: Duration, ease: Ease) -> Tween {
    Tween::new(
        duration,
        ease,
        FadeTarget {
            visual: visual.clone(),
            from: to,
            to,
        },
    )
}

/// Slide `visual`'s anchor to `to`.
pub fn slide(visual: &SharedVisual, to: Vector2<f32>, duration: Duration, ease: Ease) -> Tween {
    Tween::new(
        duration,
        ease,
        SlideTarget {
            visual: visual.clone(),
            from: to,
            to,
        },
    )
}

/// Anything that can be placed on a timeline with `append` / `join`.
pub enum Step {
    Tween(Tween),
    Sequence(Sequence),
}

impl From<Tween> for Step {
    fn from(tween: Tween) -> Self {
        Step::Tween(tween)
    }
}

impl From<Sequence> for Step {
    fn from(sequence: Sequence) -> Self {
        Step::Sequence(sequence)
    }
}

enum Track {
    Tween(Tween),
    Nested(Sequence),
    Callback(Option<Box<dyn FnOnce()>>),
    Interval,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Pending,
    Running,
    Done,
}

struct Item {
    start: f32,
    end: f32,
    phase: Phase,
    track: Track,
}

/// Timeline of tweens, nested sequences, callbacks and intervals.
#[derive(Default)]
pub struct Sequence {
    items: Vec<Item>,
    duration: f32,
    last_start: f32,
    elapsed: f32,
    started: bool,
    completed: bool,
    on_start: Vec<Box<dyn FnOnce()>>,
    on_complete: Vec<Box<dyn FnOnce()>>,
}

impl Sequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Place `step` at the end of the timeline.
    pub fn append(&mut self, step: impl Into<Step>) -> &mut Self {
        let start = self.duration;
        self.place(start, step.into());
        self
    }

    /// Start `step` together with the previously appended step.
    pub fn join(&mut self, step: impl Into<Step>) -> &mut Self {
        let start = self.last_start;
        self.place(start, step.into());
        self
    }

    /// Fire `f` once playback reaches the current end of the timeline.
    pub fn append_callback(&mut self, f: impl FnOnce() + 'static) -> &mut Self {
        let start = self.duration;
        self.push(start, 0.0, Track::Callback(Some(Box::new(f))));
        self
    }

    /// Extend the timeline by an idle gap.
    pub fn append_interval(&mut self, gap: Duration) -> &mut Self {
        let start = self.duration;
        self.last_start = start;
        self.push(start, gap.as_secs_f32(), Track::Interval);
        self
    }

    /// Run `f` when playback starts, before any step.
    pub fn on_start(&mut self, f: impl FnOnce() + 'static) -> &mut Self {
        self.on_start.push(Box::new(f));
        self
    }

    /// Run `f` after every step has finished.
    pub fn on_complete(&mut self, f: impl FnOnce() + 'static) -> &mut Self {
        self.on_complete.push(Box::new(f));
        self
    }

    /// Total length of the timeline.
    pub fn duration(&self) -> Duration {
        Duration::from_secs_f32(self.duration)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty() && self.on_start.is_empty() && self.on_complete.is_empty()
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn is_complete(&self) -> bool {
        self.completed
    }

    /// Fast-forward to the end, firing every remaining hook in timeline order.
    pub fn complete(&mut self) {
        self.advance_to(f32::INFINITY);
    }

    /// Move playback forward by `dt` seconds.
    pub(crate) fn advance(&mut self, dt: f32) {
        let time = self.elapsed + dt.max(0.0);
        self.advance_to(time);
    }

    fn place(&mut self, start: f32, step: Step) {
        self.last_start = start;
        match step {
            Step::Tween(tween) => {
                let length = tween.duration.max(0.0);
                self.push(start, length, Track::Tween(tween));
            }
            Step::Sequence(sequence) => {
                let length = sequence.duration;
                self.push(start, length, Track::Nested(sequence));
            }
        }
    }

    fn push(&mut self, start: f32, length: f32, track: Track) {
        let end = start + length;
        self.duration = self.duration.max(end);
        self.items.push(Item {
            start,
            end,
            phase: Phase::Pending,
            track,
        });
    }

    fn advance_to(&mut self, time: f32) {
        if self.completed {
            return;
        }

        let target = time.min(self.duration).max(self.elapsed);
        let mut processed_at = None;

        if !self.started {
            self.started = true;
            for f in std::mem::take(&mut self.on_start) {
                f();
            }
            let now = self.elapsed;
            self.process(now);
            processed_at = Some(now);
        }

        while let Some(boundary) = self.next_boundary(target) {
            self.elapsed = boundary;
            self.process(boundary);
            processed_at = Some(boundary);
        }
        if processed_at != Some(target) {
            self.elapsed = target;
            self.process(target);
        }

        if self.elapsed >= self.duration && self.items.iter().all(|i| i.phase == Phase::Done) {
            self.completed = true;
            trace!("sequence of {:.3}s completed", self.duration);
            for f in std::mem::take(&mut self.on_complete) {
                f();
            }
        }
    }

    fn next_boundary(&self, target: f32) -> Option<f32> {
        self.items
            .iter()
            .filter_map(|item| match item.phase {
                Phase::Pending => Some(item.start),
                Phase::Running => Some(item.end),
                Phase::Done => None,
            })
            .filter(|&b| b > self.elapsed && b <= target)
            .fold(None, |min: Option<f32>, b| Some(min.map_or(b, |m| m.min(b))))
    }

    fn process(&mut self, time: f32) {
        for item in &mut self.items {
            if item.phase == Phase::Pending && time >= item.start {
                item.phase = Phase::Running;
                match &mut item.track {
                    Track::Tween(tween) => tween.begin(),
                    Track::Callback(callback) => {
                        if let Some(callback) = callback.take() {
                            callback();
                        }
                    }
                    Track::Nested(_) | Track::Interval => {}
                }
            }

            if item.phase != Phase::Running {
                continue;
            }

            let finished = time >= item.end;
            match &mut item.track {
                Track::Tween(tween) => tween.seek(time - item.start, finished),
                Track::Nested(sequence) => {
                    if finished {
                        sequence.advance_to(f32::INFINITY);
                    } else {
                        sequence.advance_to(time - item.start);
                    }
                }
                Track::Callback(_) | Track::Interval => {}
            }

            if finished {
                item.phase = Phase::Done;
            }
        }
    }
}

impl fmt::Debug for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sequence")
            .field("steps", &self.items.len())
            .field("duration", &self.duration)
            .field("elapsed", &self.elapsed)
            .field("completed", &self.completed)
            .finish()
    }
}
