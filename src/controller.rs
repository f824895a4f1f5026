// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Progressive refinement.
//!
//! An attractor image never finishes; it only gets smoother.  The
//! controller decides how the CPU is spent on it.  While someone is
//! watching, it iterates in small bursts and redraws often at first,
//! then less and less as each new frame looks more like the last.  In
//! batch mode it iterates in large bursts until the busiest pixel has
//! been visited `target_density` times, reporting progress as it goes,
//! and then develops the image once.
//!
//! The host drives everything by calling [`Controller::tick`] until it
//! returns false.  Stopping is simply not calling it again; whatever
//! has been accumulated stays valid.

use crate::error::Result;
use crate::params::{AttractorParameters, RenderSettings};
use crate::session::{Frame, Session};
use log::info;
use num::clamp;
use std::fmt;
use std::time::{Duration, Instant};

/// Iterations per interactive tick.
pub const INTERACTIVE_BATCH: u64 = 10_000;

/// Iterations per batch-mode tick.
pub const BATCH_ITERATIONS: u64 = 1_000_000;

const MAX_FRAME_RATE: f64 = 200.0;
const MIN_FRAME_RATE: f64 = 0.5;

/// The redraw rate, in frames per second, worth spending on an image
/// that has had `iterations` steps.  Fast while the picture is still
/// changing, slow once it has settled.
pub fn frame_rate(iterations: f64) -> f64 {
    let denominator = 1.0 + (iterations.ln() - 9.21) * 5.0;
    if denominator > 0.0 {
        clamp(MAX_FRAME_RATE / denominator, MIN_FRAME_RATE, MAX_FRAME_RATE)
    } else {
        MAX_FRAME_RATE
    }
}

/// Lets one frame through per `1 / rate` seconds.
#[derive(Debug, Default)]
struct RateLimiter {
    last: Option<Instant>,
}

impl RateLimiter {
    fn ready(&mut self, now: Instant, rate: f64) -> bool {
        let due = match self.last {
            None => true,
            Some(last) => now.duration_since(last).as_secs_f64() >= 1.0 / rate,
        };
        if due {
            self.last = Some(now);
        }
        due
    }
}

/// Where the controller is in its life.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum State {
    Idle,
    /// Small bursts and rate-limited redraws.
    Refining,
    /// Large bursts until the target density.
    Batch,
    /// The target density was reached and the final frame delivered.
    Done,
}

/// Where a batch render stands after a burst.
#[derive(Clone, Debug, PartialEq)]
pub struct BatchProgress {
    pub percent: f64,
    pub iterations: f64,
    /// Iterations per second so far; zero until time has passed.
    pub rate: f64,
    pub current_density: u32,
    pub target_density: u32,
    pub elapsed: Duration,
    /// Assumes density grows linearly with time, which it very nearly
    /// does.  Unknown until something has been plotted.
    pub remaining: Option<Duration>,
}

impl BatchProgress {
    pub fn measure(
        iterations: f64,
        current_density: u32,
        target_density: u32,
        elapsed: Duration,
    ) -> Self {
        let seconds = elapsed.as_secs_f64();
        let percent = if target_density > 0 {
            100.0 * f64::from(current_density) / f64::from(target_density)
        } else {
            100.0
        };
        let rate = if seconds > 0.0 { iterations / seconds } else { 0.0 };
        let remaining = if current_density > 0 {
            let total = seconds * f64::from(target_density) / f64::from(current_density);
            Some(Duration::from_secs_f64((total - seconds).max(0.0)))
        } else {
            None
        };
        BatchProgress {
            percent,
            iterations,
            rate,
            current_density,
            target_density,
            elapsed,
            remaining,
        }
    }
}

fn clock(duration: Duration) -> String {
    let secs = duration.as_secs();
    format!("{:02}:{:02}:{:02}", secs / 3600, (secs / 60) % 60, secs % 60)
}

impl fmt::Display for BatchProgress {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{:6.2}%   {:.3e}   {:.2e}/sec   {:6} / {}   {} / {}",
            self.percent,
            self.iterations,
            self.rate,
            self.current_density,
            self.target_density,
            clock(self.elapsed),
            self.remaining.map(clock).unwrap_or_else(|| "--:--:--".to_string())
        )
    }
}

/// Whoever shows the render to a person, or writes it out.
pub trait Observer {
    /// A new interactive frame.
    fn refresh(&mut self, frame: &Frame);

    /// A batch burst finished.
    fn progress(&mut self, _progress: &BatchProgress) {}

    /// The batch render reached its target density.
    fn completed(&mut self, _frame: &Frame) {}
}

/// Watches nothing.
impl Observer for () {
    fn refresh(&mut self, _frame: &Frame) {}
}

/// Schedules a session's iterations and redraws.
#[derive(Debug)]
pub struct Controller {
    session: Session,
    state: State,
    limiter: RateLimiter,
    // An edit is waiting to be shown.
    dirty: bool,
    target_density: u32,
    batch_started: Option<Instant>,
    interactive_batch: u64,
    batch_iterations: u64,
}

impl Controller {
    pub fn new(session: Session) -> Self {
        Controller {
            session,
            state: State::Idle,
            limiter: RateLimiter::default(),
            dirty: false,
            target_density: 0,
            batch_started: None,
            interactive_batch: INTERACTIVE_BATCH,
            batch_iterations: BATCH_ITERATIONS,
        }
    }

    /// Overrides the burst sizes.  Bigger bursts iterate faster and
    /// respond slower.
    pub fn with_batch_sizes(mut self, interactive: u64, batch: u64) -> Self {
        self.interactive_batch = interactive;
        self.batch_iterations = batch;
        self
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn target_density(&self) -> u32 {
        self.target_density
    }

    /// Starts interactive refinement from a clean slate.
    pub fn start(&mut self) {
        self.session.clear();
        self.resume();
    }

    /// Continues interactive refinement with whatever has been
    /// accumulated.
    pub fn resume(&mut self) {
        info!("refining interactively");
        self.state = State::Refining;
    }

    /// Stops iterating, keeping everything accumulated.
    pub fn stop(&mut self) {
        if self.state != State::Idle {
            info!("stopped after {:.3e} iterations", self.session.surface().iterations());
        }
        self.state = State::Idle;
    }

    /// Switches to batch mode, running until the busiest pixel has been
    /// visited `target_density` times.
    pub fn render_to_density(&mut self, target_density: u32) {
        info!("rendering to density {}", target_density);
        self.target_density = target_density;
        self.batch_started = None;
        self.state = State::Batch;
    }

    /// Throws away the histogram and goes idle.
    pub fn clear(&mut self) {
        self.session.clear();
        self.state = State::Idle;
    }

    /// Changes the image size.  Everything accumulated is lost and the
    /// controller goes idle.  On failure the old surface is untouched.
    pub fn resize(&mut self, width: usize, height: usize) -> Result<()> {
        self.session.resize(width, height)?;
        self.dirty = true;
        self.state = State::Idle;
        Ok(())
    }

    /// Edits the attractor.  A real change restarts the histogram and
    /// is shown at the next tick regardless of the frame rate.
    pub fn set_attractor(&mut self, params: AttractorParameters) {
        if self.session.set_attractor(params) {
            self.dirty = true;
        }
    }

    /// Edits the tone mapping.  A real change is shown at the next tick
    /// regardless of the frame rate.
    pub fn set_render_settings(&mut self, settings: RenderSettings) {
        if self.session.set_render_settings(settings) {
            self.dirty = true;
        }
    }

    /// The line shown under an interactive frame.  The target is left
    /// out until there is one.
    pub fn status(&self) -> String {
        let surface = self.session.surface();
        let line = format!(
            "Iterations: {:.3e}   max density: {}",
            surface.iterations(),
            surface.current_density()
        );
        if self.target_density > 0 {
            format!("{} / {}", line, self.target_density)
        } else {
            line
        }
    }

    /// Develops the histogram now and hands the frame to the observer,
    /// whatever the state and frame rate.
    pub fn redraw(&mut self, observer: &mut dyn Observer) {
        self.session.render_pixels();
        self.dirty = false;
        let frame = self.session.frame(self.status());
        observer.refresh(&frame);
    }

    /// Does one unit of work.  Returns whether the host should call
    /// again.
    pub fn tick(&mut self, observer: &mut dyn Observer) -> bool {
        self.tick_at(Instant::now(), observer)
    }

    /// [`tick`](#method.tick) with the host's idea of the current time.
    pub fn tick_at(&mut self, now: Instant, observer: &mut dyn Observer) -> bool {
        match self.state {
            State::Idle | State::Done => {
                if self.dirty {
                    self.redraw(observer);
                }
                false
            }
            State::Refining => {
                self.session.run_iterations(self.interactive_batch);
                let rate = frame_rate(self.session.surface().iterations());
                if self.dirty || self.limiter.ready(now, rate) {
                    self.redraw(observer);
                }
                true
            }
            State::Batch => self.batch_tick(now, observer),
        }
    }

    fn batch_tick(&mut self, now: Instant, observer: &mut dyn Observer) -> bool {
        let started = *self.batch_started.get_or_insert(now);
        if self.session.surface().current_density() < self.target_density {
            self.session.run_iterations(self.batch_iterations);
            let surface = self.session.surface();
            let progress = BatchProgress::measure(
                surface.iterations(),
                surface.current_density(),
                self.target_density,
                now.duration_since(started),
            );
            observer.progress(&progress);
        }
        if self.session.surface().current_density() < self.target_density {
            return true;
        }

        info!(
            "reached density {} after {:.3e} iterations",
            self.session.surface().current_density(),
            self.session.surface().iterations()
        );
        self.state = State::Done;
        self.session.render_pixels();
        self.dirty = false;
        let frame = self.session.frame(self.status());
        observer.completed(&frame);
        false
    }

    /// Runs batch mode to the end on this thread.
    pub fn run_to_density(&mut self, target_density: u32, observer: &mut dyn Observer) {
        self.render_to_density(target_density);
        while self.tick(observer) {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::{Color, ParameterSet};
    use crate::variates::Variates;

    #[derive(Default)]
    struct Recorder {
        refreshes: Vec<Frame>,
        progress: Vec<BatchProgress>,
        completed: Vec<Frame>,
    }

    impl Observer for Recorder {
        fn refresh(&mut self, frame: &Frame) {
            self.refreshes.push(frame.clone());
        }

        fn progress(&mut self, progress: &BatchProgress) {
            self.progress.push(progress.clone());
        }

        fn completed(&mut self, frame: &Frame) {
            self.completed.push(frame.clone());
        }
    }

    fn controller() -> Controller {
        let session =
            Session::new(ParameterSet::default(), 48, 48, Variates::seeded(17)).unwrap();
        Controller::new(session)
    }

    #[test]
    fn frame_rate_slows_as_the_image_settles() {
        assert_eq!(frame_rate(0.0), MAX_FRAME_RATE);
        assert_eq!(frame_rate(1.0), MAX_FRAME_RATE);
        assert!((frame_rate(10_000.0) - MAX_FRAME_RATE).abs() < 1.0);
        let late = frame_rate(1e9);
        assert!(late > 3.0 && late < 4.0, "{}", late);
        assert_eq!(frame_rate(1e300), MIN_FRAME_RATE);
        assert!(frame_rate(1e6) > frame_rate(1e7));
    }

    #[test]
    fn idle_controller_does_nothing() {
        let mut c = controller();
        let mut r = Recorder::default();
        assert!(!c.tick(&mut r));
        assert_eq!(c.session().surface().iterations(), 0.0);
        assert!(r.refreshes.is_empty());
    }

    #[test]
    fn refining_redraws_at_the_limited_rate() {
        let mut c = controller();
        let mut r = Recorder::default();
        let t0 = Instant::now();
        c.start();
        assert_eq!(c.state(), State::Refining);

        assert!(c.tick_at(t0, &mut r));
        assert_eq!(r.refreshes.len(), 1);
        assert_eq!(r.refreshes[0].iterations, 10_000.0);
        assert!(r.refreshes[0].status.starts_with("Iterations: 1.000e4"));

        // 20,000 iterations allow about 45 frames a second.
        assert!(c.tick_at(t0 + Duration::from_millis(1), &mut r));
        assert_eq!(r.refreshes.len(), 1);
        assert!(c.tick_at(t0 + Duration::from_millis(500), &mut r));
        assert_eq!(r.refreshes.len(), 2);
        assert_eq!(c.session().surface().iterations(), 30_000.0);
    }

    #[test]
    fn edits_bypass_the_limiter_once() {
        let mut c = controller();
        let mut r = Recorder::default();
        let t0 = Instant::now();
        c.start();
        c.tick_at(t0, &mut r);

        let mut settings = *c.session().render_settings();
        settings.bgcolor = Color::BLACK;
        c.set_render_settings(settings);
        c.tick_at(t0 + Duration::from_millis(1), &mut r);
        assert_eq!(r.refreshes.len(), 2);
        c.tick_at(t0 + Duration::from_millis(2), &mut r);
        assert_eq!(r.refreshes.len(), 2);

        // Setting the same thing again is not an edit.
        c.set_render_settings(settings);
        c.tick_at(t0 + Duration::from_millis(3), &mut r);
        assert_eq!(r.refreshes.len(), 2);
    }

    #[test]
    fn attractor_edits_restart_the_histogram() {
        let mut c = controller();
        let mut r = Recorder::default();
        let t0 = Instant::now();
        c.start();
        c.tick_at(t0, &mut r);
        c.tick_at(t0, &mut r);
        let mut params = *c.session().attractor();
        params.b = -1.0;
        c.set_attractor(params);
        c.tick_at(t0, &mut r);
        assert_eq!(r.refreshes.len(), 2);
        assert_eq!(r.refreshes[1].iterations, 10_000.0);
    }

    #[test]
    fn stop_and_resume_keep_the_histogram() {
        let mut c = controller();
        let mut r = Recorder::default();
        c.start();
        c.tick(&mut r);
        c.tick(&mut r);
        c.stop();
        assert_eq!(c.state(), State::Idle);
        assert!(!c.tick(&mut r));
        assert_eq!(c.session().surface().iterations(), 20_000.0);

        c.resume();
        c.tick(&mut r);
        assert_eq!(c.session().surface().iterations(), 30_000.0);

        c.start();
        assert_eq!(c.session().surface().iterations(), 0.0);
    }

    #[test]
    fn batch_runs_to_the_target() {
        let mut c = controller().with_batch_sizes(1_000, 20_000);
        let mut r = Recorder::default();
        c.run_to_density(40, &mut r);
        assert_eq!(c.state(), State::Done);
        assert!(c.session().surface().current_density() >= 40);
        assert!(!r.progress.is_empty());
        assert_eq!(r.completed.len(), 1);
        let last = r.progress.last().unwrap();
        assert!(last.percent >= 100.0);
        assert_eq!(last.iterations, r.completed[0].iterations);
        assert_eq!(r.completed[0].pixels.len(), 48 * 48);
        // Nothing more to do.
        assert!(!c.tick(&mut r));
        assert_eq!(r.completed.len(), 1);
    }

    #[test]
    fn reached_target_completes_without_iterating() {
        let mut c = controller();
        let mut r = Recorder::default();
        c.run_to_density(0, &mut r);
        assert_eq!(c.state(), State::Done);
        assert_eq!(c.session().surface().iterations(), 0.0);
        assert!(r.progress.is_empty());
        assert_eq!(r.completed.len(), 1);
    }

    #[test]
    fn batch_can_follow_interactive() {
        let mut c = controller().with_batch_sizes(5_000, 50_000);
        let mut r = Recorder::default();
        c.start();
        c.tick(&mut r);
        c.render_to_density(10);
        assert_eq!(c.state(), State::Batch);
        while c.tick(&mut r) {}
        assert!(c.session().surface().iterations() > 5_000.0);
        assert_eq!(r.completed.len(), 1);
    }

    #[test]
    fn status_shows_the_target_once_there_is_one() {
        let mut c = controller().with_batch_sizes(1_000, 20_000);
        let mut r = Recorder::default();
        c.start();
        c.tick(&mut r);
        let status = &r.refreshes[0].status;
        assert!(!status.contains('/'), "{}", status);

        c.run_to_density(5, &mut r);
        let status = &r.completed[0].status;
        assert!(status.ends_with(" / 5"), "{}", status);
    }

    #[test]
    fn progress_estimates_linearly() {
        let p = BatchProgress::measure(4e6, 25, 100, Duration::from_secs(10));
        assert_eq!(p.percent, 25.0);
        assert_eq!(p.rate, 4e5);
        assert_eq!(p.remaining, Some(Duration::from_secs(30)));

        let p = BatchProgress::measure(1e6, 0, 100, Duration::from_secs(0));
        assert_eq!(p.rate, 0.0);
        assert_eq!(p.remaining, None);
        assert_eq!(p.percent, 0.0);
    }

    #[test]
    fn progress_line_reads_like_a_clock() {
        let p = BatchProgress::measure(4e6, 25, 100, Duration::from_secs(3725));
        let line = p.to_string();
        assert!(line.starts_with(" 25.00%"), "{}", line);
        assert!(line.contains("4.000e6"), "{}", line);
        assert!(line.contains("01:02:05 / 03:06:15"), "{}", line);

        let p = BatchProgress::measure(0.0, 0, 100, Duration::from_secs(1));
        assert!(p.to_string().ends_with("00:00:01 / --:--:--"));
    }

    #[test]
    fn resize_discards_and_idles() {
        let mut c = controller();
        let mut r = Recorder::default();
        c.start();
        c.tick(&mut r);
        c.resize(20, 10).unwrap();
        assert_eq!(c.state(), State::Idle);
        assert_eq!(c.session().surface().iterations(), 0.0);
        // The resize is shown even while idle.
        assert!(!c.tick(&mut r));
        assert_eq!(r.refreshes.last().unwrap().width, 20);
        assert!(c.resize(0, 10).is_err());
        assert_eq!(c.session().surface().width(), 20);
    }
}
