//! Delayed actions and sequences layered on the update phase.
//!
//! A [`Delay`] subscribes an update callback that accumulates
//! `clock.delta()`; once the accumulated time strictly exceeds the duration
//! it unsubscribes and runs its action. The subscriber keeps the delay alive,
//! so dropping every handle does not cancel it. Cancelling is always explicit.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::{Rc, Weak};

use crate::api::game::EngineContext;
use super::lifecycle::{Lifecycle, Subscription};

type Action = Box<dyn FnMut(&mut EngineContext)>;

struct DelayState {
    elapsed: f32,
    duration: f32,
    /// `None` while the action runs.
    action: Option<Action>,
    subscription: Option<Subscription>,
}

/// Handle to a scheduled one-shot action.
#[derive(Clone)]
pub struct Delay {
    state: Rc<RefCell<DelayState>>,
}

/// Non-owning handle, for actions that re-arm their own delay.
#[derive(Clone)]
pub struct WeakDelay {
    state: Weak<RefCell<DelayState>>,
}

impl WeakDelay {
    pub fn upgrade(&self) -> Option<Delay> {
        self.state.upgrade().map(|state| Delay { state })
    }
}

impl Delay {
    fn new(duration: f32, action: Action) -> Self {
        Self {
            state: Rc::new(RefCell::new(DelayState {
                elapsed: 0.0,
                duration,
                action: Some(action),
                subscription: None,
            })),
        }
    }

    fn subscribe(&self, lifecycle: &mut Lifecycle) {
        let handle = self.clone();
        let subscription = lifecycle.on_update(move |ctx| {
            let due = {
                let mut state = handle.state.borrow_mut();
                state.elapsed += ctx.clock.delta();
                state.elapsed > state.duration
            };
            if due {
                handle.jump(ctx);
            }
        });
        self.state.borrow_mut().subscription = Some(subscription);
    }

    pub fn downgrade(&self) -> WeakDelay {
        WeakDelay {
            state: Rc::downgrade(&self.state),
        }
    }

    /// Run the action now and unsubscribe. `false` (and nothing runs) if the
    /// delay is not pending.
    pub fn jump(&self, ctx: &mut EngineContext) -> bool {
        let Some(subscription) = self.state.borrow_mut().subscription.take() else {
            return false;
        };
        ctx.lifecycle.unsubscribe(subscription);

        let action = self.state.borrow_mut().action.take();
        if let Some(mut action) = action {
            action(ctx);
            let mut state = self.state.borrow_mut();
            if state.action.is_none() {
                state.action = Some(action);
            }
        }
        true
    }

    /// Unsubscribe without running the action. `false` if not pending.
    pub fn interrupt(&self, lifecycle: &mut Lifecycle) -> bool {
        match self.state.borrow_mut().subscription.take() {
            Some(subscription) => {
                lifecycle.unsubscribe(subscription);
                true
            }
            None => false,
        }
    }

    /// Zero the elapsed time; a pending delay keeps waiting from scratch.
    pub fn reset(&self) {
        self.state.borrow_mut().elapsed = 0.0;
    }

    /// Re-arm a fired or interrupted delay with elapsed zeroed. `false` if
    /// it is already pending.
    pub fn start(&self, lifecycle: &mut Lifecycle) -> bool {
        if self.is_pending() {
            return false;
        }
        self.reset();
        self.subscribe(lifecycle);
        true
    }

    pub fn is_pending(&self) -> bool {
        self.state.borrow().subscription.is_some()
    }

    pub fn elapsed(&self) -> f32 {
        self.state.borrow().elapsed
    }

    pub fn duration(&self) -> f32 {
        self.state.borrow().duration
    }
}

impl Lifecycle {
    /// Schedule `action` to run once, after `duration` seconds of scheduler
    /// time.
    pub fn delay(&mut self, duration: f32, action: impl FnMut(&mut EngineContext) + 'static) -> Delay {
        let delay = Delay::new(duration, Box::new(action));
        delay.subscribe(self);
        delay
    }

    /// Resume `continuation` after `duration`. The caller returns at once;
    /// nothing else waits on it.
    pub fn halt(&mut self, duration: f32, continuation: impl FnOnce(&mut EngineContext) + 'static) -> Delay {
        let mut continuation = Some(continuation);
        self.delay(duration, move |ctx| {
            if let Some(continuation) = continuation.take() {
                continuation(ctx);
            }
        })
    }
}

enum Step {
    Run(Box<dyn FnOnce(&mut EngineContext)>),
    Wait(f32),
}

/// A timed chain of actions, e.g. wind-up, strike, recovery.
///
/// ```ignore
/// let slash = Sequence::new()
///     .then(move |ctx| ctx.hits.set_active(blade, true))
///     .wait(0.12)
///     .then(move |ctx| ctx.hits.set_active(blade, false))
///     .play(ctx);
/// ```
#[derive(Default)]
pub struct Sequence {
    steps: VecDeque<Step>,
}

struct SequenceState {
    steps: VecDeque<Step>,
    waiting: Option<WeakDelay>,
    cancelled: bool,
}

/// Handle to a playing [`Sequence`].
#[derive(Clone)]
pub struct SequenceHandle {
    state: Rc<RefCell<SequenceState>>,
}

impl Sequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn then(mut self, action: impl FnOnce(&mut EngineContext) + 'static) -> Self {
        self.steps.push_back(Step::Run(Box::new(action)));
        self
    }

    pub fn wait(mut self, seconds: f32) -> Self {
        self.steps.push_back(Step::Wait(seconds));
        self
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Run steps up to the first wait immediately; the rest resume from the
    /// scheduler.
    pub fn play(self, ctx: &mut EngineContext) -> SequenceHandle {
        let handle = SequenceHandle {
            state: Rc::new(RefCell::new(SequenceState {
                steps: self.steps,
                waiting: None,
                cancelled: false,
            })),
        };
        handle.advance(ctx);
        handle
    }
}

impl SequenceHandle {
    fn advance(&self, ctx: &mut EngineContext) {
        loop {
            let step = {
                let mut state = self.state.borrow_mut();
                state.waiting = None;
                if state.cancelled {
                    return;
                }
                match state.steps.pop_front() {
                    Some(step) => step,
                    None => return,
                }
            };
            match step {
                Step::Run(action) => action(ctx),
                Step::Wait(seconds) => {
                    let resume = self.clone();
                    let delay = ctx.lifecycle.halt(seconds, move |ctx| resume.advance(ctx));
                    self.state.borrow_mut().waiting = Some(delay.downgrade());
                    return;
                }
            }
        }
    }

    /// Stop before the next step. `false` if already finished or stopped.
    pub fn interrupt(&self, lifecycle: &mut Lifecycle) -> bool {
        let mut state = self.state.borrow_mut();
        if state.cancelled || (state.steps.is_empty() && state.waiting.is_none()) {
            return false;
        }
        state.cancelled = true;
        state.steps.clear();
        if let Some(delay) = state.waiting.take().and_then(|w| w.upgrade()) {
            delay.interrupt(lifecycle);
        }
        true
    }

    /// Whether steps remain (waiting counts).
    pub fn is_running(&self) -> bool {
        let state = self.state.borrow();
        !state.cancelled && (state.waiting.is_some() || !state.steps.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::game::GameConfig;
    use std::cell::Cell;

    fn ctx() -> EngineContext {
        EngineContext::new(&GameConfig::default())
    }

    /// Advance the clock by `dt` and run the update phase, `n` times.
    fn run(ctx: &mut EngineContext, dt: f32, n: usize) {
        for _ in 0..n {
            ctx.clock.advance(dt);
            ctx.run_update();
        }
    }

    fn counter() -> (Rc<Cell<u32>>, impl FnMut(&mut EngineContext) + 'static) {
        let count = Rc::new(Cell::new(0));
        let c = count.clone();
        (count, move |_: &mut EngineContext| c.set(c.get() + 1))
    }

    #[test]
    fn fires_once_after_duration() {
        let mut ctx = ctx();
        let (count, action) = counter();
        let delay = ctx.lifecycle.delay(2.0, action);

        run(&mut ctx, 0.5, 4); // elapsed == 2.0, not yet exceeded
        assert_eq!(count.get(), 0);
        assert!(delay.is_pending());

        run(&mut ctx, 0.5, 1);
        assert_eq!(count.get(), 1);
        assert!(!delay.is_pending());

        run(&mut ctx, 0.5, 10);
        assert_eq!(count.get(), 1);
        assert_eq!(ctx.lifecycle.update_count(), 0);
    }

    #[test]
    fn interrupt_at_halfway_never_fires() {
        let mut ctx = ctx();
        let (count, action) = counter();
        let delay = ctx.lifecycle.delay(2.0, action);

        run(&mut ctx, 0.25, 4);
        assert!(delay.interrupt(&mut ctx.lifecycle));
        assert!(!delay.interrupt(&mut ctx.lifecycle));
        run(&mut ctx, 0.25, 12);
        assert_eq!(count.get(), 0);
    }

    #[test]
    fn jump_at_halfway_fires_once() {
        let mut ctx = ctx();
        let (count, action) = counter();
        let delay = ctx.lifecycle.delay(2.0, action);

        run(&mut ctx, 0.25, 4);
        assert!(delay.jump(&mut ctx));
        assert_eq!(count.get(), 1, "jump runs synchronously");
        assert!(!delay.jump(&mut ctx));
        run(&mut ctx, 0.25, 12);
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn reset_restarts_the_wait() {
        let mut ctx = ctx();
        let (count, action) = counter();
        let delay = ctx.lifecycle.delay(1.0, action);

        run(&mut ctx, 0.25, 3);
        delay.reset();
        assert_eq!(delay.elapsed(), 0.0);
        run(&mut ctx, 0.25, 4);
        assert_eq!(count.get(), 0);
        run(&mut ctx, 0.25, 1);
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn start_rearms_after_interrupt() {
        let mut ctx = ctx();
        let (count, action) = counter();
        let delay = ctx.lifecycle.delay(0.5, action);

        run(&mut ctx, 0.25, 1);
        delay.interrupt(&mut ctx.lifecycle);
        assert!(delay.start(&mut ctx.lifecycle));
        assert!(!delay.start(&mut ctx.lifecycle));
        run(&mut ctx, 0.25, 2);
        assert_eq!(count.get(), 0);
        run(&mut ctx, 0.25, 1);
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn periodic_action_rearms_itself() {
        let mut ctx = ctx();
        let count = Rc::new(Cell::new(0));
        let own: Rc<RefCell<Option<WeakDelay>>> = Rc::new(RefCell::new(None));

        let c = count.clone();
        let o = own.clone();
        let delay = ctx.lifecycle.delay(0.5, move |ctx| {
            c.set(c.get() + 1);
            if let Some(me) = o.borrow().as_ref().and_then(WeakDelay::upgrade) {
                me.start(&mut ctx.lifecycle);
            }
        });
        *own.borrow_mut() = Some(delay.downgrade());

        // Fires on the third tick of each period: 0.75 > 0.5.
        run(&mut ctx, 0.25, 12);
        assert_eq!(count.get(), 4);
        assert!(delay.is_pending());
        delay.interrupt(&mut ctx.lifecycle);
        run(&mut ctx, 0.25, 12);
        assert_eq!(count.get(), 4);
    }

    #[test]
    fn halt_resumes_continuation_once() {
        let mut ctx = ctx();
        let resumed = Rc::new(Cell::new(0));
        let r = resumed.clone();
        ctx.lifecycle.halt(0.1, move |_| r.set(r.get() + 1));

        run(&mut ctx, 0.05, 2);
        assert_eq!(resumed.get(), 0);
        run(&mut ctx, 0.05, 6);
        assert_eq!(resumed.get(), 1);
    }

    #[test]
    fn sequence_runs_steps_at_tick_boundaries() {
        let mut ctx = ctx();
        let log = Rc::new(RefCell::new(Vec::new()));
        let (a, b, c) = (log.clone(), log.clone(), log.clone());

        let handle = Sequence::new()
            .then(move |_| a.borrow_mut().push("windup"))
            .wait(0.2)
            .then(move |_| b.borrow_mut().push("strike"))
            .wait(0.2)
            .then(move |_| c.borrow_mut().push("recover"))
            .play(&mut ctx);

        assert_eq!(*log.borrow(), vec!["windup"]);
        assert!(handle.is_running());
        run(&mut ctx, 0.1, 3);
        assert_eq!(*log.borrow(), vec!["windup", "strike"]);
        run(&mut ctx, 0.1, 3);
        assert_eq!(*log.borrow(), vec!["windup", "strike", "recover"]);
        assert!(!handle.is_running());
        assert!(!handle.interrupt(&mut ctx.lifecycle));
    }

    #[test]
    fn interrupted_sequence_stops() {
        let mut ctx = ctx();
        let (count, mut action) = counter();

        let handle = Sequence::new()
            .wait(0.2)
            .then(move |ctx| action(ctx))
            .play(&mut ctx);

        run(&mut ctx, 0.1, 1);
        assert!(handle.interrupt(&mut ctx.lifecycle));
        run(&mut ctx, 0.1, 5);
        assert_eq!(count.get(), 0);
        assert!(!handle.is_running());
        assert_eq!(ctx.lifecycle.update_count(), 0);
    }
}
