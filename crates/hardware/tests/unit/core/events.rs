use std::sync::{Arc, Mutex};

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use rvdbg_core::core::events::{EventQueue, StepListener};

use crate::common::builder::spin;
use crate::common::harness::{RAM_BASE, TestContext};
use crate::common::mocks::{MockListener, Periodic, Recorder};

type Log = Arc<Mutex<Vec<(&'static str, u64)>>>;

/// Records its `(trigger step, insertion index)` when fired.
struct Tagged(u64, usize, Arc<Mutex<Vec<(u64, usize)>>>);

impl StepListener for Tagged {
    fn on_step(&self, _step: u64, _queue: &mut EventQueue) {
        self.2.lock().unwrap().push((self.0, self.1));
    }
}

fn fire_all(q: &mut EventQueue, step: u64) {
    let mut scratch = EventQueue::default();
    for listener in q.drain_due(step) {
        listener.on_step(step, &mut scratch);
    }
}

#[test]
fn equal_trigger_steps_fire_in_insertion_order() {
    let log: Log = Arc::default();
    let mut q = EventQueue::default();
    q.put(5, Recorder::new("c1", &log)).unwrap();
    q.put(5, Recorder::new("c2", &log)).unwrap();

    fire_all(&mut q, 5);

    assert_eq!(*log.lock().unwrap(), vec![("c1", 5), ("c2", 5)]);
}

#[test]
fn future_entries_stay_queued() {
    let log: Log = Arc::default();
    let mut q = EventQueue::default();
    q.put(10, Recorder::new("later", &log)).unwrap();

    assert_eq!(q.drain_due(9).len(), 0);
    assert_eq!(q.len(), 1);
    assert_eq!(q.next_trigger(), Some(10));

    fire_all(&mut q, 10);
    assert_eq!(*log.lock().unwrap(), vec![("later", 10)]);
    assert!(q.is_empty());
}

#[test]
fn past_trigger_fires_on_next_drain() {
    let log: Log = Arc::default();
    let mut q = EventQueue::default();
    q.put(2, Recorder::new("late", &log)).unwrap();
    fire_all(&mut q, 7);
    assert_eq!(*log.lock().unwrap(), vec![("late", 7)]);
}

#[test]
fn staged_entries_are_counted_before_merge() {
    let log: Log = Arc::default();
    let mut q = EventQueue::default();
    q.put(3, Recorder::new("a", &log)).unwrap();
    assert_eq!(q.len(), 1);
    q.push_pre_queued();
    assert_eq!(q.len(), 1);
    q.clear();
    assert!(q.is_empty());
    assert_eq!(q.next_trigger(), None);
}

proptest! {
    #[test]
    fn drain_yields_ascending_steps_fifo_within_step(
        steps in proptest::collection::vec(0u64..20, 1..40),
        now in 0u64..25,
    ) {
        let fired: Arc<Mutex<Vec<(u64, usize)>>> = Arc::default();
        let mut q = EventQueue::default();
        for (i, s) in steps.iter().enumerate() {
            q.put(*s, Arc::new(Tagged(*s, i, Arc::clone(&fired)))).unwrap();
        }

        fire_all(&mut q, now);

        let fired = fired.lock().unwrap().clone();
        let expected_due = steps.iter().filter(|s| **s <= now).count();
        prop_assert_eq!(fired.len(), expected_due);
        prop_assert_eq!(q.len(), steps.len() - expected_due);
        for pair in fired.windows(2) {
            prop_assert!(pair[0] < pair[1], "out of order: {:?}", pair);
        }
    }
}

#[test]
fn core_fires_listener_exactly_once_at_trigger_step() {
    let mut ctx = TestContext::new()
        .load_program(RAM_BASE, &[spin()])
        .power_on();
    let mut listener = MockListener::new();
    listener
        .expect_on_step()
        .withf(|step, _| *step == 3)
        .times(1)
        .return_const(());

    ctx.cpu
        .register_step_callback(Arc::new(listener), 3)
        .unwrap();
    let _ = ctx.run(6);

    assert!(ctx.cpu.events().is_empty());
}

#[test]
fn listener_may_reschedule_itself_while_firing() {
    let fired = Arc::new(Mutex::new(Vec::new()));
    let mut ctx = TestContext::new()
        .load_program(RAM_BASE, &[spin()])
        .power_on();
    ctx.cpu
        .register_step_callback(
            Arc::new(Periodic {
                period: 3,
                remaining: Mutex::new(2),
                fired: Arc::clone(&fired),
            }),
            2,
        )
        .unwrap();

    let _ = ctx.run(12);

    assert_eq!(*fired.lock().unwrap(), vec![2, 5, 8]);
}

#[test]
fn powered_off_core_fires_reached_steps_synchronously() {
    let mut ctx = TestContext::new();
    let log: Log = Arc::default();

    ctx.cpu
        .register_step_callback(Recorder::new("now", &log), 0)
        .unwrap();
    assert_eq!(*log.lock().unwrap(), vec![("now", 0)]);

    ctx.cpu
        .register_step_callback(Recorder::new("later", &log), 4)
        .unwrap();
    assert_eq!(ctx.cpu.events().len(), 1);
}

#[test]
fn queue_limit_is_enforced_by_the_core() {
    let mut ctx = TestContext::with_config(|c| c.event_queue_limit = Some(1))
        .load_program(RAM_BASE, &[spin()])
        .power_on();
    let log: Log = Arc::default();
    ctx.cpu
        .register_step_callback(Recorder::new("a", &log), 10)
        .unwrap();
    assert!(
        ctx.cpu
            .register_step_callback(Recorder::new("b", &log), 11)
            .is_err()
    );
}

#[test]
fn reset_drops_pending_callbacks() {
    let mut ctx = TestContext::new()
        .load_program(RAM_BASE, &[spin()])
        .power_on();
    let log: Log = Arc::default();
    ctx.cpu
        .register_step_callback(Recorder::new("dropped", &log), 100)
        .unwrap();
    ctx.cpu.reset(true);
    assert!(ctx.cpu.events().is_empty());
}
