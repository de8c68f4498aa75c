use crate::{SimTime, Simulation};

/// Simulation execution trait.
pub trait Execute {
    /// Executes the simulation until some stopping condition is reached.
    /// The condition is implementation-specific.
    fn execute(self, sim: &mut Simulation);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EndCondition {
    Time(SimTime),
    NoEvents,
    Steps(usize),
}

/// Executor is used for simple execution of an entire simulation.
///
/// See the crate level documentation for examples.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Executor {
    end_condition: EndCondition,
}

impl Executor {
    /// Simulation will end only once there is no available events in the queue.
    #[must_use]
    pub fn unbound() -> Self {
        Self {
            end_condition: EndCondition::NoEvents,
        }
    }

    /// Deliver every event whose time is `<= time`, then stop.
    /// It may terminate early if no events are available. Processes waiting
    /// on later events are left suspended.
    #[must_use]
    pub fn timed(time: SimTime) -> Self {
        Self {
            end_condition: EndCondition::Time(time),
        }
    }

    /// Simulation will execute exactly this many steps, unless we run out of events.
    #[must_use]
    pub fn steps(steps: usize) -> Self {
        Self {
            end_condition: EndCondition::Steps(steps),
        }
    }

    /// Registers a side effect that is called _after_ each simulation step.
    #[must_use]
    pub fn side_effect<F>(self, func: F) -> ExecutorWithSideEffect<F>
    where
        F: FnMut(&Simulation),
    {
        ExecutorWithSideEffect {
            end_condition: self.end_condition,
            side_effect: func,
        }
    }

    /// Also stop as soon as `predicate` holds. It is checked once before
    /// the first step and then _after_ each step, so the clock is left at
    /// the event that made it true.
    #[must_use]
    pub fn stop_when<P>(self, predicate: P) -> ExecutorWithStopCondition<P>
    where
        P: FnMut(&Simulation) -> bool,
    {
        ExecutorWithStopCondition {
            end_condition: self.end_condition,
            predicate,
        }
    }
}

impl Execute for Executor {
    fn execute(self, sim: &mut Simulation) {
        run_with(sim, self.end_condition, |_| true);
    }
}

pub struct ExecutorWithSideEffect<F>
where
    F: FnMut(&Simulation),
{
    end_condition: EndCondition,
    side_effect: F,
}

impl<F> Execute for ExecutorWithSideEffect<F>
where
    F: FnMut(&Simulation),
{
    fn execute(mut self, sim: &mut Simulation) {
        run_with(sim, self.end_condition, |sim| {
            (self.side_effect)(sim);
            true
        });
    }
}

pub struct ExecutorWithStopCondition<P>
where
    P: FnMut(&Simulation) -> bool,
{
    end_condition: EndCondition,
    predicate: P,
}

impl<P> Execute for ExecutorWithStopCondition<P>
where
    P: FnMut(&Simulation) -> bool,
{
    fn execute(mut self, sim: &mut Simulation) {
        if (self.predicate)(sim) {
            return;
        }
        run_with(sim, self.end_condition, |sim| !(self.predicate)(sim));
    }
}

/// `after_step` returns `false` to end the run early.
fn run_with<F>(sim: &mut Simulation, end_condition: EndCondition, mut after_step: F)
where
    F: FnMut(&Simulation) -> bool,
{
    let mut step_fn = |sim: &mut Simulation| sim.step() && after_step(sim);
    match end_condition {
        EndCondition::Time(time) => execute_until(sim, time, &mut step_fn),
        EndCondition::NoEvents => execute_until_empty(sim, &mut step_fn),
        EndCondition::Steps(steps) => execute_steps(sim, steps, &mut step_fn),
    }
}

fn execute_until_empty<F>(sim: &mut Simulation, step: &mut F)
where
    F: FnMut(&mut Simulation) -> bool,
{
    while step(sim) {}
}

fn execute_until<F>(sim: &mut Simulation, time: SimTime, step: &mut F)
where
    F: FnMut(&mut Simulation) -> bool,
{
    while sim.peek_next_event_time().is_some_and(|t| t <= time) {
        if !step(sim) {
            break;
        }
    }
}

fn execute_steps<F>(sim: &mut Simulation, steps: usize, step: &mut F)
where
    F: FnMut(&mut Simulation) -> bool,
{
    for _ in 0..steps {
        if !step(sim) {
            break;
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::async_runtime::sim_sleep;
    use std::cell::Cell;
    use std::rc::Rc;
    use std::time::Duration;

    /// Ticks every 2 seconds, ten times in total.
    fn spawn_ticker(sim: &mut Simulation) -> Rc<Cell<usize>> {
        let counter = Rc::new(Cell::new(0));
        let c = counter.clone();
        sim.spawn(async move {
            loop {
                c.set(c.get() + 1);
                if c.get() >= 10 {
                    break;
                }
                sim_sleep(Duration::from_secs(2)).await;
            }
        });
        counter
    }

    #[test]
    fn test_create_executor() {
        assert_eq!(
            Executor::unbound(),
            Executor {
                end_condition: EndCondition::NoEvents
            }
        );
        assert_eq!(
            Executor::timed(SimTime::zero()),
            Executor {
                end_condition: EndCondition::Time(SimTime::zero())
            }
        );
        assert_eq!(
            Executor::steps(7),
            Executor {
                end_condition: EndCondition::Steps(7)
            }
        );
    }

    #[test]
    fn test_steps() {
        let mut sim = Simulation::default();
        let counter = spawn_ticker(&mut sim);
        Executor::steps(10).execute(&mut sim);
        assert_eq!(counter.get(), 10);
    }

    #[test]
    fn test_steps_stops_before() {
        let mut sim = Simulation::default();
        let counter = spawn_ticker(&mut sim);
        // After 10 steps there are no events, so it will not execute all 100
        Executor::steps(100).execute(&mut sim);
        assert_eq!(counter.get(), 10);
        assert_eq!(sim.events_processed(), 10);
    }

    #[test]
    fn test_unbound() {
        let mut sim = Simulation::default();
        let counter = spawn_ticker(&mut sim);
        Executor::unbound().execute(&mut sim);
        assert_eq!(counter.get(), 10);
        assert_eq!(sim.time(), SimTime::from_secs(18));
    }

    #[test]
    fn test_timed() {
        let mut sim = Simulation::default();
        let counter = spawn_ticker(&mut sim);
        Executor::timed(SimTime::from_secs(6)).execute(&mut sim);
        // Events at 0, 2, 4 and 6 are delivered; the horizon is inclusive
        assert_eq!(counter.get(), 4);
        assert_eq!(sim.clock().time(), SimTime::from_secs(6));
    }

    #[test]
    fn test_timed_clock_stops_early() {
        let mut sim = Simulation::default();
        let counter = spawn_ticker(&mut sim);
        Executor::timed(SimTime::from_secs(5)).execute(&mut sim);
        assert_eq!(counter.get(), 3);
        // The clock rests on the last delivered event, not on the horizon
        assert_eq!(sim.clock().time(), SimTime::from_secs(4));
    }

    #[test]
    fn test_side_effect_sees_every_step() {
        let mut sim = Simulation::default();
        spawn_ticker(&mut sim);
        let mut seen = Vec::new();
        Executor::unbound()
            .side_effect(|sim| seen.push(sim.time()))
            .execute(&mut sim);
        let expected: Vec<SimTime> = (0..10).map(|i| SimTime::from_secs(2 * i)).collect();
        assert_eq!(seen, expected);
    }

    #[test]
    fn test_stop_when_ends_on_matching_event() {
        let mut sim = Simulation::default();
        let counter = spawn_ticker(&mut sim);
        let c = counter.clone();
        Executor::timed(SimTime::from_secs(100))
            .stop_when(move |_| c.get() >= 3)
            .execute(&mut sim);
        assert_eq!(counter.get(), 3);
        assert_eq!(sim.time(), SimTime::from_secs(4));
        assert_eq!(sim.events_processed(), 3);
    }

    #[test]
    fn test_stop_when_already_true() {
        let mut sim = Simulation::default();
        spawn_ticker(&mut sim);
        Executor::unbound().stop_when(|_| true).execute(&mut sim);
        assert_eq!(sim.events_processed(), 0);
    }

    #[test]
    fn test_stop_when_never_true_reaches_horizon() {
        let mut sim = Simulation::default();
        let counter = spawn_ticker(&mut sim);
        Executor::timed(SimTime::from_secs(5))
            .stop_when(|_| false)
            .execute(&mut sim);
        assert_eq!(counter.get(), 3);
    }
}
