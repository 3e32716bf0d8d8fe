//! Periodic sampling.
//!
//! A [`Sampler`] polls the wall clock every 100 ms and converts it to a tick
//! number (whole seconds since the Unix epoch, rounded). Whenever the tick
//! number is a multiple of the configured interval, the [`TickHandler`] is
//! invoked, at most once per tick number. A handler that overruns its tick
//! simply causes the polls it blocked to be skipped; a handler that fails is
//! logged and called again on the next due tick.
//!
//! ```rust,no_run
//! use app_tenancy::sampler::{Sampler, TickError, TickHandler};
//!
//! struct Report;
//!
//! impl TickHandler for Report {
//!     async fn on_tick(&mut self, tick: i64) -> Result<(), TickError> {
//!         println!("sampling at {:?}", Sampler::tick_number_to_date(tick));
//!         Ok(())
//!     }
//! }
//!
//! # #[tokio::main]
//! # async fn main() {
//! let mut sampler = Sampler::new(60);
//! sampler.start(Report);
//! # sampler.stop();
//! # }
//! ```

use chrono::{DateTime, Utc};
use log::{debug, warn};
use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Period of the internal clock poll.
pub const POLL_PERIOD: Duration = Duration::from_millis(100);

pub type TickError = Box<dyn std::error::Error + Send + Sync>;

/// Callback invoked by a [`Sampler`] on every due tick.
pub trait TickHandler: Send + 'static {
    fn on_tick(&mut self, tick: i64) -> impl Future<Output = Result<(), TickError>> + Send;
}

pub struct Sampler {
    interval_ticks: i64,
    task: Option<JoinHandle<()>>,
}

impl Sampler {
    /// A sampler firing every `interval_ticks` seconds. Zero is treated as one.
    pub fn new(interval_ticks: u32) -> Self {
        if interval_ticks == 0 {
            warn!("Sampler interval of 0 ticks, using 1");
        }
        Self {
            interval_ticks: i64::from(interval_ticks.max(1)),
            task: None,
        }
    }

    pub fn interval_ticks(&self) -> i64 {
        self.interval_ticks
    }

    /// Seconds since the Unix epoch, rounded to the nearest second.
    pub fn date_to_tick_number(date: DateTime<Utc>) -> i64 {
        (date.timestamp_millis() + 500).div_euclid(1000)
    }

    /// Start of the second a tick number stands for; `None` if out of range.
    pub fn tick_number_to_date(tick: i64) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(tick, 0)
    }

    /// Whether `tick` is due and has not been handled yet.
    pub fn is_due(&self, tick: i64, last_handled: Option<i64>) -> bool {
        is_due(self.interval_ticks, tick, last_handled)
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Spawn the polling task on the current tokio runtime.
    ///
    /// Does nothing if the sampler is already running.
    pub fn start<H: TickHandler>(&mut self, mut handler: H) {
        if self.is_running() {
            warn!("Sampler already running, ignoring start");
            return;
        }

        let mut schedule = Schedule::new(self.interval_ticks);
        debug!("Starting sampler every {} ticks", self.interval_ticks);

        self.task = Some(tokio::spawn(async move {
            let mut poll = tokio::time::interval(POLL_PERIOD);
            poll.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                poll.tick().await;
                schedule.poll(Utc::now(), &mut handler).await;
            }
        }));
    }

    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            debug!("Sampler stopped");
        }
    }
}

fn is_due(interval_ticks: i64, tick: i64, last_handled: Option<i64>) -> bool {
    tick.rem_euclid(interval_ticks) == 0 && last_handled != Some(tick)
}

/// Due-tick bookkeeping of a running sampler, fed one clock reading per poll.
struct Schedule {
    interval_ticks: i64,
    last_handled: Option<i64>,
}

impl Schedule {
    fn new(interval_ticks: i64) -> Self {
        Self {
            interval_ticks,
            last_handled: None,
        }
    }

    /// Invoke the handler if `now` falls on a due tick not handled yet.
    /// Returns whether it was invoked.
    async fn poll<H: TickHandler>(&mut self, now: DateTime<Utc>, handler: &mut H) -> bool {
        let tick = Sampler::date_to_tick_number(now);
        if !is_due(self.interval_ticks, tick, self.last_handled) {
            return false;
        }
        self.last_handled = Some(tick);

        if let Err(e) = handler.on_tick(tick).await {
            warn!("Tick handler failed at tick {}: {}", tick, e);
        }
        true
    }
}

impl Drop for Sampler {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_tick_number_rounds_to_seconds() {
        let date = DateTime::from_timestamp(1_700_000_000, 499_000_000).unwrap();
        assert_eq!(Sampler::date_to_tick_number(date), 1_700_000_000);

        let date = DateTime::from_timestamp(1_700_000_000, 500_000_000).unwrap();
        assert_eq!(Sampler::date_to_tick_number(date), 1_700_000_001);

        let back = Sampler::tick_number_to_date(1_700_000_001).unwrap();
        assert_eq!(back.timestamp(), 1_700_000_001);
    }

    #[test]
    fn test_is_due() {
        let sampler = Sampler::new(5);
        assert!(sampler.is_due(10, None));
        assert!(sampler.is_due(10, Some(5)));
        assert!(!sampler.is_due(10, Some(10)));
        assert!(!sampler.is_due(11, None));

        let zero = Sampler::new(0);
        assert_eq!(zero.interval_ticks(), 1);
    }

    struct Failing {
        ticks: Arc<Mutex<Vec<i64>>>,
    }

    impl TickHandler for Failing {
        async fn on_tick(&mut self, tick: i64) -> Result<(), TickError> {
            self.ticks.lock().unwrap().push(tick);
            Err("sampling failed".into())
        }
    }

    fn at(millis: i64) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(millis).unwrap()
    }

    #[tokio::test]
    async fn test_failing_handler_is_called_on_every_due_tick() {
        let ticks = Arc::new(Mutex::new(Vec::new()));
        let mut handler = Failing {
            ticks: Arc::clone(&ticks),
        };
        let mut schedule = Schedule::new(1);

        assert!(schedule.poll(at(100_000), &mut handler).await);
        // Same tick number on the following polls
        assert!(!schedule.poll(at(100_200), &mut handler).await);
        assert!(!schedule.poll(at(100_400), &mut handler).await);
        assert!(schedule.poll(at(100_600), &mut handler).await);
        assert!(schedule.poll(at(101_700), &mut handler).await);

        assert_eq!(*ticks.lock().unwrap(), vec![100, 101, 102]);
    }

    #[tokio::test]
    async fn test_schedule_skips_ticks_off_the_interval() {
        let ticks = Arc::new(Mutex::new(Vec::new()));
        let mut handler = Failing {
            ticks: Arc::clone(&ticks),
        };
        let mut schedule = Schedule::new(2);

        for millis in (100_000..=104_000).step_by(100) {
            schedule.poll(at(millis), &mut handler).await;
        }
        // A handler overrunning tick 106 makes the poller miss it entirely
        schedule.poll(at(107_000), &mut handler).await;
        schedule.poll(at(108_000), &mut handler).await;

        assert_eq!(*ticks.lock().unwrap(), vec![100, 102, 104, 108]);
    }

    #[tokio::test]
    async fn test_start_and_stop() {
        let mut sampler = Sampler::new(1);
        assert!(!sampler.is_running());

        sampler.start(Failing {
            ticks: Arc::new(Mutex::new(Vec::new())),
        });
        assert!(sampler.is_running());

        sampler.stop();
        assert!(!sampler.is_running());
        sampler.stop();
    }
}
