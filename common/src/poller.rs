//! The polling loop: read the pressure node, append the reading, wait, repeat.
//!
//! The loop runs until the [`ShutdownSignal`] fires. It checks the signal at
//! the top of every tick and while waiting for the next one. Read failures
//! skip the tick, write failures drop the reading. Neither changes state and
//! neither backs off.

use std::time::Duration;

use pressure_logger_model::Reading;

use crate::logfile::PressureLog;
use crate::session::{read_measurement, Session, SessionGuard};
use crate::{Config, ShutdownSignal};

/// What happened during one tick.
#[derive(Clone, Debug, PartialEq)]
pub enum Tick {
    /// The reading was appended; holds the written line.
    Logged(String),
    /// The read failed, nothing was written.
    ReadFailed,
    /// The read succeeded but the line could not be written.
    WriteFailed,
}

/// Counters of a finished run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PollStats {
    pub ticks: u64,
    pub logged: u64,
    pub read_failures: u64,
    pub write_failures: u64,
}

impl PollStats {
    fn record(&mut self, tick: &Tick) {
        self.ticks += 1;
        match tick {
            Tick::Logged(_) => self.logged += 1,
            Tick::ReadFailed => self.read_failures += 1,
            Tick::WriteFailed => self.write_failures += 1,
        }
    }
}

pub struct Poller<S: Session> {
    session: SessionGuard<S>,
    node_id: String,
    log: PressureLog,
    interval: Duration,
}

impl<S: Session> Poller<S> {
    pub fn new(session: SessionGuard<S>, config: &Config) -> Self {
        Self {
            session,
            node_id: config.node_id.clone(),
            log: PressureLog::new(config.log_file.clone()),
            interval: config.interval,
        }
    }

    /// Reads once and appends the reading if there is one.
    pub fn tick(&self) -> Tick {
        let value = match read_measurement(&*self.session, &self.node_id) {
            Ok(value) => value,
            Err(e) => {
                log::error!("{e}");
                return Tick::ReadFailed;
            }
        };

        match self.log.append_reading(&Reading::now(value)) {
            Ok(line) => Tick::Logged(line),
            Err(e) => {
                log::error!("{e}, reading dropped");
                Tick::WriteFailed
            }
        }
    }

    /// Polls until `shutdown` fires, then releases the session.
    pub fn run(mut self, shutdown: &ShutdownSignal) -> PollStats {
        let mut stats = PollStats::default();

        log::info!(
            "Polling {} every {:?} into {}",
            self.node_id,
            self.interval,
            self.log.path().display()
        );

        while !shutdown.is_triggered() {
            let tick = self.tick();
            stats.record(&tick);

            if shutdown.wait_timeout(self.interval) {
                break;
            }
        }

        log::debug!("Poller stopped after {} ticks", stats.ticks);
        self.session.close();
        stats
    }
}
