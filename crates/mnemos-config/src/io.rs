//! Bounded-retry file access.
//!
//! Every read and write of a configuration file, for every configuration
//! type, runs under one process-wide mutex. A failed attempt releases the
//! mutex, sleeps for `base_delay * attempt` and tries again until the policy
//! is exhausted.

use std::fs;
use std::io;
use std::path::Path;
use std::thread;
use std::time::Duration;

use mnemos_core::{ConfigError, ConfigResult};
use parking_lot::Mutex;

static IO_GATE: Mutex<()> = parking_lot::const_mutex(());

/// Retry budget for file access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_millis(25),
        }
    }
}

impl RetryPolicy {
    /// Create a policy. `max_attempts` is clamped to at least one.
    #[must_use]
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    /// Total number of attempts.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Sleep after the given failed attempt (1-based).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.base_delay * attempt
    }

    fn run<R>(&self, path: &Path, mut op: impl FnMut() -> io::Result<R>) -> ConfigResult<R> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let result = {
                let _gate = IO_GATE.lock();
                op()
            };
            match result {
                Ok(value) => return Ok(value),
                Err(e) if attempt >= self.max_attempts => {
                    return Err(ConfigError::io(path, attempt, e));
                }
                Err(e) => {
                    let delay = self.delay_after(attempt);
                    tracing::debug!(
                        path = %path.display(),
                        attempt,
                        error = %e,
                        delay_ms = delay.as_millis(),
                        "file access failed, retrying"
                    );
                    thread::sleep(delay);
                }
            }
        }
    }
}

/// Read a whole file.
pub(crate) fn read_to_string(path: &Path, policy: &RetryPolicy) -> ConfigResult<String> {
    policy.run(path, || fs::read_to_string(path))
}

/// Overwrite a file, creating its directory first when `create_dir` is set.
pub(crate) fn write(
    path: &Path,
    contents: &str,
    create_dir: bool,
    policy: &RetryPolicy,
) -> ConfigResult<()> {
    policy.run(path, || {
        if create_dir {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, contents)
    })
}
