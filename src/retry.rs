//! Bounded retry for operations that may fail transiently (clone, pull)

use std::fmt::Display;
use std::time::Duration;

/// The last error of an operation that failed on every attempt
#[derive(Debug)]
pub struct Exhausted<E> {
    pub attempts: u32,
    pub last_error: E,
}

/// Run `operation` up to `max_attempts` times, sleeping `delay` between attempts
///
/// The closure receives the 1-based attempt number. A `max_attempts` of zero is
/// treated as one.
pub fn retry<T, E, F>(max_attempts: u32, delay: Duration, mut operation: F) -> Result<T, Exhausted<E>>
where
    E: Display,
    F: FnMut(u32) -> Result<T, E>,
{
    let max_attempts = max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match operation(attempt) {
            Ok(value) => return Ok(value),
            Err(e) if attempt >= max_attempts => {
                return Err(Exhausted {
                    attempts: attempt,
                    last_error: e,
                });
            }
            Err(e) => {
                tracing::warn!("Attempt {}/{} failed: {}", attempt, max_attempts, e);
                if !delay.is_zero() {
                    std::thread::sleep(delay);
                }
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_succeeds_first_try() {
        let mut calls = 0;
        let result: Result<u32, Exhausted<String>> = retry(3, Duration::ZERO, |_| {
            calls += 1;
            Ok(7)
        });
        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_recovers_after_transient_failure() {
        let result = retry(3, Duration::ZERO, |attempt| {
            if attempt < 3 {
                Err(format!("flaky {}", attempt))
            } else {
                Ok(attempt)
            }
        });
        assert_eq!(result.unwrap(), 3);
    }

    #[test]
    fn test_stops_after_max_attempts() {
        let mut calls = 0;
        let result: Result<(), _> = retry(3, Duration::ZERO, |attempt| {
            calls += 1;
            Err(format!("down {}", attempt))
        });
        let exhausted = result.unwrap_err();
        assert_eq!(calls, 3);
        assert_eq!(exhausted.attempts, 3);
        assert_eq!(exhausted.last_error, "down 3");
    }

    #[test]
    fn test_zero_attempts_runs_once() {
        let mut calls = 0;
        let _: Result<(), _> = retry(0, Duration::ZERO, |_| {
            calls += 1;
            Err("no")
        });
        assert_eq!(calls, 1);
    }
}
