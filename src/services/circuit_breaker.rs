use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};

/// Injectable time source so breaker transitions are deterministically testable without
/// sleeping real wall-clock time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Closed,
    Open,
    HalfOpen,
}

#[derive(Debug)]
struct ProviderBreaker {
    state: State,
    window: VecDeque<bool>,
    last_failure_time: Option<DateTime<Utc>>,
}

impl ProviderBreaker {
    fn new() -> Self {
        Self { state: State::Closed, window: VecDeque::new(), last_failure_time: None }
    }
}

#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    pub window_size: usize,
    pub failure_threshold: usize,
    pub cooldown: chrono::Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self { window_size: 10, failure_threshold: 5, cooldown: chrono::Duration::milliseconds(60_000) }
    }
}

/// Process-wide, per-provider sliding-window circuit breaker. Protected by a single mutex
/// covering the state map; the breaker is per-worker and does not coordinate across replicas.
pub struct CircuitBreaker {
    config: CircuitBreakerConfig,
    clock: Arc<dyn Clock>,
    providers: Mutex<HashMap<String, ProviderBreaker>>,
}

impl CircuitBreaker {
    pub fn new(config: CircuitBreakerConfig, clock: Arc<dyn Clock>) -> Self {
        Self { config, clock, providers: Mutex::new(HashMap::new()) }
    }

    pub fn with_system_clock(config: CircuitBreakerConfig) -> Self {
        Self::new(config, Arc::new(SystemClock))
    }

    /// Evaluates and, where the cooldown has elapsed on an open breaker, performs the
    /// open-to-half-open transition before returning.
    pub fn can_call(&self, provider_slug: &str) -> bool {
        let mut providers = self.providers.lock().expect("circuit breaker mutex poisoned");
        let breaker = providers.entry(provider_slug.to_string()).or_insert_with(ProviderBreaker::new);

        match breaker.state {
            State::Closed | State::HalfOpen => true,
            State::Open => {
                let now = self.clock.now();
                let elapsed = breaker
                    .last_failure_time
                    .map(|last| now - last)
                    .expect("an open breaker always has a recorded failure time");

                if elapsed >= self.config.cooldown {
                    breaker.state = State::HalfOpen;
                    true
                } else {
                    false
                }
            }
        }
    }

    pub fn record_success(&self, provider_slug: &str) {
        let mut providers = self.providers.lock().expect("circuit breaker mutex poisoned");
        let breaker = providers.entry(provider_slug.to_string()).or_insert_with(ProviderBreaker::new);

        match breaker.state {
            State::Closed => {
                breaker.window.push_back(true);
                while breaker.window.len() > self.config.window_size {
                    breaker.window.pop_front();
                }
            }
            State::HalfOpen => {
                breaker.state = State::Closed;
                breaker.window.clear();
            }
            State::Open => {
                // Unreachable in practice: can_call() must transition Open to HalfOpen before a
                // caller can obtain a successful outcome to report.
            }
        }
    }

    pub fn record_failure(&self, provider_slug: &str) {
        let mut providers = self.providers.lock().expect("circuit breaker mutex poisoned");
        let breaker = providers.entry(provider_slug.to_string()).or_insert_with(ProviderBreaker::new);
        let now = self.clock.now();
        breaker.last_failure_time = Some(now);

        match breaker.state {
            State::Closed => {
                breaker.window.push_back(false);
                while breaker.window.len() > self.config.window_size {
                    breaker.window.pop_front();
                }

                let failure_count = breaker.window.iter().filter(|success| !**success).count();
                if failure_count >= self.config.failure_threshold {
                    breaker.state = State::Open;
                }
            }
            State::HalfOpen => {
                breaker.state = State::Open;
            }
            State::Open => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex as StdMutex;

    struct FakeClock {
        now: StdMutex<DateTime<Utc>>,
    }

    impl FakeClock {
        fn new() -> Arc<Self> {
            Arc::new(Self { now: StdMutex::new(Utc::now()) })
        }

        fn advance(&self, duration: chrono::Duration) {
            let mut now = self.now.lock().unwrap();
            *now += duration;
        }
    }

    impl Clock for FakeClock {
        fn now(&self) -> DateTime<Utc> {
            *self.now.lock().unwrap()
        }
    }

    #[test]
    fn opens_after_threshold_failures_and_recovers_through_half_open() {
        let clock = FakeClock::new();
        let config = CircuitBreakerConfig {
            window_size: 5,
            failure_threshold: 2,
            cooldown: chrono::Duration::milliseconds(1000),
        };
        let breaker = CircuitBreaker::new(config, clock.clone());

        assert!(breaker.can_call("apollo"));
        breaker.record_failure("apollo");
        assert!(breaker.can_call("apollo"));
        breaker.record_failure("apollo");

        assert!(!breaker.can_call("apollo"));

        clock.advance(chrono::Duration::milliseconds(1001));
        assert!(breaker.can_call("apollo"));

        breaker.record_success("apollo");
        assert!(breaker.can_call("apollo"));
    }

    #[test]
    fn half_open_failure_reopens_with_fresh_cooldown() {
        let clock = FakeClock::new();
        let config = CircuitBreakerConfig {
            window_size: 5,
            failure_threshold: 1,
            cooldown: chrono::Duration::milliseconds(500),
        };
        let breaker = CircuitBreaker::new(config, clock.clone());

        breaker.record_failure("hunter");
        assert!(!breaker.can_call("hunter"));

        clock.advance(chrono::Duration::milliseconds(501));
        assert!(breaker.can_call("hunter"));

        breaker.record_failure("hunter");
        assert!(!breaker.can_call("hunter"));

        clock.advance(chrono::Duration::milliseconds(501));
        assert!(breaker.can_call("hunter"));
    }

    #[test]
    fn providers_are_tracked_independently() {
        let clock = FakeClock::new();
        let config = CircuitBreakerConfig {
            window_size: 5,
            failure_threshold: 1,
            cooldown: chrono::Duration::milliseconds(1000),
        };
        let breaker = CircuitBreaker::new(config, clock);

        breaker.record_failure("apollo");
        assert!(!breaker.can_call("apollo"));
        assert!(breaker.can_call("hunter"));
    }
}
