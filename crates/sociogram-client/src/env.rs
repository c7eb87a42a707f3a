//! Environment abstraction for deterministic testing.
//!
//! Decouples client logic from system resources (wall clock, sleeping,
//! randomness). Production uses [`SystemEnv`]; the simulation harness supplies
//! a virtual clock and seeded RNG so the same client code runs in
//! reproducible tests.

use std::time::Duration;

/// Abstract environment providing time, randomness, and async sleep.
///
/// # Invariants
///
/// Implementations MUST guarantee:
///
/// - `wall_clock_nanos()` never goes backwards within one execution
/// - `random_bytes()` uses cryptographically secure entropy in production
pub trait Environment: Clone + Send + Sync + 'static {
    /// Current wall-clock time as nanoseconds since the Unix epoch.
    ///
    /// Used to stamp optimistic messages with the same resolution the
    /// contract platform uses for block timestamps.
    fn wall_clock_nanos(&self) -> u64;

    /// Sleeps for the specified duration.
    ///
    /// Only the connection race uses this; protocol logic never sleeps.
    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send;

    /// Fills the provided buffer with random bytes.
    fn random_bytes(&self, buffer: &mut [u8]);

    /// Generates a random 32-byte seed (key generation).
    fn random_seed(&self) -> [u8; 32] {
        let mut seed = [0u8; 32];
        self.random_bytes(&mut seed);
        seed
    }
}

/// Production environment using system time and OS randomness.
#[derive(Debug, Clone, Default)]
pub struct SystemEnv;

impl SystemEnv {
    /// Create a new system environment.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Environment for SystemEnv {
    #[allow(clippy::disallowed_methods)]
    fn wall_clock_nanos(&self) -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map_or(0, |elapsed| elapsed.as_nanos() as u64)
    }

    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send {
        tokio::time::sleep(duration)
    }

    #[allow(clippy::expect_used)]
    fn random_bytes(&self, buffer: &mut [u8]) {
        getrandom::fill(buffer)
            .expect("invariant: OS RNG failure is unrecoverable - keys cannot be generated");
    }
}
