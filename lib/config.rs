// Engine tuning knobs, read once from environment variables
use once_cell::sync::Lazy;
use std::env;
use std::time::Duration;

// Environment variables for configuration
// BUFSOCK_BUSY_SLEEP_MS: send-loop sleep after an active iteration (default: 10)
// BUFSOCK_IDLE_SLEEP_MS: send-loop sleep when the queue was empty (default: 100)
// BUFSOCK_RECV_POLL_MS: receive-loop fixed sleep (default: 100)
// BUFSOCK_READ_CHUNK: receive buffer size per read in bytes (default: 5000)
// BUFSOCK_READ_TIMEOUT_MS: socket read timeout, 0 = fully blocking (default: 100)

const DEFAULT_BUSY_SLEEP_MS: u64 = 10;
const DEFAULT_IDLE_SLEEP_MS: u64 = 100;
const DEFAULT_RECV_POLL_MS: u64 = 100;
const DEFAULT_READ_CHUNK: usize = 5000;
const DEFAULT_READ_TIMEOUT_MS: u64 = 100;

/// Worker cadence and buffer sizing for one [`crate::BufferedSocket`].
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Send-loop sleep after an iteration that attempted a transmission.
    pub busy_sleep: Duration,
    /// Send-loop sleep when there was nothing to do. Reconnect retries run
    /// on this cadence as well (fixed interval, no backoff).
    pub idle_sleep: Duration,
    /// Receive-loop sleep, applied every iteration regardless of work done.
    pub recv_poll: Duration,
    /// Capacity of one receive chunk.
    pub read_chunk: usize,
    /// Socket read timeout; `None` leaves the socket fully blocking.
    pub read_timeout: Option<Duration>,
}

impl EngineConfig {
    pub fn from_env() -> Self {
        let timeout_ms = env_u64("BUFSOCK_READ_TIMEOUT_MS", DEFAULT_READ_TIMEOUT_MS);

        EngineConfig {
            busy_sleep: Duration::from_millis(env_u64(
                "BUFSOCK_BUSY_SLEEP_MS",
                DEFAULT_BUSY_SLEEP_MS,
            )),
            idle_sleep: Duration::from_millis(env_u64(
                "BUFSOCK_IDLE_SLEEP_MS",
                DEFAULT_IDLE_SLEEP_MS,
            )),
            recv_poll: Duration::from_millis(env_u64(
                "BUFSOCK_RECV_POLL_MS",
                DEFAULT_RECV_POLL_MS,
            )),
            read_chunk: env::var("BUFSOCK_READ_CHUNK")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_READ_CHUNK),
            read_timeout: match timeout_ms {
                0 => None,
                ms => Some(Duration::from_millis(ms)),
            },
        }
    }
}

fn env_u64(name: &str, default: u64) -> u64 {
    env::var(name)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

// Read once per process; explicit configs override per session
static DEFAULT_CONFIG: Lazy<EngineConfig> = Lazy::new(EngineConfig::from_env);

impl Default for EngineConfig {
    fn default() -> Self {
        DEFAULT_CONFIG.clone()
    }
}
