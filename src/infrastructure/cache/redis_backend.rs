//! Redis-backed cache backend.

use super::backend::{CacheBackend, CacheError, CacheResult};
use async_trait::async_trait;
use redis::{AsyncCommands, Client, aio::ConnectionManager};
use std::fmt::Display;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::OnceCell;
use tokio_retry::Retry;
use tokio_retry::strategy::{ExponentialBackoff, jitter};
use tracing::{debug, info, warn};

/// Deadline for one connection attempt made off the request path.
const CONNECT_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(5);

/// Upper bound on the pause between background connection attempts.
const MAX_RECONNECT_DELAY: Duration = Duration::from_secs(30);

/// A connection handle that is filled in by a background task.
///
/// Requests only ever read the slot. At most one connect loop runs at a
/// time; it retries with jittered exponential backoff until it succeeds or
/// the slot is dropped.
pub(crate) struct ConnectionSlot<C> {
    connection: Arc<OnceCell<C>>,
    connecting: Arc<AtomicBool>,
}

impl<C: Clone + Send + Sync + 'static> ConnectionSlot<C> {
    pub(crate) fn new() -> Self {
        Self {
            connection: Arc::new(OnceCell::new()),
            connecting: Arc::new(AtomicBool::new(false)),
        }
    }

    pub(crate) fn get(&self) -> Option<C> {
        self.connection.get().cloned()
    }

    pub(crate) fn is_connected(&self) -> bool {
        self.connection.initialized()
    }

    /// Stores a connection made elsewhere. A connection already in place wins.
    pub(crate) fn fill(&self, connection: C) -> C {
        match self.connection.set(connection.clone()) {
            Ok(()) => connection,
            Err(_) => self.get().unwrap_or(connection),
        }
    }

    /// Starts the background connect loop.
    ///
    /// Returns `false` without spawning when already connected or when a
    /// loop is running.
    pub(crate) fn spawn_connect<F, Fut, E>(&self, mut connect: F) -> bool
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = Result<C, E>> + Send + 'static,
        E: Display + Send + 'static,
    {
        if self.is_connected() || self.connecting.swap(true, Ordering::AcqRel) {
            return false;
        }

        let slot: Weak<OnceCell<C>> = Arc::downgrade(&self.connection);
        let connecting = self.connecting.clone();

        tokio::spawn(async move {
            let strategy = ExponentialBackoff::from_millis(2)
                .factor(50)
                .max_delay(MAX_RECONNECT_DELAY)
                .map(jitter);

            let result = Retry::start(strategy, || {
                let alive = slot.strong_count() > 0;
                let attempt = alive.then(&mut connect);
                async move {
                    let Some(attempt) = attempt else {
                        return Ok(None);
                    };
                    match attempt.await {
                        Ok(connection) => Ok(Some(connection)),
                        Err(e) => {
                            warn!(error = %e, "Cache connection attempt failed, retrying");
                            Err(e)
                        }
                    }
                }
            })
            .await;

            match (result, slot.upgrade()) {
                (Ok(Some(connection)), Some(slot)) => {
                    if slot.set(connection).is_ok() {
                        info!("Cache connection established in background");
                    }
                }
                (Ok(_), _) => debug!("Cache backend dropped, connect loop stopped"),
                (Err(e), _) => warn!(error = %e, "Cache connect loop gave up"),
            }
            connecting.store(false, Ordering::Release);
        });

        true
    }
}

/// Redis backend sharing one multiplexed connection across all requests.
///
/// Construction is two-phase: [`RedisBackend::configure`] only parses the
/// URL, and [`RedisBackend::connect`] establishes the connection. While no
/// connection exists, operations fail immediately with
/// [`CacheError::Connection`] and a background task keeps trying to connect,
/// so a slow handshake never runs inside a request deadline.
pub struct RedisBackend {
    client: Client,
    connection: ConnectionSlot<ConnectionManager>,
}

impl RedisBackend {
    /// Parses `redis_url` without performing any I/O.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Connection`] if the URL is invalid.
    pub fn configure(redis_url: &str) -> CacheResult<Self> {
        let client = Client::open(redis_url).map_err(|e| {
            CacheError::Connection(format!("Failed to create Redis client: {}", e))
        })?;

        Ok(Self {
            client,
            connection: ConnectionSlot::new(),
        })
    }

    /// Returns the shared connection, establishing it if needed.
    ///
    /// Idempotent: once connected, later calls return a clone of the same
    /// handle. `ConnectionManager` reconnects transparently after drops.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Connection`] if the connection cannot be established.
    pub async fn connect(&self) -> CacheResult<ConnectionManager> {
        if let Some(connection) = self.connection.get() {
            return Ok(connection);
        }

        let manager = open_connection(self.client.clone()).await?;
        info!("Connected to Redis");
        Ok(self.connection.fill(manager))
    }

    /// Keeps trying to connect in the background until it succeeds.
    pub fn reconnect_in_background(&self) {
        let client = self.client.clone();
        if self
            .connection
            .spawn_connect(move || open_connection(client.clone()))
        {
            debug!("Started background Redis connect loop");
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_connected()
    }

    fn connection(&self) -> CacheResult<ConnectionManager> {
        match self.connection.get() {
            Some(connection) => Ok(connection),
            None => {
                self.reconnect_in_background();
                Err(CacheError::Connection(
                    "Redis not connected, reconnecting in background".to_string(),
                ))
            }
        }
    }
}

async fn open_connection(client: Client) -> CacheResult<ConnectionManager> {
    match tokio::time::timeout(CONNECT_ATTEMPT_TIMEOUT, ConnectionManager::new(client)).await {
        Ok(Ok(manager)) => Ok(manager),
        Ok(Err(e)) => Err(CacheError::Connection(format!(
            "Failed to connect to Redis: {}",
            e
        ))),
        Err(_) => Err(CacheError::Connection(format!(
            "Redis connect timed out after {}s",
            CONNECT_ATTEMPT_TIMEOUT.as_secs()
        ))),
    }
}

fn operation_error(op: &str, e: redis::RedisError) -> CacheError {
    CacheError::Operation(format!("Redis {} failed: {}", op, e))
}

#[async_trait]
impl CacheBackend for RedisBackend {
    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        let mut conn = self.connection()?;
        conn.get::<_, Option<String>>(key)
            .await
            .map_err(|e| operation_error("GET", e))
    }

    async fn set_with_expiry(&self, key: &str, value: &str, ttl_seconds: u64) -> CacheResult<()> {
        let mut conn = self.connection()?;
        conn.set_ex::<_, _, ()>(key, value, ttl_seconds)
            .await
            .map_err(|e| operation_error("SETEX", e))
    }

    async fn delete(&self, key: &str) -> CacheResult<()> {
        let mut conn = self.connection()?;
        let deleted = conn
            .del::<_, i32>(key)
            .await
            .map_err(|e| operation_error("DEL", e))?;

        if deleted > 0 {
            debug!(key, "Cache key deleted");
        }
        Ok(())
    }

    async fn ping(&self) -> CacheResult<()> {
        let mut conn = self.connection()?;
        conn.ping::<()>()
            .await
            .map_err(|e| operation_error("PING", e))
    }
}
