//! # DogSpa Runtime
//!
//! Runtime that coordinates reducer execution for the DogSpa engine.
//!
//! ## Core Components
//!
//! - **Store**: owns an aggregate's state and runs actions against it
//! - **`KeyedLocks`**: per-key serialization with a fixed acquisition order
//! - **Metrics**: action outcomes and lock timeouts per store
//!
//! ## Execution model
//!
//! `Store::send` takes the action's lock keys, decides under a shared state
//! guard, then applies the event under a short exclusive guard. Every wait
//! shares one deadline; when it passes the caller gets
//! [`StoreError::Timeout`](error::StoreError::Timeout) and nothing was
//! changed. Apply has no await points, so a dropped caller either changed
//! nothing or committed fully.
//!
//! ## Example
//!
//! ```ignore
//! use dogspa_runtime::Store;
//!
//! let store = Store::new(initial_state, my_reducer, environment);
//!
//! let event = store.send(Action::DoSomething).await?;
//! let value = store.state(|s| s.some_field).await;
//! ```

use dogspa_core::reducer::Reducer;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// Keyed striped locks
pub mod locks;

/// Prometheus metrics for observability
pub mod metrics;

pub use locks::{KeyGuard, KeyedLocks};
pub use store::Store;

/// Error types for the Store runtime
pub mod error {
    use std::time::Duration;
    use thiserror::Error;

    /// Errors raised by the runtime itself, independent of business rules.
    #[derive(Error, Debug, Clone, PartialEq, Eq)]
    pub enum StoreError {
        /// A key or state lock could not be taken before the deadline.
        ///
        /// No state was changed; the caller may retry.
        #[error("Timed out after {waited:?} waiting for exclusive access")]
        Timeout {
            /// Time spent waiting before giving up
            waited: Duration,
        },
    }
}

pub use error::StoreError;

/// Store configuration
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Name used in logs and metric labels
    pub name: &'static str,
    /// Upper bound on lock waits for a single action
    pub lock_timeout: Duration,
    /// Number of lock stripes
    pub lock_stripes: usize,
}

impl StoreConfig {
    /// Config with the given name and default limits.
    #[must_use]
    pub fn named(name: &'static str) -> Self {
        Self {
            name,
            ..Self::default()
        }
    }

    /// Set the lock timeout.
    #[must_use]
    pub const fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            name: "store",
            lock_timeout: Duration::from_secs(2),
            lock_stripes: locks::DEFAULT_STRIPES,
        }
    }
}

/// Store module - the runtime for reducers
pub mod store {
    use super::{Arc, KeyedLocks, Reducer, RwLock, StoreConfig, StoreError};
    use crate::metrics::StoreMetrics;
    use std::fmt::Debug;
    use tokio::time::Instant;

    /// The Store - runtime coordinator for a reducer
    ///
    /// The Store manages:
    /// 1. State (behind `RwLock` for concurrent access)
    /// 2. Reducer (business logic)
    /// 3. Environment (injected dependencies)
    /// 4. Keyed locks (serialization of conflicting actions)
    pub struct Store<R>
    where
        R: Reducer,
    {
        state: Arc<RwLock<R::State>>,
        reducer: R,
        environment: R::Environment,
        locks: KeyedLocks,
        config: StoreConfig,
    }

    impl<R> Store<R>
    where
        R: Reducer + Send + Sync,
        R::State: Send + Sync,
        R::Action: Debug + Send,
        R::Event: Send,
        R::Environment: Send + Sync,
        R::Error: From<StoreError>,
    {
        /// Create a new store with default configuration.
        #[must_use]
        pub fn new(initial_state: R::State, reducer: R, environment: R::Environment) -> Self {
            Self::with_config(initial_state, reducer, environment, StoreConfig::default())
        }

        /// Create a new store with custom configuration.
        #[must_use]
        pub fn with_config(
            initial_state: R::State,
            reducer: R,
            environment: R::Environment,
            config: StoreConfig,
        ) -> Self {
            Self {
                state: Arc::new(RwLock::new(initial_state)),
                reducer,
                environment,
                locks: KeyedLocks::new(config.lock_stripes),
                config,
            }
        }

        /// Store configuration
        #[must_use]
        pub const fn config(&self) -> &StoreConfig {
            &self.config
        }

        /// Injected environment
        #[must_use]
        pub const fn environment(&self) -> &R::Environment {
            &self.environment
        }

        /// Send an action through the reducer and commit its event.
        ///
        /// # Errors
        ///
        /// - The reducer's rejection, with state untouched
        /// - `StoreError::Timeout` (converted into `R::Error`) when a lock
        ///   could not be taken within the configured timeout
        #[tracing::instrument(skip(self), fields(store = self.config.name))]
        pub async fn send(&self, action: R::Action) -> Result<R::Event, R::Error> {
            let started = Instant::now();
            let deadline = started + self.config.lock_timeout;
            let name = self.config.name;

            let keys = self.reducer.lock_keys(&action);
            let _keys = self.locks.acquire(&keys, deadline).await.map_err(|e| {
                StoreMetrics::record_timeout(name);
                R::Error::from(e)
            })?;

            let decided = {
                let state = self.read_before(deadline, started).await?;
                self.reducer.decide(&state, action, &self.environment)
            };

            let event = match decided {
                Ok(event) => event,
                Err(rejection) => {
                    StoreMetrics::record_rejected(name);
                    tracing::debug!("Action rejected");
                    return Err(rejection);
                }
            };

            let mut state = match tokio::time::timeout_at(deadline, self.state.write()).await {
                Ok(guard) => guard,
                Err(_) => return Err(self.timed_out(started)),
            };
            self.reducer.apply(&mut state, &event);
            drop(state);

            StoreMetrics::record_accepted(name, started.elapsed());
            Ok(event)
        }

        /// Read a projection of the current state.
        ///
        /// Never waits on key locks; sees the last committed event.
        pub async fn state<F, T>(&self, f: F) -> T
        where
            F: FnOnce(&R::State) -> T,
        {
            let state = self.state.read().await;
            f(&state)
        }

        async fn read_before(
            &self,
            deadline: Instant,
            started: Instant,
        ) -> Result<tokio::sync::RwLockReadGuard<'_, R::State>, R::Error> {
            tokio::time::timeout_at(deadline, self.state.read())
                .await
                .map_err(|_| self.timed_out(started))
        }

        fn timed_out(&self, started: Instant) -> R::Error {
            let waited = started.elapsed();
            StoreMetrics::record_timeout(self.config.name);
            tracing::warn!(store = self.config.name, ?waited, "Timed out waiting for state lock");
            R::Error::from(StoreError::Timeout { waited })
        }
    }

}
