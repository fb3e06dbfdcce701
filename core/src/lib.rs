//! # DogSpa Core
//!
//! Core traits for the DogSpa booking and order engine.
//!
//! Business logic is written as reducers split into two halves:
//!
//! - **decide**: a pure check of an action against the current state that
//!   either rejects it or produces a single event describing the change
//! - **apply**: an infallible, synchronous fold of that event into state
//!
//! Each action also names the lock keys it needs, so the runtime can
//! serialize conflicting work (same pet, same product) while unrelated
//! actions proceed in parallel.
//!
//! ## Example
//!
//! ```ignore
//! use dogspa_core::reducer::Reducer;
//!
//! impl Reducer for CounterReducer {
//!     type State = CounterState;
//!     type Action = CounterAction;
//!     type Event = CounterEvent;
//!     type Error = CounterError;
//!     type Environment = ();
//!     type Key = CounterId;
//!
//!     fn lock_keys(&self, action: &CounterAction) -> SmallVec<[CounterId; 4]> {
//!         smallvec![action.counter_id()]
//!     }
//!
//!     fn decide(&self, state: &CounterState, action: CounterAction, _env: &())
//!         -> Result<CounterEvent, CounterError> { ... }
//!
//!     fn apply(&self, state: &mut CounterState, event: &CounterEvent) { ... }
//! }
//! ```

// Re-export commonly used types
pub use chrono::{DateTime, Utc};
pub use serde::{Deserialize, Serialize};
pub use smallvec::{SmallVec, smallvec};

/// Reducer module - the core trait for business logic
pub mod reducer {
    use smallvec::SmallVec;
    use std::fmt::Debug;
    use std::hash::Hash;

    /// Business logic for one aggregate, split into decide and apply.
    ///
    /// # Type Parameters
    ///
    /// - `State`: The domain state this reducer operates on
    /// - `Action`: Requests to change state
    /// - `Event`: Facts produced by a successful decision
    /// - `Error`: Reasons a decision is rejected
    /// - `Environment`: Injected dependencies (clock, catalog, ...)
    /// - `Key`: Identity of the resources an action must hold exclusively
    pub trait Reducer {
        /// The state type this reducer operates on
        type State;

        /// The action type this reducer processes
        type Action;

        /// The event type produced by accepted actions
        type Event;

        /// The rejection type
        type Error;

        /// The environment type with injected dependencies
        type Environment;

        /// Lock key type
        type Key: Hash + Eq + Clone + Debug + Send + Sync;

        /// Keys that must be held while this action is decided and applied.
        ///
        /// Two actions sharing a key never run their decide/apply steps
        /// concurrently. Returning no keys means the action only relies on
        /// the state lock.
        fn lock_keys(&self, action: &Self::Action) -> SmallVec<[Self::Key; 4]>;

        /// Validate an action against the current state.
        ///
        /// Must be pure: no I/O, no mutation. Reads time and other
        /// dependencies only through `env`.
        ///
        /// # Errors
        ///
        /// Returns `Self::Error` when the action violates a business rule.
        fn decide(
            &self,
            state: &Self::State,
            action: Self::Action,
            env: &Self::Environment,
        ) -> Result<Self::Event, Self::Error>;

        /// Fold an accepted event into state.
        ///
        /// Infallible: every check belongs in [`Reducer::decide`].
        fn apply(&self, state: &mut Self::State, event: &Self::Event);

        /// Decide and apply in one step, for tests and single-threaded use.
        ///
        /// # Errors
        ///
        /// Returns the error from [`Reducer::decide`]; state is untouched in
        /// that case.
        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            env: &Self::Environment,
        ) -> Result<Self::Event, Self::Error> {
            let event = self.decide(state, action, env)?;
            self.apply(state, &event);
            Ok(event)
        }
    }
}

/// Environment module - dependency injection traits
///
/// All external dependencies are abstracted behind traits and injected
/// via the Environment parameter.
pub mod environment {
    use chrono::{DateTime, Utc};

    /// Clock trait - abstracts time operations for testability
    ///
    /// # Examples
    ///
    /// ```
    /// use dogspa_core::environment::{Clock, SystemClock};
    ///
    /// let clock = SystemClock;
    /// let before = clock.now();
    /// assert!(clock.now() >= before);
    /// ```
    pub trait Clock: Send + Sync {
        /// Get the current time
        fn now(&self) -> DateTime<Utc>;
    }

    /// Production clock backed by the system time.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct SystemClock;

    impl Clock for SystemClock {
        fn now(&self) -> DateTime<Utc> {
            Utc::now()
        }
    }

    impl<C: Clock + ?Sized> Clock for std::sync::Arc<C> {
        fn now(&self) -> DateTime<Utc> {
            (**self).now()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::reducer::Reducer;
    use super::{SmallVec, smallvec};

    #[derive(Debug, Default)]
    struct Tally {
        total: u32,
    }

    #[derive(Debug)]
    enum TallyAction {
        Add(u32),
    }

    #[derive(Debug, PartialEq, Eq)]
    struct Added(u32);

    struct TallyReducer;

    impl Reducer for TallyReducer {
        type State = Tally;
        type Action = TallyAction;
        type Event = Added;
        type Error = String;
        type Environment = ();
        type Key = u8;

        fn lock_keys(&self, _action: &TallyAction) -> SmallVec<[u8; 4]> {
            smallvec![0]
        }

        fn decide(&self, state: &Tally, action: TallyAction, (): &()) -> Result<Added, String> {
            let TallyAction::Add(n) = action;
            if n == 0 {
                return Err("nothing to add".to_string());
            }
            state
                .total
                .checked_add(n)
                .map(|_| Added(n))
                .ok_or_else(|| "overflow".to_string())
        }

        fn apply(&self, state: &mut Tally, event: &Added) {
            state.total += event.0;
        }
    }

    #[test]
    fn reduce_applies_accepted_event() {
        let mut state = Tally::default();
        let event = TallyReducer.reduce(&mut state, TallyAction::Add(3), &());
        assert_eq!(event, Ok(Added(3)));
        assert_eq!(state.total, 3);
    }

    #[test]
    fn reduce_leaves_state_untouched_on_rejection() {
        let mut state = Tally { total: u32::MAX };
        assert!(TallyReducer.reduce(&mut state, TallyAction::Add(1), &()).is_err());
        assert!(TallyReducer.reduce(&mut state, TallyAction::Add(0), &()).is_err());
        assert_eq!(state.total, u32::MAX);
    }
}
