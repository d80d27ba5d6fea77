//! Exclusive access to an evaluation session.
//!
//! The [`Broker`] owns one [`EvaluationSession`] and lets at most one caller
//! use it at a time. [`Broker::try_acquire`] never waits. Callers that choose
//! to wait use [`Broker::acquire_timeout`] and are parked in arrival order.
//!
//! A granted [`SessionHandle`] borrows the broker. Dropping it, or calling
//! [`SessionHandle::release`], frees the broker on every exit path. The
//! release is fair: a parked waiter receives the session directly, so a
//! concurrent `try_acquire` cannot overtake it.

use std::{
    ops::{Deref, DerefMut},
    sync::OnceLock,
    time::Duration,
};

use log::{debug, info, trace, warn};
use parking_lot::{Mutex, MutexGuard};

use crate::{
    config::SessionConfig,
    session::{
        EvaluatedContext, EvaluationRequest, EvaluationSession, ScriptSession, SessionError,
        SlotValue,
    },
};

/// The session together with the mapping most recently read from it.
#[derive(Debug)]
struct SessionState<S: EvaluationSession> {
    session: S,
    last_read: EvaluatedContext<S::Value>,
}

/// A guard that unlocks fairly when dropped.
#[derive(Debug)]
struct FairGuard<'b, T>(Option<MutexGuard<'b, T>>);

impl<T> Deref for FairGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        match &self.0 {
            Some(guard) => guard,
            None => unreachable!("guard is only taken on drop"),
        }
    }
}

impl<T> DerefMut for FairGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        match &mut self.0 {
            Some(guard) => guard,
            None => unreachable!("guard is only taken on drop"),
        }
    }
}

impl<T> Drop for FairGuard<'_, T> {
    fn drop(&mut self) {
        if let Some(guard) = self.0.take() {
            MutexGuard::unlock_fair(guard);
            trace!("Broker released");
        }
    }
}

/// Grants exclusive access to an evaluation session.
#[derive(Debug)]
pub struct Broker<S: EvaluationSession> {
    state: Mutex<SessionState<S>>,
    config: SessionConfig,
    request: EvaluationRequest,
}

impl<S: EvaluationSession> Broker<S> {
    pub fn new(session: S, config: SessionConfig) -> Self {
        Self {
            state: Mutex::new(SessionState {
                session,
                last_read: EvaluatedContext::default(),
            }),
            request: EvaluationRequest::new(&config),
            config,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Returns `true` while a handle is out.
    pub fn is_held(&self) -> bool {
        self.state.is_locked()
    }

    /// Takes the session if it is free, without waiting.
    ///
    /// Returns `None` when another caller holds the session. That is the
    /// normal "busy" outcome, not an error.
    pub fn try_acquire(&self) -> Option<SessionHandle<'_, S>> {
        let Some(guard) = self.state.try_lock() else {
            debug!("Broker busy");
            return None;
        };
        Some(self.handle(guard))
    }

    /// Waits up to `timeout` for the session, in arrival order.
    pub fn acquire_timeout(&self, timeout: Duration) -> Option<SessionHandle<'_, S>> {
        let Some(guard) = self.state.try_lock_for(timeout) else {
            debug!(timeout:?; "Broker still busy after timeout");
            return None;
        };
        Some(self.handle(guard))
    }

    fn handle<'b>(&'b self, guard: MutexGuard<'b, SessionState<S>>) -> SessionHandle<'b, S> {
        trace!("Broker acquired");
        SessionHandle {
            state: FairGuard(Some(guard)),
            config: &self.config,
            request: &self.request,
        }
    }
}

impl Broker<ScriptSession> {
    /// The process-wide broker over the in-process interpreter.
    pub fn shared() -> &'static Broker<ScriptSession> {
        static SHARED: OnceLock<Broker<ScriptSession>> = OnceLock::new();
        SHARED.get_or_init(|| {
            info!("Starting shared evaluation session");
            Broker::new(ScriptSession::new(), SessionConfig::default())
        })
    }
}

/// Exclusive access to a broker's session.
///
/// The handle is neither `Send` nor `Clone`: it stands for one caller on one
/// thread.
#[derive(Debug)]
pub struct SessionHandle<'b, S: EvaluationSession> {
    state: FairGuard<'b, SessionState<S>>,
    config: &'b SessionConfig,
    request: &'b EvaluationRequest,
}

impl<S: EvaluationSession> SessionHandle<'_, S> {
    /// Stores statement lines in the context slot.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] if the session rejects the write.
    pub fn write_context(&mut self, lines: &[String]) -> Result<(), SessionError> {
        debug!(lines = lines.len(); "Writing context");
        self.state
            .session
            .write_lines(self.config.context_slot(), lines)
    }

    /// Reads the evaluated names and values, paired by position.
    ///
    /// Pairs stop at the shorter of the two slots. If either slot is missing
    /// or holds the wrong kind of data the result is empty.
    pub fn read_context(&mut self) -> EvaluatedContext<S::Value> {
        let session = &self.state.session;
        let names = match session.read(self.config.names_slot()) {
            Some(SlotValue::Strings(names)) => names,
            _ => return EvaluatedContext::default(),
        };
        let values = match session.read(self.config.values_slot()) {
            Some(SlotValue::Values(values)) => values,
            _ => return EvaluatedContext::default(),
        };

        let context: EvaluatedContext<S::Value> = names.into_iter().zip(values).collect();
        trace!(context:?; "Read context");
        self.state.last_read = context.clone();
        context
    }

    /// Writes `lines`, evaluates them and reads back the result.
    ///
    /// An evaluation failure is logged and answered with the mapping of the
    /// last successful read, which is empty if there was none.
    ///
    /// # Errors
    ///
    /// Only a failed write is returned as an error.
    pub fn evaluate_context(
        &mut self,
        lines: &[String],
    ) -> Result<EvaluatedContext<S::Value>, SessionError> {
        self.write_context(lines)?;

        if let Err(err) = self.state.session.submit(self.request) {
            warn!(err:%; "Context evaluation failed, keeping previous values");
            return Ok(self.state.last_read.clone());
        }

        let context = self.read_context();
        info!(variables = context.len(); "Context evaluated");
        Ok(context)
    }

    pub fn session(&self) -> &S {
        &self.state.session
    }

    pub fn session_mut(&mut self) -> &mut S {
        &mut self.state.session
    }

    /// Gives the session back to the broker.
    pub fn release(self) {
        drop(self);
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::{
            Arc, Barrier,
            atomic::{AtomicUsize, Ordering},
            mpsc,
        },
        thread,
    };

    use blockctx_script::Value;

    use super::*;

    /// A session with scripted outcomes.
    #[derive(Debug, Default)]
    struct FakeSession {
        fail_write: bool,
        fail_submit: bool,
        slots: indexmap::IndexMap<String, SlotValue<i64>>,
        submits: usize,
    }

    impl EvaluationSession for FakeSession {
        type Value = i64;

        fn write_lines(&mut self, slot: &str, lines: &[String]) -> Result<(), SessionError> {
            if self.fail_write {
                return Err(SessionError::Write {
                    slot: slot.to_string(),
                    reason: "read-only".to_string(),
                });
            }
            self.slots
                .insert(slot.to_string(), SlotValue::Strings(lines.to_vec()));
            Ok(())
        }

        fn submit(&mut self, request: &EvaluationRequest) -> Result<(), SessionError> {
            self.submits += 1;
            if self.fail_submit {
                return Err(SessionError::Evaluation("boom".to_string()));
            }
            let Some(SlotValue::Strings(lines)) = self.slots.get(request.context_slot()) else {
                return Ok(());
            };
            let names: Vec<String> = lines.iter().map(|l| format!("v{}", l.len())).collect();
            let values: Vec<i64> = lines.iter().map(|l| l.len() as i64).collect();
            self.slots
                .insert(request.names_slot().to_string(), SlotValue::Strings(names));
            self.slots
                .insert(request.values_slot().to_string(), SlotValue::Values(values));
            Ok(())
        }

        fn read(&self, slot: &str) -> Option<SlotValue<i64>> {
            self.slots.get(slot).cloned()
        }
    }

    fn lines(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_try_acquire_is_exclusive() {
        let broker = Broker::new(FakeSession::default(), SessionConfig::default());

        let handle = broker.try_acquire().expect("broker should be free");
        assert!(broker.is_held());
        assert!(broker.try_acquire().is_none());

        handle.release();
        assert!(!broker.is_held());
        assert!(broker.try_acquire().is_some());
    }

    #[test]
    fn test_drop_releases() {
        let broker = Broker::new(FakeSession::default(), SessionConfig::default());
        {
            let _handle = broker.try_acquire().unwrap();
            assert!(broker.try_acquire().is_none());
        }
        assert!(broker.try_acquire().is_some());
    }

    #[test]
    fn test_evaluate_context() {
        let broker = Broker::new(FakeSession::default(), SessionConfig::default());
        let mut handle = broker.try_acquire().unwrap();

        let context = handle.evaluate_context(&lines(&["a", "bbb"])).unwrap();
        assert_eq!(context.get("v1"), Some(&1));
        assert_eq!(context.get("v3"), Some(&3));
        assert_eq!(handle.session().submits, 1);
    }

    #[test]
    fn test_read_context_pairs_up_to_shorter_slot() {
        let broker = Broker::new(FakeSession::default(), SessionConfig::default());
        let mut handle = broker.try_acquire().unwrap();

        assert!(handle.read_context().is_empty());

        let session = handle.session_mut();
        session.slots.insert(
            "context_names".into(),
            SlotValue::Strings(lines(&["x", "y", "z"])),
        );
        session
            .slots
            .insert("context_values".into(), SlotValue::Values(vec![1, 2]));

        let context = handle.read_context();
        let names: Vec<_> = context.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["x", "y"]);
    }

    #[test]
    fn test_read_context_wrong_shape_is_empty() {
        let broker = Broker::new(FakeSession::default(), SessionConfig::default());
        let mut handle = broker.try_acquire().unwrap();

        let session = handle.session_mut();
        session
            .slots
            .insert("context_names".into(), SlotValue::Values(vec![1]));
        session
            .slots
            .insert("context_values".into(), SlotValue::Values(vec![1]));

        assert!(handle.read_context().is_empty());
    }

    #[test]
    fn test_evaluation_failure_returns_last_read() {
        let broker = Broker::new(FakeSession::default(), SessionConfig::default());

        let mut handle = broker.try_acquire().unwrap();
        let first = handle.evaluate_context(&lines(&["ab"])).unwrap();
        handle.session_mut().fail_submit = true;

        let second = handle.evaluate_context(&lines(&["abcdef"])).unwrap();
        assert_eq!(second, first);
        handle.release();

        // The broker is usable again after the failure
        assert!(broker.try_acquire().is_some());
    }

    #[test]
    fn test_evaluation_failure_without_prior_read_is_empty() {
        let session = FakeSession {
            fail_submit: true,
            ..FakeSession::default()
        };
        let broker = Broker::new(session, SessionConfig::default());

        let mut handle = broker.try_acquire().unwrap();
        assert!(handle.evaluate_context(&lines(&["a"])).unwrap().is_empty());
    }

    #[test]
    fn test_write_failure_propagates_and_releases() {
        let session = FakeSession {
            fail_write: true,
            ..FakeSession::default()
        };
        let broker = Broker::new(session, SessionConfig::default());

        let result = broker
            .try_acquire()
            .unwrap()
            .evaluate_context(&lines(&["a"]));
        assert!(matches!(result, Err(SessionError::Write { .. })));
        assert!(!broker.is_held());
    }

    #[test]
    fn test_custom_slot_names() {
        let config = SessionConfig::new("ctx", "names", "values");
        let broker = Broker::new(FakeSession::default(), config);

        let mut handle = broker.try_acquire().unwrap();
        handle.evaluate_context(&lines(&["abc"])).unwrap();
        assert!(handle.session().slots.contains_key("ctx"));
        assert!(handle.session().slots.contains_key("names"));
    }

    #[test]
    fn test_mutual_exclusion_across_threads() {
        let broker = Arc::new(Broker::new(FakeSession::default(), SessionConfig::default()));
        let threads = 8;
        let barrier = Arc::new(Barrier::new(threads));
        let granted = Arc::new(AtomicUsize::new(0));
        let inside = Arc::new(AtomicUsize::new(0));

        let workers: Vec<_> = (0..threads)
            .map(|_| {
                let broker = Arc::clone(&broker);
                let barrier = Arc::clone(&barrier);
                let granted = Arc::clone(&granted);
                let inside = Arc::clone(&inside);
                thread::spawn(move || {
                    barrier.wait();
                    for _ in 0..200 {
                        if let Some(mut handle) = broker.try_acquire() {
                            assert_eq!(inside.fetch_add(1, Ordering::SeqCst), 0);
                            granted.fetch_add(1, Ordering::SeqCst);
                            handle.write_context(&[]).unwrap();
                            inside.fetch_sub(1, Ordering::SeqCst);
                        }
                    }
                })
            })
            .collect();

        for worker in workers {
            worker.join().unwrap();
        }
        assert!(granted.load(Ordering::SeqCst) > 0);
        assert!(!broker.is_held());
    }

    #[test]
    fn test_release_hands_session_to_waiter() {
        let broker = Arc::new(Broker::new(FakeSession::default(), SessionConfig::default()));
        let handle = broker.try_acquire().unwrap();
        let (release_tx, release_rx) = mpsc::channel::<()>();

        let waiter = {
            let broker = Arc::clone(&broker);
            thread::spawn(move || {
                let handle = broker.acquire_timeout(Duration::from_secs(10));
                let granted = handle.is_some();
                release_rx.recv().unwrap();
                drop(handle);
                granted
            })
        };

        // Give the waiter time to park behind the held lock
        thread::sleep(Duration::from_millis(200));
        drop(handle);

        // The session went straight to the waiter, so a fresh caller is refused
        assert!(broker.try_acquire().is_none());
        assert!(broker.is_held());

        release_tx.send(()).unwrap();
        assert!(waiter.join().unwrap());
        assert!(broker.try_acquire().is_some());
    }

    #[test]
    fn test_acquire_timeout_expires() {
        let broker = Broker::new(FakeSession::default(), SessionConfig::default());
        let handle = broker.try_acquire().unwrap();

        assert!(broker.acquire_timeout(Duration::from_millis(20)).is_none());
        handle.release();
        assert!(broker.acquire_timeout(Duration::from_millis(20)).is_some());
    }

    #[test]
    fn test_shared_broker_evaluates() {
        let broker = Broker::shared();
        // Other tests may hold the shared broker; wait for it.
        let mut handle = broker
            .acquire_timeout(Duration::from_secs(10))
            .expect("shared broker should become free");

        let context = handle
            .evaluate_context(&lines(&["a = 1", "", "b = a + 1"]))
            .unwrap();
        assert_eq!(context.get("b"), Some(&Value::Number(2.0)));
    }
}
