//! blockctx - Context resolution for nested block diagrams.
//!
//! Blocks in a diagram inherit variables from every enclosing block and from
//! the diagram itself. This crate walks that hierarchy, merges the contexts
//! root first so the closest binding wins, and evaluates the result in an
//! interpreter session that callers share through a fair, non-blocking
//! broker. It also provides the editing model behind block masks.

pub mod broker;
pub mod config;
pub mod customize;
pub mod document;
pub mod hierarchy;
pub mod resolve;
pub mod session;
pub mod store;

mod error;

pub use blockctx_core::{mask, node, wire};

pub use error::BlockCtxError;

use log::{debug, info, trace};

use blockctx_core::node::NodeRef;
use blockctx_script::{Interpreter, Value, join_lines};

use broker::Broker;
use config::AppConfig;
use customize::MaskCustomization;
use resolve::ResolvedContext;
use session::{EvaluatedContext, EvaluationSession, ScriptSession};
use store::PropertyStore;

/// Entry point tying resolution, evaluation and mask editing to one
/// configuration.
///
/// # Examples
///
/// ```rust
/// use blockctx::{ContextBuilder, node::NodeRef, store::MemoryStore};
///
/// let mut store = MemoryStore::new();
/// store.add_diagram(1).context(["rate = 100"]);
/// store.add_block(2).parent_diagram(1).context(["period = 1 / rate"]);
///
/// let builder = ContextBuilder::default();
/// let resolved = builder
///     .resolve(&store, NodeRef::block(2))
///     .expect("Failed to resolve");
/// assert_eq!(resolved.statements(), ["rate = 100", "", "period = 1 / rate", ""]);
///
/// let broker = builder.broker();
/// let context = builder
///     .evaluate(&broker, &store, NodeRef::block(2))
///     .expect("Failed to evaluate")
///     .expect("Broker is free");
/// assert_eq!(context["period"].to_string(), "0.01");
/// ```
#[derive(Debug, Default)]
pub struct ContextBuilder {
    config: AppConfig,
}

impl ContextBuilder {
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Creates a broker over a fresh script session, using the configured
    /// slot names.
    pub fn broker(&self) -> Broker<ScriptSession> {
        Broker::new(ScriptSession::new(), self.config.session().clone())
    }

    /// Resolves the statements in effect at `node`.
    pub fn resolve<P>(&self, store: &P, node: NodeRef) -> Result<ResolvedContext, BlockCtxError>
    where
        P: PropertyStore + ?Sized,
    {
        resolve::resolve_all(store, node, self.config.resolution())
    }

    /// Resolves the context at `node` and evaluates it in `broker`'s session.
    ///
    /// Returns `Ok(None)` without waiting when the broker is busy.
    pub fn evaluate<S, P>(
        &self,
        broker: &Broker<S>,
        store: &P,
        node: NodeRef,
    ) -> Result<Option<EvaluatedContext<S::Value>>, BlockCtxError>
    where
        S: EvaluationSession,
        P: PropertyStore + ?Sized,
    {
        let Some(mut handle) = broker.try_acquire() else {
            info!(node:% = node; "Evaluation session busy");
            return Ok(None);
        };
        let resolved = self.resolve(store, node)?;
        let context = handle.evaluate_context(resolved.statements())?;
        trace!(context:?; "Evaluated context");
        Ok(Some(context))
    }

    /// Evaluates `lines` in a fresh interpreter, reporting script errors.
    ///
    /// Unlike a broker evaluation, which falls back to the previous values, a
    /// failure here is returned with the evaluated source attached.
    ///
    /// # Errors
    ///
    /// Returns [`BlockCtxError::Script`] for syntax and evaluation errors.
    pub fn check<S: AsRef<str>>(&self, lines: &[S]) -> Result<EvaluatedContext<Value>, BlockCtxError> {
        debug!(lines = lines.len(); "Checking statements");
        Interpreter::new()
            .evaluate_statements(lines)
            .map_err(|err| BlockCtxError::new_script_error(err, join_lines(lines)))
    }

    /// Opens the mask of `node` for editing. See [`MaskCustomization::open`].
    pub fn open_mask<S, P>(
        &self,
        broker: &Broker<S>,
        store: &P,
        node: NodeRef,
    ) -> Result<Option<MaskCustomization<S::Value>>, BlockCtxError>
    where
        S: EvaluationSession,
        P: PropertyStore + ?Sized,
    {
        MaskCustomization::open(broker, store, node, self.config.resolution())
    }
}
