use crate::bean::BeanKey;
use itertools::Itertools;
use std::fmt::{Display, Formatter};
use std::rc::Rc;
use thiserror::Error;

/// Shared pointer for errors produced outside the container, e.g. by user builders or
/// [Closeable](crate::bean::Closeable) beans.
pub type ErrorPtr = Rc<dyn std::error::Error + 'static>;

/// Errors related to resolving, constructing and managing beans.
///
/// Nested resolution errors are propagated unchanged, so the variant seen by the caller is the
/// root cause. The only wrapping variant is [Error::Context], which adds a message while keeping
/// the original error reachable via [Error::root_cause].
#[derive(Error, Clone, Debug)]
pub enum Error {
    #[error("nil context - no container has been activated")]
    NilContext,
    #[error("context already exists")]
    ContextAlreadyExists,
    #[error("not a bean type: {0}")]
    NonBeanType(String),
    #[error("inject not supported for bean type: {0}")]
    InjectNotSupported(String),
    #[error("parse tag error: {0}")]
    ParseTag(String),
    #[error("no value found for path '{0}'")]
    NoValueFound(String),
    #[error("no bean provider found for {0}")]
    NoBeanProvider(BeanKey),
    #[error("detected cycle dependency: cannot inject to\n{0}")]
    CycleDependencies(DependencyChain),
    #[error("expected type {expected} for value '{path}', but got {actual}")]
    TypeMismatch {
        path: String,
        expected: &'static str,
        actual: &'static str,
    },
    #[error("failed to cast bean resolved for {resolved_for} to type {expected}")]
    IncompatibleBean {
        expected: &'static str,
        resolved_for: &'static str,
    },
    #[error("attempted to re-register a provider for {0}")]
    DuplicateProvider(BeanKey),
    #[error("error loading container settings: {0}")]
    Settings(String),
    #[error("{context}: {source}")]
    Context {
        context: String,
        #[source]
        source: Box<Error>,
    },
    #[error("{0}")]
    Custom(ErrorPtr),
}

impl Error {
    /// Wraps any error as [Error::Custom].
    pub fn custom<E: std::error::Error + 'static>(error: E) -> Self {
        Self::Custom(Rc::new(error))
    }

    /// Adds a descriptive message on top of this error.
    pub fn with_context<C: Into<String>>(self, context: C) -> Self {
        Self::Context {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Returns the innermost error, skipping any [Error::Context] layers.
    pub fn root_cause(&self) -> &Error {
        match self {
            Self::Context { source, .. } => source.root_cause(),
            error => error,
        }
    }

    /// Checks if this error means that nothing was provided for the requested injectable: neither
    /// a bean provider nor a configuration value.
    pub fn is_no_injectable_provided(&self) -> bool {
        matches!(
            self.root_cause(),
            Self::NoBeanProvider(_) | Self::NoValueFound(_)
        )
    }
}

/// The chain of beans under construction at the moment a cycle was detected, followed by the
/// requested bean which closed the cycle.
#[derive(Clone, Debug)]
pub struct DependencyChain {
    stack: Vec<BeanKey>,
    requested: BeanKey,
}

impl DependencyChain {
    pub fn new(stack: Vec<BeanKey>, requested: BeanKey) -> Self {
        Self { stack, requested }
    }

    /// Keys in resolution order, with the requested key last.
    pub fn keys(&self) -> impl Iterator<Item = &BeanKey> {
        self.stack.iter().chain(std::iter::once(&self.requested))
    }

    pub fn requested(&self) -> &BeanKey {
        &self.requested
    }

    /// Renders the chain on a single line, e.g. for log fields.
    pub fn to_single_line(&self) -> String {
        self.keys().join(" -> ")
    }
}

impl Display for DependencyChain {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if let Some((first, rest)) = self.stack.split_first() {
            write!(f, "{first}")?;
            for key in rest {
                write!(f, "\n↳ {key}")?;
            }
            write!(f, "\n→ {}", self.requested)
        } else {
            write!(f, "→ {}", self.requested)
        }
    }
}
