//! Application-scoped context shared across request handlers.

use crate::{
    auth::{SessionAuthorizer, TokenVerifier},
    store::ReviewStore,
};

/// Holds the review store and the session authorizer. Built once per process
/// and shared across invocations behind an `Arc`.
pub struct AppContext<S, V> {
    store: S,
    authorizer: SessionAuthorizer<V>,
}

impl<S: ReviewStore, V: TokenVerifier> AppContext<S, V> {
    /// Construct a new context for the given store and authorizer.
    pub fn new(store: S, authorizer: SessionAuthorizer<V>) -> Self {
        Self { store, authorizer }
    }

    /// Borrow the review store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Borrow the session authorizer gating mutating routes.
    pub fn authorizer(&self) -> &SessionAuthorizer<V> {
        &self.authorizer
    }
}
