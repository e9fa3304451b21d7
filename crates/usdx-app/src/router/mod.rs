//! # Routers
//!
//! Route-name tables for transaction handlers and query handlers. Both are
//! filled once during wiring and read-only afterwards; a name registered
//! twice is a wiring error.

use std::collections::BTreeMap;

use shared_types::ModuleError;
use tracing::debug;
use usdx_modules::{Handler, Querier};

use crate::errors::WiringError;

/// Message route to handler.
#[derive(Default)]
pub struct TxRouter {
    routes: BTreeMap<String, Handler>,
}

impl TxRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_route(&mut self, route: &str, handler: Handler) -> Result<&mut Self, WiringError> {
        if self.routes.contains_key(route) {
            return Err(WiringError::DuplicateRoute(route.to_string()));
        }
        debug!("[Router] tx route {}", route);
        self.routes.insert(route.to_string(), handler);
        Ok(self)
    }

    pub fn route(&self, route: &str) -> Result<&Handler, ModuleError> {
        self.routes
            .get(route)
            .ok_or_else(|| ModuleError::UnknownRoute(route.to_string()))
    }

    pub fn routes(&self) -> impl Iterator<Item = &str> {
        self.routes.keys().map(String::as_str)
    }
}

/// Query route to querier.
#[derive(Default)]
pub struct QueryRouter {
    routes: BTreeMap<String, Querier>,
}

impl QueryRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_route(&mut self, route: &str, querier: Querier) -> Result<&mut Self, WiringError> {
        if self.routes.contains_key(route) {
            return Err(WiringError::DuplicateRoute(route.to_string()));
        }
        debug!("[Router] query route {}", route);
        self.routes.insert(route.to_string(), querier);
        Ok(self)
    }

    pub fn route(&self, route: &str) -> Result<&Querier, ModuleError> {
        self.routes
            .get(route)
            .ok_or_else(|| ModuleError::UnknownRoute(route.to_string()))
    }

    pub fn routes(&self) -> impl Iterator<Item = &str> {
        self.routes.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use shared_types::{codes, Tx};
    use usdx_modules::QueryRequest;
    use usdx_store::Context;

    fn noop_handler() -> Handler {
        Arc::new(|_: &mut Context, _: &Tx| Ok(()))
    }

    fn noop_querier() -> Querier {
        Arc::new(|_: &Context, _: &QueryRequest| Ok(Vec::new()))
    }

    #[test]
    fn test_duplicate_tx_route_is_rejected() {
        // Arrange
        let mut router = TxRouter::new();
        router.add_route("bank", noop_handler()).unwrap();

        // Act
        let err = router.add_route("bank", noop_handler()).err();

        // Assert
        assert_eq!(err, Some(WiringError::DuplicateRoute("bank".to_string())));
        assert_eq!(router.routes().collect::<Vec<_>>(), vec!["bank"]);
    }

    #[test]
    fn test_unknown_route_lookup() {
        let mut router = QueryRouter::new();
        router
            .add_route("acc", noop_querier())
            .unwrap()
            .add_route("cdp", noop_querier())
            .unwrap();

        assert!(router.route("acc").is_ok());
        let err = router.route("staking").err().unwrap();
        assert_eq!(err.code(), codes::UNKNOWN_REQUEST);
        assert_eq!(router.routes().collect::<Vec<_>>(), vec!["acc", "cdp"]);
    }
}
