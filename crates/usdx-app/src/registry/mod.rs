//! # Module Registry
//!
//! Identities of the application's modules and the construction-dependency
//! graph between their keepers.
//!
//! ## Dependency Graph
//!
//! ```text
//! params ─┬─→ auth ──→ bank ──┐
//!         │                   ├─→ cdp ──→ auction ──→ liquidator
//!         └─→ pricefeed ──────┘    └──────────────────────↑
//!
//! fee_collection (no dependencies)
//! ```
//!
//! Every edge points from a dependency to the keeper that holds it. The
//! graph is acyclic by construction; [`DependencyGraph::order`] re-checks it
//! and produces the one deterministic construction order the keeper set is
//! built in.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use tracing::debug;

use crate::errors::WiringError;

/// Module identifier. Declaration order breaks ties in the construction
/// order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ModuleId {
    Params,
    Auth,
    Bank,
    FeeCollection,
    Pricefeed,
    Cdp,
    Auction,
    Liquidator,
}

impl ModuleId {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Params => "params",
            Self::Auth => "auth",
            Self::Bank => "bank",
            Self::FeeCollection => "fee_collection",
            Self::Pricefeed => "pricefeed",
            Self::Cdp => "cdp",
            Self::Auction => "auction",
            Self::Liquidator => "liquidator",
        }
    }

    /// Keepers that must exist before this one can be constructed.
    #[must_use]
    pub fn dependencies(&self) -> Vec<ModuleId> {
        match self {
            Self::Params | Self::FeeCollection => vec![],
            Self::Auth | Self::Pricefeed => vec![Self::Params],
            Self::Bank => vec![Self::Params, Self::Auth],
            Self::Cdp => vec![Self::Params, Self::Pricefeed, Self::Bank],
            // the auction escrows through the CDP keeper's asset transfer
            Self::Auction => vec![Self::Params, Self::Cdp],
            Self::Liquidator => vec![Self::Params, Self::Cdp, Self::Auction],
        }
    }

    #[must_use]
    pub fn all() -> Vec<ModuleId> {
        vec![
            Self::Params,
            Self::Auth,
            Self::Bank,
            Self::FeeCollection,
            Self::Pricefeed,
            Self::Cdp,
            Self::Auction,
            Self::Liquidator,
        ]
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Directed dependency graph over a set of modules.
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    edges: BTreeMap<ModuleId, Vec<ModuleId>>,
}

impl DependencyGraph {
    /// The application's graph: every module with its declared dependencies.
    pub fn new() -> Self {
        Self::from_edges(ModuleId::all().into_iter().map(|id| (id, id.dependencies())))
    }

    /// Graph with explicit edges (`module -> dependencies`).
    pub fn from_edges(edges: impl IntoIterator<Item = (ModuleId, Vec<ModuleId>)>) -> Self {
        Self {
            edges: edges.into_iter().collect(),
        }
    }

    pub fn modules(&self) -> impl Iterator<Item = ModuleId> + '_ {
        self.edges.keys().copied()
    }

    /// Topological order, picking the smallest ready module at every step.
    ///
    /// Fails if a dependency is not a node of the graph or if the graph has
    /// a cycle.
    pub fn order(&self) -> Result<Vec<ModuleId>, WiringError> {
        for (module, deps) in &self.edges {
            if let Some(dependency) = deps.iter().find(|d| !self.edges.contains_key(d)) {
                return Err(WiringError::UnknownDependency {
                    module: *module,
                    dependency: *dependency,
                });
            }
        }

        let mut placed: BTreeSet<ModuleId> = BTreeSet::new();
        let mut order = Vec::with_capacity(self.edges.len());
        while order.len() < self.edges.len() {
            let next = self
                .edges
                .iter()
                .find(|(module, deps)| {
                    !placed.contains(module) && deps.iter().all(|d| placed.contains(d))
                })
                .map(|(module, _)| *module);
            match next {
                Some(module) => {
                    debug!("[Registry] {} at position {}", module, order.len());
                    placed.insert(module);
                    order.push(module);
                }
                None => {
                    let stuck: Vec<&str> = self
                        .edges
                        .keys()
                        .filter(|m| !placed.contains(m))
                        .map(ModuleId::name)
                        .collect();
                    return Err(WiringError::Cycle(stuck.join(", ")));
                }
            }
        }
        Ok(order)
    }
}

impl Default for DependencyGraph {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_application_order() {
        // Act
        let order = DependencyGraph::new().order().unwrap();

        // Assert
        assert_eq!(
            order,
            vec![
                ModuleId::Params,
                ModuleId::Auth,
                ModuleId::Bank,
                ModuleId::FeeCollection,
                ModuleId::Pricefeed,
                ModuleId::Cdp,
                ModuleId::Auction,
                ModuleId::Liquidator,
            ]
        );
    }

    #[test]
    fn test_order_respects_every_edge() {
        let order = DependencyGraph::new().order().unwrap();
        let position = |m: ModuleId| order.iter().position(|x| *x == m).unwrap();

        for module in ModuleId::all() {
            for dep in module.dependencies() {
                assert!(position(dep) < position(module), "{dep} must precede {module}");
            }
        }
    }

    #[test]
    fn test_cycle_is_rejected() {
        let graph = DependencyGraph::from_edges([
            (ModuleId::Params, vec![]),
            (ModuleId::Cdp, vec![ModuleId::Auction]),
            (ModuleId::Auction, vec![ModuleId::Cdp]),
        ]);

        let err = graph.order().unwrap_err();

        assert_eq!(err, WiringError::Cycle("cdp, auction".to_string()));
    }

    #[test]
    fn test_missing_dependency_is_rejected() {
        let graph = DependencyGraph::from_edges([(ModuleId::Bank, vec![ModuleId::Auth])]);

        assert_eq!(
            graph.order().unwrap_err(),
            WiringError::UnknownDependency {
                module: ModuleId::Bank,
                dependency: ModuleId::Auth,
            }
        );
    }
}
