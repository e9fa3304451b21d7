//! # End-of-Block Schedule
//!
//! Fixed sequence of settlement providers run on the block's state after
//! the last transaction:
//!
//! ```text
//! auction (close due auctions) ──→ pricefeed (recompute current prices)
//! ```
//!
//! Auctions settle against the prices the block started with; new prices
//! take effect for the next block. Any provider error halts the replica.

use std::sync::Arc;

use shared_types::Event;
use tracing::{debug, error, instrument};
use usdx_modules::EndBlocker;
use usdx_store::Context;

use crate::container::KeeperSet;
use crate::errors::FatalError;

#[derive(Clone)]
pub struct EndBlockSchedule {
    providers: Vec<Arc<dyn EndBlocker>>,
}

impl EndBlockSchedule {
    pub fn new(providers: Vec<Arc<dyn EndBlocker>>) -> Self {
        Self { providers }
    }

    /// The application's schedule.
    pub fn for_keepers(keepers: &KeeperSet) -> Self {
        let auction: Arc<dyn EndBlocker> = keepers.auction.clone();
        let pricefeed: Arc<dyn EndBlocker> = keepers.pricefeed.clone();
        Self::new(vec![auction, pricefeed])
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    /// Run every provider in order, concatenating their events.
    #[instrument(skip_all, fields(height = ctx.block_height()))]
    pub fn run(&self, ctx: &mut Context) -> Result<Vec<Event>, FatalError> {
        let mut events = Vec::new();
        for provider in &self.providers {
            match provider.end_block(ctx) {
                Ok(emitted) => {
                    debug!("[EndBlock] {} emitted {} events", provider.name(), emitted.len());
                    events.extend(emitted);
                }
                Err(e) => {
                    error!("[EndBlock] {} failed: {}", provider.name(), e);
                    return Err(FatalError::EndBlock {
                        module: provider.name().to_string(),
                        reason: e.to_string(),
                    });
                }
            }
        }
        Ok(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use shared_types::{BlockHeader, ModuleError};
    use usdx_store::{InMemoryVersionedDb, StoreKey, StoreRegistry};

    struct Recorder {
        name: &'static str,
        calls: Arc<Mutex<Vec<&'static str>>>,
        fail: bool,
    }

    impl EndBlocker for Recorder {
        fn name(&self) -> &'static str {
            self.name
        }

        fn end_block(&self, _ctx: &mut Context) -> Result<Vec<Event>, ModuleError> {
            self.calls.lock().push(self.name);
            if self.fail {
                return Err(ModuleError::Store("disk gone".to_string()));
            }
            Ok(vec![Event::new(self.name)])
        }
    }

    fn context() -> Context {
        let main = StoreKey::persistent("main");
        let mut registry = StoreRegistry::new(Arc::new(InMemoryVersionedDb::new()));
        registry.mount(&[main.clone()]).unwrap();
        registry.load_latest(&main).unwrap();
        Context::new(registry.deliver_store().unwrap(), BlockHeader::new("usdx-test", 1, 0))
    }

    fn recorder(
        name: &'static str,
        calls: &Arc<Mutex<Vec<&'static str>>>,
        fail: bool,
    ) -> Arc<dyn EndBlocker> {
        Arc::new(Recorder {
            name,
            calls: calls.clone(),
            fail,
        })
    }

    #[test]
    fn test_empty_block_runs_every_provider_in_order() {
        // Arrange
        let calls = Arc::new(Mutex::new(Vec::new()));
        let schedule = EndBlockSchedule::new(vec![
            recorder("auction", &calls, false),
            recorder("pricefeed", &calls, false),
        ]);
        let mut ctx = context();

        // Act
        let events = schedule.run(&mut ctx).unwrap();

        // Assert
        assert_eq!(*calls.lock(), vec!["auction", "pricefeed"]);
        let kinds: Vec<&str> = events.iter().map(|e| e.kind.as_str()).collect();
        assert_eq!(kinds, vec!["auction", "pricefeed"]);
    }

    #[test]
    fn test_provider_error_is_fatal_and_stops_the_schedule() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let schedule = EndBlockSchedule::new(vec![
            recorder("auction", &calls, true),
            recorder("pricefeed", &calls, false),
        ]);
        let mut ctx = context();

        let err = schedule.run(&mut ctx).unwrap_err();

        assert!(matches!(err, FatalError::EndBlock { ref module, .. } if module == "auction"));
        assert_eq!(*calls.lock(), vec!["auction"]);
    }
}
