//! # USDX Application
//!
//! The state machine the consensus engine drives. Calls arrive one at a
//! time in block order; queries go through a [`QueryHandle`] and may run
//! concurrently against committed versions.
//!
//! ## Transaction Pipeline
//!
//! ```text
//! bytes ──decode──→ Tx ──→ branch of block state
//!                            │
//!                            ├─ ante (memo, account, sequence, fee)
//!                            ├─ route lookup
//!                            └─ handler
//!                            │
//!               ok ──→ absorb branch     err ──→ discard branch
//! ```
//!
//! A failed transaction leaves no trace in state: its fee and sequence
//! bump are discarded together with the handler's writes.
//!
//! `end_block` runs exactly once per block. After it the block only
//! accepts `commit`, and `commit` is refused until it has run.

use std::sync::Arc;

use shared_types::{AddressConfig, BlockHeader, Codec, ModuleError, Tx};
use tracing::{debug, error, info, instrument, warn};
use usdx_modules::auth::AnteHandler;
use usdx_modules::is_state_failure;
use usdx_store::{CommitId, Context, StoreRegistry, VersionedDatabase};

use super::query::QueryHandle;
use super::types::{EndBlockResult, InitChainResult, QueryResult, TxResult};
use crate::container::{AppConfig, AppStoreKeys, KeeperSet, KeeperSetBuilder};
use crate::errors::{FatalError, WiringError};
use crate::genesis::{self, GenesisState};
use crate::router::TxRouter;
use crate::wiring::{self, EndBlockSchedule};

pub struct UsdxApp {
    config: AppConfig,
    addresses: Arc<AddressConfig>,
    codec: Arc<Codec>,
    keys: AppStoreKeys,
    stores: StoreRegistry,
    keepers: KeeperSet,
    ante: AnteHandler,
    tx_router: TxRouter,
    queries: QueryHandle,
    schedule: EndBlockSchedule,
    /// Writable state of the block between `begin_block` and `commit`.
    block: Option<BlockInProgress>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlockPhase {
    /// Between `begin_block` and `end_block`: transactions are accepted.
    Delivering,
    /// Settlement has run; only `commit` remains.
    Ended,
}

struct BlockInProgress {
    ctx: Context,
    phase: BlockPhase,
}

fn run_tx(
    ante: &AnteHandler,
    router: &TxRouter,
    ctx: &mut Context,
    tx: &Tx,
) -> Result<(), ModuleError> {
    ante.run(ctx, tx)?;
    let handler = router.route(&tx.msg.route)?;
    handler(ctx, tx)
}

impl UsdxApp {
    /// Wire the application over `db` and load its latest version.
    pub fn new(config: AppConfig, db: Arc<dyn VersionedDatabase>) -> Result<Self, FatalError> {
        config.validate()?;
        let addresses = Arc::new(AddressConfig::usdx());

        info!("[App] Phase 1: codec");
        let codec = Arc::new(wiring::build_codec()?);

        info!("[App] Phase 2: stores (keep_recent={})", config.keep_recent);
        let keys = AppStoreKeys::new();
        let mut stores = StoreRegistry::new(db).with_keep_recent(config.keep_recent);
        stores.mount(&keys.all()).map_err(WiringError::from)?;
        match stores.load_latest(&keys.main)? {
            Some(commit) => info!("[App] loaded version {}", commit),
            None => info!("[App] empty database, awaiting genesis"),
        }

        info!("[App] Phase 3: keepers");
        let keepers = KeeperSetBuilder::build_all(codec.clone(), keys.clone())?;

        info!("[App] Phase 4: routes");
        let tx_router = wiring::tx_router(&keepers, &codec)?;
        let query_router = Arc::new(wiring::query_router(&keepers, &addresses)?);
        let queries = QueryHandle::new(stores.snapshots(), query_router, keys.clone());
        let ante = AnteHandler::new(
            keepers.accounts.clone(),
            keepers.fees.clone(),
            config.min_fees.clone(),
        );
        let schedule = EndBlockSchedule::for_keepers(&keepers);
        info!("[App] end block schedule: {:?}", schedule.names());

        Ok(Self {
            config,
            addresses,
            codec,
            keys,
            stores,
            keepers,
            ante,
            tx_router,
            queries,
            schedule,
            block: None,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn keepers(&self) -> &KeeperSet {
        &self.keepers
    }

    pub fn addresses(&self) -> &AddressConfig {
        &self.addresses
    }

    pub fn last_commit(&self) -> Option<CommitId> {
        self.stores.last_commit()
    }

    pub fn query_handle(&self) -> QueryHandle {
        self.queries.clone()
    }

    /// Build and commit version 0. Refused once any version exists.
    #[instrument(skip(self, genesis_doc))]
    pub fn init_chain(
        &mut self,
        chain_id: &str,
        genesis_doc: &[u8],
    ) -> Result<InitChainResult, FatalError> {
        if self.block.is_some() {
            return Err(FatalError::BlockInProgress);
        }
        if let Some(commit) = self.stores.last_commit() {
            return Err(FatalError::GenesisAlreadyInitialized(commit.version));
        }
        if chain_id.trim().is_empty() {
            return Err(FatalError::GenesisDecode("empty chain id".to_string()));
        }
        let state = GenesisState::from_json(genesis_doc)?;

        let mut ctx = Context::new(self.stores.deliver_store()?, BlockHeader::new(chain_id, 0, 0));
        genesis::init_genesis(&mut ctx, &self.keys, &self.keepers, &self.addresses, &state)?;
        let (store, _) = ctx.into_parts();
        let app_hash = self.stores.commit(store)?;

        info!("[App] genesis committed: {}", app_hash);
        Ok(InitChainResult { app_hash })
    }

    #[instrument(skip(self, header), fields(height = header.height))]
    pub fn begin_block(&mut self, header: BlockHeader) -> Result<(), FatalError> {
        if self.block.is_some() {
            return Err(FatalError::BlockInProgress);
        }
        let last = self.stores.last_commit().ok_or(FatalError::ChainNotInitialized)?;
        let expected = last.version + 1;
        if header.height != expected {
            return Err(FatalError::UnexpectedHeight {
                expected,
                actual: header.height,
            });
        }

        let ctx = Context::new(self.stores.deliver_store()?, header);
        if let Some(chain_id) = genesis::stored_chain_id(&ctx, &self.keys)? {
            if chain_id != ctx.chain_id() {
                return Err(FatalError::ChainIdMismatch {
                    expected: chain_id,
                    actual: ctx.chain_id().to_string(),
                });
            }
        }
        debug!("[App] begin block {}", ctx.block_height());
        self.block = Some(BlockInProgress {
            ctx,
            phase: BlockPhase::Delivering,
        });
        Ok(())
    }

    /// Run one transaction. Never halts the replica: every failure becomes
    /// a non-zero code.
    pub fn deliver_tx(&mut self, bytes: &[u8]) -> TxResult {
        let block = match self.block.as_mut() {
            Some(BlockInProgress {
                ctx,
                phase: BlockPhase::Delivering,
            }) => ctx,
            Some(_) => {
                warn!("[App] transaction delivered after end block");
                return TxResult::from_error(&ModuleError::InvalidMsg(
                    "end block already ran".to_string(),
                ));
            }
            None => {
                warn!("[App] transaction delivered outside a block");
                return TxResult::from_error(&ModuleError::InvalidMsg(
                    "no block in progress".to_string(),
                ));
            }
        };
        let tx = match self.codec.decode_tx(bytes) {
            Ok(tx) => tx,
            Err(e) => return TxResult::from_error(&ModuleError::TxDecode(e.to_string())),
        };

        let mut branch = block.branch();
        match run_tx(&self.ante, &self.tx_router, &mut branch, &tx) {
            Ok(()) => {
                let events = branch.take_events();
                block.absorb(branch);
                debug!("[App] {} ok, {} events", tx.msg.msg_type, events.len());
                TxResult::ok(events)
            }
            Err(e) => {
                if is_state_failure(&e) {
                    error!("[App] {} hit a state failure: {}", tx.msg.msg_type, e);
                } else {
                    debug!("[App] {} rejected: {}", tx.msg.msg_type, e);
                }
                TxResult::from_error(&e)
            }
        }
    }

    #[instrument(skip(self))]
    pub fn end_block(&mut self, height: u64) -> Result<EndBlockResult, FatalError> {
        let block = self.block.as_mut().ok_or(FatalError::NoBlockInProgress)?;
        if block.phase == BlockPhase::Ended {
            return Err(FatalError::EndBlockAlreadyRun(block.ctx.block_height()));
        }
        if block.ctx.block_height() != height {
            return Err(FatalError::UnexpectedHeight {
                expected: block.ctx.block_height(),
                actual: height,
            });
        }
        let events = self.schedule.run(&mut block.ctx)?;
        block.phase = BlockPhase::Ended;
        Ok(EndBlockResult {
            events,
            validator_updates: Vec::new(),
        })
    }

    pub fn commit(&mut self) -> Result<CommitId, FatalError> {
        let block = self.block.as_ref().ok_or(FatalError::NoBlockInProgress)?;
        if block.phase != BlockPhase::Ended {
            return Err(FatalError::EndBlockNotRun(block.ctx.block_height()));
        }
        let block = self.block.take().ok_or(FatalError::NoBlockInProgress)?;
        let (store, _) = block.ctx.into_parts();
        let commit = self.stores.commit(store)?;
        info!("[App] committed {}", commit);
        Ok(commit)
    }

    pub fn query(&self, path: &str, data: &[u8], height: Option<u64>) -> QueryResult {
        self.queries.query(path, data, height)
    }

    /// Genesis document of the latest committed version.
    pub fn export_genesis(&self) -> Result<GenesisState, FatalError> {
        let commit = self.stores.last_commit().ok_or(FatalError::ChainNotInitialized)?;
        let store = self.stores.snapshots().at(Some(commit.version))?;
        let ctx = Context::new(store, BlockHeader::new("", commit.version, 0));
        genesis::export_genesis(&ctx, &self.keepers, &self.addresses)
    }
}
