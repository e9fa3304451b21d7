//! # Query Handle
//!
//! Answers `custom/<route>/<endpoint>[/<arg>...]` against committed
//! versions only. The handle is cheap to clone and may be moved to other
//! threads; it never sees the writes of a block in progress.

use std::sync::Arc;

use shared_types::{BlockHeader, ModuleError};
use tracing::debug;
use usdx_modules::QueryRequest;
use usdx_store::{Context, SnapshotReader, StoreError};

use super::types::QueryResult;
use crate::container::AppStoreKeys;
use crate::genesis;
use crate::router::QueryRouter;

const CUSTOM_PREFIX: &str = "custom";

#[derive(Clone)]
pub struct QueryHandle {
    snapshots: SnapshotReader,
    router: Arc<QueryRouter>,
    keys: AppStoreKeys,
}

/// Split a query path into its route and request.
fn parse_path(path: &str, data: &[u8]) -> Result<(String, QueryRequest), ModuleError> {
    let mut parts = path.trim_start_matches('/').split('/');
    if parts.next() != Some(CUSTOM_PREFIX) {
        return Err(ModuleError::UnknownRequest(format!("unknown query path: {path}")));
    }
    let route = parts
        .next()
        .filter(|r| !r.is_empty())
        .ok_or_else(|| ModuleError::UnknownRequest(format!("missing route in {path}")))?;
    let endpoint = parts
        .next()
        .filter(|e| !e.is_empty())
        .ok_or_else(|| ModuleError::UnknownRequest(format!("missing endpoint in {path}")))?;
    let args = parts.map(str::to_string).collect();
    Ok((route.to_string(), QueryRequest::new(endpoint, args, data.to_vec())))
}

fn snapshot_error(err: StoreError) -> ModuleError {
    match err {
        StoreError::VersionNotFound(h) => ModuleError::NotFound(format!("version {h}")),
        StoreError::NotLoaded => ModuleError::NotFound("no committed version".to_string()),
        other => other.into(),
    }
}

impl QueryHandle {
    pub fn new(snapshots: SnapshotReader, router: Arc<QueryRouter>, keys: AppStoreKeys) -> Self {
        Self { snapshots, router, keys }
    }

    /// `height: None` reads the latest committed version.
    pub fn query(&self, path: &str, data: &[u8], height: Option<u64>) -> QueryResult {
        match self.run(path, data, height) {
            Ok((value, version)) => QueryResult::ok(value, version),
            Err(e) => {
                debug!("[Query] {} failed: {}", path, e);
                QueryResult::from_error(&e, height.unwrap_or(0))
            }
        }
    }

    fn run(
        &self,
        path: &str,
        data: &[u8],
        height: Option<u64>,
    ) -> Result<(Vec<u8>, u64), ModuleError> {
        let (route, request) = parse_path(path, data)?;
        let querier = self.router.route(&route)?;

        let version = height
            .or_else(|| self.snapshots.latest().map(|c| c.version))
            .ok_or_else(|| snapshot_error(StoreError::NotLoaded))?;
        let store = self.snapshots.at(Some(version)).map_err(snapshot_error)?;
        let probe = Context::new(store, BlockHeader::new("", version, 0));
        let chain_id = genesis::stored_chain_id(&probe, &self.keys)
            .map_err(|e| ModuleError::Store(e.to_string()))?
            .unwrap_or_default();
        let (store, _) = probe.into_parts();
        let ctx = Context::new(store, BlockHeader::new(chain_id, version, 0));

        Ok((querier(&ctx, &request)?, version))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_custom_path() {
        let (route, req) = parse_path("custom/cdp/cdp/usdx1owner/xrp", b"").unwrap();

        assert_eq!(route, "cdp");
        assert_eq!(req.endpoint, "cdp");
        assert_eq!(req.args, vec!["usdx1owner".to_string(), "xrp".to_string()]);
    }

    #[test]
    fn test_parse_rejects_other_paths() {
        assert!(matches!(parse_path("store/acc/key", b""), Err(ModuleError::UnknownRequest(_))));
        assert!(matches!(parse_path("custom/acc", b""), Err(ModuleError::UnknownRequest(_))));
        assert!(matches!(parse_path("custom//params", b""), Err(ModuleError::UnknownRequest(_))));
    }
}
