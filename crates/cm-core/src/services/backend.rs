use std::future::Future;
use std::sync::Arc;

/// Failure reported by the deployment backend. Carries only the backend's
/// reason; the orchestrator attaches the artifact context.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct BackendError(pub String);

/// Result of a confirmed contract-creation transaction.
#[derive(Debug, Clone)]
pub struct DeployOutcome {
    pub address: String,
    pub tx_hash: String,
    pub block_number: u64,
}

/// The external wallet/network provider the orchestrator submits
/// contract-creation transactions to.
///
/// `deploy_contract` resolves once the transaction is confirmed; the
/// orchestrator never overlaps calls, so implementations may assume
/// exclusive use of the underlying connection for the run.
pub trait Backend {
    fn deploy_contract(
        &self,
        bytecode: &str,
        constructor_args: &[serde_json::Value],
    ) -> impl Future<Output = Result<DeployOutcome, BackendError>> + Send;
}

impl<B: Backend + Send + Sync> Backend for Arc<B> {
    async fn deploy_contract(
        &self,
        bytecode: &str,
        constructor_args: &[serde_json::Value],
    ) -> Result<DeployOutcome, BackendError> {
        self.as_ref().deploy_contract(bytecode, constructor_args).await
    }
}
