//! Contract Bindings
//!
//! `alloy::sol!` bindings for every on-chain surface the prover talks to,
//! generalized from the teacher's single inline `sol!` block in
//! `submitter.rs` into one module covering the verifier, the oracle (whose
//! exit-request payload needs a two-selector decode fallback), the staking
//! router, and the per-module node-operator registry.

use alloy::primitives::Address;
use alloy::providers::ProviderBuilder;
use alloy::sol;
use anyhow::{Context, Result};
use tracing::instrument;

sol! {
    #[sol(rpc)]
    contract ExitDelayVerifier {
        function verifyValidatorExitDelay(
            uint64 rootsTimestamp,
            uint32 exitRequestIndex,
            bytes32 withdrawalCredentials,
            uint64 effectiveBalance,
            bool slashed,
            uint64 activationEligibilityEpoch,
            uint64 activationEpoch,
            uint64 withdrawableEpoch,
            bytes32[] calldata validatorProof,
            uint32 moduleId,
            uint64 nodeOpId,
            bytes calldata pubkey
        ) external;

        function verifyHistoricalValidatorExitDelay(
            uint64 rootsTimestamp,
            uint32 exitRequestIndex,
            bytes32 withdrawalCredentials,
            uint64 effectiveBalance,
            bool slashed,
            uint64 activationEligibilityEpoch,
            uint64 activationEpoch,
            uint64 withdrawableEpoch,
            bytes32[] calldata validatorProof,
            uint32 moduleId,
            uint64 nodeOpId,
            bytes calldata pubkey,
            uint64 historicalHeaderSlot,
            uint64 historicalHeaderProposerIndex,
            bytes32 historicalHeaderParentRoot,
            bytes32 historicalHeaderBodyRoot,
            bytes32[] calldata historicalHeaderProof,
            uint64 rootGIndex
        ) external;

        function isValidatorExitDelayPenalized(bytes calldata pubkey) external view returns (bool);
        function shardCommitteePeriodInSeconds() external view returns (uint64);
    }

    #[sol(rpc)]
    contract ExitRequestsOracle {
        function submitReportData(bytes calldata data, uint256 contractVersion) external;
        function submitExitRequestsData(bytes calldata data) external;

        event ExitDataProcessing(bytes32 indexed exitRequestsHash, uint256 timestamp);
    }

    #[sol(rpc)]
    contract LidoLocator {
        function stakingRouter() external view returns (address);
        function exitRequestsOracle() external view returns (address);
        function exitDelayVerifier() external view returns (address);
    }

    #[sol(rpc)]
    contract StakingRouter {
        function getStakingModule(uint32 moduleId) external view returns (address moduleAddress);
        function getStakingModulesCount() external view returns (uint256);
    }

    #[sol(rpc)]
    contract NodeOperatorRegistry {
        function getNodeOperator(uint64 nodeOpId, bool fullInfo)
            external
            view
            returns (bool active, string memory name, address rewardAddress, uint64 totalVettedValidators);

        function exitDeadlineThreshold(uint64 nodeOpId) external view returns (uint64);

        function isValidatorExitDelayPenaltyApplicable(
            uint64 nodeOpId,
            uint64 proofSlotTimestamp,
            bytes calldata pubkey,
            uint64 secondsSinceEligible
        ) external view returns (bool);
    }
}

/// The oracle ABI evolved from `submitExitRequestsData` to `submitReportData`;
/// both selectors are tried, in this order, when decoding an already-mined
/// transaction's calldata back into its packed payload (see Open Question 3
/// in `DESIGN.md`).
#[derive(Debug, Clone, Copy)]
pub enum OracleSelector {
    SubmitReportData,
    SubmitExitRequestsData,
}

pub const ORACLE_SELECTORS: &[OracleSelector] =
    &[OracleSelector::SubmitReportData, OracleSelector::SubmitExitRequestsData];

/// Resolve the node-operator-registry contract address responsible for a
/// given `moduleId` via the staking router, so per-module threshold lookups
/// (`exitDeadlineThreshold`) hit the right registry.
#[derive(Debug, Clone)]
pub struct RegistryDispatch {
    pub staking_router: Address,
}

impl RegistryDispatch {
    #[must_use]
    pub fn new(staking_router: Address) -> Self {
        Self { staking_router }
    }

    /// Look up the node-operator-registry address for `module_id` via the
    /// staking router. Not cached here; callers that resolve the same
    /// module repeatedly (the verification pass, one call per group) should
    /// keep their own `HashMap<u32, Address>` alongside a `ThresholdCache`.
    #[instrument(skip(self, rpc_url))]
    pub async fn resolve(&self, rpc_url: &str, module_id: u32) -> Result<Address> {
        let url: reqwest::Url = rpc_url.parse().context("invalid execution-layer RPC URL")?;
        let provider = ProviderBuilder::new().connect_http(url);
        let router = StakingRouter::new(self.staking_router, &provider);
        let address = router
            .getStakingModule(module_id)
            .call()
            .await
            .context("getStakingModule call failed")?;
        Ok(address)
    }
}

/// The three contract addresses the prover needs, resolved once at
/// startup from the root locator contract rather than configured
/// individually.
#[derive(Debug, Clone, Copy)]
pub struct ResolvedAddresses {
    pub staking_router: Address,
    pub exit_requests_oracle: Address,
    pub exit_delay_verifier: Address,
}

/// Resolve every downstream contract address from `lidoLocatorAddress`,
/// the same "one root address, everything else discovered from it" shape
/// `RegistryDispatch::resolve` already uses for the per-module registry
/// lookup.
#[instrument(skip(rpc_url))]
pub async fn resolve_from_locator(rpc_url: &str, locator: Address) -> Result<ResolvedAddresses> {
    let url: reqwest::Url = rpc_url.parse().context("invalid execution-layer RPC URL")?;
    let provider = ProviderBuilder::new().connect_http(url);
    let contract = LidoLocator::new(locator, &provider);

    let staking_router =
        contract.stakingRouter().call().await.context("LidoLocator.stakingRouter call failed")?;
    let exit_requests_oracle = contract
        .exitRequestsOracle()
        .call()
        .await
        .context("LidoLocator.exitRequestsOracle call failed")?;
    let exit_delay_verifier = contract
        .exitDelayVerifier()
        .call()
        .await
        .context("LidoLocator.exitDelayVerifier call failed")?;

    Ok(ResolvedAddresses { staking_router, exit_requests_oracle, exit_delay_verifier })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn oracle_selectors_are_ordered_report_first() {
        assert!(matches!(ORACLE_SELECTORS[0], OracleSelector::SubmitReportData));
        assert!(matches!(ORACLE_SELECTORS[1], OracleSelector::SubmitExitRequestsData));
    }
}
