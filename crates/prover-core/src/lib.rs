//! # Prover Core
//!
//! Deadline tracking and SSZ Merkle proof generation for validator
//! exit-delay penalties. Covers beacon-chain access, deadline arithmetic,
//! persistent validator tracking, gas management, transaction execution, and
//! the Merkle proofs (`validators[i]` inclusion and, for stale deadlines,
//! `historicalSummaries[i]` inclusion) a penalty submission needs.

pub mod beacon_client;
pub mod contracts;
pub mod deadline;
pub mod decoder;
pub mod error;
pub mod executor;
pub mod gas;
pub mod gindex;
pub mod model;
pub mod persistence;
pub mod proof;
pub mod prover;
pub mod root_provider;
pub mod secrets;
pub mod sparse_proof;
pub mod ssz_types;
pub mod store;

pub use beacon_client::BeaconClient;
pub use contracts::{ExitDelayVerifier, ExitRequestsOracle, NodeOperatorRegistry, RegistryDispatch};
pub use executor::{ExecutorConfig, ExecutorError, Submission, TransactionExecutor};
pub use gindex::GindexCalculator;
pub use model::*;
pub use proof::{build_historical_state_proof, build_validator_proof, ProofError};
pub use prover::{ProverConfig, ProverCore};
pub use root_provider::{Bootstrap, RootPair, RootProvider};
pub use ssz_types::{BeaconStateView, ForkName};
pub use store::{ReportedSet, ValidatorStore};
