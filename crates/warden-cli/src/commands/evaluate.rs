//! The `evaluate` command: what the default policy asks of an operation

use anyhow::Result;
use clap::{Args, ValueEnum};
use serde::Serialize;
use warden_core::types::{OperationKind, Wei};
use warden_core::WardenConfig;
use warden_policy::{SignatureRequirement, SigningPolicyEvaluator};

/// Operation kinds accepted on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum KindArg {
    /// Native value transfer
    Transfer,
    /// Arbitrary contract call
    ContractInteraction,
    /// NFT transfer
    NftTransfer,
    /// Token allowance approval
    TokenApproval,
    /// Enroll a new signer
    AddSigner,
    /// Revoke a signer
    RemoveSigner,
    /// Replace the signing policy
    UpdatePolicy,
}

impl From<KindArg> for OperationKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Transfer => OperationKind::Transfer,
            KindArg::ContractInteraction => OperationKind::ContractInteraction,
            KindArg::NftTransfer => OperationKind::NftTransfer,
            KindArg::TokenApproval => OperationKind::TokenApproval,
            KindArg::AddSigner => OperationKind::AddSigner,
            KindArg::RemoveSigner => OperationKind::RemoveSigner,
            KindArg::UpdatePolicy => OperationKind::UpdatePolicy,
        }
    }
}

/// Arguments of `warden evaluate`
#[derive(Debug, Clone, Args)]
pub struct EvaluateArgs {
    /// Operation kind
    #[arg(long, value_enum)]
    pub kind: KindArg,

    /// Value moved, in wei
    #[arg(long, default_value_t = 0)]
    pub value: u128,

    /// Active validators on the account
    #[arg(long, default_value_t = 1)]
    pub active: u32,
}

#[derive(Serialize)]
struct Report {
    kind: OperationKind,
    value: Wei,
    active_validators: u32,
    requirement: SignatureRequirement,
    /// Problem with the policy itself at this validator count, if any
    policy_problem: Option<String>,
}

/// Evaluate `args` against the configured default policy
pub fn evaluate(config: &WardenConfig, args: &EvaluateArgs) -> Result<String> {
    let evaluator = SigningPolicyEvaluator::new();
    let kind = OperationKind::from(args.kind);
    let value = Wei(args.value);
    let policy = &config.default_policy;

    let requirement = evaluator.required_signatures(kind, value, policy, args.active)?;
    let policy_problem = evaluator
        .validate_policy(policy, args.active)
        .err()
        .map(|e| e.to_string());
    tracing::debug!(%kind, %value, required = requirement.required, "policy evaluated");

    let report = Report {
        kind,
        value,
        active_validators: args.active,
        requirement,
        policy_problem,
    };
    Ok(serde_json::to_string_pretty(&report)?)
}
