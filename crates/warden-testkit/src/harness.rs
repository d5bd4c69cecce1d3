//! Coordinator test harness
//!
//! One account, a simulated clock, fault-injecting memory persistence and
//! both stock signer back-ends. Handler clones share state, so the harness
//! can move the clock, bind credentials and break storage underneath a
//! running coordinator.

use crate::keys::secret_from_seed;
use crate::mocks::FaultyPersistence;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use warden_coordinator::{
    EnrollmentRequest, OperationDraft, OperationRequest, PendingOperationCoordinator,
    SignatureSubmission, SubmissionOutcome,
};
use warden_core::effects::PersistenceEffects;
use warden_core::types::{
    AccountId, OperationId, OperationIntent, OperationKind, PendingOperation, SignerKind,
    SigningPolicy, Validator, ValidatorId, ValidatorRole, Wei,
};
use warden_core::{CoordinatorConfig, WardenResult};
use warden_effects::{
    Ed25519CredentialHandler, IdentityClaim, IssuerAttestationHandler, SimulatedClockHandler,
    WardenEffectSystem, TEST_EPOCH_MS,
};
use warden_signature::{CanonicalMessage, SignerVerifierRegistry};

/// Account every harness operates on
pub const TEST_ACCOUNT: &str = "0xa11ce";

/// Install a test-writer subscriber once; honours `RUST_LOG`
pub fn init_test_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

/// Coordinator wired to deterministic handlers
pub struct TestHarness {
    /// Account under test
    pub account: AccountId,
    /// Shared simulated clock
    pub clock: SimulatedClockHandler,
    /// Shared store
    pub persistence: FaultyPersistence,
    /// Credential back-end and keystore
    pub credentials: Ed25519CredentialHandler,
    /// Identity back-end and issuer keys
    pub identities: IssuerAttestationHandler,
    /// Coordinator under test
    pub coordinator: PendingOperationCoordinator<WardenEffectSystem>,
    seed: u64,
    spawned: AtomicU64,
    config: CoordinatorConfig,
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

impl TestHarness {
    /// Default timing, seed 42
    pub fn new() -> Self {
        Self::with_config(CoordinatorConfig::default())
    }

    /// Custom timing
    pub fn with_config(config: CoordinatorConfig) -> Self {
        init_test_logging();
        let clock = SimulatedClockHandler::new(TEST_EPOCH_MS);
        let persistence = FaultyPersistence::new();
        let credentials = Ed25519CredentialHandler::new();
        let identities = IssuerAttestationHandler::new();
        let seed = 42;
        let coordinator = build_coordinator(
            seed,
            &clock,
            &persistence,
            stock_signers(&credentials, &identities),
            config.clone(),
        );
        Self {
            account: AccountId::new(TEST_ACCOUNT),
            clock,
            persistence,
            credentials,
            identities,
            coordinator,
            seed,
            spawned: AtomicU64::new(0),
            config,
        }
    }

    /// A second coordinator over the same clock, store and back-ends but
    /// with its own locks, as a separate process would have
    pub fn another_coordinator(&self) -> PendingOperationCoordinator<WardenEffectSystem> {
        self.coordinator_with_signers(self.signers())
    }

    /// Coordinator over the shared handlers using `signers`.
    ///
    /// Each one draws from a fresh entropy seed so operation ids never
    /// collide with the primary coordinator's.
    pub fn coordinator_with_signers(
        &self,
        signers: SignerVerifierRegistry,
    ) -> PendingOperationCoordinator<WardenEffectSystem> {
        let offset = self.spawned.fetch_add(1, Ordering::Relaxed) + 1;
        build_coordinator(
            self.seed.wrapping_add(offset),
            &self.clock,
            &self.persistence,
            signers,
            self.config.clone(),
        )
    }

    /// Registry with both stock back-ends
    pub fn signers(&self) -> SignerVerifierRegistry {
        stock_signers(&self.credentials, &self.identities)
    }

    // =========================================================================
    // SETUP
    // =========================================================================

    /// Bind a deterministic Ed25519 credential for `id` and enroll it
    pub async fn enroll_credential(&self, id: &str, role: ValidatorRole) -> Validator {
        let validator_id = ValidatorId::from(id);
        let material = self
            .credentials
            .bind_credential(&validator_id, secret_from_seed(id));
        self.coordinator
            .enroll_validator(
                &self.account,
                EnrollmentRequest::new(
                    validator_id,
                    SignerKind::CredentialBound,
                    id.to_uppercase(),
                    material,
                    role,
                ),
            )
            .await
            .expect("credential enrollment")
    }

    /// Register `issuer`, link an identity for `id` and enroll it
    pub async fn enroll_identity(&self, id: &str, issuer: &str, role: ValidatorRole) -> Validator {
        let validator_id = ValidatorId::from(id);
        self.identities
            .register_issuer(issuer, secret_from_seed(issuer));
        let material = self
            .identities
            .link_identity(&validator_id, IdentityClaim::new(issuer, format!("{id}@{issuer}")))
            .expect("identity claim");
        self.coordinator
            .enroll_validator(
                &self.account,
                EnrollmentRequest::new(
                    validator_id,
                    SignerKind::FederatedIdentity,
                    id.to_uppercase(),
                    material,
                    role,
                ),
            )
            .await
            .expect("identity enrollment")
    }

    /// Store a policy for the account
    pub async fn set_policy(&self, policy: SigningPolicy) {
        self.coordinator
            .update_policy(&self.account, policy)
            .await
            .expect("policy update");
    }

    // =========================================================================
    // OPERATIONS
    // =========================================================================

    /// Prepare an operation of `kind` moving `value`
    pub async fn prepare(&self, kind: OperationKind, value: Wei) -> WardenResult<OperationDraft> {
        self.coordinator
            .prepare_operation(OperationRequest::new(
                self.account.clone(),
                kind,
                OperationIntent::new("0xdead00000000000000000000000000000000beef", value),
            ))
            .await
    }

    /// Prepare and create an operation with no inline signature
    pub async fn open(&self, kind: OperationKind, value: Wei) -> PendingOperation {
        let draft = self.prepare(kind, value).await.expect("prepare");
        self.coordinator
            .create_operation(draft, None)
            .await
            .expect("create")
    }

    /// Signature by `validator` over a stored operation.
    ///
    /// Signs through the back-end directly, so revoked validators can still
    /// produce a submission.
    pub async fn submission(
        &self,
        operation_id: OperationId,
        validator: &str,
    ) -> SignatureSubmission {
        let message = self
            .coordinator
            .canonical_message(&self.account, &operation_id)
            .await
            .expect("operation exists");
        self.sign(&message, validator).await
    }

    /// Signature by `validator` over a draft's message
    pub async fn draft_submission(
        &self,
        draft: &OperationDraft,
        validator: &str,
    ) -> SignatureSubmission {
        self.sign(draft.message(), validator).await
    }

    /// Sign and submit in one step
    pub async fn submit(
        &self,
        operation_id: OperationId,
        validator: &str,
    ) -> WardenResult<SubmissionOutcome> {
        let submission = self.submission(operation_id, validator).await;
        self.coordinator
            .submit_signature(&self.account, &operation_id, submission)
            .await
    }

    async fn sign(&self, message: &CanonicalMessage, validator: &str) -> SignatureSubmission {
        let validator_id = ValidatorId::from(validator);
        let enrolled = self
            .coordinator
            .list_validators(&self.account)
            .await
            .expect("validators load")
            .into_iter()
            .find(|v| v.id == validator_id)
            .expect("validator enrolled");
        let signature = self
            .coordinator
            .signers()
            .sign(message, &enrolled)
            .await
            .expect("back-end signs");
        SignatureSubmission::new(validator_id, signature, enrolled.kind)
    }

    // =========================================================================
    // INSPECTION
    // =========================================================================

    /// Stored copy of an operation, bypassing the coordinator
    pub async fn stored(&self, operation_id: OperationId) -> PendingOperation {
        self.persistence
            .load_operation(&self.account, &operation_id)
            .await
            .expect("store readable")
            .expect("operation stored")
    }

    /// Rewrite a stored operation behind the coordinator's back
    pub async fn tamper(
        &self,
        operation_id: OperationId,
        edit: impl FnOnce(&mut PendingOperation),
    ) {
        let mut operation = self.stored(operation_id).await;
        let version = operation.version;
        edit(&mut operation);
        self.persistence
            .save_pending_operation(&self.account, &operation, Some(version))
            .await
            .expect("tamper write");
    }

    /// Move simulated time forward
    pub fn advance(&self, by: Duration) {
        self.clock.advance(by);
        tracing::trace!(now_ms = self.clock.now_ms(), "simulated clock advanced");
    }

    /// Current simulated time (ms)
    pub fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }
}

fn stock_signers(
    credentials: &Ed25519CredentialHandler,
    identities: &IssuerAttestationHandler,
) -> SignerVerifierRegistry {
    SignerVerifierRegistry::builder()
        .with_credential_verifier(Arc::new(credentials.clone()))
        .with_identity_signer(Arc::new(identities.clone()))
        .build()
}

fn build_coordinator(
    seed: u64,
    clock: &SimulatedClockHandler,
    persistence: &FaultyPersistence,
    signers: SignerVerifierRegistry,
    config: CoordinatorConfig,
) -> PendingOperationCoordinator<WardenEffectSystem> {
    let effects = WardenEffectSystem::for_testing(seed)
        .with_time(Arc::new(clock.clone()))
        .with_persistence(Arc::new(persistence.clone()));
    PendingOperationCoordinator::new(
        Arc::new(effects),
        signers,
        config,
        SigningPolicy::single_signer(),
    )
}
