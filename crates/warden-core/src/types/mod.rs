//! Domain data model shared by every layer

pub mod identifiers;
pub mod operation;
pub mod policy;
pub mod validator;

pub use identifiers::{AccountId, OperationId, ValidatorId};
pub use operation::{
    EncodedSignature, OperationIntent, OperationKind, OperationState, PendingOperation,
    Rejection, ValidatorSignature,
};
pub use policy::{OperationCategory, SigningPolicy, Wei};
pub use validator::{
    PublicMaterial, SignerKind, Validator, ValidatorLookup, ValidatorRole, ValidatorStatus,
};
