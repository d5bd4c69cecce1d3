//! The `message` command: canonical bytes a validator signs

use super::evaluate::KindArg;
use anyhow::{bail, Context, Result};
use clap::Args;
use serde::Serialize;
use uuid::Uuid;
use warden_core::effects::{PhysicalTimeEffects, RandomEffects};
use warden_core::types::{AccountId, OperationId, OperationIntent, OperationKind, Wei};
use warden_signature::{CanonicalMessage, MessagePayload};

/// Arguments of `warden message`
#[derive(Debug, Clone, Args)]
pub struct MessageArgs {
    /// Operation id
    #[arg(long)]
    pub operation_id: Uuid,

    /// Owning account
    #[arg(long)]
    pub account: String,

    /// Operation kind
    #[arg(long, value_enum)]
    pub kind: KindArg,

    /// Destination address, contract or governance subject
    #[arg(long)]
    pub target: String,

    /// Value moved, in wei
    #[arg(long, default_value_t = 0)]
    pub value: u128,

    /// Hex payload, with or without a 0x prefix
    #[arg(long)]
    pub data: Option<String>,

    /// Operation creation time (ms since epoch); read from the clock when omitted
    #[arg(long)]
    pub issued_at_ms: Option<u64>,

    /// 32-byte operation nonce in hex; drawn fresh when omitted
    #[arg(long)]
    pub nonce: Option<String>,
}

#[derive(Serialize)]
struct Rendered {
    message: String,
    digest: String,
    length: usize,
    issued_at_ms: u64,
    nonce: String,
}

/// Rebuild the canonical message described by `args`.
///
/// A missing issuance time or nonce is filled from `effects`, the way a new
/// draft would be.
pub async fn render_message<E>(args: &MessageArgs, effects: &E) -> Result<String>
where
    E: PhysicalTimeEffects + RandomEffects,
{
    let data = match &args.data {
        Some(data) => decode_hex(data).context("decoding --data")?,
        None => Vec::new(),
    };
    let nonce: [u8; 32] = match &args.nonce {
        Some(nonce) => match decode_hex(nonce).context("decoding --nonce")?.try_into() {
            Ok(nonce) => nonce,
            Err(bytes) => bail!("nonce must be 32 bytes, got {}", bytes.len()),
        },
        None => effects.random_bytes_32().await,
    };
    let issued_at_ms = match args.issued_at_ms {
        Some(issued_at_ms) => issued_at_ms,
        None => effects.physical_time().await?.ts_ms,
    };

    let account = AccountId::new(args.account.as_str());
    let intent = OperationIntent::new(args.target.as_str(), Wei(args.value)).with_data(data);
    let message = CanonicalMessage::build(
        &OperationId::from_uuid(args.operation_id),
        &MessagePayload {
            account_id: &account,
            kind: OperationKind::from(args.kind),
            intent: &intent,
            issued_at_ms,
            nonce: &nonce,
        },
    );

    let rendered = Rendered {
        message: hex::encode(message.as_bytes()),
        digest: message.digest_hex(),
        length: message.as_bytes().len(),
        issued_at_ms,
        nonce: hex::encode(nonce),
    };
    Ok(serde_json::to_string_pretty(&rendered)?)
}

fn decode_hex(input: &str) -> Result<Vec<u8>> {
    let trimmed = input.strip_prefix("0x").unwrap_or(input);
    Ok(hex::decode(trimmed)?)
}
