//! Effect trait definitions
//!
//! Pure trait definitions for every side effect the engine performs: reading
//! the clock, drawing entropy, and talking to storage. Handlers live in
//! `warden-effects`; domain crates are parameterized by these traits so they
//! run identically against production handlers and deterministic test ones.

pub mod persistence;
pub mod random;
pub mod time;

pub use persistence::PersistenceEffects;
pub use random::RandomEffects;
pub use time::{PhysicalTime, PhysicalTimeEffects};
