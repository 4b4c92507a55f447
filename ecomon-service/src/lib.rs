//! # ecomon-service — Service layer for EcoMon
//!
//! Hosts many guardians and their companions on top of `ecomon-core`:
//!
//! - [`registry`] — per-account state behind one lock each, optional SQLite
//!   write-through
//! - [`hooks`] — turn chat, verifier verdicts, quiz answers and idle time
//!   into engine events
//! - [`service`] — orchestrates collaborators with graceful fallbacks
//! - [`mint`] — achievement catalog and the minting contract
//! - [`metrics`] / [`telemetry`] — counters and tracing setup
//!
//! ```no_run
//! use ecomon_core::{Personality, Species, UserId};
//! use ecomon_llm::{KeywordVerifier, TemplateGenerator};
//! use ecomon_service::{CompanionService, ServiceConfig, SimulatedMint};
//!
//! # async fn demo() -> ecomon_service::Result<()> {
//! let service = CompanionService::new(
//!     ServiceConfig::default(),
//!     TemplateGenerator::new(),
//!     KeywordVerifier,
//!     SimulatedMint::new(),
//! )?;
//! let user = UserId::new();
//! service.register(user, "Ari")?;
//! service.adopt(user, "Sprout", Species::Leaf, Personality::Cheerleader)?;
//! let reply = service.chat(user, "hello!", &[]).await?;
//! println!("{}", reply.reply);
//! # Ok(())
//! # }
//! ```

#![deny(clippy::unwrap_used)]
#![warn(missing_docs, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod hooks;
pub mod metrics;
pub mod mint;
pub mod registry;
pub mod service;
pub mod telemetry;

pub use config::{ServiceConfig, ServiceSettings};
pub use error::{Result, ServiceError};
pub use metrics::{CounterSnapshot, EcomonCounters};
pub use mint::{AchievementData, MintError, MintReceipt, MintService, NftType, Rarity, SimulatedMint};
pub use registry::{Applied, CompanionRegistry};
pub use service::{ChatReply, CompanionService, PhotoVerification, QuizSubmission};
pub use telemetry::init_tracing;
