//! # EcoMon Core Library
//!
//! Deterministic state-evolution engine for an eco-action companion pet.
//!
//! Every guardian owns one [`Companion`] whose state is the composition of
//! five small components:
//!
//! - **Emotion** — trust, joy, curiosity, worry, pride (each 0–100)
//! - **Mood** — a discrete tag classified from the emotions by priority rules
//! - **Memory log** — the last 50 notable events, each with a mood snapshot
//! - **Evolution ledger** — XP, stage 1–5 and a single-commit branch
//! - **Corruption tracker** — neglect counter that can force the dark form
//!
//! Life events ([`CompanionEvent`]) are folded into a companion through
//! [`Companion::apply_event`]. The [`reward`] module translates verified
//! actions and quiz tallies into points and XP.
//!
//! Nothing in this crate performs I/O except [`persistence`], and nothing
//! talks to an AI model: verification confidence and action types arrive as
//! opaque inputs.

#![deny(clippy::unwrap_used)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod companion;
pub mod config;
pub mod corruption;
pub mod emotion;
pub mod error;
pub mod evolution;
pub mod guardian;
pub mod memory;
pub mod mood;
pub mod persistence;
pub mod reward;
pub mod types;

pub use companion::{Companion, CompanionEvent, EventOutcome};
pub use config::EngineConfig;
pub use error::EcomonError;
pub use guardian::{ActivityStats, Guardian};
pub use persistence::{AccountRecord, CompanionStore};
pub use types::*;
