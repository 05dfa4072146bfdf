// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Usage accounting for the Parley conversation relay.
//!
//! Rolls token and message counts into a daily per-tenant/per-inbox ledger
//! keyed additionally by agent kind. The ledger row is the only contended
//! resource in the pipeline and is mutated exclusively through an additive
//! upsert.

pub mod ledger;

pub use ledger::{DailyUsage, UsageDelta, UsageLedger, UsageTotals};
