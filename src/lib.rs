//! Tile Traffic Library
//!
//! A grid road-tile traffic simulation that runs headless and can be driven
//! by any renderer through its snapshots.

pub mod simulation;
