#![doc = "q2-mapbot-core: core logic library for q2-mapbot."]

//! This crate contains the two subsystems of q2-mapbot:
//!
//! - the Quake 2 status client ([`status`], [`infostring`], [`format`]), which sends one
//!   connectionless `status` datagram and renders the reply;
//! - the content ingestion pipeline ([`ingest`], [`classify`], [`stage`], [`publish`]),
//!   which turns an uploaded `.bsp`, `.zip` or `.pak` into a commit in a git repository.
//!
//! Chat plumbing and process setup live in the `q2-mapbot` binary crate. Downloads, map
//! validation and git access are reached through the traits in [`contract`].

pub mod bsp;
pub mod classify;
pub mod config;
pub mod contract;
pub mod download;
pub mod error;
pub mod format;
pub mod git;
pub mod infostring;
pub mod ingest;
pub mod pak;
pub mod publish;
pub mod stage;
pub mod status;
