#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! Core types for the JSON payment protocol (version 2).
//!
//! This crate holds the data structures shared by every role that speaks the
//! protocol: the wire format of the four request/response pairs, and the
//! trusted-key records used to authenticate merchant responses.
//!
//! # Overview
//!
//! A payment negotiation runs in four steps against a single payment URL:
//!
//! 1. `GET` the payment options (chains and currencies the merchant accepts).
//! 2. `POST` the selected chain/currency and receive payment instructions.
//! 3. `POST` unsigned transactions for fee and output verification.
//! 4. `POST` signed transactions for settlement.
//!
//! Every response is signed by a merchant identity. The client only trusts an
//! identity it knows in advance, see [`trust::TrustStore`].
//!
//! # Modules
//!
//! - [`proto`] - Wire format types, header names and content types
//! - [`trust`] - Trusted-key records and the read-only trust store
//! - [`amount`] - Conversion of integer minor units to decimal amounts
//! - [`util`] - Helper types (hex-encoded bytes)

pub mod amount;
pub mod proto;
pub mod trust;
pub mod util;
