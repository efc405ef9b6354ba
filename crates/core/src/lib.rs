//! Core account types and Azure AD linking logic for plotdeck.
//!
//! This crate holds the functional core shared by the server crates:
//! - Account types (`User`, `AuthMethod`)
//! - The account-linking decision logic (`AccountLinker`)
//! - Repository and provider traits implemented by the I/O crates

pub mod account;
pub mod auth;
pub mod storage;
