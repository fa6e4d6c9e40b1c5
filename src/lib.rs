// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Travel auth gateway: signup, password login and Google sign-in over HTTP.
//!
//! Identity verification is delegated to Firebase Authentication and user
//! profiles are kept in Firestore; this crate only validates requests and
//! translates results.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use services::AuthGateway;

/// Shared application state.
pub struct AppState {
    pub gateway: AuthGateway,
}
