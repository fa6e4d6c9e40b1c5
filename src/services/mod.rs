// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - identity adapters and the gateway itself.

pub mod firebase;
pub mod gateway;
pub mod id_token;
pub mod identity;

pub use firebase::FirebaseIdentity;
pub use gateway::{Admin, AuthGateway};
pub use id_token::IdTokenVerifier;
pub use identity::{IdentityError, IdentityProvider, VerifiedIdentity};
