// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! Core components for signing search service requests.
//!
//! This crate provides the foundational types and traits shared by the
//! searchsign crates.
//!
//! ## Overview
//!
//! - **Context**: A container that holds implementations for file reading, HTTP sending and environment access
//! - **Credentials**: [`ProvideCredential`] resolves credentials, [`ProvideCredentialChain`] tries
//!   several sources in order and [`CachedCredentialProvider`] memoizes them
//! - **Signing**: [`SignRequest`] applies a signature to `http::request::Parts`
//! - **Records**: [`InboundRequest`] and [`OutboundRequest`] are the wire-neutral request records
//!   exchanged with search clients and transports
//! - **Transports**: [`Transport`] performs the network I/O, [`InstalledClient`] and
//!   [`ClientLibrary`] describe where a default transport comes from
//!
//! ## Example
//!
//! ```
//! use searchsign_core::{Headers, InboundRequest};
//!
//! let req = InboundRequest {
//!     method: "GET".to_string(),
//!     scheme: "https".to_string(),
//!     uri: "/index/_doc/1".to_string(),
//!     headers: Headers::from_iter([("host", vec!["search.example.com"])]),
//!     ..Default::default()
//! };
//! assert_eq!(req.host(), Some("search.example.com"));
//! ```
//!
//! ## Utilities
//!
//! - [`hash`]: Cryptographic hashing utilities
//! - [`time`]: Time manipulation utilities
//! - [`utils`]: General utilities including data redaction

// Make sure all our public APIs have docs.
#![warn(missing_docs)]

pub mod hash;
pub mod time;
pub mod utils;

mod error;
pub use error::{Error, ErrorKind, Result};

mod context;
pub use context::{Context, Env, FileRead, HttpSend, NoopEnv, NoopFileRead, NoopHttpSend, OsEnv, StaticEnv};

mod api;
pub use api::{ProvideCredential, SignRequest, SigningCredential};
mod chain;
pub use chain::ProvideCredentialChain;
mod cache;
pub use cache::CachedCredentialProvider;
mod request;
pub use request::SigningRequest;

mod record;
pub use record::{ClientOptions, Headers, InboundRequest, OutboundRequest, TransportRequest};
mod transport;
pub use transport::{ClientLibrary, InstalledClient, Transport, TransportResponse};
