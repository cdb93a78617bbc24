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

//! AWS SigV4 signing and credential loading for searchsign.
//!
//! ## Example
//!
//! ```no_run
//! use searchsign_aws_v4::{DefaultCredentialProvider, RequestSigner};
//! use searchsign_core::{Context, OsEnv, ProvideCredential, SignRequest};
//!
//! # async fn example() -> searchsign_core::Result<()> {
//! let ctx = Context::new().with_env(OsEnv);
//! let provider = DefaultCredentialProvider::new();
//! let signer = RequestSigner::new("es", "us-west-2");
//!
//! let cred = provider.provide_credential(&ctx).await?;
//! let (mut parts, body) = http::Request::get("https://search.example.com/_cluster/health")
//!     .body(bytes::Bytes::new())?
//!     .into_parts();
//! signer.sign_request(&ctx, &mut parts, &body, cred.as_ref()).await?;
//! # Ok(())
//! # }
//! ```

// Make sure all our public APIs have docs.
#![warn(missing_docs)]

mod constants;
pub use constants::UNSIGNED_HEADERS;
pub use constants::{X_AMZ_CONTENT_SHA_256, X_AMZ_DATE, X_AMZ_SECURITY_TOKEN};

mod credential;
pub use credential::Credential;

mod sign_request;
pub use sign_request::RequestSigner;

mod provide_credential;
pub use provide_credential::*;
