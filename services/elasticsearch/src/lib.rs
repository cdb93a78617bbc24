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

//! SigV4 signing for Elasticsearch and OpenSearch transports.
//!
//! A [`Handler`] sits between a search client and its transport. For every
//! request it:
//!
//! 1. resolves credentials from a [`ProvideCredential`](searchsign_core::ProvideCredential),
//! 2. [`normalize`]s the inbound record into a [`CanonicalRequest`],
//! 3. signs it with a [`SignerAdapter`],
//! 4. turns the [`SignedRequest`] back into an outbound record with [`to_outbound`],
//! 5. delegates to the [`Transport`](searchsign_core::Transport) and returns its response.
//!
//! Without an explicit transport, [`HandlerBuilder::build`] picks the default
//! transport of an installed client library through [`detect_transport`].
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use searchsign_aws_v4::StaticCredentialProvider;
//! use searchsign_core::{Headers, InboundRequest, Transport};
//! use searchsign_elasticsearch::Handler;
//!
//! # async fn example(transport: Arc<dyn Transport>) -> searchsign_core::Result<()> {
//! let handler = Handler::builder()
//!     .region("us-west-2")
//!     .credential_provider(StaticCredentialProvider::new("foo", "bar").with_session_token("baz"))
//!     .transport(transport)
//!     .build()?;
//!
//! let resp = handler
//!     .handle(InboundRequest {
//!         method: "GET".to_string(),
//!         uri: "/index/_doc/1".to_string(),
//!         headers: Headers::from_iter([("host", vec!["search.example.com:443"])]),
//!         ..Default::default()
//!     })
//!     .await?;
//! println!("status: {}", resp.status());
//! # Ok(())
//! # }
//! ```

// Make sure all our public APIs have docs.
#![warn(missing_docs)]

mod config;
pub use config::{Config, DEFAULT_SERVICE};

mod normalize;
pub use normalize::{normalize, CanonicalRequest};

mod sign;
pub use sign::{SignedRequest, SignerAdapter};

mod translate;
pub use translate::{to_outbound, EmptyBody};

mod detect;
pub use detect::detect_transport;

mod handler;
pub use handler::{Handler, HandlerBuilder, SharedCredentialProvider};
