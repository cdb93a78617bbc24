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

//! Signing search service requests with AWS SigV4 without effort.
//!
//! `searchsign` puts a SigV4 signing step in front of the transport of an
//! Elasticsearch or OpenSearch client:
//!
//! - [`elasticsearch`]: the request [`Handler`](elasticsearch::Handler) and its pipeline.
//! - [`aws`]: the SigV4 signer, credentials and credential providers.
//! - Core types such as [`InboundRequest`], [`Transport`] and [`Context`] at the
//!   crate root.
//!
//! ## Features
//!
//! - `default-context` (default): [`default_context`] and [`default_handler`].
//! - `reqwest-transport`: a reqwest based transport picked up by handlers
//!   built without an explicit one.
//!
//! ## Example
//!
//! ```no_run
//! # async fn example() -> searchsign::Result<()> {
//! use searchsign::{Headers, InboundRequest};
//!
//! let handler = searchsign::default_handler("us-west-2")?;
//! let resp = handler
//!     .handle(InboundRequest {
//!         uri: "/_cluster/health".to_string(),
//!         headers: Headers::from_iter([("host", vec!["search.example.com"])]),
//!         ..Default::default()
//!     })
//!     .await?;
//! println!("status: {}", resp.status());
//! # Ok(())
//! # }
//! ```

#![cfg_attr(docsrs, feature(doc_auto_cfg))]
// Make sure all our public APIs have docs.
#![warn(missing_docs)]

pub use searchsign_core::*;

#[cfg(feature = "default-context")]
mod context;
#[cfg(feature = "default-context")]
pub use context::{default_context, default_handler};

/// AWS SigV4 signer and credential providers.
pub mod aws {
    pub use searchsign_aws_v4::*;
}

/// Signing handler for Elasticsearch and OpenSearch transports.
pub mod elasticsearch {
    pub use searchsign_elasticsearch::*;
}

/// Reqwest based transport.
#[cfg(feature = "reqwest-transport")]
pub mod transport {
    pub use searchsign_transport_reqwest::*;
}
