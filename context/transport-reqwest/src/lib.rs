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

//! Reqwest-based search transport for searchsign.
//!
//! `ReqwestTransport` executes an [`OutboundRequest`] over HTTP and returns
//! the raw response. It's also an [`InstalledClient`], so handlers built
//! without an explicit transport can pick it up as their default.
//!
//! ## Example
//!
//! ```no_run
//! use searchsign_core::{Headers, OutboundRequest, Transport};
//! use searchsign_transport_reqwest::ReqwestTransport;
//!
//! # async fn example() -> searchsign_core::Result<()> {
//! let transport = ReqwestTransport::default();
//! let resp = transport
//!     .send(OutboundRequest {
//!         uri: "/_cluster/health".to_string(),
//!         headers: Headers::from_iter([("Host", vec!["search.example.com"])]),
//!         ..Default::default()
//!     })
//!     .await?;
//! println!("status: {}", resp.status());
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use http_body_util::BodyExt;
use log::debug;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method};
use searchsign_core::{
    ClientLibrary, Error, InstalledClient, OutboundRequest, Result, Transport, TransportResponse,
};

/// Reqwest-based implementation of the `Transport` trait.
#[derive(Debug, Default, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Create a new ReqwestTransport with a reqwest::Client.
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn build(&self, req: OutboundRequest) -> Result<reqwest::Request> {
        let url = req.url().ok_or_else(|| {
            Error::request_malformed("request without host header can't be sent")
                .with_context(format!("uri: {}", req.uri))
        })?;
        let method = Method::from_bytes(req.method.as_bytes())?;

        let mut headers = HeaderMap::with_capacity(req.headers.len());
        for (name, values) in req.headers.iter() {
            let name = HeaderName::from_bytes(name.as_bytes())?;
            for value in values {
                headers.append(name.clone(), HeaderValue::from_str(value)?);
            }
        }

        let mut builder = self.client.request(method, &url).headers(headers);
        if let Some(body) = req.body {
            builder = builder.body(body);
        }
        if let Some(timeout) = req.client.timeout {
            builder = builder.timeout(timeout);
        }

        builder.build().map_err(|e| {
            Error::request_malformed("failed to build transport request")
                .with_source(e)
                .with_context(format!("url: {url}"))
        })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, req: OutboundRequest) -> Result<TransportResponse> {
        let req = self.build(req)?;
        debug!("sending {} {}", req.method(), req.url());

        let resp: http::Response<_> = self
            .client
            .execute(req)
            .await
            .map_err(|e| Error::unexpected("failed to send search request").with_source(e))?
            .into();

        let (parts, body) = resp.into_parts();
        let bs = BodyExt::collect(body)
            .await
            .map(|buf| buf.to_bytes())
            .map_err(|e| Error::unexpected("failed to read search response body").with_source(e))?;
        Ok(http::Response::from_parts(parts, bs))
    }
}

impl InstalledClient for ReqwestTransport {
    fn library(&self) -> ClientLibrary {
        ClientLibrary::OpenSearch
    }

    fn default_transport(&self) -> Arc<dyn Transport> {
        Arc::new(self.clone())
    }
}
