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

use std::fmt::Debug;
use std::sync::Arc;

use bytes::Bytes;

use crate::{Error, OutboundRequest, Result};

/// Response returned by a transport.
///
/// Handlers hand it back to the caller verbatim; nothing in the signing
/// pipeline interprets it.
pub type TransportResponse = http::Response<Bytes>;

/// Transport performs the actual network I/O for a fully formed request.
#[async_trait::async_trait]
pub trait Transport: Debug + Send + Sync + 'static {
    /// Send the request and return whatever the remote answered.
    async fn send(&self, req: OutboundRequest) -> Result<TransportResponse>;
}

#[async_trait::async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn send(&self, req: OutboundRequest) -> Result<TransportResponse> {
        self.as_ref().send(req).await
    }
}

/// The search client libraries a default transport can come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientLibrary {
    /// OpenSearch clients.
    OpenSearch,
    /// Elasticsearch clients before 8.0, which share the OpenSearch request
    /// record contract.
    LegacyElasticsearch,
    /// Elasticsearch clients from 8.0 on. They ship their own transport layer
    /// and can't carry requests signed by a handler.
    Elasticsearch {
        /// Major version of the client.
        major: u64,
    },
}

impl ClientLibrary {
    /// Classify an Elasticsearch client by its version string, like `7.17.3`.
    pub fn elasticsearch(version: &str) -> Result<Self> {
        let major = version
            .trim()
            .trim_start_matches('v')
            .split('.')
            .next()
            .unwrap_or_default();
        let major: u64 = major.parse().map_err(|e| {
            Error::config_invalid(format!("invalid elasticsearch client version: {version}"))
                .with_source(anyhow::Error::new(e))
        })?;

        if major < 8 {
            Ok(ClientLibrary::LegacyElasticsearch)
        } else {
            Ok(ClientLibrary::Elasticsearch { major })
        }
    }

    /// Check if requests of this library can be signed by a handler.
    pub fn is_supported(&self) -> bool {
        !matches!(self, ClientLibrary::Elasticsearch { .. })
    }
}

/// InstalledClient is a search client library available to the application.
///
/// Handlers built without an explicit transport pick the default transport of
/// an installed client once, at construction time.
pub trait InstalledClient: Debug + Send + Sync + 'static {
    /// Which library this is.
    fn library(&self) -> ClientLibrary;

    /// The transport this library sends requests with by default.
    fn default_transport(&self) -> Arc<dyn Transport>;
}
