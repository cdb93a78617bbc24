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

use std::sync::Arc;

use log::debug;
use searchsign_core::{ClientLibrary, Error, InstalledClient, Result, Transport};

/// Pick the default transport among the installed client libraries.
///
/// OpenSearch clients win over legacy Elasticsearch clients. An Elasticsearch
/// 8+ client can't carry signed requests, so finding only that one is an
/// error rather than a fallback.
///
/// # Errors
///
/// - `UnsupportedClientVersion` if only Elasticsearch 8+ clients are installed.
/// - `MissingDependency` if no client is installed at all.
pub fn detect_transport(installed: &[Arc<dyn InstalledClient>]) -> Result<Arc<dyn Transport>> {
    for wanted in [ClientLibrary::OpenSearch, ClientLibrary::LegacyElasticsearch] {
        if let Some(client) = installed.iter().find(|c| c.library() == wanted) {
            debug!("using default transport of installed client {client:?}");
            return Ok(client.default_transport());
        }
    }

    if let Some(client) = installed.iter().find(|c| !c.library().is_supported()) {
        return Err(Error::unsupported_client_version(format!(
            "installed client {:?} doesn't accept signed requests",
            client.library()
        ))
        .with_context("hint: install an OpenSearch client or an Elasticsearch client before 8.0"));
    }

    Err(Error::missing_dependency(
        "no compatible search client is installed to provide a transport",
    )
    .with_context("hint: set a transport explicitly or enable the reqwest-transport feature"))
}
