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

use bytes::Bytes;
use http::{Method, Uri};
use log::debug;
use searchsign_core::{Error, Headers, InboundRequest, Result};

/// A request in the shape the signer consumes.
///
/// The uri carries scheme, bare host (no port), path and query. `headers`
/// keeps the inbound keys with their casing; only the host value differs
/// from the inbound record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalRequest {
    /// HTTP method.
    pub method: Method,
    /// Absolute uri.
    pub uri: Uri,
    /// Request headers, host rewritten to the bare hostname.
    pub headers: Headers,
    /// Request body, empty if the inbound record has none.
    pub body: Bytes,
}

/// Convert an inbound record into a [`CanonicalRequest`].
///
/// The host header is looked up as `Host` first and `host` after that. Its
/// value is reduced to the hostname, dropping any port or scheme; a value
/// that doesn't parse is kept as given.
///
/// # Errors
///
/// Returns `RequestMalformed` if the record has no host header or the
/// method or uri can't be parsed.
///
/// ```
/// use searchsign_core::{Headers, InboundRequest};
/// use searchsign_elasticsearch::normalize;
///
/// let req = InboundRequest {
///     uri: "/index/_doc/1".to_string(),
///     headers: Headers::from_iter([("Host", vec!["search.example.com:443"])]),
///     ..Default::default()
/// };
/// let canonical = normalize(&req)?;
/// assert_eq!(canonical.uri.to_string(), "https://search.example.com/index/_doc/1");
/// assert_eq!(canonical.headers.get_first("Host"), Some("search.example.com"));
/// # Ok::<(), searchsign_core::Error>(())
/// ```
pub fn normalize(req: &InboundRequest) -> Result<CanonicalRequest> {
    let (key, value) = match req.headers.key("Host") {
        Some(key) => (
            key.to_string(),
            req.headers.get_first(key).unwrap_or_default(),
        ),
        None => {
            return Err(Error::request_malformed("request has no host header")
                .with_context(format!("uri: {}", req.uri)))
        }
    };
    let host = strip_host(value);

    let method = Method::from_bytes(req.method.as_bytes())?;

    let mut uri = format!("{}://{}", req.scheme, host);
    if !req.uri.starts_with('/') {
        uri.push('/');
    }
    uri.push_str(&req.uri);
    if let Some(query) = req.query_string.as_deref().filter(|q| !q.is_empty()) {
        uri.push('?');
        uri.push_str(query);
    }
    let uri: Uri = uri
        .parse()
        .map_err(|e| Error::from(e).with_context(format!("uri: {uri}")))?;

    let mut headers = req.headers.clone();
    headers.insert(key, host.clone());

    Ok(CanonicalRequest {
        method,
        uri,
        headers,
        body: req.body.clone().unwrap_or_default(),
    })
}

/// Reduce a host header value to its hostname.
fn strip_host(value: &str) -> String {
    match value.trim().parse::<Uri>() {
        Ok(uri) => match uri.host() {
            Some(host) if !host.is_empty() => host.to_string(),
            _ => {
                debug!("host header {value} has no host part, keeping it");
                value.to_string()
            }
        },
        Err(err) => {
            debug!("host header {value} is not parsable, keeping it: {err}");
            value.to_string()
        }
    }
}
