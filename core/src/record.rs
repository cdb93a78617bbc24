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

//! Wire-neutral request records exchanged between search clients and transports.
//!
//! A search client hands an [`InboundRequest`] to a handler, and a transport
//! receives an [`OutboundRequest`]. Both share the [`TransportRequest`] shape.

use std::collections::BTreeMap;
use std::fmt::{self, Debug};
use std::time::Duration;

use bytes::Bytes;

/// Ordered header multimap with case-insensitive lookups.
///
/// Keys keep the casing they were first inserted with, so a transport that
/// cares about header casing gets back exactly what the client produced.
/// `Host` and `host` address the same entry.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: Vec<(String, Vec<String>)>,
}

impl Headers {
    /// Create an empty header map.
    pub fn new() -> Self {
        Self::default()
    }

    fn position(&self, name: &str) -> Option<usize> {
        // An exact match wins over a case-insensitive one.
        self.entries
            .iter()
            .position(|(k, _)| k == name)
            .or_else(|| {
                self.entries
                    .iter()
                    .position(|(k, _)| k.eq_ignore_ascii_case(name))
            })
    }

    /// Get all values of a header.
    pub fn get(&self, name: &str) -> Option<&[String]> {
        self.position(name).map(|idx| self.entries[idx].1.as_slice())
    }

    /// Get the first value of a header.
    pub fn get_first(&self, name: &str) -> Option<&str> {
        self.get(name)
            .and_then(|vs| vs.first())
            .map(|v| v.as_str())
    }

    /// Get the key of a header with the casing it's stored under.
    pub fn key(&self, name: &str) -> Option<&str> {
        self.position(name).map(|idx| self.entries[idx].0.as_str())
    }

    /// Check if the header exists.
    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Replace all values of a header with a single value.
    ///
    /// An existing entry keeps its key casing and position.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        match self.position(&name) {
            Some(idx) => self.entries[idx].1 = vec![value.into()],
            None => self.entries.push((name, vec![value.into()])),
        }
    }

    /// Append a value to a header, creating it if absent.
    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        match self.position(&name) {
            Some(idx) => self.entries[idx].1.push(value.into()),
            None => self.entries.push((name, vec![value.into()])),
        }
    }

    /// Remove a header, returning its values.
    pub fn remove(&mut self, name: &str) -> Option<Vec<String>> {
        self.position(name).map(|idx| self.entries.remove(idx).1)
    }

    /// Iterate headers in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries.iter().map(|(k, vs)| (k.as_str(), vs.as_slice()))
    }

    /// Number of distinct header names.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if there is no header.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Debug for Headers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut m = f.debug_map();
        for (k, vs) in self.iter() {
            if k.eq_ignore_ascii_case("authorization") || k.eq_ignore_ascii_case("x-amz-security-token")
            {
                m.entry(&k, &"<redacted>");
            } else {
                m.entry(&k, &vs);
            }
        }
        m.finish()
    }
}

impl<K, V> FromIterator<(K, Vec<V>)> for Headers
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, Vec<V>)>>(iter: I) -> Self {
        let mut headers = Headers::new();
        for (k, vs) in iter {
            let k = k.into();
            for v in vs {
                headers.append(k.clone(), v);
            }
        }
        headers
    }
}

/// Transport specific directives.
///
/// The signing pipeline never reads or writes these; they travel from the
/// inbound record to the outbound one untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientOptions {
    /// Total timeout for the request.
    pub timeout: Option<Duration>,
    /// Other transport specific parameters.
    pub params: BTreeMap<String, String>,
}

/// A request record in the shape search clients and transports exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportRequest {
    /// HTTP method, like `GET`.
    pub method: String,
    /// URI scheme, `http` or `https`.
    pub scheme: String,
    /// URI path, like `/index/_doc/1`.
    pub uri: String,
    /// Raw query string without the leading `?`.
    pub query_string: Option<String>,
    /// Request headers.
    pub headers: Headers,
    /// Request body.
    ///
    /// `None` means no body at all, which some transports treat differently
    /// from an empty one.
    pub body: Option<Bytes>,
    /// Transport specific directives.
    pub client: ClientOptions,
}

/// Request record received from a search client.
pub type InboundRequest = TransportRequest;

/// Request record handed to a transport.
pub type OutboundRequest = TransportRequest;

impl Default for TransportRequest {
    fn default() -> Self {
        Self {
            method: "GET".to_string(),
            scheme: "https".to_string(),
            uri: "/".to_string(),
            query_string: None,
            headers: Headers::new(),
            body: None,
            client: ClientOptions::default(),
        }
    }
}

impl TransportRequest {
    /// Value of the host header.
    pub fn host(&self) -> Option<&str> {
        self.headers.get_first("host")
    }

    /// Full url of this request, if it has a host header.
    ///
    /// ```
    /// use searchsign_core::{Headers, TransportRequest};
    ///
    /// let req = TransportRequest {
    ///     uri: "/index/_search".to_string(),
    ///     query_string: Some("size=1".to_string()),
    ///     headers: Headers::from_iter([("Host", vec!["search.example.com"])]),
    ///     ..Default::default()
    /// };
    /// assert_eq!(
    ///     req.url().as_deref(),
    ///     Some("https://search.example.com/index/_search?size=1")
    /// );
    /// ```
    pub fn url(&self) -> Option<String> {
        let host = self.host()?;
        let mut url = format!("{}://{}", self.scheme, host);
        if !self.uri.starts_with('/') {
            url.push('/');
        }
        url.push_str(&self.uri);
        if let Some(query) = self.query_string.as_deref().filter(|q| !q.is_empty()) {
            url.push('?');
            url.push_str(query);
        }
        Some(url)
    }
}
