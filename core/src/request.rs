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

use std::mem;
use std::str::FromStr;

use http::uri::Authority;
use http::uri::PathAndQuery;
use http::uri::Scheme;
use http::HeaderMap;
use http::HeaderValue;
use http::Method;
use http::Uri;

use crate::{Error, Result};

/// Signing context for request.
///
/// Built from `http::request::Parts` by taking the uri and headers out of it,
/// and applied back after the signer is done.
#[derive(Debug)]
pub struct SigningRequest {
    /// HTTP method.
    pub method: Method,
    /// HTTP scheme.
    pub scheme: Scheme,
    /// HTTP authority.
    pub authority: Authority,
    /// HTTP path, as given.
    pub path: String,
    /// HTTP query parameters.
    pub query: Vec<(String, String)>,
    /// HTTP headers.
    pub headers: HeaderMap,
}

impl SigningRequest {
    /// Build a signing context from http::request::Parts.
    pub fn build(parts: &mut http::request::Parts) -> Result<Self> {
        let uri = mem::take(&mut parts.uri).into_parts();
        let paq = uri
            .path_and_query
            .unwrap_or_else(|| PathAndQuery::from_static("/"));

        Ok(SigningRequest {
            method: parts.method.clone(),
            scheme: uri.scheme.unwrap_or(Scheme::HTTPS),
            authority: uri.authority.ok_or_else(|| {
                Error::request_malformed("request without authority is invalid for signing")
            })?,
            path: paq.path().to_string(),
            query: paq
                .query()
                .map(|v| {
                    form_urlencoded::parse(v.as_bytes())
                        .map(|(k, v)| (k.into_owned(), v.into_owned()))
                        .collect()
                })
                .unwrap_or_default(),

            // Take the headers out of the request to avoid copy.
            // We will return it back when apply the context.
            headers: mem::take(&mut parts.headers),
        })
    }

    /// Apply the signing context back to http::request::Parts.
    ///
    /// The query is rebuilt from the (possibly re-encoded) pairs.
    pub fn apply(mut self, parts: &mut http::request::Parts) -> Result<()> {
        mem::swap(&mut parts.headers, &mut self.headers);
        parts.method = self.method;
        parts.uri = {
            let mut uri_parts = mem::take(&mut parts.uri).into_parts();
            uri_parts.scheme = Some(self.scheme);
            uri_parts.authority = Some(self.authority);
            uri_parts.path_and_query = {
                let paq = if self.query.is_empty() {
                    self.path
                } else {
                    let mut s = self.path;
                    s.push('?');
                    s.push_str(&Self::query_to_string(&self.query));
                    s
                };

                Some(PathAndQuery::from_str(&paq)?)
            };
            Uri::from_parts(uri_parts)?
        };

        Ok(())
    }

    /// Join query pairs as `k1=v1&k2=v2`, in their current order.
    ///
    /// Keys with empty values are kept as `k=`, which is what SigV4 expects in
    /// the canonical query string.
    pub fn query_to_string(query: &[(String, String)]) -> String {
        let mut s = String::with_capacity(16);
        for (idx, (k, v)) in query.iter().enumerate() {
            if idx != 0 {
                s.push('&');
            }
            s.push_str(k);
            s.push('=');
            s.push_str(v);
        }
        s
    }

    /// Get all values of a header joined by `,`, the way SigV4 folds
    /// repeated headers into one canonical line.
    pub fn header_values_joined(&self, key: &str) -> Result<String> {
        let mut values = Vec::new();
        for v in self.headers.get_all(key) {
            values.push(v.to_str()?);
        }
        Ok(values.join(","))
    }

    /// Normalize header value by trimming surrounding spaces.
    pub fn header_value_normalize(v: &mut HeaderValue) -> Result<()> {
        let bs = v.as_bytes();

        let starting_index = bs.iter().position(|b| *b != b' ').unwrap_or(0);
        let ending_offset = bs.iter().rev().position(|b| *b != b' ').unwrap_or(0);
        let ending_index = bs.len() - ending_offset;

        *v = HeaderValue::from_bytes(&bs[starting_index..ending_index])?;
        Ok(())
    }

    /// Get header names as sorted vector, skipping names matched by `skip`.
    pub fn header_name_to_vec_sorted(&self, skip: impl Fn(&str) -> bool) -> Vec<&str> {
        let mut h = self
            .headers
            .keys()
            .map(|k| k.as_str())
            .filter(|k| !skip(k))
            .collect::<Vec<&str>>();
        h.sort_unstable();

        h
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parts(uri: &str) -> http::request::Parts {
        http::Request::builder()
            .method(Method::GET)
            .uri(uri)
            .header("Host", "search.example.com")
            .header("x-custom", "  padded  ")
            .body(())
            .expect("request must be valid")
            .into_parts()
            .0
    }

    #[test]
    fn test_build_and_apply() -> Result<()> {
        let mut p = parts("https://search.example.com/index/_search?q=title:rust&size=10");
        let req = SigningRequest::build(&mut p)?;

        assert_eq!(req.scheme, Scheme::HTTPS);
        assert_eq!(req.authority.as_str(), "search.example.com");
        assert_eq!(req.path, "/index/_search");
        assert_eq!(
            req.query,
            vec![
                ("q".to_string(), "title:rust".to_string()),
                ("size".to_string(), "10".to_string())
            ]
        );
        assert!(p.headers.is_empty(), "headers are taken out of parts");

        req.apply(&mut p)?;
        assert_eq!(
            p.uri.to_string(),
            "https://search.example.com/index/_search?q=title:rust&size=10"
        );
        assert_eq!(p.headers.len(), 2);
        Ok(())
    }

    #[test]
    fn test_build_without_authority() {
        let mut p = parts("/index/_doc/1");
        let err = SigningRequest::build(&mut p).expect_err("authority is required");
        assert_eq!(err.kind(), crate::ErrorKind::RequestMalformed);
    }

    #[test]
    fn test_header_helpers() -> Result<()> {
        let mut p = parts("https://search.example.com/");
        p.headers.append("x-multi", HeaderValue::from_static("a"));
        p.headers.append("x-multi", HeaderValue::from_static("b"));
        let mut req = SigningRequest::build(&mut p)?;

        for (_, v) in req.headers.iter_mut() {
            SigningRequest::header_value_normalize(v)?;
        }
        assert_eq!(req.header_values_joined("x-custom")?, "padded");
        assert_eq!(req.header_values_joined("x-absent")?, "");
        assert_eq!(req.header_values_joined("x-multi")?, "a,b");
        assert_eq!(
            req.header_name_to_vec_sorted(|k| k == "x-custom"),
            vec!["host", "x-multi"]
        );
        Ok(())
    }
}
