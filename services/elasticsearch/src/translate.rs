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
use searchsign_core::{ClientOptions, OutboundRequest};

use crate::SignedRequest;

/// How an empty body is handed to the transport.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EmptyBody {
    /// Leave the body out entirely.
    ///
    /// Legacy transports only drop the body of a request when it's absent,
    /// a zero-length one still goes on the wire.
    #[default]
    Absent,
    /// Send a zero-length body.
    Empty,
}

/// Convert a signed request into the record a transport sends.
///
/// Headers go out verbatim. The query string is set only when the uri has a
/// non-empty one; an empty body becomes absent or empty per `empty_body`.
pub fn to_outbound(req: SignedRequest, empty_body: EmptyBody) -> OutboundRequest {
    let req = req.into_inner();

    let body = match (req.body.is_empty(), empty_body) {
        (false, _) => Some(req.body),
        (true, EmptyBody::Absent) => None,
        (true, EmptyBody::Empty) => Some(Bytes::new()),
    };

    OutboundRequest {
        method: req.method.to_string(),
        scheme: req.uri.scheme_str().unwrap_or("https").to_string(),
        uri: req.uri.path().to_string(),
        query_string: req
            .uri
            .query()
            .filter(|q| !q.is_empty())
            .map(str::to_string),
        headers: req.headers,
        body,
        client: ClientOptions::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{normalize, SignerAdapter};
    use pretty_assertions::assert_eq;
    use searchsign_aws_v4::Credential;
    use searchsign_core::{Context, Headers, InboundRequest};
    use test_case::test_case;

    async fn signed(query: Option<&str>, body: Option<&'static [u8]>) -> SignedRequest {
        let canonical = normalize(&InboundRequest {
            method: "PUT".to_string(),
            scheme: "http".to_string(),
            uri: "/index/_doc/1".to_string(),
            query_string: query.map(str::to_string),
            headers: Headers::from_iter([
                ("Host", vec!["localhost:9200"]),
                ("X-Opaque-Id", vec!["a", "b"]),
            ]),
            body: body.map(Bytes::from_static),
            ..Default::default()
        })
        .expect("request must be valid");

        SignerAdapter::new("es", "us-west-2")
            .sign(&Context::new(), canonical, &Credential::new("foo", "bar"))
            .await
            .expect("request must be signed")
    }

    #[tokio::test]
    async fn test_to_outbound() {
        let signed = signed(Some("refresh=true"), Some(&br#"{"title":"rust"}"#[..])).await;
        let headers = signed.headers.clone();

        let out = to_outbound(signed, EmptyBody::Absent);
        assert_eq!(out.method, "PUT");
        assert_eq!(out.scheme, "http");
        assert_eq!(out.uri, "/index/_doc/1");
        assert_eq!(out.query_string.as_deref(), Some("refresh=true"));
        assert_eq!(out.headers, headers);
        assert_eq!(out.headers.get_first("Host"), Some("localhost"));
        assert_eq!(
            out.headers.get("x-opaque-id"),
            Some(&["a".to_string(), "b".to_string()][..])
        );
        assert_eq!(out.body, Some(Bytes::from_static(br#"{"title":"rust"}"#)));
    }

    #[test_case(None, EmptyBody::Absent, None; "absent stays absent")]
    #[test_case(Some(&b""[..]), EmptyBody::Absent, None; "empty becomes absent")]
    #[test_case(Some(&b""[..]), EmptyBody::Empty, Some(Bytes::new()); "empty kept when asked")]
    #[test_case(None, EmptyBody::Empty, Some(Bytes::new()); "absent becomes empty when asked")]
    #[test_case(Some(&b"{}"[..]), EmptyBody::Absent, Some(Bytes::from_static(b"{}")); "non-empty kept")]
    #[tokio::test]
    async fn test_empty_body(
        body: Option<&'static [u8]>,
        empty_body: EmptyBody,
        expected: Option<Bytes>,
    ) {
        let out = to_outbound(signed(None, body).await, empty_body);
        assert_eq!(out.body, expected);
        assert_eq!(out.query_string, None);
    }
}
