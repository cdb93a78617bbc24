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

use std::ops::Deref;

use http::header::{HeaderName, HeaderValue};
use log::debug;
use searchsign_aws_v4::{Credential, RequestSigner, X_AMZ_DATE, X_AMZ_SECURITY_TOKEN};
use searchsign_core::time::DateTime;
use searchsign_core::{Context, Result, SignRequest};

use crate::CanonicalRequest;

/// Headers the signer contributes, with the casing they are written back in.
const SIGNED_OUTPUT: &[(&str, &str)] = &[
    ("authorization", "Authorization"),
    (X_AMZ_DATE, "X-Amz-Date"),
    (X_AMZ_SECURITY_TOKEN, "X-Amz-Security-Token"),
];

/// A [`CanonicalRequest`] carrying authentication headers.
///
/// Only produced by [`SignerAdapter::sign`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedRequest(CanonicalRequest);

impl SignedRequest {
    /// Unwrap the signed request.
    pub fn into_inner(self) -> CanonicalRequest {
        self.0
    }
}

impl Deref for SignedRequest {
    type Target = CanonicalRequest;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// SignerAdapter runs SigV4 over canonical requests.
#[derive(Debug, Clone)]
pub struct SignerAdapter {
    signer: RequestSigner,
}

impl SignerAdapter {
    /// Create an adapter signing for `service` in `region`.
    pub fn new(service: &str, region: &str) -> Self {
        Self {
            signer: RequestSigner::new(service, region),
        }
    }

    /// Fix the signing time instead of reading the clock.
    pub fn with_time(mut self, time: DateTime) -> Self {
        self.signer = self.signer.with_time(time);
        self
    }

    /// Sign the request with `cred`.
    ///
    /// The returned request differs from the input only by `Authorization`,
    /// `X-Amz-Date` and, for temporary credentials, `X-Amz-Security-Token`.
    /// A stale security token header is dropped when `cred` has no token.
    pub async fn sign(
        &self,
        ctx: &Context,
        req: CanonicalRequest,
        cred: &Credential,
    ) -> Result<SignedRequest> {
        let mut req = req;
        if cred.session_token.is_none() {
            req.headers.remove(X_AMZ_SECURITY_TOKEN);
        }

        let mut parts = http::Request::builder()
            .method(req.method.clone())
            .uri(req.uri.clone())
            .body(())?
            .into_parts()
            .0;
        for (name, values) in req.headers.iter() {
            let name = HeaderName::from_bytes(name.as_bytes())?;
            for value in values {
                parts
                    .headers
                    .append(name.clone(), HeaderValue::from_str(value)?);
            }
        }

        self.signer
            .sign_request(ctx, &mut parts, &req.body, Some(cred))
            .await?;

        for (name, output) in SIGNED_OUTPUT {
            if let Some(value) = parts.headers.get(*name) {
                req.headers.insert(*output, value.to_str()?);
            }
        }
        debug!(
            "signed {} {} for {}/{}",
            req.method,
            req.uri.path(),
            self.signer.region(),
            self.signer.service()
        );

        Ok(SignedRequest(req))
    }
}
