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

use crate::constants::{AWS_EC2_METADATA_DISABLED, AWS_EC2_METADATA_SERVICE_ENDPOINT};
use crate::Credential;
use async_trait::async_trait;
use bytes::Bytes;
use http::header::CONTENT_LENGTH;
use http::{Method, StatusCode};
use log::debug;
use searchsign_core::time::{now, parse_rfc3339, DateTime};
use searchsign_core::{Context, Error, ProvideCredential, Result};
use serde::Deserialize;
use std::sync::{Arc, Mutex};

const DEFAULT_ENDPOINT: &str = "http://169.254.169.254";
// 21600s (6h) is recommended by AWS.
const TOKEN_TTL_SECONDS: i64 = 21600;

/// IMDSv2CredentialProvider loads the credentials of the role attached to an
/// EC2 instance from the instance metadata service.
///
/// The session token is cached and re-fetched ten minutes before it expires.
/// Set `AWS_EC2_METADATA_DISABLED=true` to skip this provider entirely.
#[derive(Debug, Clone)]
pub struct IMDSv2CredentialProvider {
    endpoint: Option<String>,
    token: Arc<Mutex<(String, DateTime)>>,
}

impl Default for IMDSv2CredentialProvider {
    fn default() -> Self {
        Self {
            endpoint: None,
            token: Arc::new(Mutex::new((String::new(), DateTime::default()))),
        }
    }
}

impl IMDSv2CredentialProvider {
    /// Create a new `IMDSv2CredentialProvider` instance.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the endpoint for the metadata service.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    fn get_endpoint(&self, ctx: &Context) -> String {
        self.endpoint
            .clone()
            .or_else(|| ctx.env_var(AWS_EC2_METADATA_SERVICE_ENDPOINT))
            .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string())
            .trim_end_matches('/')
            .to_string()
    }

    async fn load_ec2_metadata_token(&self, ctx: &Context, endpoint: &str) -> Result<String> {
        {
            let (token, expires_in) = self.token.lock().expect("lock poisoned").clone();
            if expires_in > now() {
                return Ok(token);
            }
        }

        let url = format!("{endpoint}/latest/api/token");
        let req = http::Request::builder()
            .uri(&url)
            .method(Method::PUT)
            .header(CONTENT_LENGTH, "0")
            .header(
                "x-aws-ec2-metadata-token-ttl-seconds",
                TOKEN_TTL_SECONDS.to_string(),
            )
            .body(Bytes::new())
            .map_err(|e| {
                Error::unexpected("failed to build IMDS token request")
                    .with_source(e)
                    .with_context(format!("url: {url}"))
            })?;

        let resp = ctx.http_send_as_string(req).await.map_err(|e| {
            Error::unexpected("failed to connect to IMDS")
                .with_source(e)
                .with_context(format!("endpoint: {endpoint}"))
                .set_retryable(true)
        })?;
        if resp.status() != StatusCode::OK {
            return Err(imds_error("fetch_token", resp.status(), resp.body()));
        }
        let ec2_token = resp.into_body();

        // Refresh ten minutes before the token expires.
        let expires_in = now()
            + chrono::TimeDelta::try_seconds(TOKEN_TTL_SECONDS - 600).expect("in bounds");
        *self.token.lock().expect("lock poisoned") = (ec2_token.clone(), expires_in);

        Ok(ec2_token)
    }

    async fn get(&self, ctx: &Context, url: &str, token: &str, op: &str) -> Result<String> {
        let req = http::Request::builder()
            .uri(url)
            .method(Method::GET)
            .header("x-aws-ec2-metadata-token", token)
            .body(Bytes::new())
            .map_err(|e| {
                Error::unexpected("failed to build IMDS request")
                    .with_source(e)
                    .with_context(format!("operation: {op}"))
            })?;

        let resp = ctx.http_send_as_string(req).await.map_err(|e| {
            Error::unexpected("failed to send IMDS request")
                .with_source(e)
                .with_context(format!("operation: {op}"))
                .set_retryable(true)
        })?;
        if resp.status() != StatusCode::OK {
            return Err(imds_error(op, resp.status(), resp.body()));
        }
        Ok(resp.into_body())
    }
}

fn imds_error(op: &str, status: StatusCode, body: &str) -> Error {
    let err = match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN | StatusCode::NOT_FOUND => {
            Error::credential_invalid(format!("IMDS rejected {op} with {status}"))
        }
        _ => Error::unexpected(format!("IMDS failed {op} with {status}"))
            .set_retryable(status.is_server_error()),
    };
    err.with_context(format!("response: {body}"))
}

#[async_trait]
impl ProvideCredential for IMDSv2CredentialProvider {
    type Credential = Credential;

    async fn provide_credential(&self, ctx: &Context) -> Result<Option<Self::Credential>> {
        let disabled = ctx
            .env_var(AWS_EC2_METADATA_DISABLED)
            .map(|v| v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);
        if disabled {
            debug!("IMDS is disabled by {AWS_EC2_METADATA_DISABLED}");
            return Ok(None);
        }

        let endpoint = self.get_endpoint(ctx);
        let token = self.load_ec2_metadata_token(ctx, &endpoint).await?;

        // List all roles that the instance has, only the first one is used.
        let url = format!("{endpoint}/latest/meta-data/iam/security-credentials/");
        let roles = self.get(ctx, &url, &token, "list_roles").await?;
        let Some(role) = roles.lines().map(str::trim).find(|v| !v.is_empty()) else {
            return Err(Error::config_invalid("no IAM role attached to EC2 instance"));
        };

        let url = format!("{endpoint}/latest/meta-data/iam/security-credentials/{role}");
        let content = self.get(ctx, &url, &token, "fetch_credentials").await?;
        let resp: Ec2MetadataIamSecurityCredentials =
            serde_json::from_str(&content).map_err(|e| {
                Error::unexpected("failed to parse IMDS credentials response")
                    .with_source(e)
                    .with_context(format!("role: {role}"))
            })?;
        if resp.code != "Success" {
            return Err(Error::credential_invalid(format!(
                "IMDS returned error: [{}] {}",
                resp.code, resp.message
            ))
            .with_context(format!("role: {role}")));
        }

        debug!("loaded credential of role {role} from IMDS");
        Ok(Some(Credential {
            access_key_id: resp.access_key_id,
            secret_access_key: resp.secret_access_key,
            session_token: Some(resp.token),
            expires_in: Some(parse_rfc3339(&resp.expiration)?),
        }))
    }
}

#[derive(Default, Debug, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
struct Ec2MetadataIamSecurityCredentials {
    access_key_id: String,
    secret_access_key: String,
    token: String,
    expiration: String,

    code: String,
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use searchsign_core::{ErrorKind, HttpSend, StaticEnv};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Fake metadata service answering by path.
    #[derive(Debug, Default)]
    struct FakeImds {
        token_calls: AtomicUsize,
        roles: String,
        credentials: String,
    }

    #[async_trait]
    impl HttpSend for FakeImds {
        async fn http_send(&self, req: http::Request<Bytes>) -> Result<http::Response<Bytes>> {
            let token_ok = req
                .headers()
                .get("x-aws-ec2-metadata-token")
                .map(|v| v == "token")
                .unwrap_or(false);
            let (status, body) = match (req.method(), req.uri().path()) {
                (&Method::PUT, "/latest/api/token") => {
                    self.token_calls.fetch_add(1, Ordering::SeqCst);
                    (StatusCode::OK, "token".to_string())
                }
                (_, _) if !token_ok => (StatusCode::UNAUTHORIZED, String::new()),
                (&Method::GET, "/latest/meta-data/iam/security-credentials/") => {
                    (StatusCode::OK, self.roles.clone())
                }
                (&Method::GET, "/latest/meta-data/iam/security-credentials/search-role") => {
                    (StatusCode::OK, self.credentials.clone())
                }
                _ => (StatusCode::NOT_FOUND, String::new()),
            };
            Ok(http::Response::builder()
                .status(status)
                .body(Bytes::from(body))
                .expect("response must be valid"))
        }
    }

    fn context(imds: FakeImds, envs: &[(&str, &str)]) -> Context {
        Context::new().with_http_send(imds).with_env(StaticEnv {
            home_dir: None,
            envs: envs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<HashMap<_, _>>(),
        })
    }

    fn credentials_body(code: &str) -> String {
        format!(
            r#"{{
  "Code" : "{code}",
  "LastUpdated" : "2024-01-01T00:00:00Z",
  "Type" : "AWS-HMAC",
  "AccessKeyId" : "ASIAEXAMPLE",
  "SecretAccessKey" : "secret",
  "Token" : "session",
  "Expiration" : "2099-01-01T00:00:00Z"
}}"#
        )
    }

    #[tokio::test]
    async fn test_imds_credential() -> anyhow::Result<()> {
        let _ = env_logger::builder().is_test(true).try_init();

        let ctx = context(
            FakeImds {
                roles: "search-role\n".to_string(),
                credentials: credentials_body("Success"),
                ..Default::default()
            },
            &[(AWS_EC2_METADATA_SERVICE_ENDPOINT, "http://127.0.0.1:1338/")],
        );
        let provider = IMDSv2CredentialProvider::new();

        let cred = provider
            .provide_credential(&ctx)
            .await?
            .expect("credential must be loaded");
        assert_eq!(cred.access_key_id, "ASIAEXAMPLE");
        assert_eq!(cred.secret_access_key, "secret");
        assert_eq!(cred.session_token.as_deref(), Some("session"));
        assert_eq!(
            cred.expires_in,
            Some(parse_rfc3339("2099-01-01T00:00:00Z")?)
        );

        // Token is reused for the second call.
        provider.provide_credential(&ctx).await?;
        let (token, _) = provider.token.lock().expect("lock poisoned").clone();
        assert_eq!(token, "token");
        Ok(())
    }

    #[tokio::test]
    async fn test_imds_token_is_cached() -> anyhow::Result<()> {
        let imds = Arc::new(FakeImds {
            roles: "search-role".to_string(),
            credentials: credentials_body("Success"),
            ..Default::default()
        });

        #[derive(Debug)]
        struct Shared(Arc<FakeImds>);

        #[async_trait]
        impl HttpSend for Shared {
            async fn http_send(
                &self,
                req: http::Request<Bytes>,
            ) -> Result<http::Response<Bytes>> {
                self.0.http_send(req).await
            }
        }

        let ctx = Context::new()
            .with_http_send(Shared(imds.clone()))
            .with_env(StaticEnv::default());
        let provider = IMDSv2CredentialProvider::new().with_endpoint("http://127.0.0.1:1338");
        provider.provide_credential(&ctx).await?;
        provider.provide_credential(&ctx).await?;
        assert_eq!(imds.token_calls.load(Ordering::SeqCst), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_imds_disabled() -> anyhow::Result<()> {
        let ctx = context(FakeImds::default(), &[(AWS_EC2_METADATA_DISABLED, "true")]);
        let cred = IMDSv2CredentialProvider::new()
            .provide_credential(&ctx)
            .await?;
        assert!(cred.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_imds_without_role() {
        let ctx = context(FakeImds::default(), &[]);
        let err = IMDSv2CredentialProvider::new()
            .provide_credential(&ctx)
            .await
            .expect_err("must fail without role");
        assert_eq!(err.kind(), ErrorKind::ConfigInvalid);
    }

    #[tokio::test]
    async fn test_imds_error_code() {
        let ctx = context(
            FakeImds {
                roles: "search-role".to_string(),
                credentials: credentials_body("AssumeRoleUnauthorizedAccess"),
                ..Default::default()
            },
            &[],
        );
        let err = IMDSv2CredentialProvider::new()
            .provide_credential(&ctx)
            .await
            .expect_err("must fail on error code");
        assert_eq!(err.kind(), ErrorKind::CredentialInvalid);
    }
}
