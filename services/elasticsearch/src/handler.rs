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

use std::fmt::{self, Debug};
use std::sync::Arc;

use async_trait::async_trait;
use log::debug;
use searchsign_aws_v4::{Credential, DefaultCredentialProvider};
use searchsign_core::time::DateTime;
use searchsign_core::{
    CachedCredentialProvider, Context, Error, InboundRequest, InstalledClient, OutboundRequest,
    ProvideCredential, Result, Transport, TransportResponse,
};

use crate::{detect_transport, normalize, to_outbound, Config, EmptyBody, SignerAdapter};

/// Credential source a handler resolves credentials from.
pub type SharedCredentialProvider = Arc<dyn ProvideCredential<Credential = Credential>>;

/// Handler signs search requests and hands them to a transport.
///
/// Every call resolves credentials, signs the request and delegates to the
/// transport, returning its result verbatim. The handler keeps no state
/// between calls and can be shared across tasks.
///
/// Handlers implement [`Transport`] themselves, so they can sit anywhere a
/// transport is expected.
///
/// ```no_run
/// use searchsign_aws_v4::StaticCredentialProvider;
/// use searchsign_core::{Headers, InboundRequest};
/// use searchsign_elasticsearch::Handler;
/// # use searchsign_core::Transport;
///
/// # async fn example(transport: std::sync::Arc<dyn Transport>) -> searchsign_core::Result<()> {
/// let handler = Handler::builder()
///     .region("us-west-2")
///     .credential_provider(StaticCredentialProvider::new("foo", "bar"))
///     .transport(transport)
///     .build()?;
///
/// let resp = handler
///     .handle(InboundRequest {
///         uri: "/index/_doc/1".to_string(),
///         headers: Headers::from_iter([("host", vec!["search.example.com"])]),
///         ..Default::default()
///     })
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Handler {
    ctx: Context,
    config: Config,
    provider: SharedCredentialProvider,
    signer: SignerAdapter,
    transport: Arc<dyn Transport>,
}

impl Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler")
            .field("config", &self.config)
            .field("provider", &self.provider)
            .field("transport", &self.transport)
            .finish_non_exhaustive()
    }
}

impl Handler {
    /// Create a builder.
    pub fn builder() -> HandlerBuilder {
        HandlerBuilder::default()
    }

    /// The config this handler was built with.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Sign the request and send it with the configured transport.
    ///
    /// The outbound record replaces every field the signing pipeline
    /// produces; [`searchsign_core::ClientOptions`] of the inbound record
    /// pass through untouched.
    ///
    /// # Errors
    ///
    /// - `CredentialInvalid` if the provider has no credential, or the
    ///   credential is incomplete.
    /// - `RequestMalformed` if the request has no host or an unparsable uri.
    /// - Whatever the credential provider or the transport fails with.
    pub async fn handle(&self, req: InboundRequest) -> Result<TransportResponse> {
        let cred = self
            .provider
            .provide_credential(&self.ctx)
            .await?
            .ok_or_else(|| {
                Error::credential_invalid("credential provider returned no credential")
                    .with_context(format!("provider: {:?}", self.provider))
            })?;

        let canonical = normalize(&req)?;
        let signed = self.signer.sign(&self.ctx, canonical, &cred).await?;
        let outbound = to_outbound(signed, self.config.empty_body);
        let outbound = OutboundRequest {
            client: req.client,
            ..outbound
        };

        debug!(
            "delegating signed {} {} to transport",
            outbound.method, outbound.uri
        );
        self.transport.send(outbound).await
    }
}

#[async_trait]
impl Transport for Handler {
    async fn send(&self, req: OutboundRequest) -> Result<TransportResponse> {
        self.handle(req).await
    }
}

/// Builder for [`Handler`].
#[derive(Default)]
pub struct HandlerBuilder {
    config: Config,
    ctx: Option<Context>,
    provider: Option<SharedCredentialProvider>,
    transport: Option<Arc<dyn Transport>>,
    installed: Vec<Arc<dyn InstalledClient>>,
    time: Option<DateTime>,
}

impl HandlerBuilder {
    /// Set the region to sign for.
    ///
    /// Falls back to `AWS_REGION` and `AWS_DEFAULT_REGION` of the context.
    pub fn region(mut self, region: impl Into<String>) -> Self {
        self.config.region = Some(region.into());
        self
    }

    /// Set the service signing name, `es` by default.
    pub fn service(mut self, service: impl Into<String>) -> Self {
        self.config.service = service.into();
        self
    }

    /// Set how an empty body is handed to the transport.
    pub fn empty_body(mut self, empty_body: EmptyBody) -> Self {
        self.config.empty_body = empty_body;
        self
    }

    /// Replace the whole config.
    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Set the context used by credential providers.
    ///
    /// Defaults to an empty [`Context`], which can't read files, env or the
    /// network.
    pub fn context(mut self, ctx: Context) -> Self {
        self.ctx = Some(ctx);
        self
    }

    /// Set the credential provider.
    ///
    /// Defaults to a cached [`DefaultCredentialProvider`].
    pub fn credential_provider(
        mut self,
        provider: impl ProvideCredential<Credential = Credential>,
    ) -> Self {
        self.provider = Some(Arc::new(provider));
        self
    }

    /// Set the transport requests are delegated to.
    ///
    /// Without it, the default transport of an installed client is used.
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Register an installed search client library.
    pub fn installed_client(mut self, client: impl InstalledClient) -> Self {
        self.installed.push(Arc::new(client));
        self
    }

    /// Register several installed search client libraries.
    pub fn installed_clients(
        mut self,
        clients: impl IntoIterator<Item = Arc<dyn InstalledClient>>,
    ) -> Self {
        self.installed.extend(clients);
        self
    }

    /// Fix the signing time.
    ///
    /// # Note
    ///
    /// Requests must be signed with the current time. Only use this for testing.
    pub fn signing_time(mut self, time: DateTime) -> Self {
        self.time = Some(time);
        self
    }

    /// Build the handler.
    ///
    /// The transport is resolved here, once, never per request.
    ///
    /// # Errors
    ///
    /// - `ConfigInvalid` if no region is configured.
    /// - `UnsupportedClientVersion` or `MissingDependency` if no transport is
    ///   set and none of the installed clients can provide one.
    pub fn build(self) -> Result<Handler> {
        let ctx = self.ctx.unwrap_or_default();

        let mut config = self.config;
        if config.region.is_none() {
            config.region = Config::from_env(&ctx).region;
        }
        let Some(region) = config.region.clone() else {
            return Err(Error::config_invalid("region is required to sign requests")
                .with_context("hint: set region on the builder or AWS_REGION in env"));
        };

        let transport = match self.transport {
            Some(transport) => transport,
            None => {
                #[allow(unused_mut)]
                let mut installed = self.installed;
                #[cfg(feature = "reqwest-transport")]
                installed.push(Arc::new(
                    searchsign_transport_reqwest::ReqwestTransport::default(),
                ));
                detect_transport(&installed)?
            }
        };

        let provider: SharedCredentialProvider = match self.provider {
            Some(provider) => provider,
            None => Arc::new(CachedCredentialProvider::new(
                DefaultCredentialProvider::new(),
            )),
        };

        let mut signer = SignerAdapter::new(&config.service, &region);
        if let Some(time) = self.time {
            signer = signer.with_time(time);
        }

        debug!(
            "built handler signing for {region}/{} with transport {transport:?}",
            config.service
        );
        Ok(Handler {
            ctx,
            config,
            provider,
            signer,
            transport,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use pretty_assertions::assert_eq;
    use searchsign_aws_v4::StaticCredentialProvider;
    use searchsign_core::{ClientLibrary, ErrorKind, Headers, StaticEnv};
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Debug, Default)]
    struct Recording {
        sent: Mutex<Vec<OutboundRequest>>,
    }

    #[async_trait]
    impl Transport for Recording {
        async fn send(&self, req: OutboundRequest) -> Result<TransportResponse> {
            self.sent.lock().expect("lock poisoned").push(req);
            Ok(http::Response::new(Bytes::from_static(b"{}")))
        }
    }

    #[derive(Debug)]
    struct Nothing;

    #[async_trait]
    impl ProvideCredential for Nothing {
        type Credential = Credential;

        async fn provide_credential(&self, _: &Context) -> Result<Option<Credential>> {
            Ok(None)
        }
    }

    #[derive(Debug)]
    struct Es8;

    impl InstalledClient for Es8 {
        fn library(&self) -> ClientLibrary {
            ClientLibrary::Elasticsearch { major: 8 }
        }

        fn default_transport(&self) -> Arc<dyn Transport> {
            Arc::new(Recording::default())
        }
    }

    fn request() -> InboundRequest {
        InboundRequest {
            uri: "/index/_doc/1".to_string(),
            headers: Headers::from_iter([("host", vec!["search.example.com"])]),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_handle() -> Result<()> {
        let transport = Arc::new(Recording::default());
        let handler = Handler::builder()
            .region("us-west-2")
            .credential_provider(StaticCredentialProvider::new("foo", "bar"))
            .transport(transport.clone())
            .build()?;

        let resp = handler.handle(request()).await?;
        assert_eq!(resp.body(), &Bytes::from_static(b"{}"));

        let sent = transport.sent.lock().expect("lock poisoned");
        assert_eq!(sent.len(), 1);
        assert!(sent[0].headers.contains("Authorization"));
        assert_eq!(sent[0].body, None);
        Ok(())
    }

    #[tokio::test]
    async fn test_handle_without_credential() -> Result<()> {
        let transport = Arc::new(Recording::default());
        let handler = Handler::builder()
            .region("us-west-2")
            .credential_provider(Nothing)
            .transport(transport.clone())
            .build()?;

        let err = handler
            .handle(request())
            .await
            .expect_err("must fail without credential");
        assert_eq!(err.kind(), ErrorKind::CredentialInvalid);
        assert!(transport.sent.lock().expect("lock poisoned").is_empty());
        Ok(())
    }

    #[test]
    fn test_build_region_from_env() -> Result<()> {
        let handler = Handler::builder()
            .context(Context::new().with_env(StaticEnv {
                home_dir: None,
                envs: HashMap::from([("AWS_REGION".to_string(), "eu-west-1".to_string())]),
            }))
            .transport(Arc::new(Recording::default()))
            .build()?;
        assert_eq!(handler.config().region.as_deref(), Some("eu-west-1"));
        assert_eq!(handler.config().service, "es");
        Ok(())
    }

    #[test]
    fn test_build_without_region() {
        let err = Handler::builder()
            .transport(Arc::new(Recording::default()))
            .build()
            .expect_err("region is required");
        assert_eq!(err.kind(), ErrorKind::ConfigInvalid);
    }

    #[cfg(not(feature = "reqwest-transport"))]
    #[test]
    fn test_build_with_unsupported_client() {
        let err = Handler::builder()
            .region("us-west-2")
            .installed_client(Es8)
            .build()
            .expect_err("es8 is not supported");
        assert_eq!(err.kind(), ErrorKind::UnsupportedClientVersion);
    }

    #[cfg(not(feature = "reqwest-transport"))]
    #[test]
    fn test_build_without_transport() {
        let err = Handler::builder()
            .region("us-west-2")
            .build()
            .expect_err("no transport available");
        assert_eq!(err.kind(), ErrorKind::MissingDependency);
    }
}
