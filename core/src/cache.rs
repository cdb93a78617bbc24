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

use crate::{Context, ProvideCredential, Result, SigningCredential};
use async_trait::async_trait;
use log::debug;
use std::fmt::{self, Debug};
use std::sync::{Arc, Mutex};

/// CachedCredentialProvider memoizes the credential of the wrapped provider.
///
/// The cached credential is handed out while it's valid; once
/// [`SigningCredential::is_valid`] turns false (missing, or about to expire),
/// the wrapped provider is asked again.
///
/// Concurrent callers that observe an invalid credential at the same time
/// may all refresh it; the last one wins. The lock is never held across an
/// await point.
pub struct CachedCredentialProvider<P: ProvideCredential> {
    inner: Arc<P>,
    cached: Arc<Mutex<Option<P::Credential>>>,
}

impl<P: ProvideCredential> Clone for CachedCredentialProvider<P> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            cached: self.cached.clone(),
        }
    }
}

impl<P: ProvideCredential> Debug for CachedCredentialProvider<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CachedCredentialProvider")
            .field("inner", &self.inner)
            .finish_non_exhaustive()
    }
}

impl<P> CachedCredentialProvider<P>
where
    P: ProvideCredential,
    P::Credential: SigningCredential,
{
    /// Wrap a provider.
    pub fn new(inner: P) -> Self {
        Self {
            inner: Arc::new(inner),
            cached: Arc::new(Mutex::new(None)),
        }
    }

    /// Drop the cached credential so that the next call resolves again.
    pub fn invalidate(&self) {
        *self.cached.lock().expect("lock poisoned") = None;
    }
}

#[async_trait]
impl<P> ProvideCredential for CachedCredentialProvider<P>
where
    P: ProvideCredential,
    P::Credential: SigningCredential,
{
    type Credential = P::Credential;

    async fn provide_credential(&self, ctx: &Context) -> Result<Option<Self::Credential>> {
        let cached = self.cached.lock().expect("lock poisoned").clone();
        if cached.is_valid() {
            return Ok(cached);
        }

        debug!("cached credential is missing or invalid, resolving again");
        let cred = self.inner.provide_credential(ctx).await?;
        *self.cached.lock().expect("lock poisoned") = cred.clone();
        Ok(cred)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Clone)]
    struct Token {
        value: usize,
        valid: bool,
    }

    impl SigningCredential for Token {
        fn is_valid(&self) -> bool {
            self.valid
        }
    }

    #[derive(Debug)]
    struct Counting {
        calls: Arc<AtomicUsize>,
        valid: bool,
    }

    #[async_trait]
    impl ProvideCredential for Counting {
        type Credential = Token;

        async fn provide_credential(&self, _: &Context) -> Result<Option<Token>> {
            let value = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(Some(Token {
                value,
                valid: self.valid,
            }))
        }
    }

    #[tokio::test]
    async fn test_valid_credential_is_reused() -> anyhow::Result<()> {
        let calls = Arc::new(AtomicUsize::new(0));
        let provider = CachedCredentialProvider::new(Counting {
            calls: calls.clone(),
            valid: true,
        });
        let ctx = Context::new();

        for _ in 0..3 {
            let cred = provider.provide_credential(&ctx).await?.expect("must load");
            assert_eq!(cred.value, 1);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        provider.invalidate();
        let cred = provider.provide_credential(&ctx).await?.expect("must load");
        assert_eq!(cred.value, 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_invalid_credential_is_resolved_again() -> anyhow::Result<()> {
        let calls = Arc::new(AtomicUsize::new(0));
        let provider = CachedCredentialProvider::new(Counting {
            calls: calls.clone(),
            valid: false,
        });
        let ctx = Context::new();

        provider.provide_credential(&ctx).await?;
        provider.provide_credential(&ctx).await?;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        Ok(())
    }
}
