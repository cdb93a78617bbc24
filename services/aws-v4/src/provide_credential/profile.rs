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

use crate::{constants::*, Credential};
use async_trait::async_trait;
use ini::Ini;
use log::debug;
use searchsign_core::{Context, Error, ProvideCredential, Result};

/// ProfileCredentialProvider loads AWS credentials from the shared files.
///
/// Credentials are looked up in order from:
/// - `~/.aws/credentials` (or the path specified by `AWS_SHARED_CREDENTIALS_FILE`)
/// - `~/.aws/config` (or the path specified by `AWS_CONFIG_FILE`)
///
/// The profile to use is determined by:
/// 1. The `AWS_PROFILE` environment variable
/// 2. The profile specified via `with_profile()`
/// 3. Default to "default"
///
/// Missing or unreadable files yield no credential; a file that is not valid
/// ini is a configuration error.
#[derive(Debug, Clone)]
pub struct ProfileCredentialProvider {
    profile: String,
    config_file: Option<String>,
    credentials_file: Option<String>,
}

impl Default for ProfileCredentialProvider {
    fn default() -> Self {
        Self::new()
    }
}

/// Which shared file we are reading, they name sections differently.
#[derive(Debug, Clone, Copy)]
enum SharedFile {
    Credentials,
    Config,
}

impl SharedFile {
    fn env_key(self) -> &'static str {
        match self {
            SharedFile::Credentials => AWS_SHARED_CREDENTIALS_FILE,
            SharedFile::Config => AWS_CONFIG_FILE,
        }
    }

    fn default_path(self) -> &'static str {
        match self {
            SharedFile::Credentials => "~/.aws/credentials",
            SharedFile::Config => "~/.aws/config",
        }
    }

    fn section(self, profile: &str) -> String {
        match (self, profile) {
            (SharedFile::Config, "default") | (SharedFile::Credentials, _) => profile.to_string(),
            (SharedFile::Config, x) => format!("profile {x}"),
        }
    }
}

impl ProfileCredentialProvider {
    /// Create a new ProfileCredentialProvider with default settings.
    pub fn new() -> Self {
        Self {
            profile: "default".to_string(),
            config_file: None,
            credentials_file: None,
        }
    }

    /// Set the profile name to use.
    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = profile.into();
        self
    }

    /// Set the path to the config file.
    pub fn with_config_file(mut self, path: impl Into<String>) -> Self {
        self.config_file = Some(path.into());
        self
    }

    /// Set the path to the credentials file.
    pub fn with_credentials_file(mut self, path: impl Into<String>) -> Self {
        self.credentials_file = Some(path.into());
        self
    }

    async fn load_from(
        &self,
        ctx: &Context,
        file: SharedFile,
        profile: &str,
    ) -> Result<Option<Credential>> {
        let configured = match file {
            SharedFile::Credentials => self.credentials_file.clone(),
            SharedFile::Config => self.config_file.clone(),
        };
        let path = configured
            .or_else(|| ctx.env_var(file.env_key()))
            .unwrap_or_else(|| file.default_path().to_string());

        let Some(expanded_path) = ctx.expand_home_dir(&path) else {
            debug!("failed to expand homedir for path: {path}");
            return Ok(None);
        };

        let content = match ctx.file_read_as_string(&expanded_path).await {
            Ok(content) => content,
            Err(err) => {
                debug!("failed to read {file:?} file {expanded_path}: {err:?}");
                return Ok(None);
            }
        };

        let conf = Ini::load_from_str(&content).map_err(|e| {
            Error::config_invalid(format!("failed to parse {file:?} file"))
                .with_source(e)
                .with_context(format!("path: {expanded_path}"))
        })?;

        let section = file.section(profile);
        let Some(props) = conf.section(Some(section.as_str())) else {
            debug!("section {section} not found in {expanded_path}");
            return Ok(None);
        };

        match (
            props.get("aws_access_key_id"),
            props.get("aws_secret_access_key"),
        ) {
            (Some(ak), Some(sk)) => Ok(Some(Credential {
                access_key_id: ak.to_string(),
                secret_access_key: sk.to_string(),
                session_token: props.get("aws_session_token").map(|s| s.to_string()),
                expires_in: None,
            })),
            _ => Ok(None),
        }
    }
}

#[async_trait]
impl ProvideCredential for ProfileCredentialProvider {
    type Credential = Credential;

    async fn provide_credential(&self, ctx: &Context) -> Result<Option<Self::Credential>> {
        let profile = ctx
            .env_var(AWS_PROFILE)
            .unwrap_or_else(|| self.profile.clone());

        if let Some(cred) = self
            .load_from(ctx, SharedFile::Credentials, &profile)
            .await?
        {
            return Ok(Some(cred));
        }

        self.load_from(ctx, SharedFile::Config, &profile).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use searchsign_core::StaticEnv;
    use searchsign_file_read_tokio::TokioFileRead;
    use std::collections::HashMap;
    use std::fs::File;
    use std::io::Write;
    use std::path::Path;
    use tempfile::tempdir;

    fn context(home: &Path, envs: HashMap<String, String>) -> Context {
        Context::new().with_file_read(TokioFileRead).with_env(StaticEnv {
            home_dir: Some(home.to_path_buf()),
            envs,
        })
    }

    #[tokio::test]
    async fn test_profile_from_credentials_file() -> anyhow::Result<()> {
        let _ = env_logger::builder().is_test(true).try_init();

        let tmp_dir = tempdir()?;
        let file_path = tmp_dir.path().join("credentials");
        let mut tmp_file = File::create(&file_path)?;
        writeln!(tmp_file, "[default]")?;
        writeln!(tmp_file, "aws_access_key_id = DEFAULTACCESSKEYID")?;
        writeln!(tmp_file, "aws_secret_access_key = DEFAULTSECRETACCESSKEY")?;
        writeln!(tmp_file, "aws_session_token = DEFAULTSESSIONTOKEN")?;
        writeln!(tmp_file)?;
        writeln!(tmp_file, "[search]")?;
        writeln!(tmp_file, "aws_access_key_id = SEARCHACCESSKEYID")?;
        writeln!(tmp_file, "aws_secret_access_key = SEARCHSECRETACCESSKEY")?;

        let ctx = context(tmp_dir.path(), HashMap::new());
        let path = file_path.to_string_lossy().to_string();

        let cred = ProfileCredentialProvider::new()
            .with_credentials_file(path.clone())
            .provide_credential(&ctx)
            .await?
            .expect("default profile must be loaded");
        assert_eq!(cred.access_key_id, "DEFAULTACCESSKEYID");
        assert_eq!(cred.secret_access_key, "DEFAULTSECRETACCESSKEY");
        assert_eq!(cred.session_token.as_deref(), Some("DEFAULTSESSIONTOKEN"));

        let cred = ProfileCredentialProvider::new()
            .with_profile("search")
            .with_credentials_file(path)
            .provide_credential(&ctx)
            .await?
            .expect("search profile must be loaded");
        assert_eq!(cred.access_key_id, "SEARCHACCESSKEYID");
        assert!(cred.session_token.is_none());

        Ok(())
    }

    #[tokio::test]
    async fn test_profile_from_config_file_in_home() -> anyhow::Result<()> {
        let _ = env_logger::builder().is_test(true).try_init();

        let tmp_dir = tempdir()?;
        std::fs::create_dir(tmp_dir.path().join(".aws"))?;
        let mut tmp_file = File::create(tmp_dir.path().join(".aws").join("config"))?;
        writeln!(tmp_file, "[default]")?;
        writeln!(tmp_file, "region = us-west-2")?;
        writeln!(tmp_file)?;
        writeln!(tmp_file, "[profile search]")?;
        writeln!(tmp_file, "aws_access_key_id = SEARCHACCESSKEYID")?;
        writeln!(tmp_file, "aws_secret_access_key = SEARCHSECRETACCESSKEY")?;

        // AWS_PROFILE wins over the configured profile.
        let ctx = context(
            tmp_dir.path(),
            HashMap::from([(AWS_PROFILE.to_string(), "search".to_string())]),
        );
        let cred = ProfileCredentialProvider::new()
            .with_profile("default")
            .provide_credential(&ctx)
            .await?
            .expect("search profile must be loaded");
        assert_eq!(cred.access_key_id, "SEARCHACCESSKEYID");
        assert_eq!(cred.secret_access_key, "SEARCHSECRETACCESSKEY");

        // The default section carries no keys.
        let ctx = context(tmp_dir.path(), HashMap::new());
        let cred = ProfileCredentialProvider::new()
            .provide_credential(&ctx)
            .await?;
        assert!(cred.is_none());

        Ok(())
    }

    #[tokio::test]
    async fn test_profile_missing_files() -> anyhow::Result<()> {
        let tmp_dir = tempdir()?;
        let ctx = context(tmp_dir.path(), HashMap::new());

        let cred = ProfileCredentialProvider::new()
            .provide_credential(&ctx)
            .await?;
        assert!(cred.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_profile_invalid_file() -> anyhow::Result<()> {
        let tmp_dir = tempdir()?;
        let file_path = tmp_dir.path().join("credentials");
        let mut tmp_file = File::create(&file_path)?;
        writeln!(tmp_file, "[default")?;

        let ctx = context(tmp_dir.path(), HashMap::new());
        let err = ProfileCredentialProvider::new()
            .with_credentials_file(file_path.to_string_lossy().to_string())
            .provide_credential(&ctx)
            .await
            .expect_err("broken ini must fail");
        assert_eq!(err.kind(), searchsign_core::ErrorKind::ConfigInvalid);
        Ok(())
    }
}
