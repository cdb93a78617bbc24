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

use searchsign_core::Context;

use crate::EmptyBody;

/// Signing name of Amazon OpenSearch Service domains.
pub const DEFAULT_SERVICE: &str = "es";

const AWS_REGION: &str = "AWS_REGION";
const AWS_DEFAULT_REGION: &str = "AWS_DEFAULT_REGION";

/// Config for search request handlers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Region to sign requests for.
    ///
    /// Required, a handler can't be built without it.
    pub region: Option<String>,
    /// Service signing name, `es` by default. Serverless collections use `aoss`.
    pub service: String,
    /// How an empty body is handed to the transport.
    pub empty_body: EmptyBody,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            region: None,
            service: DEFAULT_SERVICE.to_string(),
            empty_body: EmptyBody::default(),
        }
    }
}

impl Config {
    /// Load config from env.
    ///
    /// `AWS_REGION` takes precedence over `AWS_DEFAULT_REGION`.
    pub fn from_env(ctx: &Context) -> Self {
        let region = ctx
            .env_var(AWS_REGION)
            .or_else(|| ctx.env_var(AWS_DEFAULT_REGION))
            .filter(|v| !v.is_empty());

        Self {
            region,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use searchsign_core::StaticEnv;
    use std::collections::HashMap;
    use test_case::test_case;

    #[test_case(&[], None; "unset")]
    #[test_case(&[(AWS_DEFAULT_REGION, "eu-west-1")], Some("eu-west-1"); "default region")]
    #[test_case(&[(AWS_REGION, "us-west-2"), (AWS_DEFAULT_REGION, "eu-west-1")], Some("us-west-2"); "region first")]
    #[test_case(&[(AWS_REGION, "")], None; "empty")]
    fn test_from_env(envs: &[(&str, &str)], expected: Option<&str>) {
        let ctx = Context::new().with_env(StaticEnv {
            home_dir: None,
            envs: envs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<HashMap<_, _>>(),
        });

        let cfg = Config::from_env(&ctx);
        assert_eq!(cfg.region.as_deref(), expected);
        assert_eq!(cfg.service, "es");
        assert_eq!(cfg.empty_body, EmptyBody::Absent);
    }
}
