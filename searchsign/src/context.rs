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

use searchsign_core::{Context, OsEnv, Result};
use searchsign_elasticsearch::Handler;
use searchsign_file_read_tokio::TokioFileRead;
use searchsign_http_send_reqwest::ReqwestHttpSend;

/// Create a context reading files with tokio, sending metadata requests with
/// reqwest and reading the OS environment.
pub fn default_context() -> Context {
    Context::new()
        .with_file_read(TokioFileRead)
        .with_http_send(ReqwestHttpSend::default())
        .with_env(OsEnv)
}

/// Create a handler signing for `region` with the default setup.
///
/// - Context from [`default_context`].
/// - Credentials from env, shared profile files and EC2 instance metadata,
///   cached until they are about to expire.
/// - Transport of the installed client; with the `reqwest-transport` feature
///   that's the reqwest transport.
///
/// # Errors
///
/// Fails with `MissingDependency` if no transport can be found; customize
/// through [`Handler::builder`] in that case.
///
/// ```no_run
/// # fn example() -> searchsign::Result<()> {
/// let handler = searchsign::default_handler("us-west-2")?;
/// assert_eq!(handler.config().service, "es");
/// # Ok(())
/// # }
/// ```
pub fn default_handler(region: &str) -> Result<Handler> {
    Handler::builder()
        .context(default_context())
        .region(region)
        .build()
}
