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

use anyhow::Result;
use searchsign::{Headers, InboundRequest};

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let host = std::env::var("SEARCH_HOST").unwrap_or_else(|_| "search.example.com".to_string());
    let region = std::env::var("AWS_REGION").unwrap_or_else(|_| "us-west-2".to_string());

    let handler = searchsign::default_handler(&region)?;
    let resp = handler
        .handle(InboundRequest {
            method: "GET".to_string(),
            uri: "/_cluster/health".to_string(),
            headers: Headers::from_iter([("host", vec![host])]),
            ..Default::default()
        })
        .await?;

    println!("status: {}", resp.status());
    println!("{}", String::from_utf8_lossy(resp.body()));
    Ok(())
}
