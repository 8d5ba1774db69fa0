use anyhow::{Context, Result};
use ledger_core::{Block, ChainSource};
use serde::Deserialize;
use std::{future::Future, time::Duration};

/// Fetches peer chains from their `GET /chain` endpoint.
#[derive(Clone, Debug)]
pub struct HttpPeerClient {
    client: reqwest::Client,
}

impl HttpPeerClient {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("building peer http client")?;
        Ok(Self { client })
    }
}

/// Accepts `host:port` as well as full `http(s)://` base URLs.
pub fn chain_url(peer: &str) -> String {
    let base = peer.trim_end_matches('/');
    if base.starts_with("http://") || base.starts_with("https://") {
        format!("{base}/chain")
    } else {
        format!("http://{base}/chain")
    }
}

/// Peers answer `GET /chain` with either a bare array of blocks or an
/// object carrying the array under `chain`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PeerChain {
    Bare(Vec<Block>),
    Wrapped { chain: Vec<Block> },
}

impl PeerChain {
    fn into_blocks(self) -> Vec<Block> {
        match self {
            PeerChain::Bare(chain) | PeerChain::Wrapped { chain } => chain,
        }
    }
}

impl ChainSource for HttpPeerClient {
    fn fetch_chain(&self, peer: &str) -> impl Future<Output = Result<Vec<Block>>> + Send {
        let url = chain_url(peer);
        let client = self.client.clone();
        async move {
            let response = client
                .get(&url)
                .send()
                .await
                .with_context(|| format!("GET {url}"))?
                .error_for_status()?;
            let body: PeerChain = response
                .json()
                .await
                .with_context(|| format!("decoding chain from {url}"))?;
            Ok(body.into_blocks())
        }
    }
}
