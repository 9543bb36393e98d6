// src/fetch.rs

use anyhow::{Context, Result};
use rand::Rng;
use reqwest::blocking::Client;
use std::thread;
use std::time::{Duration, Instant};
use tracing::info;

/// GET `url` and return the whole response body.
///
/// Any transport error or non-2xx status propagates as an error with no
/// retry or backoff; callers treat that as fatal. After a successful
/// fetch the thread sleeps uniformly in [0.5, 1.0) seconds so back-to-back
/// requests do not hammer the SSA servers.
pub fn get_bytes(client: &Client, url: &str) -> Result<Vec<u8>> {
    let start = Instant::now();
    let resp = client
        .get(url)
        .send()
        .with_context(|| format!("GET {} failed", url))?
        .error_for_status()
        .with_context(|| format!("non-success status from {}", url))?;
    let status = resp.status();
    let body = resp
        .bytes()
        .with_context(|| format!("reading body from {}", url))?;
    info!(status = %status, url = %url, elapsed = ?start.elapsed(), "fetched");

    let courtesy = 0.5 * (1.0 + rand::thread_rng().gen::<f64>());
    thread::sleep(Duration::from_secs_f64(courtesy));

    Ok(body.to_vec())
}
