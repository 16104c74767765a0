use crate::error::{MirrorError, Result};
use crate::types::{Latency, Mirror, ProbeResult, Selection};
use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::{Duration, Instant};
use tokio::net::{lookup_host, TcpStream};
use tokio::time;

/// 默认单个探测超时
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

// 同时在途的探测上限, 避免超大候选列表一次性占满文件描述符
const MAX_IN_FLIGHT: usize = 32;

/// 单个源测速逻辑
///
/// Opens one TCP connection to the mirror host and times the handshake.
/// Every failure mode (bad URL, DNS failure, refused, timeout) folds into
/// `Latency::Unreachable`, so a single bad mirror can never abort a batch.
/// The whole resolve+connect sequence is bounded by `timeout`.
pub async fn probe(mirror: Mirror, timeout: Duration) -> ProbeResult {
    let latency = match time::timeout(timeout, timed_connect(&mirror.url)).await {
        Ok(Ok(ms)) => Latency::Millis(ms),
        // 内部错误或整体超时都视为不可达
        _ => Latency::Unreachable,
    };
    ProbeResult { mirror, latency }
}

async fn timed_connect(raw_url: &str) -> Result<f64> {
    let (host, port) = parse_endpoint(raw_url)?;

    let addr = lookup_host((host.as_str(), port))
        .await?
        .next()
        .ok_or_else(|| MirrorError::Custom(format!("No address for host: {}", host)))?;

    let start = Instant::now();

    // Dropping the stream closes the socket immediately; no data is exchanged.
    let _stream = TcpStream::connect(addr).await?;
    let ms = start.elapsed().as_secs_f64() * 1000.0;

    Ok((ms * 100.0).round() / 100.0)
}

/// Parse URL and return hostname and port.
fn parse_endpoint(raw_url: &str) -> Result<(String, u16)> {
    let parsed = url::Url::parse(raw_url)?;

    let host = parsed
        .host_str()
        .filter(|h| !h.is_empty())
        .ok_or_else(|| MirrorError::Custom(format!("Invalid URL host: {}", raw_url)))?
        .to_string();

    let port = parsed
        .port_or_known_default()
        .unwrap_or(if parsed.scheme() == "https" { 443 } else { 80 });

    Ok((host, port))
}

/// 并发测试所有镜像源的延迟
///
/// 逻辑:
/// 1. 校验超时参数 (零值在派发前直接拒绝)
/// 2. 为每个镜像源生成一个异步探测任务
/// 3. 至多 32 个任务同时在途, 等待全部完成后返回
/// 4. 结果与输入一一对应并保持输入顺序
pub async fn probe_all(mirrors: Vec<Mirror>, timeout: Duration) -> Result<Vec<ProbeResult>> {
    if timeout.is_zero() {
        return Err(MirrorError::InvalidTimeout);
    }

    let pb = ProgressBar::new(mirrors.len() as u64);
    pb.set_style(
        ProgressStyle::with_template("[{bar:40.cyan/blue}] {percent}% {msg}")
            .unwrap()
            .progress_chars("|| "),
    );
    pb.set_message("Testing...");

    let tasks = mirrors.into_iter().map(|m| {
        let pb = pb.clone();
        async move {
            let res = probe(m, timeout).await;
            pb.inc(1);
            res
        }
    });

    // `buffered` (not `buffer_unordered`) keeps input order in the output,
    // so tie-breaking stays deterministic for an ordered candidate list.
    let results = stream::iter(tasks)
        .buffered(MAX_IN_FLIGHT)
        .collect::<Vec<_>>()
        .await;

    pb.finish_with_message("Testing completed.");

    Ok(results)
}

/// 裁决: 过滤不可达结果, 取延迟最小者
///
/// Ties go to the first reachable entry in batch order, which `probe_all`
/// guarantees is the input order.
pub fn select_best(batch: &[ProbeResult]) -> Selection {
    batch
        .iter()
        .filter(|r| r.latency.is_reachable())
        .min_by(|a, b| a.latency.cmp(&b.latency))
        .map(|r| Selection::Fastest(r.clone()))
        .unwrap_or(Selection::AllUnreachable)
}

/// 排序: 延迟低的在前, 失败的在后 (报表输出用)
pub fn ranked(batch: &[ProbeResult]) -> Vec<ProbeResult> {
    let mut sorted = batch.to_vec();
    // stable sort, ties keep batch order
    sorted.sort_by(|a, b| a.latency.cmp(&b.latency));
    sorted
}
