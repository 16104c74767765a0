use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// 镜像源定义
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mirror {
    pub name: String,   // 例如: "Aliyun"
    pub url: String,    // 例如: "https://mirrors.aliyun.com/pypi/simple/"
}

impl Mirror {
    pub fn new(name: &str, url: &str) -> Self {
        Self {
            name: name.to_string(),
            url: url.to_string(),
        }
    }
}

/// TCP 连接延迟
///
/// `Millis` is always finite, non-negative and rounded to 2 decimal places.
/// `Unreachable` orders after every finite latency, so a failed mirror can
/// never win a min or sort to the top.
#[derive(Debug, Clone, Copy)]
pub enum Latency {
    Millis(f64),
    Unreachable,
}

impl Latency {
    pub fn is_reachable(&self) -> bool {
        matches!(self, Latency::Millis(_))
    }
}

impl Ord for Latency {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Latency::Millis(a), Latency::Millis(b)) => a.total_cmp(b),
            (Latency::Millis(_), Latency::Unreachable) => Ordering::Less,
            (Latency::Unreachable, Latency::Millis(_)) => Ordering::Greater,
            (Latency::Unreachable, Latency::Unreachable) => Ordering::Equal,
        }
    }
}

impl PartialOrd for Latency {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Latency {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Latency {}

impl fmt::Display for Latency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Latency::Millis(ms) => write!(f, "{:.2}ms", ms),
            Latency::Unreachable => write!(f, "Timeout"),
        }
    }
}

/// 测速结果
#[derive(Debug, Clone)]
pub struct ProbeResult {
    pub mirror: Mirror,
    pub latency: Latency,
}

/// 一轮测速的裁决结果
#[derive(Debug, Clone)]
pub enum Selection {
    /// 延迟最低的可达镜像
    Fastest(ProbeResult),
    /// 所有镜像都连接失败或超时
    AllUnreachable,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unreachable_ranks_after_any_finite_latency() {
        assert!(Latency::Millis(99999.99) < Latency::Unreachable);
        assert!(Latency::Millis(0.0) < Latency::Unreachable);
        assert_eq!(Latency::Unreachable, Latency::Unreachable);
    }

    #[test]
    fn finite_latencies_order_numerically() {
        assert!(Latency::Millis(12.5) < Latency::Millis(13.0));
        assert_eq!(Latency::Millis(7.25), Latency::Millis(7.25));

        let mut v = vec![
            Latency::Unreachable,
            Latency::Millis(40.0),
            Latency::Millis(8.12),
        ];
        v.sort();
        assert_eq!(v[0], Latency::Millis(8.12));
        assert_eq!(v[2], Latency::Unreachable);
    }
}
