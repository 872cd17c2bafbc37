//! Nginx access log statistics

use crate::docstore::DocumentStore;
use crate::error::{CacheError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;

/// Methods reported individually, in report order
pub const HTTP_METHODS: [&str; 5] = ["GET", "POST", "PUT", "PATCH", "DELETE"];

/// Request count of one client address
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpCount {
    pub ip: String,
    pub count: u64,
}

/// Summary of a log collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogStats {
    /// Total number of log documents
    pub total: u64,

    /// Count per method, in [`HTTP_METHODS`] order
    pub methods: Vec<(String, u64)>,

    /// `GET /status` requests
    pub status_checks: u64,

    /// Busiest addresses, most requests first; `None` when not collected
    pub top_ips: Option<Vec<IpCount>>,
}

impl LogStats {
    /// Gather counts from `store`
    ///
    /// With `top_ips` set, the busiest addresses are grouped by `ip` and
    /// limited to that many entries.
    pub async fn collect<S>(store: &S, top_ips: Option<usize>) -> Result<Self>
    where
        S: DocumentStore + ?Sized,
    {
        let total = store.count_documents(json!({})).await?;

        let mut methods = Vec::with_capacity(HTTP_METHODS.len());
        for method in HTTP_METHODS {
            let count = store.count_documents(json!({ "method": method })).await?;
            methods.push((method.to_string(), count));
        }

        let status_checks = store
            .count_documents(json!({ "method": "GET", "path": "/status" }))
            .await?;

        let top_ips = match top_ips {
            Some(limit) => Some(Self::busiest_ips(store, limit).await?),
            None => None,
        };

        Ok(Self {
            total,
            methods,
            status_checks,
            top_ips,
        })
    }

    async fn busiest_ips<S>(store: &S, limit: usize) -> Result<Vec<IpCount>>
    where
        S: DocumentStore + ?Sized,
    {
        let rows = store
            .aggregate(vec![
                json!({ "$group": { "_id": "$ip", "count": { "$sum": 1 } } }),
                json!({ "$sort": { "count": -1 } }),
                json!({ "$limit": limit }),
            ])
            .await?;

        rows.into_iter()
            .take(limit)
            .map(|row| {
                let ip = match row.get("_id") {
                    Some(Value::String(ip)) => ip.clone(),
                    Some(Value::Null) | None => "None".to_string(),
                    Some(other) => other.to_string(),
                };
                let count = row
                    .get("count")
                    .and_then(|c| c.as_u64().or_else(|| c.as_f64().map(|f| f as u64)))
                    .ok_or_else(|| {
                        CacheError::QueryError(format!("IP group {} has no numeric count", ip))
                    })?;
                Ok(IpCount { ip, count })
            })
            .collect()
    }
}

impl fmt::Display for LogStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} logs", self.total)?;
        writeln!(f, "Methods:")?;
        for (method, count) in &self.methods {
            writeln!(f, "\tmethod {}: {}", method, count)?;
        }
        write!(f, "{} status check", self.status_checks)?;

        if let Some(ips) = &self.top_ips {
            write!(f, "\nIPs:")?;
            for entry in ips {
                write!(f, "\n\t{}: {}", entry.ip, entry.count)?;
            }
        }
        Ok(())
    }
}
