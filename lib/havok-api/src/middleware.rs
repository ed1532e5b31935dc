//! Rate-limit and connection-limit middleware objects
//!
//! Vulcand reads these as JSON from the location's `middlewares` directory.
//! Field names are PascalCase on the wire.

use serde::{Deserialize, Serialize};

/// Priority given to every middleware written by havok
pub const DEFAULT_PRIORITY: i64 = 1;

/// Rate-limit middleware envelope
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RateLimit {
    pub id: String,
    pub priority: i64,
    #[serde(rename = "Type")]
    pub kind: String,
    pub middleware: RequestMiddleware,
}

/// Rate-limit parameters
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RequestMiddleware {
    pub period_seconds: u64,
    pub burst: u64,
    pub variable: String,
    pub requests: u64,
}

/// Connection-limit middleware envelope
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ConnectionLimit {
    pub id: String,
    pub priority: i64,
    #[serde(rename = "Type")]
    pub kind: String,
    pub middleware: ConnectionMiddleware,
}

/// Connection-limit parameters
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ConnectionMiddleware {
    pub variable: String,
    pub connections: u64,
}

impl RateLimit {
    pub const TYPE: &'static str = "ratelimit";

    /// Limit to `requests` per second with the given burst, keyed by `variable`
    pub fn new(requests: u64, burst: u64, variable: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            priority: DEFAULT_PRIORITY,
            kind: Self::TYPE.to_string(),
            middleware: RequestMiddleware {
                period_seconds: 1,
                burst,
                variable: variable.into(),
                requests,
            },
        }
    }

    /// Serialize to the JSON document stored in the key space
    pub fn encode(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn decode(raw: &str) -> serde_json::Result<Self> {
        serde_json::from_str(raw)
    }
}

impl ConnectionLimit {
    pub const TYPE: &'static str = "connlimit";

    /// Limit concurrent connections per `variable`
    pub fn new(connections: u64, variable: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            priority: DEFAULT_PRIORITY,
            kind: Self::TYPE.to_string(),
            middleware: ConnectionMiddleware {
                variable: variable.into(),
                connections,
            },
        }
    }

    pub fn encode(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn decode(raw: &str) -> serde_json::Result<Self> {
        serde_json::from_str(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    #[test]
    fn test_rate_limit_wire_format() {
        let encoded = RateLimit::new(10, 5, "client.ip").encode().unwrap();
        let value: Value = serde_json::from_str(&encoded).unwrap();
        assert_eq!(
            value,
            json!({
                "Id": "",
                "Priority": 1,
                "Type": "ratelimit",
                "Middleware": {
                    "PeriodSeconds": 1,
                    "Burst": 5,
                    "Variable": "client.ip",
                    "Requests": 10
                }
            })
        );
    }

    #[test]
    fn test_rate_limit_decodes_back() {
        let encoded = RateLimit::new(25, 3, "request.header.X-Key").encode().unwrap();
        let decoded = RateLimit::decode(&encoded).unwrap();
        assert_eq!(decoded.middleware.requests, 25);
        assert_eq!(decoded.middleware.burst, 3);
        assert_eq!(decoded.middleware.variable, "request.header.X-Key");
        assert_eq!(decoded.priority, 1);
        assert_eq!(decoded.kind, "ratelimit");
        assert!(decoded.id.is_empty());
    }

    #[test]
    fn test_connection_limit_wire_format() {
        let encoded = ConnectionLimit::new(100, "client.ip").encode().unwrap();
        let value: Value = serde_json::from_str(&encoded).unwrap();
        assert_eq!(
            value,
            json!({
                "Id": "",
                "Priority": 1,
                "Type": "connlimit",
                "Middleware": {
                    "Variable": "client.ip",
                    "Connections": 100
                }
            })
        );
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(ConnectionLimit::decode("{\"Id\": 3}").is_err());
    }
}
