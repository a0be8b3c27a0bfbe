use crate::backend::requests::Request;
use serde::de::{Error, Visitor};
use serde::{Deserialize, Deserializer};
use std::borrow::Cow;
use std::fmt::Formatter;

/// The fields of `/cdn-cgi/trace` the monitor cares about.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Trace {
    pub ip: String,
    pub colo: String,
    pub loc: String,
    pub http: String,
}

pub(crate) struct TraceRequest {}

impl Request for TraceRequest {
    type Response = Trace;

    fn endpoint(&self) -> Cow<'_, str> {
        "cdn-cgi/trace".into()
    }
}

impl<'de> Deserialize<'de> for Trace {
    fn deserialize<D>(deserializer: D) -> Result<Trace, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_str(TraceVisitor)
    }
}

struct TraceVisitor;

impl<'de> Visitor<'de> for TraceVisitor {
    type Value = Trace;

    fn expecting(&self, formatter: &mut Formatter) -> std::fmt::Result {
        formatter.write_str("a newline-separated list of key=value pairs")
    }

    fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
    where
        E: Error,
    {
        let mut trace = Trace::default();

        for (key, value) in v.lines().filter_map(|line| line.split_once('=')) {
            let value = value.trim().to_string();
            match key.trim() {
                "ip" => trace.ip = value,
                "colo" => trace.colo = value,
                "loc" => trace.loc = value,
                "http" => trace.http = value,
                _ => {}
            }
        }

        if trace.colo.is_empty() {
            return Err(E::custom("trace response has no colo"));
        }

        Ok(trace)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "fl=29f1\nh=speed.cloudflare.com\nip=203.0.113.7\n\
        ts=1700000000.123\nvisit_scheme=https\nuag=speed-monitor/0.1.0\n\
        colo=SJC\nsliver=none\nhttp=http/1.1\nloc=US\ntls=TLSv1.3\n\
        sni=plaintext\nwarp=off\ngateway=off\nrbi=off\nkex=X25519\n";

    #[test]
    fn test_parse_trace() {
        let trace: Trace = serde_plain::from_str(SAMPLE).unwrap();

        assert_eq!(trace.ip, "203.0.113.7");
        assert_eq!(trace.colo, "SJC");
        assert_eq!(trace.loc, "US");
        assert_eq!(trace.http, "http/1.1");
    }

    #[test]
    fn test_value_may_contain_equals() {
        let trace: Trace =
            serde_plain::from_str("colo=AMS\nuag=a=b\nip=198.51.100.1").unwrap();
        assert_eq!(trace.colo, "AMS");
        assert_eq!(trace.ip, "198.51.100.1");
    }

    #[test]
    fn test_missing_colo_is_rejected() {
        let result: Result<Trace, _> = serde_plain::from_str("ip=198.51.100.1\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_not_json() {
        assert!(serde_json::from_str::<Trace>(SAMPLE).is_err());
    }
}
