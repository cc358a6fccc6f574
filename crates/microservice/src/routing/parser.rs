use super::directive::{Directive, FaultSpec, HopTarget, DEFAULT_FAULT_PERCENTAGE};
use super::scheme::Scheme;
use crate::error::ParseError;

use std::borrow::Cow;

const FAULT_PREFIX: &str = "/fault/";
const PROXY_PREFIX: &str = "/proxy/";

/// Parse the leading directive of `path`.
///
/// - `""` and `"/"` are terminal.
/// - `/fault/<code>[/<percentage>]/...` is a fault gate. A percentage segment
///   that is not an integer is not a percentage: it starts the remaining path
///   and the gate fires 100% of the time. An integer outside 0-100 is rejected.
/// - `/proxy/[http://|https://]host[:port]/...` forwards to `host[:port]`.
///   The collapsed form `https:/host` is accepted as well.
pub fn parse(path: &str) -> Result<Directive, ParseError> {
    if path.is_empty() || path == "/" {
        return Ok(Directive::Terminal);
    }

    if let Some(rest) = path.strip_prefix(FAULT_PREFIX) {
        return parse_fault(rest);
    }

    if let Some(rest) = path.strip_prefix(PROXY_PREFIX) {
        return parse_forward(rest);
    }

    Err(ParseError::UnrecognizedPrefix(path.to_string()))
}

/// Percent-decode a request path before it is parsed.
///
/// `/proxy/b%3A8080` names the hop `b:8080`. Borrows when nothing is escaped.
pub fn decode_path(raw: &str) -> Result<Cow<'_, str>, ParseError> {
    urlencoding::decode(raw).map_err(|_| ParseError::InvalidEncoding(raw.to_string()))
}

fn parse_fault(rest: &str) -> Result<Directive, ParseError> {
    let segments: Vec<&str> = rest.split('/').collect();

    let code_segment = segments[0];
    let status = code_segment
        .parse::<i64>()
        .ok()
        .filter(|code| (400..=599).contains(code))
        .ok_or_else(|| ParseError::InvalidFaultCode(code_segment.to_string()))?;

    let mut consumed = 1;
    let mut percentage = i64::from(DEFAULT_FAULT_PERCENTAGE);
    if let Some(value) = segments
        .get(1)
        .filter(|segment| !segment.is_empty())
        .and_then(|segment| segment.parse::<i64>().ok())
    {
        percentage = value;
        consumed = 2;
    }

    if !(0..=100).contains(&percentage) {
        return Err(ParseError::InvalidPercentage(percentage));
    }

    // Both values are range-checked above.
    let fault = FaultSpec::new(status as u16, percentage as u8)
        .ok_or_else(|| ParseError::InvalidFaultCode(code_segment.to_string()))?;

    Ok(Directive::Fault {
        fault,
        remaining: join_remaining(&segments[consumed..]),
    })
}

fn parse_forward(rest: &str) -> Result<Directive, ParseError> {
    let segments: Vec<&str> = rest.split('/').collect();

    let (scheme, host_index) = match Scheme::from_segment(segments[0]) {
        // `https://host` splits into ["https:", "", "host"]
        Some(scheme) if segments.get(1) == Some(&"") && segments.len() > 2 => (scheme, 2),
        // `https:/host` after slash merging
        Some(scheme) => (scheme, 1),
        None => (Scheme::Http, 0),
    };

    let authority = segments
        .get(host_index)
        .copied()
        .filter(|host| !host.is_empty())
        .ok_or(ParseError::EmptyServiceName)?;

    Ok(Directive::Forward {
        hop: HopTarget::new(scheme, authority),
        remaining: join_remaining(&segments[host_index + 1..]),
    })
}

fn join_remaining(segments: &[&str]) -> String {
    if segments.is_empty() {
        return "/".to_string();
    }
    format!("/{}", segments.join("/"))
}
