use super::scheme::Scheme;
use hyper::StatusCode;

/// Percentage applied to a fault segment that does not carry one.
pub const DEFAULT_FAULT_PERCENTAGE: u8 = 100;

/// The instruction parsed from the leading segment(s) of a path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    /// No segments left: answer locally.
    Terminal,
    /// Fault gate, followed by the rest of the path.
    Fault { fault: FaultSpec, remaining: String },
    /// Forward the rest of the path to the next hop.
    Forward { hop: HopTarget, remaining: String },
}

impl Directive {
    /// The unconsumed suffix of the parsed path. Always starts with `/`.
    pub fn remaining(&self) -> &str {
        match self {
            Directive::Terminal => "/",
            Directive::Fault { remaining, .. } | Directive::Forward { remaining, .. } => remaining,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Directive::Terminal)
    }

    pub fn is_fault(&self) -> bool {
        matches!(self, Directive::Fault { .. })
    }

    pub fn next_hop(&self) -> Option<&HopTarget> {
        match self {
            Directive::Forward { hop, .. } => Some(hop),
            _ => None,
        }
    }

    pub fn fault(&self) -> Option<&FaultSpec> {
        match self {
            Directive::Fault { fault, .. } => Some(fault),
            _ => None,
        }
    }
}

/// Status and firing probability of an injected fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FaultSpec {
    status: StatusCode,
    percentage: u8,
}

impl FaultSpec {
    /// Build a fault; `None` unless the status is in 400..=599 and the
    /// percentage in 0..=100.
    pub fn new(status: u16, percentage: u8) -> Option<Self> {
        if !(400..=599).contains(&status) || percentage > 100 {
            return None;
        }
        let status = StatusCode::from_u16(status).ok()?;
        Some(Self { status, percentage })
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn percentage(&self) -> u8 {
        self.percentage
    }

    /// Reason phrase used in the fault message.
    pub fn reason(&self) -> &'static str {
        self.status.canonical_reason().unwrap_or("Unknown Error")
    }
}

/// The hop named by a `/proxy/` segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HopTarget {
    scheme: Scheme,
    authority: String,
}

impl HopTarget {
    pub fn new(scheme: Scheme, authority: impl Into<String>) -> Self {
        Self {
            scheme,
            authority: authority.into(),
        }
    }

    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    /// `host` or `host:port`.
    pub fn authority(&self) -> &str {
        &self.authority
    }

    /// Absolute URL of `path` on this hop.
    pub fn url_for(&self, path: &str) -> String {
        format!("{}://{}{}", self.scheme, self.authority, path)
    }
}
