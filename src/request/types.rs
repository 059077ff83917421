/// Identifier assigned to a request when it is sent
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct RequestId(u64);

impl RequestId {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "req-{}", self.0)
    }
}

/// HTTP verbs supported by the request factories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
    Head,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
            Method::Head => "HEAD",
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Method {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Method::Get),
            "POST" => Ok(Method::Post),
            "PUT" => Ok(Method::Put),
            "DELETE" => Ok(Method::Delete),
            "HEAD" => Ok(Method::Head),
            other => Err(format!("unsupported method: {other}")),
        }
    }
}

/// Lifecycle of a single request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestPhase {
    Building,
    Sent,
    Running,
    Succeeded,
    HttpError,
    NetworkError,
    Aborted,
}

impl RequestPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RequestPhase::Succeeded
                | RequestPhase::HttpError
                | RequestPhase::NetworkError
                | RequestPhase::Aborted
        )
    }

    /// Whether the state machine allows moving from `self` to `next`
    pub fn can_transition_to(&self, next: RequestPhase) -> bool {
        matches!(
            (self, next),
            (RequestPhase::Building, RequestPhase::Sent)
                | (RequestPhase::Sent, RequestPhase::Running)
                | (RequestPhase::Sent, RequestPhase::Aborted)
                | (RequestPhase::Running, RequestPhase::Succeeded)
                | (RequestPhase::Running, RequestPhase::HttpError)
                | (RequestPhase::Running, RequestPhase::NetworkError)
                | (RequestPhase::Running, RequestPhase::Aborted)
        )
    }
}

impl std::fmt::Display for RequestPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RequestPhase::Building => write!(f, "building"),
            RequestPhase::Sent => write!(f, "sent"),
            RequestPhase::Running => write!(f, "running"),
            RequestPhase::Succeeded => write!(f, "succeeded"),
            RequestPhase::HttpError => write!(f, "http_error"),
            RequestPhase::NetworkError => write!(f, "network_error"),
            RequestPhase::Aborted => write!(f, "aborted"),
        }
    }
}

/// Terminal classification of a completed transport operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    Succeeded,
    HttpError,
    NetworkError,
}

impl Outcome {
    pub fn phase(&self) -> RequestPhase {
        match self {
            Outcome::Succeeded => RequestPhase::Succeeded,
            Outcome::HttpError => RequestPhase::HttpError,
            Outcome::NetworkError => RequestPhase::NetworkError,
        }
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.phase(), f)
    }
}
