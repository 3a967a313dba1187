use rocket::{
    fairing::{Fairing, Info, Kind},
    http::{Header, StatusClass},
    request::{FromRequest, Outcome},
    Data, Orbit, Request, Response, Rocket,
};
use std::fmt::{Display, Formatter};
use std::time::Instant;

/// Header carrying the correlation ID, both inbound and outbound.
pub const REQUEST_ID_HEADER: &str = "X-Request-ID";

/// Longest client-supplied correlation ID that is accepted as-is.
const MAX_REQUEST_ID_LEN: usize = 128;

/// A correlation identifier for a particular request.
///
/// Taken from the `X-Request-ID` header when the client sends a usable one,
/// otherwise freshly generated. Every log line about a request carries it.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct RequestId(String);

impl Display for RequestId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for RequestId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl RequestId {
    /// The ID of `req`, assigned on first use and cached for the rest of the
    /// request.
    pub fn for_request<'r>(req: &'r Request<'_>) -> &'r RequestId {
        req.local_cache(|| {
            req.headers()
                .get_one(REQUEST_ID_HEADER)
                .filter(|id| is_acceptable(id))
                .map(RequestId::from)
                .unwrap_or_else(RequestId::generate)
        })
    }

    fn generate() -> RequestId {
        RequestId(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Non-empty, bounded, printable ASCII without spaces.
fn is_acceptable(id: &str) -> bool {
    !id.is_empty() && id.len() <= MAX_REQUEST_ID_LEN && id.bytes().all(|b| b.is_ascii_graphic())
}

/// Allow the ID to be accessed via request guard.
#[rocket::async_trait]
impl<'r> FromRequest<'r> for &'r RequestId {
    type Error = (); // No errors possible, use the `!` type once stabilised.

    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        Outcome::Success(RequestId::for_request(req))
    }
}

/// When the request arrived.
struct RequestStart(Option<Instant>);

/// A rocket fairing that does global logging, e.g. logging every request and response.
#[derive(Debug, Copy, Clone)]
pub struct LoggerFairing;

#[rocket::async_trait]
impl Fairing for LoggerFairing {
    fn info(&self) -> Info {
        Info {
            name: "Logger",
            kind: Kind::Liftoff | Kind::Request | Kind::Response | Kind::Shutdown,
        }
    }

    async fn on_liftoff(&self, rocket: &Rocket<Orbit>) {
        let protocol = if rocket.config().tls_enabled() {
            "https"
        } else {
            "http"
        };
        let ip = &rocket.config().address;
        let port = &rocket.config().port;
        info!("Server launched on {protocol}://{ip}:{port}");
    }

    async fn on_request(&self, req: &mut Request<'_>, _data: &mut Data<'_>) {
        req.local_cache(|| RequestStart(Some(Instant::now())));
        let id = RequestId::for_request(req);
        let method = req.method();
        let uri = req.uri();
        let ip = req
            .client_ip()
            .map_or_else(|| "-".to_string(), |ip| ip.to_string());
        let agent = req.headers().get_one("User-Agent").unwrap_or("-");
        info!("->req{id} {method} {uri} from {ip} ({agent})");
    }

    async fn on_response<'r>(&self, req: &'r Request<'_>, res: &mut Response<'r>) {
        let id = RequestId::for_request(req);
        res.set_header(Header::new(REQUEST_ID_HEADER, id.as_str().to_string()));

        let code = res.status();
        let route = match req.route() {
            Some(r) => {
                let mut str = r.uri.to_string();
                if let Some(ref name) = r.name {
                    str = format!("{name} ({str})");
                }
                str
            }
            None => "UNKNOWN ROUTE".to_string(),
        };
        let elapsed = match req.local_cache(|| RequestStart(None)).0 {
            Some(start) => format!("{}ms", start.elapsed().as_millis()),
            None => "-".to_string(),
        };
        let log_msg = format!("<-rsp{id} {code} {route} in {elapsed}");
        match code.class() {
            StatusClass::ServerError => error!("{log_msg}"),
            StatusClass::ClientError => warn!("{log_msg}"),
            _ => info!("{log_msg}"),
        }
    }

    async fn on_shutdown(&self, _rocket: &Rocket<Orbit>) {
        warn!("Shutdown requested, stopping gracefully...");
    }
}
