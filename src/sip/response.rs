/**
 * Adapter from an `rsip::Response` to the `Message` accessors, plus the bits the
 * host needs to route it: the To address-of-record and the CSeq method.
 */
use rsip::headers::{ToTypedHeader, UntypedHeader};
use rsip::{Header, Method, Uri};

use crate::pubip::intake::EventKind;

use super::status_code::{FIRST_FAILURE, PROXY_AUTHENTICATION_REQUIRED, UNAUTHORIZED};
use super::Message;

#[derive(Debug, Clone)]
pub struct InboundResponse {
    status: u16,
    vias: Vec<String>,
    headers: Vec<(String, String)>,
    to_aor: Option<String>,
    method: Option<Method>,
}

impl InboundResponse {
    pub fn from_response(response: &rsip::Response) -> Self {
        let mut vias = Vec::new();
        let mut headers = Vec::new();
        let mut to_aor = None;
        let mut method = None;

        for header in response.headers.iter() {
            match header {
                Header::Via(via) => vias.push(via.value().to_string()),
                Header::To(to) => {
                    to_aor = to.typed().ok().map(|to| aor_of(&to.uri));
                }
                Header::CSeq(cseq) => {
                    method = cseq.typed().ok().map(|cseq| cseq.method);
                }
                // compact form, RFC 3261 Section 7.3.3
                Header::Other(name, value) if name.eq_ignore_ascii_case("v") => {
                    vias.push(value.clone())
                }
                Header::Other(name, value) => headers.push((name.clone(), value.clone())),
                _ => {}
            }
        }

        Self {
            status: response.status_code.code(),
            vias,
            headers,
            to_aor,
            method,
        }
    }

    /// user@host of the To header
    pub fn to_aor(&self) -> Option<&str> {
        self.to_aor.as_deref()
    }

    pub fn is_register(&self) -> bool {
        self.method == Some(Method::Register)
    }

    /**
     * Map the response onto the event kinds the host publishes.
     *
     * Authentication challenges are part of a normal registration exchange and are
     * not reported as failures.
     */
    pub fn event_kind(&self) -> EventKind {
        if !self.is_register() {
            return EventKind::Response;
        }

        match self.status {
            100..=199 => EventKind::Registering,
            200..=299 => EventKind::RegisterOk,
            UNAUTHORIZED | PROXY_AUTHENTICATION_REQUIRED => EventKind::Response,
            s if s >= FIRST_FAILURE => EventKind::RegisterFail,
            _ => EventKind::Response,
        }
    }
}

impl Message for InboundResponse {
    fn via_header(&self) -> Option<&str> {
        self.vias.first().map(String::as_str)
    }

    fn status_code(&self) -> u16 {
        self.status
    }

    fn custom_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

fn aor_of(uri: &Uri) -> String {
    match &uri.auth {
        Some(auth) => format!("{}@{}", auth.user, uri.host_with_port.host),
        None => uri.host_with_port.host.to_string(),
    }
}
