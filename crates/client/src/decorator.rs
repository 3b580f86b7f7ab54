//! Outbound request decoration: bearer token and content-type hygiene.

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderValue};

use bazaar_core::{RouteClass, RouteTable, RunMode};

use crate::request::ApiRequest;
use crate::selector::{TokenSelection, select_token};
use crate::session::CredentialSlots;

/// What the decorator decided for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoration {
    pub class: RouteClass,
    pub attached: bool,
    pub needs_refresh: bool,
}

#[derive(Debug, Clone)]
pub struct RequestDecorator {
    routes: RouteTable,
    mode: RunMode,
}

impl RequestDecorator {
    pub fn new(routes: RouteTable, mode: RunMode) -> Self {
        Self { routes, mode }
    }

    pub fn classify(&self, req: &ApiRequest) -> RouteClass {
        self.routes.classify(req.route_path())
    }

    /// Mutates headers only.
    pub fn decorate(&self, req: &mut ApiRequest, slots: &CredentialSlots) -> Decoration {
        let class = self.classify(req);
        let selection = select_token(slots, class, self.mode);

        let attached = match selection.token().map(|t| HeaderValue::from_str(&format!("Bearer {t}"))) {
            Some(Ok(mut value)) => {
                value.set_sensitive(true);
                req.headers.insert(AUTHORIZATION, value);
                true
            }
            Some(Err(_)) => {
                tracing::warn!(path = req.route_path(), "token is not a valid header value; sending without it");
                req.headers.remove(AUTHORIZATION);
                false
            }
            None => {
                req.headers.remove(AUTHORIZATION);
                false
            }
        };

        if req.body.is_binary() && req.has_content_type() {
            req.headers.remove(CONTENT_TYPE);
        }

        Decoration {
            class,
            attached,
            needs_refresh: selection == TokenSelection::NeedsRefresh,
        }
    }
}
