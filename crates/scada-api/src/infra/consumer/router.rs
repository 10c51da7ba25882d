use std::sync::Arc;

use nest_mediator::{Mediator, RequestEnvelope};
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::{
    domain::models::InboundRequest,
    infra::consumer::{
        registry::{DecodeError, RequestRegistry},
        reply::Reply,
    },
};

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    name: String,
    #[serde(default = "empty_body")]
    body: Value,
}

fn empty_body() -> Value {
    Value::Object(Map::new())
}

/// Turns one inbound line into a mediator call and its outcome into a reply.
#[derive(Clone)]
pub struct RequestRouter {
    registry: Arc<RequestRegistry>,
    mediator: Mediator,
}

impl RequestRouter {
    pub fn new(registry: RequestRegistry, mediator: Mediator) -> Self {
        debug!(requests = registry.len(), "request router ready");
        Self {
            registry: Arc::new(registry),
            mediator,
        }
    }

    pub async fn handle(&self, request: InboundRequest) -> Reply {
        let envelope = match self.decode(&request.line) {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!("rejected inbound request: {e}");
                return Reply::failure(None, (&e).into());
            }
        };

        let request_id = envelope.request_id();
        let outcome = self
            .mediator
            .send_envelope(envelope)
            .await
            .and_then(|response| response.to_json());

        match outcome {
            Ok(response) => Reply::success(request_id, response),
            Err(e) => Reply::failure(Some(request_id), (&e).into()),
        }
    }

    fn decode(&self, line: &str) -> Result<RequestEnvelope, DecodeError> {
        let Envelope { name, body } = serde_json::from_str(line)?;
        self.registry.decode(&name, body)
    }
}
