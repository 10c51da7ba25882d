/// Wires a request struct to its response type and to the `Command` or
/// `Query` marker. The struct must carry a `request_id: RequestId` field.
macro_rules! request {
    ($request:ty => $response:ty, $kind:ident) => {
        impl nest_mediator::Request for $request {
            type Response = $response;

            fn request_id(&self) -> uuid::Uuid {
                self.request_id.as_uuid()
            }
        }

        impl nest_mediator::$kind for $request {}
    };
}

pub mod bootstrap;
pub mod commands;
pub mod events;
pub mod handlers;
pub mod queries;
pub mod responses;
pub mod validation;

pub use bootstrap::{Dependencies, registry, setup_mediator};
