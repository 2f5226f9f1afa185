//! Domain model (messages, references, resources, outcomes, errors).

pub mod errors;
pub mod ids;
pub mod message;
pub mod outcome;
pub mod reference;
pub mod resource;

pub use self::errors::{
    CleanupWarning, DecodeError, DecodeStrategy, ErrorKind, PipelineError, TransportError,
};
pub use self::ids::{AttemptId, ResourceId};
pub use self::message::{DeliveryToken, MessageBody, MessageId, RawMessage};
pub use self::outcome::ProcessingOutcome;
pub use self::reference::BlobReference;
pub use self::resource::FetchedResource;
