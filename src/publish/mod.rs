//! Target side: uploading the local mirror to another repository.

mod publisher;
mod target;

pub use publisher::{PublishPolicy, Publisher};
pub use target::{HttpTarget, ProbeStatus, PublishTarget, UploadResponse};
