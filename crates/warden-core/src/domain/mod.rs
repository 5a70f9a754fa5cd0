//! Domain model (ids, artifacts, records, status, errors).

pub mod artifact;
pub mod errors;
pub mod ids;
pub mod record;
pub mod state;

pub use self::artifact::{ArtifactId, ArtifactRef, GeoLocation};
pub use self::errors::WardenError;
pub use self::ids::{PassId, RecordId};
pub use self::record::{DEFAULT_MAX_RETRIES, QueueRecord};
pub use self::state::UploadStatus;
