use crate::domain::value_objects::EntityKind;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{de::DeserializeOwned, Serialize};

/// Binds a typed entity to its table and identity attributes. Implemented
/// by every synchronizable record; the repository facade is generic over it.
pub trait SyncRecord: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    const KIND: EntityKind;

    fn id(&self) -> &str;

    /// Stamp the client-generated identifier and creation timestamps onto a
    /// freshly drafted record. Identifiers are assigned exactly once.
    fn assign_identity(&mut self, id: String, now: DateTime<Utc>);
}

/// Timestamps are stored and shipped as ISO-8601 strings with millisecond
/// precision, matching the remote service's column format.
pub fn iso_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}
