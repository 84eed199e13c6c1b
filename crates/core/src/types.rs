/// All record identifiers are UUIDv4. Ids are embedded inside project
/// documents (collaborator lists, annotation authors), so they must be
/// generatable client-of-the-database and compare by value.
pub type Id = uuid::Uuid;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
