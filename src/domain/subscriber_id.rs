//! Type-safe live subscriber identifier.

use std::fmt;

/// Identifies one live connection's slot in the
/// [`super::SubscriberRegistry`].
///
/// Wraps a UUID v4 generated at subscribe time, so handles from different
/// connections of the same user never collide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(uuid::Uuid);

impl SubscriberId {
    /// Creates a new random `SubscriberId`.
    #[must_use]
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }

    /// Returns the inner [`uuid::Uuid`].
    #[must_use]
    pub const fn as_uuid(&self) -> &uuid::Uuid {
        &self.0
    }
}

impl Default for SubscriberId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_generates_unique_ids() {
        assert_ne!(SubscriberId::new(), SubscriberId::new());
    }

    #[test]
    fn display_is_uuid_format() {
        let id = SubscriberId::new();
        assert_eq!(id.to_string(), id.as_uuid().to_string());
        assert_eq!(id.to_string().len(), 36);
    }
}
