//! # Application identity.
//!
//! [`Identity`] names the application a supervisor runs. Its composite id
//! (`"{name}/{version}"`) is handed to every service before it starts.

use std::fmt;

/// Name, version and the composite id derived from them.
///
/// Immutable once built; a supervisor without an identifier uses
/// [`Identity::default`], whose name, version and id are all empty.
///
/// ```
/// use serviceloader::Identity;
///
/// let id = Identity::new("gateway", "1.2.0");
/// assert_eq!(id.id(), "gateway/1.2.0");
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Identity {
    name: String,
    version: String,
    id: String,
}

impl Identity {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        let name = name.into();
        let version = version.into();
        let id = format!("{name}/{version}");
        Self { name, version, id }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Composite application id passed to [`Service::set_application_id`](crate::Service::set_application_id).
    pub fn id(&self) -> &str {
        &self.id
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn composite_id_joins_name_and_version() {
        let id = Identity::new("gateway", "1.2.0");
        assert_eq!(id.name(), "gateway");
        assert_eq!(id.version(), "1.2.0");
        assert_eq!(id.id(), "gateway/1.2.0");
        assert_eq!(id.to_string(), "gateway/1.2.0");
    }

    #[test]
    fn default_identity_is_empty() {
        let id = Identity::default();
        assert_eq!(id.id(), "");
    }
}
