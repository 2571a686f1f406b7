use serde::{Serialize, Deserialize, Serializer};
use std::fmt;

/// Wraps passenger identifiers so they never show up in `Debug`/`Display` output.
///
/// Serialization is transparent: API responses and stored documents need the real value,
/// the wrapper only guards against leaks through `tracing::info!("{:?}", ..)`.
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct Masked<T>(pub T);

impl<T> fmt::Debug for Masked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "********")
    }
}

impl<T> fmt::Display for Masked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "********")
    }
}

impl<T: Serialize> Serialize for Masked<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.0.serialize(serializer)
    }
}

impl<T> Masked<T> {
    pub fn new(value: T) -> Self {
        Self(value)
    }

    pub fn expose(&self) -> &T {
        &self.0
    }

    pub fn into_inner(self) -> T {
        self.0
    }
}

impl From<String> for Masked<String> {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for Masked<String> {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_is_masked() {
        let id = Masked::new("30111222".to_string());
        assert_eq!(format!("{:?}", id), "********");
        assert_eq!(format!("{}", id), "********");
    }

    #[test]
    fn test_serialization_is_transparent() {
        let phone: Masked<String> = "+54 11 5555 0000".into();
        let json = serde_json::to_string(&phone).unwrap();
        assert_eq!(json, "\"+54 11 5555 0000\"");

        let back: Masked<String> = serde_json::from_str(&json).unwrap();
        assert_eq!(back.expose(), "+54 11 5555 0000");
    }
}
