use crate::annotations::AnnotationError;
use binding::Value;

/// Known tag names. A tag's colour index is its position here, so entries are
/// only ever appended.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagRegistry {
    names: Vec<String>,
}

impl TagRegistry {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut registry = Self::default();
        for name in names {
            let name: String = name.into();
            // Blank names in stored data are skipped.
            let _ = registry.register(&name);
        }
        registry
    }

    pub fn from_value(value: &Value) -> Self {
        Self::new(crate::keys::string_array(value))
    }

    pub fn to_value(&self) -> Value {
        Value::from(self.names.clone())
    }

    /// Returns the tag's index and whether it was newly added.
    pub fn register(&mut self, name: &str) -> Result<(usize, bool), AnnotationError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AnnotationError::EmptyTag);
        }
        if let Some(index) = self.index_of(name) {
            return Ok((index, false));
        }
        self.names.push(name.to_string());
        Ok((self.names.len() - 1, true))
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index_of(name).is_some()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_is_append_only_and_deduplicated() {
        let mut tags = TagRegistry::new(["blink", "", "artifact", "blink"]);
        assert_eq!(tags.names(), &["blink".to_string(), "artifact".to_string()]);
        assert_eq!(tags.register("artifact").unwrap(), (1, false));
        assert_eq!(tags.register(" spike ").unwrap(), (2, true));
        assert_eq!(tags.register("  "), Err(AnnotationError::EmptyTag));
        assert_eq!(tags.to_value(), serde_json::json!(["blink", "artifact", "spike"]));
    }
}
