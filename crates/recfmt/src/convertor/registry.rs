//! Layout type name to converter constructor mapping.

use std::collections::HashMap;

use super::{DataType, PackedDecimal, SignedPackedDecimal, SingleByteCharacterString};

/// A boxed constructor producing a fresh, unbound converter.
pub type DataTypeConstructor = Box<dyn Fn() -> Box<dyn DataType> + Send + Sync>;

/// Registry that maps layout type names (`X`, `SP`, ...) to converters.
///
/// Lookup is case-sensitive. Every call to [`create`](Self::create) returns
/// a new instance, so converters are never shared between fields.
pub struct ConvertorRegistry {
    constructors: HashMap<String, DataTypeConstructor>,
}

impl std::fmt::Debug for ConvertorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConvertorRegistry")
            .field("names", &self.names())
            .finish()
    }
}

impl Default for ConvertorRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl ConvertorRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            constructors: HashMap::new(),
        }
    }

    /// Create a registry pre-loaded with `X`, `SP` and `P`.
    pub fn with_builtins() -> Self {
        let mut reg = Self::new();
        reg.register("X", || Box::new(SingleByteCharacterString::new()));
        reg.register("SP", || Box::new(SignedPackedDecimal::new()));
        reg.register("P", || Box::new(PackedDecimal::new()));
        reg
    }

    /// Register a constructor, replacing any previous one for `name`.
    pub fn register<F>(&mut self, name: &str, constructor: F)
    where
        F: Fn() -> Box<dyn DataType> + Send + Sync + 'static,
    {
        self.constructors.insert(name.to_string(), Box::new(constructor));
    }

    /// Create an unbound converter for `name`.
    pub fn create(&self, name: &str) -> Option<Box<dyn DataType>> {
        self.constructors.get(name).map(|constructor| constructor())
    }

    /// Whether `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.constructors.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.constructors.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtins() {
        let reg = ConvertorRegistry::with_builtins();
        assert_eq!(reg.names(), vec!["P", "SP", "X"]);
        assert_eq!(reg.create("X").unwrap().name(), "SingleByteCharacterString");
        assert_eq!(reg.create("SP").unwrap().name(), "SignedPackedDecimal");
        assert_eq!(reg.create("P").unwrap().name(), "PackedDecimal");
    }

    #[test]
    fn test_lookup_is_case_sensitive() {
        let reg = ConvertorRegistry::with_builtins();
        assert!(reg.create("x").is_none());
        assert!(!reg.contains("sp"));
    }

    #[test]
    fn test_register_custom() {
        let mut reg = ConvertorRegistry::new();
        reg.register("N", || Box::new(SignedPackedDecimal::new()));
        assert!(reg.contains("N"));
        assert!(reg.create("X").is_none());
        assert!(format!("{reg:?}").contains("\"N\""));
    }
}
