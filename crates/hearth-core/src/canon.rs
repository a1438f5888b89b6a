//! Task-variant equivalence.
//!
//! Some tasks have an express variant (a shorter version shown in express
//! mode). For completion tracking the two are the same task: a log against
//! either satisfies both. Every comparison or grouping by task id goes
//! through [`Canonicalizer::canonicalize`].

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Maps variant task ids to their canonical id. Ids without an entry are
/// their own canonical id. The mapping is applied once, not transitively.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Canonicalizer {
    variants: BTreeMap<String, String>,
}

impl Canonicalizer {
    #[must_use]
    pub const fn new(variants: BTreeMap<String, String>) -> Self {
        Self { variants }
    }

    /// The kitchen express variants shipped with the default catalog.
    #[must_use]
    pub fn household_default() -> Self {
        let variants = [
            ("cocina_zona_agua_express", "cocina_zona_agua"),
            ("cocina_superficies_express", "cocina_superficies"),
            ("cocina_guardar_express", "cocina_guardar"),
        ]
        .into_iter()
        .map(|(variant, canonical)| (variant.to_string(), canonical.to_string()))
        .collect();
        Self { variants }
    }

    #[must_use]
    pub fn canonicalize<'a>(&'a self, task_id: &'a str) -> &'a str {
        self.variants.get(task_id).map_or(task_id, String::as_str)
    }

    /// Whether two task ids refer to the same logical task.
    #[must_use]
    pub fn same_task(&self, a: &str, b: &str) -> bool {
        self.canonicalize(a) == self.canonicalize(b)
    }

    #[must_use]
    pub fn is_variant(&self, task_id: &str) -> bool {
        self.variants.contains_key(task_id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.variants.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.variants.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variants_map_to_canonical() {
        let canon = Canonicalizer::household_default();
        assert_eq!(canon.canonicalize("cocina_guardar_express"), "cocina_guardar");
        assert_eq!(canon.canonicalize("cocina_guardar"), "cocina_guardar");
        assert_eq!(canon.canonicalize("trash"), "trash");
        assert!(canon.same_task("cocina_superficies_express", "cocina_superficies"));
        assert!(!canon.same_task("cocina_superficies_express", "cocina_guardar"));
    }

    #[test]
    fn mapping_is_not_transitive() {
        let canon = Canonicalizer::new(
            [("a".to_string(), "b".to_string()), ("b".to_string(), "c".to_string())]
                .into_iter()
                .collect(),
        );
        assert_eq!(canon.canonicalize("a"), "b");
        assert_eq!(canon.canonicalize("b"), "c");
    }

    #[test]
    fn deserializes_from_plain_object() {
        let canon: Canonicalizer =
            serde_json::from_str(r#"{"dishes_express":"dishes"}"#).expect("json");
        assert_eq!(canon.len(), 1);
        assert!(canon.is_variant("dishes_express"));
        assert_eq!(canon.canonicalize("dishes_express"), "dishes");
    }
}
