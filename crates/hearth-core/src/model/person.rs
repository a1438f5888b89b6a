use serde::{Deserialize, Serialize};

/// A household member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    pub id: String,
    pub label: String,
}

/// Display label for `id`, falling back to the raw id when nobody matches.
#[must_use]
pub fn person_label(people: &[Person], id: &str) -> String {
    people
        .iter()
        .find(|p| p.id == id)
        .map_or_else(|| id.to_string(), |p| p.label.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dangling_reference_shows_raw_id() {
        let people = vec![Person {
            id: "ana".into(),
            label: "Ana".into(),
        }];
        assert_eq!(person_label(&people, "ana"), "Ana");
        assert_eq!(person_label(&people, "ghost"), "ghost");
    }
}
