/// Capture-ordered image keys of one sequence. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sequence {
    id: String,
    image_ids: Vec<String>,
}

impl Sequence {
    pub fn new(id: impl Into<String>, image_ids: Vec<String>) -> Self {
        Self {
            id: id.into(),
            image_ids,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn image_ids(&self) -> &[String] {
        &self.image_ids
    }

    pub fn len(&self) -> usize {
        self.image_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.image_ids.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.position(key).is_some()
    }

    pub fn find_next(&self, key: &str) -> Option<&str> {
        let i = self.position(key)?;
        self.image_ids.get(i + 1).map(String::as_str)
    }

    pub fn find_prev(&self, key: &str) -> Option<&str> {
        let i = self.position(key)?;
        i.checked_sub(1)
            .and_then(|p| self.image_ids.get(p))
            .map(String::as_str)
    }

    fn position(&self, key: &str) -> Option<usize> {
        self.image_ids.iter().position(|id| id == key)
    }
}

#[cfg(test)]
mod tests {
    use super::Sequence;

    fn sequence() -> Sequence {
        Sequence::new(
            "skey",
            ["B", "C", "D", "E"].iter().map(|s| s.to_string()).collect(),
        )
    }

    #[test]
    fn finds_neighbors_in_capture_order() {
        let s = sequence();
        assert_eq!(s.find_next("C"), Some("D"));
        assert_eq!(s.find_prev("C"), Some("B"));
    }

    #[test]
    fn ends_have_no_neighbor() {
        let s = sequence();
        assert_eq!(s.find_next("E"), None);
        assert_eq!(s.find_prev("B"), None);
        assert_eq!(s.find_next("missing"), None);
        assert_eq!(s.find_prev("missing"), None);
    }

    #[test]
    fn exposes_membership() {
        let s = sequence();
        assert_eq!(s.id(), "skey");
        assert_eq!(s.len(), 4);
        assert!(s.contains("D"));
        assert!(!s.contains("A"));
        assert!(Sequence::new("empty", Vec::new()).is_empty());
    }
}
