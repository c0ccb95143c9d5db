use std::collections::{HashMap, HashSet};

/// Id of the element holding the annotated code on the page.
pub const CODE_BLOCK_ID: &str = "annotated-code";

/// Ids used by the page itself, never handed out to labels.
const RESERVED_ANCHORS: &[&str] = &[CODE_BLOCK_ID];

/// A named location in the source and the in-page anchor pointing at it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label {
    /// Name as first written in the source
    pub name: String,
    /// Unique, URL fragment safe id
    pub anchor: String,
}

/// The label registry collects every label definition of a document in order of first
/// appearance.
#[derive(Debug)]
pub struct LabelRegistry {
    labels: Vec<Label>,
    index: HashMap<String, usize>,
    anchors: HashSet<String>,
    placed: HashSet<usize>,
    case_sensitive: bool,
}

/// Replace everything but ASCII alphanumerics, `_`, `-` and `.` with `_`.
fn sanitize_anchor(name: &str) -> String {
    let anchor: String = name
        .chars()
        .map(|ch| match ch {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '_' | '-' | '.' => ch,
            _ => '_',
        })
        .collect();

    if anchor.is_empty() {
        "label".to_owned()
    } else {
        anchor
    }
}

impl Default for LabelRegistry {
    fn default() -> Self {
        Self::new(false)
    }
}

impl LabelRegistry {
    pub fn new(case_sensitive: bool) -> Self {
        Self {
            labels: Vec::new(),
            index: HashMap::new(),
            anchors: RESERVED_ANCHORS.iter().map(|&id| id.to_owned()).collect(),
            placed: HashSet::new(),
            case_sensitive,
        }
    }

    fn key(&self, name: &str) -> String {
        if self.case_sensitive {
            name.to_owned()
        } else {
            name.to_uppercase()
        }
    }

    /// Register a label. Registering a known name again returns the existing label.
    #[tracing::instrument(skip(self))]
    pub fn register(&mut self, name: &str) -> &Label {
        let key = self.key(name);
        if let Some(&ix) = self.index.get(&key) {
            return &self.labels[ix];
        }

        let base = sanitize_anchor(name);
        let mut anchor = base.clone();
        let mut suffix = 2;
        while self.anchors.contains(&anchor) {
            anchor = format!("{}-{}", base, suffix);
            suffix += 1;
        }
        tracing::debug!("New label '{}' with anchor '{}'", name, anchor);

        self.anchors.insert(anchor.clone());
        self.index.insert(key, self.labels.len());
        self.labels.push(Label {
            name: name.to_owned(),
            anchor,
        });
        &self.labels[self.labels.len() - 1]
    }

    pub fn find(&self, name: &str) -> Option<&Label> {
        self.index
            .get(&self.key(name))
            .map(|&ix| &self.labels[ix])
    }

    /// Mark the anchor of `name` as emitted into the document.
    ///
    /// Returns `true` only the first time, so each anchor id is placed exactly once.
    pub fn place(&mut self, name: &str) -> bool {
        match self.index.get(&self.key(name)) {
            Some(&ix) => self.placed.insert(ix),
            None => false,
        }
    }

    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    pub fn into_labels(self) -> Vec<Label> {
        self.labels
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;

    #[test]
    fn test_register_is_idempotent() {
        let mut registry = LabelRegistry::new(false);
        registry.register("firstloop");
        registry.register("secondloop");
        registry.register("FirstLoop");

        assert_eq!(
            registry.labels(),
            &[
                Label {
                    name: "firstloop".to_owned(),
                    anchor: "firstloop".to_owned(),
                },
                Label {
                    name: "secondloop".to_owned(),
                    anchor: "secondloop".to_owned(),
                },
            ]
        );
    }

    #[test]
    fn test_case_sensitive_labels() {
        let mut registry = LabelRegistry::new(true);
        registry.register("loop");
        registry.register("LOOP");

        assert_eq!(registry.len(), 2);
        assert!(registry.find("Loop").is_none());
        assert_eq!(registry.find("LOOP").unwrap().anchor, "LOOP");
    }

    #[test]
    fn test_anchor_sanitizing() {
        let mut registry = LabelRegistry::new(false);
        assert_eq!(registry.register("@@local").anchor, "__local");
        assert_eq!(registry.register("name with<tag>").anchor, "name_with_tag_");
        assert_eq!(registry.register("sub.exit-1").anchor, "sub.exit-1");
    }

    #[test]
    fn test_anchor_collisions() {
        let mut registry = LabelRegistry::new(false);
        assert_eq!(registry.register("a$b").anchor, "a_b");
        assert_eq!(registry.register("a%b").anchor, "a_b-2");
        assert_eq!(registry.register("a&b").anchor, "a_b-3");
        assert_eq!(registry.register("a$b").anchor, "a_b");
    }

    #[test]
    fn test_reserved_anchors() {
        let mut registry = LabelRegistry::default();
        assert_eq!(registry.register(CODE_BLOCK_ID).anchor, "annotated-code-2");
        assert_eq!(registry.register("annotated_code").anchor, "annotated_code");
        assert_eq!(registry.find("ANNOTATED-CODE").unwrap().name, "annotated-code");
    }

    #[test]
    fn test_place_once() {
        let mut registry = LabelRegistry::new(false);
        registry.register("start");

        assert!(registry.place("start"));
        assert!(!registry.place("START"));
        assert!(!registry.place("unknown"));
    }
}
