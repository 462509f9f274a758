//! Selector matching over an abstract element tree
//!
//! The engine only ever sees elements through [`SelectorModel`]; matching is
//! pure and never fails, it only answers yes or no.

use crate::ast::{AttributeMatch, CombinatorKind, Selector, SelectorGroup};
use std::collections::{HashMap, HashSet};
use std::hash::Hash;

/// Read-only view of an element tree used by selector matching, the
/// cascade (inline styles) and `attr()`.
///
/// `Element` is a cheap handle (an index, an `Rc`, ...). Only
/// [`attribute_value`](SelectorModel::attribute_value) is needed for
/// attribute selectors; the comparison predicates have default
/// implementations that models may override.
pub trait SelectorModel {
    type Element: Clone + Eq + Hash;

    fn has_id(&self, element: &Self::Element, id: &str) -> bool;
    fn has_type(&self, element: &Self::Element, type_name: &str) -> bool;
    fn has_style_class(&self, element: &Self::Element, class_name: &str) -> bool;
    fn has_pseudo_class(&self, element: &Self::Element, pseudo_class: &str) -> bool;
    fn attribute_value(&self, element: &Self::Element, name: &str) -> Option<String>;
    fn parent(&self, element: &Self::Element) -> Option<Self::Element>;
    fn previous_sibling(&self, element: &Self::Element) -> Option<Self::Element>;

    /// Text of the element's inline `style` attribute, if any.
    fn inline_style(&self, element: &Self::Element) -> Option<String> {
        self.attribute_value(element, "style")
    }

    fn has_attribute(&self, element: &Self::Element, name: &str) -> bool {
        self.attribute_value(element, name).is_some()
    }

    fn attribute_value_equals(&self, element: &Self::Element, name: &str, value: &str) -> bool {
        self.attribute_value(element, name)
            .map_or(false, |actual| actual == value)
    }

    /// `~=`: the value is a whitespace-separated list containing `word`.
    fn attribute_value_contains_word(
        &self,
        element: &Self::Element,
        name: &str,
        word: &str,
    ) -> bool {
        if word.is_empty() || word.contains(char::is_whitespace) {
            return false;
        }
        self.attribute_value(element, name)
            .map_or(false, |actual| actual.split_whitespace().any(|w| w == word))
    }

    /// `|=`: the value equals `prefix` or starts with `prefix` followed by `-`.
    fn attribute_value_dash_match(
        &self,
        element: &Self::Element,
        name: &str,
        prefix: &str,
    ) -> bool {
        self.attribute_value(element, name).map_or(false, |actual| {
            actual == prefix
                || (actual.starts_with(prefix) && actual[prefix.len()..].starts_with('-'))
        })
    }

    fn attribute_value_starts_with(
        &self,
        element: &Self::Element,
        name: &str,
        prefix: &str,
    ) -> bool {
        !prefix.is_empty()
            && self
                .attribute_value(element, name)
                .map_or(false, |actual| actual.starts_with(prefix))
    }

    fn attribute_value_ends_with(&self, element: &Self::Element, name: &str, suffix: &str) -> bool {
        !suffix.is_empty()
            && self
                .attribute_value(element, name)
                .map_or(false, |actual| actual.ends_with(suffix))
    }

    fn attribute_value_contains(
        &self,
        element: &Self::Element,
        name: &str,
        substring: &str,
    ) -> bool {
        !substring.is_empty()
            && self
                .attribute_value(element, name)
                .map_or(false, |actual| actual.contains(substring))
    }
}

/// Extra pseudo-classes active for one matching pass, e.g. `:hover`
/// computed by the caller from pointer state.
#[derive(Debug, Clone)]
pub struct PseudoClassState<E: Eq + Hash> {
    active: HashMap<E, HashSet<String>>,
}

impl<E: Eq + Hash> PseudoClassState<E> {
    pub fn new() -> Self {
        Self {
            active: HashMap::new(),
        }
    }

    pub fn insert(&mut self, element: E, pseudo_class: impl Into<String>) {
        self.active.entry(element).or_default().insert(pseudo_class.into());
    }

    pub fn remove(&mut self, element: &E, pseudo_class: &str) {
        if let Some(set) = self.active.get_mut(element) {
            set.remove(pseudo_class);
            if set.is_empty() {
                self.active.remove(element);
            }
        }
    }

    pub fn is_active(&self, element: &E, pseudo_class: &str) -> bool {
        self.active
            .get(element)
            .map_or(false, |set| set.contains(pseudo_class))
    }

    pub fn clear(&mut self) {
        self.active.clear();
    }
}

impl<E: Eq + Hash> Default for PseudoClassState<E> {
    fn default() -> Self {
        Self::new()
    }
}

pub struct SelectorMatcher<'a, M: SelectorModel> {
    model: &'a M,
    pseudo_classes: Option<&'a PseudoClassState<M::Element>>,
}

impl<'a, M: SelectorModel> SelectorMatcher<'a, M> {
    pub fn new(model: &'a M) -> Self {
        Self {
            model,
            pseudo_classes: None,
        }
    }

    pub fn with_pseudo_classes(mut self, state: Option<&'a PseudoClassState<M::Element>>) -> Self {
        self.pseudo_classes = state;
        self
    }

    pub fn model(&self) -> &'a M {
        self.model
    }

    pub fn matches_group(&self, group: &SelectorGroup, element: &M::Element) -> bool {
        group.selectors.iter().any(|s| self.matches(s, element))
    }

    pub fn matches(&self, selector: &Selector, element: &M::Element) -> bool {
        match selector {
            Selector::Universal => true,
            Selector::Type { name } => self.model.has_type(element, name),
            Selector::Id { name } => self.model.has_id(element, name),
            Selector::Class { name } => self.model.has_style_class(element, name),
            Selector::PseudoClass { name } => {
                self.pseudo_classes
                    .map_or(false, |state| state.is_active(element, name))
                    || self.model.has_pseudo_class(element, name)
            }
            Selector::Attribute {
                name,
                matching,
                value,
            } => self.matches_attribute(element, name, *matching, value.as_deref()),
            Selector::Combinator {
                combinator,
                left,
                right,
            } => self.matches_combinator(*combinator, left, right, element),
        }
    }

    fn matches_attribute(
        &self,
        element: &M::Element,
        name: &str,
        matching: AttributeMatch,
        value: Option<&str>,
    ) -> bool {
        let model = self.model;
        match (matching, value) {
            (AttributeMatch::Exists, _) | (_, None) => model.has_attribute(element, name),
            (AttributeMatch::Equals, Some(v)) => model.attribute_value_equals(element, name, v),
            (AttributeMatch::Includes, Some(v)) => {
                model.attribute_value_contains_word(element, name, v)
            }
            (AttributeMatch::DashMatch, Some(v)) => {
                model.attribute_value_dash_match(element, name, v)
            }
            (AttributeMatch::PrefixMatch, Some(v)) => {
                model.attribute_value_starts_with(element, name, v)
            }
            (AttributeMatch::SuffixMatch, Some(v)) => {
                model.attribute_value_ends_with(element, name, v)
            }
            (AttributeMatch::SubstringMatch, Some(v)) => {
                model.attribute_value_contains(element, name, v)
            }
        }
    }

    fn matches_combinator(
        &self,
        combinator: CombinatorKind,
        left: &Selector,
        right: &Selector,
        element: &M::Element,
    ) -> bool {
        if !self.matches(right, element) {
            return false;
        }

        match combinator {
            CombinatorKind::And => self.matches(left, element),
            CombinatorKind::Child => self
                .model
                .parent(element)
                .map_or(false, |parent| self.matches(left, &parent)),
            CombinatorKind::AdjacentSibling => self
                .model
                .previous_sibling(element)
                .map_or(false, |sibling| self.matches(left, &sibling)),
            CombinatorKind::Descendant => {
                let mut ancestor = self.model.parent(element);
                while let Some(current) = ancestor {
                    if self.matches(left, &current) {
                        return true;
                    }
                    ancestor = self.model.parent(&current);
                }
                false
            }
            CombinatorKind::GeneralSibling => {
                let mut sibling = self.model.previous_sibling(element);
                while let Some(current) = sibling {
                    if self.matches(left, &current) {
                        return true;
                    }
                    sibling = self.model.previous_sibling(&current);
                }
                false
            }
        }
    }
}

impl SelectorGroup {
    pub fn matches<M: SelectorModel>(&self, model: &M, element: &M::Element) -> bool {
        SelectorMatcher::new(model).matches_group(self, element)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::parser::parse_selector;
    use std::cell::Cell;

    /// Small arena-backed tree shared by unit tests across the crate.
    #[derive(Default)]
    pub(crate) struct TestTree {
        pub nodes: Vec<TestNode>,
        pub lookups: Cell<usize>,
    }

    #[derive(Default, Clone)]
    pub(crate) struct TestNode {
        pub type_name: String,
        pub id: Option<String>,
        pub classes: Vec<String>,
        pub pseudo_classes: Vec<String>,
        pub attributes: Vec<(String, String)>,
        pub parent: Option<usize>,
        pub children: Vec<usize>,
    }

    impl TestTree {
        pub fn add(&mut self, parent: Option<usize>, type_name: &str) -> usize {
            let index = self.nodes.len();
            self.nodes.push(TestNode {
                type_name: type_name.to_string(),
                parent,
                ..TestNode::default()
            });
            if let Some(parent) = parent {
                self.nodes[parent].children.push(index);
            }
            index
        }

        pub fn set_attribute(&mut self, node: usize, name: &str, value: &str) {
            self.nodes[node].attributes.push((name.to_string(), value.to_string()));
        }
    }

    impl SelectorModel for TestTree {
        type Element = usize;

        fn has_id(&self, element: &usize, id: &str) -> bool {
            self.nodes[*element].id.as_deref() == Some(id)
        }

        fn has_type(&self, element: &usize, type_name: &str) -> bool {
            self.nodes[*element].type_name == type_name
        }

        fn has_style_class(&self, element: &usize, class_name: &str) -> bool {
            self.nodes[*element].classes.iter().any(|c| c == class_name)
        }

        fn has_pseudo_class(&self, element: &usize, pseudo_class: &str) -> bool {
            self.nodes[*element].pseudo_classes.iter().any(|p| p == pseudo_class)
        }

        fn attribute_value(&self, element: &usize, name: &str) -> Option<String> {
            self.lookups.set(self.lookups.get() + 1);
            self.nodes[*element]
                .attributes
                .iter()
                .find(|(n, _)| n == name)
                .map(|(_, v)| v.clone())
        }

        fn parent(&self, element: &usize) -> Option<usize> {
            self.nodes[*element].parent
        }

        fn previous_sibling(&self, element: &usize) -> Option<usize> {
            let parent = self.nodes[*element].parent?;
            let siblings = &self.nodes[parent].children;
            let position = siblings.iter().position(|c| c == element)?;
            position.checked_sub(1).map(|p| siblings[p])
        }
    }

    fn matches(tree: &TestTree, selector: &str, element: usize) -> bool {
        parse_selector(selector).unwrap().matches(tree, &element)
    }

    /// svg > g#layer > (rect.big, circle, text)
    fn sample_tree() -> TestTree {
        let mut tree = TestTree::default();
        let svg = tree.add(None, "svg");
        let g = tree.add(Some(svg), "g");
        tree.nodes[g].id = Some("layer".to_string());
        let rect = tree.add(Some(g), "rect");
        tree.nodes[rect].classes = vec!["big".to_string(), "shape".to_string()];
        tree.add(Some(g), "circle");
        tree.add(Some(g), "text");
        tree
    }

    #[test]
    fn test_simple_selectors() {
        let tree = sample_tree();
        assert!(matches(&tree, "*", 0));
        assert!(matches(&tree, "rect", 2));
        assert!(!matches(&tree, "rect", 3));
        assert!(matches(&tree, "#layer", 1));
        assert!(matches(&tree, ".big", 2));
        assert!(matches(&tree, "rect.big.shape", 2));
        assert!(!matches(&tree, "rect.small", 2));
        assert!(matches(&tree, "circle, rect", 2));
    }

    #[test]
    fn test_attribute_selectors() {
        let mut tree = sample_tree();
        tree.set_attribute(2, "data-x", "abcdef");
        tree.set_attribute(3, "data-x", "xabc");
        tree.set_attribute(4, "lang", "en-US");
        tree.set_attribute(4, "tags", "a  bold b");

        assert!(matches(&tree, "[data-x^=\"abc\"]", 2));
        assert!(!matches(&tree, "[data-x^=\"abc\"]", 3));
        assert!(matches(&tree, "[data-x$=abc]", 3));
        assert!(matches(&tree, "[data-x*=bcd]", 2));
        assert!(matches(&tree, "[data-x]", 3));
        assert!(!matches(&tree, "[data-x]", 4));
        assert!(matches(&tree, "[data-x=xabc]", 3));
        assert!(matches(&tree, "[lang|=en]", 4));
        assert!(!matches(&tree, "[lang|=e]", 4));
        assert!(matches(&tree, "[tags~=bold]", 4));
        assert!(!matches(&tree, "[tags~=bol]", 4));
        assert!(!matches(&tree, "[data-x^=\"\"]", 2));
    }

    #[test]
    fn test_structural_combinators() {
        let tree = sample_tree();
        assert!(matches(&tree, "svg rect", 2));
        assert!(matches(&tree, "svg > g > rect", 2));
        assert!(!matches(&tree, "svg > rect", 2));
        assert!(matches(&tree, "rect + circle", 3));
        assert!(!matches(&tree, "rect + text", 4));
        assert!(matches(&tree, "rect ~ text", 4));
        assert!(!matches(&tree, "text ~ rect", 2));
        assert!(matches(&tree, "svg g > .big ~ text", 4));
        assert!(!matches(&tree, "rect rect", 2));
    }

    #[test]
    fn test_pseudo_class_overrides() {
        let mut tree = sample_tree();
        tree.nodes[3].pseudo_classes.push("focus".to_string());
        let selector = parse_selector("g > :hover").unwrap();

        assert!(!selector.matches(&tree, &2));
        assert!(matches(&tree, "circle:focus", 3));

        let mut state = PseudoClassState::new();
        state.insert(2usize, "hover");
        let matcher = SelectorMatcher::new(&tree).with_pseudo_classes(Some(&state));
        assert!(matcher.matches_group(&selector, &2));
        assert!(!matcher.matches_group(&selector, &3));

        state.remove(&2, "hover");
        let matcher = SelectorMatcher::new(&tree).with_pseudo_classes(Some(&state));
        assert!(!matcher.matches_group(&selector, &2));
    }

    #[test]
    fn test_matching_is_repeatable() {
        let mut tree = sample_tree();
        tree.set_attribute(2, "data-x", "abc");
        let selector = parse_selector("g > rect[data-x=abc]").unwrap();

        let first = selector.matches(&tree, &2);
        for _ in 0..5 {
            assert_eq!(selector.matches(&tree, &2), first);
        }
        assert!(first);
        assert_eq!(tree.nodes[2].attributes.len(), 1);
    }
}
