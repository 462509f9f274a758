#![allow(dead_code)]

use std::collections::HashMap;
use stylecore::SelectorModel;

/// Minimal element tree for exercising the engine from outside the crate.
#[derive(Default)]
pub struct Document {
    nodes: Vec<Node>,
}

#[derive(Default)]
struct Node {
    tag: String,
    parent: Option<usize>,
    children: Vec<usize>,
    attributes: HashMap<String, String>,
    pseudo_classes: Vec<String>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn element(
        &mut self,
        parent: Option<usize>,
        tag: &str,
        attributes: &[(&str, &str)],
    ) -> usize {
        let node = self.nodes.len();
        self.nodes.push(Node {
            tag: tag.to_string(),
            parent,
            attributes: attributes
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            ..Node::default()
        });
        if let Some(parent) = parent {
            self.nodes[parent].children.push(node);
        }
        node
    }

    pub fn set_attribute(&mut self, node: usize, name: &str, value: &str) {
        self.nodes[node].attributes.insert(name.to_string(), value.to_string());
    }

    pub fn add_pseudo_class(&mut self, node: usize, pseudo_class: &str) {
        self.nodes[node].pseudo_classes.push(pseudo_class.to_string());
    }
}

impl SelectorModel for Document {
    type Element = usize;

    fn has_id(&self, element: &usize, id: &str) -> bool {
        self.nodes[*element].attributes.get("id").map_or(false, |v| v == id)
    }

    fn has_type(&self, element: &usize, type_name: &str) -> bool {
        self.nodes[*element].tag == type_name
    }

    fn has_style_class(&self, element: &usize, class_name: &str) -> bool {
        self.nodes[*element]
            .attributes
            .get("class")
            .map_or(false, |v| v.split_whitespace().any(|c| c == class_name))
    }

    fn has_pseudo_class(&self, element: &usize, pseudo_class: &str) -> bool {
        self.nodes[*element].pseudo_classes.iter().any(|p| p == pseudo_class)
    }

    fn attribute_value(&self, element: &usize, name: &str) -> Option<String> {
        self.nodes[*element].attributes.get(name).cloned()
    }

    fn parent(&self, element: &usize) -> Option<usize> {
        self.nodes[*element].parent
    }

    fn previous_sibling(&self, element: &usize) -> Option<usize> {
        let parent = self.nodes[*element].parent?;
        let siblings = &self.nodes[parent].children;
        let index = siblings.iter().position(|c| c == element)?;
        index.checked_sub(1).map(|i| siblings[i])
    }
}
