//! Multi-origin cascade
//!
//! Declarations are collected per origin in registration and document order,
//! the last one for a property winning inside its origin. Origins are then
//! merged in precedence order: user agent, user, author, inline. Selector
//! specificity plays no part.

use crate::ast::{Declaration, DeclarationId, Stylesheet};
use crate::config::EngineConfig;
use crate::converter::{ConverterRegistry, StyleValue};
use crate::error::{Result, StyleError};
use crate::functions::{custom_property_tokens, CustomPropertyMap, FunctionProcessor};
use crate::parser::{parse_declarations, parse_stylesheet};
use crate::selector::{SelectorMatcher, SelectorModel};
use crate::store::PropertyStore;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Default number of distinct inline style texts kept parsed.
pub const DEFAULT_INLINE_CACHE_LIMIT: usize = 1024;

/// Where a declaration comes from, in ascending precedence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StyleOrigin {
    UserAgent,
    User,
    Author,
    Inline,
}

impl StyleOrigin {
    pub const COUNT: usize = 4;
    pub const ALL: [StyleOrigin; StyleOrigin::COUNT] = [
        StyleOrigin::UserAgent,
        StyleOrigin::User,
        StyleOrigin::Author,
        StyleOrigin::Inline,
    ];

    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for StyleOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StyleOrigin::UserAgent => "user-agent",
            StyleOrigin::User => "user",
            StyleOrigin::Author => "author",
            StyleOrigin::Inline => "inline",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StylesheetSource {
    Path(PathBuf),
    /// Text handed over directly, with a name for messages.
    Literal(String),
}

impl fmt::Display for StylesheetSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StylesheetSource::Path(path) => write!(f, "{}", path.display()),
            StylesheetSource::Literal(name) => write!(f, "{}", name),
        }
    }
}

#[derive(Debug)]
pub struct StylesheetEntry {
    pub origin: StyleOrigin,
    pub source: StylesheetSource,
    pub stylesheet: Arc<Stylesheet>,
    pub registration_order: usize,
    pub errors: Vec<StyleError>,
}

/// A declaration that won the cascade, with the origin it won in.
#[derive(Debug, Clone)]
pub struct CascadedDeclaration {
    pub origin: StyleOrigin,
    pub declaration: Declaration,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedValue {
    pub origin: StyleOrigin,
    pub value: StyleValue,
}

/// Typed values for one element plus whatever kept properties from applying.
#[derive(Debug, Default)]
pub struct ResolvedStyle {
    pub values: BTreeMap<String, ResolvedValue>,
    pub errors: Vec<StyleError>,
}

impl ResolvedStyle {
    pub fn get(&self, property: &str) -> Option<&StyleValue> {
        self.values.get(property).map(|v| &v.value)
    }

    pub fn origin(&self, property: &str) -> Option<StyleOrigin> {
        self.values.get(property).map(|v| v.origin)
    }
}

pub struct StyleManager<M: SelectorModel> {
    entries: Vec<StylesheetEntry>,
    next_order: usize,
    converters: ConverterRegistry,
    functions: FunctionProcessor<M>,
    custom_properties: CustomPropertyMap,
    cache_conversions: bool,
    conversion_cache: RefCell<HashMap<DeclarationId, StyleValue>>,
    inline_cache: RefCell<HashMap<String, Arc<Vec<Declaration>>>>,
    inline_cache_limit: usize,
}

impl<M: SelectorModel> StyleManager<M> {
    pub fn new(converters: ConverterRegistry) -> Self {
        Self {
            entries: Vec::new(),
            next_order: 0,
            converters,
            functions: FunctionProcessor::new(),
            custom_properties: CustomPropertyMap::new(),
            cache_conversions: true,
            conversion_cache: RefCell::new(HashMap::new()),
            inline_cache: RefCell::new(HashMap::new()),
            inline_cache_limit: DEFAULT_INLINE_CACHE_LIMIT,
        }
    }

    /// Builds a manager and loads the stylesheets the configuration lists.
    pub fn from_config(config: &EngineConfig, converters: ConverterRegistry) -> Result<Self> {
        let mut manager = Self::new(converters);
        manager.functions = FunctionProcessor::new()
            .with_max_depth(config.max_function_depth)
            .with_max_expansion(config.max_expansion_tokens);
        manager.cache_conversions = config.cache_conversions;
        manager.inline_cache_limit = config.inline_cache_limit;
        manager.custom_properties = config
            .custom_properties
            .iter()
            .map(|(name, value)| (name.clone(), custom_property_tokens(value)))
            .collect();

        let origins = [
            (StyleOrigin::UserAgent, &config.user_agent_stylesheets),
            (StyleOrigin::User, &config.user_stylesheets),
            (StyleOrigin::Author, &config.author_stylesheets),
        ];
        for (origin, paths) in origins {
            for path in paths {
                manager.add_stylesheet_file(origin, path)?;
            }
        }
        Ok(manager)
    }

    pub fn converters(&self) -> &ConverterRegistry {
        &self.converters
    }

    pub fn converters_mut(&mut self) -> &mut ConverterRegistry {
        &mut self.converters
    }

    pub fn functions(&self) -> &FunctionProcessor<M> {
        &self.functions
    }

    pub fn functions_mut(&mut self) -> &mut FunctionProcessor<M> {
        &mut self.functions
    }

    /// Parses `text` and registers it after every sheet already in `origin`.
    pub fn add_stylesheet(
        &mut self,
        origin: StyleOrigin,
        source: StylesheetSource,
        text: &str,
    ) -> &StylesheetEntry {
        let (stylesheet, errors) = parse_stylesheet(text);
        for error in &errors {
            log::debug!("{}: {}", source, error);
        }
        self.push_entry(origin, source, Arc::new(stylesheet), errors)
    }

    pub fn add_stylesheet_file(
        &mut self,
        origin: StyleOrigin,
        path: impl AsRef<Path>,
    ) -> Result<&StylesheetEntry> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        log::info!("Loaded {} stylesheet {}", origin, path.display());
        Ok(self.add_stylesheet(origin, StylesheetSource::Path(path.to_path_buf()), &text))
    }

    /// Registers an already parsed sheet, which may be shared with other managers.
    pub fn add_parsed(
        &mut self,
        origin: StyleOrigin,
        stylesheet: Arc<Stylesheet>,
    ) -> &StylesheetEntry {
        let name = format!("<parsed #{}>", self.next_order);
        self.push_entry(origin, StylesheetSource::Literal(name), stylesheet, Vec::new())
    }

    fn push_entry(
        &mut self,
        origin: StyleOrigin,
        source: StylesheetSource,
        stylesheet: Arc<Stylesheet>,
        errors: Vec<StyleError>,
    ) -> &StylesheetEntry {
        let registration_order = self.next_order;
        self.next_order += 1;
        self.entries.push(StylesheetEntry {
            origin,
            source,
            stylesheet,
            registration_order,
            errors,
        });
        &self.entries[self.entries.len() - 1]
    }

    /// Removes every sheet of `origin`. Cached conversions of its
    /// declarations go with it.
    pub fn clear_origin(&mut self, origin: StyleOrigin) {
        let cache = self.conversion_cache.get_mut();
        for entry in self.entries.iter().filter(|e| e.origin == origin) {
            for rule in &entry.stylesheet.rules {
                for declaration in &rule.declarations {
                    cache.remove(&declaration.id);
                }
            }
        }
        self.entries.retain(|e| e.origin != origin);
    }

    /// Sheets of `origin` in registration order.
    pub fn stylesheets(&self, origin: StyleOrigin) -> impl Iterator<Item = &StylesheetEntry> {
        self.entries.iter().filter(move |e| e.origin == origin)
    }

    /// Errors recorded while parsing the registered sheets.
    pub fn parse_errors(&self) -> impl Iterator<Item = (&StylesheetSource, &StyleError)> {
        self.entries
            .iter()
            .flat_map(|e| e.errors.iter().map(move |error| (&e.source, error)))
    }

    pub fn cached_conversions(&self) -> usize {
        self.conversion_cache.borrow().len()
    }

    pub fn cached_inline_styles(&self) -> usize {
        self.inline_cache.borrow().len()
    }

    /// Sets how many distinct inline style texts are kept parsed. Reaching
    /// the limit empties the cache.
    pub fn set_inline_cache_limit(&mut self, limit: usize) {
        self.inline_cache_limit = limit;
        if self.inline_cache.get_mut().len() >= limit {
            self.clear_inline_cache();
        }
    }

    /// Drops every parsed inline style and the cached conversions of its
    /// declarations.
    pub fn clear_inline_cache(&self) {
        let evicted: Vec<_> = self.inline_cache.borrow_mut().drain().collect();
        if evicted.is_empty() {
            return;
        }
        log::debug!("Evicting {} cached inline style(s)", evicted.len());
        let mut cache = self.conversion_cache.borrow_mut();
        for (_, declarations) in evicted {
            for declaration in declarations.iter() {
                cache.remove(&declaration.id);
            }
        }
    }

    /// Winning declaration per property for `element`, over `origins`.
    pub fn cascade(
        &self,
        matcher: &SelectorMatcher<'_, M>,
        element: &M::Element,
        origins: &[StyleOrigin],
    ) -> BTreeMap<String, CascadedDeclaration> {
        let mut origins = origins.to_vec();
        origins.sort();
        origins.dedup();

        let mut result = BTreeMap::new();
        for origin in origins {
            for (property, declaration) in self.collect_origin(matcher, element, origin) {
                log::trace!("{} wins '{}' from {}", origin, property, declaration.value_text());
                result.insert(property, CascadedDeclaration { origin, declaration });
            }
        }
        result
    }

    /// One origin's declarations: last declaration wins.
    fn collect_origin(
        &self,
        matcher: &SelectorMatcher<'_, M>,
        element: &M::Element,
        origin: StyleOrigin,
    ) -> BTreeMap<String, Declaration> {
        let mut scratch = BTreeMap::new();

        for entry in self.stylesheets(origin) {
            for rule in &entry.stylesheet.rules {
                if !matcher.matches_group(&rule.selector_group, element) {
                    continue;
                }
                for declaration in &rule.declarations {
                    scratch.insert(declaration.property.clone(), declaration.clone());
                }
            }
        }

        if origin == StyleOrigin::Inline {
            if let Some(text) = matcher.model().inline_style(element) {
                for declaration in self.inline_declarations(&text).iter() {
                    scratch.insert(declaration.property.clone(), declaration.clone());
                }
            }
        }
        scratch
    }

    fn inline_declarations(&self, text: &str) -> Arc<Vec<Declaration>> {
        if let Some(declarations) = self.inline_cache.borrow().get(text) {
            return Arc::clone(declarations);
        }

        let (declarations, errors) = parse_declarations(text);
        for error in &errors {
            log::debug!("Inline style '{}': {}", text, error);
        }
        let declarations = Arc::new(declarations);
        if self.inline_cache.borrow().len() >= self.inline_cache_limit {
            self.clear_inline_cache();
        }
        if self.inline_cache_limit > 0 {
            self.inline_cache
                .borrow_mut()
                .insert(text.to_string(), Arc::clone(&declarations));
        }
        declarations
    }

    /// Custom properties visible to `element`'s evaluations: configured ones,
    /// then the caller's, then those the element itself declares.
    pub fn custom_properties_for(
        &self,
        cascaded: &BTreeMap<String, CascadedDeclaration>,
        custom_properties: &CustomPropertyMap,
    ) -> CustomPropertyMap {
        let mut merged = self.custom_properties.clone();
        merged.extend(custom_properties.iter().map(|(k, v)| (k.clone(), v.clone())));
        for (property, cascaded) in cascaded {
            if cascaded.declaration.is_custom_property() {
                let terms = crate::functions::trim_whitespace(cascaded.declaration.terms.clone());
                merged.insert(property.clone(), terms);
            }
        }
        merged
    }

    /// Converts one declaration to its typed value for `element`.
    ///
    /// Function calls are expanded first. Values of declarations without
    /// function calls are cached by declaration identity.
    pub fn convert(
        &self,
        model: &M,
        declaration: &Declaration,
        element: &M::Element,
        custom_properties: &CustomPropertyMap,
    ) -> Result<StyleValue> {
        let property = declaration.property.as_str();
        let converter = self
            .converters
            .lookup(property)
            .ok_or_else(|| StyleError::conversion(property, "No converter registered"))?;

        let has_functions = self.functions.contains_function(&declaration.terms);
        let cacheable = self.cache_conversions && !has_functions;
        if cacheable {
            if let Some(value) = self.conversion_cache.borrow().get(&declaration.id) {
                log::trace!("Conversion cache hit for '{}'", declaration);
                return Ok(value.clone());
            }
        }

        let tokens = if has_functions {
            let terms = &declaration.terms;
            Cow::Owned(self.functions.evaluate(model, terms, element, custom_properties)?)
        } else {
            Cow::Borrowed(declaration.terms.as_slice())
        };
        let value = converter
            .parse_tokens(&tokens)
            .map_err(|e| e.for_property(property))?;

        if cacheable {
            self.conversion_cache
                .borrow_mut()
                .entry(declaration.id)
                .or_insert_with(|| value.clone());
        }
        Ok(value)
    }

    /// Cascades every origin for `element` and converts the winners.
    ///
    /// Properties without a converter are skipped; failed conversions leave
    /// the property unset and are reported in [`ResolvedStyle::errors`].
    pub fn resolve(
        &self,
        matcher: &SelectorMatcher<'_, M>,
        element: &M::Element,
        custom_properties: &CustomPropertyMap,
    ) -> ResolvedStyle {
        let cascaded = self.cascade(matcher, element, &StyleOrigin::ALL);
        let custom = self.custom_properties_for(&cascaded, custom_properties);

        let mut resolved = ResolvedStyle::default();
        for (property, winner) in &cascaded {
            if winner.declaration.is_custom_property() {
                continue;
            }
            if !self.converters.contains(property) {
                log::trace!("No converter for '{}', skipped", property);
                continue;
            }
            match self.convert(matcher.model(), &winner.declaration, element, &custom) {
                Ok(value) => {
                    resolved.values.insert(
                        property.clone(),
                        ResolvedValue {
                            origin: winner.origin,
                            value,
                        },
                    );
                }
                Err(error) => {
                    log::warn!("Line {}: {}", winner.declaration.line, error);
                    resolved.errors.push(error.for_property(property));
                }
            }
        }
        resolved
    }

    /// Writes every origin's converted values into `store`'s buckets.
    ///
    /// Bucket entries for properties the origin no longer declares (or that
    /// failed to convert) are cleared. Returns the conversion errors.
    pub fn apply(
        &self,
        matcher: &SelectorMatcher<'_, M>,
        element: &M::Element,
        custom_properties: &CustomPropertyMap,
        store: &mut PropertyStore<StyleValue>,
    ) -> Vec<StyleError> {
        let cascaded = self.cascade(matcher, element, &StyleOrigin::ALL);
        let custom = self.custom_properties_for(&cascaded, custom_properties);
        let mut errors = Vec::new();

        for origin in StyleOrigin::ALL {
            let mut stale = store.keys(origin);

            for (property, declaration) in self.collect_origin(matcher, element, origin) {
                if declaration.is_custom_property() || !self.converters.contains(&property) {
                    continue;
                }
                match self.convert(matcher.model(), &declaration, element, &custom) {
                    Ok(value) => {
                        stale.retain(|key| *key != property);
                        store.set(origin, property, Some(value));
                    }
                    Err(error) => {
                        log::warn!("Line {}: {}", declaration.line, error);
                        errors.push(error.for_property(&property));
                    }
                }
            }

            for property in stale {
                store.set(origin, property, None);
            }
        }
        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::converter::{ColorConverter, IdentConverter, LengthConverter};
    use crate::color::Color;
    use crate::selector::tests::TestTree;

    fn manager() -> StyleManager<TestTree> {
        let converters = ConverterRegistry::new()
            .with("fill", Box::new(ColorConverter))
            .with("stroke", Box::new(ColorConverter))
            .with("width", Box::new(LengthConverter))
            .with("display", Box::new(IdentConverter::new()));
        StyleManager::new(converters)
    }

    fn literal(name: &str) -> StylesheetSource {
        StylesheetSource::Literal(name.to_string())
    }

    fn rgb(r: u8, g: u8, b: u8) -> StyleValue {
        StyleValue::Color(Color::new(r, g, b, 255))
    }

    #[test]
    fn test_origin_precedence() {
        let mut tree = TestTree::default();
        let rect = tree.add(None, "rect");

        let mut styles = manager();
        styles.add_stylesheet(StyleOrigin::Author, literal("author"), "rect { fill: #00f; }");
        styles.add_stylesheet(
            StyleOrigin::UserAgent,
            literal("ua"),
            "rect { fill: red; stroke: red; }",
        );

        let resolved =
            styles.resolve(&SelectorMatcher::new(&tree), &rect, &CustomPropertyMap::new());
        assert_eq!(resolved.get("fill"), Some(&rgb(0, 0, 255)));
        assert_eq!(resolved.origin("fill"), Some(StyleOrigin::Author));
        assert_eq!(resolved.origin("stroke"), Some(StyleOrigin::UserAgent));
    }

    #[test]
    fn test_last_declaration_wins_without_specificity() {
        let mut tree = TestTree::default();
        let rect = tree.add(None, "rect");
        tree.nodes[rect].id = Some("main".to_string());

        let mut styles = manager();
        styles.add_stylesheet(
            StyleOrigin::Author,
            literal("a"),
            "#main { fill: red; } * { fill: lime; }",
        );
        styles.add_stylesheet(
            StyleOrigin::Author,
            literal("b"),
            "rect { stroke: blue; stroke: red }",
        );

        let resolved =
            styles.resolve(&SelectorMatcher::new(&tree), &rect, &CustomPropertyMap::new());
        assert_eq!(resolved.get("fill"), Some(&rgb(0, 255, 0)));
        assert_eq!(resolved.get("stroke"), Some(&rgb(255, 0, 0)));
    }

    #[test]
    fn test_inline_style_overrides_everything() {
        let mut tree = TestTree::default();
        let rect = tree.add(None, "rect");
        tree.set_attribute(rect, "style", "fill: blue");

        let mut styles = manager();
        styles.add_stylesheet(
            StyleOrigin::Inline,
            literal("inline sheet"),
            "rect { fill: red; width: 2px }",
        );
        styles.add_stylesheet(StyleOrigin::Author, literal("author"), "rect { fill: lime; }");

        let resolved =
            styles.resolve(&SelectorMatcher::new(&tree), &rect, &CustomPropertyMap::new());
        assert_eq!(resolved.get("fill"), Some(&rgb(0, 0, 255)));
        assert_eq!(resolved.origin("fill"), Some(StyleOrigin::Inline));
        assert_eq!(resolved.origin("width"), Some(StyleOrigin::Inline));
        assert_eq!(styles.cached_inline_styles(), 1);
    }

    #[test]
    fn test_inline_cache_is_bounded() {
        let mut tree = TestTree::default();
        let rects: Vec<_> = ["red", "lime", "blue"]
            .iter()
            .map(|color| {
                let rect = tree.add(None, "rect");
                tree.set_attribute(rect, "style", &format!("fill: {}", color));
                rect
            })
            .collect();

        let mut styles = manager();
        styles.set_inline_cache_limit(2);
        let matcher = SelectorMatcher::new(&tree);
        let none = CustomPropertyMap::new();

        styles.resolve(&matcher, &rects[0], &none);
        styles.resolve(&matcher, &rects[1], &none);
        assert_eq!(styles.cached_inline_styles(), 2);
        assert_eq!(styles.cached_conversions(), 2);

        let resolved = styles.resolve(&matcher, &rects[2], &none);
        assert_eq!(resolved.get("fill"), Some(&rgb(0, 0, 255)));
        assert_eq!(styles.cached_inline_styles(), 1);
        assert_eq!(styles.cached_conversions(), 1);

        styles.clear_inline_cache();
        assert_eq!(styles.cached_inline_styles(), 0);
        assert_eq!(styles.cached_conversions(), 0);

        let resolved = styles.resolve(&matcher, &rects[0], &none);
        assert_eq!(resolved.get("fill"), Some(&rgb(255, 0, 0)));
    }

    #[test]
    fn test_conversion_failure_leaves_property_unset() {
        let mut tree = TestTree::default();
        let rect = tree.add(None, "rect");

        let mut styles = manager();
        styles.add_stylesheet(
            StyleOrigin::Author,
            literal("author"),
            "rect { fill: 12px; stroke: red blue; width: 3px; }",
        );

        let resolved =
            styles.resolve(&SelectorMatcher::new(&tree), &rect, &CustomPropertyMap::new());
        assert_eq!(resolved.get("fill"), None);
        assert_eq!(resolved.get("stroke"), None);
        assert_eq!(resolved.get("width"), Some(&StyleValue::Dimension(3.0, "px".to_string())));
        assert_eq!(resolved.errors.len(), 2);
        assert!(resolved.errors.iter().all(|e| matches!(
            e,
            StyleError::Conversion { property, .. } if property == "fill" || property == "stroke"
        )));
    }

    #[test]
    fn test_custom_properties_from_rules() {
        let mut tree = TestTree::default();
        let rect = tree.add(None, "rect");

        let mut styles = manager();
        styles.add_stylesheet(
            StyleOrigin::Author,
            literal("author"),
            "* { --accent: #0f0; } rect { fill: var(--accent); stroke: var(--missing, red); }",
        );

        let caller = crate::functions::custom_properties([("--accent", "blue")]);
        let resolved = styles.resolve(&SelectorMatcher::new(&tree), &rect, &caller);
        assert_eq!(resolved.get("fill"), Some(&rgb(0, 255, 0)));
        assert_eq!(resolved.get("stroke"), Some(&rgb(255, 0, 0)));
    }

    #[test]
    fn test_conversion_cache() {
        let mut tree = TestTree::default();
        let first = tree.add(None, "rect");
        let second = tree.add(None, "rect");

        let mut styles = manager();
        styles.add_stylesheet(
            StyleOrigin::Author,
            literal("author"),
            "rect { fill: red; stroke: var(--c, blue); }",
        );

        let matcher = SelectorMatcher::new(&tree);
        styles.resolve(&matcher, &first, &CustomPropertyMap::new());
        styles.resolve(&matcher, &second, &CustomPropertyMap::new());
        assert_eq!(styles.cached_conversions(), 1);

        styles.clear_origin(StyleOrigin::Author);
        assert_eq!(styles.cached_conversions(), 0);
        assert_eq!(styles.stylesheets(StyleOrigin::Author).count(), 0);
    }

    #[test]
    fn test_apply_updates_buckets() {
        let mut tree = TestTree::default();
        let rect = tree.add(None, "rect");

        let mut styles = manager();
        styles.add_stylesheet(
            StyleOrigin::UserAgent,
            literal("ua"),
            "* { fill: black; display: block }",
        );
        styles.add_stylesheet(StyleOrigin::Author, literal("author"), "rect { fill: red; }");

        let mut store = PropertyStore::new();
        let matcher = SelectorMatcher::new(&tree);
        assert!(styles.apply(&matcher, &rect, &CustomPropertyMap::new(), &mut store).is_empty());
        assert_eq!(store.output(&"fill".to_string()), Some(&rgb(255, 0, 0)));
        let mut dirty = store.drain_dirty();
        dirty.sort();
        assert_eq!(dirty, vec!["display".to_string(), "fill".to_string()]);

        styles.clear_origin(StyleOrigin::Author);
        styles.apply(&matcher, &rect, &CustomPropertyMap::new(), &mut store);
        assert_eq!(store.output(&"fill".to_string()), Some(&rgb(0, 0, 0)));
        assert_eq!(store.get(StyleOrigin::Author, &"fill".to_string()), None);
        assert_eq!(store.drain_dirty(), vec!["fill".to_string()]);
    }

    #[test]
    fn test_parse_errors_are_recorded() {
        let mut styles = manager();
        let entry = styles.add_stylesheet(
            StyleOrigin::Author,
            literal("broken"),
            "rect { fill: ; } g { fill: red }",
        );
        assert_eq!(entry.errors.len(), 1);
        assert_eq!(entry.stylesheet.rules.len(), 2);

        let errors: Vec<_> = styles.parse_errors().collect();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].0.to_string(), "broken");
    }
}
