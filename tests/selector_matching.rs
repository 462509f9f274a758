mod common;

use common::Document;
use stylecore::{parse_selector, PseudoClassState, SelectorMatcher};

/// <svg>
///   <g class="layer">
///     <title/>
///     <rect id="first" class="shape big"/>
///     <circle class="shape" data-role="marker-start"/>
///   </g>
///   <text lang="en-US"/>
/// </svg>
fn document() -> (Document, Vec<usize>) {
    let mut doc = Document::new();
    let svg = doc.element(None, "svg", &[]);
    let g = doc.element(Some(svg), "g", &[("class", "layer")]);
    let title = doc.element(Some(g), "title", &[]);
    let rect = doc.element(Some(g), "rect", &[("id", "first"), ("class", "shape big")]);
    let circle = doc.element(
        Some(g),
        "circle",
        &[("class", "shape"), ("data-role", "marker-start")],
    );
    let text = doc.element(Some(svg), "text", &[("lang", "en-US")]);
    (doc, vec![svg, g, title, rect, circle, text])
}

fn matches(doc: &Document, selector: &str, element: usize) -> bool {
    let group = parse_selector(selector).unwrap();
    SelectorMatcher::new(doc).matches_group(&group, &element)
}

#[test]
fn simple_selectors() {
    let (doc, n) = document();
    let rect = n[3];
    assert!(matches(&doc, "*", rect));
    assert!(matches(&doc, "rect", rect));
    assert!(matches(&doc, "#first", rect));
    assert!(matches(&doc, ".big", rect));
    assert!(matches(&doc, "rect.shape.big#first", rect));
    assert!(!matches(&doc, "rect.small", rect));
    assert!(!matches(&doc, "circle", rect));
}

#[test]
fn combinators() {
    let (doc, n) = document();
    let (rect, circle, text) = (n[3], n[4], n[5]);

    assert!(matches(&doc, "svg rect", rect));
    assert!(matches(&doc, "svg > g > rect", rect));
    assert!(!matches(&doc, "svg > rect", rect));
    assert!(matches(&doc, "title + rect", rect));
    assert!(!matches(&doc, "title + circle", circle));
    assert!(matches(&doc, "title ~ circle", circle));
    assert!(matches(&doc, "g ~ text", text));
    assert!(!matches(&doc, "text ~ g", n[1]));
    assert!(matches(&doc, "svg > .layer .shape + .shape", circle));
}

#[test]
fn attribute_selectors() {
    let (doc, n) = document();
    let (circle, text) = (n[4], n[5]);

    assert!(matches(&doc, "[data-role]", circle));
    assert!(matches(&doc, "[data-role=\"marker-start\"]", circle));
    assert!(matches(&doc, "[data-role^=marker]", circle));
    assert!(matches(&doc, "[data-role$=\"start\"]", circle));
    assert!(matches(&doc, "[data-role*=\"ker-st\"]", circle));
    assert!(matches(&doc, "[class~=shape]", circle));
    assert!(matches(&doc, "[lang|=en]", text));
    assert!(!matches(&doc, "[lang|=e]", text));
    assert!(!matches(&doc, "[data-role^=\"\"]", circle));
}

#[test]
fn groups_match_any_alternative() {
    let (doc, n) = document();
    assert!(matches(&doc, "circle, rect", n[3]));
    assert!(!matches(&doc, "circle, text", n[3]));
}

#[test]
fn pseudo_class_state_overrides_model() {
    let (mut doc, n) = document();
    let (rect, circle) = (n[3], n[4]);
    doc.add_pseudo_class(circle, "focus");

    let group = parse_selector("g > :hover, :focus").unwrap();
    let mut state = PseudoClassState::new();
    state.insert(rect, "hover");

    let plain = SelectorMatcher::new(&doc);
    let with_state = SelectorMatcher::new(&doc).with_pseudo_classes(Some(&state));

    assert!(!plain.matches_group(&group, &rect));
    assert!(with_state.matches_group(&group, &rect));
    assert!(plain.matches_group(&group, &circle));
    assert!(with_state.matches_group(&group, &circle));
}
