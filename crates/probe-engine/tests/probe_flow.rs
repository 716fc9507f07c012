use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use probe_engine::model::InteractionKind;
use probe_engine::scripts;
use probe_engine::{
    ElementHandle, InteractionSpec, InteractionType, PagePort, ProbeError, ProbeRequest,
    ValidationOrchestrator,
};
use serde_json::{json, Value};

/// One node of the in-memory page.
#[derive(Clone)]
struct FakeElement {
    facts: Value,
    state_before: Value,
    state_after: Value,
    neighborhood_before: Value,
    neighborhood_after: Value,
    detached: bool,
}

impl FakeElement {
    fn new(tag: &str, attributes: Value) -> Self {
        let state = json!({
            "focused": false,
            "ariaExpanded": attributes.get("aria-expanded").cloned().unwrap_or(Value::Null),
            "ariaPressed": null,
            "ariaSelected": null,
        });
        let neighborhood = neighborhood(vec![], vec![]);
        Self {
            facts: json!({
                "tagName": tag,
                "attributes": attributes,
                "hasBox": true,
                "hasOffsetParent": true,
                "tabIndex": -1,
                "text": "",
            }),
            state_before: state.clone(),
            state_after: state,
            neighborhood_before: neighborhood.clone(),
            neighborhood_after: neighborhood,
            detached: false,
        }
    }

    fn text(mut self, text: &str) -> Self {
        self.facts["text"] = json!(text);
        self
    }

    fn states(mut self, before: Value, after: Value) -> Self {
        self.state_before = before;
        self.state_after = after;
        self
    }

    fn neighborhoods(mut self, before: Value, after: Value) -> Self {
        self.neighborhood_before = before;
        self.neighborhood_after = after;
        self
    }

    fn unreadable(mut self) -> Self {
        self.facts = json!("not an object");
        self
    }

    fn detached(mut self) -> Self {
        self.detached = true;
        self.facts["hasOffsetParent"] = json!(false);
        self
    }
}

#[derive(Default)]
struct FakePage {
    queries: HashMap<(Option<u64>, String), u64>,
    elements: HashMap<u64, FakeElement>,
    interacted: Mutex<HashSet<u64>>,
    actions: Mutex<Vec<String>>,
    waits: Mutex<Vec<Duration>>,
    broken_selectors: HashSet<String>,
    browser_gone: bool,
    live: Mutex<Vec<u64>>,
}

impl FakePage {
    fn with(mut self, scope: Option<u64>, selector: &str, id: u64, element: FakeElement) -> Self {
        self.queries.insert((scope, selector.to_string()), id);
        self.elements.insert(id, element);
        self
    }

    fn breaking_on(mut self, selector: &str) -> Self {
        self.broken_selectors.insert(selector.to_string());
        self
    }

    fn element(&self, handle: &ElementHandle) -> Result<&FakeElement, ProbeError> {
        self.elements
            .get(&handle.0)
            .ok_or_else(|| ProbeError::StaleElement(format!("unknown element handle {handle}")))
    }

    fn act(&self, handle: &ElementHandle, action: String) -> Result<(), ProbeError> {
        if self.browser_gone {
            return Err(ProbeError::Environment("websocket closed".into()));
        }
        if self.element(handle)?.detached {
            return Err(ProbeError::Interaction(
                "Node is detached from document".into(),
            ));
        }
        self.actions.lock().unwrap().push(action);
        self.interacted.lock().unwrap().insert(handle.0);
        Ok(())
    }

    fn actions(&self) -> Vec<String> {
        self.actions.lock().unwrap().clone()
    }

    fn live_handles(&self) -> usize {
        self.live.lock().unwrap().len()
    }
}

#[async_trait]
impl PagePort for FakePage {
    async fn query(
        &self,
        scope: Option<&ElementHandle>,
        selector: &str,
    ) -> Result<Option<ElementHandle>, ProbeError> {
        if self.broken_selectors.contains(selector) {
            return Err(ProbeError::Interaction(format!("invalid selector {selector}")));
        }
        let key = (scope.map(|handle| handle.0), selector.to_string());
        let found = self.queries.get(&key).copied();
        if let Some(id) = found {
            self.live.lock().unwrap().push(id);
        }
        Ok(found.map(ElementHandle))
    }

    async fn is_visible(&self, handle: &ElementHandle) -> Result<bool, ProbeError> {
        Ok(!self.element(handle)?.detached)
    }

    async fn evaluate(
        &self,
        handle: &ElementHandle,
        function_declaration: &str,
    ) -> Result<Value, ProbeError> {
        let element = self.element(handle)?;
        let after = self.interacted.lock().unwrap().contains(&handle.0);
        if function_declaration == scripts::ELEMENT_FACTS {
            Ok(element.facts.clone())
        } else if function_declaration == scripts::ELEMENT_STATE {
            Ok(if after {
                element.state_after.clone()
            } else {
                element.state_before.clone()
            })
        } else if self.browser_gone {
            Err(ProbeError::Environment("target crashed".into()))
        } else {
            Ok(if after {
                element.neighborhood_after.clone()
            } else {
                element.neighborhood_before.clone()
            })
        }
    }

    async fn click(&self, handle: &ElementHandle) -> Result<(), ProbeError> {
        self.act(handle, format!("click {handle}"))
    }

    async fn focus(&self, handle: &ElementHandle) -> Result<(), ProbeError> {
        self.act(handle, format!("focus {handle}"))
    }

    async fn hover(&self, handle: &ElementHandle) -> Result<(), ProbeError> {
        self.act(handle, format!("hover {handle}"))
    }

    async fn press_key(&self, handle: &ElementHandle, key: &str) -> Result<(), ProbeError> {
        self.act(handle, format!("press {key} {handle}"))
    }

    async fn release(&self, handle: &ElementHandle) {
        let mut live = self.live.lock().unwrap();
        if let Some(pos) = live.iter().position(|id| *id == handle.0) {
            live.swap_remove(pos);
        }
    }

    async fn wait(&self, duration: Duration) {
        self.waits.lock().unwrap().push(duration);
    }
}

fn neighborhood(siblings: Vec<Value>, candidates: Vec<Value>) -> Value {
    json!({
        "elementPosition": { "top": 60.0, "left": 10.0, "bottom": 100.0, "right": 130.0 },
        "parentTagName": "nav",
        "siblings": siblings,
        "candidates": candidates,
    })
}

fn sibling(tag: &str, class: &str, visible: bool, expanded: Option<&str>) -> Value {
    json!({
        "tagName": tag,
        "className": class,
        "id": "",
        "isVisible": visible,
        "hasAriaExpanded": expanded.is_some(),
        "ariaExpanded": expanded,
    })
}

fn candidate(tag: &str, class: &str, top: f64) -> Value {
    json!({
        "tagName": tag,
        "className": class,
        "id": "",
        "isVisible": true,
        "position": { "top": top, "left": 10.0, "width": 220.0, "height": 60.0 },
    })
}

fn state(focused: bool, expanded: Option<&str>) -> Value {
    json!({
        "focused": focused,
        "ariaExpanded": expanded,
        "ariaPressed": null,
        "ariaSelected": null,
    })
}

fn orchestrator(page: Arc<FakePage>) -> ValidationOrchestrator {
    ValidationOrchestrator::new(page)
}

#[tokio::test]
async fn missing_container_leaves_every_field_empty() {
    let page = Arc::new(FakePage::default());
    let result = orchestrator(page.clone())
        .validate(
            &ProbeRequest::new("#does-not-exist")
                .with_child(".item")
                .with_interaction(InteractionSpec::click()),
        )
        .await
        .unwrap();

    assert!(!result.found);
    assert!(result.details.is_none());
    assert!(!result.child_found);
    assert!(result.child_details.is_none());
    assert!(result.interaction_result.is_none());
    assert!(result.dom_changes.is_none());
    assert!(page.actions().is_empty());
}

#[tokio::test]
async fn hover_on_container_diffs_against_baseline() {
    let card = FakeElement::new("div", json!({ "class": "card", "role": "group" }))
        .text("Pricing")
        .neighborhoods(
            neighborhood(vec![sibling("div", "card", true, None), sibling("span", "tooltip", false, None)], vec![]),
            neighborhood(vec![sibling("div", "card", true, None), sibling("span", "tooltip", true, None)], vec![]),
        );
    let page = Arc::new(FakePage::default().with(None, ".card", 1, card));

    let result = orchestrator(page.clone())
        .validate(&ProbeRequest::new(".card").with_interaction(InteractionSpec::hover()))
        .await
        .unwrap();

    assert!(result.found);
    let details = result.details.as_ref().unwrap();
    assert_eq!(details.accessible_name.as_deref(), Some("Pricing"));
    assert!(details.has_valid_semantics);
    assert!(!result.child_found);

    let outcome = result.interaction_result.as_ref().unwrap();
    assert_eq!(outcome.kind, InteractionKind::Hover);
    assert!(outcome.success);
    assert!(!outcome.state_change.unwrap().any());

    let changes = result.dom_changes.as_ref().unwrap();
    assert_eq!(changes.interaction_type, InteractionType::VisibilityToggle);
    assert_eq!(changes.changed_visibility.len(), 1);
    assert_eq!(outcome.accessibility_score, 60);
    assert_eq!(page.actions(), vec!["hover el#1".to_string()]);
    assert_eq!(*page.waits.lock().unwrap(), vec![Duration::from_millis(300)]);
}

#[tokio::test]
async fn dropdown_toggle_reports_new_menu() {
    let toggle = FakeElement::new(
        "button",
        json!({ "aria-haspopup": "true", "aria-expanded": "false", "aria-label": "Open menu" }),
    )
    .states(state(false, Some("false")), state(true, Some("true")))
    .neighborhoods(
        neighborhood(vec![sibling("button", "", true, Some("false"))], vec![]),
        neighborhood(
            vec![sibling("button", "", true, Some("true"))],
            vec![
                candidate("ul", "dropdown", 104.0),
                candidate("div", "menu-section", 170.0),
                candidate("div", "menu-footer", 240.0),
                candidate("div", "far-away", 900.0),
            ],
        ),
    );
    let page = Arc::new(FakePage::default().with(None, "#menu-toggle", 7, toggle));

    let result = orchestrator(page)
        .validate(
            &ProbeRequest::new("#menu-toggle")
                .with_description("main menu toggle")
                .with_interaction(InteractionSpec::click().expecting_change(true)),
        )
        .await
        .unwrap();

    let changes = result.dom_changes.as_ref().unwrap();
    assert_eq!(changes.interaction_type, InteractionType::Dropdown);
    assert_eq!(changes.new_elements.len(), 3);
    assert_eq!(changes.new_elements[0].tag_name, "ul");
    assert_eq!(changes.description, "Dropdown menu appeared (3 new element(s))");

    let outcome = result.interaction_result.as_ref().unwrap();
    let state_change = outcome.state_change.unwrap();
    assert!(state_change.focus_changed);
    assert!(state_change.aria_expanded_changed);
    assert!(outcome.accessibility_score >= 60);
    assert!(outcome.accessibility_score <= 100);

    let details = result.details.unwrap();
    assert!(details.is_focusable);
    assert_eq!(details.accessible_name.as_deref(), Some("Open menu"));
    assert_eq!(details.aria_attributes.get("aria-haspopup").map(String::as_str), Some("true"));
}

#[tokio::test]
async fn detached_element_fails_with_zero_score() {
    let ghost = FakeElement::new("button", json!({})).text("Save").detached();
    let page = Arc::new(FakePage::default().with(None, "#save", 3, ghost));

    let result = orchestrator(page)
        .validate(&ProbeRequest::new("#save").with_interaction(InteractionSpec::click()))
        .await
        .unwrap();

    assert!(result.found);
    assert!(!result.details.as_ref().unwrap().is_visible);
    let outcome = result.interaction_result.unwrap();
    assert!(!outcome.success);
    assert!(outcome.error.as_deref().unwrap().contains("detached"));
    assert!(outcome.state_change.is_none());
    assert_eq!(outcome.accessibility_score, 0);
    assert!(result.dom_changes.is_none());
}

#[tokio::test]
async fn click_without_aria_expanded_succeeds_without_change() {
    let button = FakeElement::new("button", json!({})).text("Submit");
    let page = Arc::new(FakePage::default().with(None, "button[type=submit]", 4, button));

    let result = orchestrator(page)
        .validate(&ProbeRequest::new("button[type=submit]").with_interaction(InteractionSpec::click()))
        .await
        .unwrap();

    let outcome = result.interaction_result.unwrap();
    assert!(outcome.success);
    let change = outcome.state_change.unwrap();
    assert!(!change.aria_expanded_changed);
    assert_eq!(result.dom_changes.unwrap().interaction_type, InteractionType::None);
    assert_eq!(outcome.accessibility_score, 50);
}

#[tokio::test]
async fn child_interaction_uses_child_snapshot_as_before() {
    let panel = candidate("div", "panel", 130.0);
    let nav = FakeElement::new("nav", json!({ "aria-label": "Primary" }));
    let toggle = FakeElement::new("button", json!({ "class": "toggle" })).neighborhoods(
        neighborhood(vec![], vec![panel.clone()]),
        neighborhood(vec![], vec![panel]),
    );
    let page = Arc::new(
        FakePage::default()
            .with(None, "nav#main", 10, nav)
            .with(Some(10), "button.toggle", 11, toggle),
    );

    let result = orchestrator(page.clone())
        .validate(
            &ProbeRequest::new("nav#main")
                .with_child("button.toggle")
                .with_interaction(InteractionSpec::keydown("Enter")),
        )
        .await
        .unwrap();

    assert!(result.child_found);
    assert_eq!(result.child_details.as_ref().unwrap().tag_name, "button");
    assert_eq!(
        result.details.as_ref().unwrap().accessible_name.as_deref(),
        Some("Primary")
    );
    assert_eq!(
        result.dom_changes.as_ref().unwrap().interaction_type,
        InteractionType::None
    );
    assert_eq!(
        page.actions(),
        vec!["focus el#11".to_string(), "press Enter el#11".to_string()]
    );
}

#[tokio::test]
async fn missing_child_skips_interaction() {
    let nav = FakeElement::new("nav", json!({}));
    let page = Arc::new(FakePage::default().with(None, "nav", 20, nav));

    let result = orchestrator(page.clone())
        .validate(
            &ProbeRequest::new("nav")
                .with_child("a.missing")
                .with_interaction(InteractionSpec::click()),
        )
        .await
        .unwrap();

    assert!(result.found);
    assert!(!result.child_found);
    assert!(result.child_details.is_none());
    assert!(result.interaction_result.is_none());
    assert!(page.actions().is_empty());
}

#[tokio::test]
async fn failed_lookup_counts_as_not_found() {
    let page = Arc::new(FakePage::default().breaking_on("div[["));
    let result = orchestrator(page)
        .validate(&ProbeRequest::new("div[["))
        .await
        .unwrap();
    assert!(!result.found);
}

#[tokio::test]
async fn environment_failures_propagate() {
    let button = FakeElement::new("button", json!({}));
    let mut page = FakePage::default().with(None, "#go", 1, button);
    page.browser_gone = true;

    let err = orchestrator(Arc::new(page))
        .validate(&ProbeRequest::new("#go").with_interaction(InteractionSpec::click()))
        .await
        .unwrap_err();
    assert!(err.is_environmental());
}

#[tokio::test]
async fn malformed_request_is_rejected() {
    let page = Arc::new(FakePage::default());
    let err = orchestrator(page)
        .validate(&ProbeRequest::new(""))
        .await
        .unwrap_err();
    assert!(matches!(err, ProbeError::InvalidSpec(_)));
}

#[tokio::test]
async fn suite_keeps_request_order() {
    let first = FakeElement::new("a", json!({ "href": "/" })).text("Home");
    let third = FakeElement::new("button", json!({})).text("Go");
    let page = Arc::new(
        FakePage::default()
            .with(None, "a.home", 1, first)
            .with(None, "#go", 3, third),
    );
    let requests = vec![
        ProbeRequest::new("a.home").with_description("home link"),
        ProbeRequest::new("#missing"),
        ProbeRequest::new("#go").with_interaction(InteractionSpec::focus()),
    ];

    let report = orchestrator(page).run_suite(&requests).await.unwrap();

    let selectors: Vec<_> = report.results.iter().map(|r| r.selector.as_str()).collect();
    assert_eq!(selectors, vec!["a.home", "#missing", "#go"]);
    assert_eq!(report.results[0].description.as_deref(), Some("home link"));
    assert!(report.results[0].result.found);
    assert!(!report.results[1].result.found);
    assert_eq!(report.summary.total, 3);
    assert_eq!(report.summary.found, 2);
    assert_eq!(report.summary.interactions_attempted, 1);
    assert_eq!(report.summary.interactions_succeeded, 1);
    assert_eq!(report.summary.average_score, Some(50.0));

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["results"][0]["selector"], "a.home");
    assert_eq!(json["results"][0]["found"], true);
    assert_eq!(json["summary"]["interactionsAttempted"], 1);
}

#[tokio::test]
async fn suite_stops_on_environment_failure() {
    let button = FakeElement::new("button", json!({}));
    let mut page = FakePage::default().with(None, "#go", 1, button);
    page.browser_gone = true;
    let requests = vec![
        ProbeRequest::new("#missing"),
        ProbeRequest::new("#go").with_interaction(InteractionSpec::hover()),
        ProbeRequest::new("#never"),
    ];

    let err = orchestrator(Arc::new(page))
        .run_suite(&requests)
        .await
        .unwrap_err();
    assert!(matches!(err, ProbeError::Environment(_)));
}

#[tokio::test]
async fn suite_continues_past_detached_element_and_releases_handles() {
    let ghost = FakeElement::new("button", json!({})).detached();
    let nav = FakeElement::new("nav", json!({}));
    let link = FakeElement::new("a", json!({ "href": "/docs" })).text("Docs");
    let page = Arc::new(
        FakePage::default()
            .with(None, "#ghost", 1, ghost)
            .with(None, "nav", 2, nav)
            .with(Some(2), "a", 3, link),
    );
    let requests = vec![
        ProbeRequest::new("#ghost").with_interaction(InteractionSpec::hover()),
        ProbeRequest::new("nav")
            .with_child("a")
            .with_interaction(InteractionSpec::focus()),
        ProbeRequest::new("#missing"),
    ];

    let report = orchestrator(page.clone()).run_suite(&requests).await.unwrap();

    assert_eq!(report.results.len(), 3);
    let ghost = report.results[0].result.interaction_result.as_ref().unwrap();
    assert!(!ghost.success);
    assert_eq!(ghost.accessibility_score, 0);
    assert!(report.results[1].result.child_found);
    assert!(report.results[1].result.interaction_result.as_ref().unwrap().success);
    assert_eq!(page.live_handles(), 0);
}

#[tokio::test]
async fn handles_are_released_when_environment_fails() {
    let button = FakeElement::new("button", json!({}));
    let mut page = FakePage::default().with(None, "#go", 1, button);
    page.browser_gone = true;
    let page = Arc::new(page);

    orchestrator(page.clone())
        .validate(&ProbeRequest::new("#go").with_interaction(InteractionSpec::click()))
        .await
        .unwrap_err();
    assert_eq!(page.live_handles(), 0);
}

#[tokio::test]
async fn unreadable_facts_fall_back_to_visibility_check() {
    let odd = FakeElement::new("div", json!({})).unreadable();
    let page = Arc::new(FakePage::default().with(None, "#odd", 5, odd));

    let result = orchestrator(page)
        .validate(&ProbeRequest::new("#odd"))
        .await
        .unwrap();

    assert!(result.found);
    let details = result.details.unwrap();
    assert!(details.is_visible);
    assert!(details.tag_name.is_empty());
    assert!(details.accessible_name.is_none());
}
