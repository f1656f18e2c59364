//! Scripted in-memory driver.
//!
//! [`MockDriver`] keeps a flat list of [`MockElement`]s keyed by the raw
//! selector string they answer to, plus per-tab URL and history. Clicks, key
//! presses and hovers run scripted [`MockEffect`]s, which is enough to model
//! dropdowns opening, lists re-rendering, new tabs and downloads without a
//! browser. Stale-element and action failures can be injected per selector.

use crate::driver::{
    BrowserDriver, ClickKind, ElementState, Key, OptionMatch, SelectOption, SessionContext,
};
use crate::locator::Selector;
use crate::result::{PageError, PageResult};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::Instant;

/// PNG signature returned as the mock screenshot
pub const MOCK_PNG: &[u8] = b"\x89PNG\r\n\x1a\n";

/// Side effect run when a mock element is clicked, hovered or keyed
#[derive(Debug, Clone)]
pub enum MockEffect {
    /// Make every element with the selector visible
    Show(String),
    /// Hide every element with the selector
    Hide(String),
    /// Enable every element with the selector
    Enable(String),
    /// Disable every element with the selector
    Disable(String),
    /// Remove every element with the selector
    Remove(String),
    /// Insert a new element into the clicked element's tab
    Add(MockElement),
    /// Replace the text of every element with the selector
    SetText(String, String),
    /// Replace the value of every element with the selector
    SetValue(String, String),
    /// Re-render a collection: one element per text, in order
    SetTexts(String, Vec<String>),
    /// Add a class
    AddClass(String, String),
    /// Remove a class
    RemoveClass(String, String),
    /// Set an attribute
    SetAttr(String, String, String),
    /// Add to the numeric value, clamped by `min`/`max` attributes
    Increment(String, i64),
    /// Navigate the clicked element's tab
    Navigate {
        /// Target URL
        url: String,
        /// Title of the new document
        title: String,
    },
    /// Open a new tab at the end of the tab list
    OpenTab {
        /// URL of the new tab
        url: String,
        /// Title of the new tab
        title: String,
    },
    /// Write a file, simulating a completed download
    WriteFile {
        /// Destination path
        path: PathBuf,
        /// File contents
        contents: Vec<u8>,
    },
    /// Several effects in order
    Sequence(Vec<MockEffect>),
}

/// One node of the mock DOM
#[derive(Debug, Clone)]
pub struct MockElement {
    selector: String,
    tag: String,
    text: String,
    value: String,
    visible: bool,
    enabled: bool,
    readonly: bool,
    checked: bool,
    input_type: Option<String>,
    attrs: BTreeMap<String, String>,
    classes: Vec<String>,
    css: BTreeMap<String, String>,
    options: Vec<SelectOption>,
    multiple: bool,
    frames: Vec<String>,
    tab: usize,
    appears_after: Option<Duration>,
    appears_at: Option<Instant>,
    on_click: Vec<MockEffect>,
    on_hover: Vec<MockEffect>,
    on_key: Vec<(Key, MockEffect)>,
    files: Vec<String>,
}

impl MockElement {
    /// A visible, enabled `<div>` answering to `selector`
    #[must_use]
    pub fn new(selector: &str) -> Self {
        Self {
            selector: Selector::parse(selector).raw(),
            tag: "div".to_string(),
            text: String::new(),
            value: String::new(),
            visible: true,
            enabled: true,
            readonly: false,
            checked: false,
            input_type: None,
            attrs: BTreeMap::new(),
            classes: Vec::new(),
            css: BTreeMap::new(),
            options: Vec::new(),
            multiple: false,
            frames: Vec::new(),
            tab: 0,
            appears_after: None,
            appears_at: None,
            on_click: Vec::new(),
            on_hover: Vec::new(),
            on_key: Vec::new(),
            files: Vec::new(),
        }
    }

    /// Set the tag name
    #[must_use]
    pub fn tag(mut self, tag: &str) -> Self {
        self.tag = tag.to_ascii_lowercase();
        self
    }

    /// `<input type=...>`
    #[must_use]
    pub fn input(mut self, input_type: &str) -> Self {
        self.tag = "input".to_string();
        self.input_type = Some(input_type.to_string());
        self
    }

    /// Checkbox input
    #[must_use]
    pub fn checkbox(self) -> Self {
        self.input("checkbox")
    }

    /// Radio input in the named group
    #[must_use]
    pub fn radio(self, group: &str) -> Self {
        self.input("radio").attr("name", group)
    }

    /// `<select>` with the given options
    #[must_use]
    pub fn select(mut self, options: Vec<SelectOption>) -> Self {
        self.tag = "select".to_string();
        self.options = options;
        self
    }

    /// Allow multiple selection
    #[must_use]
    pub const fn multiple(mut self) -> Self {
        self.multiple = true;
        self
    }

    /// Text content
    #[must_use]
    pub fn text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }

    /// `value` property
    #[must_use]
    pub fn value(mut self, value: &str) -> Self {
        self.value = value.to_string();
        self
    }

    /// Present but not visible
    #[must_use]
    pub const fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    /// Disabled
    #[must_use]
    pub const fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Read-only
    #[must_use]
    pub const fn readonly(mut self) -> Self {
        self.readonly = true;
        self
    }

    /// Checked
    #[must_use]
    pub const fn checked(mut self) -> Self {
        self.checked = true;
        self
    }

    /// Set an attribute
    #[must_use]
    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attrs.insert(name.to_string(), value.to_string());
        self
    }

    /// Add a class
    #[must_use]
    pub fn class(mut self, class: &str) -> Self {
        self.classes.push(class.to_string());
        self
    }

    /// Set a computed style property
    #[must_use]
    pub fn css(mut self, property: &str, value: &str) -> Self {
        self.css.insert(property.to_string(), value.to_string());
        self
    }

    /// Place inside the frame path, outermost first
    #[must_use]
    pub fn in_frame(mut self, frame: &str) -> Self {
        self.frames.push(Selector::parse(frame).raw());
        self
    }

    /// Place in a tab other than the first
    #[must_use]
    pub const fn in_tab(mut self, tab: usize) -> Self {
        self.tab = tab;
        self
    }

    /// Only present once this much time has passed after insertion
    #[must_use]
    pub const fn appears_after(mut self, delay: Duration) -> Self {
        self.appears_after = Some(delay);
        self
    }

    /// Effect run on click
    #[must_use]
    pub fn on_click(mut self, effect: MockEffect) -> Self {
        self.on_click.push(effect);
        self
    }

    /// Effect run on hover
    #[must_use]
    pub fn on_hover(mut self, effect: MockEffect) -> Self {
        self.on_hover.push(effect);
        self
    }

    /// Effect run when a key is pressed on the element
    #[must_use]
    pub fn on_key(mut self, key: Key, effect: MockEffect) -> Self {
        self.on_key.push((key, effect));
        self
    }

    fn is_present(&self, now: Instant) -> bool {
        self.appears_at.map_or(true, |at| now >= at)
    }

    fn is_form_field(&self) -> bool {
        matches!(self.tag.as_str(), "input" | "textarea")
    }

    fn is_editable(&self) -> bool {
        self.is_form_field() || self.attrs.get("contenteditable").is_some_and(|v| v != "false")
    }

    fn is_checked(&self) -> bool {
        self.checked || self.attrs.get("aria-checked").is_some_and(|v| v == "true")
    }

    fn display_text(&self) -> String {
        if self.tag == "select" {
            return self
                .options
                .iter()
                .find(|o| o.selected)
                .map(|o| o.text.clone())
                .unwrap_or_default();
        }
        if self.is_form_field() {
            self.value.clone()
        } else {
            self.text.clone()
        }
    }

    fn current_value(&self) -> String {
        if self.tag == "select" {
            return self
                .options
                .iter()
                .find(|o| o.selected)
                .map(|o| o.value.clone())
                .unwrap_or_default();
        }
        self.value.clone()
    }

    fn attribute(&self, name: &str) -> Option<String> {
        if let Some(v) = self.attrs.get(name) {
            return Some(v.clone());
        }
        match name {
            "value" => Some(self.current_value()),
            "class" if !self.classes.is_empty() => Some(self.classes.join(" ")),
            "type" => self.input_type.clone(),
            "checked" => self.checked.then(|| "true".to_string()),
            "disabled" => (!self.enabled).then(|| "true".to_string()),
            "readonly" => self.readonly.then(|| "true".to_string()),
            "multiple" => self.multiple.then(|| "true".to_string()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
struct MockTab {
    history: Vec<(String, String)>,
    position: usize,
}

impl MockTab {
    fn new(url: &str, title: &str) -> Self {
        Self {
            history: vec![(url.to_string(), title.to_string())],
            position: 0,
        }
    }

    fn current(&self) -> &(String, String) {
        &self.history[self.position]
    }
}

#[derive(Debug)]
struct MockState {
    tabs: Vec<MockTab>,
    elements: Vec<MockElement>,
    titles: HashMap<String, String>,
    scripts: Vec<(String, serde_json::Value)>,
    stale: HashMap<String, u32>,
    failures: HashMap<String, String>,
    ready_at: Option<Instant>,
    screenshot: Vec<u8>,
    calls: Vec<String>,
    closed: bool,
}

impl Default for MockState {
    fn default() -> Self {
        Self {
            tabs: vec![MockTab::new("about:blank", "")],
            elements: Vec::new(),
            titles: HashMap::new(),
            scripts: Vec::new(),
            stale: HashMap::new(),
            failures: HashMap::new(),
            ready_at: None,
            screenshot: MOCK_PNG.to_vec(),
            calls: Vec::new(),
            closed: false,
        }
    }
}

impl MockState {
    fn ensure_tab(&self, tab: usize) -> PageResult<()> {
        if self.closed {
            return Err(PageError::driver("browser is closed"));
        }
        if tab < self.tabs.len() {
            Ok(())
        } else {
            Err(PageError::NoSuchTab {
                index: tab,
                count: self.tabs.len(),
            })
        }
    }

    fn matches(&self, ctx: &SessionContext, selector: &Selector) -> Vec<usize> {
        let key = selector.raw();
        let frames: Vec<String> = ctx.frames.iter().map(Selector::raw).collect();
        let now = Instant::now();
        self.elements
            .iter()
            .enumerate()
            .filter(|(_, e)| {
                e.selector == key && e.tab == ctx.tab && e.frames == frames && e.is_present(now)
            })
            .map(|(i, _)| i)
            .collect()
    }

    fn first(&self, ctx: &SessionContext, selector: &Selector) -> PageResult<usize> {
        self.matches(ctx, selector)
            .first()
            .copied()
            .ok_or_else(|| PageError::ElementNotFound {
                selector: selector.raw(),
            })
    }

    fn take_injected(&mut self, selector: &Selector) -> PageResult<()> {
        let key = selector.raw();
        if let Some(message) = self.failures.get(&key) {
            return Err(PageError::driver(message.clone()));
        }
        if let Some(remaining) = self.stale.get_mut(&key) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(PageError::StaleElement { selector: key });
            }
        }
        Ok(())
    }

    fn insert(&mut self, mut element: MockElement) {
        element.appears_at = element.appears_after.map(|d| Instant::now() + d);
        self.elements.push(element);
    }

    fn each_in_tab(&mut self, tab: usize, selector: &str, mut f: impl FnMut(&mut MockElement)) {
        let key = Selector::parse(selector).raw();
        for element in self.elements.iter_mut().filter(|e| e.selector == key && e.tab == tab) {
            f(element);
        }
    }

    fn navigate(&mut self, tab: usize, url: &str, title: Option<&str>) {
        let title = title
            .map(str::to_string)
            .or_else(|| self.titles.get(url).cloned())
            .unwrap_or_else(|| url.to_string());
        let entry = &mut self.tabs[tab];
        entry.history.truncate(entry.position + 1);
        entry.history.push((url.to_string(), title));
        entry.position = entry.history.len() - 1;
    }

    fn apply(&mut self, tab: usize, effect: MockEffect) -> PageResult<()> {
        match effect {
            MockEffect::Show(sel) => self.each_in_tab(tab, &sel, |e| {
                e.visible = true;
                e.appears_at = None;
            }),
            MockEffect::Hide(sel) => self.each_in_tab(tab, &sel, |e| e.visible = false),
            MockEffect::Enable(sel) => self.each_in_tab(tab, &sel, |e| e.enabled = true),
            MockEffect::Disable(sel) => self.each_in_tab(tab, &sel, |e| e.enabled = false),
            MockEffect::Remove(sel) => {
                let key = Selector::parse(&sel).raw();
                self.elements.retain(|e| !(e.selector == key && e.tab == tab));
            }
            MockEffect::Add(element) => self.insert(element.in_tab(tab)),
            MockEffect::SetText(sel, text) => {
                self.each_in_tab(tab, &sel, |e| e.text = text.clone());
            }
            MockEffect::SetValue(sel, value) => {
                self.each_in_tab(tab, &sel, |e| e.value = value.clone());
            }
            MockEffect::SetTexts(sel, texts) => self.rerender(tab, &sel, &texts),
            MockEffect::AddClass(sel, class) => self.each_in_tab(tab, &sel, |e| {
                if !e.classes.contains(&class) {
                    e.classes.push(class.clone());
                }
            }),
            MockEffect::RemoveClass(sel, class) => {
                self.each_in_tab(tab, &sel, |e| e.classes.retain(|c| *c != class));
            }
            MockEffect::SetAttr(sel, name, value) => self.each_in_tab(tab, &sel, |e| {
                e.attrs.insert(name.clone(), value.clone());
            }),
            MockEffect::Increment(sel, delta) => self.each_in_tab(tab, &sel, |e| {
                let raw = if e.value.is_empty() { &e.text } else { &e.value };
                let current: i64 = raw.trim().parse().unwrap_or(0);
                let mut next = current + delta;
                if let Some(max) = e.attrs.get("max").and_then(|m| m.parse::<i64>().ok()) {
                    next = next.min(max);
                }
                if let Some(min) = e.attrs.get("min").and_then(|m| m.parse::<i64>().ok()) {
                    next = next.max(min);
                }
                if e.is_form_field() {
                    e.value = next.to_string();
                } else {
                    e.text = next.to_string();
                }
            }),
            MockEffect::Navigate { url, title } => self.navigate(tab, &url, Some(&title)),
            MockEffect::OpenTab { url, title } => self.tabs.push(MockTab::new(&url, &title)),
            MockEffect::WriteFile { path, contents } => {
                if let Some(parent) = path.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                std::fs::write(path, contents)?;
            }
            MockEffect::Sequence(effects) => {
                for effect in effects {
                    self.apply(tab, effect)?;
                }
            }
        }
        Ok(())
    }

    fn rerender(&mut self, tab: usize, selector: &str, texts: &[String]) {
        let key = Selector::parse(selector).raw();
        let template = self
            .elements
            .iter()
            .find(|e| e.selector == key && e.tab == tab)
            .cloned()
            .unwrap_or_else(|| MockElement::new(selector).in_tab(tab));
        self.elements.retain(|e| !(e.selector == key && e.tab == tab));
        for text in texts {
            let mut element = template.clone().text(text);
            element.appears_after = None;
            self.insert(element);
        }
    }

    fn click(&mut self, idx: usize) -> PageResult<()> {
        let element = &mut self.elements[idx];
        if !element.visible || !element.enabled {
            return Err(PageError::driver(format!(
                "element {} is not interactable",
                element.selector
            )));
        }
        let input_type = element.input_type.clone();
        match input_type.as_deref() {
            Some("checkbox") => element.checked = !element.checked,
            Some("radio") => {
                let group = element.attrs.get("name").cloned();
                let tab = element.tab;
                for other in self
                    .elements
                    .iter_mut()
                    .filter(|e| e.tab == tab && e.input_type.as_deref() == Some("radio"))
                {
                    if other.attrs.get("name") == group.as_ref() {
                        other.checked = false;
                    }
                }
                self.elements[idx].checked = true;
            }
            _ => {
                if element.attrs.get("role").is_some_and(|r| r == "switch") {
                    let on = element.is_checked();
                    element
                        .attrs
                        .insert("aria-checked".to_string(), (!on).to_string());
                }
            }
        }
        let tab = self.elements[idx].tab;
        let effects = self.elements[idx].on_click.clone();
        for effect in effects {
            self.apply(tab, effect)?;
        }
        Ok(())
    }
}

/// Mock driver for unit and workflow tests
#[derive(Debug, Default)]
pub struct MockDriver {
    state: Mutex<MockState>,
}

impl MockDriver {
    /// Create new mock driver with one blank tab
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add an element, builder style
    #[must_use]
    pub fn with_element(self, element: MockElement) -> Self {
        self.add(element);
        self
    }

    /// Add an element
    pub fn add(&self, element: MockElement) {
        self.lock().insert(element);
    }

    /// Remove every element answering to `selector`
    pub fn remove(&self, selector: &str) {
        let key = Selector::parse(selector).raw();
        self.lock().elements.retain(|e| e.selector != key);
    }

    /// Title reported after navigating to `url`
    pub fn set_page_title(&self, url: &str, title: &str) {
        self.lock().titles.insert(url.to_string(), title.to_string());
    }

    /// Report `readyState` as `loading` for this long from now
    pub fn page_ready_after(&self, delay: Duration) {
        self.lock().ready_at = Some(Instant::now() + delay);
    }

    /// Scripted result for scripts containing `fragment`
    pub fn on_script(&self, fragment: &str, value: serde_json::Value) {
        self.lock().scripts.push((fragment.to_string(), value));
    }

    /// Fail the next `times` actions on `selector` with a stale element error
    pub fn fail_stale(&self, selector: &str, times: u32) {
        self.lock()
            .stale
            .insert(Selector::parse(selector).raw(), times);
    }

    /// Fail every action on `selector` with a driver error
    pub fn fail_action(&self, selector: &str, message: &str) {
        self.lock()
            .failures
            .insert(Selector::parse(selector).raw(), message.to_string());
    }

    /// Bytes returned by screenshots
    pub fn set_screenshot(&self, png: Vec<u8>) {
        self.lock().screenshot = png;
    }

    /// Current `value` of the first element answering to `selector`, any tab
    #[must_use]
    pub fn value_of(&self, selector: &str) -> Option<String> {
        let key = Selector::parse(selector).raw();
        self.lock()
            .elements
            .iter()
            .find(|e| e.selector == key)
            .map(MockElement::current_value)
    }

    /// File names attached to the first file input answering to `selector`
    #[must_use]
    pub fn uploaded_files(&self, selector: &str) -> Vec<String> {
        let key = Selector::parse(selector).raw();
        self.lock()
            .elements
            .iter()
            .find(|e| e.selector == key)
            .map(|e| e.files.clone())
            .unwrap_or_default()
    }

    /// Whether the first element answering to `selector` is checked, any tab
    #[must_use]
    pub fn is_checked(&self, selector: &str) -> bool {
        let key = Selector::parse(selector).raw();
        self.lock()
            .elements
            .iter()
            .find(|e| e.selector == key)
            .is_some_and(MockElement::is_checked)
    }

    /// Get call history
    #[must_use]
    pub fn history(&self) -> Vec<String> {
        self.lock().calls.clone()
    }

    /// Check if method was called
    #[must_use]
    pub fn was_called(&self, method: &str) -> bool {
        self.lock().calls.iter().any(|c| c.starts_with(method))
    }

    /// Number of recorded calls starting with `prefix`
    #[must_use]
    pub fn call_count(&self, prefix: &str) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }

    /// Whether [`BrowserDriver::close`] was called
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    fn act<T>(
        &self,
        call: String,
        ctx: &SessionContext,
        selector: &Selector,
        f: impl FnOnce(&mut MockState, usize) -> PageResult<T>,
    ) -> PageResult<T> {
        let mut state = self.lock();
        state.calls.push(call);
        state.ensure_tab(ctx.tab)?;
        state.take_injected(selector)?;
        let idx = state.first(ctx, selector)?;
        f(&mut *state, idx)
    }

    fn page<T>(
        &self,
        call: String,
        ctx: &SessionContext,
        f: impl FnOnce(&mut MockState) -> PageResult<T>,
    ) -> PageResult<T> {
        let mut state = self.lock();
        state.calls.push(call);
        state.ensure_tab(ctx.tab)?;
        f(&mut *state)
    }
}

fn script_result(state: &MockState, script: &str) -> serde_json::Value {
    state
        .scripts
        .iter()
        .find(|(fragment, _)| script.contains(fragment.as_str()))
        .map(|(_, v)| v.clone())
        .unwrap_or(serde_json::Value::Null)
}

#[async_trait]
impl BrowserDriver for MockDriver {
    async fn navigate(&self, ctx: &SessionContext, url: &str) -> PageResult<()> {
        self.page(format!("navigate:{url}"), ctx, |s| {
            s.navigate(ctx.tab, url, None);
            Ok(())
        })
    }

    async fn current_url(&self, ctx: &SessionContext) -> PageResult<String> {
        self.page("current_url".to_string(), ctx, |s| {
            Ok(s.tabs[ctx.tab].current().0.clone())
        })
    }

    async fn title(&self, ctx: &SessionContext) -> PageResult<String> {
        self.page("title".to_string(), ctx, |s| Ok(s.tabs[ctx.tab].current().1.clone()))
    }

    async fn reload(&self, ctx: &SessionContext) -> PageResult<()> {
        self.page("reload".to_string(), ctx, |_| Ok(()))
    }

    async fn go_back(&self, ctx: &SessionContext) -> PageResult<()> {
        self.page("go_back".to_string(), ctx, |s| {
            let tab = &mut s.tabs[ctx.tab];
            tab.position = tab.position.saturating_sub(1);
            Ok(())
        })
    }

    async fn go_forward(&self, ctx: &SessionContext) -> PageResult<()> {
        self.page("go_forward".to_string(), ctx, |s| {
            let tab = &mut s.tabs[ctx.tab];
            if tab.position + 1 < tab.history.len() {
                tab.position += 1;
            }
            Ok(())
        })
    }

    async fn execute_js(
        &self,
        ctx: &SessionContext,
        script: &str,
    ) -> PageResult<serde_json::Value> {
        self.page(format!("execute_js:{script}"), ctx, |s| Ok(script_result(s, script)))
    }

    async fn evaluate_on(
        &self,
        ctx: &SessionContext,
        selector: &Selector,
        body: &str,
    ) -> PageResult<serde_json::Value> {
        self.act(format!("evaluate_on:{selector}"), ctx, selector, |s, _| {
            Ok(script_result(s, body))
        })
    }

    async fn ready_state(&self, ctx: &SessionContext) -> PageResult<String> {
        let state = self.lock();
        state.ensure_tab(ctx.tab)?;
        let loading = state.ready_at.is_some_and(|at| Instant::now() < at);
        Ok(if loading { "loading" } else { "complete" }.to_string())
    }

    async fn probe(&self, ctx: &SessionContext, selector: &Selector) -> PageResult<ElementState> {
        let state = self.lock();
        state.ensure_tab(ctx.tab)?;
        let matches = state.matches(ctx, selector);
        Ok(match matches.first() {
            None => ElementState::absent(),
            Some(&idx) => {
                let e = &state.elements[idx];
                ElementState {
                    count: matches.len(),
                    visible: e.visible,
                    enabled: e.enabled,
                    checked: e.is_checked(),
                    readonly: e.readonly,
                }
            }
        })
    }

    async fn click(
        &self,
        ctx: &SessionContext,
        selector: &Selector,
        kind: ClickKind,
    ) -> PageResult<()> {
        self.act(format!("{}:{selector}", kind.name()), ctx, selector, |s, idx| {
            match kind {
                ClickKind::Context => Ok(()),
                ClickKind::Single | ClickKind::Double => s.click(idx),
            }
        })
    }

    async fn click_nth(
        &self,
        ctx: &SessionContext,
        selector: &Selector,
        index: usize,
    ) -> PageResult<()> {
        self.act(format!("click_nth:{selector}:{index}"), ctx, selector, |s, _| {
            let matches = s.matches(ctx, selector);
            let idx = *matches.get(index).ok_or_else(|| {
                PageError::invalid_argument(format!(
                    "index {index} out of range for {selector} ({} matches)",
                    matches.len()
                ))
            })?;
            s.click(idx)
        })
    }

    async fn hover(&self, ctx: &SessionContext, selector: &Selector) -> PageResult<()> {
        self.act(format!("hover:{selector}"), ctx, selector, |s, idx| {
            let tab = s.elements[idx].tab;
            for effect in s.elements[idx].on_hover.clone() {
                s.apply(tab, effect)?;
            }
            Ok(())
        })
    }

    async fn focus(&self, ctx: &SessionContext, selector: &Selector) -> PageResult<()> {
        self.act(format!("focus:{selector}"), ctx, selector, |_, _| Ok(()))
    }

    async fn scroll_into_view(&self, ctx: &SessionContext, selector: &Selector) -> PageResult<()> {
        self.act(format!("scroll_into_view:{selector}"), ctx, selector, |_, _| Ok(()))
    }

    async fn clear(&self, ctx: &SessionContext, selector: &Selector) -> PageResult<()> {
        self.act(format!("clear:{selector}"), ctx, selector, |s, idx| {
            let e = &mut s.elements[idx];
            if e.is_form_field() {
                e.value.clear();
            } else {
                e.text.clear();
            }
            Ok(())
        })
    }

    async fn type_text(
        &self,
        ctx: &SessionContext,
        selector: &Selector,
        text: &str,
    ) -> PageResult<()> {
        self.act(format!("type_text:{selector}:{text}"), ctx, selector, |s, idx| {
            let e = &mut s.elements[idx];
            if !e.is_editable() || !e.enabled || e.readonly {
                return Err(PageError::driver(format!(
                    "element {} does not accept text",
                    e.selector
                )));
            }
            if e.is_form_field() {
                e.value.push_str(text);
            } else {
                e.text.push_str(text);
            }
            Ok(())
        })
    }

    async fn set_value(
        &self,
        ctx: &SessionContext,
        selector: &Selector,
        value: &str,
    ) -> PageResult<()> {
        self.act(format!("set_value:{selector}:{value}"), ctx, selector, |s, idx| {
            s.elements[idx].value = value.to_string();
            Ok(())
        })
    }

    async fn press_key(
        &self,
        ctx: &SessionContext,
        selector: &Selector,
        key: Key,
    ) -> PageResult<()> {
        self.act(format!("press_key:{selector}:{}", key.dom_code()), ctx, selector, |s, idx| {
            let tab = s.elements[idx].tab;
            let effects: Vec<MockEffect> = s.elements[idx]
                .on_key
                .iter()
                .filter(|(k, _)| *k == key)
                .map(|(_, e)| e.clone())
                .collect();
            for effect in effects {
                s.apply(tab, effect)?;
            }
            Ok(())
        })
    }

    async fn text(&self, ctx: &SessionContext, selector: &Selector) -> PageResult<String> {
        self.act(format!("text:{selector}"), ctx, selector, |s, idx| {
            Ok(s.elements[idx].display_text())
        })
    }

    async fn texts(&self, ctx: &SessionContext, selector: &Selector) -> PageResult<Vec<String>> {
        let mut state = self.lock();
        state.calls.push(format!("texts:{selector}"));
        state.ensure_tab(ctx.tab)?;
        state.take_injected(selector)?;
        Ok(state
            .matches(ctx, selector)
            .into_iter()
            .map(|idx| state.elements[idx].display_text())
            .collect())
    }

    async fn value(&self, ctx: &SessionContext, selector: &Selector) -> PageResult<String> {
        self.act(format!("value:{selector}"), ctx, selector, |s, idx| {
            Ok(s.elements[idx].current_value())
        })
    }

    async fn attribute(
        &self,
        ctx: &SessionContext,
        selector: &Selector,
        name: &str,
    ) -> PageResult<Option<String>> {
        self.act(format!("attribute:{selector}:{name}"), ctx, selector, |s, idx| {
            Ok(s.elements[idx].attribute(name))
        })
    }

    async fn attributes(
        &self,
        ctx: &SessionContext,
        selector: &Selector,
        name: &str,
    ) -> PageResult<Vec<Option<String>>> {
        let mut state = self.lock();
        state.calls.push(format!("attributes:{selector}:{name}"));
        state.ensure_tab(ctx.tab)?;
        state.take_injected(selector)?;
        Ok(state
            .matches(ctx, selector)
            .into_iter()
            .map(|idx| state.elements[idx].attribute(name))
            .collect())
    }

    async fn css_value(
        &self,
        ctx: &SessionContext,
        selector: &Selector,
        property: &str,
    ) -> PageResult<String> {
        self.act(format!("css_value:{selector}:{property}"), ctx, selector, |s, idx| {
            Ok(s.elements[idx].css.get(property).cloned().unwrap_or_default())
        })
    }

    async fn options(
        &self,
        ctx: &SessionContext,
        selector: &Selector,
    ) -> PageResult<Vec<SelectOption>> {
        self.act(format!("options:{selector}"), ctx, selector, |s, idx| {
            Ok(s.elements[idx].options.clone())
        })
    }

    async fn select_option(
        &self,
        ctx: &SessionContext,
        selector: &Selector,
        option: &OptionMatch,
    ) -> PageResult<()> {
        self.act(format!("select_option:{selector}:{option}"), ctx, selector, |s, idx| {
            let e = &mut s.elements[idx];
            let pos = option.position(&e.options).ok_or_else(|| {
                PageError::invalid_argument(format!("no option with {option} in {}", e.selector))
            })?;
            if e.options[pos].disabled {
                return Err(PageError::invalid_state(format!(
                    "option with {option} is disabled"
                )));
            }
            if !e.multiple {
                for o in &mut e.options {
                    o.selected = false;
                }
            }
            e.options[pos].selected = true;
            Ok(())
        })
    }

    async fn deselect_option(
        &self,
        ctx: &SessionContext,
        selector: &Selector,
        option: Option<&OptionMatch>,
    ) -> PageResult<()> {
        let call = match option {
            Some(o) => format!("deselect_option:{selector}:{o}"),
            None => format!("deselect_option:{selector}:all"),
        };
        self.act(call, ctx, selector, |s, idx| {
            let e = &mut s.elements[idx];
            if !e.multiple {
                return Err(PageError::invalid_state(
                    "only options of a multi-select can be deselected",
                ));
            }
            match option {
                None => e.options.iter_mut().for_each(|o| o.selected = false),
                Some(m) => {
                    let pos = m.position(&e.options).ok_or_else(|| {
                        PageError::invalid_argument(format!("no option with {m}"))
                    })?;
                    e.options[pos].selected = false;
                }
            }
            Ok(())
        })
    }

    async fn upload_files(
        &self,
        ctx: &SessionContext,
        selector: &Selector,
        paths: &[PathBuf],
    ) -> PageResult<()> {
        self.act(format!("upload_files:{selector}"), ctx, selector, |s, idx| {
            let e = &mut s.elements[idx];
            if e.input_type.as_deref() != Some("file") {
                return Err(PageError::driver(format!(
                    "element {} is not a file input",
                    e.selector
                )));
            }
            e.files = paths
                .iter()
                .filter_map(|p| p.file_name())
                .map(|n| n.to_string_lossy().into_owned())
                .collect();
            e.value = e
                .files
                .first()
                .map(|n| format!("C:\\fakepath\\{n}"))
                .unwrap_or_default();
            Ok(())
        })
    }

    async fn screenshot(&self, ctx: &SessionContext) -> PageResult<Vec<u8>> {
        self.page("screenshot".to_string(), ctx, |s| Ok(s.screenshot.clone()))
    }

    async fn tab_count(&self) -> PageResult<usize> {
        Ok(self.lock().tabs.len())
    }

    async fn close_tab(&self, index: usize) -> PageResult<()> {
        let mut state = self.lock();
        state.calls.push(format!("close_tab:{index}"));
        state.ensure_tab(index)?;
        state.tabs.remove(index);
        state.elements.retain(|e| e.tab != index);
        for element in &mut state.elements {
            if element.tab > index {
                element.tab -= 1;
            }
        }
        Ok(())
    }

    async fn close(&self) -> PageResult<()> {
        let mut state = self.lock();
        state.calls.push("close".to_string());
        state.closed = true;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn top() -> SessionContext {
        SessionContext::default()
    }

    #[tokio::test]
    async fn test_mock_driver_navigate() {
        let driver = MockDriver::new();
        driver.set_page_title("https://example.com", "Example");
        driver.navigate(&top(), "https://example.com").await.unwrap();
        assert_eq!(driver.current_url(&top()).await.unwrap(), "https://example.com");
        assert_eq!(driver.title(&top()).await.unwrap(), "Example");
        assert!(driver.was_called("navigate"));
    }

    #[tokio::test]
    async fn test_mock_driver_history_tracking() {
        let driver = MockDriver::new();
        driver.navigate(&top(), "https://a.test").await.unwrap();
        driver.navigate(&top(), "https://b.test").await.unwrap();
        driver.go_back(&top()).await.unwrap();
        assert_eq!(driver.current_url(&top()).await.unwrap(), "https://a.test");
        driver.go_forward(&top()).await.unwrap();
        assert_eq!(driver.current_url(&top()).await.unwrap(), "https://b.test");
        assert_eq!(driver.call_count("navigate"), 2);
    }

    #[tokio::test]
    async fn test_probe_absent_is_not_an_error() {
        let driver = MockDriver::new();
        let state = driver.probe(&top(), &Selector::css("#none")).await.unwrap();
        assert!(!state.exists());
    }

    #[tokio::test]
    async fn test_action_on_absent_is_not_found() {
        let driver = MockDriver::new();
        let err = driver
            .click(&top(), &Selector::css("#none"), ClickKind::Single)
            .await
            .unwrap_err();
        assert!(matches!(err, PageError::ElementNotFound { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_appears_after_delay() {
        let driver = MockDriver::new()
            .with_element(MockElement::new("#late").appears_after(Duration::from_secs(2)));
        let sel = Selector::css("#late");
        assert!(!driver.probe(&top(), &sel).await.unwrap().exists());
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(driver.probe(&top(), &sel).await.unwrap().exists());
    }

    #[tokio::test]
    async fn test_stale_injection_counts_down() {
        let driver = MockDriver::new().with_element(MockElement::new("#x").text("hi"));
        driver.fail_stale("#x", 1);
        let sel = Selector::css("#x");
        assert!(driver.text(&top(), &sel).await.unwrap_err().is_stale());
        assert_eq!(driver.text(&top(), &sel).await.unwrap(), "hi");
    }

    #[tokio::test]
    async fn test_click_effects_and_checkbox() {
        let driver = MockDriver::new()
            .with_element(MockElement::new("#agree").checkbox())
            .with_element(
                MockElement::new("#open").on_click(MockEffect::Show("#menu".to_string())),
            )
            .with_element(MockElement::new("#menu").hidden());
        driver
            .click(&top(), &Selector::css("#agree"), ClickKind::Single)
            .await
            .unwrap();
        assert!(driver.probe(&top(), &Selector::css("#agree")).await.unwrap().checked);
        driver
            .click(&top(), &Selector::css("#open"), ClickKind::Single)
            .await
            .unwrap();
        assert!(driver.probe(&top(), &Selector::css("#menu")).await.unwrap().visible);
    }

    #[tokio::test]
    async fn test_radio_group_is_exclusive() {
        let driver = MockDriver::new()
            .with_element(MockElement::new("#a").radio("trip").checked())
            .with_element(MockElement::new("#b").radio("trip"));
        driver
            .click(&top(), &Selector::css("#b"), ClickKind::Single)
            .await
            .unwrap();
        assert!(!driver.probe(&top(), &Selector::css("#a")).await.unwrap().checked);
        assert!(driver.probe(&top(), &Selector::css("#b")).await.unwrap().checked);
    }

    #[tokio::test]
    async fn test_open_tab_and_close() {
        let driver = MockDriver::new()
            .with_element(MockElement::new("#popup").on_click(MockEffect::OpenTab {
                url: "https://b.test".to_string(),
                title: "B".to_string(),
            }))
            .with_element(MockElement::new("#only-in-b").in_tab(1));
        driver
            .click(&top(), &Selector::css("#popup"), ClickKind::Single)
            .await
            .unwrap();
        assert_eq!(driver.tab_count().await.unwrap(), 2);
        assert_eq!(driver.title(&SessionContext::tab(1)).await.unwrap(), "B");
        driver.close_tab(0).await.unwrap();
        assert_eq!(driver.tab_count().await.unwrap(), 1);
        assert!(driver
            .probe(&top(), &Selector::css("#only-in-b"))
            .await
            .unwrap()
            .exists());
    }

    #[tokio::test]
    async fn test_frames_scope_elements() {
        let driver = MockDriver::new()
            .with_element(MockElement::new("body").in_frame("iframe#editor").text("inside"));
        let sel = Selector::css("body");
        assert!(!driver.probe(&top(), &sel).await.unwrap().exists());
        let inner = top().with_frame(Selector::css("iframe#editor"));
        assert_eq!(driver.text(&inner, &sel).await.unwrap(), "inside");
    }

    #[tokio::test]
    async fn test_single_select_replaces_selection() {
        let driver = MockDriver::new().with_element(MockElement::new("#s").select(vec![
            SelectOption::with_value("Option 1", "1").selected(),
            SelectOption::with_value("Option 2", "2"),
        ]));
        let sel = Selector::css("#s");
        driver
            .select_option(&top(), &sel, &OptionMatch::Index(1))
            .await
            .unwrap();
        assert_eq!(driver.value(&top(), &sel).await.unwrap(), "2");
        assert_eq!(driver.text(&top(), &sel).await.unwrap(), "Option 2");
        let err = driver.deselect_option(&top(), &sel, None).await.unwrap_err();
        assert!(matches!(err, PageError::InvalidState { .. }));
    }

    #[tokio::test]
    async fn test_rerender_collection() {
        let driver = MockDriver::new()
            .with_element(MockElement::new(".price").text("300"))
            .with_element(MockElement::new(".price").text("100"))
            .with_element(MockElement::new("#sort").on_click(MockEffect::SetTexts(
                ".price".to_string(),
                vec!["100".to_string(), "300".to_string()],
            )));
        driver
            .click(&top(), &Selector::css("#sort"), ClickKind::Single)
            .await
            .unwrap();
        assert_eq!(
            driver.texts(&top(), &Selector::css(".price")).await.unwrap(),
            vec!["100", "300"]
        );
    }

    #[tokio::test]
    async fn test_increment_respects_max() {
        let driver = MockDriver::new()
            .with_element(MockElement::new("#qty").input("number").value("2").attr("max", "3"))
            .with_element(
                MockElement::new("#plus").on_click(MockEffect::Increment("#qty".to_string(), 1)),
            );
        for _ in 0..3 {
            driver
                .click(&top(), &Selector::css("#plus"), ClickKind::Single)
                .await
                .unwrap();
        }
        assert_eq!(driver.value_of("#qty").as_deref(), Some("3"));
    }
}
