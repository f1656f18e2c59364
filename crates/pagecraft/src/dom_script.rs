//! Scripts evaluated in the page.
//!
//! The Chromium backend never holds remote node handles between calls. Each
//! element operation is one self-contained expression that resolves the
//! frame path and selector from scratch, binds the match, and runs a body.
//! Failures inside the page are thrown as `pagecraft:<reason>` strings and
//! mapped back with [`classify_failure`].

use crate::locator::Selector;
use serde_json::{json, Value};

/// Submit the form owning `el`, through its submit button when `el` is one
pub const SUBMIT_FORM: &str = r#"
const form = el.form || el.closest('form');
if (!form) throw new Error('pagecraft:no-form');
if (typeof form.requestSubmit === 'function') {
  form.requestSubmit(el.type === 'submit' ? el : undefined);
} else {
  form.submit();
}
return true;"#;

/// `true` once an image finished loading with a usable bitmap
pub const IMAGE_LOADED: &str = "return el.complete && el.naturalWidth > 0;";

/// Intrinsic image size as `[width, height]`
pub const IMAGE_NATURAL_SIZE: &str = "return [el.naturalWidth, el.naturalHeight];";

/// Snapshot of every match; evaluated with [`all_script`]
pub const PROBE: &str = r#"
const el = __all[0];
if (!el) return { count: 0, visible: false, enabled: false, checked: false, readonly: false };
const style = (el.ownerDocument.defaultView || window).getComputedStyle(el);
const rect = el.getBoundingClientRect();
const visible = el.isConnected && style.display !== 'none' && style.visibility !== 'hidden'
  && parseFloat(style.opacity || '1') > 0 && rect.width > 0 && rect.height > 0;
const enabled = !el.disabled && el.getAttribute('aria-disabled') !== 'true'
  && !(el.closest && el.closest('fieldset[disabled]'));
const checked = el.checked === true || el.getAttribute('aria-checked') === 'true';
const readonly = el.readOnly === true || el.getAttribute('aria-readonly') === 'true';
return { count: __all.length, visible, enabled, checked, readonly };"#;

/// Scroll into view and return the viewport centre as `[x, y]`
///
/// Offsets of enclosing same-origin frames are added so the point can be
/// fed to `Input.dispatchMouseEvent` on the top-level page.
pub const CLICK_POINT: &str = r#"
el.scrollIntoView({ block: 'center', inline: 'center' });
const rect = el.getBoundingClientRect();
if (rect.width === 0 && rect.height === 0) throw new Error('pagecraft:not-interactable');
let x = rect.left + rect.width / 2;
let y = rect.top + rect.height / 2;
let view = el.ownerDocument.defaultView;
while (view && view.frameElement) {
  const frame = view.frameElement;
  const outer = frame.getBoundingClientRect();
  x += outer.left + frame.clientLeft;
  y += outer.top + frame.clientTop;
  view = view.parent;
}
return [x, y];"#;

/// Focus `el`
pub const FOCUS: &str = "el.focus(); return true;";

/// Scroll `el` to the middle of the viewport
pub const SCROLL_INTO_VIEW: &str =
    "el.scrollIntoView({ block: 'center', inline: 'nearest' }); return true;";

/// Focus `el` and put the caret after its current content
pub const FOCUS_END: &str = r#"
el.focus();
if (typeof el.setSelectionRange === 'function' && typeof el.value === 'string') {
  try { el.setSelectionRange(el.value.length, el.value.length); } catch (_) {}
} else if (el.isContentEditable) {
  const range = el.ownerDocument.createRange();
  range.selectNodeContents(el);
  range.collapse(false);
  const selection = el.ownerDocument.getSelection();
  selection.removeAllRanges();
  selection.addRange(range);
}
return true;"#;

/// Empty a field or editable region and fire `input` and `change`
pub const CLEAR: &str = r#"
if (el.isContentEditable) {
  el.textContent = '';
} else {
  const proto = Object.getPrototypeOf(el);
  const setter = Object.getOwnPropertyDescriptor(proto, 'value');
  if (setter && setter.set) setter.set.call(el, ''); else el.value = '';
}
el.dispatchEvent(new Event('input', { bubbles: true }));
el.dispatchEvent(new Event('change', { bubbles: true }));
return true;"#;

/// Text of `el`; form fields report their value
pub const TEXT: &str = r#"
if (el.matches('input, textarea, select')) return String(el.value ?? '');
return (el.innerText ?? el.textContent ?? '').trim();"#;

/// Text of every match; evaluated with [`all_script`]
pub const TEXTS: &str = r#"
return __all.map(el => el.matches('input, textarea, select')
  ? String(el.value ?? '')
  : (el.innerText ?? el.textContent ?? '').trim());"#;

/// `value` property, falling back to the attribute
pub const VALUE: &str =
    "return 'value' in el ? String(el.value ?? '') : (el.getAttribute('value') ?? '');";

/// Options of a select element
pub const OPTIONS: &str = r#"
if (!el.options) throw new Error('pagecraft:not-select');
return Array.from(el.options).map(o => ({
  text: (o.text || '').trim(),
  value: o.value,
  selected: o.selected,
  disabled: o.disabled,
}));"#;

/// Assign `value` through the native setter and fire `input` and `change`
#[must_use]
pub fn set_value(value: &str) -> String {
    format!(
        r#"
const value = {value};
const proto = Object.getPrototypeOf(el);
const setter = Object.getOwnPropertyDescriptor(proto, 'value');
if (setter && setter.set) setter.set.call(el, value); else el.value = value;
el.dispatchEvent(new Event('input', {{ bubbles: true }}));
el.dispatchEvent(new Event('change', {{ bubbles: true }}));
return true;"#,
        value = js_string(value)
    )
}

/// Attribute of `el`, `null` when absent
#[must_use]
pub fn attribute(name: &str) -> String {
    format!("return el.getAttribute({});", js_string(name))
}

/// Attribute of every match; evaluated with [`all_script`]
#[must_use]
pub fn attributes(name: &str) -> String {
    format!("return __all.map(el => el.getAttribute({}));", js_string(name))
}

/// Computed style property of `el`
#[must_use]
pub fn css_value(property: &str) -> String {
    format!(
        "return (el.ownerDocument.defaultView || window).getComputedStyle(el).getPropertyValue({});",
        js_string(property)
    )
}

/// How a select option is identified inside a script
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionKey<'a> {
    /// Visible text
    Text(&'a str),
    /// `value` attribute
    Value(&'a str),
    /// Position
    Index(usize),
}

impl OptionKey<'_> {
    fn to_json(self) -> Value {
        match self {
            Self::Text(t) => json!({ "text": t }),
            Self::Value(v) => json!({ "value": v }),
            Self::Index(i) => json!({ "index": i }),
        }
    }
}

const OPTION_FINDER: &str = r#"
const __find = (key) => {
  const options = Array.from(el.options);
  if ('index' in key) return options[key.index];
  if ('value' in key) return options.find(o => o.value === key.value);
  return options.find(o => (o.text || '').trim() === key.text);
};"#;

/// Select one option; single selects drop their previous selection
#[must_use]
pub fn select_option(key: OptionKey<'_>) -> String {
    format!(
        r#"
if (!el.options) throw new Error('pagecraft:not-select');
{OPTION_FINDER}
const option = __find({key});
if (!option) throw new Error('pagecraft:no-option');
if (option.disabled) throw new Error('pagecraft:disabled-option');
if (!el.multiple) Array.from(el.options).forEach(o => {{ o.selected = false; }});
option.selected = true;
el.dispatchEvent(new Event('input', {{ bubbles: true }}));
el.dispatchEvent(new Event('change', {{ bubbles: true }}));
return true;"#,
        key = key.to_json()
    )
}

/// Deselect one option, or all of them for `None`; multi-selects only
#[must_use]
pub fn deselect_option(key: Option<OptionKey<'_>>) -> String {
    let key = key.map_or(Value::Null, OptionKey::to_json);
    format!(
        r#"
if (!el.options) throw new Error('pagecraft:not-select');
if (!el.multiple) throw new Error('pagecraft:single-select');
{OPTION_FINDER}
const key = {key};
if (key === null) {{
  Array.from(el.options).forEach(o => {{ o.selected = false; }});
}} else {{
  const option = __find(key);
  if (!option) throw new Error('pagecraft:no-option');
  option.selected = false;
}}
el.dispatchEvent(new Event('change', {{ bubbles: true }}));
return true;"#
    )
}

/// Check that `el` is a file input before files are attached
pub const FILE_INPUT_GUARD: &str = r#"
if (el.tagName !== 'INPUT' || el.type !== 'file') throw new Error('pagecraft:not-file-input');
return el;"#;

/// Expression for a plain document-level script
///
/// `doc` is bound to the document of the innermost frame; the script runs
/// as a function body so `return` works.
#[must_use]
pub fn document_script(frames: &[Selector], body: &str) -> String {
    format!(
        "(() => {{\n{prelude}\nconst doc = __doc;\nreturn (function () {{ {body} \n}}).call(doc);\n}})()",
        prelude = frame_prelude(frames)
    )
}

/// Expression binding every match of `selector` to `__all`
#[must_use]
pub fn all_script(frames: &[Selector], selector: &Selector, body: &str) -> String {
    format!(
        "(() => {{\n{prelude}\nconst __all = __resolve(__doc, {steps});\n{body}\n}})()",
        prelude = frame_prelude(frames),
        steps = steps_json(selector)
    )
}

/// Expression binding the match at `index` to `el`
///
/// Throws `pagecraft:not-found` when fewer matches exist and
/// `pagecraft:stale` when the node is detached by the time it is bound.
#[must_use]
pub fn element_script(
    frames: &[Selector],
    selector: &Selector,
    index: usize,
    body: &str,
) -> String {
    format!(
        "(() => {{\n{prelude}\nconst __all = __resolve(__doc, {steps});\n\
         const el = __all[{index}];\n\
         if (!el) throw new Error('{NOT_FOUND}');\n\
         if (!el.isConnected) throw new Error('{STALE}');\n\
         return (function () {{ {body} \n}})();\n}})()",
        prelude = frame_prelude(frames),
        steps = steps_json(selector)
    )
}

const NOT_FOUND: &str = "pagecraft:not-found";
const STALE: &str = "pagecraft:stale";
const FRAME_MISSING: &str = "pagecraft:frame-missing";

const RESOLVER: &str = r#"
const __query = (root, step) => {
  if (step.xpath) {
    const owner = root.ownerDocument || root;
    const snap = owner.evaluate(step.expr, root, null, XPathResult.ORDERED_NODE_SNAPSHOT_TYPE, null);
    const out = [];
    for (let i = 0; i < snap.snapshotLength; i++) out.push(snap.snapshotItem(i));
    return out;
  }
  return Array.from(root.querySelectorAll(step.expr));
};
const __resolve = (root, steps) => {
  let nodes = [root];
  for (const step of steps) {
    const next = [];
    for (const node of nodes) {
      for (const found of __query(node, step)) {
        if (!next.includes(found)) next.push(found);
      }
    }
    nodes = next;
  }
  return nodes;
};"#;

fn frame_prelude(frames: &[Selector]) -> String {
    let mut prelude = format!("{RESOLVER}\nlet __doc = document;");
    for frame in frames {
        prelude.push_str(&format!(
            "\n{{ const frame = __resolve(__doc, {steps})[0];\n\
             if (!frame || !frame.contentDocument) throw new Error('{FRAME_MISSING}');\n\
             __doc = frame.contentDocument; }}",
            steps = steps_json(frame)
        ));
    }
    prelude
}

/// Selector as resolution steps: each step is queried inside every match of
/// the previous one
fn steps(selector: &Selector, out: &mut Vec<Value>) {
    match selector {
        Selector::Within { parent, child } => {
            steps(parent, out);
            steps(child, out);
        }
        other => out.push(json!({ "expr": other.expression(), "xpath": other.is_xpath() })),
    }
}

fn steps_json(selector: &Selector) -> String {
    let mut out = Vec::new();
    steps(selector, &mut out);
    Value::Array(out).to_string()
}

/// JavaScript string literal for `value`
#[must_use]
pub fn js_string(value: &str) -> String {
    Value::String(value.to_string()).to_string()
}

/// Why a page script failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptFailure {
    /// The selector matched nothing at the requested index
    NotFound,
    /// The node went away during the call, or the document was replaced
    Stale,
    /// A frame on the context's path is missing or cross-origin
    FrameMissing,
    /// No option matched
    NoOption,
    /// The option is disabled
    DisabledOption,
    /// Deselect on a single select
    SingleSelect,
    /// Select operation on a non-select element
    NotSelect,
    /// Upload target is not `<input type=file>`
    NotFileInput,
    /// Zero-size element cannot receive pointer input
    NotInteractable,
    /// No enclosing form
    NoForm,
    /// Anything else, including exceptions from caller scripts
    Other,
}

/// Map an evaluation error message to a [`ScriptFailure`]
#[must_use]
pub fn classify_failure(message: &str) -> ScriptFailure {
    const MARKERS: [(&str, ScriptFailure); 10] = [
        (NOT_FOUND, ScriptFailure::NotFound),
        (STALE, ScriptFailure::Stale),
        (FRAME_MISSING, ScriptFailure::FrameMissing),
        ("pagecraft:no-option", ScriptFailure::NoOption),
        ("pagecraft:disabled-option", ScriptFailure::DisabledOption),
        ("pagecraft:single-select", ScriptFailure::SingleSelect),
        ("pagecraft:not-select", ScriptFailure::NotSelect),
        ("pagecraft:not-file-input", ScriptFailure::NotFileInput),
        ("pagecraft:not-interactable", ScriptFailure::NotInteractable),
        ("pagecraft:no-form", ScriptFailure::NoForm),
    ];
    if let Some((_, failure)) = MARKERS.iter().find(|(m, _)| message.contains(m)) {
        return *failure;
    }
    // Navigation mid-call tears down the execution context.
    let lowered = message.to_ascii_lowercase();
    if lowered.contains("execution context was destroyed")
        || lowered.contains("cannot find context with specified id")
        || lowered.contains("no node with given id")
    {
        return ScriptFailure::Stale;
    }
    ScriptFailure::Other
}
