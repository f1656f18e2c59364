//! Rich text editors.
//!
//! TinyMCE and CKEditor are driven through their JavaScript APIs in the top
//! window. Quill and plain `contenteditable` editors are driven on the editor
//! element itself, inside the editor's iframe when one is configured. The
//! iframe is entered with a derived [`SessionContext`]; the session's own
//! context is never switched.

use crate::dom_script::js_string;
use crate::driver::{BrowserDriver, SessionContext};
use crate::element::{Element, ElementKind};
use crate::locator::Locator;
use crate::result::{PageError, PageResult};
use crate::session::Session;
use crate::wait::ElementCondition;
use std::fmt;
use tracing::{debug, info};

/// Editor implementation behind the element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorKind {
    /// TinyMCE (`tinymce.activeEditor`)
    TinyMce,
    /// CKEditor 4 (`CKEDITOR.instances`)
    CkEditor,
    /// Quill (`.ql-editor` plus toolbar buttons)
    Quill,
    /// Any `contenteditable` host
    Generic,
}

/// Inline formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextFormat {
    /// Bold
    Bold,
    /// Italic
    Italic,
    /// Underline
    Underline,
}

impl TextFormat {
    const fn command(self) -> &'static str {
        match self {
            Self::Bold => "bold",
            Self::Italic => "italic",
            Self::Underline => "underline",
        }
    }
}

const CKEDITOR_INSTANCE: &str = "CKEDITOR.instances[Object.keys(CKEDITOR.instances)[0]]";

/// Rich text editor with an optional hosting iframe
#[derive(Debug, Clone)]
pub struct RichTextEditor {
    editor: Element,
    frame: Option<Locator>,
    kind: EditorKind,
}

impl RichTextEditor {
    /// Editor hosted directly in the page
    #[must_use]
    pub fn new(locator: &str, name: &str, kind: EditorKind) -> Self {
        Self {
            editor: Element::of_kind(ElementKind::RichTextEditor, locator, name),
            frame: None,
            kind,
        }
    }

    /// Editor element lives inside the iframe matched by `frame`
    #[must_use]
    pub fn in_frame(mut self, frame: &str) -> Self {
        self.frame = Some(Locator::new(frame));
        self
    }

    /// Editor kind
    #[must_use]
    pub const fn kind(&self) -> EditorKind {
        self.kind
    }

    fn context<D: BrowserDriver>(&self, session: &Session<D>) -> SessionContext {
        match &self.frame {
            Some(frame) => session.context().with_frame(frame.selector().clone()),
            None => session.context().clone(),
        }
    }

    async fn ready_in_context<D: BrowserDriver>(
        &self,
        session: &Session<D>,
        ctx: &SessionContext,
    ) -> PageResult<()> {
        let waiter = session.element_waiter(self.editor.locator());
        let result = waiter
            .for_element(
                session.driver(),
                ctx,
                self.editor.selector(),
                &ElementCondition::Exists,
            )
            .await;
        if result.success {
            Ok(())
        } else {
            Err(PageError::Timeout {
                element: self.editor.name().to_string(),
                condition: ElementCondition::Exists.to_string(),
                timeout_ms: waiter.options().timeout_ms(),
            })
        }
    }

    /// Run a function body on the editor element inside its frame
    async fn on_editor<D: BrowserDriver>(
        &self,
        session: &Session<D>,
        action: &str,
        body: &str,
    ) -> PageResult<serde_json::Value> {
        let ctx = self.context(session);
        self.ready_in_context(session, &ctx).await?;
        let (driver, ctx, selector) = (session.driver(), &ctx, self.editor.selector());
        self.editor
            .execute_with_retry(session, action, move || driver.evaluate_on(ctx, selector, body))
            .await
    }

    async fn api<D: BrowserDriver>(
        &self,
        session: &Session<D>,
        script: &str,
    ) -> PageResult<serde_json::Value> {
        session.execute_js(script).await
    }

    /// Replace the content
    pub async fn set_text<D: BrowserDriver>(
        &self,
        session: &Session<D>,
        text: &str,
    ) -> PageResult<()> {
        info!(element = self.editor.name(), kind = ?self.kind, "Setting editor content");
        let literal = js_string(text);
        match self.kind {
            EditorKind::TinyMce => {
                self.api(session, &format!("tinymce.activeEditor.setContent({literal})"))
                    .await?;
            }
            EditorKind::CkEditor => {
                self.api(session, &format!("{CKEDITOR_INSTANCE}.setData({literal})"))
                    .await?;
            }
            EditorKind::Quill => {
                self.on_editor(session, "set_text", &format!("el.innerHTML = {literal};"))
                    .await?;
            }
            EditorKind::Generic => {
                self.clear(session).await?;
                self.type_in_frame(session, text).await?;
            }
        }
        Ok(())
    }

    async fn type_in_frame<D: BrowserDriver>(
        &self,
        session: &Session<D>,
        text: &str,
    ) -> PageResult<()> {
        let ctx = self.context(session);
        self.ready_in_context(session, &ctx).await?;
        let (driver, ctx, selector) = (session.driver(), &ctx, self.editor.selector());
        self.editor
            .execute_with_retry(session, "type_text", move || driver.type_text(ctx, selector, text))
            .await
    }

    /// Insert at the caret
    pub async fn insert_text<D: BrowserDriver>(
        &self,
        session: &Session<D>,
        text: &str,
    ) -> PageResult<()> {
        let literal = js_string(text);
        match self.kind {
            EditorKind::TinyMce => {
                self.api(session, &format!("tinymce.activeEditor.insertContent({literal})"))
                    .await?;
            }
            EditorKind::CkEditor => {
                self.api(session, &format!("{CKEDITOR_INSTANCE}.insertText({literal})"))
                    .await?;
            }
            EditorKind::Quill | EditorKind::Generic => self.type_in_frame(session, text).await?,
        }
        Ok(())
    }

    /// Current content as HTML
    pub async fn html<D: BrowserDriver>(&self, session: &Session<D>) -> PageResult<String> {
        let value = match self.kind {
            EditorKind::TinyMce => {
                self.api(session, "return tinymce.activeEditor.getContent()")
                    .await?
            }
            EditorKind::CkEditor => {
                self.api(session, &format!("return {CKEDITOR_INSTANCE}.getData()"))
                    .await?
            }
            EditorKind::Quill | EditorKind::Generic => {
                self.on_editor(session, "html", "return el.innerHTML;").await?
            }
        };
        let html = value.as_str().unwrap_or_default().to_string();
        debug!(element = self.editor.name(), length = html.len(), "Read editor content");
        Ok(html)
    }

    /// Remove all content
    pub async fn clear<D: BrowserDriver>(&self, session: &Session<D>) -> PageResult<()> {
        match self.kind {
            EditorKind::TinyMce => {
                self.api(session, "tinymce.activeEditor.setContent('')").await?;
            }
            EditorKind::CkEditor => {
                self.api(session, &format!("{CKEDITOR_INSTANCE}.setData('')"))
                    .await?;
            }
            EditorKind::Quill | EditorKind::Generic => {
                self.on_editor(session, "clear", "el.innerHTML = '';").await?;
            }
        }
        Ok(())
    }

    /// Toggle an inline format on the current selection
    pub async fn apply_format<D: BrowserDriver>(
        &self,
        session: &Session<D>,
        format: TextFormat,
    ) -> PageResult<()> {
        let command = format.command();
        match self.kind {
            EditorKind::TinyMce => {
                self.api(
                    session,
                    &format!("tinymce.activeEditor.execCommand('{}')", capitalize(command)),
                )
                .await?;
            }
            EditorKind::CkEditor => {
                self.api(session, &format!("{CKEDITOR_INSTANCE}.execCommand('{command}')"))
                    .await?;
            }
            EditorKind::Quill => {
                self.api(session, &format!("document.querySelector('.ql-{command}').click()"))
                    .await?;
            }
            EditorKind::Generic => {
                self.on_editor(
                    session,
                    "apply_format",
                    &format!("el.focus(); el.ownerDocument.execCommand('{command}');"),
                )
                .await?;
            }
        }
        Ok(())
    }

    /// Whether the editor has initialised
    pub async fn is_ready<D: BrowserDriver>(&self, session: &Session<D>) -> PageResult<bool> {
        let ready = match self.kind {
            EditorKind::TinyMce => self
                .api(
                    session,
                    "return typeof tinymce !== 'undefined' && tinymce.activeEditor !== null",
                )
                .await?
                .as_bool()
                .unwrap_or(false),
            EditorKind::CkEditor => self
                .api(
                    session,
                    "return typeof CKEDITOR !== 'undefined' && Object.keys(CKEDITOR.instances).length > 0",
                )
                .await?
                .as_bool()
                .unwrap_or(false),
            EditorKind::Quill | EditorKind::Generic => {
                let ctx = self.context(session);
                let state = session.driver().probe(&ctx, self.editor.selector()).await?;
                state.exists() && (self.kind == EditorKind::Quill || state.visible)
            }
        };
        Ok(ready)
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

impl fmt::Display for RichTextEditor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:?}", self.editor, self.kind)?;
        if let Some(frame) = &self.frame {
            write!(f, " in {frame}")?;
        }
        f.write_str(")")
    }
}
