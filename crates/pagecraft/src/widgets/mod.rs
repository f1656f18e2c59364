//! Capability-specific element operations.
//!
//! Functions here take a [`Session`](crate::Session) and an
//! [`Element`](crate::Element), check the element's capability set, then run
//! through the element's wait/retry machinery. Composite widgets
//! (date picker, counter, pagination and friends) are small structs made of
//! several elements.

pub mod breadcrumbs;
pub mod button;
pub mod checkable;
pub mod counter;
pub mod date_picker;
pub mod file;
pub mod media;
pub mod panel;
pub mod pagination;
pub mod rich_text;
pub mod select;
pub mod slider;
pub mod text;

pub use breadcrumbs::Breadcrumbs;
pub use counter::Counter;
pub use date_picker::DatePicker;
pub use file::FileDownload;
pub use media::Tooltip;
pub use pagination::Pagination;
pub use panel::Panel;
pub use rich_text::{EditorKind, RichTextEditor, TextFormat};

use crate::driver::{BrowserDriver, Key};
use crate::element::{Capabilities, Element};
use crate::result::PageResult;
use crate::session::Session;
use crate::wait::ElementCondition;

/// Press `key` on a visible element with keyboard capability
pub(crate) async fn press<D: BrowserDriver>(
    session: &Session<D>,
    element: &Element,
    key: Key,
    action: &str,
) -> PageResult<()> {
    element.require(Capabilities::KEYS)?;
    let (driver, ctx, selector) = (session.driver(), session.context(), element.selector());
    element
        .perform(session, action, Some(ElementCondition::Visible), move || {
            driver.press_key(ctx, selector, key)
        })
        .await
}
