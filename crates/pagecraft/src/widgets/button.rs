//! Buttons.

use super::press;
use crate::dom_script;
use crate::driver::{BrowserDriver, Key};
use crate::element::Element;
use crate::result::PageResult;
use crate::session::Session;

/// Move keyboard focus to the button
pub async fn focus<D: BrowserDriver>(session: &Session<D>, element: &Element) -> PageResult<()> {
    element.focus(session).await
}

/// Activate with Enter
pub async fn press_enter<D: BrowserDriver>(
    session: &Session<D>,
    element: &Element,
) -> PageResult<()> {
    press(session, element, Key::Enter, "press_enter").await
}

/// Activate with Space
pub async fn press_space<D: BrowserDriver>(
    session: &Session<D>,
    element: &Element,
) -> PageResult<()> {
    press(session, element, Key::Space, "press_space").await
}

/// Submit the form that owns the button
pub async fn submit<D: BrowserDriver>(session: &Session<D>, element: &Element) -> PageResult<()> {
    element.evaluate(session, dom_script::SUBMIT_FORM).await?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::mock::{MockDriver, MockEffect, MockElement};
    use crate::result::PageError;

    #[tokio::test]
    async fn test_keyboard_activation() {
        let s = Session::new(
            MockDriver::new()
                .with_element(MockElement::new("#go").tag("button").on_key(
                    Key::Space,
                    MockEffect::SetText("#status".to_string(), "sent".to_string()),
                ))
                .with_element(MockElement::new("#status")),
        );
        let go = Element::button("#go", "Go");
        press_space(&s, &go).await.unwrap();
        assert_eq!(Element::label("#status", "Status").get_text(&s).await.unwrap(), "sent");
        focus(&s, &go).await.unwrap();
        submit(&s, &go).await.unwrap();
        assert!(s.driver().was_called("evaluate_on:#go"));
    }

    #[tokio::test]
    async fn test_image_has_no_keyboard() {
        let s = Session::new(MockDriver::new().with_element(MockElement::new("img").tag("img")));
        let logo = Element::of_kind(crate::ElementKind::Image, "img", "Logo");
        let err = press_enter(&s, &logo).await.unwrap_err();
        assert!(matches!(err, PageError::Unsupported { .. }));
    }
}
