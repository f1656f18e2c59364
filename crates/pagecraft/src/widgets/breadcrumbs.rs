//! Breadcrumb trails.

use crate::driver::BrowserDriver;
use crate::element::{Element, ElementKind};
use crate::result::{PageError, PageResult};
use crate::session::Session;
use tracing::{info, warn};

/// Separator used by [`Breadcrumbs::path`]
pub const PATH_SEPARATOR: &str = " > ";

/// Breadcrumb container and its segments
#[derive(Debug, Clone)]
pub struct Breadcrumbs {
    container: Element,
    segments: Element,
}

impl Breadcrumbs {
    /// Trail in `container` whose segments match `segment` inside it
    #[must_use]
    pub fn new(container: &str, segment: &str, name: &str) -> Self {
        let container = Element::new(container, name);
        let segments =
            container.child(ElementKind::Collection, segment, &format!("{name} segments"));
        Self {
            container,
            segments,
        }
    }

    /// Trimmed segment texts
    pub async fn segments<D: BrowserDriver>(
        &self,
        session: &Session<D>,
    ) -> PageResult<Vec<String>> {
        Ok(self
            .segments
            .texts(session)
            .await?
            .into_iter()
            .map(|t| t.trim().to_string())
            .collect())
    }

    /// Segments joined with `" > "`
    pub async fn path<D: BrowserDriver>(&self, session: &Session<D>) -> PageResult<String> {
        Ok(self.segments(session).await?.join(PATH_SEPARATOR))
    }

    fn out_of_range(&self, index: usize, count: usize) -> PageError {
        PageError::invalid_argument(format!(
            "segment {index} is out of range for '{}' ({count} segments)",
            self.container.name()
        ))
    }

    /// Segment text at `index`
    pub async fn segment<D: BrowserDriver>(
        &self,
        session: &Session<D>,
        index: usize,
    ) -> PageResult<String> {
        let segments = self.segments(session).await?;
        let count = segments.len();
        segments
            .into_iter()
            .nth(index)
            .ok_or_else(|| self.out_of_range(index, count))
    }

    /// Number of segments
    pub async fn segment_count<D: BrowserDriver>(&self, session: &Session<D>) -> usize {
        self.segments.count(session).await
    }

    /// Whether a segment has exactly this text; `false` when the trail can't be read
    pub async fn contains_segment<D: BrowserDriver>(
        &self,
        session: &Session<D>,
        text: &str,
    ) -> bool {
        match self.segments(session).await {
            Ok(segments) => segments.iter().any(|s| s == text),
            Err(e) => {
                warn!(element = self.container.name(), error = %e, "Could not read breadcrumbs");
                false
            }
        }
    }

    /// Click the segment at `index`
    pub async fn click_segment<D: BrowserDriver>(
        &self,
        session: &Session<D>,
        index: usize,
    ) -> PageResult<()> {
        let count = self.segment_count(session).await;
        if index >= count {
            return Err(self.out_of_range(index, count));
        }
        info!(element = self.container.name(), index, "Clicking breadcrumb");
        self.segments.click_nth(session, index).await
    }

    /// Click the first segment with this text
    pub async fn click_segment_text<D: BrowserDriver>(
        &self,
        session: &Session<D>,
        text: &str,
    ) -> PageResult<()> {
        let index = self
            .segments(session)
            .await?
            .iter()
            .position(|s| s == text)
            .ok_or_else(|| {
                PageError::invalid_argument(format!(
                    "'{}' has no segment '{text}'",
                    self.container.name()
                ))
            })?;
        self.click_segment(session, index).await
    }

    /// Click the first segment
    pub async fn click_home<D: BrowserDriver>(&self, session: &Session<D>) -> PageResult<()> {
        self.click_segment(session, 0).await
    }

    /// Click the last segment
    pub async fn click_current<D: BrowserDriver>(&self, session: &Session<D>) -> PageResult<()> {
        let count = self.segment_count(session).await;
        if count == 0 {
            return Err(self.out_of_range(0, 0));
        }
        self.click_segment(session, count - 1).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::mock::{MockDriver, MockEffect, MockElement};

    fn crumb(text: &str) -> MockElement {
        MockElement::new("nav.crumbs >> li").text(&format!(" {text} "))
    }

    fn session() -> Session<MockDriver> {
        Session::new(
            MockDriver::new()
                .with_element(crumb("Home").on_click(MockEffect::Navigate {
                    url: "https://www.agoda.com/".into(),
                    title: "Agoda".into(),
                }))
                .with_element(crumb("Vietnam"))
                .with_element(crumb("Da Nang")),
        )
    }

    fn trail() -> Breadcrumbs {
        Breadcrumbs::new("nav.crumbs", "li", "Location")
    }

    #[tokio::test]
    async fn test_path_and_segments() {
        let s = session();
        assert_eq!(trail().path(&s).await.unwrap(), "Home > Vietnam > Da Nang");
        assert_eq!(trail().segment(&s, 1).await.unwrap(), "Vietnam");
        assert_eq!(trail().segment_count(&s).await, 3);
        assert!(trail().contains_segment(&s, "Da Nang").await);
        assert!(!trail().contains_segment(&s, "Paris").await);
        assert!(trail().segment(&s, 3).await.is_err());
    }

    #[tokio::test]
    async fn test_contains_segment_is_passive() {
        let s = Session::new(MockDriver::new());
        s.driver().fail_action("nav.crumbs >> li", "renderer crashed");
        assert!(!trail().contains_segment(&s, "Home").await);
    }

    #[tokio::test]
    async fn test_click_by_text_and_position() {
        let s = session();
        trail().click_segment_text(&s, "Home").await.unwrap();
        assert_eq!(s.current_url().await.unwrap(), "https://www.agoda.com/");
        trail().click_current(&s).await.unwrap();
        assert!(s.driver().was_called("click_nth:nav.crumbs >> li:2"));
        assert!(trail().click_segment_text(&s, "Paris").await.is_err());
    }
}
