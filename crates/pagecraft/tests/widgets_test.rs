//! Widgets composed into page-level scenarios.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use pagecraft::prelude::*;
use pagecraft::widgets::{file, text, Breadcrumbs, FileDownload, Pagination, Panel};
use pagecraft::widgets::{EditorKind, RichTextEditor};
use std::time::Duration;

// =============================================================================
// Tabs and frames
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_tab_and_frame_contexts_do_not_leak() {
    let driver = MockDriver::new()
        .with_element(MockElement::new("#terms-link").on_click(MockEffect::OpenTab {
            url: "https://example.test/terms".to_string(),
            title: "Terms of service".to_string(),
        }))
        .with_element(MockElement::new("h1").text("Booking"))
        .with_element(MockElement::new("h1").text("Terms").in_tab(1))
        .with_element(MockElement::new("iframe#payment"))
        .with_element(
            MockElement::new("#card")
                .input("text")
                .in_frame("iframe#payment"),
        );
    let mut session = Session::new(driver);
    let heading = Element::label("h1", "Heading");

    Element::new("#terms-link", "Terms link").click(&session).await.unwrap();
    assert!(session.wait_for_tab_count(2, Duration::from_secs(2)).await);
    assert!(session.switch_to_tab_titled("Terms").await.unwrap());
    assert_eq!(heading.get_text(&session).await.unwrap(), "Terms");
    session.close_current_tab_and_switch(0).await.unwrap();
    assert_eq!(session.tab_count().await.unwrap(), 1);
    assert_eq!(heading.get_text(&session).await.unwrap(), "Booking");

    let card = Element::text_box("#card", "Card number");
    assert!(!card.exists(&session).await);
    session.enter_frame(&Locator::new("iframe#payment")).await.unwrap();
    card.set_text(&session, "4111 1111 1111 1111").await.unwrap();
    assert!(!heading.exists(&session).await);
    assert!(session.exit_frame());
    assert!(!session.exit_frame());
    assert_eq!(heading.get_text(&session).await.unwrap(), "Booking");
    assert!(session.switch_to_tab(3).await.is_err());
}

#[tokio::test(start_paused = true)]
async fn test_rich_text_in_frame_leaves_session_at_top_level() {
    let driver = MockDriver::new()
        .with_element(MockElement::new("iframe#notes"))
        .with_element(
            MockElement::new("body#tinymce")
                .attr("contenteditable", "true")
                .in_frame("iframe#notes"),
        );
    let session = Session::new(driver);
    let editor =
        RichTextEditor::new("body#tinymce", "Notes", EditorKind::Generic).in_frame("iframe#notes");
    editor.insert_text(&session, "Late check-in").await.unwrap();
    assert!(session.context().is_top_level());
    assert!(session.driver().was_called("type_text:body#tinymce:Late check-in"));
}

// =============================================================================
// Composite widgets
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_pagination_and_breadcrumbs_walkthrough() {
    let mut driver = MockDriver::new()
        .with_element(MockElement::new("#pager"))
        .with_element(MockElement::new("#pager >> .next").tag("button"))
        .with_element(
            MockElement::new("#pager >> .prev")
                .tag("button")
                .class("disabled"),
        )
        .with_element(MockElement::new("#pager >> .current").text("Page 1 of 3"));
    for n in 1..=3 {
        driver = driver.with_element(
            MockElement::new("#pager li").text(&n.to_string()).on_click(MockEffect::SetText(
                "#pager >> .current".to_string(),
                format!("Page {n} of 3"),
            )),
        );
    }
    driver = driver
        .with_element(MockElement::new("nav.crumbs"))
        .with_element(MockElement::new("nav.crumbs >> li").text("Home"))
        .with_element(MockElement::new("nav.crumbs >> li").text("Vietnam"))
        .with_element(MockElement::new("nav.crumbs >> li").text("Da Nang"));
    let session = Session::new(driver);

    let pager = Pagination::new("#pager", "#pager li", ".next", ".prev", ".current", "Results");
    assert_eq!(pager.total_pages(&session).await, 3);
    assert_eq!(pager.current_page(&session).await, 1);
    assert!(!pager.previous_page(&session).await.unwrap());
    pager.go_to_last_page(&session).await.unwrap();
    assert_eq!(pager.current_page(&session).await, 3);
    assert!(matches!(
        pager.go_to_page(&session, 4).await.unwrap_err(),
        PageError::InvalidArgument { .. }
    ));

    let crumbs = Breadcrumbs::new("nav.crumbs", "li", "Breadcrumbs");
    assert_eq!(crumbs.segment_count(&session).await, 3);
    assert_eq!(crumbs.path(&session).await.unwrap(), "Home > Vietnam > Da Nang");
    assert!(crumbs.contains_segment(&session, "Vietnam").await);
}

#[tokio::test(start_paused = true)]
async fn test_panel_and_chain() {
    let session = Session::new(
        MockDriver::new()
            .with_element(MockElement::new("#policy"))
            .with_element(MockElement::new("#policy >> .expand").on_click(MockEffect::Sequence(vec![
                MockEffect::Show("#policy >> .content".to_string()),
                MockEffect::Hide("#policy >> .expand".to_string()),
                MockEffect::Show("#policy >> .collapse".to_string()),
            ])))
            .with_element(MockElement::new("#policy >> .collapse").hidden())
            .with_element(
                MockElement::new("#policy >> .content")
                    .text("Free cancellation until 3 days before arrival")
                    .hidden(),
            )
            .with_element(MockElement::new("#guest").input("text"))
            .with_element(MockElement::new("#continue").tag("button").on_click(
                MockEffect::SetText("#status".to_string(), "saved".to_string()),
            ))
            .with_element(MockElement::new("#status")),
    );

    let panel = Panel::new("#policy", ".expand", ".collapse", ".content", "Cancellation policy");
    assert!(!panel.is_expanded(&session).await);
    panel.expand(&session).await.unwrap();
    assert!(panel.is_expanded(&session).await);
    assert!(panel.content(&session).await.unwrap().starts_with("Free cancellation"));

    let guest = Element::text_box("#guest", "Guest name");
    Chain::new(&session, guest.clone())
        .set_text("Tran Thi B")
        .await
        .unwrap()
        .then(Element::button("#continue", "Continue"))
        .click()
        .await
        .unwrap();
    assert_eq!(text::placeholder(&session, &guest).await.unwrap(), None);
    assert_eq!(guest.get_text(&session).await.unwrap(), "Tran Thi B");
    assert_eq!(Element::label("#status", "Status").get_text(&session).await.unwrap(), "saved");
}

// =============================================================================
// Files
// =============================================================================

#[tokio::test]
async fn test_upload_then_download_invoice() {
    let workspace = tempfile::tempdir().unwrap();
    let passport = workspace.path().join("passport.pdf");
    std::fs::write(&passport, b"%PDF-1.4").unwrap();
    let downloads = workspace.path().join("downloads");

    let session = Session::new(
        MockDriver::new()
            .with_element(MockElement::new("#passport").input("file"))
            .with_element(MockElement::new("#invoice").tag("a").on_click(MockEffect::WriteFile {
                path: downloads.join("invoice-1042.pdf"),
                contents: b"%PDF-1.4 invoice".to_vec(),
            })),
    );

    let upload = Element::file_upload("#passport", "Passport scan");
    file::upload_file(&session, &upload, &passport).await.unwrap();
    assert_eq!(file::uploaded_file_name(&session, &upload).await.unwrap(), "passport.pdf");
    let missing = workspace.path().join("visa.pdf");
    assert!(matches!(
        file::upload_file(&session, &upload, &missing).await.unwrap_err(),
        PageError::InvalidArgument { .. }
    ));

    let invoice = FileDownload::new("#invoice", "Invoice", &downloads)
        .with_timeout(Duration::from_secs(2));
    let path = invoice
        .download_matching(&session, |name| name.starts_with("invoice-"))
        .await
        .unwrap();
    assert_eq!(path, downloads.join("invoice-1042.pdf"));
    assert!(invoice.wait_for_download("invoice-1042.pdf").await);
}
