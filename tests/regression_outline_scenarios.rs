use collapsible_outline::{
    HeightConstraint, HeightState, Key, OutlineConfig, Page, PreamblePolicy, ToggleOutcome,
};

const CONVERTED_DOCUMENT: &str = r#"<!DOCTYPE html>
<html lang="en">
  <head>
    <title>converted</title>
    <style>.content h2 { color: navy; }</style>
  </head>
  <body>
    <header><span class="title">Untitled</span></header>
    <div class="content">
      <p>Generated on Monday</p>
      <h1>Biology 101</h1>
      <h2>Week 1</h2>
      <p>Cells</p>
      <h3>Lab</h3>
      <p>Microscopes</p>
      <h2>Week 2</h2>
      <p>DNA</p>
    </div>
    <script>var marker = "<h2>not a heading</h2>";</script>
  </body>
</html>
"#;

#[test]
fn converted_document_is_regrouped_inside_its_root_only() -> collapsible_outline::Result<()> {
    let mut page = Page::from_html(CONVERTED_DOCUMENT)?;
    let report = page.transform()?;

    assert!(report.transformed);
    assert_eq!(report.title.as_deref(), Some("Biology 101"));
    assert_eq!(report.sections, 2);
    assert_eq!(report.containers, 3);
    assert_eq!(report.content_items, 3);
    assert_eq!(report.dropped, 1);
    assert_eq!(report.preamble, 0);

    page.assert_text("header .title", "Biology 101")?;
    assert_eq!(page.count(".content > .section")?, 2);
    assert_eq!(page.count(".content > p")?, 0);
    assert_eq!(page.count(".content h1")?, 0);
    page.assert_text(
        ".content > .section:nth-child(1) .subsection-title",
        "Lab",
    )?;
    assert!(page.is_expanded(".content > .section:first-child > .section-header")?);
    assert!(!page.is_expanded(".content > .section:nth-child(2) > .section-header")?);
    assert!(page.html().contains("<h2>not a heading</h2>"));
    Ok(())
}

#[test]
fn kept_preamble_stays_ahead_of_the_first_section() -> collapsible_outline::Result<()> {
    let html = r#"
    <div class="content">
      <p id="intro">Welcome</p>
      <h2>Week 1</h2>
      <p>Cells</p>
    </div>
    "#;
    let config = OutlineConfig::default().with_preamble(PreamblePolicy::Keep);
    let mut page = Page::with_config(html, config)?;
    let report = page.transform()?;

    assert_eq!(report.preamble, 1);
    assert_eq!(report.dropped, 0);
    page.assert_exists(".content > p#intro:first-child")?;
    page.assert_exists(".content > .section:nth-child(2)")?;
    Ok(())
}

#[test]
fn keyboard_and_pointer_activation_share_one_toggle() -> collapsible_outline::Result<()> {
    let config = OutlineConfig::default().with_auto_expand_first(false);
    let mut page = Page::with_config(CONVERTED_DOCUMENT, config)?;
    page.set_trace_stderr(false);
    page.transform()?;
    let header = ".content > .section:first-child > .section-header";

    let outcome = page.key_down(header, Key::from_name("Enter"))?;
    assert_eq!(outcome.toggled, Some(ToggleOutcome::Expanded));
    assert!(outcome.default_prevented);

    let outcome = page.press_key(Key::from_name(" "))?;
    assert_eq!(outcome.toggled, Some(ToggleOutcome::Collapsed));

    let outcome = page.press_key(Key::from_name("Tab"))?;
    assert_eq!(outcome.toggled, None);
    assert!(!outcome.default_prevented);

    page.blur();
    assert_eq!(page.press_key(Key::Enter)?.toggled, None);

    assert_eq!(
        page.click(".content > .section:first-child .toggle-icon")?,
        ToggleOutcome::Expanded
    );
    assert_eq!(page.click(".section-inner > p")?, ToggleOutcome::Skipped);
    assert_eq!(page.expanded_count(), 1);
    Ok(())
}

#[test]
fn second_transform_rebuilds_and_keeps_the_title() -> collapsible_outline::Result<()> {
    let mut page = Page::from_html(CONVERTED_DOCUMENT)?;
    page.transform()?;
    page.flush()?;
    page.expand_all()?;

    let report = page.transform()?;
    assert_eq!(report.title.as_deref(), Some("Biology 101"));
    assert_eq!(report.containers, 3);
    assert_eq!(report.dropped, 0);
    assert_eq!(page.expanded_count(), 1);
    assert_eq!(page.count(".section .section")?, 0);
    page.assert_text("header .title", "Biology 101")?;
    Ok(())
}

#[test]
fn page_without_root_is_left_untouched() -> collapsible_outline::Result<()> {
    let html = "<main><h2>Week 1</h2><p>Cells</p></main>";
    let mut page = Page::from_html(html)?;
    page.set_trace_stderr(false);
    let before = page.html();

    let report = page.transform()?;
    assert!(!report.transformed);
    assert_eq!(page.html(), before);
    assert!(page.pending_timers().is_empty());
    assert_eq!(page.expand_all()?, 0);
    Ok(())
}

#[test]
fn expand_all_settles_every_container_to_unconstrained() -> collapsible_outline::Result<()> {
    let mut page = Page::from_html(CONVERTED_DOCUMENT)?;
    page.transform()?;

    assert_eq!(page.expand_all()?, 2);
    assert_eq!(page.expanded_count(), 3);
    page.flush()?;

    for header in [".section-header", ".subsection-header"] {
        assert_eq!(page.height_state(header)?, HeightState::SettledExpanded);
    }
    assert_eq!(
        page.height_constraint(".content > .section:nth-child(2) > .section-content")?,
        HeightConstraint::Unconstrained
    );
    assert_eq!(page.count(".content [style=\"max-height: none;\"]")?, 3);

    assert_eq!(page.collapse_all()?, 3);
    page.flush()?;
    assert_eq!(page.count(".content [style=\"max-height: 0px;\"]")?, 3);
    assert_eq!(page.count(".active")?, 0);
    Ok(())
}
