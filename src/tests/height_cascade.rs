use super::*;

const UNIT_WEEK_DAY_HTML: &str = r#"
<div class="content">
  <h2>Unit</h2>
  <h3>Week</h3>
  <h4>Day</h4>
  <p>Lab</p>
</div>
"#;

const WITH_SESSION_HTML: &str = r#"
<div class="content">
  <h2>Unit</h2>
  <h3>Week</h3>
  <h4>Day</h4>
  <p>Lab</p>
  <h5>Morning</h5>
  <p>Talk</p>
</div>
"#;

#[test]
fn forced_children_settle_before_their_staggered_parent() -> Result<()> {
    let mut page = quiet_page(UNIT_WEEK_DAY_HTML, OutlineConfig::default())?;
    page.transform()?;
    page.assert_style(".section-content", "max-height", "56px")?;
    page.advance_time(300)?;

    page.toggle_subsection(".subsection-header")?;
    page.assert_style(".subsubsection-content", "max-height", "40px")?;
    page.assert_style(".subsection-content", "max-height", "96px")?;

    let labels = page
        .pending_timers()
        .into_iter()
        .map(|timer| (timer.label, timer.due_at))
        .collect::<Vec<_>>();
    assert_eq!(
        labels,
        vec![
            ("settle:subsubsection#2".to_string(), 600),
            ("settle:subsection#1".to_string(), 650),
        ]
    );

    page.advance_time_to(600)?;
    page.assert_style(".subsubsection-content", "max-height", "none")?;
    page.assert_style(".subsection-content", "max-height", "96px")?;
    page.advance_time_to(650)?;
    page.assert_style(".subsection-content", "max-height", "none")?;
    assert_eq!(page.height_state(".subsection")?, HeightState::SettledExpanded);
    Ok(())
}

#[test]
fn collapsing_a_child_mid_animation_shrinks_fixed_ancestor() -> Result<()> {
    let mut page = quiet_page(UNIT_WEEK_DAY_HTML, OutlineConfig::default())?;
    page.transform()?;
    page.advance_time(300)?;
    page.toggle_subsection(".subsection-header")?;

    page.advance_time_to(310)?;
    assert_eq!(
        page.toggle_subsubsection(".subsubsection-header")?,
        ToggleOutcome::Collapsed
    );
    page.assert_style(".subsubsection-content", "max-height", "0px")?;

    page.advance_time_to(600)?;
    page.assert_style(".subsubsection-content", "max-height", "0px")?;
    page.assert_style(".subsection-content", "max-height", "96px")?;

    page.advance_time_to(610)?;
    page.assert_style(".subsection-content", "max-height", "56px")?;
    page.advance_time_to(650)?;
    page.assert_style(".subsection-content", "max-height", "none")?;

    let logs = page.take_trace_logs();
    assert!(
        logs.iter()
            .any(|line| line.starts_with("[height] stale settle subsubsection#2"))
    );
    Ok(())
}

#[test]
fn settling_child_grows_fixed_ancestor() -> Result<()> {
    let mut page = quiet_page(WITH_SESSION_HTML, OutlineConfig::default())?;
    page.transform()?;
    page.advance_time(300)?;

    page.toggle_subsection(".subsection-header")?;
    page.toggle_session(".session-header")?;
    page.assert_style(".subsubsection-content", "max-height", "88px")?;
    page.assert_style(".subsection-content", "max-height", "144px")?;
    page.assert_style(".session-content", "max-height", "40px")?;

    page.advance_time_to(600)?;
    page.assert_style(".subsubsection-content", "max-height", "none")?;
    page.assert_style(".session-content", "max-height", "none")?;
    page.assert_style(".subsection-content", "max-height", "184px")?;
    assert_eq!(
        page.height_state(".subsection-header")?,
        HeightState::Expanding { target_px: 184 }
    );

    page.advance_time_to(650)?;
    page.assert_style(".subsection-content", "max-height", "none")?;
    Ok(())
}

#[test]
fn cascade_stops_at_unconstrained_ancestor() -> Result<()> {
    let mut page = quiet_page(WITH_SESSION_HTML, OutlineConfig::default())?;
    page.transform()?;
    page.toggle_subsubsection(".subsubsection-header")?;
    page.flush()?;
    page.take_trace_logs();

    page.toggle_session(".session-header")?;
    page.flush()?;

    page.assert_style(".section-content", "max-height", "none")?;
    page.assert_style(".subsubsection-content", "max-height", "none")?;
    let logs = page.take_trace_logs();
    assert!(logs.contains(&"[height] cascade from #3 updated=0".to_string()));
    Ok(())
}

#[test]
fn measured_height_follows_layout_metrics() -> Result<()> {
    let layout = LayoutMetrics {
        line_height_px: 20,
        chars_per_line: 10,
        header_height_px: 30,
        block_gap_px: 0,
    };
    let html = r#"
        <div class="content">
          <h2>Unit</h2>
          <p>twenty-five characters!!</p>
          <p>short <em>and</em> inline</p>
          <p style="display: none">hidden</p>
        </div>
        "#;
    let config = OutlineConfig::default().with_layout(layout);
    let mut page = Page::with_config(html, config)?;
    page.transform()?;

    // 3 lines + 2 lines (inline runs share line boxes) + nothing for the hidden block.
    page.assert_style(".section-content", "max-height", "100px")?;
    Ok(())
}

#[test]
fn empty_container_expands_to_zero_and_still_settles() -> Result<()> {
    let html = r#"<div class="content"><h2>Empty</h2><h2>Next</h2></div>"#;
    let layout = LayoutMetrics {
        block_gap_px: 0,
        ..LayoutMetrics::default()
    };
    let mut page = Page::with_config(html, OutlineConfig::default().with_layout(layout))?;
    page.transform()?;

    page.assert_style(".section-content", "max-height", "0px")?;
    assert_eq!(
        page.height_state(".section")?,
        HeightState::Expanding { target_px: 0 }
    );
    page.flush()?;
    page.assert_style(".section-content", "max-height", "none")?;
    Ok(())
}

#[test]
fn height_constraint_css_round_trips() {
    assert_eq!(HeightConstraint::Zero.css_value(), "0px");
    assert_eq!(HeightConstraint::Fixed(42).css_value(), "42px");
    assert_eq!(HeightConstraint::Unconstrained.css_value(), "none");
    assert_eq!(
        HeightConstraint::from_css_value(" 42px "),
        Some(HeightConstraint::Fixed(42))
    );
    assert_eq!(
        HeightConstraint::from_css_value("NONE"),
        Some(HeightConstraint::Unconstrained)
    );
    assert_eq!(HeightConstraint::from_css_value("0"), Some(HeightConstraint::Zero));
    assert_eq!(HeightConstraint::from_css_value("-3px"), None);
    assert_eq!(HeightConstraint::from_css_value("auto"), None);
}
