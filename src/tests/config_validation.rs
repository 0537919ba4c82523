use super::*;

fn rejected(config: OutlineConfig) -> bool {
    matches!(config.validate(), Err(Error::InvalidConfig(_)))
}

#[test]
fn default_config_is_valid() -> Result<()> {
    let config = OutlineConfig::default();
    config.validate()?;
    assert_eq!(config.root_selector, ".content");
    assert_eq!(config.transition_ms, 300);
    assert_eq!(config.cascade_stagger_ms, 50);
    assert_eq!(config.enhance_delay_ms, 100);
    assert_eq!(config.preamble, PreamblePolicy::Drop);
    assert_eq!(config.collapsed_glyph, "▼");
    assert_eq!(config.expanded_glyph, "▲");
    Ok(())
}

#[test]
fn invalid_settings_are_rejected() {
    let base = OutlineConfig::default;

    assert!(rejected(base().with_root_selector("  ")));
    assert!(rejected(base().with_title_selector(Some(String::new()))));
    assert!(rejected(base().with_transition_ms(-1)));
    assert!(rejected(base().with_cascade_stagger_ms(-5)));
    assert!(rejected(base().with_glyphs("", "▲")));
    assert!(rejected(base().with_glyphs("+", "+")));
    assert!(rejected(base().with_deadline_keywords([" "])));
    assert!(rejected(base().with_timer_step_limit(0)));
    assert!(rejected(base().with_layout(LayoutMetrics {
        chars_per_line: 0,
        ..LayoutMetrics::default()
    })));
    assert!(rejected(base().with_layout(LayoutMetrics {
        line_height_px: 0,
        ..LayoutMetrics::default()
    })));
}

#[test]
fn page_construction_validates_config() {
    let config = OutlineConfig::default().with_enhance_delay_ms(-1);
    assert!(matches!(
        Page::with_config(SYLLABUS_HTML, config),
        Err(Error::InvalidConfig(_))
    ));
}

#[test]
fn custom_root_glyphs_and_timings_are_honoured() -> Result<()> {
    let html = r#"
        <section id="syllabus">
          <h2>Week 1</h2>
          <p>Intro</p>
        </section>
        "#;
    let config = OutlineConfig::default()
        .with_root_selector("#syllabus")
        .with_glyphs("+", "-")
        .with_transition_ms(120)
        .with_enhance_delay_ms(0);
    let mut page = Page::with_config(html, config)?;
    page.transform()?;

    page.assert_text(".section-header .toggle-icon", "-")?;
    let due = page
        .pending_timers()
        .into_iter()
        .map(|timer| (timer.label, timer.due_at))
        .collect::<Vec<_>>();
    assert_eq!(
        due,
        vec![
            ("enhance".to_string(), 0),
            ("settle:section#0".to_string(), 120),
        ]
    );

    page.toggle_section(".section-header")?;
    page.assert_text(".section-header .toggle-icon", "+")?;
    assert_eq!(page.config().transition_ms, 120);
    Ok(())
}
