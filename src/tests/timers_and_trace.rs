use super::*;

#[test]
fn transform_queues_settle_and_enhance_on_virtual_clock() -> Result<()> {
    let mut page = Page::from_html(SYLLABUS_HTML)?;
    page.transform()?;

    let pending = page.pending_timers();
    assert_eq!(pending.len(), 2);
    assert_eq!(pending[0].label, "enhance");
    assert_eq!(pending[0].due_at, 100);
    assert_eq!(pending[1].label, "settle:section#0");
    assert_eq!(pending[1].due_at, 300);
    assert_eq!(page.now_ms(), 0);

    assert!(page.run_next_timer()?);
    assert_eq!(page.now_ms(), 100);
    assert_eq!(page.advance_time(150)?, 0);
    assert_eq!(page.now_ms(), 250);
    assert_eq!(page.advance_time_to(300)?, 1);
    assert!(!page.run_next_timer()?);
    Ok(())
}

#[test]
fn flush_moves_clock_to_last_deadline() -> Result<()> {
    let mut page = Page::from_html(SYLLABUS_HTML)?;
    page.transform()?;

    assert_eq!(page.flush()?, 2);
    assert_eq!(page.now_ms(), 300);
    assert!(page.pending_timers().is_empty());
    Ok(())
}

#[test]
fn cleared_settle_leaves_container_clipped() -> Result<()> {
    let mut page = Page::from_html(SYLLABUS_HTML)?;
    page.transform()?;

    let settle = page
        .pending_timers()
        .into_iter()
        .find(|timer| timer.label.starts_with("settle"))
        .map(|timer| timer.id)
        .ok_or_else(|| Error::Dom("settle timer missing".into()))?;
    assert!(page.clear_timer(settle));
    assert!(!page.clear_timer(settle));
    page.flush()?;
    page.assert_style(".section-content", "max-height", "88px")?;

    assert_eq!(page.clear_all_timers(), 0);
    Ok(())
}

#[test]
fn time_control_rejects_going_backwards() -> Result<()> {
    let mut page = Page::from_html(SYLLABUS_HTML)?;
    page.advance_time(50)?;

    assert!(matches!(page.advance_time(-1), Err(Error::InvalidConfig(_))));
    assert!(matches!(page.advance_time_to(10), Err(Error::InvalidConfig(_))));
    assert_eq!(page.now_ms(), 50);
    Ok(())
}

#[test]
fn timer_step_limit_stops_runaway_queue() -> Result<()> {
    let mut page = Page::from_html(SYLLABUS_HTML)?;
    page.transform()?;
    page.set_timer_step_limit(1)?;

    match page.flush() {
        Err(Error::TimerStepLimit { limit, now_ms, .. }) => {
            assert_eq!(limit, 1);
            assert_eq!(now_ms, 300);
        }
        other => panic!("unexpected flush result: {other:?}"),
    }
    assert!(page.set_timer_step_limit(0).is_err());
    Ok(())
}

#[test]
fn trace_records_transform_toggle_and_timer_lines() -> Result<()> {
    let mut page = quiet_page(SYLLABUS_HTML, OutlineConfig::default())?;
    page.transform()?;
    page.toggle_subsection(".subsection-header")?;
    page.flush()?;

    let logs = page.take_trace_logs();
    assert!(logs.iter().any(|line| line.starts_with("[transform] sections=1 containers=2")));
    assert!(logs.iter().any(|line| line.starts_with("[toggle] expand subsection#1")));
    assert!(logs.iter().any(|line| line.starts_with("[height] expand section#0 measured=88px")));
    assert!(logs.iter().any(|line| line.starts_with("[timer] run id=")));
    assert!(logs.iter().any(|line| line.starts_with("[enhance] reading_lists=0")));
    assert!(logs.iter().any(|line| line.starts_with("[timer] flush from=0 to=300")));
    assert!(page.take_trace_logs().is_empty());
    Ok(())
}

#[test]
fn trace_categories_can_be_muted() -> Result<()> {
    let mut page = quiet_page(SYLLABUS_HTML, OutlineConfig::default())?;
    page.set_trace_timers(false);
    page.set_trace_toggles(false);
    page.transform()?;
    page.flush()?;

    let logs = page.take_trace_logs();
    assert!(!logs.iter().any(|line| line.starts_with("[timer]")));
    assert!(!logs.iter().any(|line| line.starts_with("[toggle]")));
    assert!(!logs.iter().any(|line| line.starts_with("[height]")));
    assert!(logs.iter().any(|line| line.starts_with("[transform]")));
    Ok(())
}

#[test]
fn trace_log_limit_keeps_newest_lines() -> Result<()> {
    let mut page = quiet_page(SYLLABUS_HTML, OutlineConfig::default())?;
    page.transform()?;
    page.flush()?;
    page.set_trace_log_limit(2)?;

    let logs = page.take_trace_logs();
    assert_eq!(logs.len(), 2);
    assert!(logs[1].starts_with("[timer] flush"));
    assert!(page.set_trace_log_limit(0).is_err());
    Ok(())
}

#[test]
fn warnings_are_kept_even_when_tracing_is_off() -> Result<()> {
    let mut page = Page::from_html(SYLLABUS_HTML)?;
    page.set_trace_stderr(false);
    page.transform()?;
    page.toggle_section(".subsection-header")?;

    let logs = page.take_trace_logs();
    assert_eq!(logs.len(), 1);
    assert!(logs[0].starts_with("[warn] section toggle on a subsection header"));
    Ok(())
}
