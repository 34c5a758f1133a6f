use dash_wm::config::ManagerConfig;
use dash_wm::controller::{self, SharedManager, SurfaceManager};
use dash_wm::host::{Host, MemoryHost};
use dash_wm::{SectionId, SurfaceKind};
use futures::executor::block_on;

fn add_section(host: &MemoryHost, id: &str, title: &str) {
    let body = host.body().unwrap();
    let section = host.create_element("div").unwrap();
    host.set_attr(&section, "id", id);
    host.set_attr(&section, "class", "dash-section");
    let header = host.create_element("div").unwrap();
    host.set_attr(&header, "class", "dash-header");
    let title_el = host.create_element("span").unwrap();
    host.set_attr(&title_el, "class", "dash-title");
    host.set_text(&title_el, title);
    host.append_child(&header, &title_el);
    let content = host.create_element("div").unwrap();
    host.set_attr(&content, "class", "dash-content");
    host.append_child(&section, &header);
    host.append_child(&section, &content);
    host.append_child(&body, &section);
}

fn dashboard() -> (MemoryHost, SharedManager<MemoryHost>) {
    let host = MemoryHost::new();
    add_section(&host, "notes", "Notes");
    let manager = SurfaceManager::new(host.clone(), ManagerConfig::default()).shared();
    (host, manager)
}

#[test]
fn blocked_popup_falls_back_to_an_external_tab() {
    let (host, manager) = dashboard();
    host.set_popups_blocked(true);
    let notes = SectionId::new("notes");

    block_on(controller::open_section_in_browser_popup(manager.clone(), &notes));

    assert_eq!(
        manager.borrow().section_state(&notes),
        SurfaceKind::ExternalTab
    );
    assert_eq!(host.popup_count(), 0);
    assert_eq!(host.opened_tabs(), vec!["/popup/rec-0".to_string()]);
    let original = host.element_by_id("notes").unwrap();
    assert_eq!(host.style(&original, "display").as_deref(), Some("none"));
}

#[test]
fn blocked_popup_and_failing_service_fall_back_to_a_data_uri_tab() {
    let (host, manager) = dashboard();
    host.set_popups_blocked(true);
    host.set_proxy_failing(true);
    let notes = SectionId::new("notes");

    block_on(controller::open_section_in_browser_popup(manager.clone(), &notes));

    assert_eq!(
        manager.borrow().section_state(&notes),
        SurfaceKind::ExternalTab
    );
    let tabs = host.opened_tabs();
    assert_eq!(tabs.len(), 1);
    assert!(tabs[0].starts_with("data:text/html"));
}

#[test]
fn everything_blocked_degrades_to_a_floating_surface() {
    let (host, manager) = dashboard();
    host.set_popups_blocked(true);
    host.set_tabs_blocked(true);
    let notes = SectionId::new("notes");

    block_on(controller::open_section_in_browser_popup(manager.clone(), &notes));

    assert_eq!(manager.borrow().section_state(&notes), SurfaceKind::Floating);
    let overlay = host.element_by_id("dash-overlay").unwrap();
    assert_eq!(host.child_count(&overlay), 1);
}

#[test]
fn external_tab_docks_back_and_releases_its_record() {
    let (host, manager) = dashboard();
    host.set_popups_blocked(true);
    let notes = SectionId::new("notes");

    block_on(controller::open_section_in_browser_popup(manager.clone(), &notes));
    block_on(controller::dock_section(manager.clone(), &notes));

    assert_eq!(manager.borrow().section_state(&notes), SurfaceKind::Docked);
    assert_eq!(host.deleted_records(), vec!["rec-0".to_string()]);
    let original = host.element_by_id("notes").unwrap();
    assert!(host.style(&original, "display").is_none());
}

#[test]
fn pop_out_prefers_popup_when_the_global_flag_is_set() {
    let host = MemoryHost::new();
    add_section(&host, "notes", "Notes");
    let config = ManagerConfig {
        prefer_popup_windows: true,
        ..ManagerConfig::default()
    };
    let manager = SurfaceManager::new(host.clone(), config).shared();
    let notes = SectionId::new("notes");

    block_on(controller::pop_out_section(manager.clone(), &notes, None));
    assert_eq!(manager.borrow().section_state(&notes), SurfaceKind::Popup);

    // explicit preference overrides the flag
    block_on(controller::pop_out_section(manager.clone(), &notes, None));
    block_on(controller::pop_out_section(
        manager.clone(),
        &notes,
        Some(false),
    ));
    assert_eq!(manager.borrow().section_state(&notes), SurfaceKind::Floating);
}

#[test]
fn pop_out_toggle_also_closes_fallback_surfaces() {
    let (host, manager) = dashboard();
    host.set_popups_blocked(true);
    let notes = SectionId::new("notes");

    block_on(controller::pop_out_section(manager.clone(), &notes, Some(true)));
    assert_eq!(
        manager.borrow().section_state(&notes),
        SurfaceKind::ExternalTab
    );

    block_on(controller::pop_out_section(manager.clone(), &notes, Some(true)));
    assert_eq!(manager.borrow().section_state(&notes), SurfaceKind::Docked);
}
