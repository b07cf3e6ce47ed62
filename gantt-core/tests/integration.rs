//! Integration Tests for Gantt Tables
//!
//! These tests drive tables through their public surface: refreshing rows
//! and items, declaring links, and resolving dynamic children across tables.

use std::rc::Rc;

use chrono::{NaiveDate, NaiveDateTime};

use gantt_core::store::Color;
use gantt_core::{
    ChildModeConfig, Direction, GId, GanttError, ItemRefresh, ItemSnapshot, LinkDeclaration,
    RefreshOptions, RowSnapshot, Table, TableConfig, TableRegistry, TimeRange,
};

fn at(day: u32, hour: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 6, day)
        .unwrap()
        .and_hms_opt(hour, 0, 0)
        .unwrap()
}

fn span(day: u32, from: u32, to: u32) -> TimeRange {
    TimeRange::new(at(day, from), at(day, to))
}

fn item(class: u32, record: i64, row: GId, time: TimeRange) -> ItemSnapshot {
    ItemSnapshot::new(GId::new(class, record), row, time)
}

fn upsert(table: &mut Table, snapshot: &ItemSnapshot) -> bool {
    table
        .refresh_item(None, Some(snapshot), RefreshOptions::default())
        .unwrap()
}

/// Test that interning is idempotent and reversible.
#[test]
fn identity_is_stable_per_table() {
    let mut table = Table::new(&TableConfig::new("plan")).unwrap();
    let gid = GId::with_entry(7, 42, 3);

    let first = table.get_id(gid);
    let second = table.get_id(gid);
    assert_eq!(first, second);
    assert!(!first.is_none());
    assert_eq!(table.get_gid(first), Some(gid));

    // Same record without the entry is a different id.
    assert_ne!(table.get_id(GId::new(7, 42)), first);
}

/// Test that a row refresh deletes every item and group entry it owned.
#[test]
fn row_delete_cascades_to_indices() {
    let mut table = Table::new(&TableConfig::new("plan")).unwrap();
    let row = GId::new(1, 1);
    let group = GId::new(30, 1);
    table.refresh_row(None, Some(&RowSnapshot::new(row).with_label("Press 4"))).unwrap();

    let a = item(10, 1, row, span(3, 8, 10)).with_group(group);
    let b = item(10, 2, row, span(3, 10, 12)).with_group(group);
    let batch = [ItemRefresh::upsert(&a), ItemRefresh::upsert(&b)];
    let changed = table.refresh_items(batch, RefreshOptions::default()).unwrap();
    assert!(changed);
    assert_eq!(table.group_members(&group).map(|members| members.len()), Some(2));

    assert!(table.refresh_row(Some(row), None).unwrap());
    assert!(table.row(&row).is_none());
    assert!(table.item(&a.id).is_none());
    assert!(table.group_members(&group).is_none());
}

/// Test that a refresh without any id is rejected.
#[test]
fn refresh_without_id_is_an_error() {
    let mut table = Table::new(&TableConfig::new("plan")).unwrap();
    assert_eq!(
        table.refresh_item(None, None, RefreshOptions::default()),
        Err(GanttError::MissingItemId)
    );
}

/// Test that sentinel fields in an update leave stored values alone.
#[test]
fn merge_keeps_values_behind_sentinels() {
    let mut table = Table::new(&TableConfig::new("plan")).unwrap();
    let row = GId::new(1, 1);
    let original = item(10, 1, row, span(3, 8, 10)).with_fill(Color(0x00ff00));
    upsert(&mut table, &original);

    let mut update = item(10, 1, row, span(3, 9, 11));
    update.label = "moved".into();
    assert!(upsert(&mut table, &update));

    let stored = table.item(&original.id).unwrap();
    assert_eq!(stored.fill, Color(0x00ff00));
    assert_eq!(stored.label, "moved");
    assert_eq!(stored.time, span(3, 9, 11));

    // Re-sending the same snapshot changes nothing.
    assert!(!upsert(&mut table, &update));
}

/// Test that an item refreshed onto another row moves there.
#[test]
fn item_moves_between_rows() {
    let mut table = Table::new(&TableConfig::new("plan")).unwrap();
    let (first, second) = (GId::new(1, 1), GId::new(1, 2));
    let snapshot = item(10, 1, first, span(3, 8, 10));
    upsert(&mut table, &snapshot);

    let moved = item(10, 1, second, span(3, 8, 10));
    assert!(upsert(&mut table, &moved));

    assert_eq!(table.store().row_of(&snapshot.id), Some(second));
    let first_row = table.row(&first).unwrap();
    assert_eq!(first_row.items().count(), 0);
}

/// Test that a cyclic chain query terminates with every edge once.
#[test]
fn cyclic_links_terminate() {
    let mut table = Table::new(&TableConfig::new("plan")).unwrap();
    let row = GId::new(1, 1);
    let ids: Vec<GId> = (1..=3)
        .map(|record| {
            let snapshot = item(10, record, row, span(3, 8, 9));
            upsert(&mut table, &snapshot);
            snapshot.id
        })
        .collect();

    table.set_links(&[
        LinkDeclaration::new(ids[0], ids[1]).transitive(),
        LinkDeclaration::new(ids[1], ids[2]).transitive(),
        LinkDeclaration::new(ids[2], ids[0]).transitive(),
    ]);

    for direction in [Direction::Next, Direction::Prev, Direction::Both] {
        let links = table.links_for(&ids[0], direction, true);
        assert_eq!(links.len(), 3, "{direction:?}");
    }
    assert_eq!(table.links_for(&ids[0], Direction::Next, false).len(), 1);
}

/// Test that links whose endpoints have no item are not drawn.
#[test]
fn links_to_unknown_items_are_skipped() {
    let mut table = Table::new(&TableConfig::new("plan")).unwrap();
    let row = GId::new(1, 1);
    let a = item(10, 1, row, span(3, 8, 9));
    upsert(&mut table, &a);

    table.add_link(&LinkDeclaration::new(a.id, GId::new(10, 99)));
    assert_eq!(table.link_count(), 1);
    assert!(table.links_for(&a.id, Direction::Next, false).is_empty());
    assert!(table.all_links().is_empty());
}

/// Test that adjacency stays mirrored through removals.
#[test]
fn removing_a_link_clears_both_directions() {
    let mut table = Table::new(&TableConfig::new("plan")).unwrap();
    let row = GId::new(1, 1);
    let (a, b) = (item(10, 1, row, span(3, 8, 9)), item(10, 2, row, span(3, 9, 10)));
    upsert(&mut table, &a);
    upsert(&mut table, &b);

    table.add_link(&LinkDeclaration::new(a.id, b.id));
    assert!(table.remove_link(&a.id, &b.id));

    let a_id = table.find_id(&a.id).unwrap();
    let b_id = table.find_id(&b.id).unwrap();
    assert!(table.link_graph().outgoing(a_id).is_empty());
    assert!(table.link_graph().incoming(b_id).is_empty());
}

fn equipment_and_crew(behaviors: &str) -> (TableRegistry, GId, GId) {
    let mut registry = TableRegistry::new();
    let equipment = registry.create(&TableConfig::new("equipment")).unwrap();
    let crew = registry
        .create(&TableConfig::new("crew").with_children(
            ChildModeConfig::dynamic("data", "data")
                .sourced_from("equipment", "all")
                .with_class_behaviors(behaviors),
        ))
        .unwrap();

    let order = GId::new(90, 1);
    let machine = GId::new(2, 1);
    let worker = GId::new(3, 1);

    {
        let mut equipment = equipment.borrow_mut();
        equipment.refresh_row(None, Some(&RowSnapshot::new(machine).with_label("Lathe"))).unwrap();
        upsert(&mut equipment, &item(20, 1, machine, span(3, 9, 10)).with_data(order));
        upsert(&mut equipment, &item(20, 2, machine, span(3, 14, 15)).with_data(order));
    }
    {
        let mut crew = crew.borrow_mut();
        crew.refresh_row(None, Some(&RowSnapshot::new(worker))).unwrap();
        upsert(&mut crew, &item(10, 1, worker, span(3, 8, 12)).with_data(order));
    }

    (registry, worker, machine)
}

fn visible_records(registry: &TableRegistry, worker: &GId) -> Vec<i64> {
    let crew = registry.get("crew").unwrap().borrow();
    let children = crew.dynamic_children(worker);
    assert_eq!(children.len(), 1);
    let child = children[0].borrow();
    let mut records: Vec<i64> = child
        .items()
        .filter(|item| item.visible)
        .map(|item| item.id.record.0)
        .collect();
    records.sort_unstable();
    records
}

/// Test that ExistsPair copies key matches regardless of time.
#[test]
fn exists_pair_copies_every_key_match() {
    let (registry, worker, _) = equipment_and_crew("20=ExistsPair");
    assert!(registry.resolve_all(span(3, 0, 23), true).unwrap());
    assert_eq!(visible_records(&registry, &worker), vec![1, 2]);
}

/// Test that SynchronPair copies only overlapping key matches.
#[test]
fn synchron_pair_requires_overlap() {
    let (registry, worker, _) = equipment_and_crew("20=SynchronPair");
    registry.resolve_all(span(3, 0, 23), true).unwrap();
    assert_eq!(visible_records(&registry, &worker), vec![1]);
}

/// Test that clones are reused across passes and carry the source's data.
#[test]
fn clones_are_stable_across_passes() {
    let (registry, worker, machine) = equipment_and_crew("20=ExistsPair");
    registry.resolve_all(span(3, 0, 23), true).unwrap();
    let first = Rc::clone(&registry.get("crew").unwrap().borrow().dynamic_children(&worker)[0]);
    assert_eq!(first.borrow().id, machine);
    assert_eq!(first.borrow().parent, Some(worker));
    assert_eq!(first.borrow().data.label, "Lathe");

    registry.resolve_all(span(3, 0, 22), false).unwrap();
    let second = Rc::clone(&registry.get("crew").unwrap().borrow().dynamic_children(&worker)[0]);
    assert!(Rc::ptr_eq(&first, &second));
}

/// Test that a pass only reruns when the window moves or it is forced.
#[test]
fn recompute_follows_window_changes() {
    let (registry, _, _) = equipment_and_crew("20=ExistsPair");
    let window = span(3, 0, 23);
    assert!(registry.resolve_all(window, false).unwrap());
    assert!(!registry.resolve_all(window, false).unwrap());
    assert!(registry.resolve_all(span(3, 1, 23), false).unwrap());
    assert!(registry.resolve_all(span(3, 1, 23), true).unwrap());
}

/// Test that restricting parents to the visible window drops keys outside it.
#[test]
fn visible_window_limits_parent_keys() {
    let mut registry = TableRegistry::new();
    let equipment = registry.create(&TableConfig::new("equipment")).unwrap();
    let mut children = ChildModeConfig::dynamic("data", "data").sourced_from("equipment", "");
    children.visible_window_only = true;
    let crew = registry.create(&TableConfig::new("crew").with_children(children)).unwrap();

    let order = GId::new(90, 1);
    let (machine, worker) = (GId::new(2, 1), GId::new(3, 1));
    upsert(&mut equipment.borrow_mut(), &item(20, 1, machine, span(4, 9, 10)).with_data(order));
    crew.borrow_mut().refresh_row(None, Some(&RowSnapshot::new(worker))).unwrap();
    upsert(&mut crew.borrow_mut(), &item(10, 1, worker, span(3, 8, 12)).with_data(order));

    registry.resolve_all(span(4, 0, 23), true).unwrap();
    assert!(crew.borrow().dynamic_children(&worker).is_empty());

    registry.resolve_all(span(3, 0, 23), true).unwrap();
    assert_eq!(crew.borrow().dynamic_children(&worker).len(), 1);
}

/// Test that a missing source table surfaces as an error.
#[test]
fn unknown_source_table_fails_resolution() {
    let mut registry = TableRegistry::new();
    registry
        .create(&TableConfig::new("crew").with_children(
            ChildModeConfig::dynamic("item", "item").sourced_from("machines", "all"),
        ))
        .unwrap();

    assert_eq!(
        registry.resolve_all(span(3, 0, 23), true),
        Err(GanttError::UnknownTable("machines".into()))
    );
}

/// Test that a source table held mutably elsewhere is reported busy.
#[test]
fn busy_source_table_is_reported() {
    let (registry, _, _) = equipment_and_crew("");
    let equipment = registry.get("equipment").unwrap();
    let _guard = equipment.borrow_mut();

    let crew = registry.get("crew").unwrap();
    let result = crew
        .borrow_mut()
        .resolve_dynamic_children(span(3, 0, 23), true, &registry);
    assert_eq!(result, Err(GanttError::TableBusy("equipment".into())));
}

/// Test that narrowing the window hides clone items whose parent key left
/// it, while the clone row itself survives.
#[test]
fn narrowing_window_hides_items_but_keeps_the_clone() {
    let mut registry = TableRegistry::new();
    let equipment = registry.create(&TableConfig::new("equipment")).unwrap();
    let mut children = ChildModeConfig::dynamic("data", "data")
        .sourced_from("equipment", "all")
        .with_class_behaviors("20=SynchronPair");
    children.visible_window_only = true;
    let crew = registry.create(&TableConfig::new("crew").with_children(children)).unwrap();

    let (morning, afternoon) = (GId::new(90, 1), GId::new(90, 2));
    let (machine, worker) = (GId::new(2, 1), GId::new(3, 1));
    {
        let mut equipment = equipment.borrow_mut();
        upsert(&mut equipment, &item(20, 1, machine, span(3, 9, 10)).with_data(morning));
        upsert(&mut equipment, &item(20, 2, machine, span(3, 14, 15)).with_data(afternoon));
    }
    {
        let mut crew = crew.borrow_mut();
        upsert(&mut crew, &item(10, 1, worker, span(3, 9, 10)).with_data(morning));
        upsert(&mut crew, &item(10, 2, worker, span(3, 14, 15)).with_data(afternoon));
    }

    registry.resolve_all(span(3, 0, 23), true).unwrap();
    let wide = Rc::clone(&crew.borrow().dynamic_children(&worker)[0]);
    assert_eq!(visible_records(&registry, &worker), vec![1, 2]);

    registry.resolve_all(span(3, 8, 12), false).unwrap();
    assert_eq!(visible_records(&registry, &worker), vec![1]);
    let narrow = Rc::clone(&crew.borrow().dynamic_children(&worker)[0]);
    assert!(Rc::ptr_eq(&wide, &narrow));
    // Hidden, not deleted.
    assert_eq!(narrow.borrow().items().count(), 2);
}

/// Test that a `roots` source scope leaves nested rows of the source table out.
#[test]
fn root_scope_skips_nested_source_rows() {
    let mut registry = TableRegistry::new();
    let equipment = registry.create(&TableConfig::new("equipment")).unwrap();
    let crew = registry
        .create(&TableConfig::new("crew").with_children(
            ChildModeConfig::dynamic("data", "data").sourced_from("equipment", "roots"),
        ))
        .unwrap();

    let order = GId::new(90, 1);
    let (line, lathe, worker) = (GId::new(2, 1), GId::new(2, 2), GId::new(3, 1));
    {
        let mut equipment = equipment.borrow_mut();
        equipment.refresh_row(None, Some(&RowSnapshot::new(line))).unwrap();
        equipment
            .refresh_row(None, Some(&RowSnapshot::new(lathe).with_parent(line)))
            .unwrap();
        upsert(&mut equipment, &item(20, 1, line, span(3, 9, 10)).with_data(order));
        upsert(&mut equipment, &item(20, 2, lathe, span(3, 9, 10)).with_data(order));
    }
    upsert(&mut crew.borrow_mut(), &item(10, 1, worker, span(3, 8, 12)).with_data(order));

    registry.resolve_all(span(3, 0, 23), true).unwrap();
    let crew = crew.borrow();
    let ids: Vec<GId> = crew
        .dynamic_children(&worker)
        .iter()
        .map(|child| child.borrow().id)
        .collect();
    assert_eq!(ids, vec![line]);
}

/// Equipment resolves its own dynamic children; crew sources those.
///
/// The nested `press` row matches both equipment roots, one per key, so it
/// is cloned under each of them.
fn shared_child_tables() -> (TableRegistry, GId, GId) {
    let (first, second) = (GId::new(90, 1), GId::new(90, 2));
    let (line_a, line_b, press, worker) =
        (GId::new(2, 1), GId::new(2, 2), GId::new(2, 3), GId::new(3, 1));

    let mut registry = TableRegistry::new();
    let equipment = registry
        .create(
            &TableConfig::new("equipment")
                .with_children(ChildModeConfig::dynamic("data", "data")),
        )
        .unwrap();
    let crew = registry
        .create(&TableConfig::new("crew").with_children(
            ChildModeConfig::dynamic("data", "data").sourced_from("equipment", "dynamic"),
        ))
        .unwrap();

    {
        let mut equipment = equipment.borrow_mut();
        equipment.refresh_row(None, Some(&RowSnapshot::new(line_a))).unwrap();
        equipment.refresh_row(None, Some(&RowSnapshot::new(line_b))).unwrap();
        equipment
            .refresh_row(None, Some(&RowSnapshot::new(press).with_parent(line_a)))
            .unwrap();
        upsert(&mut equipment, &item(20, 10, line_a, span(3, 9, 10)).with_data(first));
        upsert(&mut equipment, &item(20, 11, line_b, span(3, 9, 10)).with_data(second));
        upsert(&mut equipment, &item(20, 1, press, span(3, 9, 10)).with_data(first));
        upsert(&mut equipment, &item(20, 2, press, span(3, 11, 12)).with_data(second));
    }
    {
        let mut crew = crew.borrow_mut();
        crew.refresh_row(None, Some(&RowSnapshot::new(worker))).unwrap();
        upsert(&mut crew, &item(10, 1, worker, span(3, 8, 12)).with_data(first));
        upsert(&mut crew, &item(10, 2, worker, span(3, 8, 12)).with_data(second));
    }

    (registry, worker, press)
}

/// Test that a row cloned under several source parents becomes one child
/// carrying the items of every copy.
#[test]
fn dynamic_scope_merges_a_row_cloned_under_two_parents() {
    let (registry, worker, press) = shared_child_tables();
    registry.resolve_all(span(3, 0, 23), true).unwrap();

    {
        let equipment = registry.get("equipment").unwrap().borrow();
        assert_eq!(equipment.dynamic_children(&GId::new(2, 1)).len(), 1);
        assert_eq!(equipment.dynamic_children(&GId::new(2, 2)).len(), 1);
    }

    let child = Rc::clone(&registry.get("crew").unwrap().borrow().dynamic_children(&worker)[0]);
    assert_eq!(child.borrow().id, press);
    assert_eq!(child.borrow().parent, Some(worker));
    assert_eq!(visible_records(&registry, &worker), vec![1, 2]);
}

/// Test that repeated passes give the same children in the same order.
#[test]
fn dynamic_scope_order_is_stable_across_passes() {
    let (registry, worker, _) = shared_child_tables();
    let children = |registry: &TableRegistry| -> Vec<GId> {
        registry
            .get("crew")
            .unwrap()
            .borrow()
            .dynamic_children(&worker)
            .iter()
            .map(|child| child.borrow().id)
            .collect()
    };

    registry.resolve_all(span(3, 0, 23), true).unwrap();
    let first = children(&registry);
    for _ in 0..3 {
        registry.resolve_all(span(3, 0, 23), true).unwrap();
        assert_eq!(children(&registry), first);
    }
}
