use papyrlab_core::{BoundingBox, FragmentId};
use papyrlab_layout::{Fragment, FragmentRegistry, Selection};

fn three_fragments() -> FragmentRegistry {
    let mut registry = FragmentRegistry::new();
    for i in 0..3u32 {
        let bbox = BoundingBox::new(0, (i * 200) as i32, 100, 100);
        registry
            .add_fragment(Fragment::new(FragmentId(i), format!("f{}", i), bbox))
            .unwrap();
    }
    registry
}

#[test]
fn test_click_toggles_single_fragment() {
    let registry = three_fragments();
    let mut selection = Selection::new();

    assert_eq!(selection.toggle_at(&registry, 50.0, 50.0), Some(FragmentId(0)));
    assert_eq!(selection.ids(), &[FragmentId(0)]);

    selection.toggle_at(&registry, 250.0, 50.0);
    assert_eq!(selection.ids(), &[FragmentId(0), FragmentId(1)]);

    selection.toggle_at(&registry, 50.0, 50.0);
    assert_eq!(selection.ids(), &[FragmentId(1)]);
}

#[test]
fn test_click_selects_whole_group() {
    let mut registry = three_fragments();
    registry
        .group_fragments(&[FragmentId(0), FragmentId(2)])
        .unwrap();
    let mut selection = Selection::new();

    selection.toggle_at(&registry, 450.0, 50.0);
    assert_eq!(selection.len(), 2);
    assert!(selection.contains(FragmentId(0)));
    assert!(selection.contains(FragmentId(2)));

    selection.toggle_at(&registry, 10.0, 10.0);
    assert!(selection.is_empty());
}

#[test]
fn test_click_on_empty_canvas_clears() {
    let registry = three_fragments();
    let mut selection = Selection::new();
    selection.toggle_at(&registry, 50.0, 50.0);

    assert_eq!(selection.toggle_at(&registry, 150.0, 50.0), None);
    assert!(selection.is_empty());
}

#[test]
fn test_move_selection_and_remove() {
    let mut registry = three_fragments();
    let mut selection = Selection::new();
    selection.add(FragmentId(1));
    selection.add(FragmentId(2));
    selection.add(FragmentId(1));
    assert_eq!(selection.len(), 2);

    selection.move_by(&mut registry, 10, 20);
    assert_eq!(
        registry.fragment(FragmentId(1)).unwrap().bbox,
        BoundingBox::new(20, 210, 100, 100)
    );
    assert_eq!(
        registry.fragment(FragmentId(0)).unwrap().bbox,
        BoundingBox::new(0, 0, 100, 100)
    );

    assert!(selection.remove(FragmentId(2)));
    assert!(!selection.remove(FragmentId(2)));
    assert_eq!(selection.ids(), &[FragmentId(1)]);
}
