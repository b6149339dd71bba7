use image::{Rgba, RgbaImage};
use papyrlab_core::{FragmentId, WorkingArea};
use papyrlab_layout::{back_image_path, FragmentSpec, Project};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn write_png(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
    let path = dir.join(name);
    let mut img = RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 0]));
    // Opaque block in the right half only
    for y in 0..height {
        for x in width / 2..width {
            img.put_pixel(x, y, Rgba([180, 150, 100, 255]));
        }
    }
    img.save(&path).unwrap();
    path
}

#[test]
fn test_batch_is_appended_below_existing_content() {
    let mut project = Project::new(WorkingArea::new(1000, 1000));
    project
        .import_sizes(&[FragmentSpec::new("a", 100, 300)])
        .unwrap();

    let ids = project
        .import_sizes(&[FragmentSpec::new("b", 50, 50), FragmentSpec::new("c", 60, 60)])
        .unwrap();
    assert_eq!(ids, vec![FragmentId(1), FragmentId(2)]);

    for id in ids {
        let fragment = project.registry.fragment(id).unwrap();
        assert!(fragment.bbox.top >= 300, "{:?}", fragment.bbox);
    }
}

#[test]
fn test_new_ids_fill_gaps() {
    let mut project = Project::new(WorkingArea::new(1000, 1000));
    project
        .import_sizes(&[
            FragmentSpec::new("a", 10, 10),
            FragmentSpec::new("b", 10, 10),
            FragmentSpec::new("c", 10, 10),
        ])
        .unwrap();
    project.registry.remove_fragment(FragmentId(1));

    let ids = project
        .import_sizes(&[FragmentSpec::new("d", 10, 10), FragmentSpec::new("e", 10, 10)])
        .unwrap();
    assert_eq!(ids, vec![FragmentId(1), FragmentId(3)]);
}

#[test]
fn test_working_area_grows_for_oversized_batch() {
    let mut project = Project::new(WorkingArea::new(100, 100));
    project
        .import_sizes(&[FragmentSpec::new("a", 80, 80), FragmentSpec::new("b", 80, 80)])
        .unwrap();
    assert_eq!(project.working_area, WorkingArea::new(260, 180));
}

#[test]
fn test_invalid_batch_leaves_project_untouched() {
    let mut project = Project::new(WorkingArea::new(100, 100));
    let err = project
        .import_sizes(&[FragmentSpec::new("a", 10, 10), FragmentSpec::new("b", 0, 10)])
        .unwrap_err();
    assert!(err.is_input_error());
    assert!(project.registry.is_empty());
}

#[test]
fn test_import_images() {
    let dir = TempDir::new().unwrap();
    let a = write_png(dir.path(), "frag_a.png", 40, 20);
    let b = write_png(dir.path(), "frag_b.png", 30, 30);
    let back = write_png(dir.path(), "frag_a_back.png", 40, 20);

    let mut project = Project::new(WorkingArea::new(1000, 1000));
    let ids = project
        .import_images(&[a.clone(), back.clone(), b.clone(), a.clone()])
        .unwrap();
    assert_eq!(ids.len(), 2);

    let fragment = project.registry.find_by_name("frag_a").unwrap();
    assert_eq!(fragment.filename, a);
    assert_eq!((fragment.bbox.width, fragment.bbox.height), (40, 20));
    let (x, y) = fragment.bbox.top_left();
    // Opaque pixels sit in columns 20..40
    assert!((fragment.center.0 - (x as f64 + 29.5)).abs() < 1e-9);
    assert!((fragment.center.1 - (y as f64 + 9.5)).abs() < 1e-9);
    assert_eq!(fragment.back_image_path(), Some(back));

    // Already imported images are skipped
    let again = project.import_images(&[a, b]).unwrap();
    assert!(again.is_empty());
    assert_eq!(project.registry.len(), 2);
}

#[test]
fn test_rejected_oversized_batch_keeps_working_area() {
    let dir = TempDir::new().unwrap();
    let recto = write_png(dir.path(), "frag_a.png", 20, 20);
    let verso = write_png(dir.path(), "frag_verso.png", 300, 300);
    let mut project = Project::new(WorkingArea::new(100, 100));

    let err = project.import_images(&[recto, verso]).unwrap_err();

    assert!(err.is_input_error());
    assert_eq!(project.working_area, WorkingArea::new(100, 100));
    assert!(project.registry.is_empty());
}

#[test]
fn test_verso_image_is_rejected() {
    let dir = TempDir::new().unwrap();
    let verso = write_png(dir.path(), "frag_verso.png", 10, 10);

    let mut project = Project::new(WorkingArea::new(100, 100));
    let err = project.import_images(&[verso]).unwrap_err();
    assert!(err.is_input_error());
    assert!(project.registry.is_empty());
}

#[test]
fn test_back_image_lookup() {
    let dir = TempDir::new().unwrap();
    let recto = write_png(dir.path(), "p1_recto.png", 4, 4);
    assert_eq!(back_image_path(&recto), None);

    let verso = write_png(dir.path(), "p1_verso.png", 4, 4);
    assert_eq!(back_image_path(&recto), Some(verso));

    let front = write_png(dir.path(), "p2_front.png", 4, 4);
    let back = write_png(dir.path(), "p2_back.png", 4, 4);
    assert_eq!(back_image_path(&front), Some(back));
}
