//! Output naming and encoding for stored preview files.

use std::fs;

use gcodepreview_core::view_image_filename;
use gcodepreview_renderer::{RgbaFrame, View};
use gcodepreview_service::encode_png;

#[test]
fn written_previews_follow_the_filename_convention() {
    let dir = tempfile::tempdir().unwrap();

    let frame = RgbaFrame {
        width: 4,
        height: 4,
        pixels: vec![128; 4 * 4 * 4],
    };

    for (index, view) in View::ALL.iter().enumerate() {
        let path = dir
            .path()
            .join(view_image_filename("test-job", index, view.name()));
        fs::write(&path, encode_png(&frame).unwrap()).unwrap();
    }

    let mut names: Vec<String> = fs::read_dir(dir.path())
        .unwrap()
        .map(|entry| entry.unwrap().file_name().into_string().unwrap())
        .collect();
    names.sort();

    assert_eq!(names.len(), 8);
    assert_eq!(names[0], "job_test-job_view_0_north_west.png");
    assert!(names.contains(&"job_test-job_view_7_north.png".to_string()));
    assert!(names.iter().all(|name| name.ends_with(".png")));
}
