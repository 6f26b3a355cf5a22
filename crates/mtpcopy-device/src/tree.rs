//! Helpers for building device trees from flat listings

use mtpcopy_types::{DeviceEntry, DeviceFolder};

/// Insert `entry` into the folder reached by `segments`, creating missing
/// folders on the way. Created folders take their id from `make_id`, which
/// receives the segments leading to the new folder.
pub(crate) fn insert_at<F>(
    folder: &mut DeviceFolder,
    segments: &[String],
    depth: usize,
    entry: Option<DeviceEntry>,
    make_id: &mut F,
) where
    F: FnMut(&[String]) -> String,
{
    let Some(first) = segments.get(depth) else {
        if let Some(entry) = entry {
            folder.children.push(entry);
        }
        return;
    };

    let existing = folder
        .children
        .iter()
        .position(|child| matches!(child, DeviceEntry::Folder(f) if f.name == *first));
    let index = existing.unwrap_or_else(|| {
        let id = make_id(&segments[..=depth]);
        folder
            .children
            .push(DeviceFolder::new(id, first.clone()).into());
        folder.children.len() - 1
    });

    if let DeviceEntry::Folder(child) = &mut folder.children[index] {
        insert_at(child, segments, depth + 1, entry, make_id);
    }
}

/// Split a `/`-separated folder path into its non-empty segments
pub(crate) fn split_segments(path: &str) -> Vec<String> {
    path.split('/')
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use mtpcopy_types::DeviceFile;

    #[test]
    fn test_insert_creates_and_reuses_folders() {
        let mut root = DeviceFolder::new("root", "");
        let mut id = |segments: &[String]| segments.join("/");

        let path = split_segments("/DCIM/Camera");
        insert_at(&mut root, &path, 0, Some(DeviceFile::new("1", "a.jpg").into()), &mut id);
        insert_at(&mut root, &path, 0, Some(DeviceFile::new("2", "b.jpg").into()), &mut id);

        let dcim = root.folders().next().unwrap();
        assert_eq!(dcim.id, "DCIM");
        let camera = dcim.folders().next().unwrap();
        assert_eq!(camera.id, "DCIM/Camera");
        let names: Vec<_> = camera.files().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["a.jpg", "b.jpg"]);
        assert_eq!(root.children.len(), 1);
    }
}
