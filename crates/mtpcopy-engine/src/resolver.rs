//! Virtual path resolution against a device tree

use mtpcopy_types::{DeviceFolder, Error, Result, VirtualPath};
use tracing::debug;

/// Walk `path` from `root`, one folder per segment
///
/// Each segment must match exactly one child folder by exact,
/// case-sensitive name. No match and several matches both fail with
/// `DirectoryNotFound`. Files with a matching name are ignored.
pub fn resolve<'a>(root: &'a DeviceFolder, path: &VirtualPath) -> Result<&'a DeviceFolder> {
    let mut current = root;

    for segment in path.segments() {
        let mut matches = current.folders().filter(|folder| folder.name == *segment);
        current = match (matches.next(), matches.next()) {
            (Some(folder), None) => folder,
            (None, _) => {
                debug!("No folder named '{}' while resolving {}", segment, path);
                return Err(Error::directory_not_found(path.to_string()));
            }
            (Some(_), Some(_)) => {
                debug!("Several folders named '{}' while resolving {}", segment, path);
                return Err(Error::directory_not_found(path.to_string()));
            }
        };
    }

    Ok(current)
}

/// Parse `raw` and resolve it from `root`
pub fn resolve_str<'a>(root: &'a DeviceFolder, raw: &str) -> Result<&'a DeviceFolder> {
    let path = VirtualPath::parse(raw)?;
    resolve(root, &path)
}
