use std::{
    fs,
    path::{Path, PathBuf},
};

use color_eyre::{Result, eyre::WrapErr as _};

pub const IMAGE_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "webp"];

pub fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
}

/// Image files directly inside `folder`, sorted
pub fn images_in(folder: &Path) -> Result<Vec<PathBuf>> {
    let mut images = vec![];
    for entry in read_dir(folder)? {
        let path = entry?.path();
        if path.is_file() && is_image(&path) {
            images.push(path);
        }
    }
    images.sort();
    Ok(images)
}

/// Names of the directories directly inside `folder`, sorted
pub fn subfolders(folder: &Path) -> Result<Vec<String>> {
    let mut names = vec![];
    for entry in read_dir(folder)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    names.sort();
    Ok(names)
}

pub fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn read_dir(folder: &Path) -> Result<fs::ReadDir> {
    fs::read_dir(folder).wrap_err_with(|| format!("Couldn't list {}", folder.display()))
}
