use std::path::PathBuf;

use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

use crate::image_model::Provider;

pub mod face_to_many;
pub mod flux;
pub mod logo;
pub mod photo_maker;
pub mod sticker;

#[derive(
    Debug,
    Clone,
    Copy,
    Display,
    clap::ValueEnum,
    Serialize,
    Deserialize,
    Hash,
    PartialEq,
    Eq,
    EnumIter,
)]
pub enum Tool {
    #[strum(to_string = "FLUX image generator")]
    Flux,
    #[strum(to_string = "Face to many")]
    FaceToMany,
    #[strum(to_string = "Image to sticker")]
    Sticker,
    #[strum(to_string = "Logo generator")]
    Logo,
    #[strum(to_string = "PhotoMaker")]
    PhotoMaker,
}

impl Tool {
    pub fn provider(&self) -> Provider {
        match self {
            Tool::Flux => Provider::Fal,
            Tool::FaceToMany | Tool::Sticker | Tool::Logo | Tool::PhotoMaker => {
                Provider::Replicate
            }
        }
    }

    pub fn model_ref(&self) -> &'static str {
        match self {
            Tool::Flux => flux::MODEL,
            Tool::FaceToMany => face_to_many::MODEL,
            Tool::Sticker => sticker::MODEL,
            Tool::Logo => logo::MODEL,
            Tool::PhotoMaker => photo_maker::MODEL,
        }
    }

    /// Folder below the output dir
    pub fn output_subdir(&self) -> &'static str {
        match self {
            Tool::Flux => "generated_images",
            Tool::FaceToMany => "transformed_images",
            Tool::Sticker => "generated_stickers",
            Tool::Logo => "generated_logos",
            Tool::PhotoMaker => "photo_maker",
        }
    }

    pub fn log_file_name(&self) -> &'static str {
        match self {
            Tool::Flux => "flux_generation_log.json",
            Tool::FaceToMany => "face_transformation_log.json",
            Tool::Sticker => "sticker_generation_log.json",
            Tool::Logo => "logo_generation_log.json",
            Tool::PhotoMaker => "photomaker_log.json",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Tool::Flux => "jpg",
            _ => "png",
        }
    }
}

/// What a tool run produced. An empty `urls` means generation failed.
#[derive(Debug, Default, Clone)]
pub struct Outcome {
    pub urls: Vec<String>,
    pub saved: Vec<PathBuf>,
}

impl Outcome {
    pub fn generated(&self) -> bool {
        !self.urls.is_empty()
    }
}

/// Log entry timestamps are local wall-clock time without an offset
pub fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

#[cfg(test)]
pub(crate) mod testing {
    use std::{fs, path::PathBuf};

    use tempfile::TempDir;

    pub const PNG_BYTES: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 1, 2, 3];

    pub fn upload(dir: &TempDir, rel: &str) -> PathBuf {
        let path = dir.path().join("images_to_upload").join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, PNG_BYTES).unwrap();
        path
    }
}
