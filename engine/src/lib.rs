use crate::image_model::ImageModel;

pub mod config;
pub mod data_uri;
pub mod download;
pub mod error;
pub mod image_model;
pub mod inputs;
pub mod output;
pub mod request_log;
pub mod studio;
pub mod tools;

pub type ImgModBox = Box<dyn ImageModel + Send + Sync>;

pub const APP_NAME: &str = "pixel_forge";
