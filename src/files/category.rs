//! Coarse file categories used to pick a rendering path

use serde::{Deserialize, Serialize};

use super::filetype::Filetype;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FileCategory {
    Image,
    Video,
    Audio,
    Flash,
    Unsupported,
}

const IMAGE_TYPES: &[Filetype] = &[
    Filetype::ImageJpeg,
    Filetype::ImagePng,
    Filetype::ImageApng,
    Filetype::ImageGif,
    Filetype::AnimationGif,
    Filetype::ImageWebp,
    Filetype::ImageBmp,
    Filetype::ImageIcon,
    Filetype::ImageAvif,
    Filetype::ImageJxl,
    Filetype::ImageSvg,
];

const VIDEO_TYPES: &[Filetype] = &[
    Filetype::VideoMp4,
    Filetype::VideoWebm,
    Filetype::VideoMkv,
    Filetype::VideoMov,
    Filetype::VideoOgv,
];

const AUDIO_TYPES: &[Filetype] = &[
    Filetype::AudioMp3,
    Filetype::AudioOgg,
    Filetype::AudioFlac,
    Filetype::AudioWave,
    Filetype::AudioM4a,
];

const FLASH_TYPES: &[Filetype] = &[Filetype::ApplicationFlash];

/// Category for a filetype; anything not in a table is `Unsupported`
pub fn category(filetype: Filetype) -> FileCategory {
    if IMAGE_TYPES.contains(&filetype) {
        FileCategory::Image
    } else if VIDEO_TYPES.contains(&filetype) {
        FileCategory::Video
    } else if AUDIO_TYPES.contains(&filetype) {
        FileCategory::Audio
    } else if FLASH_TYPES.contains(&filetype) {
        FileCategory::Flash
    } else {
        FileCategory::Unsupported
    }
}
