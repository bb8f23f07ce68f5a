//! MIME type to filetype table

use serde::{Deserialize, Serialize};

/// Filetypes the viewer knows about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Filetype {
    ImageJpeg,
    ImagePng,
    ImageApng,
    ImageGif,
    AnimationGif,
    ImageWebp,
    ImageBmp,
    ImageIcon,
    ImageTiff,
    ImageHeif,
    ImageHeic,
    ImageAvif,
    ImageJxl,
    ImageQoi,
    ImageSvg,
    ApplicationFlash,
    VideoFlv,
    VideoMp4,
    VideoWebm,
    VideoMkv,
    VideoMov,
    VideoAvi,
    VideoMpeg,
    VideoWmv,
    VideoOgv,
    VideoRealmedia,
    AudioMp3,
    AudioOgg,
    AudioFlac,
    AudioWave,
    AudioM4a,
    AudioWma,
    AudioWavpack,
    AudioTrueaudio,
    AudioRealmedia,
    ApplicationPdf,
    ApplicationEpub,
    ApplicationDjvu,
    ApplicationPsd,
    ApplicationKrita,
    ApplicationClip,
    ApplicationXcf,
    ApplicationProcreate,
    ApplicationZip,
    ApplicationRar,
    Application7z,
    ApplicationGzip,
    ApplicationJson,
    TextPlain,
    TextHtml,
    ApplicationOctetStream,
    ApplicationUnknown,
}

/// (mime, filetype, human-readable name, has thumbnail)
const MIME_TABLE: &[(&str, Filetype, &str, bool)] = &[
    ("image/jpeg", Filetype::ImageJpeg, "jpeg", true),
    ("image/png", Filetype::ImagePng, "png", true),
    ("image/apng", Filetype::ImageApng, "apng", true),
    ("image/gif", Filetype::ImageGif, "static gif", true),
    ("animation/gif", Filetype::AnimationGif, "animated gif", true),
    ("image/webp", Filetype::ImageWebp, "webp", true),
    ("image/bmp", Filetype::ImageBmp, "bitmap", true),
    ("image/x-icon", Filetype::ImageIcon, "icon", true),
    ("image/vnd.microsoft.icon", Filetype::ImageIcon, "icon", true),
    ("image/tiff", Filetype::ImageTiff, "tiff", true),
    ("image/heif", Filetype::ImageHeif, "heif", true),
    ("image/heic", Filetype::ImageHeic, "heic", true),
    ("image/avif", Filetype::ImageAvif, "avif", true),
    ("image/jxl", Filetype::ImageJxl, "jpegxl", true),
    ("image/qoi", Filetype::ImageQoi, "qoi", true),
    ("image/svg+xml", Filetype::ImageSvg, "svg", true),
    ("application/x-shockwave-flash", Filetype::ApplicationFlash, "flash", true),
    ("video/x-flv", Filetype::VideoFlv, "flv", true),
    ("video/mp4", Filetype::VideoMp4, "mp4", true),
    ("video/webm", Filetype::VideoWebm, "webm", true),
    ("video/x-matroska", Filetype::VideoMkv, "matroska", true),
    ("video/quicktime", Filetype::VideoMov, "quicktime", true),
    ("video/x-msvideo", Filetype::VideoAvi, "avi", true),
    ("video/mpeg", Filetype::VideoMpeg, "mpeg", true),
    ("video/x-ms-wmv", Filetype::VideoWmv, "wmv", true),
    ("video/ogg", Filetype::VideoOgv, "ogv", true),
    ("video/vnd.rn-realvideo", Filetype::VideoRealmedia, "realvideo", true),
    ("audio/mp3", Filetype::AudioMp3, "mp3", false),
    ("audio/mpeg", Filetype::AudioMp3, "mp3", false),
    ("audio/ogg", Filetype::AudioOgg, "ogg", false),
    ("audio/flac", Filetype::AudioFlac, "flac", false),
    ("audio/x-wav", Filetype::AudioWave, "wave", false),
    ("audio/wav", Filetype::AudioWave, "wave", false),
    ("audio/mp4", Filetype::AudioM4a, "m4a", false),
    ("audio/x-ms-wma", Filetype::AudioWma, "wma", false),
    ("audio/wavpack", Filetype::AudioWavpack, "wavpack", false),
    ("audio/x-tta", Filetype::AudioTrueaudio, "tta", false),
    ("audio/vnd.rn-realaudio", Filetype::AudioRealmedia, "realaudio", false),
    ("application/pdf", Filetype::ApplicationPdf, "pdf", true),
    ("application/epub+zip", Filetype::ApplicationEpub, "epub", true),
    ("image/vnd.djvu", Filetype::ApplicationDjvu, "djvu", true),
    ("image/vnd.adobe.photoshop", Filetype::ApplicationPsd, "psd", true),
    ("application/x-krita", Filetype::ApplicationKrita, "krita", true),
    ("application/clip", Filetype::ApplicationClip, "clip", true),
    ("application/x-xcf", Filetype::ApplicationXcf, "xcf", true),
    ("application/x-procreate", Filetype::ApplicationProcreate, "procreate", true),
    ("application/zip", Filetype::ApplicationZip, "zip", false),
    ("application/vnd.rar", Filetype::ApplicationRar, "rar", false),
    ("application/x-7z-compressed", Filetype::Application7z, "7z", false),
    ("application/gzip", Filetype::ApplicationGzip, "gzip", false),
    ("application/json", Filetype::ApplicationJson, "json", false),
    ("text/plain", Filetype::TextPlain, "plaintext", false),
    ("text/html", Filetype::TextHtml, "html", false),
    (
        "application/octet-stream",
        Filetype::ApplicationOctetStream,
        "application/octet-stream",
        false,
    ),
];

fn lookup(mime: &str) -> Option<&'static (&'static str, Filetype, &'static str, bool)> {
    let mime = mime.trim();
    MIME_TABLE
        .iter()
        .find(|(known, ..)| known.eq_ignore_ascii_case(mime))
}

/// Map a MIME string to a filetype; unknown MIME types map to `ApplicationUnknown`
pub fn filetype_for_mime(mime: &str) -> Filetype {
    lookup(mime)
        .map(|(_, filetype, ..)| *filetype)
        .unwrap_or(Filetype::ApplicationUnknown)
}

/// Human-readable type name, or the MIME string itself when it is not in the table
pub fn filetype_string(mime: &str) -> String {
    match lookup(mime) {
        Some((_, _, human, _)) => (*human).to_string(),
        None => mime.to_string(),
    }
}

impl Filetype {
    /// Whether the server generates a thumbnail for this filetype
    pub fn has_thumbnail(&self) -> bool {
        MIME_TABLE
            .iter()
            .find(|(_, filetype, ..)| filetype == self)
            .map(|(.., thumb)| *thumb)
            .unwrap_or(false)
    }
}
