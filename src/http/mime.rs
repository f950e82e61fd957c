//! Content-Type classification.
//!
//! Only the primary `type/subtype` token is classified; parameters after
//! `"; "` (charset, boundary, ...) are ignored.

/// MIME types understood by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mime {
    ApplicationJson,
    ApplicationOctetStream,
    ApplicationPdf,
    ApplicationGzip,
    ApplicationTar,
    ApplicationRar,

    TextPlain,
    TextHtml,

    ImageJpeg,
    ImagePng,
    ImageGif,
    ImageWebp,

    /// A Content-Type that is present but not in the table.
    Unrecognized,
}

const TABLE: &[(&[u8], &[u8], Mime)] = &[
    (b"application/", b"json", Mime::ApplicationJson),
    (b"application/", b"octet-stream", Mime::ApplicationOctetStream),
    (b"application/", b"pdf", Mime::ApplicationPdf),
    (b"application/", b"gzip", Mime::ApplicationGzip),
    (b"application/", b"x-tar", Mime::ApplicationTar),
    (b"application/", b"vnd.rar", Mime::ApplicationRar),
    (b"text/", b"plain", Mime::TextPlain),
    (b"text/", b"html", Mime::TextHtml),
    (b"image/", b"jpeg", Mime::ImageJpeg),
    (b"image/", b"png", Mime::ImagePng),
    (b"image/", b"gif", Mime::ImageGif),
    (b"image/", b"webp", Mime::ImageWebp),
];

impl Mime {
    /// Classifies a raw Content-Type value.
    ///
    /// ```
    /// # use cupido::http::mime::Mime;
    /// assert_eq!(Mime::classify(b"text/html; charset=utf-8"), Mime::TextHtml);
    /// assert_eq!(Mime::classify(b"audio/mpeg"), Mime::Unrecognized);
    /// ```
    pub fn classify(value: &[u8]) -> Mime {
        let primary = match value.windows(2).position(|w| w == b"; ") {
            Some(at) => &value[..at],
            None => value,
        };

        TABLE
            .iter()
            .find(|(prefix, subtype, _)| {
                primary
                    .strip_prefix(*prefix)
                    .is_some_and(|rest| rest == *subtype)
            })
            .map(|(_, _, mime)| *mime)
            .unwrap_or(Mime::Unrecognized)
    }

    /// The canonical `type/subtype` string, suitable for a response
    /// `Content-Type` field. `None` for [`Mime::Unrecognized`].
    pub fn as_str(&self) -> Option<&'static str> {
        let s = match self {
            Mime::ApplicationJson => "application/json",
            Mime::ApplicationOctetStream => "application/octet-stream",
            Mime::ApplicationPdf => "application/pdf",
            Mime::ApplicationGzip => "application/gzip",
            Mime::ApplicationTar => "application/x-tar",
            Mime::ApplicationRar => "application/vnd.rar",
            Mime::TextPlain => "text/plain",
            Mime::TextHtml => "text/html",
            Mime::ImageJpeg => "image/jpeg",
            Mime::ImagePng => "image/png",
            Mime::ImageGif => "image/gif",
            Mime::ImageWebp => "image/webp",
            Mime::Unrecognized => return None,
        };
        Some(s)
    }

    /// Maps a file extension (without the dot, case-insensitive) onto the table.
    pub fn from_extension(ext: &str) -> Option<Mime> {
        let mime = match ext.to_ascii_lowercase().as_str() {
            "json" => Mime::ApplicationJson,
            "bin" => Mime::ApplicationOctetStream,
            "pdf" => Mime::ApplicationPdf,
            "gz" => Mime::ApplicationGzip,
            "tar" => Mime::ApplicationTar,
            "rar" => Mime::ApplicationRar,
            "txt" => Mime::TextPlain,
            "html" | "htm" => Mime::TextHtml,
            "jpg" | "jpeg" => Mime::ImageJpeg,
            "png" => Mime::ImagePng,
            "gif" => Mime::ImageGif,
            "webp" => Mime::ImageWebp,
            _ => return None,
        };
        Some(mime)
    }
}
