use std::str::FromStr;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct GalleryItemRow {
    pub id: i64,
    pub kind: String,
    pub url: String,
    pub title: String,
}

impl GalleryItemRow {
    pub fn is_video(&self) -> bool {
        self.kind == GalleryKind::Video.as_str()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GalleryKind {
    Image,
    Video,
}

impl GalleryKind {
    pub fn as_str(self) -> &'static str {
        match self {
            GalleryKind::Image => "imagem",
            GalleryKind::Video => "video",
        }
    }
}

impl FromStr for GalleryKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "imagem" | "image" | "foto" => Ok(GalleryKind::Image),
            "video" | "vídeo" => Ok(GalleryKind::Video),
            other => Err(format!("unknown gallery kind: {other:?}")),
        }
    }
}
