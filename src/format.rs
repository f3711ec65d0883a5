use crate::source::Album;

pub const NO_TAGS: &str = "none";

pub fn format_info(album: &Album) -> String {
    let tags = if album.tags.is_empty() {
        NO_TAGS.to_string()
    } else {
        album.tags.join(", ")
    };

    format!(
        "📖 Title: {}\n🆔 ID: {}\n✍️ Author: {}\n📚 Chapters: {}\n📄 Pages: {}\n🏷️ Tags: {}",
        album.title,
        album.album_id,
        album.author,
        album.chapter_count(),
        album.total_pages(),
        tags
    )
}
