//! In-memory host seeded with one article for the demo commands.

use std::path::Path;
use std::sync::Arc;

use enrich_blocks::{EntityRef, MemoryHost};
use enrich_core::{ColorPair, HexColor};

pub const DEMO_ENTITY: EntityRef = EntityRef::new(1, 1);

const DEMO_TITLE: &str = "City council approves new cycling network";
const DEMO_CONTENT: &str = "<p>The city council on Tuesday approved a plan to build 40 kilometres \
of protected bike lanes over the next three years.</p><p>Supporters say the network will cut \
traffic deaths and commuting costs, while some shop owners worry about the loss of parking \
spaces along the main shopping streets.</p><p>Construction of the first corridor is expected \
to begin in spring, funded partly by a regional climate grant.</p>";

/// Article to load into the demo host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DemoArticle {
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
}

impl Default for DemoArticle {
    fn default() -> Self {
        Self {
            title: DEMO_TITLE.to_string(),
            content: DEMO_CONTENT.to_string(),
            tags: vec!["Local".to_string()],
        }
    }
}

impl DemoArticle {
    /// Reads HTML or plain text content from `path`; the title defaults to
    /// the file stem.
    pub fn from_file(path: &Path, title: Option<String>) -> std::io::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let title = title.unwrap_or_else(|| {
            path.file_stem()
                .and_then(|stem| stem.to_str())
                .unwrap_or_default()
                .to_string()
        });
        Ok(Self {
            title,
            content,
            tags: Vec::new(),
        })
    }
}

/// Host with `article` stored under [`DEMO_ENTITY`] and a few existing
/// labels for its owner.
pub fn seeded_host(article: DemoArticle) -> Arc<MemoryHost> {
    let host = MemoryHost::new();
    host.insert_article(DEMO_ENTITY, article.title, article.content, article.tags);
    for (caption, bg) in [
        ("Politics", HexColor::new(0x99, 0x33, 0x33)),
        ("Transport", HexColor::new(0x33, 0x66, 0x99)),
    ] {
        host.add_label(DEMO_ENTITY.owner_uid, caption, ColorPair::for_background(bg));
    }
    Arc::new(host)
}
