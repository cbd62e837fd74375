//! Font registration.
//!
//! Maps a configured family name (or an explicit font file) to glyph bytes so
//! Hangul labels render in both the egui dashboard and the static renderer.
//! A missing family is replaced by the first substitute found on the system;
//! when nothing matches, egui keeps its default glyph set.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use walkdir::WalkDir;

const FONT_EXTENSIONS: [&str; 3] = ["ttf", "otf", "ttc"];

/// Tried in order when the configured font is missing. Hangul faces first.
pub const SUBSTITUTE_FAMILIES: [&str; 6] = [
    "NanumGothic",
    "Noto Sans CJK",
    "Noto Sans KR",
    "malgun",
    "AppleSDGothicNeo",
    "DejaVu Sans",
];

/// Looks up font files by family name.
pub trait FontSource {
    fn find(&self, family: &str) -> Option<PathBuf>;
}

/// Searches font directories for a file whose stem matches the family.
#[derive(Debug, Clone, Default)]
pub struct DirectoryFontSource {
    dirs: Vec<PathBuf>,
}

impl DirectoryFontSource {
    pub fn new(dirs: Vec<PathBuf>) -> Self {
        Self { dirs }
    }

    /// Configured directories first, then the platform's usual font locations.
    pub fn with_platform_dirs(extra: &[PathBuf]) -> Self {
        let mut dirs = extra.to_vec();
        dirs.extend(platform_font_dirs());
        Self { dirs }
    }
}

/// Lowercase with spaces, hyphens and underscores removed.
fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| !matches!(c, ' ' | '-' | '_'))
        .flat_map(char::to_lowercase)
        .collect()
}

fn is_font_file(path: &Path) -> bool {
    path.extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .is_some_and(|e| FONT_EXTENSIONS.contains(&e.as_str()))
}

impl FontSource for DirectoryFontSource {
    fn find(&self, family: &str) -> Option<PathBuf> {
        let wanted = normalize(family);
        // Exact stem first ("NanumGothic.ttf"), then the regular face of a family
        // ("NotoSansKR-Regular.otf").
        let regular = format!("{wanted}regular");

        let mut fallback = None;
        for dir in self.dirs.iter().filter(|d| d.is_dir()) {
            for entry in WalkDir::new(dir).follow_links(true).into_iter().flatten() {
                let path = entry.path();
                if !entry.file_type().is_file() || !is_font_file(path) {
                    continue;
                }
                let stem = path
                    .file_stem()
                    .map(|s| normalize(&s.to_string_lossy()))
                    .unwrap_or_default();
                if stem == wanted {
                    return Some(path.to_path_buf());
                }
                if stem == regular && fallback.is_none() {
                    fallback = Some(path.to_path_buf());
                }
            }
        }
        fallback
    }
}

pub fn platform_font_dirs() -> Vec<PathBuf> {
    let mut dirs = Vec::new();
    if cfg!(target_os = "windows") {
        let windir = std::env::var_os("WINDIR").unwrap_or_else(|| "C:\\Windows".into());
        dirs.push(PathBuf::from(windir).join("Fonts"));
        if let Some(local) = std::env::var_os("LOCALAPPDATA") {
            dirs.push(PathBuf::from(local).join("Microsoft").join("Windows").join("Fonts"));
        }
    } else if cfg!(target_os = "macos") {
        dirs.push(PathBuf::from("/System/Library/Fonts"));
        dirs.push(PathBuf::from("/Library/Fonts"));
        if let Some(home) = std::env::var_os("HOME") {
            dirs.push(PathBuf::from(home).join("Library").join("Fonts"));
        }
    } else {
        dirs.push(PathBuf::from("/usr/share/fonts"));
        dirs.push(PathBuf::from("/usr/local/share/fonts"));
        if let Some(home) = std::env::var_os("HOME") {
            let home = PathBuf::from(home);
            dirs.push(home.join(".local").join("share").join("fonts"));
            dirs.push(home.join(".fonts"));
        }
    }
    dirs
}

/// A font chosen for the session. `data` is `None` when only the default glyphs are available.
#[derive(Debug, Clone, Default)]
pub struct ResolvedFont {
    pub family: String,
    pub path: Option<PathBuf>,
    pub data: Option<Arc<Vec<u8>>>,
}

impl ResolvedFont {
    pub fn is_fallback(&self) -> bool {
        self.data.is_none()
    }
}

/// Resolves the configured font once at startup.
pub struct FontRegistry<S: FontSource = DirectoryFontSource> {
    source: S,
}

impl<S: FontSource> FontRegistry<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    /// Resolve an explicit file, else a family name, else the first substitute
    /// family present on the system. Never fails: when nothing is usable the
    /// result has no glyph data.
    pub fn resolve(&self, family: &str, explicit_path: Option<&Path>) -> ResolvedFont {
        let requested = match explicit_path {
            Some(p) => Some(p.to_path_buf()),
            None if family.trim().is_empty() => None,
            None => self.source.find(family),
        };

        match requested {
            Some(path) => {
                if let Some(font) = Self::read(family, path) {
                    return font;
                }
            }
            None => tracing::warn!(family, "Font not found"),
        }

        let wanted = normalize(family);
        for &substitute in SUBSTITUTE_FAMILIES.iter().filter(|s| normalize(s) != wanted) {
            if let Some(font) = self
                .source
                .find(substitute)
                .and_then(|path| Self::read(substitute, path))
            {
                tracing::warn!(family, substitute, "Substituting font");
                return font;
            }
        }

        tracing::warn!(family, "No usable font, using default glyphs");
        ResolvedFont {
            family: family.to_string(),
            ..Default::default()
        }
    }

    fn read(family: &str, path: PathBuf) -> Option<ResolvedFont> {
        match fs::read(&path) {
            Ok(bytes) => {
                tracing::info!(family, path = %path.display(), "Registered font");
                Some(ResolvedFont {
                    family: family.to_string(),
                    path: Some(path),
                    data: Some(Arc::new(bytes)),
                })
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to read font");
                None
            }
        }
    }
}

/// Register the resolved font as the primary proportional font of egui.
pub fn install_egui_font(ctx: &egui::Context, font: &ResolvedFont) {
    let Some(data) = &font.data else {
        return;
    };

    let name = if font.family.is_empty() {
        "custom".to_string()
    } else {
        font.family.clone()
    };

    let mut fonts = egui::FontDefinitions::default();
    fonts.font_data.insert(
        name.clone(),
        egui::FontData::from_owned(data.to_vec()).into(),
    );
    fonts
        .families
        .entry(egui::FontFamily::Proportional)
        .or_default()
        .insert(0, name.clone());
    fonts
        .families
        .entry(egui::FontFamily::Monospace)
        .or_default()
        .push(name);
    ctx.set_fonts(fonts);
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn font_dir(files: &[&str]) -> TempDir {
        let dir = TempDir::new().unwrap();
        for f in files {
            let path = dir.path().join(f);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).unwrap();
            }
            fs::write(path, b"glyphs").unwrap();
        }
        dir
    }

    #[test]
    fn finds_family_by_normalized_stem() {
        let dir = font_dir(&["truetype/nanum/NanumGothic.ttf", "readme.txt"]);
        let source = DirectoryFontSource::new(vec![dir.path().to_path_buf()]);
        let found = source.find("Nanum Gothic").unwrap();
        assert!(found.ends_with("NanumGothic.ttf"));
    }

    #[test]
    fn falls_back_to_regular_face() {
        let dir = font_dir(&["NotoSansKR-Bold.otf", "NotoSansKR-Regular.otf"]);
        let source = DirectoryFontSource::new(vec![dir.path().to_path_buf()]);
        let found = source.find("Noto Sans KR").unwrap();
        assert!(found.ends_with("NotoSansKR-Regular.otf"));
    }

    #[test]
    fn resolve_reads_font_bytes() {
        let dir = font_dir(&["NanumGothic.ttf"]);
        let registry = FontRegistry::new(DirectoryFontSource::new(vec![dir.path().to_path_buf()]));
        let font = registry.resolve("NanumGothic", None);
        assert!(!font.is_fallback());
        assert_eq!(font.data.as_deref().map(Vec::as_slice), Some(&b"glyphs"[..]));
    }

    #[test]
    fn missing_font_is_fallback() {
        let dir = font_dir(&[]);
        let registry = FontRegistry::new(DirectoryFontSource::new(vec![dir.path().to_path_buf()]));
        let font = registry.resolve("Malgun Gothic", None);
        assert!(font.is_fallback());
        assert_eq!(font.family, "Malgun Gothic");

        let unreadable = registry.resolve("x", Some(Path::new("/nonexistent/font.ttf")));
        assert!(unreadable.is_fallback());
    }

    #[test]
    fn missing_family_uses_substitute() {
        let dir = font_dir(&["dejavu/DejaVuSans.ttf"]);
        let registry = FontRegistry::new(DirectoryFontSource::new(vec![dir.path().to_path_buf()]));
        let font = registry.resolve("Malgun Gothic", None);
        assert!(!font.is_fallback());
        assert_eq!(font.family, "DejaVu Sans");
        assert!(font.path.unwrap().ends_with("DejaVuSans.ttf"));
    }

    #[test]
    fn explicit_file_wins_over_family_search() {
        let dir = font_dir(&["NanumGothic.ttf", "custom/MyHangul.otf"]);
        let registry = FontRegistry::new(DirectoryFontSource::new(vec![dir.path().to_path_buf()]));
        let explicit = dir.path().join("custom/MyHangul.otf");
        let font = registry.resolve("NanumGothic", Some(&explicit));
        assert_eq!(font.path.as_deref(), Some(explicit.as_path()));
        assert_eq!(font.family, "NanumGothic");
    }
}
