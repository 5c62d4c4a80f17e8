/// File categorization by extension.
///
/// This module maps file names to the category folder they belong in. Matching is a
/// plain, case-sensitive suffix comparison against each category's extension set;
/// case variants such as `jpg` and `JPG` are listed explicitly.
///
/// # Examples
///
/// ```
/// use sorthat::file_category::{Category, ClassificationTable};
///
/// let table = ClassificationTable::default();
/// assert_eq!(table.classify("song.mp3"), Some(Category::Audio));
/// assert_eq!(table.classify("HOLIDAY.JPG"), Some(Category::Photos));
/// assert_eq!(table.classify("notes.TXT"), None);
/// ```
use serde::{Deserialize, Serialize};

/// A destination bucket for sorted files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Video files (MP4, MKV, AVI, etc.)
    Movies,
    /// Image files (JPG, PNG, GIF)
    Photos,
    /// Audio files (MP3, FLAC, WAV, etc.)
    Audio,
    /// Document files (TXT, PDF, DOCX, etc.)
    Documents,
    /// Executables and scripts (EXE, SH, PY, etc.)
    Applications,
    /// Catch-all for anything left over after the extension pass
    Misc,
}

impl Category {
    /// Every category, in the order files are sorted into them.
    pub const ALL: [Category; 6] = [
        Category::Movies,
        Category::Photos,
        Category::Audio,
        Category::Documents,
        Category::Applications,
        Category::Misc,
    ];

    /// Returns the folder name for this category.
    ///
    /// # Examples
    ///
    /// ```
    /// use sorthat::file_category::Category;
    ///
    /// assert_eq!(Category::Movies.dir_name(), "movies");
    /// assert_eq!(Category::Misc.dir_name(), "misc");
    /// ```
    pub fn dir_name(&self) -> &'static str {
        match self {
            Category::Movies => "movies",
            Category::Photos => "photos",
            Category::Audio => "audio",
            Category::Documents => "documents",
            Category::Applications => "applications",
            Category::Misc => "misc",
        }
    }

    /// Returns true for the catch-all category, which never owns extensions.
    pub fn is_catch_all(&self) -> bool {
        matches!(self, Category::Misc)
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.dir_name())
    }
}

/// Errors raised while building a classification table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableError {
    /// The extension is empty once its leading dots are removed.
    EmptyExtension,
    /// Extensions cannot be assigned to the catch-all category.
    CatchAllExtension { extension: String },
    /// The extension already belongs to a different category.
    OverlappingExtension {
        extension: String,
        existing: Category,
        requested: Category,
    },
}

impl std::fmt::Display for TableError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TableError::EmptyExtension => f.write_str("extensions must not be empty"),
            TableError::CatchAllExtension { extension } => write!(
                f,
                "extension '{}' cannot be assigned to {}: it takes whatever is left",
                extension,
                Category::Misc
            ),
            TableError::OverlappingExtension {
                extension,
                existing,
                requested,
            } => write!(
                f,
                "extension '{}' requested for {} already belongs to {}",
                extension, requested, existing
            ),
        }
    }
}

impl std::error::Error for TableError {}

/// Maps categories to ordered, non-overlapping extension sets.
#[derive(Debug, Clone)]
pub struct ClassificationTable {
    sets: Vec<(Category, Vec<String>)>,
}

impl ClassificationTable {
    /// Creates a table with the standard extension sets.
    pub fn new() -> Self {
        let mut table = Self::empty();
        table.populate_standard_sets();
        table
    }

    /// Creates a table where every category has an empty extension set.
    pub fn empty() -> Self {
        Self {
            sets: Category::ALL
                .iter()
                .filter(|category| !category.is_catch_all())
                .map(|category| (*category, Vec::new()))
                .collect(),
        }
    }

    fn populate_standard_sets(&mut self) {
        let standard: [(Category, &[&str]); 5] = [
            (
                Category::Movies,
                &["wmv", "avi", "mov", "flv", "mkv", "mp4", "webm", "3gp"],
            ),
            (
                Category::Photos,
                &["jpg", "JPG", "jpeg", "JPEG", "png", "PNG", "gif", "GIF"],
            ),
            (Category::Audio, &["m4a", "flac", "wav", "mp3", "wma", "aac"]),
            (
                Category::Documents,
                &["txt", "pdf", "doc", "docx", "html", "HTML", "xls"],
            ),
            (
                Category::Applications,
                &["exe", "py", "sh", "dll", "ps1", "bat", "msi"],
            ),
        ];

        for (category, extensions) in standard {
            if let Some((_, set)) = self.sets.iter_mut().find(|(c, _)| *c == category) {
                set.extend(extensions.iter().map(|ext| ext.to_string()));
            }
        }
    }

    /// Adds an extension to a category's set.
    ///
    /// A leading dot is stripped. Adding an extension the category already has is a
    /// no-op; the case of the extension is kept as given.
    ///
    /// # Errors
    ///
    /// Fails when the extension is empty (or only dots), when the category is
    /// [`Category::Misc`], or when another category already owns the extension.
    pub fn add_extension(&mut self, category: Category, ext: &str) -> Result<(), TableError> {
        let ext = ext.trim_start_matches('.');
        if ext.is_empty() {
            return Err(TableError::EmptyExtension);
        }
        if category.is_catch_all() {
            return Err(TableError::CatchAllExtension {
                extension: ext.to_string(),
            });
        }

        if let Some(existing) = self.owner_of(ext) {
            if existing == category {
                return Ok(());
            }
            return Err(TableError::OverlappingExtension {
                extension: ext.to_string(),
                existing,
                requested: category,
            });
        }

        if let Some((_, set)) = self.sets.iter_mut().find(|(c, _)| *c == category) {
            set.push(ext.to_string());
        }
        Ok(())
    }

    /// Returns the extension set of a category, in insertion order.
    pub fn extensions(&self, category: Category) -> &[String] {
        self.sets
            .iter()
            .find(|(c, _)| *c == category)
            .map(|(_, set)| set.as_slice())
            .unwrap_or(&[])
    }

    /// Returns the category owning an exact extension string.
    pub fn owner_of(&self, ext: &str) -> Option<Category> {
        self.sets
            .iter()
            .find(|(_, set)| set.iter().any(|e| e == ext))
            .map(|(category, _)| *category)
    }

    /// Returns true if `file_name` carries one of the category's extensions.
    pub fn matches(&self, category: Category, file_name: &str) -> bool {
        self.extensions(category)
            .iter()
            .any(|ext| has_extension(file_name, ext))
    }

    /// Classifies a file name, returning `None` when no extension set matches.
    pub fn classify(&self, file_name: &str) -> Option<Category> {
        self.sets
            .iter()
            .find(|(_, set)| set.iter().any(|ext| has_extension(file_name, ext)))
            .map(|(category, _)| *category)
    }
}

impl Default for ClassificationTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Case-sensitive `*.ext` match. The name needs at least one character before the dot.
fn has_extension(file_name: &str, ext: &str) -> bool {
    file_name
        .strip_suffix(ext)
        .and_then(|rest| rest.strip_suffix('.'))
        .is_some_and(|stem| !stem.is_empty())
}
