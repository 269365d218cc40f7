//! Fixed mapping between short language codes and display names.
//!
//! Entry order is the order languages are offered for selection.

use crate::error::TargetError;

/// Code used when a caller needs some language and has none.
pub const DEFAULT_CODE: &str = "en";

const BUILTIN_LANGUAGES: &[(&str, &str)] = &[
    ("en", "English"),
    ("hi", "Hindi"),
    ("bn", "Bengali"),
    ("es", "Spanish"),
    ("fr", "French"),
    ("de", "German"),
    ("ar", "Arabic"),
    ("ru", "Russian"),
    ("ja", "Japanese"),
    ("ko", "Korean"),
    ("it", "Italian"),
    ("pt", "Portuguese"),
    ("ur", "Urdu"),
    ("zh-cn", "Chinese (Simplified)"),
    ("zh-tw", "Chinese (Traditional)"),
];

static BUILTIN: LanguageRegistry = LanguageRegistry {
    entries: BUILTIN_LANGUAGES,
};

#[derive(Debug, Clone, Copy)]
pub struct LanguageRegistry {
    entries: &'static [(&'static str, &'static str)],
}

impl LanguageRegistry {
    /// Process-wide registry of supported languages
    pub fn builtin() -> &'static LanguageRegistry {
        &BUILTIN
    }

    pub fn entries(&self) -> impl Iterator<Item = (&'static str, &'static str)> + '_ {
        self.entries.iter().copied()
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|(_, name)| *name)
    }

    pub fn contains(&self, code: &str) -> bool {
        self.name_of(code).is_some()
    }

    pub fn name_of(&self, code: &str) -> Option<&'static str> {
        self.entries
            .iter()
            .find(|(c, _)| *c == code)
            .map(|(_, name)| *name)
    }

    /// Human-readable name, or the raw code when the code is not registered
    pub fn display_name(&self, code: &str) -> String {
        self.name_of(code)
            .map(str::to_string)
            .unwrap_or_else(|| code.to_string())
    }

    /// Reverse lookup; the first entry with a matching name wins
    pub fn code_of(&self, name: &str) -> Option<&'static str> {
        let name = name.trim();
        self.entries
            .iter()
            .find(|(_, n)| *n == name)
            .map(|(code, _)| *code)
    }

    /// Resolve a display name selected by the user to its code.
    ///
    /// Names missing from the registry are an error rather than a silent
    /// fallback to [`DEFAULT_CODE`].
    pub fn resolve(&self, name: &str) -> std::result::Result<&'static str, TargetError> {
        self.code_of(name)
            .ok_or_else(|| TargetError::Resolution(name.trim().to_string()))
    }
}
