//! Section-scoped key engine.
//!
//! Reads and rewrites a single `key=value` line inside a named `[Section]` of
//! an INI-like file. The file is scanned top to bottom with a two-state
//! machine ([`ScanState`]); only lines seen while inside the target section
//! are candidates for the key pattern, and the first match wins.
//!
//! Writes keep every byte outside the affected line. When the key is found the
//! line is replaced and the rest of the file is copied verbatim. When the
//! target section closes without the key, the key is inserted just before the
//! next section header. When the section does not exist at all it is appended
//! to the end of the file together with the key.
//!
//! Matching runs on raw line bytes, so lines that are not valid UTF-8 are
//! scanned past and copied through like any other.

use std::borrow::Cow;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::bytes::Regex;
use serde::{Deserialize, Serialize};

use crate::Result;
use crate::store::{self, LineStore};

/// Matches any section header line, e.g. `[PowerOptions]`.
///
/// `(?-u:.)` matches any byte, so headers with non-UTF-8 names still count.
static ANY_HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\[(?-u:.)*\]\s*$").expect("Invalid regex"));

/// Which kind of header a line is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderKind {
    /// The section we are looking for
    Target,
    /// Some other section
    Other,
}

/// Recognizes section headers and tells the target section apart.
#[derive(Debug, Clone)]
pub struct SectionMatcher {
    name: String,
    target: Regex,
}

impl SectionMatcher {
    /// Build a matcher for `[name]`. The name is matched literally.
    pub fn new(name: &str) -> Result<Self> {
        let target = Regex::new(&format!(r"^\[{}\]\s*$", regex::escape(name)))?;
        Ok(Self {
            name: name.to_string(),
            target,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The header line written when the section has to be created.
    pub fn header_line(&self) -> String {
        format!("[{}]", self.name)
    }

    /// Classify a line, or `None` if it is not a section header.
    pub fn classify(&self, line: &[u8]) -> Option<HeaderKind> {
        if self.target.is_match(line) {
            Some(HeaderKind::Target)
        } else if ANY_HEADER.is_match(line) {
            Some(HeaderKind::Other)
        } else {
            None
        }
    }
}

/// Matches `key = value` lines and captures the value.
#[derive(Debug, Clone)]
pub struct KeyPattern {
    regex: Regex,
}

impl KeyPattern {
    /// Build `^<key>\s*=\s*(<value_grammar>)\s*$`.
    ///
    /// `value_grammar` is a regex fragment; it is wrapped in the single capture
    /// group and must not add capture groups of its own before it.
    pub fn new(key: &str, value_grammar: &str) -> Result<Self> {
        let regex = Regex::new(&format!(
            r"^{}\s*=\s*({})\s*$",
            regex::escape(key),
            value_grammar
        ))?;
        Ok(Self { regex })
    }

    /// Captured value if `line` is an entry for this key.
    pub fn capture<'a>(&self, line: &'a [u8]) -> Option<&'a [u8]> {
        self.regex
            .captures(line)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_bytes())
    }
}

/// Position of the scanner relative to the target section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScanState {
    /// Before the first header, or inside some other section
    #[default]
    OutsideTarget,
    /// Between the target header and the next header
    InsideTarget,
}

impl ScanState {
    /// State after consuming a header line.
    pub fn transition(self, header: HeaderKind) -> Self {
        match header {
            HeaderKind::Target => ScanState::InsideTarget,
            HeaderKind::Other => ScanState::OutsideTarget,
        }
    }

    pub fn is_inside(self) -> bool {
        self == ScanState::InsideTarget
    }
}

/// What a `set` call did to the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SetOutcome {
    /// An existing entry was rewritten in place
    Replaced,
    /// The key was added to the existing section
    Inserted,
    /// The section header and key were appended to the file
    CreatedSection,
    /// The key was absent and creation was not allowed; nothing was written
    Skipped,
}

impl SetOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            SetOutcome::Replaced => "replaced",
            SetOutcome::Inserted => "inserted",
            SetOutcome::CreatedSection => "created_section",
            SetOutcome::Skipped => "skipped",
        }
    }

    /// Whether the file was rewritten.
    pub fn wrote(&self) -> bool {
        !matches!(self, SetOutcome::Skipped)
    }
}

impl std::fmt::Display for SetOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Reads and rewrites keys in one config file.
///
/// Holds only the path; the file is re-read on every call and no handle is
/// kept open between calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionEngine {
    path: PathBuf,
}

impl SectionEngine {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// First value of `key` inside `section`, or `None`.
    ///
    /// A missing file is `None`, not an error. A captured value that is not
    /// valid UTF-8 is decoded lossily.
    pub fn get(&self, section: &SectionMatcher, key: &KeyPattern) -> Result<Option<String>> {
        let Some(store) = LineStore::open(&self.path)? else {
            tracing::debug!(path = %self.path.display(), "config file missing");
            return Ok(None);
        };
        Ok(find_value(&store, section, key)
            .map(|value| String::from_utf8_lossy(value).into_owned()))
    }

    /// Write `key_name=value` into `section`.
    ///
    /// See the module docs for where the line ends up. With
    /// `create_if_missing` false an absent key leaves the file untouched and
    /// returns [`SetOutcome::Skipped`].
    pub fn set(
        &self,
        section: &SectionMatcher,
        key_name: &str,
        key: &KeyPattern,
        value: &str,
        create_if_missing: bool,
    ) -> Result<SetOutcome> {
        let store = LineStore::open_or_empty(&self.path)?;
        let entry = format!("{}={}", key_name, value);

        let Some((outcome, content)) = rewrite(&store, section, key, &entry, create_if_missing)
        else {
            tracing::debug!(
                path = %self.path.display(),
                section = section.name(),
                key = key_name,
                "key absent and creation disabled, leaving file unchanged"
            );
            return Ok(SetOutcome::Skipped);
        };

        store::write(&self.path, &content)?;
        tracing::debug!(
            path = %self.path.display(),
            section = section.name(),
            key = key_name,
            %outcome,
            "rewrote config file"
        );
        Ok(outcome)
    }
}

/// Scan for the first value of `key` inside the target section.
pub fn find_value<'a>(
    store: &'a LineStore,
    section: &SectionMatcher,
    key: &KeyPattern,
) -> Option<&'a [u8]> {
    let mut state = ScanState::default();
    for line in store.lines() {
        if let Some(header) = section.classify(line.text) {
            state = state.transition(header);
        } else if state.is_inside() {
            if let Some(value) = key.capture(line.text) {
                return Some(value);
            }
        }
    }
    None
}

/// Compute the new file content for writing `entry` into the target section.
///
/// Returns `None` when the key is absent and `create_if_missing` is false.
pub fn rewrite(
    store: &LineStore,
    section: &SectionMatcher,
    key: &KeyPattern,
    entry: &str,
    create_if_missing: bool,
) -> Option<(SetOutcome, Vec<u8>)> {
    let mut prefix: Vec<Cow<'_, [u8]>> = Vec::new();
    let mut remainder: &[u8] = &[];
    let mut state = ScanState::default();
    let mut seen_section = false;

    for line in store.lines() {
        if let Some(header) = section.classify(line.text) {
            if state.is_inside() {
                // Target section closed without the key: insert before this header.
                remainder = store.remainder_from(line.start);
                break;
            }
            if header == HeaderKind::Target {
                seen_section = true;
            }
            state = state.transition(header);
        } else if state.is_inside() && key.capture(line.text).is_some() {
            prefix.push(Cow::Borrowed(entry.as_bytes()));
            let rest = store.remainder_from(line.end);
            return Some((SetOutcome::Replaced, store::render(&prefix, rest)));
        }
        prefix.push(Cow::Borrowed(line.text));
    }

    if !create_if_missing {
        return None;
    }

    let outcome = if seen_section {
        SetOutcome::Inserted
    } else {
        prefix.push(Cow::Owned(section.header_line().into_bytes()));
        SetOutcome::CreatedSection
    };
    prefix.push(Cow::Borrowed(entry.as_bytes()));
    Some((outcome, store::render(&prefix, remainder)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn power() -> SectionMatcher {
        SectionMatcher::new("PowerOptions").unwrap()
    }

    fn level() -> KeyPattern {
        KeyPattern::new("FrontLightLevel", "[0-9]+").unwrap()
    }

    fn rewrite_str(content: &str, value: &str, create: bool) -> Option<(SetOutcome, String)> {
        let store = LineStore::from_content(content);
        let entry = format!("FrontLightLevel={}", value);
        rewrite(&store, &power(), &level(), &entry, create)
            .map(|(outcome, out)| (outcome, String::from_utf8(out).unwrap()))
    }

    // ==================== Matcher Tests ====================

    #[test]
    fn test_classify_headers() {
        let m = power();
        assert_eq!(m.classify(b"[PowerOptions]"), Some(HeaderKind::Target));
        assert_eq!(m.classify(b"[PowerOptions]  \r"), Some(HeaderKind::Target));
        assert_eq!(m.classify(b"[Other]"), Some(HeaderKind::Other));
        assert_eq!(m.classify(b"[]"), Some(HeaderKind::Other));
        assert_eq!(m.classify(b"[PowerOptionsX]"), Some(HeaderKind::Other));
        assert_eq!(m.classify(b" [PowerOptions]"), None);
        assert_eq!(m.classify(b"FrontLightLevel=3"), None);
    }

    #[test]
    fn test_section_name_is_literal() {
        let m = SectionMatcher::new("A.B").unwrap();
        assert_eq!(m.classify(b"[A.B]"), Some(HeaderKind::Target));
        assert_eq!(m.classify(b"[AxB]"), Some(HeaderKind::Other));
    }

    #[test]
    fn test_key_pattern_capture() {
        let k = level();
        assert_eq!(k.capture(b"FrontLightLevel=40"), Some(&b"40"[..]));
        assert_eq!(k.capture(b"FrontLightLevel = 40  "), Some(&b"40"[..]));
        assert_eq!(k.capture(b"FrontLightLevel=abc"), None);
        assert_eq!(k.capture(b"FrontLightLevelX=40"), None);
        assert_eq!(k.capture(b"#FrontLightLevel=40"), None);
    }

    #[test]
    fn test_key_pattern_non_utf8_line() {
        let k = level();
        assert_eq!(k.capture(b"FrontLightLevel=\xE9"), None);
        assert_eq!(power().classify(b"[Caf\xE9]"), Some(HeaderKind::Other));
    }

    #[test]
    fn test_scan_state_transitions() {
        let s = ScanState::default();
        assert_eq!(s, ScanState::OutsideTarget);
        let s = s.transition(HeaderKind::Target);
        assert!(s.is_inside());
        let s = s.transition(HeaderKind::Other);
        assert!(!s.is_inside());
    }

    // ==================== Read Tests ====================

    #[test]
    fn test_find_value_scoped_to_section() {
        let store = LineStore::from_content(
            "FrontLightLevel=1\n[Other]\nFrontLightLevel=2\n[PowerOptions]\nFrontLightLevel=3\n",
        );
        assert_eq!(find_value(&store, &power(), &level()), Some(&b"3"[..]));
    }

    #[test]
    fn test_find_value_first_match_wins() {
        let store =
            LineStore::from_content("[PowerOptions]\nFrontLightLevel=10\nFrontLightLevel=20\n");
        assert_eq!(find_value(&store, &power(), &level()), Some(&b"10"[..]));
    }

    #[test]
    fn test_find_value_reenters_repeated_section() {
        let store = LineStore::from_content(
            "[PowerOptions]\nX=1\n[Other]\nFrontLightLevel=5\n[PowerOptions]\nFrontLightLevel=6",
        );
        assert_eq!(find_value(&store, &power(), &level()), Some(&b"6"[..]));
    }

    #[test]
    fn test_find_value_absent() {
        let store = LineStore::from_content("[PowerOptions]\nColorSetting=3000\n");
        assert_eq!(find_value(&store, &power(), &level()), None);
        assert_eq!(find_value(&LineStore::default(), &power(), &level()), None);
    }

    // ==================== Rewrite Tests ====================

    #[test]
    fn test_rewrite_replaces_in_place() {
        let input = "[PowerOptions]\nFrontLightLevel=40\nColorSetting=3000\n[Other]\nFoo=bar\n";
        let (outcome, out) = rewrite_str(input, "75", true).unwrap();
        assert_eq!(outcome, SetOutcome::Replaced);
        assert_eq!(
            out,
            "[PowerOptions]\nFrontLightLevel=75\nColorSetting=3000\n[Other]\nFoo=bar\n"
        );
    }

    #[test]
    fn test_rewrite_keeps_remainder_bytes() {
        let input = "[PowerOptions]\nFrontLightLevel=40\n  odd = spacing \r\n[Other]\n\nFoo=bar";
        let (_, out) = rewrite_str(input, "1", true).unwrap();
        assert_eq!(
            out,
            "[PowerOptions]\nFrontLightLevel=1\n  odd = spacing \r\n[Other]\n\nFoo=bar"
        );
    }

    #[test]
    fn test_rewrite_ignores_key_in_other_section() {
        let input = "[Other]\nFrontLightLevel=9\n[PowerOptions]\nFrontLightLevel=40\n";
        let (_, out) = rewrite_str(input, "50", true).unwrap();
        assert_eq!(
            out,
            "[Other]\nFrontLightLevel=9\n[PowerOptions]\nFrontLightLevel=50\n"
        );
    }

    #[test]
    fn test_rewrite_inserts_before_next_section() {
        let input = "[PowerOptions]\nColorSetting=3000\n[Other]\nFoo=bar\n";
        let (outcome, out) = rewrite_str(input, "20", true).unwrap();
        assert_eq!(outcome, SetOutcome::Inserted);
        assert_eq!(
            out,
            "[PowerOptions]\nColorSetting=3000\nFrontLightLevel=20\n[Other]\nFoo=bar\n"
        );
    }

    #[test]
    fn test_rewrite_inserts_at_eof_when_section_is_last() {
        let input = "[Other]\nFoo=bar\n[PowerOptions]\nColorSetting=3000";
        let (outcome, out) = rewrite_str(input, "20", true).unwrap();
        assert_eq!(outcome, SetOutcome::Inserted);
        assert_eq!(
            out,
            "[Other]\nFoo=bar\n[PowerOptions]\nColorSetting=3000\nFrontLightLevel=20\n"
        );
    }

    #[test]
    fn test_rewrite_key_after_section_closed_is_not_matched() {
        // The key below [Other] is out of scope; insertion happens at the boundary.
        let input = "[PowerOptions]\n[Other]\nFrontLightLevel=9\n";
        let (outcome, out) = rewrite_str(input, "20", true).unwrap();
        assert_eq!(outcome, SetOutcome::Inserted);
        assert_eq!(
            out,
            "[PowerOptions]\nFrontLightLevel=20\n[Other]\nFrontLightLevel=9\n"
        );
    }

    #[test]
    fn test_rewrite_creates_missing_section() {
        let input = "[Other]\nFoo=bar\n";
        let (outcome, out) = rewrite_str(input, "20", true).unwrap();
        assert_eq!(outcome, SetOutcome::CreatedSection);
        assert_eq!(out, "[Other]\nFoo=bar\n[PowerOptions]\nFrontLightLevel=20\n");
    }

    #[test]
    fn test_rewrite_empty_file() {
        let (outcome, out) = rewrite_str("", "20", true).unwrap();
        assert_eq!(outcome, SetOutcome::CreatedSection);
        assert_eq!(out, "[PowerOptions]\nFrontLightLevel=20\n");
    }

    #[test]
    fn test_rewrite_no_create_when_absent() {
        assert!(rewrite_str("[PowerOptions]\nColorSetting=1\n", "20", false).is_none());
        assert!(rewrite_str("", "20", false).is_none());
    }

    #[test]
    fn test_rewrite_no_create_still_replaces_existing() {
        let (outcome, out) = rewrite_str("[PowerOptions]\nFrontLightLevel=4\n", "5", false).unwrap();
        assert_eq!(outcome, SetOutcome::Replaced);
        assert_eq!(out, "[PowerOptions]\nFrontLightLevel=5\n");
    }

    #[test]
    fn test_rewrite_normalizes_crlf_in_prefix_only() {
        let input = "[PowerOptions]\r\nFrontLightLevel=4\r\n[Other]\r\n";
        let (_, out) = rewrite_str(input, "5", true).unwrap();
        assert_eq!(out, "[PowerOptions]\nFrontLightLevel=5\n[Other]\r\n");
    }

    // ==================== Engine Tests ====================

    #[test]
    fn test_engine_get_missing_file() {
        let dir = TempDir::new().unwrap();
        let engine = SectionEngine::new(dir.path().join("none.conf"));
        assert_eq!(engine.get(&power(), &level()).unwrap(), None);
    }

    #[test]
    fn test_engine_set_then_get() {
        let dir = TempDir::new().unwrap();
        let engine = SectionEngine::new(dir.path().join("eReader.conf"));

        let outcome = engine
            .set(&power(), "FrontLightLevel", &level(), "33", true)
            .unwrap();
        assert_eq!(outcome, SetOutcome::CreatedSection);
        assert_eq!(
            engine.get(&power(), &level()).unwrap().as_deref(),
            Some("33")
        );
    }

    #[test]
    fn test_engine_set_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("eReader.conf");
        fs::write(&path, "[A]\nx=1\n[PowerOptions]\nFrontLightLevel = 2 \n[B]\ny=2\n").unwrap();
        let engine = SectionEngine::new(&path);

        engine
            .set(&power(), "FrontLightLevel", &level(), "60", true)
            .unwrap();
        let first = fs::read_to_string(&path).unwrap();
        engine
            .set(&power(), "FrontLightLevel", &level(), "60", true)
            .unwrap();
        let second = fs::read_to_string(&path).unwrap();

        assert_eq!(first, second);
        assert_eq!(first, "[A]\nx=1\n[PowerOptions]\nFrontLightLevel=60\n[B]\ny=2\n");
    }

    #[test]
    fn test_engine_preserves_non_utf8_bytes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("eReader.conf");
        let before: &[u8] =
            b"[Reading]\nLastTitle=Caf\xE9\n[PowerOptions]\nFrontLightLevel=40\n[After]\nx=\xFF\xFE\n";
        fs::write(&path, before).unwrap();
        let engine = SectionEngine::new(&path);

        assert_eq!(engine.get(&power(), &level()).unwrap().as_deref(), Some("40"));
        let outcome = engine
            .set(&power(), "FrontLightLevel", &level(), "75", true)
            .unwrap();
        assert_eq!(outcome, SetOutcome::Replaced);
        assert_eq!(
            fs::read(&path).unwrap(),
            b"[Reading]\nLastTitle=Caf\xE9\n[PowerOptions]\nFrontLightLevel=75\n[After]\nx=\xFF\xFE\n"
        );
    }

    #[test]
    fn test_engine_skip_does_not_create_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("eReader.conf");
        let engine = SectionEngine::new(&path);

        let outcome = engine
            .set(&power(), "FrontLightLevel", &level(), "1", false)
            .unwrap();
        assert_eq!(outcome, SetOutcome::Skipped);
        assert!(!outcome.wrote());
        assert!(!path.exists());
    }
}
