//! Locating a case's scanned documents by file naming convention.
//!
//! A file belongs to a case when its lowercased name starts with the case
//! number and contains the document keyword. Summons files mention the
//! complaint too, so they never count as the complaint itself.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ResolveError;
use crate::models::case::CaseId;

const SUMMONS_ON_COMPLAINT: &str = "summons_on_complaint";

/// Kinds of documents the pipelines read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    CivilCaseCoverSheet,
    Complaint,
}

impl DocumentKind {
    /// Keyword searched for in file names.
    pub fn keyword(&self) -> &'static str {
        match self {
            DocumentKind::CivilCaseCoverSheet => "civil_case_cover_sheet",
            DocumentKind::Complaint => "complaint",
        }
    }

    fn matches(&self, lowercase_name: &str) -> bool {
        if !lowercase_name.contains(self.keyword()) {
            return false;
        }
        match self {
            DocumentKind::Complaint => !lowercase_name.contains(SUMMONS_ON_COMPLAINT),
            DocumentKind::CivilCaseCoverSheet => true,
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentKind::CivilCaseCoverSheet => f.write_str("civil case cover sheet"),
            DocumentKind::Complaint => f.write_str("complaint"),
        }
    }
}

/// List every file in `dir` that matches the case and document kind, sorted.
pub fn candidates(
    case: &CaseId,
    kind: DocumentKind,
    dir: &Path,
) -> Result<Vec<PathBuf>, ResolveError> {
    let directory_error = |source| ResolveError::Directory {
        path: dir.display().to_string(),
        source,
    };

    let prefix = case.key();
    let mut found = Vec::new();

    for entry in std::fs::read_dir(dir).map_err(directory_error)? {
        let entry = entry.map_err(directory_error)?;
        let name = entry.file_name().to_string_lossy().to_ascii_lowercase();
        if name.starts_with(&prefix) && kind.matches(&name) {
            found.push(entry.path());
        }
    }

    found.sort();
    debug!("{} candidate {} files for {}", found.len(), kind, case);
    Ok(found)
}

/// Resolve the single file of `kind` for `case`.
pub fn resolve(case: &CaseId, kind: DocumentKind, dir: &Path) -> Result<PathBuf, ResolveError> {
    let mut found = candidates(case, kind, dir)?;
    match found.len() {
        0 => Err(ResolveError::FileNotFoundForCase {
            case: case.to_string(),
            kind,
        }),
        1 => Ok(found.remove(0)),
        count => Err(ResolveError::AmbiguousFileMatch {
            case: case.to_string(),
            kind,
            count,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(dir: &Path, name: &str) {
        fs::write(dir.join(name), b"%PDF-1.4").unwrap();
    }

    #[test]
    fn test_resolve_is_case_insensitive() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "CGC24123456_Civil_Case_Cover_Sheet.pdf");
        touch(dir.path(), "CGC24999999_Civil_Case_Cover_Sheet.pdf");

        let path = resolve(
            &CaseId::new("cgc24123456"),
            DocumentKind::CivilCaseCoverSheet,
            dir.path(),
        )
        .unwrap();
        assert!(path.ends_with("CGC24123456_Civil_Case_Cover_Sheet.pdf"));
    }

    #[test]
    fn test_summons_is_not_a_complaint() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "cgc24123456_complaint.pdf");
        touch(dir.path(), "cgc24123456_summons_on_complaint.pdf");

        let path = resolve(
            &CaseId::new("CGC24123456"),
            DocumentKind::Complaint,
            dir.path(),
        )
        .unwrap();
        assert!(path.ends_with("cgc24123456_complaint.pdf"));
    }

    #[test]
    fn test_missing_and_ambiguous_files() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "cgc1_complaint_a.pdf");
        touch(dir.path(), "cgc1_complaint_b.pdf");

        let missing = resolve(
            &CaseId::new("cgc1"),
            DocumentKind::CivilCaseCoverSheet,
            dir.path(),
        );
        assert!(matches!(
            missing,
            Err(ResolveError::FileNotFoundForCase { .. })
        ));

        let ambiguous = resolve(&CaseId::new("cgc1"), DocumentKind::Complaint, dir.path());
        assert!(matches!(
            ambiguous,
            Err(ResolveError::AmbiguousFileMatch { count: 2, .. })
        ));
    }

    #[test]
    fn test_missing_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = resolve(
            &CaseId::new("cgc1"),
            DocumentKind::Complaint,
            &dir.path().join("nope"),
        );
        assert!(matches!(result, Err(ResolveError::Directory { .. })));
    }
}
