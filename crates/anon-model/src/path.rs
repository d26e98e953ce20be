//! Windows path model.
//!
//! Paths in job parameters are resolved on the anonymization server, which
//! runs Windows and can only reach data through UNC shares
//! (`\\server\share\folder`). These paths are therefore modelled with Windows
//! semantics no matter which platform the client runs on: both `\` and `/`
//! separate components, `C:` is a drive, `\\server\share` is a UNC drive.

use std::fmt::{self, Write};
use std::str::FromStr;

const SEP: char = '\\';

/// A pure (never touches the filesystem) Windows path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct WinPath {
    drive: String,
    rooted: bool,
    parts: Vec<String>,
}

impl WinPath {
    /// Parse a path. Forward slashes are accepted as separators, `.`
    /// components and repeated separators are dropped.
    pub fn new(raw: &str) -> Self {
        let normalized = raw.replace('/', "\\");
        let (drive, rest) = split_drive(&normalized);
        let rooted = rest.starts_with(SEP) || drive.starts_with("\\\\");
        let parts = rest
            .split(SEP)
            .filter(|part| !part.is_empty() && *part != ".")
            .map(str::to_string)
            .collect();
        Self {
            drive,
            rooted,
            parts,
        }
    }

    /// Drive part: `C:`, `\\server\share` or empty.
    pub fn drive(&self) -> &str {
        &self.drive
    }

    /// Path components after the anchor.
    pub fn parts(&self) -> &[String] {
        &self.parts
    }

    pub fn is_empty(&self) -> bool {
        self.drive.is_empty() && !self.rooted && self.parts.is_empty()
    }

    /// Absolute means drive and root, like `C:\data` or `\\server\share\data`.
    /// `\data` is not absolute: it has no drive.
    pub fn is_absolute(&self) -> bool {
        !self.drive.is_empty() && self.rooted
    }

    /// `\\server\share\...`
    pub fn is_unc(&self) -> bool {
        self.drive.starts_with("\\\\")
    }

    /// Join `other` onto this path. An absolute `other` replaces this path,
    /// a rooted `other` keeps only this path's drive.
    pub fn join(&self, other: &WinPath) -> WinPath {
        if other.is_absolute() {
            return other.clone();
        }
        if !other.drive.is_empty() && !other.drive.eq_ignore_ascii_case(&self.drive) {
            return other.clone();
        }
        if other.rooted {
            return WinPath {
                drive: self.drive.clone(),
                rooted: true,
                parts: other.parts.clone(),
            };
        }
        let mut parts = self.parts.clone();
        parts.extend(other.parts.iter().cloned());
        WinPath {
            drive: self.drive.clone(),
            rooted: self.rooted,
            parts,
        }
    }

    /// Collapse `..` components. Returns `None` when a rooted path climbs
    /// above its anchor.
    pub fn normalized(&self) -> Option<WinPath> {
        let mut parts: Vec<String> = Vec::with_capacity(self.parts.len());
        for part in &self.parts {
            if part != ".." {
                parts.push(part.clone());
                continue;
            }
            match parts.last() {
                Some(last) if last != ".." => {
                    parts.pop();
                }
                _ if self.rooted => return None,
                _ => parts.push(part.clone()),
            }
        }
        Some(WinPath {
            drive: self.drive.clone(),
            rooted: self.rooted,
            parts,
        })
    }

    /// Resolve this path against an absolute root. Absolute paths are
    /// returned unchanged.
    pub fn resolve_against(&self, root: &WinPath) -> Result<WinPath, String> {
        if self.is_absolute() {
            return Ok(self.clone());
        }
        if !root.is_absolute() {
            return Err(format!("root '{root}' is not absolute"));
        }
        root.join(self)
            .normalized()
            .ok_or_else(|| format!("'{self}' climbs above '{}'", root.drive))
    }
}

fn split_drive(path: &str) -> (String, &str) {
    if let Some(unc) = path.strip_prefix("\\\\") {
        let mut pieces = unc.splitn(3, SEP);
        let server = pieces.next().unwrap_or_default();
        let share = pieces.next().unwrap_or_default();
        if !server.is_empty() && !share.is_empty() {
            let drive_len = 2 + server.len() + 1 + share.len();
            return (path[..drive_len].to_string(), &path[drive_len..]);
        }
        return (String::new(), path);
    }
    let bytes = path.as_bytes();
    if bytes.len() >= 2 && bytes[1] == b':' && bytes[0].is_ascii_alphabetic() {
        return (path[..2].to_string(), &path[2..]);
    }
    (String::new(), path)
}

impl fmt::Display for WinPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.drive)?;
        if self.rooted && (!self.parts.is_empty() || !self.is_unc()) {
            f.write_char(SEP)?;
        }
        f.write_str(&self.parts.join("\\"))
    }
}

impl FromStr for WinPath {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

impl From<&str> for WinPath {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl serde::Serialize for WinPath {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> serde::Deserialize<'de> for WinPath {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Self::new(&s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unc_paths() {
        let path = WinPath::new(r"\\server\share\folder\sub");
        assert!(path.is_unc());
        assert!(path.is_absolute());
        assert_eq!(path.drive(), r"\\server\share");
        assert_eq!(path.parts(), ["folder", "sub"]);
        assert_eq!(path.to_string(), r"\\server\share\folder\sub");
        assert_eq!(WinPath::new(r"\\server\share").to_string(), r"\\server\share");
    }

    #[test]
    fn test_forward_slashes_are_separators() {
        assert_eq!(WinPath::new("//server/share/a").to_string(), r"\\server\share\a");
        assert_eq!(WinPath::new("folder2/file.txt").to_string(), r"folder2\file.txt");
    }

    #[test]
    fn test_drive_letters_are_absolute_but_not_unc() {
        let path = WinPath::new(r"C:\temp");
        assert!(path.is_absolute());
        assert!(!path.is_unc());
        assert!(!WinPath::new(r"\temp").is_absolute());
        assert!(!WinPath::new("temp").is_absolute());
    }

    #[test]
    fn test_rooted_path_keeps_drive_of_base() {
        let root = WinPath::new(r"\\server\share\sub");
        let joined = root.join(&WinPath::new("/data"));
        assert_eq!(joined.to_string(), r"\\server\share\data");
    }

    #[test]
    fn test_relative_join() {
        let root = WinPath::new(r"\\server\share");
        let joined = root.join(&WinPath::new(r"example\folder1"));
        assert_eq!(joined.to_string(), r"\\server\share\example\folder1");
    }

    #[test]
    fn test_resolve_rejects_escape_above_anchor() {
        let root = WinPath::new(r"\\server\share\a");
        assert_eq!(
            WinPath::new(r"..\b")
                .resolve_against(&root)
                .unwrap()
                .to_string(),
            r"\\server\share\b"
        );
        assert!(WinPath::new(r"..\..\b").resolve_against(&root).is_err());
    }

    #[test]
    fn test_resolve_needs_absolute_root() {
        assert!(
            WinPath::new("data")
                .resolve_against(&WinPath::new("relative"))
                .is_err()
        );
    }

    #[test]
    fn test_empty_path() {
        let path = WinPath::new("");
        assert!(path.is_empty());
        assert_eq!(path.to_string(), "");
    }
}
