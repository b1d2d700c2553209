use crate::error::{Error, Result};
use cookie::Cookie;
use std::{
    fs,
    path::{Path, PathBuf},
};

const STORE_FILE: &str = ".bilibili_cookie.txt";

/// Opaque set of authentication tokens, one stored `Set-Cookie` value per
/// line. Produced by the qr login flow and persisted by a [`SessionStore`].
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Credential {
    lines: Vec<String>,
}

impl Credential {
    pub fn new(lines: Vec<String>) -> Self {
        Self {
            lines: lines.into_iter().filter(|x| !x.trim().is_empty()).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Builds the `Cookie` request header value from the stored lines.
    /// Lines that do not parse as cookies are skipped.
    pub fn cookie_header(&self) -> String {
        self.lines
            .iter()
            .filter_map(|line| Cookie::parse(line.as_str()).ok())
            .map(|c| format!("{}={}", c.name(), c.value()))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Fixed path persistence for the login credential.
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    /// Store at the fixed location, `$HOME/.bilibili_cookie.txt`.
    pub fn new() -> Result<Self> {
        let home = dirs::home_dir().ok_or(Error::NoHomeDir)?;
        Ok(Self::at(home.join(STORE_FILE)))
    }

    /// Store at a caller chosen path.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the persisted credential. An absent or unreadable store is an
    /// error, callers fall back to a fresh login.
    pub fn load(&self) -> Result<Credential> {
        let content = fs::read_to_string(&self.path)?;
        Ok(Credential::new(content.lines().map(str::to_owned).collect()))
    }

    /// Overwrites the store with newline joined tokens, so a subsequent
    /// [`load`](Self::load) observes exactly this credential.
    pub fn persist(&self, credential: &Credential) -> Result<()> {
        fs::write(&self.path, credential.lines().join("\n"))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn persist_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::at(dir.path().join("cookie.txt"));
        let credential = Credential::new(vec![
            "SESSDATA=abc123; Path=/; Domain=.bilibili.com; HttpOnly".into(),
            "bili_jct=deadbeef; Path=/; Domain=.bilibili.com".into(),
        ]);

        store.persist(&credential).unwrap();
        assert_eq!(store.load().unwrap(), credential);
    }

    #[test]
    fn load_fails_when_absent() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::at(dir.path().join("missing.txt"));
        assert!(store.load().is_err());
    }

    #[test]
    fn cookie_header_keeps_name_value_pairs() {
        let credential = Credential::new(vec![
            "SESSDATA=abc123; Path=/; HttpOnly".into(),
            "bili_jct=deadbeef".into(),
        ]);
        assert_eq!(
            credential.cookie_header(),
            "SESSDATA=abc123; bili_jct=deadbeef"
        );
    }

    #[test]
    fn blank_lines_are_dropped() {
        let credential = Credential::new(vec!["".into(), "a=b".into(), "  ".into()]);
        assert_eq!(credential.lines(), ["a=b".to_owned()]);
        assert!(!credential.is_empty());
    }
}
