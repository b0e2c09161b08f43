//! Shared AWS credentials file, read as a whole and patched section by section.
//!
//! Only sections flagged as changed are ever regenerated. Every other byte of
//! the file, including profiles this tool never touched, comments and keys it
//! does not know about, is written back exactly as it was found on disk at
//! save time.

use anyhow::{Context, Result};
use ini::{Ini, ParseOption, Properties};
use std::{
    collections::{HashMap, HashSet},
    path::{Path, PathBuf},
};
use tokio::fs;
use tracing::{debug, info};

use super::Credentials;
use crate::{constants, error::ProfileError, fsutil};

pub const ACCESS_KEY_ID: &str = "aws_access_key_id";
pub const SECRET_ACCESS_KEY: &str = "aws_secret_access_key";
pub const SESSION_TOKEN: &str = "aws_session_token";

/// Section name the INI convention reserves for global defaults
const DEFAULT_SECTION: &str = "DEFAULT";

/// The persisted fields of one credentials profile
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileRecord {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: String,
}

impl ProfileRecord {
    fn from_ini_section(section: &Properties) -> Self {
        let field = |key: &str| section.get(key).unwrap_or_default().to_string();
        Self {
            access_key_id: field(ACCESS_KEY_ID),
            secret_access_key: field(SECRET_ACCESS_KEY),
            session_token: field(SESSION_TOKEN),
        }
    }

    fn render_section(&self, name: &str) -> String {
        format!(
            "[{name}]\n{ACCESS_KEY_ID} = {}\n{SECRET_ACCESS_KEY} = {}\n{SESSION_TOKEN} = {}\n",
            self.access_key_id, self.secret_access_key, self.session_token
        )
    }
}

impl From<&Credentials> for ProfileRecord {
    fn from(creds: &Credentials) -> Self {
        Self {
            access_key_id: creds.access_key_id.clone(),
            secret_access_key: creds.secret_access_key.clone(),
            session_token: creds.session_token.clone(),
        }
    }
}

/// A profile plus the bookkeeping of the current run, which is never persisted
#[derive(Debug, Clone, Default)]
pub struct ProfileEntry {
    pub record: ProfileRecord,
    is_new: bool,
    is_changed: bool,
}

impl ProfileEntry {
    /// Created during this run rather than read from disk
    pub fn is_new(&self) -> bool {
        self.is_new
    }

    /// Holds credentials that must be written back on save
    pub fn is_changed(&self) -> bool {
        self.is_changed
    }
}

/// All profiles of the credentials file, in file order
#[derive(Debug, Clone, Default)]
pub struct ProfileSet {
    names: Vec<String>,
    profiles: HashMap<String, ProfileEntry>,
}

impl ProfileSet {
    fn from_ini(ini: &Ini) -> Self {
        let mut set = Self::default();

        for (name, section) in ini.iter() {
            let Some(name) = name.filter(|n| *n != DEFAULT_SECTION) else {
                continue;
            };
            // A repeated header keeps the first occurrence
            if set.profiles.contains_key(name) {
                continue;
            }

            set.names.push(name.to_string());
            set.profiles.insert(
                name.to_string(),
                ProfileEntry {
                    record: ProfileRecord::from_ini_section(section),
                    ..ProfileEntry::default()
                },
            );
        }

        set
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn contains(&self, name: &str) -> bool {
        self.profiles.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&ProfileEntry> {
        self.profiles.get(name)
    }

    /// Append an empty profile that did not exist before this run
    pub fn create_profile(&mut self, name: &str) -> Result<(), ProfileError> {
        if self.contains(name) {
            return Err(ProfileError::DuplicateProfile(name.to_string()));
        }

        self.names.push(name.to_string());
        self.profiles.insert(
            name.to_string(),
            ProfileEntry {
                is_new: true,
                ..ProfileEntry::default()
            },
        );
        Ok(())
    }

    /// Replace the credentials of `name` and schedule its section for rewrite
    pub fn mark_changed(&mut self, name: &str, record: ProfileRecord) -> Result<(), ProfileError> {
        let entry = self
            .profiles
            .get_mut(name)
            .ok_or_else(|| ProfileError::UnknownProfile(name.to_string()))?;

        entry.record = record;
        entry.is_changed = true;
        Ok(())
    }

    /// Profiles scheduled for rewrite, in file order
    pub fn changed(&self) -> impl Iterator<Item = (&str, &ProfileRecord)> {
        self.names.iter().filter_map(|name| {
            self.profiles
                .get(name)
                .filter(|entry| entry.is_changed)
                .map(|entry| (name.as_str(), &entry.record))
        })
    }
}

#[derive(Debug, Clone)]
pub struct ProfileStore {
    path: PathBuf,
}

impl ProfileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn from_default_path() -> Result<Self> {
        constants::get_aws_credentials_path()
            .map(Self::new)
            .context("Failed to determine AWS credentials path")
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and parse the credentials file; both failures are fatal
    async fn read(&self) -> Result<(String, Ini)> {
        let content = fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Failed to open {}", self.path.display()))?;

        let ini = parse(&content)
            .with_context(|| format!("Failed to parse {}", self.path.display()))?;

        Ok((content, ini))
    }

    pub async fn load(&self) -> Result<ProfileSet> {
        let (_, ini) = self.read().await?;
        let set = ProfileSet::from_ini(&ini);
        debug!(
            "Loaded {} profiles from {}",
            set.names.len(),
            self.path.display()
        );
        Ok(set)
    }

    /// Rewrite the sections of changed profiles.
    ///
    /// The file is read again here instead of reusing what `load` saw, so that
    /// edits other tools made in the meantime to unrelated sections survive.
    pub async fn save(&self, set: &ProfileSet) -> Result<()> {
        let changed: Vec<_> = set.changed().collect();
        if changed.is_empty() {
            debug!("No changed profiles, leaving {} untouched", self.path.display());
            return Ok(());
        }

        let (content, _) = self.read().await?;
        let patched = patch_sections(&content, &changed);

        fsutil::replace_file(&self.path, patched.as_bytes())
            .await
            .context("Failed to write credentials file")?;
        fsutil::restrict_permissions(&self.path).await?;

        for (name, _) in &changed {
            info!("Credentials saved to profile: {}", name);
        }
        Ok(())
    }
}

fn parse(content: &str) -> Result<Ini> {
    let opt = ParseOption {
        enabled_quote: false,
        enabled_escape: false,
        ..ParseOption::default()
    };
    Ok(Ini::load_from_str_opt(content, opt)?)
}

/// A contiguous slice of the file: the text before the first header, or one
/// header line and everything up to the next header
struct RawSection<'a> {
    name: Option<&'a str>,
    text: &'a str,
}

fn header_name(line: &str) -> Option<&str> {
    let rest = line.trim().strip_prefix('[')?;
    let end = rest.find(']')?;
    Some(rest[..end].trim())
}

fn is_trivia(line: &str) -> bool {
    let line = line.trim();
    line.is_empty() || line.starts_with(';') || line.starts_with('#')
}

fn split_sections(content: &str) -> Vec<RawSection<'_>> {
    let mut sections = Vec::new();
    let mut start = 0;
    let mut name = None;
    let mut offset = 0;

    for line in content.split_inclusive('\n') {
        if let Some(next) = header_name(line) {
            if offset > 0 || name.is_some() {
                sections.push(RawSection {
                    name,
                    text: &content[start..offset],
                });
            }
            start = offset;
            name = Some(next);
        }
        offset += line.len();
    }

    if start < content.len() || name.is_some() {
        sections.push(RawSection {
            name,
            text: &content[start..],
        });
    }

    sections
}

/// Split off the blank and comment lines ending a section; they usually
/// describe the section that follows
fn split_trailer(text: &str) -> (&str, &str) {
    let mut cut = text.len();
    for line in text.split_inclusive('\n').rev() {
        if !is_trivia(line) {
            break;
        }
        cut -= line.len();
    }
    text.split_at(cut)
}

fn patch_sections(content: &str, changed: &[(&str, &ProfileRecord)]) -> String {
    let mut out = String::with_capacity(content.len() + 256 * changed.len());
    let mut written = HashSet::new();

    for section in split_sections(content) {
        let target = section
            .name
            .and_then(|name| changed.iter().find(|(c, _)| *c == name));

        match target {
            Some((name, record)) => {
                let (_, trailer) = split_trailer(section.text);
                if written.insert(*name) {
                    out.push_str(&record.render_section(name));
                }
                out.push_str(trailer);
            }
            None => out.push_str(section.text),
        }
    }

    for (name, record) in changed {
        if written.contains(name) {
            continue;
        }
        if !out.is_empty() {
            if !out.ends_with('\n') {
                out.push('\n');
            }
            if !out.ends_with("\n\n") {
                out.push('\n');
            }
        }
        out.push_str(&record.render_section(name));
    }

    out
}
