//! Channel logo download
//!
//! Logo paths from the portal are usually relative (`/misc/logos/320/1.png`)
//! and live under `<portal>/stalker_portal`. The library resolves the URL,
//! renders a filename from a [`FilenameTemplate`] and streams the image into
//! a [`LogoSink`]; how bytes reach disk is up to the sink.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use async_trait::async_trait;
use futures::StreamExt;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::client::ByteStream;
use crate::error::{Operation, Result, StalkerError};
use crate::portal::StalkerClient;
use crate::types::ChannelRecord;

/// Prefix for relative logo paths
const LOGO_BASE_PATH: &str = "/stalker_portal";

/// Resolve a logo reference against the portal base.
///
/// # Examples
/// ```
/// use stalker_core::logo::resolve_logo_url;
///
/// assert_eq!(
///     resolve_logo_url("http://portal.example", "/misc/logos/1.png").unwrap(),
///     "http://portal.example/stalker_portal/misc/logos/1.png"
/// );
/// assert_eq!(
///     resolve_logo_url("http://portal.example", "https://cdn.example/1.png").unwrap(),
///     "https://cdn.example/1.png"
/// );
/// ```
pub fn resolve_logo_url(portal_url: &str, logo: &str) -> Result<String> {
    let logo = logo.trim();
    if logo.is_empty() {
        return Err(StalkerError::Config("no logo URL provided".to_string()));
    }

    if url::Url::parse(logo).is_ok() {
        return Ok(logo.to_string());
    }

    let separator = if logo.starts_with('/') { "" } else { "/" };
    let resolved = format!(
        "{}{}{}{}",
        portal_url.trim_end_matches('/'),
        LOGO_BASE_PATH,
        separator,
        logo
    );
    url::Url::parse(&resolved).map_err(|e| StalkerError::InvalidUrl(format!("{}: {}", resolved, e)))?;
    Ok(resolved)
}

/// Named value a filename template can insert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placeholder {
    /// `{id}`: channel id
    Id,
    /// `{name}`: channel display name
    Name,
}

impl Placeholder {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "id" => Some(Placeholder::Id),
            "name" => Some(Placeholder::Name),
            _ => None,
        }
    }

    fn value<'a>(&self, channel: &'a ChannelRecord) -> &'a str {
        match self {
            Placeholder::Id => &channel.id,
            Placeholder::Name => &channel.name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Value(Placeholder),
}

/// Logo filename template such as `"{id}_{name}.png"`.
///
/// Recognized placeholders are `{id}` and `{name}`; `{{` and `}}` produce
/// literal braces. Substituted values have path separators replaced by `_`
/// so a channel name cannot escape the output directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilenameTemplate {
    segments: Vec<Segment>,
}

impl FilenameTemplate {
    /// Parse a template.
    ///
    /// # Errors
    /// `StalkerError::Config` for unknown placeholders, unbalanced braces or
    /// an empty template.
    pub fn parse(template: &str) -> Result<Self> {
        if template.trim().is_empty() {
            return Err(StalkerError::Config("filename template is empty".to_string()));
        }

        let invalid = |reason: &str| {
            StalkerError::Config(format!("invalid filename template {:?}: {}", template, reason))
        };

        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = template.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '{' if chars.peek() == Some(&'{') => {
                    chars.next();
                    literal.push('{');
                }
                '}' if chars.peek() == Some(&'}') => {
                    chars.next();
                    literal.push('}');
                }
                '{' => {
                    let mut name = String::new();
                    loop {
                        match chars.next() {
                            Some('}') => break,
                            Some(c) => name.push(c),
                            None => return Err(invalid("unclosed '{'")),
                        }
                    }
                    let placeholder = Placeholder::from_name(name.trim())
                        .ok_or_else(|| invalid(&format!("unknown placeholder {{{}}}", name)))?;
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Value(placeholder));
                }
                '}' => return Err(invalid("unmatched '}'")),
                c => literal.push(c),
            }
        }
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(Self { segments })
    }

    /// Placeholders used, in order of appearance
    pub fn placeholders(&self) -> Vec<Placeholder> {
        self.segments
            .iter()
            .filter_map(|segment| match segment {
                Segment::Value(placeholder) => Some(*placeholder),
                Segment::Literal(_) => None,
            })
            .collect()
    }

    /// Fill in the placeholders for `channel`
    pub fn render(&self, channel: &ChannelRecord) -> String {
        self.segments
            .iter()
            .map(|segment| match segment {
                Segment::Literal(text) => text.clone(),
                Segment::Value(placeholder) => sanitize(placeholder.value(channel)),
            })
            .collect()
    }
}

impl FromStr for FilenameTemplate {
    type Err = StalkerError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for FilenameTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => f.write_str(&text.replace('{', "{{").replace('}', "}}"))?,
                Segment::Value(Placeholder::Id) => f.write_str("{id}")?,
                Segment::Value(Placeholder::Name) => f.write_str("{name}")?,
            }
        }
        Ok(())
    }
}

fn sanitize(value: &str) -> String {
    value
        .chars()
        .map(|c| if matches!(c, '/' | '\\' | '\0') { '_' } else { c })
        .collect()
}

/// Destination for downloaded logo bytes
#[async_trait]
pub trait LogoSink: Send + Sync {
    /// Store `body` at `path` and return the number of bytes written
    async fn save(&self, path: &Path, body: ByteStream) -> Result<u64>;
}

/// Writes logos to the local filesystem, creating directories as needed
#[derive(Debug, Clone, Copy, Default)]
pub struct FsLogoSink;

#[async_trait]
impl LogoSink for FsLogoSink {
    async fn save(&self, path: &Path, mut body: ByteStream) -> Result<u64> {
        let io_error = |source: std::io::Error| StalkerError::Io {
            path: path.to_path_buf(),
            source,
        };

        if let Some(dir) = path.parent() {
            tokio::fs::create_dir_all(dir).await.map_err(io_error)?;
        }
        let mut file = tokio::fs::File::create(path).await.map_err(io_error)?;

        let mut written = 0u64;
        while let Some(chunk) = body.next().await {
            let chunk = chunk.map_err(io_error)?;
            file.write_all(&chunk).await.map_err(io_error)?;
            written += chunk.len() as u64;
        }
        file.flush().await.map_err(io_error)?;
        Ok(written)
    }
}

impl StalkerClient {
    /// Download a channel's logo into `output_dir`.
    ///
    /// The filename comes from `template`; the returned path is where the
    /// sink stored the image.
    ///
    /// # Errors
    /// * `StalkerError::Config` if the channel has no logo or the rendered
    ///   filename is empty
    /// * `StalkerError::Transport` / `Status` tagged with
    ///   [`Operation::DownloadLogo`]
    /// * whatever the sink reports
    pub async fn download_logo(
        &self,
        channel: &ChannelRecord,
        output_dir: &Path,
        template: &FilenameTemplate,
        sink: &dyn LogoSink,
    ) -> Result<PathBuf> {
        if channel.logo.trim().is_empty() {
            return Err(StalkerError::Config(format!(
                "no logo URL provided for channel {}",
                channel.name
            )));
        }
        let url = resolve_logo_url(&self.config.portal_url, &channel.logo)?;

        let filename = template.render(channel);
        if filename.trim().is_empty() {
            return Err(StalkerError::Config(format!(
                "filename template {} renders empty for channel {}",
                template, channel.id
            )));
        }
        let path = output_dir.join(filename);

        let body = self.http.stream(&url, Operation::DownloadLogo).await?;
        let bytes = sink.save(&path, body).await?;

        debug!(channel_id = %channel.id, path = %path.display(), bytes, "Saved channel logo");
        Ok(path)
    }
}
