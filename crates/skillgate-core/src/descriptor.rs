// ABOUTME: Parses the leading YAML header of a SKILL.md descriptor into a name and description.
// ABOUTME: The markdown body below the header is the skill's instructions and is not read here.

use serde::Deserialize;
use thiserror::Error;

/// File name every skill directory must contain.
pub const DESCRIPTOR_FILE_NAME: &str = "SKILL.md";

const HEADER_MARKER: &str = "---";

/// Errors from parsing a descriptor's header block.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DescriptorError {
    #[error("descriptor must start with a '---' header line")]
    MissingHeader,

    #[error("descriptor header is not terminated by a closing '---' line")]
    UnterminatedHeader,

    #[error("descriptor header is not valid YAML: {0}")]
    InvalidYaml(String),

    #[error("descriptor header is missing required field: {0}")]
    MissingField(&'static str),
}

/// The listing fields extracted from a descriptor header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkillDescriptor {
    pub name: String,
    pub description: String,
}

/// Header fields we care about. Anything else in the header (license,
/// allowed-tools, metadata maps) is ignored.
#[derive(Debug, Deserialize)]
struct DescriptorHeader {
    name: Option<String>,
    description: Option<String>,
}

/// Parse a descriptor's text into its listing fields.
pub fn parse_descriptor(content: &str) -> Result<SkillDescriptor, DescriptorError> {
    let header = split_header(content)?;

    if header.trim().is_empty() {
        return Err(DescriptorError::MissingField("name"));
    }

    let parsed: DescriptorHeader = serde_yaml::from_str(header)
        .map_err(|e| DescriptorError::InvalidYaml(e.to_string()))?;

    let name = required(parsed.name, "name")?;
    let description = required(parsed.description, "description")?;

    Ok(SkillDescriptor { name, description })
}

/// Trim a header value; blank counts as missing.
fn required(value: Option<String>, field: &'static str) -> Result<String, DescriptorError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or(DescriptorError::MissingField(field))
}

/// Return the text between the opening and closing marker lines.
fn split_header(content: &str) -> Result<&str, DescriptorError> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);

    let (first_line, rest) = match content.find('\n') {
        Some(pos) => (&content[..pos], &content[pos + 1..]),
        None => (content, ""),
    };
    if first_line.trim_end() != HEADER_MARKER {
        return Err(DescriptorError::MissingHeader);
    }

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == HEADER_MARKER {
            return Ok(&rest[..offset]);
        }
        offset += line.len();
    }

    Err(DescriptorError::UnterminatedHeader)
}
