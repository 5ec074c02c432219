//! Locating the embedded CFG in an instrumented binary.
//!
//! The instrumentation pass emits the edge list as a NUL-terminated ASCII
//! blob in a section named `.cfg-<suffix>`. Only the first such section is
//! used.

use goblin::Object;

pub const CFG_SECTION_PREFIX: &str = ".cfg-";

#[derive(Debug, thiserror::Error)]
pub enum SectionError {
    #[error("not an ELF binary")]
    NotElf,

    #[error("failed to parse binary: {0}")]
    Parse(#[from] goblin::error::Error),

    #[error("no section named {CFG_SECTION_PREFIX}* in binary")]
    MissingSection,

    #[error("section {name} lies outside the file")]
    OutOfBounds { name: String },
}

/// A CFG section borrowed from the binary's bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CfgSection<'a> {
    pub name: String,
    /// Section contents with the trailing NUL removed.
    pub data: &'a [u8],
}

pub fn extract_cfg_section(binary: &[u8]) -> Result<CfgSection<'_>, SectionError> {
    let elf = match Object::parse(binary)? {
        Object::Elf(elf) => elf,
        _ => return Err(SectionError::NotElf),
    };

    for header in &elf.section_headers {
        let Some(name) = elf.shdr_strtab.get_at(header.sh_name) else {
            continue;
        };
        if !name.starts_with(CFG_SECTION_PREFIX) {
            continue;
        }
        let data = header
            .file_range()
            .and_then(|range| binary.get(range))
            .ok_or_else(|| SectionError::OutOfBounds {
                name: name.to_string(),
            })?;
        let data = data.strip_suffix(b"\0").unwrap_or(data);
        return Ok(CfgSection {
            name: name.to_string(),
            data,
        });
    }
    Err(SectionError::MissingSection)
}
