use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Context;
use regulations_core::{decode_handoff, encode_handoff, Resource};
use regulations_logging::regs_info;
use tempfile::NamedTempFile;

/// Atomically write `content` to `target` by writing a temp file next to it and renaming.
pub fn write_atomic(target: &Path, content: &str) -> anyhow::Result<()> {
    let dir = match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create directory {}", dir.display()))?;

    let mut tmp = NamedTempFile::new_in(&dir)
        .with_context(|| format!("directory {} is not writable", dir.display()))?;
    tmp.write_all(content.as_bytes())?;
    tmp.flush()?;
    tmp.as_file_mut().sync_all()?;
    tmp.persist(target)
        .map_err(|err| err.error)
        .with_context(|| format!("failed to write {}", target.display()))?;
    Ok(())
}

/// File name a resource's handoff is stored under.
pub fn handoff_filename(exist_name: &str) -> String {
    let safe: String = exist_name
        .chars()
        .map(|c| if matches!(c, '/' | '\\') { '_' } else { c })
        .collect();
    format!("{safe}.json")
}

pub fn write_handoff(dir: &Path, resource: &Resource) -> anyhow::Result<PathBuf> {
    let content = encode_handoff(resource)
        .with_context(|| format!("failed to encode {}", resource.exist_name))?;
    let target = dir.join(handoff_filename(&resource.exist_name));
    write_atomic(&target, &content)?;
    Ok(target)
}

/// Writes one handoff per resource and returns the paths written.
pub fn write_handoffs(dir: &Path, resources: &[Resource]) -> anyhow::Result<Vec<PathBuf>> {
    let written = resources
        .iter()
        .map(|resource| write_handoff(dir, resource))
        .collect::<anyhow::Result<Vec<_>>>()?;
    regs_info!("Wrote {} handoff file(s) to {:?}", written.len(), dir);
    Ok(written)
}

pub fn read_handoff(path: &Path) -> anyhow::Result<Resource> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read handoff {}", path.display()))?;
    decode_handoff(&raw).with_context(|| format!("invalid handoff {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use regulations_core::Revision;
    use tempfile::TempDir;

    fn resource(name: &str) -> Resource {
        Resource {
            exist_name: name.to_string(),
            title: "Fachkraft Küche".to_string(),
            time: "2022".to_string(),
            regulation: "<TEI>text</TEI>".to_string(),
            page_images: vec!["http://backend/p1.png".to_string()],
            revisions: vec![Revision {
                version: 1,
                timestamp: Some("2024-01-01T00:00:00Z".to_string()),
                user: Some("admin".to_string()),
            }],
        }
    }

    #[test]
    fn search_results_can_be_reopened_from_handoff_files() {
        let dir = TempDir::new().unwrap();
        let results = vec![resource("koch.xml"), resource("baecker.xml")];

        let written = write_handoffs(dir.path(), &results).unwrap();
        assert_eq!(
            written,
            vec![
                dir.path().join("koch.xml.json"),
                dir.path().join("baecker.xml.json")
            ]
        );
        assert_eq!(read_handoff(&written[0]).unwrap(), results[0]);
    }

    #[test]
    fn handoff_names_never_escape_the_directory() {
        assert_eq!(handoff_filename("a/b\\c.xml"), "a_b_c.xml.json");
    }

    #[test]
    fn overwrites_existing_files() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("nested").join("out.xml");

        write_atomic(&target, "first").unwrap();
        write_atomic(&target, "second").unwrap();
        assert_eq!(fs::read_to_string(&target).unwrap(), "second");
    }

    #[test]
    fn malformed_handoff_is_reported() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "{\"exist_name\": ").unwrap();

        let err = read_handoff(&path).unwrap_err();
        assert!(err.to_string().contains("invalid handoff"));
    }
}
