use crate::config::{RemoteConfig, RemoteKind, write_private};
use anyhow::Context;
use std::path::Path;
use tracing::info;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConfSection {
    pub name: String,
    pub entries: Vec<(String, String)>,
}

impl ConfSection {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value.as_str())
    }
}

pub fn section_for(remote: &RemoteConfig) -> ConfSection {
    let mut entries = vec![("type".to_string(), remote.kind.as_str().to_string())];
    match remote.kind {
        RemoteKind::B2 => {
            entries.push(("account".to_string(), remote.account_id.clone()));
            entries.push(("key".to_string(), remote.application_key.clone()));
        }
        RemoteKind::S3 => {
            entries.push(("provider".to_string(), "Other".to_string()));
            entries.push(("access_key_id".to_string(), remote.access_key_id.clone()));
            entries.push((
                "secret_access_key".to_string(),
                remote.secret_access_key.clone(),
            ));
            if let Some(region) = remote.region.as_deref().filter(|v| !v.trim().is_empty()) {
                entries.push(("region".to_string(), region.to_string()));
            }
            if let Some(endpoint) = remote.endpoint.as_deref().filter(|v| !v.trim().is_empty()) {
                entries.push(("endpoint".to_string(), endpoint.to_string()));
            }
        }
    }
    ConfSection {
        name: remote.name.clone(),
        entries,
    }
}

pub fn render(sections: &[ConfSection]) -> String {
    sections
        .iter()
        .map(|section| {
            let mut block = format!("[{}]\n", section.name);
            for (key, value) in &section.entries {
                block.push_str(&format!("{key} = {value}\n"));
            }
            block
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn generate(remotes: &[RemoteConfig]) -> String {
    let sections: Vec<ConfSection> = remotes.iter().map(section_for).collect();
    render(&sections)
}

pub fn parse(text: &str) -> Vec<ConfSection> {
    let mut sections = Vec::new();
    let mut current: Option<ConfSection> = None;
    for raw in text.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }
        if let Some(name) = line
            .strip_prefix('[')
            .and_then(|rest| rest.strip_suffix(']'))
        {
            if let Some(section) = current.take() {
                sections.push(section);
            }
            current = Some(ConfSection {
                name: name.trim().to_string(),
                entries: Vec::new(),
            });
            continue;
        }
        let Some(section) = current.as_mut() else {
            continue;
        };
        if let Some((key, value)) = line.split_once('=') {
            section
                .entries
                .push((key.trim().to_string(), value.trim().to_string()));
        }
    }
    if let Some(section) = current {
        sections.push(section);
    }
    sections
}

pub fn read(path: &Path) -> anyhow::Result<Vec<ConfSection>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("read rclone config {}", path.display()))?;
    Ok(parse(&text))
}

pub fn write(path: &Path, remotes: &[RemoteConfig]) -> anyhow::Result<()> {
    write_private(path, generate(remotes).as_bytes()).context("write rclone config")?;
    info!(path = %path.display(), remotes = remotes.len(), "Wrote rclone config");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn remotes() -> Vec<RemoteConfig> {
        let mut s3 = RemoteConfig::s3("wasabi", "AKIA", "secret");
        s3.region = Some("eu-central-1".to_string());
        s3.endpoint = Some("s3.eu-central-1.wasabisys.com".to_string());
        vec![RemoteConfig::b2("b2", "acct", "key123"), s3]
    }

    #[test]
    fn generates_one_section_per_remote() {
        let text = generate(&remotes());
        assert_eq!(
            text,
            "[b2]\n\
type = b2\n\
account = acct\n\
key = key123\n\
\n\
[wasabi]\n\
type = s3\n\
provider = Other\n\
access_key_id = AKIA\n\
secret_access_key = secret\n\
region = eu-central-1\n\
endpoint = s3.eu-central-1.wasabisys.com\n"
        );
    }

    #[test]
    fn s3_optional_keys_are_omitted_when_blank() {
        let mut remote = RemoteConfig::s3("s3", "a", "b");
        remote.region = Some(" ".to_string());
        let section = section_for(&remote);
        assert_eq!(section.get("region"), None);
        assert_eq!(section.get("endpoint"), None);
        assert_eq!(section.get("access_key_id"), Some("a"));
    }

    #[test]
    fn parse_recovers_generated_sections() {
        let sections = parse(&generate(&remotes()));
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].name, "b2");
        assert_eq!(sections[0].get("key"), Some("key123"));
        assert_eq!(sections[1].get("endpoint"), Some("s3.eu-central-1.wasabisys.com"));
    }

    #[test]
    fn parse_splits_on_first_equals_and_skips_comments() {
        let sections = parse(
            "# leading comment\n\
stray = ignored\n\
[crypt]\n\
type = crypt\n\
; note\n\
password = abc=def==\n\
\n\
[ empty ]\n",
        );
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].get("password"), Some("abc=def=="));
        assert_eq!(sections[1].name, "empty");
        assert!(sections[1].entries.is_empty());
    }

    #[test]
    fn write_then_read_round_trips() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("rclone.conf");
        write(&path, &remotes()).unwrap();
        let sections = read(&path).unwrap();
        assert_eq!(sections, parse(&generate(&remotes())));
        assert!(read(&tmp.path().join("missing.conf")).unwrap().is_empty());
    }
}
