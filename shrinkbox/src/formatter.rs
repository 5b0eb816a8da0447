use serde_json::json;

use crate::Archive;

/// Text renderings of an archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Formatter {
    /// `<name>: <n> assets`
    #[default]
    Simple,
    /// The name, then one path per line sorted by path. Directories end in `/`.
    Verbose,
    /// `{"name": .., "entries": [{"path": .., "kind": ..}, ..]}` in insertion order.
    Json,
}

impl Formatter {
    pub fn format(self, archive: &Archive) -> String {
        match self {
            Formatter::Simple => format!("{}: {} assets", archive.name(), archive.len()),
            Formatter::Verbose => verbose(archive),
            Formatter::Json => {
                let entries: Vec<_> = archive
                    .contents()
                    .map(|node| {
                        json!({
                            "path": node.path().as_str(),
                            "kind": node.kind().as_str(),
                        })
                    })
                    .collect();

                json!({
                    "name": archive.name(),
                    "entries": entries,
                })
                .to_string()
            }
        }
    }
}

fn verbose(archive: &Archive) -> String {
    let mut nodes: Vec<_> = archive.contents().collect();
    nodes.sort_by(|a, b| a.path().cmp(b.path()));

    let mut out = format!("{}:", archive.name());
    for node in nodes {
        out.push('\n');
        out.push_str(node.path().as_str());
        if node.is_directory() {
            out.push('/');
        }
    }
    out
}
