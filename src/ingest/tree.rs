//! ASCII directory tree rendering for the digest header.

use std::collections::BTreeMap;
use std::path::{Component, Path};

/// A directory node; files are leaves with no children.
#[derive(Debug, Default)]
struct Node {
    dirs: BTreeMap<String, Node>,
    files: Vec<String>,
}

impl Node {
    fn insert(&mut self, relative: &Path) {
        let parts: Vec<String> = relative
            .components()
            .filter_map(|c| match c {
                Component::Normal(name) => Some(name.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect();

        let Some((file, dirs)) = parts.split_last() else {
            return;
        };

        let mut node = self;
        for dir in dirs {
            node = node.dirs.entry(dir.clone()).or_default();
        }
        node.files.push(file.clone());
    }

    fn render(&self, prefix: &str, out: &mut String) {
        let mut files: Vec<&String> = self.files.iter().collect();
        files.sort();

        let total = self.dirs.len() + files.len();
        let mut index = 0;

        // Directories first, then files
        for (name, child) in &self.dirs {
            index += 1;
            let is_last = index == total;
            let connector = if is_last { "└── " } else { "├── " };
            out.push_str(&format!("{prefix}{connector}{name}/\n"));

            let child_prefix = if is_last {
                format!("{prefix}    ")
            } else {
                format!("{prefix}│   ")
            };
            child.render(&child_prefix, out);
        }

        for name in files {
            index += 1;
            let connector = if index == total { "└── " } else { "├── " };
            out.push_str(&format!("{prefix}{connector}{name}\n"));
        }
    }
}

/// Render the tree of `relative_paths` under a root labelled `root_name`.
pub fn render_tree<'a, I>(root_name: &str, relative_paths: I) -> String
where
    I: IntoIterator<Item = &'a Path>,
{
    let mut root = Node::default();
    for path in relative_paths {
        root.insert(path);
    }

    let mut out = String::from("Directory structure:\n");
    out.push_str(&format!("└── {root_name}/\n"));
    root.render("    ", &mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_render_nested_tree() {
        let paths = [
            PathBuf::from("README.md"),
            PathBuf::from("src/main.rs"),
            PathBuf::from("src/app/mod.rs"),
            PathBuf::from("Cargo.toml"),
        ];
        let tree = render_tree("demo", paths.iter().map(|p| p.as_path()));

        let expected = "\
Directory structure:
└── demo/
    ├── src/
    │   ├── app/
    │   │   └── mod.rs
    │   └── main.rs
    ├── Cargo.toml
    └── README.md
";
        assert_eq!(tree, expected);
    }

    #[test]
    fn test_render_empty_tree() {
        let tree = render_tree("empty", std::iter::empty());
        assert_eq!(tree, "Directory structure:\n└── empty/\n");
    }
}
