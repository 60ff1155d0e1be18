//! Read-only tree view over registered commands.
//!
//! Nodes expand their children on first access, so building the roots of a
//! large dispatcher is cheap. The view is a snapshot: commands registered
//! after a node expanded are not reflected in it.

use std::sync::OnceLock;

use serde::Serialize;

use super::mapping::CommandMapping;
use super::principal::Principal;

/// A command and its declared subcommands.
#[derive(Debug)]
pub struct CommandNode {
    mapping: CommandMapping,
    children: OnceLock<Vec<CommandNode>>,
}

/// Owned, serializable rendering of a subtree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TreeEntry {
    pub alias: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<TreeEntry>,
}

impl CommandNode {
    pub fn new(mapping: CommandMapping) -> Self {
        Self {
            mapping,
            children: OnceLock::new(),
        }
    }

    pub fn mapping(&self) -> &CommandMapping {
        &self.mapping
    }

    pub fn primary_alias(&self) -> &str {
        self.mapping.primary_alias()
    }

    /// Subcommands, expanded on first call.
    pub fn children(&self) -> &[CommandNode] {
        self.children.get_or_init(|| {
            self.mapping
                .callable()
                .child_mappings()
                .into_iter()
                .map(CommandNode::new)
                .collect()
        })
    }

    pub fn is_leaf(&self) -> bool {
        self.children().is_empty()
    }

    /// Follows primary or secondary aliases down the tree.
    pub fn find(&self, path: &[&str]) -> Option<&CommandNode> {
        let Some((head, rest)) = path.split_first() else {
            return Some(self);
        };
        let head = head.to_lowercase();
        self.children()
            .iter()
            .find(|child| {
                child
                    .mapping
                    .all_aliases()
                    .any(|alias| alias.to_lowercase() == head)
            })
            .and_then(|child| child.find(rest))
    }

    /// Every full invocation path under this node, primary aliases joined by spaces.
    pub fn paths(&self) -> Vec<String> {
        let mut paths = vec![self.primary_alias().to_string()];
        for child in self.children() {
            paths.extend(
                child
                    .paths()
                    .into_iter()
                    .map(|path| format!("{} {}", self.primary_alias(), path)),
            );
        }
        paths
    }

    /// Renders this subtree, keeping only commands `principal` may use.
    pub fn describe(&self, principal: &dyn Principal) -> TreeEntry {
        let callable = self.mapping.callable();
        TreeEntry {
            alias: self.primary_alias().to_string(),
            aliases: self.mapping.secondary_aliases().to_vec(),
            description: callable.short_description(principal),
            children: self
                .children()
                .iter()
                .filter(|child| child.mapping.callable().test_permission(principal))
                .map(|child| child.describe(principal))
                .collect(),
        }
    }
}

/// Indented text rendering of a forest, one command per line.
pub fn render_tree(entries: &[TreeEntry]) -> String {
    fn walk(entry: &TreeEntry, depth: usize, out: &mut Vec<String>) {
        let mut line = format!("{}{}", "  ".repeat(depth), entry.alias);
        if !entry.aliases.is_empty() {
            line.push_str(&format!(" ({})", entry.aliases.join(", ")));
        }
        if let Some(description) = &entry.description {
            line.push_str(&format!(" - {description}"));
        }
        out.push(line);
        for child in &entry.children {
            walk(child, depth + 1, out);
        }
    }

    let mut out = Vec::new();
    for entry in entries {
        walk(entry, 0, &mut out);
    }
    out.join("\n")
}
