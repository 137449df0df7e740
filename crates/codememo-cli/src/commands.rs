//! CLI command implementations.

use crate::config::Config;
use codememo_core::Snippet;
use codememo_graph::{Node, NodeCollection, NodeId};
use colored::Colorize;
use std::fs;
use std::path::Path;

type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;

/// Resolves a full id or a unique id prefix.
fn resolve_node(collection: &NodeCollection, query: &str) -> Result<NodeId> {
    if let Ok(id) = query.parse::<NodeId>() {
        if collection.contains(id) {
            return Ok(id);
        }
    }
    match collection.find_by_prefix(query).as_slice() {
        [id] => Ok(*id),
        [] => Err(format!("no node matches \"{}\"", query).into()),
        many => Err(format!("\"{}\" matches {} nodes, use a longer prefix", query, many.len()).into()),
    }
}

fn label(collection: &NodeCollection, id: NodeId) -> String {
    let name = collection
        .get(id)
        .map(|node| node.snippet.name.as_str())
        .unwrap_or("?");
    format!("{} {}", id.short().dimmed(), name.cyan())
}

/// Parses `a:b`, `a:` or `a` into a line range.
fn parse_lines(range: &str) -> Result<(usize, Option<usize>)> {
    let (start, stop) = match range.split_once(':') {
        Some((start, "")) => (start, None),
        Some((start, stop)) => (start, Some(stop)),
        None => (range, Some(range)),
    };
    let start: usize = start.trim().parse()?;
    let stop = stop.map(|s| s.trim().parse::<usize>()).transpose()?;
    if start == 0 || stop.map_or(false, |stop| stop < start) {
        return Err(format!("invalid line range \"{}\"", range).into());
    }
    Ok((start, stop))
}

fn lang_for(path: &Path, config: &Config) -> String {
    let lang = match path.extension().and_then(|ext| ext.to_str()) {
        Some("rs") => "rust",
        Some("py") => "python",
        Some("c") | Some("h") => "c",
        Some("cc") | Some("cpp") | Some("hpp") => "cpp",
        Some("go") => "go",
        Some("java") => "java",
        Some("js") | Some("jsx") => "javascript",
        Some("ts") | Some("tsx") => "typescript",
        Some("dart") => "dart",
        Some("cs") => "c_sharp",
        _ => return config.default_lang.clone(),
    };
    lang.to_string()
}

/// Write an empty document.
pub fn new(doc: &Path, force: bool) -> Result<()> {
    if doc.exists() && !force {
        return Err(format!("{} already exists, pass --force to overwrite", doc.display()).into());
    }
    NodeCollection::new().save(doc)?;
    println!("{} Created {}", "✓".green(), doc.display());
    Ok(())
}

/// Excerpt a source file into a new node.
pub fn add(
    doc: &Path,
    file: &Path,
    lines: Option<&str>,
    name: Option<String>,
    lang: Option<String>,
    comment: Option<String>,
    config: &Config,
) -> Result<()> {
    let mut collection = NodeCollection::load(doc)?;

    let text = config.normalize_text(&fs::read_to_string(file)?);
    let all_lines: Vec<&str> = text.lines().collect();
    let (start, stop) = match lines {
        Some(range) => parse_lines(range)?,
        None => (1, None),
    };
    let stop = stop.unwrap_or(all_lines.len()).min(all_lines.len());
    if start > stop {
        return Err(format!("{} has only {} lines", file.display(), all_lines.len()).into());
    }
    let content = all_lines[start - 1..stop].join("\n");

    let name = name.unwrap_or_else(|| {
        file.file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| file.display().to_string())
    });
    let snippet = Snippet::new(name, content)
        .with_line_start(u32::try_from(start)?)
        .with_lang(lang.unwrap_or_else(|| lang_for(file, config)))
        .with_path(file.display().to_string());

    let node = Node::new(snippet).with_comment(comment.unwrap_or_default());
    let id = collection.add_node(node)?;
    collection.save(doc)?;

    println!("{} Added {}", "✓".green(), label(&collection, id));
    println!("{}", id);
    Ok(())
}

/// Make `leaf` refer to lines of `root`.
pub fn link(doc: &Path, root: &str, leaf: &str, start: u32, stop: Option<u32>) -> Result<()> {
    let mut collection = NodeCollection::load(doc)?;
    let root = resolve_node(&collection, root)?;
    let leaf = resolve_node(&collection, leaf)?;

    collection.add_leaf_reference(root, leaf, start, stop)?;
    collection.save(doc)?;

    println!(
        "{} {} → {}",
        "✓".green(),
        label(&collection, root),
        label(&collection, leaf)
    );
    Ok(())
}

/// Remove `root` from the roots of `leaf`.
pub fn unlink(doc: &Path, leaf: &str, root: &str) -> Result<()> {
    let mut collection = NodeCollection::load(doc)?;
    let leaf = resolve_node(&collection, leaf)?;
    let root = resolve_node(&collection, root)?;

    collection.remove_root_reference(leaf, root)?;
    collection.save(doc)?;

    println!(
        "{} Unlinked {} from {}",
        "✓".green(),
        label(&collection, leaf),
        label(&collection, root)
    );
    Ok(())
}

/// Remove a node, or a node and everything below it.
pub fn remove(doc: &Path, node: &str, recursive: bool) -> Result<()> {
    let mut collection = NodeCollection::load(doc)?;
    let id = resolve_node(&collection, node)?;

    let removed = if recursive {
        collection.remove_node_and_its_leaves(id)?
    } else {
        vec![collection.remove_node(id)?]
    };
    collection.save(doc)?;

    for node in &removed {
        println!(
            "{} Removed {} {}",
            "✓".green(),
            node.id().short().dimmed(),
            node.snippet.name.cyan()
        );
    }
    Ok(())
}

/// Print the forest layer by layer.
pub fn show(doc: &Path) -> Result<()> {
    let collection = NodeCollection::load(doc)?;
    let forest = collection.resolve_trees();

    for (i, tree) in forest.trees.iter().enumerate() {
        println!("{}", format!("Tree {}", i + 1).bold());
        for (depth, layer) in tree.layers.iter().enumerate() {
            for id in layer {
                let Some(node) = collection.get(*id) else {
                    continue;
                };
                let refs: Vec<String> = node
                    .ref_infos()
                    .map(|(root, info)| {
                        let root_name = collection
                            .get(root)
                            .map(|r| r.snippet.name.as_str())
                            .unwrap_or("?");
                        format!("{}:{}", root_name, info.range())
                    })
                    .collect();
                let refs = if refs.is_empty() {
                    String::new()
                } else {
                    format!(" ← {}", refs.join(", "))
                };
                println!(
                    "  {}{}{}",
                    "  ".repeat(depth),
                    label(&collection, *id),
                    refs.dimmed()
                );
                if !node.comment.is_empty() {
                    println!("  {}  {}", "  ".repeat(depth), node.comment.italic());
                }
            }
        }
        println!();
    }

    if !forest.orphans.is_empty() {
        println!("{}", "Orphans".bold());
        for id in &forest.orphans {
            println!("  {}", label(&collection, *id));
        }
    }
    Ok(())
}

/// Print every link, ordered to follow the forest.
pub fn links(doc: &Path, json: bool) -> Result<()> {
    let collection = NodeCollection::load(doc)?;
    let forest = collection.resolve_trees();
    let links = collection.resolve_links_from_trees(&forest);

    if json {
        println!("{}", serde_json::to_string_pretty(&links)?);
        return Ok(());
    }

    if links.is_empty() {
        println!("No links");
        return Ok(());
    }
    for link in links {
        let marker = if link.is_self_loop() { " (self)" } else { "" };
        println!(
            "  {} [{}] → {} [{}]{}",
            label(&collection, link.root),
            link.leaf_slot,
            label(&collection, link.leaf),
            link.root_slot,
            marker.yellow()
        );
    }
    Ok(())
}

/// Load (and so validate) a document and print statistics.
pub fn status(doc: &Path) -> Result<()> {
    let collection = NodeCollection::load(doc)?;
    let stats = collection.stats();

    println!("{}", "Codememo Status".cyan().bold());
    println!();
    println!("  {} {}", "Nodes:".dimmed(), stats.node_count);
    println!("  {} {}", "Links:".dimmed(), stats.edge_count);
    println!("  {} {}", "Trees:".dimmed(), stats.tree_count);
    println!("  {} {}", "Orphans:".dimmed(), stats.orphan_count);
    println!("  {} {}", "Self-references:".dimmed(), stats.self_loops);
    println!("  {} {}", "Cycles:".dimmed(), stats.cycles);
    Ok(())
}

/// Export a document as Graphviz DOT.
pub fn export_dot(doc: &Path, output: Option<&Path>) -> Result<()> {
    let collection = NodeCollection::load(doc)?;
    let dot = collection.to_dot();
    match output {
        Some(path) => {
            fs::write(path, dot)?;
            println!("{} Exported to {}", "✓".green(), path.display());
        }
        None => print!("{}", dot),
    }
    Ok(())
}

/// Build a document from a Graphviz DOT file.
pub fn import_dot(dot: &Path, output: &Path, force: bool) -> Result<()> {
    if output.exists() && !force {
        return Err(format!("{} already exists, pass --force to overwrite", output.display()).into());
    }
    let source = fs::read_to_string(dot)?;
    let collection = NodeCollection::from_dot(&source)?;
    collection.save(output)?;
    println!(
        "{} Imported {} nodes ({} links) into {}",
        "✓".green(),
        collection.len().to_string().cyan(),
        collection.edge_count().to_string().cyan(),
        output.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_parse_lines() {
        assert_eq!(parse_lines("3:7").unwrap(), (3, Some(7)));
        assert_eq!(parse_lines("3:").unwrap(), (3, None));
        assert_eq!(parse_lines("4").unwrap(), (4, Some(4)));
        assert!(parse_lines("0:2").is_err());
        assert!(parse_lines("5:2").is_err());
        assert!(parse_lines("x").is_err());
    }

    #[test]
    fn test_lang_for() {
        let config = Config::default();
        assert_eq!(lang_for(Path::new("a/b.rs"), &config), "rust");
        assert_eq!(lang_for(Path::new("Makefile"), &config), "raw");
    }

    #[test]
    fn test_add_link_remove_flow() {
        let dir = tempdir().unwrap();
        let doc = dir.path().join("memo.json");
        let src = dir.path().join("main.py");
        fs::write(&src, "import os\n\ndef main():\n\tprint(os.getcwd())\n").unwrap();
        let config = Config::default();

        new(&doc, false).unwrap();
        assert!(new(&doc, false).is_err());

        add(&doc, &src, Some("3:4"), None, None, None, &config).unwrap();
        add(&doc, &src, Some("1"), Some("imports".into()), None, Some("top".into()), &config).unwrap();

        let collection = NodeCollection::load(&doc).unwrap();
        let main = collection.find_by_name("main.py")[0];
        assert_eq!(main.snippet.content, "def main():\n    print(os.getcwd())");
        assert_eq!(main.snippet.line_start, 3);
        assert_eq!(main.snippet.lang, "python");
        let (main_id, imports_id) = (main.id(), collection.find_by_name("imports")[0].id());

        link(&doc, &imports_id.to_string(), &main_id.to_string()[..8], 2, None).unwrap();
        let collection = NodeCollection::load(&doc).unwrap();
        assert_eq!(collection.get(main_id).unwrap().roots(), &[imports_id]);

        // A rejected link leaves the document untouched and loadable.
        assert!(link(&doc, &main_id.to_string(), &imports_id.to_string(), 0, None).is_err());
        let collection = NodeCollection::load(&doc).unwrap();
        assert_eq!(collection.edge_count(), 1);

        status(&doc).unwrap();
        show(&doc).unwrap();
        links(&doc, false).unwrap();
        links(&doc, true).unwrap();
        let dot = dir.path().join("memo.dot");
        export_dot(&doc, Some(&dot)).unwrap();
        assert!(fs::read_to_string(&dot).unwrap().contains("L2"));

        unlink(&doc, &main_id.to_string(), &imports_id.to_string()).unwrap();
        assert!(unlink(&doc, &main_id.to_string(), &imports_id.to_string()).is_err());
        let collection = NodeCollection::load(&doc).unwrap();
        assert_eq!(collection.edge_count(), 0);
        assert!(collection.get(main_id).unwrap().roots().is_empty());
        status(&doc).unwrap();

        link(&doc, &imports_id.to_string(), &main_id.to_string(), 1, Some(2)).unwrap();
        assert!(remove(&doc, &imports_id.to_string(), false).is_err());
        remove(&doc, &imports_id.to_string(), true).unwrap();
        assert!(NodeCollection::load(&doc).unwrap().is_empty());
    }

    #[test]
    fn test_import_dot() {
        let dir = tempdir().unwrap();
        let dot = dir.path().join("g.dot");
        let doc = dir.path().join("g.json");
        fs::write(&dot, "digraph { a -> b; b -> c }").unwrap();

        import_dot(&dot, &doc, false).unwrap();

        let collection = NodeCollection::load(&doc).unwrap();
        assert_eq!(collection.len(), 3);
        assert_eq!(collection.edge_count(), 2);
    }
}
