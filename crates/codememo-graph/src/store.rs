use crate::collection::NodeCollection;
use codememo_core::LoadError;
use std::fs;
use std::path::Path;
use tracing::debug;

impl NodeCollection {
    /// Loads a collection from a JSON document on disk.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let collection = Self::from_json_str(&text)?;
        debug!(
            path = %path.display(),
            nodes = collection.len(),
            edges = collection.edge_count(),
            "loaded collection"
        );
        Ok(collection)
    }

    /// Saves the collection as pretty-printed JSON, replacing any existing file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), LoadError> {
        let path = path.as_ref();
        let text = self.to_json_string()?;
        fs::write(path, text).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), nodes = self.len(), "saved collection");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Node;
    use codememo_core::Snippet;
    use tempfile::tempdir;

    #[test]
    fn test_save_load_collection() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("memo.json");

        let mut collection = NodeCollection::new();
        let a = collection
            .add_node(Node::new(Snippet::new("main.c", "int main(void) {\n  return 0;\n}").with_lang("c")))
            .unwrap();
        let b = collection
            .add_node(Node::new(Snippet::new("helper.c", "void helper(void) {}").with_lang("c")))
            .unwrap();
        collection.add_leaf_reference(a, b, 1, None).unwrap();

        collection.save(&path).unwrap();
        let loaded = NodeCollection::load(&path).unwrap();

        assert_eq!(loaded, collection);
        assert_eq!(loaded.to_value().unwrap(), collection.to_value().unwrap());
    }

    #[test]
    fn test_save_load_empty_collection() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.json");

        NodeCollection::new().save(&path).unwrap();
        let loaded = NodeCollection::load(&path).unwrap();
        assert!(loaded.is_empty());
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempdir().unwrap();
        let result = NodeCollection::load(dir.path().join("missing.json"));
        assert!(matches!(result, Err(LoadError::Io { .. })));
    }

    #[test]
    fn test_load_malformed_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "not json").unwrap();
        assert!(matches!(
            NodeCollection::load(&path),
            Err(LoadError::Json(_))
        ));
    }
}
