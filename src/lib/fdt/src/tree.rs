use std::collections::HashMap;
use std::path::Path;

use crate::blob::{self, RawNode};
use crate::error::{Error, Result};
use crate::node::{Node, NodeIdx};
use crate::prop::Prop;
use crate::value::Value;

/// An in-memory devicetree, backed by a packed FDT blob.
///
/// Nodes live in a flat arena (`nodes`), addressed by index rather than by
/// pointer or reference, so the tree can be walked and mutated without
/// fighting the borrow checker over parent/child/sibling links. `valid`
/// tracks whether the per-node/per-property offset cache still matches
/// `blob`; any structural mutation clears it, and [`Fdt::refresh`] or
/// [`Fdt::sync`] recomputes it.
#[derive(Debug)]
pub struct Fdt {
    nodes: Vec<Node>,
    root: NodeIdx,
    phandle_to_node: HashMap<u32, NodeIdx>,
    blob: Option<Vec<u8>>,
    capacity: usize,
    valid: bool,
}

impl Fdt {
    /// Parse a packed FDT blob into a tree.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let raw = blob::parse_tree(bytes)?;
        let mut fdt = Self {
            nodes: Vec::new(),
            root: 0,
            phandle_to_node: HashMap::new(),
            blob: None,
            capacity: bytes.len(),
            valid: false,
        };
        fdt.root = fdt.build_arena(None, &raw);
        fdt.index_phandles()?;
        fdt.sync(true)?;
        Ok(fdt)
    }

    /// An empty tree containing only an unnamed root node, for building a
    /// devicetree programmatically rather than parsing one.
    pub fn empty() -> Self {
        let mut fdt = Self {
            nodes: Vec::new(),
            root: 0,
            phandle_to_node: HashMap::new(),
            blob: None,
            capacity: 0,
            valid: false,
        };
        fdt.nodes.push(Node::new(0, None, String::new()));
        fdt
    }

    /// Read and parse a `.dtb` file from disk.
    pub fn scan(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)
            .map_err(|e| Error::Io(path.display().to_string(), e))?;
        Self::from_bytes(&bytes)
    }

    fn build_arena(&mut self, parent: Option<NodeIdx>, raw: &RawNode) -> NodeIdx {
        let idx = self.nodes.len();
        self.nodes.push(Node::new(idx, parent, raw.name.clone()));
        for (name, data) in &raw.props {
            self.nodes[idx].add_prop(Prop::from_bytes(name.clone(), data));
        }
        for child in &raw.children {
            let cidx = self.build_arena(Some(idx), child);
            self.nodes[idx].add_child(cidx);
        }
        idx
    }

    fn index_phandles(&mut self) -> Result<()> {
        for i in 0..self.nodes.len() {
            let phandle = self.nodes[i]
                .prop("phandle")
                .or_else(|| self.nodes[i].prop("linux,phandle"))
                .and_then(|p| match p.value() {
                    Value::Int(v) => Some(*v),
                    _ => None,
                });
            if let Some(ph) = phandle {
                if ph == 0 {
                    continue;
                }
                self.nodes[i].set_phandle(ph);
                if let Some(&other) = self.phandle_to_node.get(&ph) {
                    return Err(Error::DuplicatePhandle(
                        ph,
                        self.path(other),
                        self.path(i),
                    ));
                }
                self.phandle_to_node.insert(ph, i);
            }
        }
        Ok(())
    }

    pub fn root(&self) -> NodeIdx {
        self.root
    }

    pub fn node(&self, idx: NodeIdx) -> &Node {
        &self.nodes[idx]
    }

    pub fn node_mut(&mut self, idx: NodeIdx) -> &mut Node {
        self.valid = false;
        &mut self.nodes[idx]
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    pub fn node_by_phandle(&self, phandle: u32) -> Option<NodeIdx> {
        self.phandle_to_node.get(&phandle).copied()
    }

    /// Full slash-separated path from the root to `idx`, e.g. `/soc/uart@0`.
    pub fn path(&self, idx: NodeIdx) -> String {
        let mut parts = Vec::new();
        let mut cur = Some(idx);
        while let Some(i) = cur {
            if i == self.root {
                break;
            }
            parts.push(self.nodes[i].name().to_string());
            cur = self.nodes[i].parent();
        }
        parts.reverse();
        format!("/{}", parts.join("/"))
    }

    pub fn find_node_by_path(&self, path: &str) -> Option<NodeIdx> {
        if path.is_empty() || path == "/" {
            return Some(self.root);
        }
        let mut cur = self.root;
        'outer: for part in path.trim_start_matches('/').split('/') {
            for &child in self.nodes[cur].children() {
                if self.nodes[child].name() == part {
                    cur = child;
                    continue 'outer;
                }
            }
            return None;
        }
        Some(cur)
    }

    pub fn walk_preorder(&self) -> Vec<NodeIdx> {
        let mut out = Vec::new();
        self.walk_from(self.root, &mut out);
        out
    }

    fn walk_from(&self, idx: NodeIdx, out: &mut Vec<NodeIdx>) {
        out.push(idx);
        for &child in self.nodes[idx].children() {
            self.walk_from(child, out);
        }
    }

    /// Add a new, initially empty subnode of `parent`, returning its index.
    pub fn add_subnode(&mut self, parent: NodeIdx, name: impl Into<String>) -> NodeIdx {
        let idx = self.nodes.len();
        self.nodes.push(Node::new(idx, Some(parent), name));
        self.nodes[parent].add_child(idx);
        self.valid = false;
        idx
    }

    /// Insert a new subnode of `parent` at a specific position among its
    /// existing children (used to keep generated aliasing nodes first).
    pub fn insert_subnode(&mut self, parent: NodeIdx, pos: usize, name: impl Into<String>) -> NodeIdx {
        let idx = self.nodes.len();
        self.nodes.push(Node::new(idx, Some(parent), name));
        self.nodes[parent].insert_child(pos, idx);
        self.valid = false;
        idx
    }

    pub fn move_to_first(&mut self, idx: NodeIdx) {
        if let Some(parent) = self.nodes[idx].parent() {
            self.nodes[parent].move_child_to_first(idx);
            self.valid = false;
        }
    }

    pub fn delete_node(&mut self, idx: NodeIdx) {
        let children: Vec<NodeIdx> = self.nodes[idx].children().to_vec();
        for child in children {
            self.delete_node(child);
        }
        if let Some(parent) = self.nodes[idx].parent() {
            self.nodes[parent].remove_child(idx);
        }
        if let Some(ph) = self.nodes[idx].phandle() {
            self.phandle_to_node.remove(&ph);
        }
        self.valid = false;
    }

    fn find_child_by_name(&self, parent: NodeIdx, name: &str) -> Option<NodeIdx> {
        self.nodes[parent]
            .children()
            .iter()
            .copied()
            .find(|&c| self.nodes[c].name() == name)
    }

    /// Copy properties present in `src` but missing from `dst`; `phandle` is
    /// skipped unless `copy_phandles`, since two nodes sharing a phandle
    /// would make phandle references ambiguous.
    fn merge_props(&mut self, dst: NodeIdx, src: NodeIdx, copy_phandles: bool) {
        let props = self.nodes[src].props().to_vec();
        for p in props {
            if p.name() == "phandle" && !copy_phandles {
                continue;
            }
            if self.nodes[dst].prop(p.name()).is_none() {
                self.nodes[dst].add_prop(Prop::new(p.name().to_string(), p.value().clone()));
            }
        }
    }

    /// Copy `src` and all its subnodes into `parent`. If `parent` already
    /// has a same-named child, only its subnodes and properties are merged
    /// into that existing node (placed before any existing subnodes) rather
    /// than creating a duplicate; properties already present on the
    /// destination are left untouched. `copy_phandles` governs only the
    /// top-level node's own `phandle` property — every recursive subnode
    /// copy always carries its `phandle` along, since only the node
    /// explicitly requested by the caller risks a phandle collision.
    pub fn copy_node(&mut self, parent: NodeIdx, src: NodeIdx, copy_phandles: bool) -> NodeIdx {
        let src_name = self.nodes[src].name().to_string();
        let dst = match self.find_child_by_name(parent, &src_name) {
            Some(existing) => {
                self.move_to_first(existing);
                existing
            }
            None => self.insert_subnode(parent, 0, src_name),
        };
        self.merge_props(dst, src, copy_phandles);

        let children: Vec<NodeIdx> = self.nodes[src].children().to_vec();
        for &child in children.iter().rev() {
            self.copy_node(dst, child, true);
        }
        dst
    }

    /// For each phandle in `phandle_list`, copy the subnodes (and, once
    /// done, any still-missing properties) of the node it points to into
    /// `dst` — the phandle-targeted node itself is never copied, only its
    /// children. Later entries in the list end up closer to the front of
    /// `dst`'s child list, matching the order subnodes are inserted in.
    pub fn copy_subnodes_from_phandles(&mut self, dst: NodeIdx, phandle_list: &[u32]) -> Result<()> {
        for &phandle in phandle_list.iter().rev() {
            let parent = self
                .node_by_phandle(phandle)
                .ok_or_else(|| Error::NodeNotFound(format!("phandle {phandle}")))?;
            let children: Vec<NodeIdx> = self.nodes[parent].children().to_vec();
            for &child in children.iter().rev() {
                self.copy_node(dst, child, false);
            }
            self.merge_props(dst, parent, false);
        }
        Ok(())
    }

    fn to_raw(&self, idx: NodeIdx) -> RawNode {
        RawNode {
            name: self.nodes[idx].name().to_string(),
            props: self.nodes[idx]
                .props()
                .iter()
                .map(|p| (p.name().to_string(), p.to_bytes()))
                .collect(),
            children: self.nodes[idx]
                .children()
                .iter()
                .map(|&c| self.to_raw(c))
                .collect(),
        }
    }

    /// Write all dirty properties and new subnodes back into the packed
    /// blob representation, growing its capacity first if `auto_resize` is
    /// set and the current tree no longer fits.
    pub fn sync(&mut self, auto_resize: bool) -> Result<()> {
        let raw = self.to_raw(self.root);
        let (bytes, offsets) = blob::serialize(&raw);
        if bytes.len() > self.capacity {
            if !auto_resize {
                return Err(Error::NoSpace(self.nodes[self.root].name().to_string()));
            }
            self.capacity = bytes.len() + 1024;
        }
        self.apply_offsets(&offsets);
        for node in &mut self.nodes {
            for p in node.props_mut() {
                p.clear_dirty();
            }
        }
        self.blob = Some(bytes);
        self.valid = true;
        Ok(())
    }

    fn apply_offsets(&mut self, offsets: &[(Vec<usize>, usize, Vec<(String, usize)>)]) {
        for (path, node_off, prop_offs) in offsets {
            let mut cur = self.root;
            for &i in path {
                cur = self.nodes[cur].children()[i];
            }
            self.nodes[cur].set_offset(*node_off);
            for (name, off) in prop_offs {
                if let Some(p) = self.nodes[cur].prop_mut(name) {
                    p.set_offset(*off);
                }
            }
        }
    }

    /// Re-derive the offset cache without discarding unsynced mutations'
    /// *effects*; if the tree's shape has diverged from the last-synced
    /// blob in a way that cannot be reconciled positionally, this fails
    /// rather than silently re-numbering things.
    pub fn refresh(&mut self) -> Result<()> {
        if self.valid {
            return Ok(());
        }
        if let Some(old_bytes) = self.blob.clone() {
            let old_raw = blob::parse_tree(&old_bytes)?;
            self.verify_structure(self.root, &old_raw)?;
        }
        self.sync(true)
    }

    fn verify_structure(&self, idx: NodeIdx, raw: &RawNode) -> Result<()> {
        if self.nodes[idx].name() != raw.name {
            return Err(Error::InternalMismatch(
                self.nodes[idx].name().to_string(),
                raw.name.clone(),
            ));
        }
        if self.nodes[idx].children().len() != raw.children.len() {
            return Err(Error::SubnodeCountMismatch(self.nodes[idx].name().to_string()));
        }
        for (&cidx, craw) in self.nodes[idx].children().iter().zip(&raw.children) {
            self.verify_structure(cidx, craw)?;
        }
        Ok(())
    }

    /// Sync and compact: in this implementation sync already regenerates
    /// the whole blob from scratch, so packing is just a synonym for it.
    pub fn pack(&mut self) -> Result<()> {
        self.sync(true)
    }

    /// The current packed blob, if one has been synced yet.
    pub fn contents(&self) -> Option<&[u8]> {
        self.blob.as_deref()
    }

    pub fn flush(&mut self, path: &Path) -> Result<()> {
        self.sync(true)?;
        let bytes = self.blob.as_ref().expect("sync always populates blob");
        std::fs::write(path, bytes).map_err(|e| Error::Io(path.display().to_string(), e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_bytes() -> Vec<u8> {
        let root = RawNode {
            name: String::new(),
            props: vec![("compatible".into(), b"vendor,board\0".to_vec())],
            children: vec![RawNode {
                name: "uart@1000".into(),
                props: vec![
                    ("compatible".into(), b"vendor,uart\0".to_vec()),
                    ("reg".into(), vec![0, 0, 0x10, 0, 0, 0, 0, 0x80]),
                    ("status".into(), b"okay\0".to_vec()),
                ],
                children: vec![],
            }],
        };
        blob::serialize(&root).0
    }

    #[test]
    fn scan_builds_tree() {
        let fdt = Fdt::from_bytes(&sample_bytes()).unwrap();
        let uart = fdt.find_node_by_path("/uart@1000").unwrap();
        assert!(fdt.node(uart).is_enabled());
        assert_eq!(fdt.path(uart), "/uart@1000");
    }

    #[test]
    fn delete_and_sync_roundtrips() {
        let mut fdt = Fdt::from_bytes(&sample_bytes()).unwrap();
        let uart = fdt.find_node_by_path("/uart@1000").unwrap();
        fdt.node_mut(uart).delete_prop("status");
        fdt.sync(true).unwrap();
        let bytes = fdt.contents().unwrap().to_vec();
        let reloaded = Fdt::from_bytes(&bytes).unwrap();
        let uart2 = reloaded.find_node_by_path("/uart@1000").unwrap();
        assert!(reloaded.node(uart2).prop("status").is_none());
    }

    #[test]
    fn add_subnode_then_refresh() {
        let mut fdt = Fdt::from_bytes(&sample_bytes()).unwrap();
        let root = fdt.root();
        let new = fdt.add_subnode(root, "extra@0");
        fdt.node_mut(new).add_prop(Prop::new("reg", Value::Int(5)));
        fdt.refresh().unwrap();
        assert!(fdt.node(new).offset().is_some());
    }
}
