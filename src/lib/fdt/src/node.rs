use device::{ClassId, Driver, Uclass};

use crate::prop::Prop;

pub type NodeIdx = usize;

/// A devicetree node.
///
/// Alongside the raw tree shape (name/parent/children/properties), a `Node`
/// accumulates the binding-time fields set while a tool walks the tree
/// deciding which driver and uclass each node belongs to, and what sequence
/// number it gets. Those fields start empty after a plain scan and are
/// filled in by the binder.
#[derive(Clone, Debug)]
pub struct Node {
    idx: NodeIdx,
    parent: Option<NodeIdx>,
    children: Vec<NodeIdx>,
    name: String,
    props: Vec<Prop>,
    offset: Option<usize>,

    // Binding-time fields, set by the binder while walking enabled nodes.
    struct_name: Option<String>,
    var_name: Option<String>,
    driver: Option<Driver>,
    uclass: Option<Uclass>,
    uclass_id: Option<ClassId>,
    uclass_seq: Option<i32>,
    parent_seq: Option<i32>,
    phandle: Option<u32>,
}

impl Node {
    pub fn new(idx: NodeIdx, parent: Option<NodeIdx>, name: impl Into<String>) -> Self {
        Self {
            idx,
            parent,
            children: Vec::new(),
            name: name.into(),
            props: Vec::new(),
            offset: None,
            struct_name: None,
            var_name: None,
            driver: None,
            uclass: None,
            uclass_id: None,
            uclass_seq: None,
            parent_seq: None,
            phandle: None,
        }
    }

    pub fn idx(&self) -> NodeIdx {
        self.idx
    }

    pub fn parent(&self) -> Option<NodeIdx> {
        self.parent
    }

    pub fn children(&self) -> &[NodeIdx] {
        &self.children
    }

    pub fn add_child(&mut self, child: NodeIdx) {
        self.children.push(child);
    }

    pub fn insert_child(&mut self, pos: usize, child: NodeIdx) {
        self.children.insert(pos.min(self.children.len()), child);
    }

    pub fn remove_child(&mut self, child: NodeIdx) {
        self.children.retain(|&c| c != child);
    }

    /// Move this node's child `child` to be the first in its child list,
    /// used to move the special `u-boot,dm-pre-reloc`/root aliasing node
    /// to the front so it is processed (and assigned sequence 0) first.
    pub fn move_child_to_first(&mut self, child: NodeIdx) {
        self.remove_child(child);
        self.children.insert(0, child);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn props(&self) -> &[Prop] {
        &self.props
    }

    pub fn props_mut(&mut self) -> &mut [Prop] {
        &mut self.props
    }

    pub fn prop(&self, name: &str) -> Option<&Prop> {
        self.props.iter().find(|p| p.name() == name)
    }

    pub fn prop_mut(&mut self, name: &str) -> Option<&mut Prop> {
        self.props.iter_mut().find(|p| p.name() == name)
    }

    pub fn add_prop(&mut self, prop: Prop) {
        if let Some(existing) = self.props.iter_mut().find(|p| p.name() == prop.name()) {
            *existing = prop;
        } else {
            self.props.push(prop);
        }
    }

    pub fn delete_prop(&mut self, name: &str) -> bool {
        let before = self.props.len();
        self.props.retain(|p| p.name() != name);
        self.props.len() != before
    }

    pub fn is_enabled(&self) -> bool {
        match self.prop("status") {
            None => true,
            Some(p) => match p.value() {
                crate::value::Value::Str(s) => s == "okay" || s == "ok",
                _ => true,
            },
        }
    }

    pub fn offset(&self) -> Option<usize> {
        self.offset
    }

    pub fn set_offset(&mut self, offset: usize) {
        self.offset = Some(offset);
    }

    pub fn invalidate_offset(&mut self) {
        self.offset = None;
    }

    pub fn phandle(&self) -> Option<u32> {
        self.phandle
    }

    pub fn set_phandle(&mut self, phandle: u32) {
        self.phandle = Some(phandle);
    }

    pub fn struct_name(&self) -> Option<&str> {
        self.struct_name.as_deref()
    }

    pub fn set_struct_name(&mut self, name: impl Into<String>) {
        self.struct_name = Some(name.into());
    }

    pub fn var_name(&self) -> Option<&str> {
        self.var_name.as_deref()
    }

    pub fn set_var_name(&mut self, name: impl Into<String>) {
        self.var_name = Some(name.into());
    }

    pub fn driver(&self) -> Option<&Driver> {
        self.driver.as_ref()
    }

    pub fn set_driver(&mut self, driver: Driver) {
        self.driver = Some(driver);
    }

    pub fn uclass(&self) -> Option<&Uclass> {
        self.uclass.as_ref()
    }

    pub fn set_uclass(&mut self, uclass: Uclass) {
        self.uclass = Some(uclass);
    }

    pub fn uclass_id(&self) -> Option<&ClassId> {
        self.uclass_id.as_ref()
    }

    pub fn set_uclass_id(&mut self, id: ClassId) {
        self.uclass_id = Some(id);
    }

    pub fn uclass_seq(&self) -> Option<i32> {
        self.uclass_seq
    }

    pub fn set_uclass_seq(&mut self, seq: i32) {
        self.uclass_seq = Some(seq);
    }

    pub fn parent_seq(&self) -> Option<i32> {
        self.parent_seq
    }

    pub fn set_parent_seq(&mut self, seq: i32) {
        self.parent_seq = Some(seq);
    }
}
