//! Promotion of `reg` properties from plain 32-bit cells to 64-bit
//! address/size pairs, driven by the parent's `#address-cells` and
//! `#size-cells`.

use crate::error::{Error, Result};
use crate::node::NodeIdx;
use crate::tree::Fdt;
use crate::value::Value;

fn cells_to_u64(cells: &[u32]) -> u64 {
    cells.iter().fold(0u64, |acc, &c| (acc << 32) | c as u64)
}

impl Fdt {
    /// `(#address-cells, #size-cells)` in effect for `parent`'s children,
    /// defaulting to the devicetree spec's implicit `(2, 2)` when absent.
    pub fn address_size_cells(&self, parent: NodeIdx) -> (u32, u32) {
        let cells = |name: &str, default: u32| match self.node(parent).prop(name).map(|p| p.value()) {
            Some(Value::Int(v)) => *v,
            _ => default,
        };
        (cells("#address-cells", 2), cells("#size-cells", 2))
    }

    /// Widen every node's `reg` property into a list of `(address, size)`
    /// pairs sized per its parent's address/size cells. Nodes whose parent
    /// uses the default 1-cell-each layout are left as a plain int list,
    /// since no widening to 64-bit pairs is needed in that case.
    pub fn promote_reg(&mut self) -> Result<()> {
        for idx in self.walk_preorder() {
            let parent = match self.node(idx).parent() {
                Some(p) => p,
                None => continue,
            };
            if self.node(idx).prop("reg").is_none() {
                continue;
            }
            let (na, ns) = self.address_size_cells(parent);
            if na <= 1 && ns <= 1 {
                continue;
            }

            let path = self.path(idx);
            let cells = match self.node(idx).prop("reg").unwrap().value() {
                Value::IntList(c) => c.clone(),
                Value::Int(c) => vec![*c],
                _ => return Err(Error::RegNotInt(path)),
            };

            let group = (na + ns) as usize;
            if group == 0 || cells.len() % group != 0 {
                return Err(Error::RegMisaligned(
                    path,
                    self.path(parent),
                    cells.len(),
                    na,
                    ns,
                ));
            }

            let mut out = Vec::with_capacity(cells.len() / group * 2);
            for chunk in cells.chunks(group) {
                let (addr_cells, size_cells) = chunk.split_at(na as usize);
                out.push(cells_to_u64(addr_cells));
                if ns > 0 {
                    out.push(cells_to_u64(size_cells));
                }
            }
            self.node_mut(idx)
                .prop_mut("reg")
                .expect("just checked above")
                .set_value(Value::Int64List(out));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blob::RawNode;

    fn sample(na: u32, ns: u32, reg: Vec<u32>) -> Vec<u8> {
        let bus_props = vec![
            ("#address-cells".into(), na.to_be_bytes().to_vec()),
            ("#size-cells".into(), ns.to_be_bytes().to_vec()),
        ];
        let child = RawNode {
            name: "dev@0".into(),
            props: vec![(
                "reg".into(),
                reg.iter().flat_map(|c| c.to_be_bytes()).collect(),
            )],
            children: vec![],
        };
        let bus = RawNode {
            name: "bus@0".into(),
            props: bus_props,
            children: vec![child],
        };
        let root = RawNode {
            name: String::new(),
            props: vec![],
            children: vec![bus],
        };
        crate::blob::serialize(&root).0
    }

    #[test]
    fn promotes_two_cell_address_to_int64() {
        let mut fdt = Fdt::from_bytes(&sample(2, 1, vec![0, 0x1000_0000, 0x1000])).unwrap();
        fdt.promote_reg().unwrap();
        let dev = fdt.find_node_by_path("/bus@0/dev@0").unwrap();
        match fdt.node(dev).prop("reg").unwrap().value() {
            Value::Int64List(v) => assert_eq!(v, &vec![0x1000_0000u64, 0x1000]),
            other => panic!("unexpected value: {other:?}"),
        }
    }

    #[test]
    fn leaves_default_cells_untouched() {
        let mut fdt = Fdt::from_bytes(&sample(1, 1, vec![0x1000, 0x10])).unwrap();
        fdt.promote_reg().unwrap();
        let dev = fdt.find_node_by_path("/bus@0/dev@0").unwrap();
        assert!(matches!(
            fdt.node(dev).prop("reg").unwrap().value(),
            Value::IntList(_)
        ));
    }
}
