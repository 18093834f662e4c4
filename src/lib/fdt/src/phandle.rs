//! Resolution of phandle-bearing properties (`clocks`, `gpios`, ...) into
//! the node each entry points at plus its argument cells.

use crate::error::{Error, Result};
use crate::node::NodeIdx;
use crate::tree::Fdt;
use crate::value::Value;

/// Maps a phandle-bearing property's name to the `#foo-cells` property
/// that tells us how many argument cells follow each phandle in its list.
/// Matched by exact name or by a `-suffix` match, so e.g. `reset-gpios`
/// is recognized via the `gpios` entry.
const PHANDLE_PROPS: &[(&str, &str)] = &[
    ("clocks", "#clock-cells"),
    ("interrupts-extended", "#interrupt-cells"),
    ("gpios", "#gpio-cells"),
    ("sandbox,emul", "#emul-cells"),
];

pub fn cells_prop_for(prop_name: &str) -> Option<&'static str> {
    PHANDLE_PROPS.iter().find_map(|&(suffix, cells)| {
        if prop_name == suffix || prop_name.ends_with(&format!("-{suffix}")) {
            Some(cells)
        } else {
            None
        }
    })
}

/// One `(target, args)` entry decoded from a phandle-list property.
#[derive(Clone, Debug)]
pub struct PhandleLink {
    pub target: NodeIdx,
    pub args: Vec<u32>,
}

impl Fdt {
    /// Decode a phandle-list property's cells into `(target node, args)`
    /// pairs. A phandle value of zero terminates the list early (some
    /// devicetrees use it as an explicit "no more entries" marker rather
    /// than omitting the property).
    pub fn decode_phandle_list(&self, node: NodeIdx, prop_name: &str) -> Result<Vec<PhandleLink>> {
        let cells_prop = cells_prop_for(prop_name);
        let path = self.path(node);
        let cells = match self.node(node).prop(prop_name).map(|p| p.value()) {
            Some(Value::IntList(c)) => c.clone(),
            Some(Value::Int(c)) => vec![*c],
            Some(_) | None => return Ok(Vec::new()),
        };

        let mut out = Vec::new();
        let mut i = 0;
        while i < cells.len() {
            let phandle = cells[i];
            i += 1;
            if phandle == 0 {
                break;
            }
            let target = self
                .node_by_phandle(phandle)
                .ok_or_else(|| Error::InvalidPhandle(path.clone(), prop_name.to_string()))?;
            let argc = match cells_prop {
                Some(cells_name) => match self.node(target).prop(cells_name).map(|p| p.value()) {
                    Some(Value::Int(n)) => *n as usize,
                    _ => {
                        return Err(Error::MissingCells(
                            self.path(target),
                            cells_name.to_string(),
                        ))
                    }
                },
                None => 0,
            };
            let end = (i + argc).min(cells.len());
            let args = cells[i..end].to_vec();
            i = end;
            out.push(PhandleLink { target, args });
        }
        Ok(out)
    }

    /// The largest argument count seen across every node's use of a given
    /// phandle-list property, i.e. the cell-array width the generated
    /// struct for it needs.
    pub fn max_phandle_argc(&self, prop_name: &str) -> Result<usize> {
        let mut max = 0;
        for idx in self.walk_preorder() {
            if self.node(idx).prop(prop_name).is_some() {
                let links = self.decode_phandle_list(idx, prop_name)?;
                max = max.max(links.iter().map(|l| l.args.len()).max().unwrap_or(0));
            }
        }
        Ok(max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blob::RawNode;

    fn sample() -> Vec<u8> {
        let clk = RawNode {
            name: "clock@0".into(),
            props: vec![
                ("phandle".into(), vec![0, 0, 0, 1]),
                ("#clock-cells".into(), vec![0, 0, 0, 1]),
            ],
            children: vec![],
        };
        let dev = RawNode {
            name: "dev@0".into(),
            props: vec![("clocks".into(), vec![0, 0, 0, 1, 0, 0, 0, 7])],
            children: vec![],
        };
        let root = RawNode {
            name: String::new(),
            props: vec![],
            children: vec![clk, dev],
        };
        crate::blob::serialize(&root).0
    }

    #[test]
    fn resolves_phandle_with_args() {
        let fdt = Fdt::from_bytes(&sample()).unwrap();
        let dev = fdt.find_node_by_path("/dev@0").unwrap();
        let links = fdt.decode_phandle_list(dev, "clocks").unwrap();
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].args, vec![7]);
    }
}
