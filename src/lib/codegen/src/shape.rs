use bind::Binding;
use fdt::Fdt;

/// The widened shape of a phandle-bearing struct field: the widest argument
/// count seen on any single phandle tuple (`max_args`, sizes the nested
/// array), and the widest number of tuples seen on any one node bound to
/// this driver (`count`, sizes the outer array).
#[derive(Clone, Copy, Debug)]
pub struct PhandleShape {
    pub max_args: usize,
    pub count: usize,
}

/// If `prop` is a phandle-bearing property on any node bound to `driver`,
/// the widened shape it should take in that driver's generated struct.
pub fn phandle_shape(fdt: &Fdt, binding: &Binding, driver: &str, prop: &str) -> Option<PhandleShape> {
    let mut shape: Option<PhandleShape> = None;
    for &idx in &binding.bound {
        if fdt.node(idx).struct_name() != Some(driver) {
            continue;
        }
        let Some(links) = binding.phandle_links.get(&(idx, prop.to_string())) else {
            continue;
        };
        let max_args = links.iter().map(|l| l.args.len()).max().unwrap_or(0);
        let count = links.len();
        shape = Some(match shape {
            None => PhandleShape { max_args, count },
            Some(s) => PhandleShape {
                max_args: s.max_args.max(max_args),
                count: s.count.max(count),
            },
        });
    }
    shape
}
