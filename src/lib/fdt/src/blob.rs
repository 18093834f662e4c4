//! Packed FDT blob access: header parsing, struct-block token walking, and
//! serialization of a parsed tree back into a valid blob.
//!
//! This is the "FDT library binding" layer: everything above it works with
//! [`RawNode`] trees and never looks at byte offsets directly.

use crate::error::{Error, Result};

pub const FDT_MAGIC: u32 = 0xd00d_feed;

const FDT_BEGIN_NODE: u32 = 0x1;
const FDT_END_NODE: u32 = 0x2;
const FDT_PROP: u32 = 0x3;
const FDT_NOP: u32 = 0x4;
const FDT_END: u32 = 0x9;

const HEADER_LEN: usize = 40;

#[derive(Clone, Debug)]
pub struct FdtHeader {
    pub magic: u32,
    pub totalsize: u32,
    pub off_dt_struct: u32,
    pub off_dt_strings: u32,
    pub off_mem_rsvmap: u32,
    pub version: u32,
    pub last_comp_version: u32,
    pub boot_cpuid_phys: u32,
    pub size_dt_strings: u32,
    pub size_dt_struct: u32,
}

/// A node as parsed directly out of the struct block: raw property bytes,
/// no type inference or phandle resolution yet (that happens one layer up,
/// in the tree module).
#[derive(Clone, Debug, Default)]
pub struct RawNode {
    pub name: String,
    pub props: Vec<(String, Vec<u8>)>,
    pub children: Vec<RawNode>,
}

fn read_be32(bytes: &[u8], off: usize) -> Result<u32> {
    let end = off.checked_add(4).ok_or(Error::TruncatedStruct)?;
    let slice = bytes.get(off..end).ok_or(Error::TruncatedStruct)?;
    Ok(u32::from_be_bytes([slice[0], slice[1], slice[2], slice[3]]))
}

fn read_cstr(bytes: &[u8], off: usize) -> Result<(String, usize)> {
    let nul = bytes[off..]
        .iter()
        .position(|&b| b == 0)
        .ok_or(Error::TruncatedStruct)?;
    let s = String::from_utf8_lossy(&bytes[off..off + nul]).into_owned();
    Ok((s, nul + 1))
}

fn align4(n: usize) -> usize {
    (n + 3) & !3
}

pub fn parse_header(bytes: &[u8]) -> Result<FdtHeader> {
    if bytes.len() < HEADER_LEN {
        return Err(Error::TooSmall(bytes.len()));
    }
    let magic = read_be32(bytes, 0)?;
    if magic != FDT_MAGIC {
        return Err(Error::BadMagic(magic));
    }
    Ok(FdtHeader {
        magic,
        totalsize: read_be32(bytes, 4)?,
        off_dt_struct: read_be32(bytes, 8)?,
        off_dt_strings: read_be32(bytes, 12)?,
        off_mem_rsvmap: read_be32(bytes, 16)?,
        version: read_be32(bytes, 20)?,
        last_comp_version: read_be32(bytes, 24)?,
        boot_cpuid_phys: read_be32(bytes, 28)?,
        size_dt_strings: read_be32(bytes, 32)?,
        size_dt_struct: read_be32(bytes, 36)?,
    })
}

/// Parse the whole struct block into a [`RawNode`] tree, resolving
/// property names via the strings block.
pub fn parse_tree(bytes: &[u8]) -> Result<RawNode> {
    let header = parse_header(bytes)?;
    let struct_start = header.off_dt_struct as usize;
    let struct_end = struct_start + header.size_dt_struct as usize;
    let strings_start = header.off_dt_strings as usize;
    let struct_bytes = bytes
        .get(struct_start..struct_end)
        .ok_or(Error::TruncatedStruct)?;

    let mut pos = 0usize;
    let root = parse_node(struct_bytes, &mut pos, bytes, strings_start)?;
    Ok(root)
}

fn parse_node(
    sb: &[u8],
    pos: &mut usize,
    whole: &[u8],
    strings_start: usize,
) -> Result<RawNode> {
    loop {
        let tok = read_be32(sb, *pos)?;
        *pos += 4;
        match tok {
            FDT_NOP => continue,
            FDT_BEGIN_NODE => break,
            _ => return Err(Error::UnknownToken(tok, *pos - 4)),
        }
    }
    let (name, used) = read_cstr(sb, *pos)?;
    *pos += align4(used);

    let mut node = RawNode {
        name,
        props: Vec::new(),
        children: Vec::new(),
    };

    loop {
        let tok = read_be32(sb, *pos)?;
        match tok {
            FDT_NOP => {
                *pos += 4;
            }
            FDT_PROP => {
                *pos += 4;
                let len = read_be32(sb, *pos)? as usize;
                *pos += 4;
                let nameoff = read_be32(sb, *pos)? as usize;
                *pos += 4;
                let data_start = *pos;
                let data_end = data_start + len;
                let data = sb
                    .get(data_start..data_end)
                    .ok_or(Error::TruncatedStruct)?
                    .to_vec();
                *pos += align4(len);
                let (name, _) = read_cstr(whole, strings_start + nameoff)?;
                node.props.push((name, data));
            }
            FDT_BEGIN_NODE => {
                let child = parse_node(sb, pos, whole, strings_start)?;
                node.children.push(child);
            }
            FDT_END_NODE => {
                *pos += 4;
                return Ok(node);
            }
            FDT_END => return Ok(node),
            _ => return Err(Error::UnknownToken(tok, *pos)),
        }
    }
}

/// Serialize a [`RawNode`] tree back into a complete, valid FDT blob.
///
/// Returns the bytes together with the byte offset (within the struct
/// block) of every node and property, in the same depth-first order they
/// were written, for the caller to use as its refreshed offset cache.
pub fn serialize(root: &RawNode) -> (Vec<u8>, Vec<(Vec<usize>, usize, Vec<(String, usize)>)>) {
    let mut strings = StringTable::default();
    let mut struct_bytes = Vec::new();
    let mut offsets = Vec::new();
    write_node(root, &mut struct_bytes, &mut strings, &mut offsets, &mut Vec::new());
    push_u32(&mut struct_bytes, FDT_END);

    let mem_rsvmap_off = HEADER_LEN;
    let mem_rsvmap = [0u8; 16]; // single terminating (0,0) entry
    let struct_off = mem_rsvmap_off + mem_rsvmap.len();
    let struct_off = align4(struct_off);
    let strings_off = struct_off + struct_bytes.len();
    let total = strings_off + strings.bytes.len();

    let mut out = Vec::with_capacity(total);
    push_u32(&mut out, FDT_MAGIC);
    push_u32(&mut out, total as u32);
    push_u32(&mut out, struct_off as u32);
    push_u32(&mut out, strings_off as u32);
    push_u32(&mut out, mem_rsvmap_off as u32);
    push_u32(&mut out, 17); // version
    push_u32(&mut out, 16); // last_comp_version
    push_u32(&mut out, 0); // boot_cpuid_phys
    push_u32(&mut out, strings.bytes.len() as u32);
    push_u32(&mut out, struct_bytes.len() as u32);
    while out.len() < struct_off {
        out.push(0);
    }
    out.extend_from_slice(&struct_bytes);
    out.extend_from_slice(&strings.bytes);

    (out, offsets)
}

#[derive(Default)]
struct StringTable {
    bytes: Vec<u8>,
}

impl StringTable {
    fn intern(&mut self, name: &str) -> usize {
        // Reuse a suffix match the way libfdt's string-table dedup does
        // (cheap enough here since header/struct name counts are small).
        let needle = format!("{name}\0");
        if let Some(pos) = find_subslice(&self.bytes, needle.as_bytes()) {
            return pos;
        }
        let off = self.bytes.len();
        self.bytes.extend_from_slice(needle.as_bytes());
        off
    }
}

fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.len() > haystack.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}

fn push_u32(buf: &mut Vec<u8>, v: u32) {
    buf.extend_from_slice(&v.to_be_bytes());
}

fn write_node(
    node: &RawNode,
    buf: &mut Vec<u8>,
    strings: &mut StringTable,
    offsets: &mut Vec<(Vec<usize>, usize, Vec<(String, usize)>)>,
    path: &mut Vec<usize>,
) {
    let node_off = buf.len();
    push_u32(buf, FDT_BEGIN_NODE);
    let name_start = buf.len();
    buf.extend_from_slice(node.name.as_bytes());
    buf.push(0);
    while (buf.len() - name_start) % 4 != 0 {
        buf.push(0);
    }

    let mut prop_offsets = Vec::new();
    for (name, data) in &node.props {
        let prop_off = buf.len();
        push_u32(buf, FDT_PROP);
        push_u32(buf, data.len() as u32);
        let nameoff = strings.intern(name);
        push_u32(buf, nameoff as u32);
        buf.extend_from_slice(data);
        while (buf.len() - (prop_off + 12)) % 4 != 0 {
            buf.push(0);
        }
        prop_offsets.push((name.clone(), prop_off));
    }

    offsets.push((path.clone(), node_off, prop_offsets));

    for (i, child) in node.children.iter().enumerate() {
        path.push(i);
        write_node(child, buf, strings, offsets, path);
        path.pop();
    }

    push_u32(buf, FDT_END_NODE);
}
