use bytes::{Buf, BufMut, Bytes, BytesMut};
use lib_asset_store::{AssetRecord, AssetState, Format};
use log::debug;
use ordermap::OrderMap;
use std::io::{Read, Write};

mod error;
pub use error::*;

/// Current stream tag. Anything else aborts restore.
pub const MAGIC: &[u8; 4] = b"FQ03";

/// A frozen translator state: the root document plus every committed asset
/// and the driver settings that shaped the last emission.
///
/// Layout (little-endian, u32 length prefixes): magic, project token, root
/// bytes, checksum, flags, imports map, then images / renderings / nodes as
/// count-prefixed record lists. Only Committed records are written.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Snapshot {
    pub project_token: String,
    pub root: Bytes,
    pub checksum: u32,
    pub flags: u32,
    pub imports: OrderMap<String, String>,
    pub images: Vec<AssetRecord>,
    pub renderings: Vec<AssetRecord>,
    pub nodes: Vec<AssetRecord>,
}

pub fn write(snapshot: &Snapshot, out: &mut impl Write) -> Result<()> {
    let mut buf = BytesMut::new();
    buf.put_slice(MAGIC);
    put_str(&mut buf, &snapshot.project_token);
    put_bytes(&mut buf, &snapshot.root);
    buf.put_u32_le(snapshot.checksum);
    buf.put_u32_le(snapshot.flags);
    buf.put_u32_le(snapshot.imports.len() as u32);
    for (module, version) in &snapshot.imports {
        put_str(&mut buf, module);
        put_str(&mut buf, version);
    }
    put_records(&mut buf, &snapshot.images);
    put_records(&mut buf, &snapshot.renderings);
    put_records(&mut buf, &snapshot.nodes);
    debug!(target: "Snapshot", "writing {} bytes", buf.len());
    out.write_all(&buf)?;
    Ok(())
}

pub fn read(input: &mut impl Read) -> Result<Snapshot> {
    let mut data = Vec::new();
    input.read_to_end(&mut data)?;
    let mut buf = data.as_slice();

    if buf.remaining() < MAGIC.len() {
        return Err(Error::Truncated("magic"));
    }
    let mut magic = [0u8; 4];
    buf.copy_to_slice(&mut magic);
    if &magic != MAGIC {
        return Err(Error::BadMagic(magic));
    }

    let project_token = get_str(&mut buf, "project token")?;
    let root = get_bytes(&mut buf, "root document")?;
    let checksum = get_u32(&mut buf, "checksum")?;
    let flags = get_u32(&mut buf, "flags")?;

    let import_count = get_u32(&mut buf, "imports")?;
    let mut imports = OrderMap::new();
    for _ in 0..import_count {
        let module = get_str(&mut buf, "imports")?;
        let version = get_str(&mut buf, "imports")?;
        imports.insert(module, version);
    }

    let images = get_records(&mut buf, "images")?;
    let renderings = get_records(&mut buf, "renderings")?;
    let nodes = get_records(&mut buf, "nodes")?;
    debug!(
        target: "Snapshot",
        "restored {} images, {} renderings, {} nodes",
        images.len(),
        renderings.len(),
        nodes.len()
    );

    Ok(Snapshot {
        project_token,
        root,
        checksum,
        flags,
        imports,
        images,
        renderings,
        nodes,
    })
}

fn put_str(buf: &mut BytesMut, value: &str) {
    buf.put_u32_le(value.len() as u32);
    buf.put_slice(value.as_bytes());
}

fn put_bytes(buf: &mut BytesMut, value: &[u8]) {
    buf.put_u32_le(value.len() as u32);
    buf.put_slice(value);
}

fn put_records(buf: &mut BytesMut, records: &[AssetRecord]) {
    buf.put_u32_le(records.len() as u32);
    for record in records {
        put_str(buf, &record.id);
        put_str(buf, &record.url);
        put_bytes(buf, &record.bytes);
        buf.put_u32_le(record.format.to_u32());
        buf.put_u32_le(record.state.to_u32());
    }
}

fn get_u32(buf: &mut &[u8], section: &'static str) -> Result<u32> {
    if buf.remaining() < 4 {
        return Err(Error::Truncated(section));
    }
    Ok(buf.get_u32_le())
}

fn get_bytes(buf: &mut &[u8], section: &'static str) -> Result<Bytes> {
    let len = get_u32(buf, section)? as usize;
    if buf.remaining() < len {
        return Err(Error::Truncated(section));
    }
    Ok(buf.copy_to_bytes(len))
}

fn get_str(buf: &mut &[u8], section: &'static str) -> Result<String> {
    let bytes = get_bytes(buf, section)?;
    String::from_utf8(bytes.to_vec()).map_err(|_| Error::Encoding(section))
}

fn get_records(buf: &mut &[u8], section: &'static str) -> Result<Vec<AssetRecord>> {
    let count = get_u32(buf, section)?;
    let mut records = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let id = get_str(buf, section)?;
        let url = get_str(buf, section)?;
        let bytes = get_bytes(buf, section)?;
        let format_tag = get_u32(buf, section)?;
        let state_tag = get_u32(buf, section)?;
        records.push(AssetRecord {
            id,
            url,
            bytes,
            format: Format::from_u32(format_tag).ok_or(Error::BadTag(section, format_tag))?,
            state: AssetState::from_u32(state_tag).ok_or(Error::BadTag(section, state_tag))?,
        });
    }
    Ok(records)
}
