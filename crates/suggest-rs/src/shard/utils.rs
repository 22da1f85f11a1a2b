use anyhow::{bail, Context, Result};
use std::io::Write;

// Varint helpers: simple LEB128-style unsigned varint for u32.
pub(crate) fn write_var_u32<W: Write>(w: &mut W, mut v: u32) -> Result<()> {
    let mut buf = [0u8; 5];
    let mut i = 0;
    while v >= 0x80 {
        buf[i] = (v as u8 & 0x7F) | 0x80;
        v >>= 7;
        i += 1;
    }
    buf[i] = v as u8;
    i += 1;
    w.write_all(&buf[..i])?;
    Ok(())
}

pub(crate) fn read_var_u32(buf: &[u8], off: &mut usize) -> Result<u32> {
    let mut shift = 0u32;
    let mut out: u32 = 0;
    loop {
        if *off >= buf.len() {
            bail!("unexpected EOF while reading varint");
        }
        let b = buf[*off];
        *off += 1;
        out |= ((b & 0x7F) as u32) << shift;
        if (b & 0x80) == 0 {
            return Ok(out);
        }
        shift += 7;
        if shift >= 35 {
            bail!("varint too long");
        }
    }
}

pub(crate) fn read_u32(buf: &[u8], off: &mut usize) -> Result<u32> {
    let bytes = buf
        .get(*off..*off + 4)
        .with_context(|| format!("artifact truncated while reading u32 at {}", off))?;
    *off += 4;
    Ok(u32::from_le_bytes(bytes.try_into()?))
}

pub(crate) fn read_f64(buf: &[u8], off: &mut usize) -> Result<f64> {
    let bytes = buf
        .get(*off..*off + 8)
        .with_context(|| format!("artifact truncated while reading f64 at {}", off))?;
    *off += 8;
    Ok(f64::from_le_bytes(bytes.try_into()?))
}
