mod common;

use anyhow::Result;
use suggest_rs::shard::{ShardReader, ShardWriter};

#[test]
fn write_read_lookup_roundtrip() -> Result<()> {
    let dir = common::new_workdir();
    let idx = common::index_of(&["Hello World\t5", "help desk\t3", "<b>hex</b> editor"], 1234);
    let path = dir.path().join("s.bin");
    ShardWriter::new(&path).write(&idx)?;

    let reader = ShardReader::open(&path)?;
    assert_eq!(reader.version(), 1234);
    assert_eq!(reader.max_items_per_prefix(), 10);
    let loaded = reader.into_index()?;
    assert_eq!(loaded.items(), idx.items());
    assert_eq!(loaded.entries(), idx.entries());

    let he: Vec<String> = loaded.lookup("HE", 0, 0).into_iter().map(|s| s.text).collect();
    assert_eq!(he, vec!["Hello World", "help desk", "hex editor"]);
    Ok(())
}

#[test]
fn pagination_and_cap() -> Result<()> {
    let lines: Vec<String> = (0..30).map(|i| format!("item {:02}\t{}", i, 100 - i)).collect();
    let refs: Vec<&str> = lines.iter().map(|s| s.as_str()).collect();
    let idx = common::index_of(&refs, 1);

    // capped at max_items_per_prefix (10) before paging
    assert_eq!(idx.lookup("item", 0, 0).len(), 10);
    let page1: Vec<String> = idx.lookup("item", 1, 4).into_iter().map(|s| s.text).collect();
    assert_eq!(page1, vec!["item 04", "item 05", "item 06", "item 07"]);
    assert_eq!(idx.lookup("item", 2, 4).len(), 2);
    assert!(idx.lookup("item", 3, 4).is_empty());
    assert!(idx.lookup("", 0, 0).is_empty());
    Ok(())
}

#[test]
fn corrupted_shard_is_rejected() -> Result<()> {
    let dir = common::new_workdir();
    let idx = common::index_of(&["alpha", "beta"], 1);
    let path = dir.path().join("s.bin");
    ShardWriter::new(&path).write(&idx)?;

    let mut bytes = std::fs::read(&path)?;
    let mid = bytes.len() / 2;
    bytes[mid] ^= 0xFF;
    let corrupt = dir.path().join("corrupt.bin");
    std::fs::write(&corrupt, &bytes)?;
    let msg = ShardReader::open(&corrupt).err().unwrap().to_string();
    assert!(msg.contains("checksum"));

    let truncated = dir.path().join("truncated.bin");
    std::fs::write(&truncated, &bytes[..10])?;
    assert!(ShardReader::open(&truncated).is_err());

    let foreign = dir.path().join("foreign.bin");
    std::fs::write(&foreign, vec![0u8; 128])?;
    let msg = ShardReader::open(&foreign).err().unwrap().to_string();
    assert!(msg.contains("bad header"));
    Ok(())
}

#[test]
fn empty_index_roundtrips() -> Result<()> {
    let dir = common::new_workdir();
    let idx = common::index_of(&[], 99);
    let path = dir.path().join("empty.bin");
    ShardWriter::new(&path).write(&idx)?;
    let loaded = suggest_rs::load_suggest(&path)?;
    assert_eq!(loaded.version(), 99);
    assert_eq!(loaded.item_count(), 0);
    assert!(loaded.lookup("a", 0, 0).is_empty());
    Ok(())
}

#[test]
fn staged_shard_is_invisible_until_committed() -> Result<()> {
    let dir = common::new_workdir();
    let path = dir.path().join("staged.bin");
    let idx = common::index_of(&["plum", "pear"], 3);

    let staged = ShardWriter::new(&path).stage(&idx)?;
    assert!(!path.exists());
    drop(staged);
    assert!(!path.exists());
    assert_eq!(std::fs::read_dir(dir.path())?.count(), 0);

    let staged = ShardWriter::new(&path).stage(&idx)?;
    let bytes = staged.commit()?;
    assert_eq!(std::fs::metadata(&path)?.len(), bytes);
    assert_eq!(ShardReader::open(&path)?.version(), 3);
    Ok(())
}
