use crate::error::Error;
use crate::format::BlockHandle;
use crate::index::{IndexBlockBuilder, IndexBlockReader};

fn fruit_index() -> (Vec<u8>, BlockHandle, BlockHandle, BlockHandle) {
    let h1 = BlockHandle::new(0, 111);
    let h2 = BlockHandle::new(200, 222);
    let h3 = BlockHandle::new(500, 333);

    let mut builder = IndexBlockBuilder::new();
    builder.add(b"apple", &h1).unwrap();
    builder.add(b"banana", &h2).unwrap();
    builder.add(b"carrot", &h3).unwrap();
    (builder.finish(), h1, h2, h3)
}

// -------------------- Routing --------------------

#[test]
fn find_routes_to_rightmost_divider_not_above_key() {
    let (block, h1, h2, h3) = fruit_index();
    let reader = IndexBlockReader::new(&block).unwrap();

    // Before the first divider: the key cannot be in any block.
    assert_eq!(reader.find(b"aardvark").unwrap(), None);

    // Exact divider matches are kept.
    assert_eq!(reader.find(b"apple").unwrap(), Some(h1));
    assert_eq!(reader.find(b"banana").unwrap(), Some(h2));
    assert_eq!(reader.find(b"carrot").unwrap(), Some(h3));

    // Keys between dividers route to the block on their left.
    assert_eq!(reader.find(b"apricot").unwrap(), Some(h1));
    assert_eq!(reader.find(b"blueberry").unwrap(), Some(h2));

    // Keys past the last divider route to the last block.
    assert_eq!(reader.find(b"zzz").unwrap(), Some(h3));
}

#[test]
fn single_entry_index() {
    let handle = BlockHandle::new(42, 7);
    let mut builder = IndexBlockBuilder::new();
    builder.add(b"m", &handle).unwrap();
    let block = builder.finish();

    let reader = IndexBlockReader::new(&block).unwrap();
    assert_eq!(reader.find(b"a").unwrap(), None);
    assert_eq!(reader.find(b"m").unwrap(), Some(handle));
    assert_eq!(reader.find(b"z").unwrap(), Some(handle));
}

#[test]
fn empty_index_finds_nothing() {
    let block = IndexBlockBuilder::new().finish();
    let reader = IndexBlockReader::new(&block).unwrap();
    assert_eq!(reader.num_entries(), 0);
    assert_eq!(reader.find(b"anything").unwrap(), None);
}

#[test]
fn many_dividers_binary_search() {
    let mut builder = IndexBlockBuilder::new();
    let mut handles = Vec::new();
    for i in 0..100u32 {
        let handle = BlockHandle::new(u64::from(i) * 1000, 1000);
        builder
            .add(format!("block{:04}", i * 10).as_bytes(), &handle)
            .unwrap();
        handles.push(handle);
    }
    let block = builder.finish();
    let reader = IndexBlockReader::new(&block).unwrap();
    assert_eq!(reader.num_entries(), 100);

    for i in 0..100u32 {
        // The divider itself.
        let exact = format!("block{:04}", i * 10);
        assert_eq!(reader.find(exact.as_bytes()).unwrap(), Some(handles[i as usize]));
        // A key strictly inside the i-th block's range.
        let inside = format!("block{:04}x", i * 10);
        assert_eq!(reader.find(inside.as_bytes()).unwrap(), Some(handles[i as usize]));
    }
}

#[test]
fn long_divider_keys_use_varint_lengths() {
    let long_key = vec![b'k'; 300]; // length needs a 2-byte varint
    let handle = BlockHandle::new(9, 9);

    let mut builder = IndexBlockBuilder::new();
    builder.add(&long_key, &handle).unwrap();
    let block = builder.finish();

    let reader = IndexBlockReader::new(&block).unwrap();
    assert_eq!(reader.find(&long_key).unwrap(), Some(handle));
}

// -------------------- Builder invariants --------------------

#[test]
fn out_of_order_divider_is_rejected() {
    let mut builder = IndexBlockBuilder::new();
    let handle = BlockHandle::default();
    builder.add(b"b", &handle).unwrap();
    assert_eq!(builder.add(b"a", &handle), Err(Error::KeyOrder));
    assert_eq!(builder.add(b"b", &handle), Err(Error::KeyOrder));
    assert!(builder.add(b"c", &handle).is_ok());
}

// -------------------- Corruption handling --------------------

#[test]
fn block_too_small_for_trailer() {
    assert_eq!(
        IndexBlockReader::new(b"abc").err(),
        Some(Error::Truncated("index trailer"))
    );
}

#[test]
fn absurd_entry_count_is_corrupt() {
    let mut block = b"a".to_vec();
    codec::put_fixed32(&mut block, 0);
    codec::put_fixed32(&mut block, 1000);
    assert!(matches!(
        IndexBlockReader::new(&block),
        Err(Error::Corrupt(_))
    ));
}

#[test]
fn non_monotonic_offsets_are_corrupt() {
    // Two entries but the offset array lists them out of order.
    let mut entries = Vec::new();
    let handle = BlockHandle::new(1, 2);
    let first_off = entries.len() as u32;
    codec::put_varint32(&mut entries, 1);
    entries.extend_from_slice(b"a");
    handle.encode_to(&mut entries);
    let second_off = entries.len() as u32;
    codec::put_varint32(&mut entries, 1);
    entries.extend_from_slice(b"b");
    handle.encode_to(&mut entries);

    let mut block = entries;
    codec::put_fixed32(&mut block, second_off);
    codec::put_fixed32(&mut block, first_off);
    codec::put_fixed32(&mut block, 2);

    assert_eq!(
        IndexBlockReader::new(&block).err(),
        Some(Error::Corrupt("index offsets not increasing"))
    );
}

#[test]
fn truncated_entry_is_corrupt() {
    // Offset array points at an entry whose handle bytes are missing.
    let mut entries = Vec::new();
    codec::put_varint32(&mut entries, 3);
    entries.extend_from_slice(b"key"); // no handle follows

    let mut block = entries;
    codec::put_fixed32(&mut block, 0);
    codec::put_fixed32(&mut block, 1);

    let reader = IndexBlockReader::new(&block).unwrap();
    assert!(matches!(reader.find(b"key"), Err(Error::Corrupt(_))));
}
