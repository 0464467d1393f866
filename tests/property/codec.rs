use std::collections::HashSet;

use proptest::prelude::*;
use datahook::codec::{DataFileCodec, Document, KeySet, MetaDescriptor, hash_name};
use datahook::types::Direction;
use datahook_test_utils::builders::DataFileBuilder;

// Unrelated lines the external application keeps in the file.
fn foreign_keys_strategy() -> impl Strategy<Value = Vec<(String, String)>> {
    proptest::collection::vec(("cfg_[a-z]{3,10}", "[ -~]{0,40}"), 0..6)
}

fn direction_strategy() -> impl Strategy<Value = Direction> {
    prop_oneof![Just(Direction::Inbound), Just(Direction::Outbound)]
}

proptest! {
    #[test]
    fn test_document_survives_serialize_then_parse(
        payload in proptest::collection::vec(any::<u8>(), 0..2000),
        foreign in foreign_keys_strategy(),
        direction in direction_strategy(),
        chunk_size in 1usize..400,
    ) {
        let mut builder = DataFileBuilder::new();
        for (name, value) in &foreign {
            builder = builder.key(name, value);
        }
        let existing = builder.build();

        let codec = DataFileCodec::with_chunk_size(chunk_size);
        let doc = Document::new(payload);
        let file = codec.serialize_as(&doc, Some(&existing), direction).unwrap();

        prop_assert_eq!(codec.parse_as(&file, direction).unwrap(), doc);

        // Every foreign line is still there, byte for byte.
        let before = KeySet::parse(&existing);
        let after = KeySet::parse(&file);
        for line in before.lines() {
            prop_assert!(after.lines().any(|l| l == line));
        }
    }

    #[test]
    fn test_chunk_count_is_ceiling_of_encoded_length(
        len in 0usize..3000,
        chunk_size in 1usize..300,
    ) {
        let codec = DataFileCodec::with_chunk_size(chunk_size);
        let file = codec
            .serialize(&Document::new(vec![b'x'; len]), None)
            .unwrap();

        let keys = KeySet::parse(&file);
        let meta = MetaDescriptor::load(&keys).unwrap().unwrap();
        let count = meta.chunk_count(Direction::Inbound).unwrap();

        let encoded_len = (len * 4).div_ceil(3);
        prop_assert_eq!(count, encoded_len.div_ceil(chunk_size));
        prop_assert_eq!(keys.len(), count + 1);

        if count > 0 {
            let last = keys.get(&Direction::Inbound.chunk_key(count - 1)).unwrap();
            prop_assert_eq!(last.len(), encoded_len - (count - 1) * chunk_size);
            prop_assert!(!keys.contains(&Direction::Inbound.chunk_key(count)));
        }
    }

    #[test]
    fn test_hash_name_is_stable_uppercase_hex(name in "[ -~]{0,32}") {
        let hash = hash_name(&name);
        prop_assert_eq!(hash.len(), 8);
        prop_assert!(hash.chars().all(|c| c.is_ascii_digit() || ('A'..='F').contains(&c)));
        prop_assert_eq!(hash, hash_name(&name));
    }

    #[test]
    fn test_lookup_never_panics_on_arbitrary_files(
        bytes in proptest::collection::vec(any::<u8>(), 0..512),
        name in "[a-z\\-0-9]{0,12}",
    ) {
        let keys = KeySet::parse(&bytes);
        let _ = keys.get(&name);
        let _ = DataFileCodec::default().parse(&bytes);
    }
}

#[test]
fn test_realistic_key_names_do_not_collide() {
    let mut names: Vec<String> = vec!["meta".to_string()];
    for i in 0..5000 {
        names.push(Direction::Inbound.chunk_key(i));
        names.push(Direction::Outbound.chunk_key(i));
    }

    let hashes: HashSet<String> = names.iter().map(|n| hash_name(n)).collect();
    assert_eq!(hashes.len(), names.len());
}
