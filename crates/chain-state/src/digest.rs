//! Canonical serialization of an overlay layer's delta.
//!
//! The byte stream below is a wire contract: the ASCII section tags, the
//! little-endian integer encodings, and the lowercase-hex string form of
//! the per-map hashes must be reproduced exactly, or nodes will disagree
//! on the state-change commitment of every block.

use borsh::BorshSerialize;
use const_hex as hex;
use talus_crypto::hash;
use talus_identifiers::{Address, Buf32};
use talus_ledger_types::{TxOut, Utxo};

use crate::{map::StateMap, state_cache::StateCache};

/// Computes the 32-byte double-hash commitment over the layer's delta.
pub(crate) fn state_digest(ctd: &StateCache) -> Buf32 {
    let mut buffer = Vec::new();

    buffer.extend_from_slice(b"ChainName");
    buffer.extend_from_slice(ctd.loader().name().as_bytes());
    buffer.extend_from_slice(b"ChainVersion");
    buffer.extend_from_slice(&ctd.loader().version().to_le_bytes());
    buffer.extend_from_slice(b"PrevHash");
    buffer.extend_from_slice(ctd.loader().last_hash().as_slice());

    buffer.extend_from_slice(b"SeqMap");
    push_hash_hex(&mut buffer, &seq_entries(&ctd.seq_map));
    buffer.extend_from_slice(b"AccountMap");
    push_hash_hex(&mut buffer, &account_entries(ctd));
    buffer.extend_from_slice(b"DeletedAccountMap");
    ctd.deleted_account_set.each_all(|addr| {
        buffer.extend_from_slice(addr.as_slice());
        true
    });
    buffer.extend_from_slice(b"AccountNameMap");
    push_hash_hex(&mut buffer, &account_name_entries(&ctd.account_name_map));
    buffer.extend_from_slice(b"DeletedAccountNameMap");
    ctd.deleted_account_name_set.each_all(|name| {
        buffer.extend_from_slice(name.as_bytes());
        true
    });
    buffer.extend_from_slice(b"AccountDataMap");
    push_hash_hex(&mut buffer, &data_entries(&ctd.account_data_map));
    buffer.extend_from_slice(b"DeletedAccountDataMap");
    ctd.deleted_account_data_set.each_all(|key| {
        buffer.extend_from_slice(key);
        true
    });
    buffer.extend_from_slice(b"UTXOMap");
    push_hash_hex(&mut buffer, &utxo_entries(&ctd.utxo_map));
    buffer.extend_from_slice(b"CreatedUTXOMap");
    push_hash_hex(&mut buffer, &created_utxo_entries(&ctd.created_utxo_map));
    buffer.extend_from_slice(b"DeletedUTXOMap");
    ctd.deleted_utxo_set.each_all(|id| {
        buffer.extend_from_slice(&id.to_le_bytes());
        true
    });
    buffer.extend_from_slice(b"Events");
    for event in &ctd.events {
        buffer.extend_from_slice(hash::raw(&event.to_bytes()).as_slice());
    }
    buffer.extend_from_slice(b"ProcessDataMap");
    push_hash_hex(&mut buffer, &data_entries(&ctd.process_data_map));
    buffer.extend_from_slice(b"DeletedProcessDataMap");
    ctd.deleted_process_data_set.each_all(|key| {
        buffer.extend_from_slice(key);
        true
    });

    hash::sha256d(&buffer)
}

/// Appends the lowercase-hex SHA-256 of the entry stream.
fn push_hash_hex(buffer: &mut Vec<u8>, entries: &[u8]) {
    buffer.extend_from_slice(hex::encode(hash::raw(entries).as_slice()).as_bytes());
}

fn push_len(buf: &mut Vec<u8>, len: usize) {
    buf.extend_from_slice(&(len as u32).to_le_bytes());
}

fn seq_entries(map: &StateMap<Address, u64>) -> Vec<u8> {
    let mut buf = Vec::new();
    map.each_all(|addr, seq| {
        buf.extend_from_slice(addr.as_slice());
        buf.extend_from_slice(&seq.to_le_bytes());
        true
    });
    buf
}

fn account_entries(ctd: &StateCache) -> Vec<u8> {
    let mut buf = Vec::new();
    ctd.account_map.each_all(|addr, acc| {
        buf.extend_from_slice(addr.as_slice());
        let enc = acc.to_bytes();
        push_len(&mut buf, enc.len());
        buf.extend_from_slice(&enc);
        true
    });
    buf
}

fn account_name_entries(map: &StateMap<String, Address>) -> Vec<u8> {
    let mut buf = Vec::new();
    map.each_all(|name, addr| {
        push_len(&mut buf, name.len());
        buf.extend_from_slice(name.as_bytes());
        buf.extend_from_slice(addr.as_slice());
        true
    });
    buf
}

fn data_entries(map: &StateMap<Vec<u8>, Vec<u8>>) -> Vec<u8> {
    let mut buf = Vec::new();
    map.each_all(|key, value| {
        push_len(&mut buf, key.len());
        buf.extend_from_slice(key);
        push_len(&mut buf, value.len());
        buf.extend_from_slice(value);
        true
    });
    buf
}

fn utxo_entries(map: &StateMap<u64, Utxo>) -> Vec<u8> {
    let mut buf = Vec::new();
    map.each_all(|id, utxo| {
        buf.extend_from_slice(&id.to_le_bytes());
        utxo.serialize(&mut buf).expect("state: borsh encode");
        true
    });
    buf
}

fn created_utxo_entries(map: &StateMap<u64, TxOut>) -> Vec<u8> {
    let mut buf = Vec::new();
    map.each_all(|id, vout| {
        buf.extend_from_slice(&id.to_le_bytes());
        vout.serialize(&mut buf).expect("state: borsh encode");
        true
    });
    buf
}

/// Renders the layer's delta for diagnostics. Not part of consensus.
pub(crate) fn dump(ctd: &StateCache) -> String {
    use std::fmt::Write;

    fn hash_hex(buf: &[u8]) -> String {
        hex::encode(hash::raw(buf).as_slice())
    }

    let mut out = String::new();
    out.push_str("SeqMap\n");
    ctd.seq_map.each_all(|addr, seq| {
        let _ = writeln!(out, "{addr:?}: {seq}");
        true
    });
    out.push_str("\nAccountMap\n");
    ctd.account_map.each_all(|addr, acc| {
        let _ = writeln!(out, "{addr:?}: {}", hash_hex(&acc.to_bytes()));
        true
    });
    out.push_str("\nDeletedAccountMap\n");
    ctd.deleted_account_set.each_all(|addr| {
        let _ = writeln!(out, "{addr:?}");
        true
    });
    out.push_str("\nAccountNameMap\n");
    ctd.account_name_map.each_all(|name, addr| {
        let _ = writeln!(out, "{name}: {addr:?}");
        true
    });
    out.push_str("\nDeletedAccountNameMap\n");
    ctd.deleted_account_name_set.each_all(|name| {
        let _ = writeln!(out, "{name}");
        true
    });
    out.push_str("\nAccountDataMap\n");
    ctd.account_data_map.each_all(|key, value| {
        let _ = writeln!(out, "{}: {}", hash_hex(key), hash_hex(value));
        true
    });
    out.push_str("\nDeletedAccountDataMap\n");
    ctd.deleted_account_data_set.each_all(|key| {
        let _ = writeln!(out, "{}", hash_hex(key));
        true
    });
    out.push_str("\nUTXOMap\n");
    ctd.utxo_map.each_all(|id, utxo| {
        let enc = borsh::to_vec(utxo).expect("state: borsh encode");
        let _ = writeln!(out, "{id}: {}", hash_hex(&enc));
        true
    });
    out.push_str("\nCreatedUTXOMap\n");
    ctd.created_utxo_map.each_all(|id, vout| {
        let enc = borsh::to_vec(vout).expect("state: borsh encode");
        let _ = writeln!(out, "{id}: {}", hash_hex(&enc));
        true
    });
    out.push_str("\nDeletedUTXOMap\n");
    ctd.deleted_utxo_set.each_all(|id| {
        let _ = writeln!(out, "{id}");
        true
    });
    out.push_str("\nEvents\n");
    for event in &ctd.events {
        let _ = writeln!(out, "{}", hash_hex(&event.to_bytes()));
    }
    out.push_str("\nProcessDataMap\n");
    ctd.process_data_map.each_all(|key, value| {
        let _ = writeln!(out, "{}: {}", hash_hex(key), hash_hex(value));
        true
    });
    out.push_str("\nDeletedProcessDataMap\n");
    ctd.deleted_process_data_set.each_all(|key| {
        let _ = writeln!(out, "{}", hash_hex(key));
        true
    });
    out
}
