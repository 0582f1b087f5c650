/*
    Coin selection, fee estimation and SIGHASH_ALL signing.
*/

use crate::hash;
use crate::key::KeyPair;
use crate::network;
use crate::script;
use crate::transaction::encode::TxWriter;
use crate::transaction::{SignedTransaction, TxError, TxOutput, Utxo};

const SIGHASH_ALL: u32 = 1;
const SEQUENCE_FINAL: u32 = 0xFFFF_FFFF;
const LOCKTIME: u32 = 0;

/// Linear size model for a P2PKH transaction:
/// 10 + 148 per input + 34 per output. Signature length variance is
/// not accounted for.
pub fn estimate_size(input_count: usize, output_count: usize) -> usize {
    10 + 148 * input_count + 34 * output_count
}

/// Greedy largest-first selection. UTXOs are accumulated until their
/// total covers the target plus the estimated fee for the selection
/// with two outputs (payment and change).
pub fn select_utxos(
    available: &[Utxo],
    target: i64,
    fee_rate: i64,
) -> Result<Vec<Utxo>, TxError> {
    let mut sorted: Vec<Utxo> = available.to_vec();
    sorted.sort_by(|a, b| b.value.cmp(&a.value));

    let mut selected = Vec::new();
    let mut total = 0i64;
    for utxo in sorted {
        total += utxo.value;
        selected.push(utxo);
        let fee = estimate_size(selected.len(), 2) as i64 * fee_rate;
        if total >= target + fee {
            return Ok(selected);
        }
    }

    let fee = estimate_size(selected.len().max(1), 2) as i64 * fee_rate;
    Err(TxError::InsufficientFunds {
        needed: target + fee,
        available: total,
    })
}

/// Build and sign a transaction spending `utxos` (all controlled by
/// `key_pair`) to `outputs`, sending any non-dust change to
/// `change_address`. `fee_rate` is satoshi per byte of estimated size.
///
/// Change at or below the dust threshold is forfeited to the fee
/// instead of creating an uneconomical output.
pub fn build_transaction(
    key_pair: &KeyPair,
    utxos: &[Utxo],
    outputs: &[TxOutput],
    change_address: &str,
    fee_rate: i64,
) -> Result<SignedTransaction, TxError> {
    if utxos.is_empty() {
        return Err(TxError::NoUtxos);
    }
    if outputs.is_empty() {
        return Err(TxError::NoOutputs);
    }
    let total_output: i64 = outputs.iter().map(|output| output.value).sum();
    if total_output <= 0 {
        return Err(TxError::NonPositiveAmount);
    }

    let selected = select_utxos(utxos, total_output, fee_rate)?;
    let total_input: i64 = selected.iter().map(|utxo| utxo.value).sum();

    // The fee is committed against the full output set plus a change
    // slot, even if the change later turns out to be dust.
    let mut fee = estimate_size(selected.len(), outputs.len() + 1) as i64 * fee_rate;
    let change = total_input - total_output - fee;
    if change < 0 {
        return Err(TxError::InsufficientFunds {
            needed: total_output + fee,
            available: total_input,
        });
    }

    let mut final_outputs: Vec<TxOutput> = outputs.to_vec();
    if change > network::DUST_THRESHOLD {
        final_outputs.push(TxOutput {
            address: change_address.to_string(),
            value: change,
        });
    } else {
        fee += change;
    }

    let mut prev_hashes = Vec::with_capacity(selected.len());
    let mut subscripts = Vec::with_capacity(selected.len());
    for utxo in &selected {
        prev_hashes.push(wire_prev_hash(utxo)?);
        subscripts.push(
            hex::decode(&utxo.script_pub_key)
                .map_err(|_| TxError::BadScript(utxo.script_pub_key.clone()))?,
        );
    }

    let mut output_bytes = TxWriter::new();
    output_bytes.write_varint(final_outputs.len() as u64);
    for output in &final_outputs {
        let script = script::p2pkh_from_address(&output.address)?;
        output_bytes.write_i64_le(output.value);
        output_bytes.write_varint(script.len() as u64);
        output_bytes.write_bytes(&script);
    }
    let output_bytes = output_bytes.into_bytes();

    let serialize = |script_sigs: &[&[u8]]| -> Vec<u8> {
        let mut writer = TxWriter::new();
        writer.write_i32_le(network::TX_VERSION);
        writer.write_varint(selected.len() as u64);
        for (i, utxo) in selected.iter().enumerate() {
            writer.write_bytes(&prev_hashes[i]);
            writer.write_u32_le(utxo.output_index);
            writer.write_varint(script_sigs[i].len() as u64);
            writer.write_bytes(script_sigs[i]);
            writer.write_u32_le(SEQUENCE_FINAL);
        }
        writer.write_bytes(&output_bytes);
        writer.write_u32_le(LOCKTIME);
        writer.into_bytes()
    };

    // SIGHASH_ALL: for each input, every other scriptSig is empty and
    // input i carries its previous scriptPubKey as subscript.
    let empty: &[u8] = &[];
    let public_key = key_pair.compressed_public_key();
    let mut script_sigs: Vec<Vec<u8>> = Vec::with_capacity(selected.len());
    for i in 0..selected.len() {
        let mut slots: Vec<&[u8]> = vec![empty; selected.len()];
        slots[i] = &subscripts[i];

        let mut preimage = serialize(&slots);
        preimage.extend_from_slice(&SIGHASH_ALL.to_le_bytes());
        let digest = hash::sha256d(&preimage);

        let mut signature = key_pair.sign(&digest)?;
        signature.push(0x01);
        script_sigs.push(script::p2pkh_script_sig(&signature, &public_key));
    }

    let slots: Vec<&[u8]> = script_sigs.iter().map(|sig| sig.as_slice()).collect();
    let bytes = serialize(&slots);

    let mut tx_id = hash::sha256d(&bytes);
    tx_id.reverse();

    Ok(SignedTransaction {
        tx_hex: hex::encode(&bytes),
        tx_id: hex::encode(tx_id),
        size: bytes.len(),
        fee,
    })
}

/// Decode a display-order hex transaction id into wire byte order.
fn wire_prev_hash(utxo: &Utxo) -> Result<[u8; 32], TxError> {
    let bytes =
        hex::decode(&utxo.tx_hash).map_err(|_| TxError::BadTxHash(utxo.tx_hash.clone()))?;
    let mut hash: [u8; 32] = bytes
        .try_into()
        .map_err(|_| TxError::BadTxHash(utxo.tx_hash.clone()))?;
    hash.reverse();
    Ok(hash)
}
