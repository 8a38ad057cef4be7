//! End-to-end wire format tests
//!
//! These tests validate:
//! - Canonical account ordering across compilation
//! - Deduplication with most-permissive role merge
//! - Address lookup table extraction for version 0 messages
//! - Byte-exact round trips for transactions and off-chain messages

use nonempty::NonEmpty;
use txkit::compile::{compile_transaction_message, AddressLookupTable, CompileError};
use txkit::message::{AccountMeta, Instruction, TransactionMessage, TransactionVersion};
use txkit::offchain::{MessageFormat, OffchainMessage, SignedOffchainMessage, SIGNING_DOMAIN};
use txkit::signer::KeypairSigner;
use txkit::transaction::Transaction;
use txkit::types::{Address, Blockhash};

fn address(byte: u8) -> Address {
    Address::new([byte; 32])
}

fn blockhash(byte: u8) -> Blockhash {
    Blockhash::new([byte; 32])
}

const PROGRAM: u8 = 0xf0;

#[test]
fn test_compiler_orders_accounts_canonically() {
    let instruction = Instruction::new(
        address(PROGRAM),
        vec![
            AccountMeta::writable(address(3)),
            AccountMeta::readonly(address(1)),
            AccountMeta::writable_signer(address(5)),
            AccountMeta::readonly_signer(address(2)),
        ],
        vec![0xde, 0xad],
    );
    let message = TransactionMessage::new(TransactionVersion::V0)
        .with_fee_payer(address(9))
        .with_blockhash_lifetime(blockhash(7))
        .with_instruction(instruction);

    let compiled = compile_transaction_message(&message, &[]).unwrap();

    // Payer first, then each permission group in address byte order.
    assert_eq!(
        compiled.static_addresses,
        vec![
            address(9),
            address(5),
            address(2),
            address(3),
            address(1),
            address(PROGRAM),
        ]
    );
    assert_eq!(compiled.header.num_required_signatures, 3);
    assert_eq!(compiled.header.num_readonly_signed_accounts, 1);
    assert_eq!(compiled.header.num_readonly_unsigned_accounts, 2);

    let compiled_instruction = &compiled.instructions[0];
    assert_eq!(compiled_instruction.program_address_index, 5);
    assert_eq!(compiled_instruction.account_indices, vec![3, 4, 1, 2]);
    assert_eq!(compiled_instruction.data, vec![0xde, 0xad]);

    let bytes = compiled.to_bytes().unwrap();
    // Version flag, header counts 3/1/2, then the six static addresses.
    assert_eq!(hex::encode(&bytes[..5]), "8003010206");
    assert_eq!(*bytes.last().unwrap(), 0);
}

#[test]
fn test_compiler_merges_duplicate_mentions_to_most_permissive_role() {
    let message = TransactionMessage::new(TransactionVersion::V0)
        .with_fee_payer(address(9))
        .with_blockhash_lifetime(blockhash(7))
        .with_instruction(Instruction::new(
            address(PROGRAM),
            vec![AccountMeta::readonly(address(4))],
            vec![1],
        ))
        .with_instruction(Instruction::new(
            address(PROGRAM),
            vec![AccountMeta::writable_signer(address(4))],
            vec![2],
        ));

    let compiled = compile_transaction_message(&message, &[]).unwrap();

    assert_eq!(
        compiled.static_addresses,
        vec![address(9), address(4), address(PROGRAM)]
    );
    assert_eq!(compiled.header.num_required_signatures, 2);
    assert_eq!(compiled.header.num_readonly_signed_accounts, 0);
    assert_eq!(compiled.header.num_readonly_unsigned_accounts, 1);
    // Both instructions resolve the merged account to the same index.
    assert_eq!(compiled.instructions[0].account_indices, vec![1]);
    assert_eq!(compiled.instructions[1].account_indices, vec![1]);
}

#[test]
fn test_compiler_extracts_lookup_table_accounts() {
    let table = AddressLookupTable {
        address: address(0xaa),
        addresses: vec![address(3), address(1), address(6)],
    };
    let message = TransactionMessage::new(TransactionVersion::V0)
        .with_fee_payer(address(9))
        .with_blockhash_lifetime(blockhash(7))
        .with_instruction(Instruction::new(
            address(PROGRAM),
            vec![
                AccountMeta::writable(address(3)),
                AccountMeta::readonly(address(1)),
                AccountMeta::readonly(address(2)),
            ],
            vec![5],
        ));

    let compiled = compile_transaction_message(&message, &[table]).unwrap();

    // Accounts found in the table leave the static list.
    assert_eq!(
        compiled.static_addresses,
        vec![address(9), address(2), address(PROGRAM)]
    );
    assert_eq!(compiled.address_table_lookups.len(), 1);
    let lookup = &compiled.address_table_lookups[0];
    assert_eq!(lookup.table_address, address(0xaa));
    assert_eq!(lookup.writable_indexes, vec![0]);
    assert_eq!(lookup.readonly_indexes, vec![1]);

    // Loaded accounts index after the static list: writable then readonly.
    let compiled_instruction = &compiled.instructions[0];
    assert_eq!(compiled_instruction.program_address_index, 2);
    assert_eq!(compiled_instruction.account_indices, vec![3, 4, 1]);

    let bytes = compiled.to_bytes().unwrap();
    let decoded = txkit::compile::CompiledMessage::from_bytes(&bytes).unwrap();
    assert_eq!(decoded, compiled);
}

#[test]
fn test_legacy_message_rejects_lookup_tables() {
    let table = AddressLookupTable {
        address: address(0xaa),
        addresses: vec![address(3)],
    };
    let message = TransactionMessage::new(TransactionVersion::Legacy)
        .with_fee_payer(address(9))
        .with_blockhash_lifetime(blockhash(7))
        .with_instruction(Instruction::new(
            address(PROGRAM),
            vec![AccountMeta::writable(address(3))],
            vec![5],
        ));

    let err = compile_transaction_message(&message, &[table]).unwrap_err();
    assert!(matches!(err, CompileError::LookupTablesNotSupported));
}

#[test]
fn test_legacy_message_first_byte_is_signature_count() {
    let message = TransactionMessage::new(TransactionVersion::Legacy)
        .with_fee_payer(address(9))
        .with_blockhash_lifetime(blockhash(7))
        .with_instruction(Instruction::new(
            address(PROGRAM),
            vec![AccountMeta::writable(address(3))],
            vec![5],
        ));

    let compiled = compile_transaction_message(&message, &[]).unwrap();
    let bytes = compiled.to_bytes().unwrap();
    // No version flag: the message opens directly with the header.
    assert_eq!(bytes[0], 1);
    assert!(bytes[0] & 0x80 == 0);
}

#[test]
fn test_transaction_signs_and_round_trips_through_wire_bytes() {
    let payer = KeypairSigner::generate();
    let partner = KeypairSigner::generate();

    let message = TransactionMessage::new(TransactionVersion::V0)
        .with_fee_payer(payer.address())
        .with_blockhash_lifetime(blockhash(7))
        .with_instruction(Instruction::new(
            address(PROGRAM),
            vec![AccountMeta::writable_signer(partner.address())],
            vec![1, 2, 3],
        ));
    let compiled = compile_transaction_message(&message, &[]).unwrap();
    let transaction = Transaction::new_unsigned(compiled.to_bytes().unwrap()).unwrap();

    assert!(!transaction.is_fully_signed());
    assert_eq!(transaction.signatures().len(), 2);
    assert_eq!(transaction.signatures()[0].address, payer.address());

    let payer_signature = payer.sign_bytes(transaction.message_bytes());
    let partner_signature = partner.sign_bytes(transaction.message_bytes());
    let signed = transaction
        .with_signatures([
            (payer.address(), payer_signature),
            (partner.address(), partner_signature),
        ])
        .unwrap();

    assert!(signed.is_fully_signed());
    assert_eq!(signed.id().unwrap(), payer_signature);

    let wire = signed.to_wire_bytes().unwrap();
    assert_eq!(wire[0], 2);
    let decoded = Transaction::from_wire_bytes(&wire).unwrap();
    assert_eq!(decoded, signed);
}

#[test]
fn test_unsigned_transaction_wire_bytes_use_placeholder_signatures() {
    let message = TransactionMessage::new(TransactionVersion::V0)
        .with_fee_payer(address(9))
        .with_blockhash_lifetime(blockhash(7))
        .with_instruction(Instruction::new(
            address(PROGRAM),
            vec![AccountMeta::readonly(address(1))],
            vec![9],
        ));
    let compiled = compile_transaction_message(&message, &[]).unwrap();
    let transaction = Transaction::new_unsigned(compiled.to_bytes().unwrap()).unwrap();

    let wire = transaction.to_wire_bytes().unwrap();
    assert_eq!(wire[0], 1);
    assert!(wire[1..65].iter().all(|&byte| byte == 0));

    let decoded = Transaction::from_wire_bytes(&wire).unwrap();
    assert!(!decoded.is_fully_signed());
    assert_eq!(decoded.missing_signers(), vec![address(9)]);
}

#[test]
fn test_offchain_message_golden_bytes() {
    let signatory = address(0x11);
    let message = OffchainMessage::new(
        [0xab; 32],
        NonEmpty::new(signatory),
        "Hello, World!",
    )
    .unwrap();
    assert_eq!(message.format(), MessageFormat::RestrictedAscii);

    let bytes = message.to_bytes().unwrap();
    assert_eq!(bytes.len(), 16 + 1 + 32 + 1 + 1 + 32 + 2 + 13);
    assert_eq!(&bytes[..16], &SIGNING_DOMAIN);
    assert_eq!(bytes[16], 0);
    assert_eq!(&bytes[17..49], &[0xab; 32]);
    assert_eq!(bytes[49], 0);
    assert_eq!(bytes[50], 1);
    assert_eq!(&bytes[51..83], signatory.as_bytes());
    assert_eq!(&bytes[83..85], &[13, 0]);
    assert_eq!(&bytes[85..], b"Hello, World!");

    let decoded = OffchainMessage::from_bytes(&bytes).unwrap();
    assert_eq!(decoded, message);
}

#[test]
fn test_offchain_message_signature_verification() {
    let keypair = KeypairSigner::generate();
    let message = OffchainMessage::new(
        [1; 32],
        NonEmpty::new(keypair.address()),
        "approve session",
    )
    .unwrap();

    let unsigned = SignedOffchainMessage::new_unsigned(message.to_bytes().unwrap()).unwrap();
    assert_eq!(unsigned.missing_signatories(), vec![keypair.address()]);

    let signature = keypair.sign_bytes(unsigned.message_bytes());
    let signed = unsigned
        .with_signatures([(keypair.address(), signature)])
        .unwrap();
    assert!(signed.is_fully_signed());
    signed.verify().unwrap();

    // Tampering with a signature must fail verification.
    let forged = unsigned
        .with_signatures([(keypair.address(), txkit::types::Signature::new([0x55; 64]))])
        .unwrap();
    assert!(forged.verify().is_err());
}
