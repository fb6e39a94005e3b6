//! Error-message corpus: the text the overlay engine scatters.
//!
//! The pipeline only depends on the [`ErrorCorpus`] trait — a
//! category-keyed random pick plus two format helpers, all drawing from a
//! caller-supplied stream so repeated runs replay the same text. The
//! built-in corpus carries a curated slice of the classic categories.

use crate::rng::Stream;

pub trait ErrorCorpus {
    /// A random message from `category`. Unknown categories degrade to a
    /// tagged placeholder rather than failing.
    fn random_message(&self, rng: &mut Stream, category: &str) -> String;

    /// A random short error code ("E_NOENT", "0xDEADBEEF", ...).
    fn random_short_code(&self, rng: &mut Stream) -> String;

    /// `"{message} at 0x{ADDR:06X}"` with a random 24-bit address.
    fn format_with_hex(&self, rng: &mut Stream, message: &str) -> String;

    /// `"[{code}] {message}"`.
    fn format_with_code(&self, message: &str, code: &str) -> String;
}

pub const SHORT_ERROR_CODES: &[&str] = &[
    "ERR_001", "ERR_002", "ERR_003", "ERR_004", "ERR_005",
    "E_BADF", "E_NOENT", "E_IO", "E_BUSY", "E_TIMEOUT",
    "E_AGAIN", "E_NOMEM", "E_ACCES", "E_FAULT", "E_EXIST",
    "E_INVAL", "E_MFILE", "E_PIPE", "E_ROFS", "E_SPIPE",
    "E_NOSPC", "E_MCHK", "E_PWR", "E_BADMSG", "E_IDRM",
    "FATAL:001", "FATAL:00A", "FATAL:0FF", "FATAL:DEAD",
    "PANIC:001", "PANIC:00F", "PANIC:0C0", "PANIC:0DE",
    "ABRT:001", "ABRT:002", "ABRT:0FF", "ABRT:0xDEAD",
    "HALT:001", "HALT:0FF", "HALT:0xDE", "HALT:0xAD",
    "0xC0000005", "0xC0000008", "0xC0000017", "0xC0000022",
    "0xDEADBEEF", "0xBAADF00D", "0xCAFEBABE", "0xFEEDFACE",
    "CUDA:001", "CUDA:002", "CUDA:OOM", "CUDA:ERR",
    "ML:001", "ML:002", "ML:OVERFIT", "ML:UNDERFIT",
    "STACK:OVF", "STACK:UND", "STACK:SMASH",
];

const CATEGORIES: &[(&str, &[&str])] = &[
    (
        "fatal",
        &[
            "KERNEL_PANIC: system halted",
            "SYSTEM_HALT: CPU exception",
            "CRITICAL: memory corruption detected",
            "FATAL_OOM: process killed",
            "SIGSEGV: invalid memory access",
            "DOUBLE_FAULT: shutdown requested",
            "WATCHDOG_TIMEOUT: no heartbeat",
            "KERNEL: NULL pointer dereference",
            "GENERAL_PROTECTION_FAULT",
            "SEGMENTATION_FAULT: core dumped",
            "MACHINE_CHECK_EXCEPTION",
            "INVALID_OPCODE: illegal instruction",
        ],
    ),
    (
        "hash",
        &[
            "HASH_MISMATCH: checksum failed",
            "INTEGRITY_VIOLATION: SHA256 mismatch",
            "SIGNATURE_VERIFICATION_FAILED",
            "CERTIFICATE_EXPIRED: validation failed",
            "CHECKSUM_ERROR: data corruption",
            "HMAC_AUTH_FAILED: bad MAC",
            "SECURE_BOOT: signature error",
            "CRC32_ERROR: data corrupted",
            "FINGERPRINT_MISMATCH",
            "MANIFEST_VERIFICATION: failed",
        ],
    ),
    (
        "key",
        &[
            "KEY_EXPIRED: certificate expired",
            "KEY_REVOKED: key in CRL",
            "PRIVATE_KEY_LOCKED: access denied",
            "PUBLIC_KEY_INVALID: malformed",
            "DECRYPTION_FAILED: bad key",
            "KEY_STORE_CORRUPTED",
            "TPM: key not found",
            "CERTIFICATE_CHAIN: broken",
            "ROOT_CA: untrusted",
            "KEY_DERIVATION: failed",
        ],
    ),
    (
        "auth",
        &[
            "AUTH_FAILED: invalid credentials",
            "ACCESS_DENIED: permission denied",
            "SESSION_EXPIRED: reauth required",
            "TOKEN_INVALID: malformed JWT",
            "PRIVILEGE_ESCALATION_FAILED",
            "RBAC: insufficient privileges",
            "PAM: authentication failure",
            "KERBEROS: ticket expired",
            "API_KEY: invalid or revoked",
            "ACCOUNT_LOCKED: too many attempts",
        ],
    ),
    (
        "network",
        &[
            "CONNECTION_TIMEOUT: no response",
            "NETWORK_UNREACHABLE: host down",
            "DNS_RESOLUTION_FAILED: nxdomain",
            "SSL_HANDSHAKE_FAILED: protocol error",
            "PEER_RESET_CONNECTION: RST",
            "ROUTE_NOT_FOUND: no route to host",
            "FIREWALL: packet dropped",
            "ARP_RESOLUTION: failed",
            "MTU_PROBLEM: packet too big",
            "CIPHER_SUITE: no shared",
        ],
    ),
    (
        "hardware",
        &[
            "DISK_READ_ERROR: sector unreadable",
            "DISK_WRITE_FAILED: media error",
            "SATA_LINK_DOWN: device offline",
            "NVME: controller fatal error",
            "GPU_RESET: TDR detected",
            "MEMORY_ECC_ERROR: uncorrectable",
            "FAN_FAILURE: thermal throttling",
            "DMA: transfer failed",
            "SMART: disk failing",
            "UDMA_CRC_ERROR: cable problem",
        ],
    ),
    (
        "filesystem",
        &[
            "FS_CORRUPTION: inode error",
            "JOURNAL_RECOVERY_FAILED",
            "SUPERBLOCK_READ_ERROR: mount failed",
            "EXT4: filesystem corrupted",
            "BTRFS: checksum mismatch",
            "QUOTA_EXCEEDED: no space left",
            "FILE_SYSTEM: readonly",
            "DISK_FULL: write failed",
            "TOO_MANY_OPEN_FILES",
            "LOCK_CONTENTION: deadlock",
        ],
    ),
    (
        "database",
        &[
            "DB_CONNECTION_FAILED: timeout",
            "TRANSACTION_DEADLOCK: rollback",
            "TABLE_CORRUPT: rebuilding",
            "INDEX_CORRUPTION: dropping index",
            "REPLICATION_LAG: sync failed",
            "QUERY_TIMEOUT: killed by watchdog",
            "WAL_ARCHIVE_FAILED: no space",
            "UNIQUE_VIOLATION: duplicate key",
            "DEADLOCK_DETECTED: victim chosen",
            "TRANSACTION_LOG: full",
        ],
    ),
    (
        "security",
        &[
            "INTRUSION_DETECTED: port scan",
            "BRUTE_FORCE_ATTACK: rate limiting",
            "BUFFER_OVERFLOW: DEP prevented",
            "CODE_INJECTION DETECTED",
            "SHELLCODE_DETECTED: SIGKILL",
            "STACK_COOKIE: corrupted",
            "HEAP_CORRUPTION: free invalid",
            "USE_AFTER_FREE: dangling pointer",
            "DOUBLE_FREE: memory corruption",
            "SQL_INJECTION: query blocked",
        ],
    ),
    (
        "crypto",
        &[
            "RNG_ENTROPY_LOW: blocking",
            "ENCRYPTION_ENGINE_FAILED",
            "AES_NI: instruction unavailable",
            "RSA_OPERATION_FAILED: key size",
            "RANDOM_POOL: insufficient entropy",
            "CSPRNG: reseed required",
            "PKCS7: padding error",
            "IV_REUSE: security violation",
            "NONCE: already used",
            "AEAD_TAG: verification failed",
        ],
    ),
    (
        "runtime",
        &[
            "OUT_OF_MEMORY: allocation failed",
            "STACK_OVERFLOW: recursion depth",
            "HEAP_EXHAUSTED: no free blocks",
            "INVALID_POINTER: dereference",
            "DIVISION_BY_ZERO: arithmetic",
            "ILLEGAL_INSTRUCTION: opcode",
            "SCHEDULER: starvation detected",
            "TASK_HUNG: watchdog reset",
            "DEADLOCK: circular wait",
            "RACE_CONDITION: detected",
        ],
    ),
    (
        "driver",
        &[
            "DEVICE_NOT_FOUND: missing",
            "DRIVER_LOAD_FAILED: init error",
            "USB_DEVICE: disconnected",
            "PCI_CONFIG: read failed",
            "UART_FRAMING: parity error",
            "INTERRUPT_STORM: throttling",
            "FIRMWARE_LOAD: corrupted",
            "DEVICE_HUNG: resetting",
            "PHY_ERROR: link down",
            "RESOURCE_CONFLICT: IRQ/IO",
        ],
    ),
    (
        "monitoring",
        &[
            "CPU_THROTTLED: thermal limit",
            "MEMORY_PRESSURE: high",
            "DISK_IO: latency spike",
            "PACKET_LOSS: exceeding threshold",
            "LATENCY_SPIKE: >100ms",
            "HEALTH_CHECK: failed",
            "PROBE_FAILED: endpoint down",
            "PROMETHEUS: target down",
            "TELEMETRY: export failed",
            "HEARTBEAT: missed",
        ],
    ),
    (
        "ml",
        &[
            "TRAINING_DIVERGED: loss = NaN",
            "GRADIENT_EXPLOSION: value > 1e6",
            "OVERFITTING: train/val gap > 30%",
            "MODEL_CORRUPTED: weights mismatch",
            "CHECKPOINT_LOAD: tensor shape mismatch",
            "DATA_LOADER: worker crashed",
            "TENSOR_SHAPE_MISMATCH: expected [B,3,224,224]",
            "OUT_OF_MEMORY: CUDA OOM",
            "CUDA_ERROR: device side assert",
            "SOFTMAX: overflow in exponent",
            "LOSS_NAN: numerical instability",
            "NCCL: communication error",
        ],
    ),
    (
        "stack",
        &[
            "STACK_OVERFLOW: recursive call depth 1024",
            "STACK_UNDERFLOW: pop from empty stack",
            "STACK_CORRUPTION: canary check failed",
            "STACK_SMASHING: return address overwritten",
            "STACK_GUARD: terminated process",
            "CALL_STACK: max depth exceeded",
            "RECURSION_LIMIT: depth 1000 reached",
            "FRAME_POINTER: corrupted",
            "RETURN_ADDRESS: pointing to garbage",
            "STACK_UNWIND: failed in exception",
            "BACKTRACE: symbol resolution failed",
            "FRAME_CHAIN: broken linkage",
        ],
    ),
];

/// The crate's bundled corpus.
#[derive(Debug, Default, Clone, Copy)]
pub struct BuiltinCorpus;

impl ErrorCorpus for BuiltinCorpus {
    fn random_message(&self, rng: &mut Stream, category: &str) -> String {
        match CATEGORIES.iter().find(|(name, _)| *name == category) {
            Some((_, messages)) => rng.choose(messages).to_string(),
            None => format!("UNKNOWN_ERROR: {category}"),
        }
    }

    fn random_short_code(&self, rng: &mut Stream) -> String {
        rng.choose(SHORT_ERROR_CODES).to_string()
    }

    fn format_with_hex(&self, rng: &mut Stream, message: &str) -> String {
        let address = rng.int_in(0, 0xFF_FFFF);
        format!("{message} at 0x{address:06X}")
    }

    fn format_with_code(&self, message: &str, code: &str) -> String {
        format!("[{code}] {message}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::RenderRng;

    #[test]
    fn every_configured_category_has_messages() {
        let corpus = BuiltinCorpus;
        let mut rng = RenderRng::seeded(5);
        for (category, _) in CATEGORIES {
            let message = corpus.random_message(&mut rng.general, category);
            assert!(!message.starts_with("UNKNOWN_ERROR"), "category {category}");
        }
    }

    #[test]
    fn unknown_category_degrades_to_placeholder() {
        let corpus = BuiltinCorpus;
        let mut rng = RenderRng::seeded(5);
        let message = corpus.random_message(&mut rng.general, "bogus");
        assert_eq!(message, "UNKNOWN_ERROR: bogus");
    }

    #[test]
    fn hex_format_appends_a_six_digit_address() {
        let corpus = BuiltinCorpus;
        let mut rng = RenderRng::seeded(5);
        let formatted = corpus.format_with_hex(&mut rng.general, "DISK_ERR");
        assert!(formatted.starts_with("DISK_ERR at 0x"));
        assert_eq!(formatted.len(), "DISK_ERR at 0x".len() + 6);
    }

    #[test]
    fn same_stream_state_replays_the_same_picks() {
        let corpus = BuiltinCorpus;
        let mut first = RenderRng::seeded(9);
        let mut second = RenderRng::seeded(9);
        for _ in 0..32 {
            assert_eq!(
                corpus.random_message(&mut first.general, "fatal"),
                corpus.random_message(&mut second.general, "fatal")
            );
            assert_eq!(
                corpus.random_short_code(&mut first.general),
                corpus.random_short_code(&mut second.general)
            );
        }
    }
}
