//! Secret Redaction
//!
//! The teacher never logs a `PrivateKeySigner` directly (it doesn't
//! implement `Display`/`Debug` in a way that would leak key material), but
//! once the executor starts logging raw RPC error bodies and transaction
//! calldata, those strings can carry a private key that was echoed back by
//! a misbehaving RPC endpoint or accidentally included in a config dump.
//! This module is the one place that scrubs strings before they reach
//! `tracing`.

/// Replace anything that looks like a 32-byte hex private key (with or
/// without a `0x` prefix) with a redaction marker.
#[must_use]
pub fn redact_private_keys(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.char_indices().peekable();
    let bytes = input.as_bytes();

    let mut i = 0;
    while i < bytes.len() {
        let has_prefix = input[i..].starts_with("0x");
        let start = if has_prefix { i + 2 } else { i };
        if let Some(end) = hex_run_end(input, start) {
            let len = end - start;
            if len == 64 {
                out.push_str("<redacted>");
                i = end;
                continue;
            }
        }
        let ch = input[i..].chars().next().unwrap();
        out.push(ch);
        i += ch.len_utf8();
    }
    let _ = chars.peek();
    out
}

fn hex_run_end(s: &str, start: usize) -> Option<usize> {
    let bytes = s.as_bytes();
    if start >= bytes.len() {
        return None;
    }
    let mut end = start;
    while end < bytes.len() && (bytes[end] as char).is_ascii_hexdigit() {
        end += 1;
    }
    if end > start {
        Some(end)
    } else {
        None
    }
}

/// Mask all but the last 4 characters of an address-like string, for
/// config-dump log lines that shouldn't reveal a full operator address.
#[must_use]
pub fn mask_tail(input: &str, keep: usize) -> String {
    if input.len() <= keep {
        return "*".repeat(input.len());
    }
    let (head, tail) = input.split_at(input.len() - keep);
    format!("{}{}", "*".repeat(head.len()), tail)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redacts_0x_prefixed_private_key() {
        let key = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff8";
        let input = format!("signer key=0x{key} loaded");
        let redacted = redact_private_keys(&input);
        assert!(!redacted.contains(key));
        assert!(redacted.contains("<redacted>"));
    }

    #[test]
    fn redacts_bare_private_key() {
        let key = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff8";
        let redacted = redact_private_keys(key);
        assert_eq!(redacted, "<redacted>");
    }

    #[test]
    fn leaves_short_hex_untouched() {
        let input = "block 0xdeadbeef confirmed";
        assert_eq!(redact_private_keys(input), input);
    }

    #[test]
    fn leaves_plain_text_untouched() {
        let input = "submitting exit proof for validator 42";
        assert_eq!(redact_private_keys(input), input);
    }

    #[test]
    fn mask_tail_keeps_suffix() {
        assert_eq!(mask_tail("0x1234567890abcdef", 4), "**************cdef");
    }
}
