use std::time::{SystemTime, UNIX_EPOCH};

const HEX: &[u8; 16] = b"0123456789abcdef";
const RANDOM_SUFFIX_LEN: usize = 7;
const ALPHANUMERIC: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

#[inline]
pub(crate) fn unix_now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |duration| {
            u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
        })
}

/// Request-scoped tool-call id source.
///
/// Ids look like `call_<millis-hex>_<random>_<seq>`. The sequence number makes
/// ids unique within one request; the time and random prefix keep them
/// distinct across requests.
#[derive(Debug, Clone)]
pub(crate) struct CallIdGenerator {
    prefix: String,
    next: u64,
}

impl CallIdGenerator {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self::with_seed(unix_now_millis(), fastrand::u64(..))
    }

    #[must_use]
    pub(crate) fn with_seed(millis: u64, random: u64) -> Self {
        let mut prefix = String::with_capacity(5 + 16 + 1 + RANDOM_SUFFIX_LEN);
        prefix.push_str("call_");
        push_u64_hex(&mut prefix, millis);
        prefix.push('_');
        let mut rng = fastrand::Rng::with_seed(random);
        for _ in 0..RANDOM_SUFFIX_LEN {
            prefix.push(char::from(ALPHANUMERIC[rng.usize(..ALPHANUMERIC.len())]));
        }
        Self { prefix, next: 0 }
    }

    pub(crate) fn next_id(&mut self) -> String {
        let seq = self.next;
        self.next += 1;
        let mut out = String::with_capacity(self.prefix.len() + 8);
        out.push_str(&self.prefix);
        out.push('_');
        push_u64_hex(&mut out, seq);
        out
    }
}

#[inline]
fn push_u64_hex(out: &mut String, value: u64) {
    if value == 0 {
        out.push('0');
        return;
    }
    let mut buf = [0u8; 16];
    let mut i = buf.len();
    let mut v = value;
    while v > 0 {
        i -= 1;
        buf[i] = HEX[(v & 0x0f) as usize];
        v >>= 4;
    }
    for &b in &buf[i..] {
        out.push(char::from(b));
    }
}
